// 🧾 Transaction Entity - a single bank movement
//
// Amount sign carries the direction: negative = expense, positive = income.
// Category is free-form; source is one of the known feeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TRANSACTION SOURCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// AIB current account export
    Aib,

    /// Revolut export
    Revolut,

    /// Entered by hand
    Manual,
}

impl TransactionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionSource::Aib => "aib",
            TransactionSource::Revolut => "revolut",
            TransactionSource::Manual => "manual",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "aib" => Some(TransactionSource::Aib),
            "revolut" => Some(TransactionSource::Revolut),
            "manual" => Some(TransactionSource::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TRANSACTION ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Stable identity (UUID)
    pub id: String,

    #[serde(with = "crate::dates::iso8601")]
    pub date: DateTime<Utc>,

    /// Signed amount in EUR, negative for expenses
    pub amount: f64,

    /// Raw bank text
    pub description: String,

    /// e.g. "groceries"
    pub category: String,

    pub source: TransactionSource,
}

impl Transaction {
    pub fn new(
        date: DateTime<Utc>,
        amount: f64,
        description: impl Into<String>,
        category: impl Into<String>,
        source: TransactionSource,
    ) -> Self {
        Transaction {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            amount,
            description: description.into(),
            category: category.into(),
            source,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transaction_creation() {
        let tx = Transaction::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            -50.0,
            "TESCO STORE 123",
            "groceries",
            TransactionSource::Aib,
        );

        assert_eq!(tx.amount, -50.0);
        assert_eq!(tx.category, "groceries");
        assert!(tx.is_expense());
        assert!(!tx.is_income());
        assert_eq!(tx.id.len(), 36);
    }

    #[test]
    fn test_source_serializes_lowercase() {
        let json = serde_json::to_string(&TransactionSource::Revolut).unwrap();
        assert_eq!(json, "\"revolut\"");

        let source: TransactionSource = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(source, TransactionSource::Manual);
    }

    #[test]
    fn test_source_rejects_unknown_feed() {
        assert!(serde_json::from_str::<TransactionSource>("\"n26\"").is_err());
        assert_eq!(TransactionSource::parse(" AIB "), Some(TransactionSource::Aib));
        assert_eq!(TransactionSource::parse("n26"), None);
    }

    #[test]
    fn test_transaction_json_layout() {
        let json = r#"{
            "id": "12",
            "date": "2024-01-30",
            "amount": 3500.0,
            "description": "SALARY",
            "category": "income",
            "source": "aib"
        }"#;

        let tx: Transaction = serde_json::from_str(json).unwrap();
        assert!(tx.is_income());
        assert_eq!(tx.date, Utc.with_ymd_and_hms(2024, 1, 30, 0, 0, 0).unwrap());

        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["date"], "2024-01-30T00:00:00.000Z");
        assert_eq!(value["source"], "aib");
    }
}
