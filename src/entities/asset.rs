// 🏠 Asset Entity - anything owned with a EUR value
//
// Home equity is tracked as an asset but excluded from liquid totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    /// Stable identity (UUID)
    pub id: String,

    /// Display name (e.g. "Savings Account")
    pub name: String,

    /// Current value in EUR, expected to be >= 0
    pub value: f64,

    /// Primary residence; excluded from liquid calculations
    pub is_home_equity: bool,

    /// As-of date of the value
    #[serde(with = "crate::dates::iso8601")]
    pub date: DateTime<Utc>,
}

impl Asset {
    pub fn new(name: impl Into<String>, value: f64, is_home_equity: bool, date: DateTime<Utc>) -> Self {
        Asset {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            value,
            is_home_equity,
            date,
        }
    }

    /// Liquid assets are everything except home equity
    pub fn is_liquid(&self) -> bool {
        !self.is_home_equity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_asset_creation() {
        let date = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let home = Asset::new("Primary Home", 450000.0, true, date);
        let savings = Asset::new("Savings Account", 25000.0, false, date);

        assert!(!home.is_liquid());
        assert!(savings.is_liquid());
        assert_ne!(home.id, savings.id);
    }

    #[test]
    fn test_asset_camel_case_fields() {
        let date = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let asset = Asset::new("Primary Home", 450000.0, true, date);

        let value = serde_json::to_value(&asset).unwrap();
        assert_eq!(value["isHomeEquity"], true);
        assert_eq!(value["date"], "2024-06-30T00:00:00.000Z");

        let back: Asset = serde_json::from_value(value).unwrap();
        assert_eq!(back, asset);
    }
}
