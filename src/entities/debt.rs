// 💸 Debt Entity - outstanding balances (mortgage, loans, cards)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debt {
    /// Stable identity (UUID)
    pub id: String,

    /// Display name; also drives mortgage classification
    pub name: String,

    /// Outstanding balance in EUR
    pub balance: f64,

    /// Annual interest rate in percent (e.g. 3.2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<f64>,

    #[serde(with = "crate::dates::iso8601")]
    pub date: DateTime<Utc>,
}

impl Debt {
    pub fn new(
        name: impl Into<String>,
        balance: f64,
        interest_rate: Option<f64>,
        date: DateTime<Utc>,
    ) -> Self {
        Debt {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            balance,
            interest_rate,
            date,
        }
    }

    /// Mortgage-like debts are secured on the home: the name mentions
    /// "mortgage" or "home loan" in any letter case.
    pub fn is_mortgage(&self) -> bool {
        let name = self.name.to_lowercase();
        name.contains("mortgage") || name.contains("home loan")
    }
}
