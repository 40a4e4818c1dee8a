// 📸 Net Worth Snapshot - one aggregate record per calendar day

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Debt totals split by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DebtBreakdown {
    pub mortgage: f64,
    pub other: f64,
}

impl DebtBreakdown {
    pub fn total(&self) -> f64 {
        self.mortgage + self.other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthSnapshot {
    #[serde(with = "crate::dates::iso8601")]
    pub date: DateTime<Utc>,

    /// Including home equity
    pub total_assets: f64,

    /// Excluding home equity
    pub liquid_assets: f64,

    pub debts: DebtBreakdown,

    pub total_net_worth: f64,

    pub liquid_net_worth: f64,
}

impl NetWorthSnapshot {
    pub fn total_debts(&self) -> f64 {
        self.debts.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snapshot_json_layout() {
        let snapshot = NetWorthSnapshot {
            date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            total_assets: 350000.0,
            liquid_assets: 50000.0,
            debts: DebtBreakdown {
                mortgage: 200000.0,
                other: 10000.0,
            },
            total_net_worth: 140000.0,
            liquid_net_worth: -160000.0,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["totalAssets"], 350000.0);
        assert_eq!(value["liquidAssets"], 50000.0);
        assert_eq!(value["debts"]["mortgage"], 200000.0);
        assert_eq!(value["liquidNetWorth"], -160000.0);
        assert_eq!(snapshot.total_debts(), 210000.0);
    }
}
