// Demo data: six months of activity (January - June 2024)

use chrono::{DateTime, TimeZone, Utc};

use crate::entities::{Asset, Debt, DebtBreakdown, NetWorthSnapshot, Transaction, TransactionSource};

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// (day, January amount, monthly change, description, category, source)
const MONTHLY_TEMPLATE: [(u32, f64, f64, &str, &str, TransactionSource); 12] = [
    (1, -85.0, -5.0, "TESCO STORE 123", "groceries", TransactionSource::Aib),
    (3, -45.0, -5.0, "DUNNES STORES", "groceries", TransactionSource::Aib),
    (5, -120.0, -10.0, "SHELL GARAGE", "transport", TransactionSource::Aib),
    (8, -65.0, -8.0, "RESTAURANT XYZ", "dining", TransactionSource::Revolut),
    (10, -200.0, -15.0, "ATM WITHDRAWAL", "cash", TransactionSource::Aib),
    (12, -89.99, 0.0, "NETFLIX SUBSCRIPTION", "entertainment", TransactionSource::Revolut),
    (15, -150.0, -10.0, "ELECTRICITY BILL", "utilities", TransactionSource::Aib),
    (18, -75.0, -6.0, "PHARMACY", "health", TransactionSource::Aib),
    (20, -95.0, -9.0, "RESTAURANT ABC", "dining", TransactionSource::Revolut),
    (25, -180.0, -20.0, "SHOPPING CENTRE", "shopping", TransactionSource::Aib),
    (27, -110.0, -10.0, "GAS BILL", "utilities", TransactionSource::Aib),
    (28, 3500.0, 0.0, "SALARY", "income", TransactionSource::Aib),
];

pub fn sample_transactions() -> Vec<Transaction> {
    (0..6u32)
        .flat_map(|m| {
            MONTHLY_TEMPLATE
                .iter()
                .map(move |(day, base, step, description, category, source)| {
                    Transaction::new(
                        date(2024, m + 1, *day),
                        base + step * m as f64,
                        *description,
                        *category,
                        *source,
                    )
                })
        })
        .collect()
}

pub fn sample_assets() -> Vec<Asset> {
    let as_of = date(2024, 6, 30);
    vec![
        Asset::new("Primary Home", 450000.0, true, as_of),
        Asset::new("Savings Account", 25000.0, false, as_of),
        Asset::new("Investment Portfolio", 35000.0, false, as_of),
        Asset::new("Emergency Fund", 15000.0, false, as_of),
        Asset::new("Car", 12000.0, false, as_of),
    ]
}

pub fn sample_debts() -> Vec<Debt> {
    let as_of = date(2024, 6, 30);
    vec![
        Debt::new("Mortgage", 320000.0, Some(3.2), as_of),
        Debt::new("Car Loan", 8000.0, Some(6.2), as_of),
        Debt::new("Credit Card", 2500.0, Some(18.9), as_of),
    ]
}

/// Month-end history leading up to the sample balances
pub fn sample_snapshots() -> Vec<NetWorthSnapshot> {
    let rows = [
        ((1, 31), 525000.0, 75000.0, 325000.0, 12000.0),
        ((2, 29), 530000.0, 80000.0, 324000.0, 11000.0),
        ((3, 31), 535000.0, 85000.0, 323000.0, 10500.0),
        ((4, 30), 540000.0, 90000.0, 322000.0, 10000.0),
        ((5, 31), 545000.0, 95000.0, 321000.0, 9500.0),
        ((6, 30), 550000.0, 100000.0, 320000.0, 9000.0),
    ];

    rows.iter()
        .map(|&((month, day), total, liquid, mortgage, other)| {
            let debts = DebtBreakdown { mortgage, other };
            NetWorthSnapshot {
                date: date(2024, month, day),
                total_assets: total,
                liquid_assets: liquid,
                debts,
                total_net_worth: total - debts.total(),
                liquid_net_worth: liquid - debts.total(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net_worth::NetWorthSummary;

    #[test]
    fn test_sample_transactions_cover_six_months() {
        let txs = sample_transactions();
        assert_eq!(txs.len(), 72);
        assert!(txs.iter().filter(|tx| tx.category == "income").all(|tx| tx.amount == 3500.0));
        assert_eq!(txs[12].amount, -90.0);
    }

    #[test]
    fn test_sample_snapshots_are_consistent() {
        for s in sample_snapshots() {
            assert_eq!(s.total_net_worth, s.total_assets - s.total_debts());
            assert_eq!(s.liquid_net_worth, s.liquid_assets - s.total_debts());
        }
        assert_eq!(sample_snapshots()[5].total_net_worth, 221000.0);
    }

    #[test]
    fn test_sample_balances() {
        let summary = NetWorthSummary::calculate(&sample_assets(), &sample_debts());
        assert_eq!(summary.total_assets, 537000.0);
        assert_eq!(summary.liquid_assets, 87000.0);
        assert_eq!(summary.total_debts, 330500.0);
        assert_eq!(summary.home_equity, 450000.0);
    }
}
