// 📒 Transaction Ledger - sorting, filtering and monthly summaries

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::entities::Transaction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Date,
    Amount,
    Description,
    Category,
}

impl SortField {
    pub fn title(&self) -> &'static str {
        match self {
            SortField::Date => "Date",
            SortField::Amount => "Amount",
            SortField::Description => "Description",
            SortField::Category => "Category",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            SortField::Date => SortField::Amount,
            SortField::Amount => SortField::Description,
            SortField::Description => SortField::Category,
            SortField::Category => SortField::Date,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(&self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

/// View state of the transaction list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionQuery {
    pub sort_field: SortField,
    pub direction: SortDirection,
    /// Exact category match; None shows all
    pub category: Option<String>,
    /// Case-insensitive substring over description and category
    pub search: String,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        TransactionQuery {
            sort_field: SortField::Date,
            direction: SortDirection::Desc,
            category: None,
            search: String::new(),
        }
    }
}

impl TransactionQuery {
    /// Clicking the current column flips direction; a new column starts ascending
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.direction = self.direction.flip();
        } else {
            self.sort_field = field;
            self.direction = SortDirection::Asc;
        }
    }

    pub fn matches(&self, tx: &Transaction) -> bool {
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |c| c.is_empty() || tx.category == c);

        let search_ok = self.search.is_empty() || {
            let needle = self.search.to_lowercase();
            tx.description.to_lowercase().contains(&needle)
                || tx.category.to_lowercase().contains(&needle)
        };

        category_ok && search_ok
    }

    fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let ordering = match self.sort_field {
            SortField::Date => a.date.cmp(&b.date),
            SortField::Amount => a.amount.abs().total_cmp(&b.amount.abs()),
            SortField::Description => a.description.to_lowercase().cmp(&b.description.to_lowercase()),
            SortField::Category => a.category.to_lowercase().cmp(&b.category.to_lowercase()),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// Filtered and sorted view over `transactions`
    pub fn apply<'a>(&self, transactions: &'a [Transaction]) -> Vec<&'a Transaction> {
        let mut rows: Vec<&Transaction> = transactions.iter().filter(|tx| self.matches(tx)).collect();
        rows.sort_by(|a, b| self.compare(a, b));
        rows
    }
}

/// Distinct categories, sorted
pub fn categories(transactions: &[Transaction]) -> Vec<String> {
    transactions
        .iter()
        .map(|tx| tx.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Transactions dated in `month` (1-12) of `year`
pub fn transactions_by_month(transactions: &[Transaction], year: i32, month: u32) -> Vec<&Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.date.year() == year && tx.date.month() == month)
        .collect()
}

pub fn current_month_transactions(transactions: &[Transaction], now: DateTime<Utc>) -> Vec<&Transaction> {
    transactions_by_month(transactions, now.year(), now.month())
}

/// Absolute spend per category over the month's expenses
pub fn monthly_spending_by_category(
    transactions: &[Transaction],
    year: i32,
    month: u32,
) -> BTreeMap<String, f64> {
    transactions_by_month(transactions, year, month)
        .into_iter()
        .filter(|tx| tx.is_expense())
        .fold(BTreeMap::new(), |mut acc, tx| {
            *acc.entry(tx.category.clone()).or_insert(0.0) += tx.amount.abs();
            acc
        })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CashFlow {
    pub income: f64,
    /// Positive total of expense amounts
    pub expenses: f64,
    pub net: f64,
}

pub fn cash_flow<'a, I>(transactions: I) -> CashFlow
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut flow = transactions.into_iter().fold(CashFlow::default(), |mut acc, tx| {
        if tx.is_income() {
            acc.income += tx.amount;
        } else {
            acc.expenses += tx.amount.abs();
        }
        acc
    });
    flow.net = flow.income - flow.expenses;
    flow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TransactionSource;
    use chrono::TimeZone;

    fn tx(month: u32, day: u32, amount: f64, description: &str, category: &str) -> Transaction {
        Transaction::new(
            Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap(),
            amount,
            description,
            category,
            TransactionSource::Aib,
        )
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx(1, 2, -85.5, "TESCO STORE 123", "groceries"),
            tx(1, 7, -65.0, "RESTAURANT XYZ", "dining"),
            tx(1, 30, 3500.0, "SALARY", "income"),
            tx(2, 1, -90.0, "TESCO STORE 123", "groceries"),
            tx(2, 3, -55.0, "Dunnes Stores", "Groceries"),
        ]
    }

    fn descriptions(rows: &[&Transaction]) -> Vec<String> {
        rows.iter().map(|tx| tx.description.clone()).collect()
    }

    #[test]
    fn test_default_query_newest_first() {
        let txs = sample();
        let rows = TransactionQuery::default().apply(&txs);

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].description, "Dunnes Stores");
        assert_eq!(rows[4].description, "TESCO STORE 123");
        assert_eq!(rows[4].amount, -85.5);
    }

    #[test]
    fn test_toggle_sort() {
        let mut query = TransactionQuery::default();

        query.toggle_sort(SortField::Date);
        assert_eq!(query.direction, SortDirection::Asc);

        query.toggle_sort(SortField::Amount);
        assert_eq!(query.sort_field, SortField::Amount);
        assert_eq!(query.direction, SortDirection::Asc);

        query.toggle_sort(SortField::Amount);
        assert_eq!(query.direction, SortDirection::Desc);
    }

    #[test]
    fn test_amount_sorts_by_magnitude() {
        let txs = sample();
        let mut query = TransactionQuery::default();
        query.toggle_sort(SortField::Amount);

        let amounts: Vec<f64> = query.apply(&txs).iter().map(|tx| tx.amount).collect();
        assert_eq!(amounts, vec![-55.0, -65.0, -85.5, -90.0, 3500.0]);
    }

    #[test]
    fn test_text_sorts_ignore_case() {
        let txs = sample();
        let mut query = TransactionQuery::default();
        query.toggle_sort(SortField::Description);

        assert_eq!(
            descriptions(&query.apply(&txs)),
            vec!["Dunnes Stores", "RESTAURANT XYZ", "SALARY", "TESCO STORE 123", "TESCO STORE 123"]
        );
    }

    #[test]
    fn test_category_filter_is_exact() {
        let txs = sample();
        let query = TransactionQuery {
            category: Some("groceries".to_string()),
            ..TransactionQuery::default()
        };

        assert_eq!(query.apply(&txs).len(), 2);
    }

    #[test]
    fn test_search_matches_description_or_category() {
        let txs = sample();
        let query = TransactionQuery {
            search: "groc".to_string(),
            ..TransactionQuery::default()
        };
        assert_eq!(query.apply(&txs).len(), 3);

        let query = TransactionQuery {
            search: "restaurant".to_string(),
            ..TransactionQuery::default()
        };
        assert_eq!(descriptions(&query.apply(&txs)), vec!["RESTAURANT XYZ"]);
    }

    #[test]
    fn test_categories_sorted_unique() {
        assert_eq!(
            categories(&sample()),
            vec!["Groceries", "dining", "groceries", "income"]
        );
    }

    #[test]
    fn test_monthly_spending() {
        let txs = sample();
        let spending = monthly_spending_by_category(&txs, 2024, 1);

        assert_eq!(spending.len(), 2);
        assert_eq!(spending["groceries"], 85.5);
        assert_eq!(spending["dining"], 65.0);
        assert!(!spending.contains_key("income"));
    }

    #[test]
    fn test_current_month() {
        let txs = sample();
        let now = Utc.with_ymd_and_hms(2024, 2, 15, 12, 0, 0).unwrap();
        assert_eq!(current_month_transactions(&txs, now).len(), 2);
        assert!(transactions_by_month(&txs, 2023, 2).is_empty());
    }

    #[test]
    fn test_cash_flow() {
        let txs = sample();
        let flow = cash_flow(transactions_by_month(&txs, 2024, 1));

        assert_eq!(flow.income, 3500.0);
        assert_eq!(flow.expenses, 150.5);
        assert_eq!(flow.net, 3349.5);
    }
}
