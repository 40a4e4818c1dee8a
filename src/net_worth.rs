// 📈 Net Worth Calculator
//
// Aggregates the current asset/debt collections and keeps the snapshot
// history at one entry per calendar day.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::info;

use crate::dates::same_day;
use crate::entities::{Asset, Debt, DebtBreakdown, NetWorthSnapshot};

// ============================================================================
// AGGREGATES
// ============================================================================

/// Aggregate position derived from the asset and debt lists
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetWorthSummary {
    pub total_assets: f64,
    pub liquid_assets: f64,
    pub total_debts: f64,
    pub home_equity: f64,
    pub total_net_worth: f64,
    pub liquid_net_worth: f64,
}

impl NetWorthSummary {
    pub fn calculate(assets: &[Asset], debts: &[Debt]) -> Self {
        let total_assets: f64 = assets.iter().map(|a| a.value).sum();
        let liquid_assets: f64 = assets.iter().filter(|a| a.is_liquid()).map(|a| a.value).sum();
        let total_debts: f64 = debts.iter().map(|d| d.balance).sum();
        let home_equity = assets
            .iter()
            .find(|a| a.is_home_equity)
            .map(|a| a.value)
            .unwrap_or(0.0);

        NetWorthSummary {
            total_assets,
            liquid_assets,
            total_debts,
            home_equity,
            total_net_worth: total_assets - total_debts,
            liquid_net_worth: liquid_assets - total_debts,
        }
    }
}

impl DebtBreakdown {
    /// Split balances into mortgage and everything else
    pub fn from_debts(debts: &[Debt]) -> Self {
        debts.iter().fold(DebtBreakdown::default(), |mut acc, debt| {
            if debt.is_mortgage() {
                acc.mortgage += debt.balance;
            } else {
                acc.other += debt.balance;
            }
            acc
        })
    }
}

impl NetWorthSnapshot {
    /// Build the snapshot for `now` from the current collections
    pub fn capture(assets: &[Asset], debts: &[Debt], now: DateTime<Utc>) -> Self {
        let summary = NetWorthSummary::calculate(assets, debts);

        NetWorthSnapshot {
            date: now,
            total_assets: summary.total_assets,
            liquid_assets: summary.liquid_assets,
            debts: DebtBreakdown::from_debts(debts),
            total_net_worth: summary.total_net_worth,
            liquid_net_worth: summary.liquid_net_worth,
        }
    }
}

// ============================================================================
// RECONCILIATION
// ============================================================================

/// What happened to the history when a snapshot was reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// No snapshot for that day yet; pushed to the end
    Appended,

    /// Replaced the existing snapshot for that day at this index
    Replaced(usize),
}

/// Insert `snapshot` keeping at most one entry per calendar day in `tz`.
///
/// An existing entry for the same day is overwritten in place, so the
/// position of older entries never changes.
pub fn reconcile_snapshot<Tz: TimeZone>(
    snapshots: &mut Vec<NetWorthSnapshot>,
    snapshot: NetWorthSnapshot,
    tz: &Tz,
) -> Reconciliation {
    let existing = snapshots
        .iter()
        .position(|s| same_day(&s.date, &snapshot.date, tz));

    let outcome = match existing {
        Some(index) => {
            snapshots[index] = snapshot;
            Reconciliation::Replaced(index)
        }
        None => {
            snapshots.push(snapshot);
            Reconciliation::Appended
        }
    };

    info!(?outcome, count = snapshots.len(), "reconciled net worth snapshot");
    outcome
}

/// Capture today's snapshot and reconcile it into `snapshots`
pub fn record_snapshot<Tz: TimeZone>(
    snapshots: &mut Vec<NetWorthSnapshot>,
    assets: &[Asset],
    debts: &[Debt],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Reconciliation {
    reconcile_snapshot(snapshots, NetWorthSnapshot::capture(assets, debts, now), tz)
}

/// Copy of the history in ascending date order
pub fn sort_by_date(snapshots: &[NetWorthSnapshot]) -> Vec<NetWorthSnapshot> {
    let mut sorted = snapshots.to_vec();
    sorted.sort_by_key(|s| s.date);
    sorted
}

/// Most recent snapshot by date, regardless of storage order
pub fn latest_snapshot(snapshots: &[NetWorthSnapshot]) -> Option<&NetWorthSnapshot> {
    snapshots.iter().max_by_key(|s| s.date)
}
