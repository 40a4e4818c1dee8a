// 🧭 Session - the in-memory state of the active screen
//
// Owns the collections, mirrors every mutation to storage and keeps today's
// net worth snapshot current. Calculations stay in pure functions; this type
// only sequences them.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::charts::{AllocationChart, Dimensions, TrendChart};
use crate::entities::{Asset, Debt, NetWorthSnapshot, Transaction};
use crate::error::{ImportError, StorageError};
use crate::forms::{AssetForm, DebtForm, FormErrors};
use crate::ledger::TransactionQuery;
use crate::net_worth::{latest_snapshot, record_snapshot, NetWorthSummary, Reconciliation};
use crate::storage::{ImportSummary, KeyValueStore, Storage};

pub type Clock = fn() -> DateTime<Utc>;

/// Headline figures for the dashboard cards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_net_worth: f64,
    pub liquid_net_worth: f64,
    pub home_equity: f64,
    pub total_debts: f64,
    pub latest_snapshot: Option<NetWorthSnapshot>,
}

pub struct Session<S: KeyValueStore> {
    storage: Storage<S>,
    assets: Vec<Asset>,
    debts: Vec<Debt>,
    transactions: Vec<Transaction>,
    snapshots: Vec<NetWorthSnapshot>,
    clock: Clock,
}

impl<S: KeyValueStore> Session<S> {
    /// Load every collection from storage
    pub fn load(storage: Storage<S>) -> Self {
        Self::load_with_clock(storage, Utc::now)
    }

    pub fn load_with_clock(storage: Storage<S>, clock: Clock) -> Self {
        let mut session = Session {
            storage,
            assets: Vec::new(),
            debts: Vec::new(),
            transactions: Vec::new(),
            snapshots: Vec::new(),
            clock,
        };
        session.reload();
        session
    }

    pub fn reload(&mut self) {
        self.assets = self.storage.load_assets();
        self.debts = self.storage.load_debts();
        self.transactions = self.storage.load_transactions();
        self.snapshots = self.storage.load_net_worth_snapshots();
        debug!(
            assets = self.assets.len(),
            debts = self.debts.len(),
            transactions = self.transactions.len(),
            snapshots = self.snapshots.len(),
            "session loaded"
        );
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    pub fn into_storage(self) -> Storage<S> {
        self.storage
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn debts(&self) -> &[Debt] {
        &self.debts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn snapshots(&self) -> &[NetWorthSnapshot] {
        &self.snapshots
    }

    pub fn asset(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    pub fn debt(&self, id: &str) -> Option<&Debt> {
        self.debts.iter().find(|d| d.id == id)
    }

    // ========================================================================
    // MUTATIONS
    // ========================================================================

    /// Reconcile today's snapshot and persist the history
    pub fn record_snapshot(&mut self) -> Reconciliation {
        let now = self.now();
        let outcome = record_snapshot(&mut self.snapshots, &self.assets, &self.debts, now, &Local);
        self.storage.save_net_worth_snapshots(&self.snapshots);
        outcome
    }

    fn assets_changed(&mut self) {
        self.storage.save_assets(&self.assets);
        self.record_snapshot();
    }

    fn debts_changed(&mut self) {
        self.storage.save_debts(&self.debts);
        self.record_snapshot();
    }

    pub fn add_asset(&mut self, asset: Asset) {
        info!(id = %asset.id, name = %asset.name, "adding asset");
        self.assets.push(asset);
        self.assets_changed();
    }

    /// Replace the asset with the same id; false if there is none
    pub fn update_asset(&mut self, asset: Asset) -> bool {
        match self.assets.iter_mut().find(|a| a.id == asset.id) {
            Some(slot) => {
                *slot = asset;
                self.assets_changed();
                true
            }
            None => false,
        }
    }

    pub fn remove_asset(&mut self, id: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| a.id != id);
        let removed = self.assets.len() != before;
        if removed {
            self.assets_changed();
        }
        removed
    }

    /// Validate and save a form; `editing` names the asset being edited
    pub fn save_asset_form(&mut self, form: &AssetForm, editing: Option<&str>) -> Result<Asset, FormErrors> {
        let existing = editing.and_then(|id| self.asset(id)).cloned();
        let asset = form.build(existing.as_ref(), self.now())?;

        if existing.is_some() {
            self.update_asset(asset.clone());
        } else {
            self.add_asset(asset.clone());
        }
        Ok(asset)
    }

    pub fn add_debt(&mut self, debt: Debt) {
        info!(id = %debt.id, name = %debt.name, "adding debt");
        self.debts.push(debt);
        self.debts_changed();
    }

    pub fn update_debt(&mut self, debt: Debt) -> bool {
        match self.debts.iter_mut().find(|d| d.id == debt.id) {
            Some(slot) => {
                *slot = debt;
                self.debts_changed();
                true
            }
            None => false,
        }
    }

    pub fn remove_debt(&mut self, id: &str) -> bool {
        let before = self.debts.len();
        self.debts.retain(|d| d.id != id);
        let removed = self.debts.len() != before;
        if removed {
            self.debts_changed();
        }
        removed
    }

    pub fn save_debt_form(&mut self, form: &DebtForm, editing: Option<&str>) -> Result<Debt, FormErrors> {
        let existing = editing.and_then(|id| self.debt(id)).cloned();
        let debt = form.build(existing.as_ref(), self.now())?;

        if existing.is_some() {
            self.update_debt(debt.clone());
        } else {
            self.add_debt(debt.clone());
        }
        Ok(debt)
    }

    pub fn add_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
        self.storage.save_transactions(&self.transactions);
    }

    pub fn update_transaction(&mut self, transaction: Transaction) -> bool {
        match self.transactions.iter_mut().find(|t| t.id == transaction.id) {
            Some(slot) => {
                *slot = transaction;
                self.storage.save_transactions(&self.transactions);
                true
            }
            None => false,
        }
    }

    pub fn remove_transaction(&mut self, id: &str) -> bool {
        let before = self.transactions.len();
        self.transactions.retain(|t| t.id != id);
        let removed = self.transactions.len() != before;
        if removed {
            self.storage.save_transactions(&self.transactions);
        }
        removed
    }

    /// Replace every collection with the given data and persist it
    pub fn seed(
        &mut self,
        assets: Vec<Asset>,
        debts: Vec<Debt>,
        transactions: Vec<Transaction>,
        snapshots: Vec<NetWorthSnapshot>,
    ) {
        self.assets = assets;
        self.debts = debts;
        self.transactions = transactions;
        self.snapshots = snapshots;

        self.storage.save_assets(&self.assets);
        self.storage.save_debts(&self.debts);
        self.storage.save_transactions(&self.transactions);
        self.record_snapshot();
        info!("seeded session");
    }

    pub fn clear(&mut self) {
        self.storage.clear_all_data();
        self.reload();
    }

    pub fn export(&self) -> Result<String, StorageError> {
        self.storage.export_data(self.now())
    }

    /// Import an export document, then reload from storage
    pub fn try_import(&mut self, json: &str) -> Result<ImportSummary, ImportError> {
        let summary = self.storage.try_import_data(json)?;
        self.reload();
        Ok(summary)
    }

    /// Boolean form of [`Session::try_import`]; state is untouched on failure
    pub fn import(&mut self, json: &str) -> bool {
        match self.try_import(json) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "failed to import data");
                false
            }
        }
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn summary(&self) -> NetWorthSummary {
        NetWorthSummary::calculate(&self.assets, &self.debts)
    }

    pub fn dashboard(&self) -> DashboardSummary {
        let summary = self.summary();
        DashboardSummary {
            total_net_worth: summary.total_net_worth,
            liquid_net_worth: summary.liquid_net_worth,
            home_equity: summary.home_equity,
            total_debts: summary.total_debts,
            latest_snapshot: latest_snapshot(&self.snapshots).cloned(),
        }
    }

    pub fn trend_chart(&self, dimensions: Dimensions) -> TrendChart {
        TrendChart::build(&self.snapshots, dimensions)
    }

    pub fn allocation_chart(&self, dimensions: Dimensions) -> AllocationChart {
        AllocationChart::build(&self.assets, dimensions)
    }

    pub fn ledger(&self, query: &TransactionQuery) -> Vec<&Transaction> {
        query.apply(&self.transactions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::TransactionSource;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap()
    }

    fn session() -> Session<MemoryStore> {
        Session::load_with_clock(Storage::new(MemoryStore::new()), fixed_now)
    }

    fn asset_form(name: &str, value: &str, home: bool) -> AssetForm {
        AssetForm {
            name: name.to_string(),
            value: value.to_string(),
            is_home_equity: home,
        }
    }

    #[test]
    fn test_empty_session() {
        let s = session();
        assert!(s.assets().is_empty());
        assert_eq!(s.summary(), NetWorthSummary::default());
        assert!(s.dashboard().latest_snapshot.is_none());
    }

    #[test]
    fn test_mutations_persist_and_snapshot() {
        let mut s = session();
        s.save_asset_form(&asset_form("Primary Home", "450000", true), None).unwrap();
        s.save_asset_form(&asset_form("Savings", "25000", false), None).unwrap();
        s.save_debt_form(
            &DebtForm {
                name: "Mortgage".to_string(),
                balance: "320000".to_string(),
                interest_rate: "3.2".to_string(),
            },
            None,
        )
        .unwrap();

        // One snapshot for the day, reflecting the latest state
        assert_eq!(s.snapshots().len(), 1);
        let snap = &s.snapshots()[0];
        assert_eq!(snap.total_net_worth, 155000.0);
        assert_eq!(snap.liquid_net_worth, -295000.0);
        assert_eq!(snap.debts.mortgage, 320000.0);

        // Everything survives a fresh load
        let (assets, debts, snapshots) = (s.assets().to_vec(), s.debts().to_vec(), s.snapshots().to_vec());
        let reloaded = Session::load_with_clock(s.into_storage(), fixed_now);
        assert_eq!(reloaded.assets(), assets.as_slice());
        assert_eq!(reloaded.debts(), debts.as_slice());
        assert_eq!(reloaded.snapshots(), snapshots.as_slice());
    }

    #[test]
    fn test_invalid_form_changes_nothing() {
        let mut s = session();
        let errors = s.save_asset_form(&asset_form("", "", false), None).unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(s.assets().is_empty());
        assert!(s.snapshots().is_empty());
    }

    #[test]
    fn test_edit_asset_via_form() {
        let mut s = session();
        let home = s.save_asset_form(&asset_form("Primary Home", "450000", true), None).unwrap();

        let edited = s
            .save_asset_form(&asset_form("Primary Home", "460000", true), Some(&home.id))
            .unwrap();

        assert_eq!(edited.id, home.id);
        assert_eq!(s.assets().len(), 1);
        assert_eq!(s.assets()[0].value, 460000.0);
        assert_eq!(s.dashboard().home_equity, 460000.0);
    }

    #[test]
    fn test_remove_unknown_ids() {
        let mut s = session();
        assert!(!s.remove_asset("missing"));
        assert!(!s.remove_debt("missing"));
        assert!(!s.remove_transaction("missing"));
        assert!(s.snapshots().is_empty());
    }

    #[test]
    fn test_remove_debt_updates_snapshot() {
        let mut s = session();
        s.add_asset(Asset::new("Cash", 1000.0, false, fixed_now()));
        let debt = Debt::new("Credit Card", 400.0, Some(18.9), fixed_now());
        let id = debt.id.clone();
        s.add_debt(debt);
        assert_eq!(s.snapshots()[0].total_net_worth, 600.0);

        assert!(s.remove_debt(&id));
        assert_eq!(s.snapshots().len(), 1);
        assert_eq!(s.snapshots()[0].total_net_worth, 1000.0);
    }

    #[test]
    fn test_transactions_crud() {
        let mut s = session();
        let mut tx = Transaction::new(fixed_now(), -20.0, "CINEMA", "entertainment", TransactionSource::Manual);
        s.add_transaction(tx.clone());

        tx.amount = -25.0;
        assert!(s.update_transaction(tx.clone()));
        assert_eq!(s.storage().load_transactions()[0].amount, -25.0);

        assert_eq!(s.ledger(&TransactionQuery::default()).len(), 1);
        assert!(s.remove_transaction(&tx.id));
        assert!(s.storage().load_transactions().is_empty());
    }

    #[test]
    fn test_import_reloads_state() {
        let mut s = session();
        s.add_debt(Debt::new("Old", 5.0, None, fixed_now()));

        let ok = s.import(
            r#"{"assets":[{"id":"a1","name":"Savings","value":25000,"isHomeEquity":false,"date":"2024-06-30T00:00:00.000Z"}],"debts":[]}"#,
        );

        assert!(ok);
        assert_eq!(s.assets().len(), 1);
        assert!(s.debts().is_empty());
        assert!(!s.import("not json"));
        assert_eq!(s.assets().len(), 1);
    }

    #[test]
    fn test_storage_failure_keeps_memory_state() {
        let mut s = session();
        s.storage().store().set_available(false);

        s.add_asset(Asset::new("Cash", 10.0, false, fixed_now()));

        assert_eq!(s.assets().len(), 1);
        assert_eq!(s.snapshots().len(), 1);

        s.storage().store().set_available(true);
        assert!(s.storage().load_assets().is_empty());
    }

    #[test]
    fn test_seed_and_charts() {
        let mut s = session();
        s.seed(
            crate::sample_data::sample_assets(),
            crate::sample_data::sample_debts(),
            crate::sample_data::sample_transactions(),
            crate::sample_data::sample_snapshots(),
        );

        // Six month-end snapshots plus today's
        assert_eq!(s.snapshots().len(), 7);
        let trend = s.trend_chart(crate::charts::trend::DEFAULT_TREND_SIZE);
        assert_eq!(trend.geometry().unwrap().total_points.len(), 7);

        let allocation = s.allocation_chart(crate::charts::allocation::DEFAULT_ALLOCATION_SIZE);
        assert_eq!(allocation.geometry().unwrap().slices.len(), 5);

        s.clear();
        assert!(s.assets().is_empty());
        assert!(s.snapshots().is_empty());
    }
}
