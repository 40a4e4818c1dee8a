// 🗄️ Persistence Adapter
//
// Collections live in a key-value store under fixed keys, each as a JSON
// array. Storage failures never reach the caller: reads fall back to an empty
// collection and writes become no-ops, both logged. The in-memory session
// stays the source of truth for the rest of the run.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::entities::{Asset, Debt, NetWorthSnapshot, Transaction};
use crate::error::{ImportError, StorageError};
use crate::net_worth::{reconcile_snapshot, Reconciliation};

// ============================================================================
// STORAGE KEYS
// ============================================================================

pub const ASSETS_KEY: &str = "finance_buddy_assets";
pub const DEBTS_KEY: &str = "finance_buddy_debts";
pub const NET_WORTH_SNAPSHOTS_KEY: &str = "finance_buddy_net_worth_snapshots";
pub const TRANSACTIONS_KEY: &str = "finance_buddy_transactions";

pub const ALL_KEYS: [&str; 4] = [
    ASSETS_KEY,
    DEBTS_KEY,
    NET_WORTH_SNAPSHOTS_KEY,
    TRANSACTIONS_KEY,
];

// ============================================================================
// KEY-VALUE STORE
// ============================================================================

/// String key-value store backing the persisted collections
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store: one row per key
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // WAL for crash recovery; in-memory databases report "memory"
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    Ok(())
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory store with an optional byte quota.
///
/// Used by tests and for throwaway sessions; `set_available(false)` makes
/// every call fail like a blocked browser store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<HashMap<String, String>>,
    quota: Option<usize>,
    unavailable: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total size of stored values to `limit` bytes
    pub fn with_quota(limit: usize) -> Self {
        MemoryStore {
            quota: Some(limit),
            ..Self::default()
        }
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.set(!available);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.get() {
            return Err(StorageError::Unavailable("memory store disabled".to_string()));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.check_available()?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_available()?;

        if let Some(limit) = self.quota {
            let others: usize = self
                .entries
                .borrow()
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(_, v)| v.len())
                .sum();
            if others + value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    size: value.len(),
                    limit,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// ============================================================================
// EXPORT / IMPORT PAYLOADS
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportPayload<'a> {
    assets: &'a [Asset],
    debts: &'a [Debt],
    net_worth_snapshots: &'a [NetWorthSnapshot],
    #[serde(with = "crate::dates::iso8601")]
    export_date: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportPayload {
    #[serde(default)]
    assets: Option<Vec<Asset>>,
    #[serde(default)]
    debts: Option<Vec<Debt>>,
    #[serde(default)]
    net_worth_snapshots: Option<Vec<NetWorthSnapshot>>,
}

/// Collections overwritten by an import (None = key absent)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub assets: Option<usize>,
    pub debts: Option<usize>,
    pub net_worth_snapshots: Option<usize>,
}

// ============================================================================
// TYPED STORAGE
// ============================================================================

pub struct Storage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Storage { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn save_to_storage<T: Serialize + ?Sized>(&self, key: &str, data: &T) {
        let result = serde_json::to_string(data)
            .map_err(StorageError::from)
            .and_then(|json| self.store.set(key, &json));

        match result {
            Ok(()) => debug!(key, "saved collection"),
            Err(e) => error!(key, error = %e, "failed to save to storage"),
        }
    }

    fn load_from_storage<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.store.get(key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => {
                    debug!(key, "loaded collection");
                    value
                }
                Err(e) => {
                    error!(key, error = %e, "failed to parse stored collection");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                error!(key, error = %e, "failed to load from storage");
                T::default()
            }
        }
    }

    pub fn save_assets(&self, assets: &[Asset]) {
        self.save_to_storage(ASSETS_KEY, assets);
    }

    pub fn load_assets(&self) -> Vec<Asset> {
        self.load_from_storage(ASSETS_KEY)
    }

    pub fn save_debts(&self, debts: &[Debt]) {
        self.save_to_storage(DEBTS_KEY, debts);
    }

    pub fn load_debts(&self) -> Vec<Debt> {
        self.load_from_storage(DEBTS_KEY)
    }

    pub fn save_net_worth_snapshots(&self, snapshots: &[NetWorthSnapshot]) {
        self.save_to_storage(NET_WORTH_SNAPSHOTS_KEY, snapshots);
    }

    pub fn load_net_worth_snapshots(&self) -> Vec<NetWorthSnapshot> {
        self.load_from_storage(NET_WORTH_SNAPSHOTS_KEY)
    }

    pub fn save_transactions(&self, transactions: &[Transaction]) {
        self.save_to_storage(TRANSACTIONS_KEY, transactions);
    }

    pub fn load_transactions(&self) -> Vec<Transaction> {
        self.load_from_storage(TRANSACTIONS_KEY)
    }

    /// Reconcile today's snapshot into the stored history; days are taken in `tz`
    pub fn save_current_net_worth_snapshot<Tz: TimeZone>(
        &self,
        assets: &[Asset],
        debts: &[Debt],
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Reconciliation {
        let mut snapshots = self.load_net_worth_snapshots();
        let outcome = reconcile_snapshot(
            &mut snapshots,
            NetWorthSnapshot::capture(assets, debts, now),
            tz,
        );
        self.save_net_worth_snapshots(&snapshots);
        outcome
    }

    /// Remove every collection
    pub fn clear_all_data(&self) {
        for key in ALL_KEYS {
            if let Err(e) = self.store.remove(key) {
                error!(key, error = %e, "failed to clear storage key");
            }
        }
        info!("cleared all stored data");
    }

    /// Export assets, debts and snapshots as a pretty-printed JSON document
    pub fn export_data(&self, now: DateTime<Utc>) -> Result<String, StorageError> {
        let assets = self.load_assets();
        let debts = self.load_debts();
        let snapshots = self.load_net_worth_snapshots();

        let payload = ExportPayload {
            assets: &assets,
            debts: &debts,
            net_worth_snapshots: &snapshots,
            export_date: now,
        };

        Ok(serde_json::to_string_pretty(&payload)?)
    }

    /// Import an export document.
    ///
    /// The payload is fully parsed before anything is written; each present
    /// collection then overwrites its stored counterpart.
    pub fn try_import_data(&self, json: &str) -> Result<ImportSummary, ImportError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(ImportError::NotAnObject);
        }
        let payload: ImportPayload = serde_json::from_value(value)?;

        let mut summary = ImportSummary::default();

        if let Some(assets) = payload.assets {
            self.save_assets(&assets);
            summary.assets = Some(assets.len());
        }
        if let Some(debts) = payload.debts {
            self.save_debts(&debts);
            summary.debts = Some(debts.len());
        }
        if let Some(snapshots) = payload.net_worth_snapshots {
            self.save_net_worth_snapshots(&snapshots);
            summary.net_worth_snapshots = Some(snapshots.len());
        }

        info!(?summary, "imported data");
        Ok(summary)
    }

    /// Boolean form of [`Storage::try_import_data`]; failures are logged
    pub fn import_data(&self, json: &str) -> bool {
        match self.try_import_data(json) {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "failed to import data");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{DebtBreakdown, TransactionSource};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, d, 0, 0, 0).unwrap()
    }

    fn memory_storage() -> Storage<MemoryStore> {
        Storage::new(MemoryStore::new())
    }

    #[test]
    fn test_missing_keys_load_empty() {
        let storage = memory_storage();
        assert!(storage.load_assets().is_empty());
        assert!(storage.load_debts().is_empty());
        assert!(storage.load_net_worth_snapshots().is_empty());
        assert!(storage.load_transactions().is_empty());
    }

    #[test]
    fn test_assets_persist_with_dates() {
        let storage = memory_storage();
        let assets = vec![
            Asset::new("Primary Home", 450000.0, true, date(30)),
            Asset::new("Savings Account", 25000.0, false, date(29)),
        ];

        storage.save_assets(&assets);
        assert_eq!(storage.load_assets(), assets);

        let raw = storage.store().get(ASSETS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"isHomeEquity\":true"));
        assert!(raw.contains("2024-06-30T00:00:00.000Z"));
    }

    #[test]
    fn test_transactions_persist() {
        let storage = memory_storage();
        let txs = vec![Transaction::new(date(1), -85.5, "TESCO", "groceries", TransactionSource::Aib)];

        storage.save_transactions(&txs);
        assert_eq!(storage.load_transactions(), txs);
    }

    #[test]
    fn test_corrupt_collection_loads_empty() {
        let storage = memory_storage();
        storage.store().set(DEBTS_KEY, "{not json").unwrap();

        assert!(storage.load_debts().is_empty());
    }

    #[test]
    fn test_unavailable_store_degrades_silently() {
        let storage = memory_storage();
        storage.save_assets(&[Asset::new("Car", 12000.0, false, date(1))]);

        storage.store().set_available(false);
        assert!(storage.load_assets().is_empty());
        storage.save_assets(&[]);
        storage.clear_all_data();

        storage.store().set_available(true);
        assert_eq!(storage.load_assets().len(), 1);
    }

    #[test]
    fn test_quota_exceeded_write_is_noop() {
        let storage = Storage::new(MemoryStore::with_quota(256));
        let small = vec![Asset {
            id: "1".to_string(),
            name: "A".to_string(),
            value: 1.0,
            is_home_equity: false,
            date: date(1),
        }];
        let big: Vec<Asset> = (0..10)
            .map(|i| Asset::new(format!("Asset {}", i), 1.0, false, date(1)))
            .collect();

        storage.save_assets(&small);
        storage.save_assets(&big);

        assert_eq!(storage.load_assets(), small);
    }

    #[test]
    fn test_save_current_snapshot_reconciles_per_day() {
        let storage = memory_storage();
        let assets = vec![Asset::new("Savings", 100.0, false, date(1))];
        let debts = vec![Debt::new("Mortgage", 40.0, None, date(1))];

        let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 18, 0, 0).unwrap();
        let tomorrow = Utc.with_ymd_and_hms(2024, 6, 2, 9, 0, 0).unwrap();

        assert_eq!(storage.save_current_net_worth_snapshot(&assets, &debts, now, &Utc), Reconciliation::Appended);
        assert_eq!(storage.save_current_net_worth_snapshot(&assets, &debts, later, &Utc), Reconciliation::Replaced(0));
        assert_eq!(storage.save_current_net_worth_snapshot(&assets, &debts, tomorrow, &Utc), Reconciliation::Appended);

        let snapshots = storage.load_net_worth_snapshots();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].date, later);
        assert_eq!(snapshots[0].debts, DebtBreakdown { mortgage: 40.0, other: 0.0 });
        assert_eq!(snapshots[0].liquid_net_worth, 60.0);
    }

    #[test]
    fn test_clear_all_data() {
        let storage = memory_storage();
        storage.save_assets(&[Asset::new("Car", 12000.0, false, date(1))]);
        storage.save_debts(&[Debt::new("Card", 1.0, None, date(1))]);

        storage.clear_all_data();

        for key in ALL_KEYS {
            assert_eq!(storage.store().get(key).unwrap(), None);
        }
    }

    #[test]
    fn test_export_layout() {
        let storage = memory_storage();
        storage.save_assets(&[Asset::new("Car", 12000.0, false, date(1))]);

        let json = storage.export_data(date(2)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["assets"].as_array().unwrap().len(), 1);
        assert_eq!(value["debts"], serde_json::json!([]));
        assert_eq!(value["netWorthSnapshots"], serde_json::json!([]));
        assert_eq!(value["exportDate"], "2024-06-02T00:00:00.000Z");
    }

    #[test]
    fn test_import_overwrites_present_keys() {
        let storage = memory_storage();
        storage.save_debts(&[Debt::new("Old Card", 99.0, None, date(1))]);
        storage.save_net_worth_snapshots(&[NetWorthSnapshot::capture(&[], &[], date(1))]);

        let ok = storage.import_data(
            r#"{"assets":[{"id":"a1","name":"Savings","value":25000,"isHomeEquity":false,"date":"2024-06-30T00:00:00.000Z"}],"debts":[]}"#,
        );

        assert!(ok);
        let assets = storage.load_assets();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].id, "a1");
        assert!(storage.load_debts().is_empty());
        // Absent key is left alone
        assert_eq!(storage.load_net_worth_snapshots().len(), 1);
    }

    #[test]
    fn test_import_reports_counts() {
        let storage = memory_storage();
        let summary = storage
            .try_import_data(r#"{"debts":[],"netWorthSnapshots":null,"exportDate":"2024-01-01"}"#)
            .unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                assets: None,
                debts: Some(0),
                net_worth_snapshots: None,
            }
        );
    }

    #[test]
    fn test_malformed_import_writes_nothing() {
        let storage = memory_storage();
        storage.save_assets(&[Asset::new("Car", 12000.0, false, date(1))]);

        assert!(!storage.import_data("{\"assets\": [oops"));
        assert!(!storage.import_data("[1, 2, 3]"));
        // Valid assets but invalid debts: parsed up front, so assets untouched
        assert!(!storage.import_data(r#"{"assets":[],"debts":[{"name":"x"}]}"#));

        assert_eq!(storage.load_assets().len(), 1);
    }

    #[test]
    fn test_import_error_kinds() {
        let storage = memory_storage();
        assert!(matches!(storage.try_import_data("42"), Err(ImportError::NotAnObject)));
        assert!(matches!(storage.try_import_data("nope"), Err(ImportError::Malformed(_))));
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap(), Some("v2".to_string()));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
