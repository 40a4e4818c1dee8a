// Finance Buddy - Core Library
// Exposes all modules for use in the CLI, TUI, API server, and tests

pub mod charts;
pub mod config;
pub mod dates;
pub mod entities;
pub mod error;
pub mod format;
pub mod forms;
pub mod ledger;
pub mod logging;
pub mod net_worth;
pub mod sample_data;
pub mod session;
pub mod statements;
pub mod storage;

// Re-export commonly used types
pub use charts::{AllocationChart, Dimensions, TrendChart};
pub use config::{AppConfig, ConfigError};
pub use entities::{Asset, Debt, DebtBreakdown, NetWorthSnapshot, Transaction, TransactionSource};
pub use error::{ImportError, StorageError};
pub use forms::{AssetForm, DebtForm, FormErrors};
pub use ledger::{CashFlow, SortDirection, SortField, TransactionQuery};
pub use net_worth::{NetWorthSummary, Reconciliation};
pub use session::{DashboardSummary, Session};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore, Storage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
