// Entity Models
//
// Each entity has a stable UUID identity and serializes with the camelCase
// field layout used by the persisted collections and the export file.

pub mod asset;
pub mod debt;
pub mod snapshot;
pub mod transaction;

pub use asset::Asset;
pub use debt::Debt;
pub use snapshot::{DebtBreakdown, NetWorthSnapshot};
pub use transaction::{Transaction, TransactionSource};
