//! Magic Input History
//!
//! A small, size-bounded log of past analyses, persisted best-effort to a
//! single namespaced value. Load never fails and writes never propagate
//! errors; history is a convenience, not part of classification.

pub mod entry;
pub mod ledger;
pub mod store;

pub use entry::HistoryEntry;
pub use ledger::{HistoryLedger, LedgerConfig};
pub use store::{FileStore, HistoryStore, MemoryStore, HISTORY_NAMESPACE};
