//! Size-bounded history ledger
//!
//! Entries are kept newest first. Every mutation updates memory and writes
//! the store while holding the ledger lock, so overlapping `record` calls
//! never interleave. Persistence failures are logged and otherwise ignored:
//! the in-memory ledger stays authoritative for the session.

use crate::entry::{truncate_snippet, HistoryEntry};
use crate::store::HistoryStore;
use chrono::Utc;
use magicinput_core::{ClassificationResult, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Ledger limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Maximum number of retained entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Maximum stored characters of each input
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_capacity() -> usize {
    50
}

fn default_snippet_chars() -> usize {
    200
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

struct LedgerState {
    entries: Vec<HistoryEntry>,
    last_id: u64,
}

/// Bounded FIFO log of past analyses
pub struct HistoryLedger {
    store: Box<dyn HistoryStore>,
    config: LedgerConfig,
    state: Mutex<LedgerState>,
}

impl HistoryLedger {
    /// Load the ledger from its store.
    ///
    /// A missing, unreadable or corrupted value yields an empty ledger.
    pub fn load(store: Box<dyn HistoryStore>, config: LedgerConfig) -> Self {
        let mut entries = match store.load() {
            Ok(Some(data)) => match serde_json::from_str::<Vec<HistoryEntry>>(&data) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Stored history is corrupted, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load history, starting empty: {}", e);
                Vec::new()
            }
        };

        entries.sort_by(|a, b| b.id.cmp(&a.id));
        entries.truncate(config.capacity);
        let last_id = entries.first().map_or(0, |e| e.id);

        info!(entries = entries.len(), capacity = config.capacity, "History loaded");

        Self {
            store,
            config,
            state: Mutex::new(LedgerState { entries, last_id }),
        }
    }

    pub fn config(&self) -> LedgerConfig {
        self.config
    }

    /// Record an analysis; always succeeds, returning the stored entry
    pub fn record(&self, content: &str, results: &[ClassificationResult]) -> HistoryEntry {
        let created_at = Utc::now();
        let now_ms = u64::try_from(created_at.timestamp_millis()).unwrap_or(0);

        let mut state = self.state.lock();
        let id = now_ms.max(state.last_id + 1);
        state.last_id = id;

        let entry = HistoryEntry {
            id,
            content_snippet: truncate_snippet(content, self.config.snippet_chars),
            created_at,
            results: results.to_vec(),
        };
        state.entries.insert(0, entry.clone());

        if state.entries.len() > self.config.capacity {
            let evicted = state.entries.len() - self.config.capacity;
            state.entries.truncate(self.config.capacity);
            debug!(evicted, "Evicted oldest history entries");
        }

        self.persist(&state.entries);
        entry
    }

    /// Remove one entry; returns whether it existed
    pub fn delete(&self, id: u64) -> bool {
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);

        let removed = state.entries.len() != before;
        if removed {
            self.persist(&state.entries);
        }
        removed
    }

    /// Remove every entry and the stored value
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        if let Err(e) = self.store.remove() {
            warn!("Failed to remove stored history: {}", e);
        }
    }

    /// All entries, most recent first
    pub fn list(&self) -> Vec<HistoryEntry> {
        self.state.lock().entries.clone()
    }

    /// Look up one entry by id
    pub fn get(&self, id: u64) -> Option<HistoryEntry> {
        self.state.lock().entries.iter().find(|e| e.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    fn persist(&self, entries: &[HistoryEntry]) {
        if let Err(e) = self.try_persist(entries) {
            warn!("Failed to persist history: {}", e);
        }
    }

    fn try_persist(&self, entries: &[HistoryEntry]) -> Result<()> {
        let data = serde_json::to_string(entries)?;
        self.store.save(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FileStore, MemoryStore};
    use magicinput_core::FormatType;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Store handle that lets a test inspect what the ledger wrote
    struct Shared(Arc<MemoryStore>);

    impl HistoryStore for Shared {
        fn load(&self) -> Result<Option<String>> {
            self.0.load()
        }
        fn save(&self, data: &str) -> Result<()> {
            self.0.save(data)
        }
        fn remove(&self) -> Result<()> {
            self.0.remove()
        }
    }

    fn ledger_over(store: &Arc<MemoryStore>, config: LedgerConfig) -> HistoryLedger {
        HistoryLedger::load(Box::new(Shared(Arc::clone(store))), config)
    }

    fn color() -> Vec<ClassificationResult> {
        vec![ClassificationResult::new(FormatType::Color, 85, "Color")]
    }

    #[test]
    fn test_eviction_keeps_most_recent() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());

        for i in 0..51 {
            ledger.record(&format!("input {}", i), &color());
        }

        let entries = ledger.list();
        assert_eq!(entries.len(), 50);
        assert_eq!(entries[0].content_snippet, "input 50");
        assert_eq!(entries[49].content_snippet, "input 1");
        assert!(entries.iter().all(|e| e.content_snippet != "input 0"));
    }

    #[test]
    fn test_ids_strictly_increase() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());

        let ids: Vec<u64> = (0..20).map(|_| ledger.record("x", &[]).id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_snippet_truncated() {
        let store = Arc::new(MemoryStore::new());
        let config = LedgerConfig {
            capacity: 5,
            snippet_chars: 4,
        };
        let ledger = ledger_over(&store, config);

        let entry = ledger.record("héllo wörld", &color());
        assert_eq!(entry.content_snippet, "héll");
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());

        let first = ledger.record("#FF5733", &color());
        let second = ledger.record("1700000000", &[]);

        let reloaded = ledger_over(&store, LedgerConfig::default());
        assert_eq!(reloaded.list(), ledger.list());

        assert!(ledger.delete(first.id));
        assert!(!ledger.delete(first.id));
        let reloaded = ledger_over(&store, LedgerConfig::default());
        assert_eq!(reloaded.list().len(), 1);
        assert_eq!(reloaded.get(second.id).unwrap().content_snippet, "1700000000");

        ledger.clear();
        assert!(ledger.is_empty());
        assert_eq!(store.value(), None);
    }

    #[test]
    fn test_corrupted_store_loads_empty() {
        let store = Arc::new(MemoryStore::with_value("{not json"));
        let ledger = ledger_over(&store, LedgerConfig::default());
        assert!(ledger.is_empty());

        ledger.record("hello", &[]);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_write_failure_keeps_memory() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());

        store.fail_writes(true);
        ledger.record("hello", &color());
        ledger.clear();
        ledger.record("again", &color());

        assert_eq!(ledger.len(), 1);
        assert_eq!(store.value(), None);
    }

    #[test]
    fn test_ids_continue_after_reload() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());
        let last = ledger.record("a", &[]).id;

        let reloaded = ledger_over(&store, LedgerConfig::default());
        assert!(reloaded.record("b", &[]).id > last);
    }

    #[test]
    fn test_load_trims_to_capacity() {
        let store = Arc::new(MemoryStore::new());
        let ledger = ledger_over(&store, LedgerConfig::default());
        for i in 0..10 {
            ledger.record(&i.to_string(), &[]);
        }

        let config = LedgerConfig {
            capacity: 3,
            snippet_chars: 200,
        };
        let smaller = ledger_over(&store, config);
        let snippets: Vec<String> = smaller.list().into_iter().map(|e| e.content_snippet).collect();
        assert_eq!(snippets, vec!["9", "8", "7"]);
    }

    #[test]
    fn test_file_backed_ledger_survives_restart() {
        let temp_dir = TempDir::new().unwrap();

        {
            let ledger = HistoryLedger::load(
                Box::new(FileStore::new(temp_dir.path())),
                LedgerConfig::default(),
            );
            ledger.record("https://example.com", &[]);
        }

        let ledger = HistoryLedger::load(
            Box::new(FileStore::new(temp_dir.path())),
            LedgerConfig::default(),
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.list()[0].content_snippet, "https://example.com");
    }

    #[test]
    fn test_concurrent_records_do_not_interleave() {
        let store = Arc::new(MemoryStore::new());
        let ledger = Arc::new(ledger_over(&store, LedgerConfig::default()));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    for i in 0..5 {
                        ledger.record(&format!("{}-{}", t, i), &[]);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 40);
        let stored: Vec<HistoryEntry> = serde_json::from_str(&store.value().unwrap()).unwrap();
        assert_eq!(stored, ledger.list());
    }
}
