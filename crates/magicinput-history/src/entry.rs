//! History entry type

use chrono::{DateTime, Utc};
use magicinput_core::ClassificationResult;
use serde::{Deserialize, Serialize};

/// One past analysis: an input snippet and the ranked local results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Creation time in epoch milliseconds, unique and strictly increasing
    pub id: u64,

    /// Input truncated to the ledger's snippet length
    #[serde(rename = "content")]
    pub content_snippet: String,

    /// When the analysis was recorded
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Utc>,

    /// Ranked results at the time of recording
    #[serde(default)]
    pub results: Vec<ClassificationResult>,
}

impl HistoryEntry {
    /// Label of the top result, for compact listings
    pub fn summary_label(&self) -> Option<&str> {
        self.results.first().map(|r| r.label.as_str())
    }
}

/// Truncate to at most `max_chars` characters without splitting one
pub fn truncate_snippet(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => content[..byte_idx].to_string(),
        None => content.to_string(),
    }
}
