//! Detector trait and common helpers

use magicinput_core::{ClassificationResult, FormatType};
use regex::Regex;

/// Trait for all detectors.
///
/// A detector is a pure predicate plus extractor over a text value. `test`
/// must be total: no I/O, no blocking, no hidden state, and the same input
/// always yields the same result.
pub trait Detector: Send + Sync {
    /// Get the detector name
    fn name(&self) -> &str;

    /// The single format this detector reports
    fn format(&self) -> FormatType;

    /// Test the content, returning a fully populated result on a match
    fn test(&self, content: &str) -> Option<ClassificationResult>;
}

/// Compile a regex, mapping failures into a detector error
pub(crate) fn compile(name: &str, pattern: &str) -> magicinput_core::Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        magicinput_core::Error::detector(format!("Failed to compile {} regex: {}", name, e))
    })
}

/// Trimmed single-token candidate, or `None` if the content contains
/// interior whitespace or is empty
pub(crate) fn single_token(content: &str) -> Option<&str> {
    let trimmed = content.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        None
    } else {
        Some(trimmed)
    }
}

/// Shorten a string for display, counting characters rather than bytes
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
