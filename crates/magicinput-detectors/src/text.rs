//! Catch-all plain text detector

use crate::detector::Detector;
use magicinput_core::{ClassificationResult, FormatType};

/// Lowest-confidence detector that matches any non-blank content, so a
/// classification is never empty for real input.
pub struct PlainTextDetector;

impl PlainTextDetector {
    pub const CONFIDENCE: u8 = 10;

    fn script(c: char) -> Option<&'static str> {
        match c as u32 {
            _ if c.is_ascii_alphabetic() => Some("Latin"),
            0x00C0..=0x024F => Some("Latin"),
            0x0370..=0x03FF => Some("Greek"),
            0x0400..=0x04FF => Some("Cyrillic"),
            0x0590..=0x05FF => Some("Hebrew"),
            0x0600..=0x06FF => Some("Arabic"),
            0x0E00..=0x0E7F => Some("Thai"),
            0x1100..=0x11FF | 0xAC00..=0xD7AF => Some("Hangul"),
            0x3040..=0x30FF => Some("Kana"),
            0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF => Some("CJK"),
            _ => None,
        }
    }

    /// Dominant writing system of the letters in `content`
    fn script_hint(content: &str) -> &'static str {
        let mut counts: Vec<(&'static str, usize)> = Vec::new();
        let mut total = 0usize;
        for script in content.chars().filter_map(Self::script) {
            total += 1;
            match counts.iter_mut().find(|(name, _)| *name == script) {
                Some((_, n)) => *n += 1,
                None => counts.push((script, 1)),
            }
        }

        match counts.iter().max_by_key(|(_, n)| *n) {
            None => "none",
            Some((name, n)) if n * 2 > total => *name,
            Some(_) => "mixed",
        }
    }
}

impl Detector for PlainTextDetector {
    fn name(&self) -> &str {
        "text"
    }

    fn format(&self) -> FormatType {
        FormatType::Text
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        if content.trim().is_empty() {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Text, Self::CONFIDENCE, "Text")
                .with_field("Characters", content.chars().count().to_string())
                .with_field("Words", content.split_whitespace().count().to_string())
                .with_field("Lines", content.lines().count().to_string())
                .with_field("Script", Self::script_hint(content)),
        )
    }
}
