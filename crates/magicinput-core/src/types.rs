//! Core types for Magic Input

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of the confidence scale
pub const MAX_CONFIDENCE: u8 = 100;

/// Content formats the detectors recognize.
///
/// The set is closed: adding a format means adding a variant here and
/// registering its detector at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatType {
    Uuid,
    Jwt,
    Json,
    Image,
    Url,
    Email,
    IpAddress,
    CryptoAddress,
    DateTime,
    Color,
    Coordinate,
    Timestamp,
    NumberBase,
    Markup,
    Sql,
    Command,
    Hash,
    Base64,
    Phone,
    Cron,
    Math,
    FilePath,
    /// Catch-all for unstructured text
    Text,
}

impl FormatType {
    /// Every format, in declaration order
    pub const ALL: [FormatType; 23] = [
        Self::Uuid,
        Self::Jwt,
        Self::Json,
        Self::Image,
        Self::Url,
        Self::Email,
        Self::IpAddress,
        Self::CryptoAddress,
        Self::DateTime,
        Self::Color,
        Self::Coordinate,
        Self::Timestamp,
        Self::NumberBase,
        Self::Markup,
        Self::Sql,
        Self::Command,
        Self::Hash,
        Self::Base64,
        Self::Phone,
        Self::Cron,
        Self::Math,
        Self::FilePath,
        Self::Text,
    ];

    /// Stable wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uuid => "uuid",
            Self::Jwt => "jwt",
            Self::Json => "json",
            Self::Image => "image",
            Self::Url => "url",
            Self::Email => "email",
            Self::IpAddress => "ip_address",
            Self::CryptoAddress => "crypto_address",
            Self::DateTime => "date_time",
            Self::Color => "color",
            Self::Coordinate => "coordinate",
            Self::Timestamp => "timestamp",
            Self::NumberBase => "number_base",
            Self::Markup => "markup",
            Self::Sql => "sql",
            Self::Command => "command",
            Self::Hash => "hash",
            Self::Base64 => "base64",
            Self::Phone => "phone",
            Self::Cron => "cron",
            Self::Math => "math",
            Self::FilePath => "file_path",
            Self::Text => "text",
        }
    }

    /// Whether this is the catch-all plain-text tag
    pub fn is_catch_all(&self) -> bool {
        matches!(self, Self::Text)
    }
}

impl fmt::Display for FormatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named value shown alongside a match, e.g. `("Decimal", "255")`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayField {
    pub name: String,
    pub value: String,
}

impl DisplayField {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Output of one detector match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Which detector produced this result
    #[serde(rename = "type")]
    pub format_type: FormatType,

    /// Certainty of the match (0-100)
    pub confidence: u8,

    /// Short human-readable tag
    pub label: String,

    /// Format-specific parsed components
    #[serde(default)]
    pub display_fields: Vec<DisplayField>,
}

impl ClassificationResult {
    /// Create a new result; confidence is clamped to the 0-100 scale
    pub fn new(format_type: FormatType, confidence: u8, label: impl Into<String>) -> Self {
        Self {
            format_type,
            confidence: confidence.min(MAX_CONFIDENCE),
            label: label.into(),
            display_fields: Vec::new(),
        }
    }

    /// Append a display field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.display_fields.push(DisplayField::new(name, value));
        self
    }

    /// Look up a display field value by name
    pub fn field(&self, name: &str) -> Option<&str> {
        self.display_fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Whether this result came from the catch-all detector
    pub fn is_catch_all(&self) -> bool {
        self.format_type.is_catch_all()
    }
}

/// Result returned by the external semantic-analysis service.
///
/// Field names on the wire follow the service's JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalatedResult {
    /// Broad classification, e.g. "plaintext", "code"
    #[serde(default)]
    pub classification: String,

    /// Specific type within the classification, e.g. "color"
    #[serde(rename = "type", default)]
    pub format_type: String,

    /// Human-readable category name
    #[serde(rename = "classify", default)]
    pub category: String,

    /// Confidence rendered as a percentage string, e.g. "85%"
    #[serde(rename = "percent", default)]
    pub confidence_percent: String,

    /// Free-text analysis
    #[serde(rename = "result", default)]
    pub analysis: String,

    /// Recommended next action
    #[serde(default)]
    pub suggestion: String,
}

impl EscalatedResult {
    pub const DEFAULT_CLASSIFICATION: &'static str = "unknown";
    pub const DEFAULT_TYPE: &'static str = "text";
    pub const DEFAULT_CATEGORY: &'static str = "Unknown type";
    pub const DEFAULT_PERCENT: &'static str = "50%";
    pub const DEFAULT_ANALYSIS: &'static str = "Undetermined";
    pub const DEFAULT_SUGGESTION: &'static str = "Consider further analysis";

    /// Fill every blank field with its default
    pub fn normalize(mut self) -> Self {
        fill(&mut self.classification, Self::DEFAULT_CLASSIFICATION);
        fill(&mut self.format_type, Self::DEFAULT_TYPE);
        fill(&mut self.category, Self::DEFAULT_CATEGORY);
        fill(&mut self.confidence_percent, Self::DEFAULT_PERCENT);
        fill(&mut self.analysis, Self::DEFAULT_ANALYSIS);
        fill(&mut self.suggestion, Self::DEFAULT_SUGGESTION);
        self
    }

    /// Numeric value of `confidence_percent`, if it parses
    pub fn confidence_value(&self) -> Option<f32> {
        self.confidence_percent
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f32>()
            .ok()
    }

    /// Presentation band of the confidence
    pub fn band(&self) -> ConfidenceBand {
        match self.confidence_value() {
            Some(v) if v >= 80.0 => ConfidenceBand::High,
            Some(v) if v >= 50.0 => ConfidenceBand::Medium,
            _ => ConfidenceBand::Low,
        }
    }
}

fn fill(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        *field = default.to_string();
    }
}

/// Presentation band for an escalated result's confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Medium,
    Low,
}

/// A chat message sent to the escalation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_tags_match_serde() {
        for format in FormatType::ALL {
            let json = serde_json::to_string(&format).unwrap();
            assert_eq!(json, format!("\"{}\"", format.as_str()));
        }
    }

    #[test]
    fn test_only_text_is_catch_all() {
        let catch_all: Vec<_> = FormatType::ALL
            .iter()
            .filter(|f| f.is_catch_all())
            .collect();
        assert_eq!(catch_all, vec![&FormatType::Text]);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let result = ClassificationResult::new(FormatType::Uuid, 250, "UUID");
        assert_eq!(result.confidence, MAX_CONFIDENCE);
    }

    #[test]
    fn test_result_wire_shape() {
        let result = ClassificationResult::new(FormatType::Color, 85, "Color")
            .with_field("Hex", "#FF5733");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "color");
        assert_eq!(value["confidence"], 85);
        assert_eq!(value["display_fields"][0]["value"], "#FF5733");
        assert_eq!(result.field("Hex"), Some("#FF5733"));
    }

    #[test]
    fn test_escalated_result_defaults() {
        let parsed: EscalatedResult =
            serde_json::from_str(r#"{"type":"color","percent":"85%"}"#).unwrap();
        let normalized = parsed.normalize();

        assert_eq!(normalized.format_type, "color");
        assert_eq!(normalized.classification, "unknown");
        assert_eq!(normalized.category, "Unknown type");
        assert_eq!(normalized.analysis, "Undetermined");
        assert_eq!(normalized.confidence_value(), Some(85.0));
        assert_eq!(normalized.band(), ConfidenceBand::High);
    }

    #[test]
    fn test_confidence_bands() {
        let mut result = EscalatedResult {
            classification: "plaintext".into(),
            format_type: "poem".into(),
            category: "Poetry".into(),
            confidence_percent: " 55 % ".into(),
            analysis: "A line of classical poetry".into(),
            suggestion: "Look up the full poem".into(),
        };
        assert_eq!(result.band(), ConfidenceBand::Medium);

        result.confidence_percent = "about half".into();
        assert_eq!(result.confidence_value(), None);
        assert_eq!(result.band(), ConfidenceBand::Low);
    }
}
