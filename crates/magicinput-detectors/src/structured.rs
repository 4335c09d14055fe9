//! Detectors for structured payloads: UUID, JWT, JSON and markup
//!
//! Each of these attempts a real parse before reporting a match.

use crate::detector::{compile, preview, single_token, Detector};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::DateTime;
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;
use serde_json::{Map, Value};

/// UUID detector backed by the `uuid` parser
pub struct UuidDetector;

impl Detector for UuidDetector {
    fn name(&self) -> &str {
        "uuid"
    }

    fn format(&self) -> FormatType {
        FormatType::Uuid
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        // The bare 32-hex form is indistinguishable from an MD5 digest.
        if !token.contains('-') {
            return None;
        }

        let uuid = uuid::Uuid::try_parse(token).ok()?;
        let version = match uuid.get_version_num() {
            0 if uuid.is_nil() => "nil".to_string(),
            n => format!("v{}", n),
        };

        Some(
            ClassificationResult::new(FormatType::Uuid, 98, "UUID")
                .with_field("Canonical", uuid.hyphenated().to_string())
                .with_field("Version", version)
                .with_field("Variant", format!("{:?}", uuid.get_variant())),
        )
    }
}

/// JSON Web Token detector; header and payload must both decode
pub struct JwtDetector {
    shape: Regex,
}

impl JwtDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            shape: compile("jwt", r"^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+\.[A-Za-z0-9_-]*$")?,
        })
    }

    fn decode_segment(segment: &str) -> Option<Map<String, Value>> {
        let bytes = URL_SAFE_NO_PAD.decode(segment).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl Detector for JwtDetector {
    fn name(&self) -> &str {
        "jwt"
    }

    fn format(&self) -> FormatType {
        FormatType::Jwt
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        if !self.shape.is_match(token) {
            return None;
        }

        let mut segments = token.split('.');
        let header = Self::decode_segment(segments.next()?)?;
        let payload = Self::decode_segment(segments.next()?)?;
        let alg = header.get("alg")?.as_str()?;

        let mut result = ClassificationResult::new(FormatType::Jwt, 97, "JWT")
            .with_field("Algorithm", alg);

        if let Some(typ) = header.get("typ").and_then(Value::as_str) {
            result = result.with_field("Type", typ);
        }
        for (claim, name) in [("sub", "Subject"), ("iss", "Issuer"), ("aud", "Audience")] {
            if let Some(value) = payload.get(claim).and_then(Value::as_str) {
                result = result.with_field(name, value);
            }
        }
        for (claim, name) in [("iat", "Issued At"), ("exp", "Expires")] {
            if let Some(rendered) = payload
                .get(claim)
                .and_then(Value::as_i64)
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
            {
                result = result.with_field(name, rendered.format("%Y-%m-%d %H:%M:%S UTC").to_string());
            }
        }

        Some(result.with_field("Claims", payload.len().to_string()))
    }
}

/// JSON detector; only objects and arrays count as a match
pub struct JsonDetector;

impl JsonDetector {
    fn depth(value: &Value) -> usize {
        match value {
            Value::Object(map) => 1 + map.values().map(Self::depth).max().unwrap_or(0),
            Value::Array(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }
}

impl Detector for JsonDetector {
    fn name(&self) -> &str {
        "json"
    }

    fn format(&self) -> FormatType {
        FormatType::Json
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return None;
        }

        let value: Value = serde_json::from_str(trimmed).ok()?;
        let depth = Self::depth(&value).to_string();

        let result = match &value {
            Value::Object(map) => {
                let keys: Vec<&str> = map.keys().take(8).map(String::as_str).collect();
                ClassificationResult::new(FormatType::Json, 95, "JSON")
                    .with_field("Kind", "object")
                    .with_field("Keys", map.len().to_string())
                    .with_field("Top-level keys", preview(&keys.join(", "), 120))
            }
            Value::Array(items) => ClassificationResult::new(FormatType::Json, 95, "JSON")
                .with_field("Kind", "array")
                .with_field("Length", items.len().to_string()),
            _ => return None,
        };

        Some(result.with_field("Depth", depth))
    }
}

const HTML_TAGS: &[&str] = &[
    "html", "head", "body", "div", "span", "p", "a", "img", "ul", "ol", "li", "table", "tr",
    "td", "th", "form", "input", "button", "script", "style", "link", "meta", "section",
    "article", "header", "footer", "nav", "main", "h1", "h2", "h3", "h4", "h5", "h6", "br",
    "svg", "iframe", "label", "select", "option", "textarea", "pre", "code", "strong", "em",
];

/// HTML / XML detector
pub struct MarkupDetector {
    opening: Regex,
    tags: Regex,
}

impl MarkupDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            opening: compile(
                "markup opening",
                r"^<(?:(\?xml)|!(?i:doctype)\s+([A-Za-z]+)|([A-Za-z][\w:.-]*))[\s/>]",
            )?,
            tags: compile("markup tags", r"<([A-Za-z][\w:.-]*)[\s/>]")?,
        })
    }
}

impl Detector for MarkupDetector {
    fn name(&self) -> &str {
        "markup"
    }

    fn format(&self) -> FormatType {
        FormatType::Markup
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();
        if !(trimmed.starts_with('<') && trimmed.ends_with('>')) {
            return None;
        }

        let caps = self.opening.captures(trimmed)?;
        let mut tags = self.tags.captures_iter(trimmed).map(|c| c[1].to_ascii_lowercase());
        let tag_count = self.tags.find_iter(trimmed).count();

        let (is_html, root) = if caps.get(1).is_some() {
            (false, tags.next().unwrap_or_else(|| "xml".to_string()))
        } else if let Some(doctype) = caps.get(2) {
            let doctype = doctype.as_str().to_ascii_lowercase();
            (doctype == "html", tags.next().unwrap_or(doctype))
        } else {
            let root = caps.get(3)?.as_str().to_ascii_lowercase();
            (HTML_TAGS.contains(&root.as_str()), root)
        };

        let label = if is_html { "HTML" } else { "XML" };
        Some(
            ClassificationResult::new(FormatType::Markup, 80, label)
                .with_field("Language", label)
                .with_field("Root tag", root)
                .with_field("Tags", tag_count.to_string()),
        )
    }
}
