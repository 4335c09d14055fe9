//! Time-related detectors: UNIX timestamps, calendar dates and cron schedules

use crate::detector::{compile, single_token, Detector};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;

/// Earliest plausible timestamp: 2000-01-01T00:00:00Z
pub const TIMESTAMP_MIN_SECS: i64 = 946_684_800;

/// Latest plausible timestamp (exclusive): 2100-01-01T00:00:00Z
pub const TIMESTAMP_MAX_SECS: i64 = 4_102_444_800;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// UNIX timestamp detector (seconds or milliseconds).
///
/// The plausibility window is fixed rather than relative to the current
/// time, so results never depend on when the detector runs.
pub struct TimestampDetector;

impl Detector for TimestampDetector {
    fn name(&self) -> &str {
        "timestamp"
    }

    fn format(&self) -> FormatType {
        FormatType::Timestamp
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let value: i64 = token.parse().ok()?;
        let (unit, datetime) = match token.len() {
            10 => ("seconds", DateTime::<Utc>::from_timestamp(value, 0)?),
            13 => ("milliseconds", DateTime::<Utc>::from_timestamp_millis(value)?),
            _ => return None,
        };

        let secs = datetime.timestamp();
        if !(TIMESTAMP_MIN_SECS..TIMESTAMP_MAX_SECS).contains(&secs) {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Timestamp, 80, "Timestamp")
                .with_field("Unit", unit)
                .with_field("UTC", datetime.format(DISPLAY_FORMAT).to_string())
                .with_field("ISO 8601", datetime.to_rfc3339())
                .with_field("Weekday", datetime.weekday().to_string()),
        )
    }
}

/// Calendar date / date-time detector
pub struct DateTimeDetector;

impl DateTimeDetector {
    const DATETIME_FORMATS: [&'static str; 3] =
        ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];
    const DATE_FORMATS: [&'static str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    fn parse(text: &str) -> Option<(&'static str, DateTime<Utc>)> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Some(("RFC 3339", dt.with_timezone(&Utc)));
        }
        for fmt in Self::DATETIME_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(text, fmt) {
                return Some(("date-time", naive.and_utc()));
            }
        }
        for fmt in Self::DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
                return Some(("date", date.and_hms_opt(0, 0, 0)?.and_utc()));
            }
        }
        None
    }
}

impl Detector for DateTimeDetector {
    fn name(&self) -> &str {
        "date_time"
    }

    fn format(&self) -> FormatType {
        FormatType::DateTime
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();
        if trimmed.len() > 40 {
            return None;
        }
        let (notation, datetime) = Self::parse(trimmed)?;

        let mut result = ClassificationResult::new(FormatType::DateTime, 88, "Date/Time")
            .with_field("Notation", notation)
            .with_field("Unix seconds", datetime.timestamp().to_string())
            .with_field("Weekday", datetime.weekday().to_string())
            .with_field("Day of year", datetime.ordinal().to_string());
        if notation != "RFC 3339" {
            result = result.with_field("Assumed zone", "UTC");
        }
        Some(result)
    }
}

/// Cron expression detector (5 fields, or 6 with leading seconds)
pub struct CronDetector {
    field: Regex,
    number: Regex,
}

impl CronDetector {
    const NAMES_5: [&'static str; 5] = ["Minute", "Hour", "Day of month", "Month", "Day of week"];

    pub fn new() -> Result<Self> {
        Ok(Self {
            field: compile("cron field", r"^(?:\*|\?|[0-9A-Za-z]+(?:-[0-9A-Za-z]+)?)(?:/\d+)?(?:,(?:\*|[0-9A-Za-z]+(?:-[0-9A-Za-z]+)?)(?:/\d+)?)*$")?,
            number: compile("cron number", r"\d+")?,
        })
    }

    fn within(&self, field: &str, max: u32) -> bool {
        // Step values ("*/90") are not bounded by the field range.
        let base = field.split('/').next().unwrap_or(field);
        self.number
            .find_iter(base)
            .all(|m| m.as_str().parse::<u32>().map_or(false, |n| n <= max))
    }
}

impl Detector for CronDetector {
    fn name(&self) -> &str {
        "cron"
    }

    fn format(&self) -> FormatType {
        FormatType::Cron
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let fields: Vec<&str> = content.split_whitespace().collect();
        let (names, offset): (Vec<&str>, usize) = match fields.len() {
            5 => (Self::NAMES_5.to_vec(), 0),
            6 => (
                std::iter::once("Second").chain(Self::NAMES_5).collect(),
                1,
            ),
            _ => return None,
        };

        if !fields.iter().all(|f| self.field.is_match(f)) {
            return None;
        }
        if !fields.iter().any(|f| f.contains(['*', '/', ','])) {
            return None;
        }
        // Names (JAN, MON) are only valid in the month and weekday fields.
        if fields[..offset + 3]
            .iter()
            .any(|f| f.chars().any(|c| c.is_ascii_alphabetic()))
        {
            return None;
        }
        if offset == 1 && !self.within(fields[0], 59) {
            return None;
        }
        if !self.within(fields[offset], 59)
            || !self.within(fields[offset + 1], 23)
            || !self.within(fields[offset + 2], 31)
        {
            return None;
        }

        let mut result = ClassificationResult::new(FormatType::Cron, 70, "Cron");
        for (name, value) in names.iter().zip(&fields) {
            result = result.with_field(*name, *value);
        }
        Some(result)
    }
}
