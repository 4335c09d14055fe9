//! Geographic coordinate detector

use crate::detector::{compile, Detector};
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;

/// `lat, lng` decimal coordinate detector
pub struct CoordinateDetector {
    pair: Regex,
}

impl CoordinateDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pair: compile(
                "coordinate",
                r"^\(?\s*([+-]?\d{1,3}(?:\.\d+)?)\s*[,，]\s*([+-]?\d{1,3}(?:\.\d+)?)\s*\)?$",
            )?,
        })
    }

    fn hemisphere(value: f64, positive: char, negative: char) -> String {
        let marker = if value >= 0.0 { positive } else { negative };
        format!("{}° {}", value.abs(), marker)
    }
}

impl Detector for CoordinateDetector {
    fn name(&self) -> &str {
        "coordinate"
    }

    fn format(&self) -> FormatType {
        FormatType::Coordinate
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let caps = self.pair.captures(content.trim())?;
        let (lat_raw, lng_raw) = (&caps[1], &caps[2]);
        // Integer pairs such as "12, 34" are far more often lists than positions.
        if !lat_raw.contains('.') && !lng_raw.contains('.') {
            return None;
        }

        let lat: f64 = lat_raw.parse().ok()?;
        let lng: f64 = lng_raw.parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }

        Some(
            ClassificationResult::new(FormatType::Coordinate, 85, "Coordinate")
                .with_field("Latitude", lat.to_string())
                .with_field("Longitude", lng.to_string())
                .with_field(
                    "Position",
                    format!(
                        "{}, {}",
                        Self::hemisphere(lat, 'N', 'S'),
                        Self::hemisphere(lng, 'E', 'W')
                    ),
                )
                .with_field(
                    "Map",
                    format!(
                        "https://www.openstreetmap.org/?mlat={}&mlon={}#map=15/{}/{}",
                        lat, lng, lat, lng
                    ),
                ),
        )
    }
}
