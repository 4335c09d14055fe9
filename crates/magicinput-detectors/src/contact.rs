//! Contact detail detectors (email, phone) using regex patterns

use crate::detector::{compile, single_token, Detector};
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;

/// Email address detector
pub struct EmailDetector {
    email_regex: Regex,
}

impl EmailDetector {
    /// Create a new email detector
    pub fn new() -> Result<Self> {
        Ok(Self {
            email_regex: compile(
                "email",
                r"^([A-Za-z0-9._%+-]+)@([A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,})$",
            )?,
        })
    }
}

impl Detector for EmailDetector {
    fn name(&self) -> &str {
        "email"
    }

    fn format(&self) -> FormatType {
        FormatType::Email
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let token = single_token(content)?;
        let caps = self.email_regex.captures(token)?;

        Some(
            ClassificationResult::new(FormatType::Email, 92, "Email")
                .with_field("User", &caps[1])
                .with_field("Domain", caps[2].to_ascii_lowercase()),
        )
    }
}

/// Phone number detector
pub struct PhoneDetector {
    phone_regex: Regex,
    date_regex: Regex,
}

impl PhoneDetector {
    /// Create a new phone detector
    pub fn new() -> Result<Self> {
        Ok(Self {
            phone_regex: compile("phone", r"^\+?\(?\d[\d\s()-]{5,22}\d$")?,
            date_regex: compile("phone date guard", r"^\d{4}-\d{1,2}-\d{1,2}$")?,
        })
    }
}

impl Detector for PhoneDetector {
    fn name(&self) -> &str {
        "phone"
    }

    fn format(&self) -> FormatType {
        FormatType::Phone
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();
        if !self.phone_regex.is_match(trimmed) || self.date_regex.is_match(trimmed) {
            return None;
        }

        let digits: String = trimmed.chars().filter(char::is_ascii_digit).collect();
        if !(7..=15).contains(&digits.len()) {
            return None;
        }

        // A country or trunk prefix may be one digit; a list of single digits is not a number.
        let single_digit_groups = trimmed
            .split(|c: char| !c.is_ascii_digit())
            .filter(|group| group.len() == 1)
            .count();
        if single_digit_groups > 1 {
            return None;
        }

        let international = trimmed.starts_with('+');
        let separated = trimmed.contains([' ', '-', '(']);
        // Unseparated digit runs are timestamps or plain numbers more often than phones.
        if !international && !separated {
            return None;
        }

        let normalized = if international {
            format!("+{}", digits)
        } else {
            digits
        };

        Some(
            ClassificationResult::new(FormatType::Phone, 70, "Phone")
                .with_field("Number", normalized)
                .with_field("International", if international { "yes" } else { "no" }),
        )
    }
}
