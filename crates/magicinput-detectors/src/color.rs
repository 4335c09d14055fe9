//! Color value detector: hex notation and CSS `rgb()`/`hsl()` functions

use crate::detector::{compile, single_token, Detector};
use magicinput_core::{ClassificationResult, FormatType, Result};
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    a: Option<f64>,
}

impl Rgba {
    fn hex(&self) -> String {
        match self.a {
            Some(a) => format!(
                "#{:02X}{:02X}{:02X}{:02X}",
                self.r,
                self.g,
                self.b,
                (a * 255.0).round() as u8
            ),
            None => format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b),
        }
    }

    fn rgb(&self) -> String {
        match self.a {
            Some(a) => format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, round2(a)),
            None => format!("rgb({}, {}, {})", self.r, self.g, self.b),
        }
    }

    fn hsl(&self) -> String {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        let d = max - min;

        let (h, s) = if d == 0.0 {
            (0.0, 0.0)
        } else {
            let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
            let h = if max == r {
                ((g - b) / d).rem_euclid(6.0)
            } else if max == g {
                (b - r) / d + 2.0
            } else {
                (r - g) / d + 4.0
            };
            (h * 60.0, s)
        };

        let (h, s, l) = (h.round() as u32 % 360, (s * 100.0).round(), (l * 100.0).round());
        match self.a {
            Some(a) => format!("hsla({}, {}%, {}%, {})", h, s, l, round2(a)),
            None => format!("hsl({}, {}%, {}%)", h, s, l),
        }
    }

    fn from_hsl(h: f64, s: f64, l: f64, a: Option<f64>) -> Self {
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let hp = h.rem_euclid(360.0) / 60.0;
        let x = c * (1.0 - (hp.rem_euclid(2.0) - 1.0).abs());
        let (r1, g1, b1) = match hp as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Self {
            r: channel(r1),
            g: channel(g1),
            b: channel(b1),
            a,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Parse a number with an optional `%` suffix; percentages scale to `full`
fn parse_component(raw: &str, full: f64) -> Option<f64> {
    let raw = raw.trim();
    match raw.strip_suffix('%') {
        Some(pct) => pct.trim().parse::<f64>().ok().map(|p| p / 100.0 * full),
        None => raw.parse::<f64>().ok(),
    }
    .filter(|v| v.is_finite())
}

fn parse_alpha(raw: &str) -> Option<f64> {
    parse_component(raw, 1.0).filter(|a| (0.0..=1.0).contains(a))
}

/// Color detector
pub struct ColorDetector {
    hex: Regex,
    bare_hex: Regex,
    function: Regex,
}

impl ColorDetector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            hex: compile(
                "hex color",
                r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})$",
            )?,
            bare_hex: compile("bare hex color", r"^[0-9a-fA-F]{6}$")?,
            function: compile("color function", r"^(?i)(rgba?|hsla?)\(\s*([^()]*)\)$")?,
        })
    }

    fn expand_hex(digits: &str) -> Option<Rgba> {
        let expanded: String = if digits.len() <= 4 {
            digits.chars().flat_map(|c| [c, c]).collect()
        } else {
            digits.to_string()
        };
        let byte = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
        Some(Rgba {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: if expanded.len() == 8 {
                Some(byte(6)? as f64 / 255.0)
            } else {
                None
            },
        })
    }

    fn parse_function(name: &str, args: &str) -> Option<Rgba> {
        let parts: Vec<&str> = args
            .split([',', '/', ' '])
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if !(3..=4).contains(&parts.len()) {
            return None;
        }
        let alpha = match parts.get(3) {
            Some(raw) => Some(parse_alpha(raw)?),
            None => None,
        };

        if name.starts_with("rgb") {
            let mut channels = [0u8; 3];
            for (slot, raw) in channels.iter_mut().zip(&parts[..3]) {
                let value = parse_component(raw, 255.0)?;
                if !(0.0..=255.0).contains(&value) {
                    return None;
                }
                *slot = value.round() as u8;
            }
            Some(Rgba {
                r: channels[0],
                g: channels[1],
                b: channels[2],
                a: alpha,
            })
        } else {
            let hue = parts[0].trim_end_matches("deg").parse::<f64>().ok()?;
            let s = parts[1].strip_suffix('%')?.parse::<f64>().ok()?;
            let l = parts[2].strip_suffix('%')?.parse::<f64>().ok()?;
            if !hue.is_finite() || !(0.0..=100.0).contains(&s) || !(0.0..=100.0).contains(&l) {
                return None;
            }
            Some(Rgba::from_hsl(hue, s / 100.0, l / 100.0, alpha))
        }
    }

    fn describe(color: Rgba, confidence: u8, notation: &str) -> ClassificationResult {
        let mut result = ClassificationResult::new(FormatType::Color, confidence, "Color")
            .with_field("Notation", notation)
            .with_field("Hex", color.hex())
            .with_field("RGB", color.rgb())
            .with_field("HSL", color.hsl());
        if let Some(a) = color.a {
            result = result.with_field("Alpha", round2(a).to_string());
        }
        result
    }
}

impl Detector for ColorDetector {
    fn name(&self) -> &str {
        "color"
    }

    fn format(&self) -> FormatType {
        FormatType::Color
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        let trimmed = content.trim();

        if let Some(caps) = self.function.captures(trimmed) {
            let name = caps[1].to_ascii_lowercase();
            let color = Self::parse_function(&name, &caps[2])?;
            return Some(Self::describe(color, 95, &name));
        }

        let token = single_token(trimmed)?;
        if let Some(caps) = self.hex.captures(token) {
            let color = Self::expand_hex(&caps[1])?;
            return Some(Self::describe(color, 85, "hex"));
        }

        if self.bare_hex.is_match(token)
            && token.chars().any(|c| c.is_ascii_digit())
            && token.chars().any(|c| c.is_ascii_alphabetic())
        {
            let color = Self::expand_hex(token)?;
            return Some(Self::describe(color, 55, "hex (no #)"));
        }

        None
    }
}
