//! Magic Input Detectors
//!
//! Deterministic detectors that recognize the format of a pasted text value,
//! plus the registry and engine that rank their matches.
//!
//! Detectors fall into loose specificity bands:
//! - Structural parses (UUID, JWT, JSON): 95 and above
//! - Shaped values (URL, email, color, timestamps, addresses): 70-92
//! - Loose heuristics (math, paths, binary base64): below 70
//! - Catch-all plain text: 10
//!
//! Every detector is a pure function of its input. Nothing here performs I/O.

pub mod code;
pub mod color;
pub mod contact;
pub mod detector;
pub mod encoding;
pub mod engine;
pub mod geo;
pub mod math;
pub mod network;
pub mod registry;
pub mod structured;
pub mod temporal;
pub mod text;

pub use detector::Detector;
pub use engine::{Classification, ClassificationEngine};
pub use registry::DetectorRegistry;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::code::{CommandDetector, FilePathDetector, SqlDetector};
    pub use crate::color::ColorDetector;
    pub use crate::contact::{EmailDetector, PhoneDetector};
    pub use crate::detector::Detector;
    pub use crate::encoding::{
        Base64Detector, CryptoAddressDetector, HashDetector, NumberBaseDetector,
    };
    pub use crate::engine::{Classification, ClassificationEngine};
    pub use crate::geo::CoordinateDetector;
    pub use crate::math::MathDetector;
    pub use crate::network::{ImageDetector, IpDetector, UrlDetector};
    pub use crate::registry::DetectorRegistry;
    pub use crate::structured::{JsonDetector, JwtDetector, MarkupDetector, UuidDetector};
    pub use crate::temporal::{CronDetector, DateTimeDetector, TimestampDetector};
    pub use crate::text::PlainTextDetector;
}
