//! Detector registry initialization and the per-detector execution boundary

use crate::code::{CommandDetector, FilePathDetector, SqlDetector};
use crate::color::ColorDetector;
use crate::contact::{EmailDetector, PhoneDetector};
use crate::detector::Detector;
use crate::encoding::{Base64Detector, CryptoAddressDetector, HashDetector, NumberBaseDetector};
use crate::geo::CoordinateDetector;
use crate::math::MathDetector;
use crate::network::{ImageDetector, IpDetector, UrlDetector};
use crate::structured::{JsonDetector, JwtDetector, MarkupDetector, UuidDetector};
use crate::temporal::{CronDetector, DateTimeDetector, TimestampDetector};
use crate::text::PlainTextDetector;
use magicinput_core::{ClassificationResult, Error, Result};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{info, warn};

/// Ordered, immutable set of detectors.
///
/// Registration order is significant: it is the tie-breaker when two
/// detectors report the same confidence.
#[derive(Clone)]
pub struct DetectorRegistry {
    detectors: Vec<Arc<dyn Detector>>,
}

impl DetectorRegistry {
    /// Build the registry with every built-in detector
    pub fn builtin() -> Result<Self> {
        let detectors: Vec<Arc<dyn Detector>> = vec![
            Arc::new(UuidDetector),
            Arc::new(JwtDetector::new()?),
            Arc::new(JsonDetector),
            Arc::new(ImageDetector::new()?),
            Arc::new(UrlDetector),
            Arc::new(EmailDetector::new()?),
            Arc::new(IpDetector),
            Arc::new(CryptoAddressDetector::new()?),
            Arc::new(DateTimeDetector),
            Arc::new(ColorDetector::new()?),
            Arc::new(CoordinateDetector::new()?),
            Arc::new(TimestampDetector),
            Arc::new(NumberBaseDetector::new()?),
            Arc::new(MarkupDetector::new()?),
            Arc::new(SqlDetector::new()?),
            Arc::new(CommandDetector::new()?),
            Arc::new(HashDetector),
            Arc::new(Base64Detector::new()?),
            Arc::new(PhoneDetector::new()?),
            Arc::new(CronDetector::new()?),
            Arc::new(MathDetector::new()?),
            Arc::new(FilePathDetector::new()?),
            Arc::new(PlainTextDetector),
        ];

        let registry = Self::from_detectors(detectors)?;
        info!("Initialized {} detectors", registry.len());
        Ok(registry)
    }

    /// Build a registry from an explicit detector list, preserving order.
    ///
    /// Detector names must be unique.
    pub fn from_detectors(detectors: Vec<Arc<dyn Detector>>) -> Result<Self> {
        for (i, detector) in detectors.iter().enumerate() {
            if detectors[..i].iter().any(|d| d.name() == detector.name()) {
                return Err(Error::detector(format!(
                    "Duplicate detector name: {}",
                    detector.name()
                )));
            }
        }
        Ok(Self { detectors })
    }

    /// Get the number of registered detectors
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Get a detector by registration index
    pub fn get(&self, index: usize) -> Option<&Arc<dyn Detector>> {
        self.detectors.get(index)
    }

    /// Iterate detectors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Detector>> {
        self.detectors.iter()
    }

    /// Names of all detectors in registration order
    pub fn names(&self) -> Vec<&str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run one detector in isolation.
    ///
    /// A panic inside the detector, or a result tagged with a format the
    /// detector does not own, is logged and treated as "no match".
    pub fn run(&self, index: usize, content: &str) -> Option<ClassificationResult> {
        let detector = self.detectors.get(index)?;
        run_isolated(detector.as_ref(), content)
    }
}

/// Execute a detector, containing panics and dropping mislabeled results
pub(crate) fn run_isolated(detector: &dyn Detector, content: &str) -> Option<ClassificationResult> {
    let outcome = catch_unwind(AssertUnwindSafe(|| detector.test(content)));
    match outcome {
        Ok(Some(result)) if result.format_type == detector.format() => Some(result),
        Ok(Some(result)) => {
            warn!(
                detector = detector.name(),
                reported = %result.format_type,
                "Detector reported a foreign format, discarding"
            );
            None
        }
        Ok(None) => None,
        Err(_) => {
            warn!(detector = detector.name(), "Detector panicked, treating as no match");
            None
        }
    }
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field("detectors", &self.names())
            .finish()
    }
}
