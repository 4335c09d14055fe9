//! Mock detectors for testing
//!
//! Configurable implementations of the Detector trait for exercising the
//! registry boundary, ranking stability and the escalation decision.

use magicinput_core::{ClassificationResult, FormatType};
use magicinput_detectors::{ClassificationEngine, Detector, DetectorRegistry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A configurable mock detector
pub struct MockDetector {
    name: String,
    format: FormatType,
    confidence: u8,
    trigger: Option<String>,
    simulated_latency: Option<Duration>,
    call_count: AtomicU32,
}

impl MockDetector {
    /// Create a mock that matches everything
    pub fn new(name: &str, format: FormatType, confidence: u8) -> Self {
        Self {
            name: name.to_string(),
            format,
            confidence,
            trigger: None,
            simulated_latency: None,
            call_count: AtomicU32::new(0),
        }
    }

    /// Only match content containing `trigger`
    pub fn with_trigger(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_string());
        self
    }

    /// Block the calling thread before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = Some(latency);
        self
    }

    /// Get the number of times test was called
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Detector for MockDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self) -> FormatType {
        self.format
    }

    fn test(&self, content: &str) -> Option<ClassificationResult> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.simulated_latency {
            std::thread::sleep(latency);
        }
        if let Some(trigger) = &self.trigger {
            if !content.contains(trigger.as_str()) {
                return None;
            }
        }

        Some(ClassificationResult::new(self.format, self.confidence, &self.name))
    }
}

/// A detector that always panics - for testing the registry boundary
pub struct PanickingDetector;

impl Detector for PanickingDetector {
    fn name(&self) -> &str {
        "panicking"
    }

    fn format(&self) -> FormatType {
        FormatType::Json
    }

    fn test(&self, _content: &str) -> Option<ClassificationResult> {
        panic!("Simulated detector failure")
    }
}

/// A detector that reports a format it does not own
pub struct MislabeledDetector;

impl Detector for MislabeledDetector {
    fn name(&self) -> &str {
        "mislabeled"
    }

    fn format(&self) -> FormatType {
        FormatType::Hash
    }

    fn test(&self, _content: &str) -> Option<ClassificationResult> {
        Some(ClassificationResult::new(FormatType::Uuid, 99, "not mine"))
    }
}

fn engine_with(detectors: Vec<Arc<dyn Detector>>) -> ClassificationEngine {
    ClassificationEngine::new(Arc::new(DetectorRegistry::from_detectors(detectors).unwrap()))
}

fn labels(results: &[ClassificationResult]) -> Vec<&str> {
    results.iter().map(|r| r.label.as_str()).collect()
}

#[test]
fn test_panicking_detector_is_no_match() {
    let engine = engine_with(vec![
        Arc::new(PanickingDetector),
        Arc::new(MockDetector::new("url", FormatType::Url, 90)),
        Arc::new(MockDetector::new("text", FormatType::Text, 10)),
    ]);

    let classification = engine.classify("anything");
    assert_eq!(labels(&classification.results), vec!["url", "text"]);
    assert!(!classification.escalate);
}

#[test]
fn test_mislabeled_result_discarded() {
    let engine = engine_with(vec![
        Arc::new(MislabeledDetector),
        Arc::new(MockDetector::new("text", FormatType::Text, 10)),
    ]);

    let classification = engine.classify("anything");
    assert_eq!(labels(&classification.results), vec!["text"]);
    assert!(classification.escalate);
}

#[test]
fn test_ties_keep_registry_order() {
    let engine = engine_with(vec![
        Arc::new(MockDetector::new("first", FormatType::Hash, 50)),
        Arc::new(MockDetector::new("text", FormatType::Text, 10)),
        Arc::new(MockDetector::new("second", FormatType::Base64, 50)),
        Arc::new(MockDetector::new("third", FormatType::Phone, 50)),
    ]);

    let classification = engine.classify("anything");
    assert_eq!(
        labels(&classification.results),
        vec!["first", "second", "third", "text"]
    );
}

#[test]
fn test_catch_all_top_only_decides_escalation() {
    // A structural match below the catch-all does not suppress escalation.
    let engine = engine_with(vec![
        Arc::new(MockDetector::new("math", FormatType::Math, 5)),
        Arc::new(MockDetector::new("text", FormatType::Text, 10)),
    ]);

    let classification = engine.classify("anything");
    assert_eq!(labels(&classification.results), vec!["text", "math"]);
    assert!(classification.escalate);
}

#[test]
fn test_empty_registry_escalates_non_blank_input() {
    let engine = engine_with(Vec::new());

    let classification = engine.classify("anything");
    assert!(classification.is_empty());
    assert!(classification.escalate);

    assert!(!engine.classify("   ").escalate);
}

#[test]
fn test_each_detector_runs_once_per_classification() {
    let url = Arc::new(MockDetector::new("url", FormatType::Url, 90).with_trigger("://"));
    let text = Arc::new(MockDetector::new("text", FormatType::Text, 10));
    let engine = engine_with(vec![url.clone(), text.clone()]);

    engine.classify("plain words");
    engine.classify("https://example.com");

    assert_eq!(url.call_count(), 2);
    assert_eq!(text.call_count(), 2);
}

#[test]
fn test_blank_input_skips_detectors() {
    let text = Arc::new(MockDetector::new("text", FormatType::Text, 10));
    let engine = engine_with(vec![text.clone()]);

    engine.classify("");
    assert_eq!(text.call_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_order_independent_of_completion() {
    // The first-registered detector finishes last.
    let engine = engine_with(vec![
        Arc::new(
            MockDetector::new("slow", FormatType::Hash, 50).with_latency(Duration::from_millis(50)),
        ),
        Arc::new(MockDetector::new("fast", FormatType::Base64, 50)),
        Arc::new(PanickingDetector),
        Arc::new(MockDetector::new("text", FormatType::Text, 10)),
    ]);

    let concurrent = engine.classify_concurrent("anything").await;
    assert_eq!(labels(&concurrent.results), vec!["slow", "fast", "text"]);
    assert_eq!(concurrent, engine.classify("anything"));
}
