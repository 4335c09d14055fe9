//! Classification engine: fan out to every detector, rank, decide escalation
//!
//! The engine holds no state between calls. Ranking is a post-processing
//! step over the collected matches, so the sequential and concurrent paths
//! produce identical output for the same input.

use crate::registry::DetectorRegistry;
use futures::future::join_all;
use magicinput_core::{ClassificationResult, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Ranked matches for one input plus the escalation decision
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// Matches sorted by confidence descending, ties in registry order
    pub results: Vec<ClassificationResult>,

    /// True when nothing matched or the top match is the catch-all
    pub escalate: bool,
}

impl Classification {
    /// Highest-ranked match
    pub fn top(&self) -> Option<&ClassificationResult> {
        self.results.first()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Runs the registry against input text
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    registry: Arc<DetectorRegistry>,
}

impl ClassificationEngine {
    /// Create an engine over an existing registry
    pub fn new(registry: Arc<DetectorRegistry>) -> Self {
        Self { registry }
    }

    /// Create an engine over the built-in detector set
    pub fn builtin() -> Result<Self> {
        Ok(Self::new(Arc::new(DetectorRegistry::builtin()?)))
    }

    pub fn registry(&self) -> &Arc<DetectorRegistry> {
        &self.registry
    }

    /// Classify content, running detectors one after another
    pub fn classify(&self, content: &str) -> Classification {
        if content.trim().is_empty() {
            return Classification::default();
        }

        let start = Instant::now();
        let matches: Vec<(usize, ClassificationResult)> = (0..self.registry.len())
            .filter_map(|index| self.registry.run(index, content).map(|r| (index, r)))
            .collect();

        let classification = rank(matches);
        record_metrics(&classification, start);
        classification
    }

    /// Classify content with every detector on the blocking thread pool.
    ///
    /// Completion order is irrelevant: matches carry their registry index
    /// and are ranked only after all detectors have finished.
    pub async fn classify_concurrent(&self, content: &str) -> Classification {
        if content.trim().is_empty() {
            return Classification::default();
        }

        let start = Instant::now();
        let content: Arc<str> = Arc::from(content);

        let handles: Vec<_> = (0..self.registry.len())
            .map(|index| {
                let registry = Arc::clone(&self.registry);
                let content = Arc::clone(&content);
                tokio::task::spawn_blocking(move || {
                    registry.run(index, &content).map(|r| (index, r))
                })
            })
            .collect();

        let mut matches = Vec::with_capacity(handles.len());
        for joined in join_all(handles).await {
            match joined {
                Ok(Some(found)) => matches.push(found),
                Ok(None) => {}
                Err(e) => warn!("Detector task failed: {}", e),
            }
        }

        let classification = rank(matches);
        record_metrics(&classification, start);
        classification
    }
}

/// Sort by `(confidence desc, registry index asc)` and derive `escalate`
fn rank(mut matches: Vec<(usize, ClassificationResult)>) -> Classification {
    matches.sort_by(|(ia, a), (ib, b)| b.confidence.cmp(&a.confidence).then(ia.cmp(ib)));

    let results: Vec<ClassificationResult> = matches.into_iter().map(|(_, r)| r).collect();
    let escalate = results.first().map_or(true, ClassificationResult::is_catch_all);

    Classification { results, escalate }
}

fn record_metrics(classification: &Classification, start: Instant) {
    let latency_us = start.elapsed().as_micros() as u64;
    metrics::counter!("magicinput_classifications_total").increment(1);
    metrics::histogram!("magicinput_classify_latency_us").record(latency_us as f64);

    debug!(
        matches = classification.results.len(),
        top = classification.top().map(|r| r.format_type.as_str()),
        escalate = classification.escalate,
        latency_us,
        "Classified content"
    );
}
