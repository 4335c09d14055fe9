//! Analysis orchestration
//!
//! One analysis classifies locally, records the result, and escalates when
//! the local answer is inconclusive. Every non-blank input claims a new
//! generation; an escalation whose generation is no longer current when it
//! completes is dropped rather than reported.

use crate::config::SessionConfig;
use magicinput_core::{EscalatedResult, Error};
use magicinput_detectors::{Classification, ClassificationEngine};
use magicinput_gateway::EscalationGateway;
use magicinput_history::HistoryLedger;
use metrics::counter;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// What happened to the escalation step of one analysis
#[derive(Debug)]
pub enum EscalationOutcome {
    /// Local results were conclusive
    NotNeeded,
    /// Escalation was needed but disabled for this session
    Skipped,
    /// The service answered in time
    Completed(Vec<EscalatedResult>),
    /// The call failed or was never attempted
    Failed(Error),
    /// A newer input arrived first; any response was discarded
    Superseded,
}

impl EscalationOutcome {
    /// Metric label
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotNeeded => "not_needed",
            Self::Skipped => "skipped",
            Self::Completed(_) => "completed",
            Self::Failed(_) => "failed",
            Self::Superseded => "superseded",
        }
    }

    pub fn results(&self) -> Option<&[EscalatedResult]> {
        match self {
            Self::Completed(results) => Some(results),
            _ => None,
        }
    }
}

/// Result of one analysis
#[derive(Debug)]
pub struct AnalysisReport {
    /// Ranked local matches and the escalation decision
    pub classification: Classification,

    /// History entry written for this input, if any
    pub entry_id: Option<u64>,

    pub escalation: EscalationOutcome,
}

impl AnalysisReport {
    fn empty() -> Self {
        Self {
            classification: Classification::default(),
            entry_id: None,
            escalation: EscalationOutcome::NotNeeded,
        }
    }
}

#[derive(Default)]
struct Inflight {
    generation: u64,
    token: Option<CancellationToken>,
}

/// Ties the engine, gateway and ledger together for a sequence of inputs
pub struct AnalysisSession {
    engine: ClassificationEngine,
    gateway: Option<Arc<dyn EscalationGateway>>,
    ledger: Arc<HistoryLedger>,
    timeout: Duration,
    escalate: bool,
    inflight: Mutex<Inflight>,
}

impl AnalysisSession {
    pub fn new(
        engine: ClassificationEngine,
        gateway: Option<Arc<dyn EscalationGateway>>,
        ledger: Arc<HistoryLedger>,
        settings: &SessionConfig,
    ) -> Self {
        Self {
            engine,
            gateway,
            ledger,
            timeout: settings.timeout(),
            escalate: settings.escalate,
            inflight: Mutex::new(Inflight::default()),
        }
    }

    pub fn ledger(&self) -> &Arc<HistoryLedger> {
        &self.ledger
    }

    /// Generation of the most recent non-blank input
    pub fn current_generation(&self) -> u64 {
        self.inflight.lock().generation
    }

    /// Analyze one input
    pub async fn analyze(&self, content: &str) -> AnalysisReport {
        if content.trim().is_empty() {
            return AnalysisReport::empty();
        }

        let (generation, token) = self.claim();
        let classification = self.engine.classify_concurrent(content).await;
        let entry = self.ledger.record(content, &classification.results);

        let escalation = if !classification.escalate {
            EscalationOutcome::NotNeeded
        } else if !self.escalate {
            EscalationOutcome::Skipped
        } else {
            self.escalate(content, generation, token).await
        };

        self.release(generation);
        counter!("magicinput_escalations_total", "outcome" => escalation.as_str()).increment(1);

        AnalysisReport {
            classification,
            entry_id: Some(entry.id),
            escalation,
        }
    }

    /// Cancel whatever escalation is in flight
    pub fn cancel_inflight(&self) {
        let mut inflight = self.inflight.lock();
        if let Some(token) = inflight.token.take() {
            token.cancel();
        }
    }

    async fn escalate(
        &self,
        content: &str,
        generation: u64,
        token: CancellationToken,
    ) -> EscalationOutcome {
        let gateway = match &self.gateway {
            Some(gateway) if gateway.is_configured() => gateway,
            _ => {
                return EscalationOutcome::Failed(Error::config(
                    "no API key configured for the analysis service",
                ))
            }
        };

        info!(generation, "Escalating inconclusive input");
        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => EscalationOutcome::Superseded,
            result = tokio::time::timeout(self.timeout, gateway.analyze(content)) => match result {
                Ok(Ok(results)) => EscalationOutcome::Completed(results),
                Ok(Err(e)) => EscalationOutcome::Failed(e),
                Err(_) => EscalationOutcome::Failed(Error::Timeout),
            },
        };

        if !matches!(outcome, EscalationOutcome::Superseded) && !self.is_current(generation) {
            debug!(generation, "Discarding stale escalation response");
            return EscalationOutcome::Superseded;
        }
        if let EscalationOutcome::Failed(e) = &outcome {
            warn!(generation, "Escalation failed: {}", e);
        }
        outcome
    }

    fn claim(&self) -> (u64, CancellationToken) {
        let mut inflight = self.inflight.lock();
        if let Some(previous) = inflight.token.take() {
            previous.cancel();
        }
        inflight.generation += 1;
        let token = CancellationToken::new();
        inflight.token = Some(token.clone());
        (inflight.generation, token)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inflight.lock().generation == generation
    }

    fn release(&self, generation: u64) {
        let mut inflight = self.inflight.lock();
        if inflight.generation == generation {
            inflight.token = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use magicinput_core::{FailureCategory, FormatType, Result};
    use magicinput_history::{LedgerConfig, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedGateway {
        configured: bool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(delay: Duration) -> Self {
            Self {
                configured: true,
                delay,
                calls: AtomicUsize::new(0),
            }
        }

        fn unconfigured() -> Self {
            Self {
                configured: false,
                ..Self::new(Duration::ZERO)
            }
        }
    }

    #[async_trait]
    impl EscalationGateway for ScriptedGateway {
        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn analyze(&self, content: &str) -> Result<Vec<EscalatedResult>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(vec![EscalatedResult {
                classification: "plaintext".to_string(),
                format_type: "text".to_string(),
                category: "Text".to_string(),
                confidence_percent: "90%".to_string(),
                analysis: content.to_string(),
                suggestion: String::new(),
            }
            .normalize()])
        }
    }

    fn session(gateway: Arc<ScriptedGateway>, settings: SessionConfig) -> AnalysisSession {
        let ledger = HistoryLedger::load(Box::new(MemoryStore::new()), LedgerConfig::default());
        AnalysisSession::new(
            ClassificationEngine::builtin().unwrap(),
            Some(gateway),
            Arc::new(ledger),
            &settings,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_conclusive_input_is_not_escalated() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::ZERO));
        let session = session(Arc::clone(&gateway), SessionConfig::default());

        let report = session
            .analyze("550e8400-e29b-41d4-a716-446655440000")
            .await;

        assert_eq!(report.classification.top().unwrap().format_type, FormatType::Uuid);
        assert!(matches!(report.escalation, EscalationOutcome::NotNeeded));
        assert!(report.entry_id.is_some());
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inconclusive_input_is_escalated() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::from_secs(1)));
        let session = session(Arc::clone(&gateway), SessionConfig::default());

        let report = session.analyze("please call me back tomorrow").await;

        assert!(report.classification.escalate);
        let results = report.escalation.results().unwrap();
        assert_eq!(results[0].analysis, "please call me back tomorrow");
        assert_eq!(session.ledger().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_input_is_not_recorded() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::ZERO));
        let session = session(Arc::clone(&gateway), SessionConfig::default());

        let report = session.analyze("   \n").await;

        assert!(report.classification.is_empty());
        assert_eq!(report.entry_id, None);
        assert!(session.ledger().is_empty());
        assert_eq!(session.current_generation(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unconfigured_gateway_is_never_called() {
        let gateway = Arc::new(ScriptedGateway::unconfigured());
        let session = session(Arc::clone(&gateway), SessionConfig::default());

        let report = session.analyze("just some words").await;

        match report.escalation {
            EscalationOutcome::Failed(e) => {
                assert_eq!(e.category(), Some(FailureCategory::Configuration))
            }
            other => panic!("expected configuration failure, got {:?}", other),
        }
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(!report.classification.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_escalation_disabled() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::ZERO));
        let settings = SessionConfig {
            escalate: false,
            ..Default::default()
        };
        let session = session(Arc::clone(&gateway), settings);

        let report = session.analyze("just some words").await;

        assert!(matches!(report.escalation, EscalationOutcome::Skipped));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::from_secs(120)));
        let session = session(Arc::clone(&gateway), SessionConfig::default());

        let report = session.analyze("just some words").await;

        match report.escalation {
            EscalationOutcome::Failed(Error::Timeout) => {}
            other => panic!("expected timeout, got {:?}", other),
        }
        assert_eq!(session.ledger().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_input_supersedes_inflight_escalation() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::from_secs(5)));
        let session = Arc::new(session(Arc::clone(&gateway), SessionConfig::default()));

        let first = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.analyze("first sentence here").await })
        };
        while gateway.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = session.analyze("second sentence here").await;
        let first = first.await.unwrap();

        assert!(matches!(first.escalation, EscalationOutcome::Superseded));
        let results = second.escalation.results().unwrap();
        assert_eq!(results[0].analysis, "second sentence here");
        assert_eq!(session.current_generation(), 2);
        assert_eq!(session.ledger().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_inflight() {
        let gateway = Arc::new(ScriptedGateway::new(Duration::from_secs(5)));
        let session = Arc::new(session(Arc::clone(&gateway), SessionConfig::default()));

        let pending = {
            let session = Arc::clone(&session);
            tokio::spawn(async move { session.analyze("some plain words").await })
        };
        while gateway.calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        session.cancel_inflight();

        let report = pending.await.unwrap();
        assert!(matches!(report.escalation, EscalationOutcome::Superseded));
    }
}
