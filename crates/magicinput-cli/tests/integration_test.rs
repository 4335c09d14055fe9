//! End-to-end tests for analysis sessions over a file-backed history

use async_trait::async_trait;
use magicinput_cli::config::SessionConfig;
use magicinput_cli::{AnalysisSession, EscalationOutcome};
use magicinput_core::{EscalatedResult, FormatType, Result};
use magicinput_detectors::ClassificationEngine;
use magicinput_gateway::EscalationGateway;
use magicinput_history::{FileStore, HistoryLedger, LedgerConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Gateway that echoes its input after a fixed delay
struct EchoGateway {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl EscalationGateway for EchoGateway {
    fn is_configured(&self) -> bool {
        true
    }

    async fn analyze(&self, content: &str) -> Result<Vec<EscalatedResult>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![EscalatedResult {
            classification: "plaintext".to_string(),
            format_type: "text".to_string(),
            category: "Text".to_string(),
            confidence_percent: "80%".to_string(),
            analysis: content.to_string(),
            suggestion: "None".to_string(),
        }])
    }
}

fn open_session(dir: &TempDir, gateway: Arc<EchoGateway>) -> AnalysisSession {
    let ledger = HistoryLedger::load(
        Box::new(FileStore::new(dir.path())),
        LedgerConfig::default(),
    );
    AnalysisSession::new(
        ClassificationEngine::builtin().unwrap(),
        Some(gateway),
        Arc::new(ledger),
        &SessionConfig::default(),
    )
}

fn echo(delay: Duration) -> Arc<EchoGateway> {
    Arc::new(EchoGateway {
        delay,
        calls: AtomicUsize::new(0),
    })
}

#[tokio::test(start_paused = true)]
async fn test_history_survives_restart() {
    let temp_dir = TempDir::new().unwrap();

    let first_id = {
        let session = open_session(&temp_dir, echo(Duration::ZERO));
        let report = session.analyze("#FF5733").await;
        assert_eq!(report.classification.top().unwrap().format_type, FormatType::Color);
        report.entry_id.unwrap()
    };

    let session = open_session(&temp_dir, echo(Duration::ZERO));
    let entries = session.ledger().list();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, first_id);
    assert_eq!(entries[0].content_snippet, "#FF5733");
    assert_eq!(entries[0].results[0].format_type, FormatType::Color);
}

#[tokio::test(start_paused = true)]
async fn test_history_keeps_local_results_only() {
    let temp_dir = TempDir::new().unwrap();
    let gateway = echo(Duration::from_millis(200));
    let session = open_session(&temp_dir, Arc::clone(&gateway));

    let report = session.analyze("meet me at the usual place").await;

    assert!(matches!(report.escalation, EscalationOutcome::Completed(_)));
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);

    let entry = session.ledger().get(report.entry_id.unwrap()).unwrap();
    assert_eq!(entry.results, report.classification.results);
    assert!(entry.results.iter().all(|r| r.format_type == FormatType::Text));
}

#[tokio::test(start_paused = true)]
async fn test_only_latest_escalation_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let gateway = echo(Duration::from_secs(3));
    let session = Arc::new(open_session(&temp_dir, Arc::clone(&gateway)));

    let mut handles = Vec::new();
    for text in ["alpha words", "beta words", "gamma words"] {
        let session = Arc::clone(&session);
        handles.push(tokio::spawn(async move { session.analyze(text).await }));
        while session_calls(&gateway) < handles.len() {
            tokio::task::yield_now().await;
        }
    }

    let mut reports = Vec::new();
    for handle in handles {
        reports.push(handle.await.unwrap());
    }

    assert!(matches!(reports[0].escalation, EscalationOutcome::Superseded));
    assert!(matches!(reports[1].escalation, EscalationOutcome::Superseded));
    let latest = reports[2].escalation.results().unwrap();
    assert_eq!(latest[0].analysis, "gamma words");

    let snippets: Vec<String> = session
        .ledger()
        .list()
        .into_iter()
        .map(|e| e.content_snippet)
        .collect();
    assert_eq!(snippets, vec!["gamma words", "beta words", "alpha words"]);
}

fn session_calls(gateway: &EchoGateway) -> usize {
    gateway.calls.load(Ordering::SeqCst)
}
