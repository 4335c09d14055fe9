//! Line-by-line analysis for `watch` mode
//!
//! Each submitted line is analyzed on its own task. Tasks are owned by a
//! `JoinSet`, so every report is collected before the watcher is dropped.

use crate::session::{AnalysisReport, AnalysisSession};
use std::sync::Arc;
use tokio::task::{JoinError, JoinSet};

/// A finished analysis and the position of its line among submitted lines
#[derive(Debug)]
pub struct WatchedReport {
    pub index: usize,
    pub report: AnalysisReport,
}

pub struct LineWatcher {
    session: Arc<AnalysisSession>,
    tasks: JoinSet<WatchedReport>,
    submitted: usize,
}

impl LineWatcher {
    pub fn new(session: Arc<AnalysisSession>) -> Self {
        Self {
            session,
            tasks: JoinSet::new(),
            submitted: 0,
        }
    }

    pub fn session(&self) -> &Arc<AnalysisSession> {
        &self.session
    }

    /// Start analyzing a line; blank lines are ignored
    pub fn submit(&mut self, line: String) -> bool {
        if line.trim().is_empty() {
            return false;
        }
        let index = self.submitted;
        self.submitted += 1;

        let session = Arc::clone(&self.session);
        self.tasks.spawn(async move {
            let report = session.analyze(&line).await;
            WatchedReport { index, report }
        });
        true
    }

    /// Number of analyses still running
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Next finished analysis in completion order; `None` once nothing is pending
    pub async fn next_report(&mut self) -> Option<Result<WatchedReport, JoinError>> {
        self.tasks.join_next().await
    }

    /// Wait for every pending analysis, returning reports in submission order
    pub async fn drain(&mut self) -> Result<Vec<WatchedReport>, JoinError> {
        let mut reports = Vec::with_capacity(self.tasks.len());
        while let Some(done) = self.tasks.join_next().await {
            reports.push(done?);
        }
        reports.sort_by_key(|r| r.index);
        Ok(reports)
    }
}
