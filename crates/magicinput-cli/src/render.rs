//! Terminal and JSON rendering

use crate::session::{AnalysisReport, EscalationOutcome};
use chrono::Local;
use magicinput_core::{ClassificationResult, ConfidenceBand, EscalatedResult};
use magicinput_history::HistoryEntry;
use serde::Serialize;
use std::fmt::Write;

const LIST_PREVIEW_CHARS: usize = 60;

/// JSON shape of an analysis report
#[derive(Debug, Serialize)]
pub struct ReportJson<'a> {
    pub results: &'a [ClassificationResult],
    pub escalate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<u64>,
    pub escalation: EscalationJson<'a>,
}

#[derive(Debug, Serialize)]
pub struct EscalationJson<'a> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<&'a [EscalatedResult]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl<'a> From<&'a AnalysisReport> for ReportJson<'a> {
    fn from(report: &'a AnalysisReport) -> Self {
        let (error, category) = match &report.escalation {
            EscalationOutcome::Failed(e) => {
                (Some(e.to_string()), e.category().map(|c| c.to_string()))
            }
            _ => (None, None),
        };
        Self {
            results: &report.classification.results,
            escalate: report.classification.escalate,
            entry_id: report.entry_id,
            escalation: EscalationJson {
                status: report.escalation.as_str(),
                results: report.escalation.results(),
                error,
                category,
            },
        }
    }
}

/// Human-readable analysis report
pub fn report_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    if report.classification.is_empty() {
        out.push_str("Nothing to analyze.\n");
        return out;
    }

    for (rank, result) in report.classification.results.iter().enumerate() {
        write_result(&mut out, rank + 1, result);
    }

    match &report.escalation {
        EscalationOutcome::NotNeeded | EscalationOutcome::Superseded => {}
        EscalationOutcome::Skipped => {
            out.push_str("\nSemantic analysis skipped.\n");
        }
        EscalationOutcome::Completed(results) => {
            out.push_str("\nSemantic analysis:\n");
            for result in results {
                write_escalated(&mut out, result);
            }
        }
        EscalationOutcome::Failed(e) => {
            let category = e
                .category()
                .map_or_else(|| "unknown".to_string(), |c| c.to_string());
            let _ = writeln!(out, "\nSemantic analysis unavailable ({}): {}", category, e);
        }
    }
    out
}

fn write_result(out: &mut String, rank: usize, result: &ClassificationResult) {
    let _ = writeln!(
        out,
        "{}. {} [{}] {}%",
        rank, result.label, result.format_type, result.confidence
    );
    for field in &result.display_fields {
        let _ = writeln!(out, "     {}: {}", field.name, field.value);
    }
}

fn write_escalated(out: &mut String, result: &EscalatedResult) {
    let band = match result.band() {
        ConfidenceBand::High => "high",
        ConfidenceBand::Medium => "medium",
        ConfidenceBand::Low => "low",
    };
    let _ = writeln!(
        out,
        "  {} / {} ({}, {} confidence)",
        result.category, result.format_type, result.confidence_percent, band
    );
    let _ = writeln!(out, "     {}", result.analysis);
    let _ = writeln!(out, "     Suggestion: {}", result.suggestion);
}

/// One line per entry, most recent first
pub fn history_list_text(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "History is empty.\n".to_string();
    }

    let mut out = String::new();
    for entry in entries {
        let when = entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        let _ = writeln!(
            out,
            "{}  {}  {:<20}  {}",
            entry.id,
            when,
            entry.summary_label().unwrap_or("-"),
            one_line(&entry.content_snippet, LIST_PREVIEW_CHARS)
        );
    }
    out
}

/// Full detail of one entry
pub fn history_entry_text(entry: &HistoryEntry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Id:      {}", entry.id);
    let _ = writeln!(
        out,
        "Time:    {}",
        entry.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
    );
    let _ = writeln!(out, "Content: {}", entry.content_snippet);
    out.push('\n');
    for (rank, result) in entry.results.iter().enumerate() {
        write_result(&mut out, rank + 1, result);
    }
    out
}

fn one_line(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    match flat.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &flat[..idx]),
        None => flat,
    }
}
