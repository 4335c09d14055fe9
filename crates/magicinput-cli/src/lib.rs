//! Magic Input command-line front end
//!
//! Configuration loading, the analysis session that ties classification,
//! escalation and history together, and terminal rendering.

pub mod config;
pub mod render;
pub mod session;
pub mod watch;

pub use config::{AppConfig, ConfigOverrides};
pub use session::{AnalysisReport, AnalysisSession, EscalationOutcome};
pub use watch::LineWatcher;
