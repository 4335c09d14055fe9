//! Magic Input Escalation Gateway
//!
//! Wraps the external semantic-analysis call used when local detectors are
//! inconclusive. Callers check [`EscalationGateway::is_configured`] first;
//! an unconfigured gateway is a configuration error, never a network call.
//!
//! Failures map onto [`magicinput_core::FailureCategory`]:
//! - configuration: no credential
//! - transport: connect, send or body read failed
//! - service: rejected credential, bad status, or unusable envelope

pub mod config;
pub mod openai;
pub mod parse;
pub mod prompt;

use async_trait::async_trait;
use magicinput_core::{EscalatedResult, Result};

pub use config::GatewayConfig;
pub use openai::OpenAiGateway;
pub use parse::parse_response;

/// Boundary to the external semantic-analysis service
#[async_trait]
pub trait EscalationGateway: Send + Sync {
    /// Whether a credential is present
    fn is_configured(&self) -> bool;

    /// Analyze content in a single best-effort attempt
    async fn analyze(&self, content: &str) -> Result<Vec<EscalatedResult>>;
}
