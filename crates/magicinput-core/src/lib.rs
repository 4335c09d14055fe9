//! Magic Input Core
//!
//! Core types and utilities shared across Magic Input components.
//!
//! This crate provides:
//! - The closed set of recognized content formats
//! - Classification and escalation result types
//! - Error types and result handling

pub mod error;
pub mod types;

pub use error::{Error, FailureCategory, Result};
pub use types::{
    ChatMessage, ClassificationResult, ConfidenceBand, DisplayField, EscalatedResult, FormatType,
    MAX_CONFIDENCE,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, FailureCategory, Result};
    pub use crate::types::{ClassificationResult, DisplayField, EscalatedResult, FormatType};
}
