//! Error handling for the actuator.
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the crate should use these types for consistency. The variants
//! mirror the failure taxonomy of the engine: validation before any ledger
//! exists, step execution during the forward pass, rollback and safety
//! violations during compensation.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the actuator.
#[derive(Error, Debug)]
pub enum ActuatorError {
    /// IO errors (file operations, process table, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Payload errors (decoding, missing payload, malformed encoding)
    #[error("Payload error: {0}")]
    Payload(String),

    /// Validation errors (malformed or missing parameters); no compensation needed
    #[error("Validation error: {0}")]
    Validation(String),

    /// A named forward step failed; aborts the remaining steps
    #[error("Step '{step}' failed: {source}")]
    StepExecution {
        step: String,
        #[source]
        source: anyhow::Error,
    },

    /// A compensation action failed; aborts the remaining entries in its group
    #[error("Rollback of {target} failed: {reason}")]
    Rollback { target: String, reason: String },

    /// A destructive compensation targeted a protected path
    #[error("Refusing destructive action on protected path: {}", path.display())]
    SafetyViolation { path: PathBuf },

    /// Operation stage machine transition errors
    #[error("Stage transition error: {0}")]
    Transition(String),

    /// System errors (commands, processes)
    #[error("System error: {0}")]
    System(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for actuator operations
pub type Result<T> = std::result::Result<T, ActuatorError>;

// Convenient error constructors
impl ActuatorError {
    /// Create a payload error
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::Payload(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a step execution error wrapping the underlying cause
    pub fn step(step: impl Into<String>, source: anyhow::Error) -> Self {
        Self::StepExecution {
            step: step.into(),
            source,
        }
    }

    /// Create a rollback error for the given compensation target
    pub fn rollback(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Rollback {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a safety violation for the given path
    pub fn safety_violation(path: impl Into<PathBuf>) -> Self {
        Self::SafetyViolation { path: path.into() }
    }

    /// Create a system error
    pub fn system(msg: impl Into<String>) -> Self {
        Self::System(msg.into())
    }
}
