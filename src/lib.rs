//! dbactuator - per-product database actuators for a single host.
//!
//! An external orchestrator invokes one binary per operation, passing the
//! parameters as a (usually base64-encoded) JSON payload. Each operation runs
//! a named, ordered step sequence; reversible side effects accumulate in a
//! rollback ledger that is emitted on stdout between `<ctx>` markers when a
//! step fails, so a later invocation with `--rollback` can undo them from a
//! fresh process.

pub mod cli;
pub mod commands;
pub mod context;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod payload;
pub mod process;
pub mod shell;

pub use context::ActuatorContext;
pub use engine::{Command, Controller, OperationStage, RollbackLedger, SafetyGuard, Step, StepRunner};
pub use error::{ActuatorError, Result};
