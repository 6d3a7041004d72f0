//! The step-orchestration and compensating-rollback engine.
//!
//! Everything product-specific lives in `crate::commands`; this module is the
//! reusable core every actuator builds on: named fail-fast steps, the
//! rollback ledger that crosses the process boundary in serialized form, the
//! protected-path guard, and the lifecycle controller.

pub mod ledger;
pub mod lifecycle;
pub mod safety;
pub mod step;

pub use ledger::{FileOp, FileOpKind, ProcessOp, RollbackLedger};
pub use lifecycle::{Command, Controller, LEDGER_FRAME, OperationStage};
pub use safety::SafetyGuard;
pub use step::{Step, StepRunner};
