//! Operation lifecycle: the per-command stage machine and its controller.
//!
//! Every invocation walks `Validating → Initializing → Running → Succeeded`
//! or, with the rollback flag, `Validating → Initializing → RollingBack →
//! RolledBack`. `Failed` is reachable from every non-terminal stage. The
//! machine enforces valid transitions so a command cannot skip validation or
//! resume a half-run operation; the only recovery path is the explicit
//! rollback branch of a later invocation.
//!
//! On forward failure the controller serializes the accumulated ledger and
//! writes one framed line to the output stream for the external orchestrator
//! to persist and optionally replay as a rollback invocation.

use std::fmt;
use std::io::Write;
use thiserror::Error;
use tracing::{error, info};

use crate::context::ActuatorContext;
use crate::engine::ledger::RollbackLedger;
use crate::engine::safety::SafetyGuard;
use crate::engine::step::{Step, StepRunner};
use crate::error::{ActuatorError, Result};

/// Delimiter around the serialized ledger on stdout. Both sides of the frame
/// are literally `<ctx>`; the external controller parses this exact shape.
pub const LEDGER_FRAME: &str = "<ctx>";

/// Stages of one command invocation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationStage {
    /// Checking options and payload shape
    Validating,
    /// Product-specific initialization (connections, prechecks)
    Initializing,
    /// Executing the forward step sequence
    Running,
    /// Undoing a previously emitted ledger
    RollingBack,
    /// Forward pass completed (terminal)
    Succeeded,
    /// Compensation completed (terminal)
    RolledBack,
    /// Validation, a step, or a compensation failed (terminal)
    Failed,
}

impl OperationStage {
    /// Returns true for the three terminal stages.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::RolledBack | Self::Failed)
    }

    /// Whether `self → target` is a legal transition.
    const fn allows(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Validating, Self::Initializing)
                | (Self::Initializing, Self::Running)
                | (Self::Initializing, Self::RollingBack)
                | (Self::Running, Self::Succeeded)
                | (Self::RollingBack, Self::RolledBack)
        )
    }

    pub const fn describe(self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Initializing => "initializing",
            Self::Running => "running",
            Self::RollingBack => "rolling back",
            Self::Succeeded => "succeeded",
            Self::RolledBack => "rolled back",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OperationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Errors from illegal stage transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StageTransitionError {
    #[error("cannot transition from {from} to {to}")]
    InvalidTransition {
        from: OperationStage,
        to: OperationStage,
    },

    #[error("cannot leave terminal stage {from}")]
    FromTerminalStage { from: OperationStage },
}

impl From<StageTransitionError> for ActuatorError {
    fn from(err: StageTransitionError) -> Self {
        ActuatorError::Transition(err.to_string())
    }
}

/// One actuator operation: the capability contract every product command
/// implements. Composed by explicit delegation; there is no shared base
/// struct and no global state.
pub trait Command {
    /// Operation name for logging.
    fn name(&self) -> &str;

    /// Basic parameter validation; runs before any connection is opened.
    fn validate(&self) -> Result<()>;

    /// Product-specific initialization (e.g. opening a connection).
    /// Defaults to a no-op for pure shell-driven commands.
    fn init(&mut self, _ctx: &ActuatorContext) -> Result<()> {
        Ok(())
    }

    /// The ordered forward step sequence for this invocation.
    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>>;
}

/// Drives one command invocation through the stage machine.
pub struct Controller {
    stage: OperationStage,
    guard: SafetyGuard,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self {
            stage: OperationStage::Validating,
            guard: SafetyGuard::new(),
        }
    }

    #[inline]
    pub fn stage(&self) -> OperationStage {
        self.stage
    }

    fn transition_to(&mut self, target: OperationStage) -> Result<()> {
        if self.stage.is_terminal() {
            return Err(StageTransitionError::FromTerminalStage { from: self.stage }.into());
        }
        if !self.stage.allows(target) {
            return Err(StageTransitionError::InvalidTransition {
                from: self.stage,
                to: target,
            }
            .into());
        }
        info!("stage: {} -> {}", self.stage, target);
        self.stage = target;
        Ok(())
    }

    fn fail(&mut self) {
        if !self.stage.is_terminal() {
            info!("stage: {} -> {}", self.stage, OperationStage::Failed);
            self.stage = OperationStage::Failed;
        }
    }

    /// Forward pass: validate, initialize, run the step sequence.
    ///
    /// On step failure the ledger accumulated so far is framed onto `out`
    /// before the error is returned; the caller exits non-zero.
    pub fn run_forward(
        &mut self,
        cmd: &mut dyn Command,
        ctx: &ActuatorContext,
        out: &mut dyn Write,
    ) -> Result<()> {
        info!("operation {} starting", cmd.name());

        if let Err(e) = cmd.validate() {
            error!("validation failed: {e}");
            self.fail();
            return Err(e);
        }
        self.transition_to(OperationStage::Initializing)?;

        if let Err(e) = cmd.init(ctx) {
            error!("initialization failed: {e}");
            self.fail();
            return Err(e);
        }
        self.transition_to(OperationStage::Running)?;

        let mut ledger = RollbackLedger::new();
        let outcome = StepRunner::run(cmd.steps(ctx), &mut ledger);
        match outcome {
            Ok(()) => {
                self.transition_to(OperationStage::Succeeded)?;
                info!("operation {} succeeded", cmd.name());
                Ok(())
            }
            Err(e) => {
                error!("operation {} failed: {e}", cmd.name());
                // The step error is the one the orchestrator needs; a broken
                // emission stream must not displace it or skip the stage move
                if let Err(emit_err) = emit_ledger(out, &ledger) {
                    error!("failed to emit rollback ledger: {emit_err}");
                }
                self.fail();
                Err(e)
            }
        }
    }

    /// Rollback pass: the payload is a serialized ledger from a previous
    /// forward failure; reconstruct it and undo every recorded effect.
    pub fn run_rollback(&mut self, ledger_json: &str) -> Result<()> {
        self.transition_to(OperationStage::Initializing)?;

        let ledger = match RollbackLedger::from_json(ledger_json) {
            Ok(ledger) => ledger,
            Err(e) => {
                error!("cannot reconstruct rollback ledger: {e}");
                self.fail();
                return Err(e);
            }
        };
        self.transition_to(OperationStage::RollingBack)?;

        match ledger.roll_back(&self.guard) {
            Ok(()) => {
                self.transition_to(OperationStage::RolledBack)?;
                Ok(())
            }
            Err(e) => {
                error!("rollback failed: {e}");
                self.fail();
                Err(e)
            }
        }
    }
}

/// Write the framed ledger line the external orchestrator parses:
/// `<ctx>{json}<ctx>` followed by a newline.
pub fn emit_ledger(out: &mut dyn Write, ledger: &RollbackLedger) -> Result<()> {
    let json = ledger.to_json()?;
    writeln!(out, "{LEDGER_FRAME}{json}{LEDGER_FRAME}")?;
    out.flush()?;
    Ok(())
}

/// Extract the serialized ledger from a framed emission line.
/// The inverse of [`emit_ledger`]; used by tests and by orchestrator-side
/// tooling replaying a failure as a rollback invocation.
pub fn extract_framed_ledger(line: &str) -> Option<&str> {
    let line = line.trim_end();
    let body = line.strip_prefix(LEDGER_FRAME)?;
    body.strip_suffix(LEDGER_FRAME)
}
