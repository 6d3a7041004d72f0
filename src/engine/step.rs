//! Named steps and the fail-fast step runner.
//!
//! A step is one named unit of forward work. The runner executes steps
//! strictly in declaration order and stops at the first failure; it performs
//! no retries and has no side effects of its own. Whatever reversible effects
//! a step produces, it records in the [`RollbackLedger`] it is handed, in the
//! order they occurred.

use tracing::info;

use crate::engine::ledger::RollbackLedger;
use crate::error::{ActuatorError, Result};

/// One named unit of forward work.
///
/// The action receives the live ledger so it can record reversible effects as
/// it makes them. Steps are built per invocation, owned by the runner call
/// that consumes them, and discarded afterwards.
pub struct Step<'a> {
    name: String,
    action: Box<dyn FnOnce(&mut RollbackLedger) -> anyhow::Result<()> + 'a>,
}

impl<'a> Step<'a> {
    pub fn new<F>(name: impl Into<String>, action: F) -> Self
    where
        F: FnOnce(&mut RollbackLedger) -> anyhow::Result<()> + 'a,
    {
        Self {
            name: name.into(),
            action: Box::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for Step<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// Fail-fast executor of an ordered step sequence.
pub struct StepRunner;

impl StepRunner {
    /// Execute `steps` in declaration order against `ledger`.
    ///
    /// On the first step whose action fails, execution stops and the error
    /// names the step and wraps the underlying cause. Retry policy, if any,
    /// belongs inside an individual step's action.
    pub fn run(steps: Vec<Step<'_>>, ledger: &mut RollbackLedger) -> Result<()> {
        let total = steps.len();
        for (index, step) in steps.into_iter().enumerate() {
            info!("step {}/{}: {}", index + 1, total, step.name);
            let name = step.name;
            (step.action)(ledger).map_err(|source| ActuatorError::step(name, source))?;
        }
        Ok(())
    }

    /// The step plan, in execution order (used by `--dry-run`).
    pub fn describe<'a>(steps: &'a [Step<'_>]) -> Vec<&'a str> {
        steps.iter().map(|s| s.name()).collect()
    }
}
