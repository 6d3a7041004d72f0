//! Per-invocation dependency context.
//!
//! One `ActuatorContext` is constructed per process invocation and passed
//! explicitly into the controller and every step action. There is no global
//! state: whatever a step needs to touch the host comes through here, which is
//! also the seam where tests inject recording fakes.

use crate::shell::{BackgroundLauncher, ShellExecutor, SystemShell};

/// Collaborators available to a running operation.
pub struct ActuatorContext {
    /// Synchronous shell execution.
    pub shell: Box<dyn ShellExecutor>,
    /// Detached daemon launch.
    pub launcher: Box<dyn BackgroundLauncher>,
}

impl ActuatorContext {
    /// Context backed by the real host shell.
    pub fn system() -> Self {
        Self {
            shell: Box::new(SystemShell),
            launcher: Box::new(SystemShell),
        }
    }

    /// Context with explicit collaborators (used by tests).
    pub fn with_parts(
        shell: Box<dyn ShellExecutor>,
        launcher: Box<dyn BackgroundLauncher>,
    ) -> Self {
        Self { shell, launcher }
    }
}
