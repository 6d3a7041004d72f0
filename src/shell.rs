//! Shell execution seam.
//!
//! This module provides the ONLY sanctioned way for step actions to reach the
//! host: a synchronous [`ShellExecutor`] for commands we wait on, and a
//! [`BackgroundLauncher`] for long-lived daemons that must outlive the
//! actuator (fire-and-forget, pid recorded in the ledger).
//!
//! Both are traits so command tests can substitute recording fakes; the
//! production implementation is [`SystemShell`].
//!
//! Children run in their own process group so a later compensation can signal
//! the whole tree. Detached daemons deliberately get no parent-death signal:
//! they are supposed to keep running after this process exits.

use anyhow::{Context, Result};
use std::process::{Command, Stdio};
use tracing::{debug, info};

/// Synchronous command execution: run, wait, capture output.
pub trait ShellExecutor {
    fn run(&self, cmd: &str) -> Result<ShellOutput>;
}

/// Detached process launch: start and return the OS pid without waiting.
pub trait BackgroundLauncher {
    fn start(&self, cmd: &str) -> Result<u32>;
}

/// Output from a synchronous shell execution.
#[derive(Debug, Clone)]
pub struct ShellOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code (None if terminated by signal).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl ShellOutput {
    /// Check that the command succeeded and return an error if not.
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            let code = self.exit_code.unwrap_or(-1);
            anyhow::bail!(
                "{} failed (exit code {}): {}",
                context,
                code,
                self.stderr.trim()
            )
        }
    }
}

/// Production shell backed by `bash -c`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShell;

impl ShellExecutor for SystemShell {
    fn run(&self, cmd: &str) -> Result<ShellOutput> {
        info!("shell: {cmd}");

        let output = new_group_command(cmd)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn shell command: {cmd}"))?;

        let result = ShellOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
            success: output.status.success(),
        };
        debug!(
            "shell exit code {:?}, {} bytes stdout",
            result.exit_code,
            result.stdout.len()
        );
        Ok(result)
    }
}

impl BackgroundLauncher for SystemShell {
    fn start(&self, cmd: &str) -> Result<u32> {
        info!("launching detached: {cmd}");

        let child = new_group_command(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch background command: {cmd}"))?;

        let pid = child.id();
        info!("detached process started with pid {pid}");
        Ok(pid)
    }
}

/// Build a `bash -c` command that will lead its own process group.
/// Group leadership lets a later compensation signal the entire tree with one
/// negative-pid kill.
fn new_group_command(cmd: &str) -> Command {
    use std::os::unix::process::CommandExt;

    let mut command = Command::new("bash");
    command.args(["-c", cmd]);
    unsafe {
        command.pre_exec(|| {
            nix::unistd::setpgid(nix::unistd::Pid::from_raw(0), nix::unistd::Pid::from_raw(0))
                .map_err(std::io::Error::other)?;
            Ok(())
        });
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process;
    use std::time::Duration;

    #[test]
    fn test_run_captures_stdout() {
        let out = SystemShell.run("echo hello").expect("echo should run");
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.exit_code, Some(0));
    }

    #[test]
    fn test_run_captures_failure() {
        let out = SystemShell
            .run("echo oops >&2; exit 3")
            .expect("spawn should succeed even when the command fails");
        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_ensure_success_reports_context_and_stderr() {
        let out = SystemShell.run("echo broken >&2; exit 1").unwrap();
        let err = out.ensure_success("start broker").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("start broker"));
        assert!(msg.contains("broken"));
    }

    #[test]
    fn test_start_returns_live_pid() {
        let pid = SystemShell.start("sleep 30").expect("launch should succeed");
        assert!(process::is_process_alive(pid));

        process::terminate_process(pid, Duration::from_secs(2)).expect("cleanup kill");
    }
}
