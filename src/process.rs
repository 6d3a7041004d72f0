//! Process table helpers for spawned background daemons.
//!
//! The ledger records the pid of every daemon the forward pass launches.
//! Compensation has to answer two questions about such a pid, possibly from a
//! different process much later: is it still running, and how do we stop it.
//!
//! Termination signals the process *group* first (daemons launched through
//! [`crate::shell::SystemShell`] lead their own group, so helpers they forked
//! receive the signal too), falling back to the pid itself. SIGTERM is given a
//! grace period before SIGKILL.

use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::time::{Duration, Instant};

/// Check if a process is still alive (not dead or zombie).
pub fn is_process_alive(pid: u32) -> bool {
    // Signal 0 probes for existence without delivering anything
    if signal::kill(Pid::from_raw(pid as i32), None).is_err() {
        return false;
    }

    // A zombie can still receive signals but isn't running
    if let Ok(stat) = std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        // Field 3 of /proc/pid/stat is the state: R=running, S=sleeping, Z=zombie, etc.
        let fields: Vec<&str> = stat.split_whitespace().collect();
        if fields.len() > 2 {
            return !matches!(fields[2], "Z" | "X");
        }
    }

    // If we can't read /proc, assume alive (safe default)
    true
}

/// Terminate a process: SIGTERM first, wait up to `grace_period`, then SIGKILL.
///
/// Returns an error only when a live process could not be signalled at all;
/// a process that dies anywhere along the way counts as success.
pub fn terminate_process(pid: u32, grace_period: Duration) -> Result<(), nix::Error> {
    if let Err(e) = send_signal_to_group(pid, Signal::SIGTERM) {
        tracing::warn!("failed to send SIGTERM to process group {pid}: {e}");
        send_signal(pid, Signal::SIGTERM)?;
    }

    let start = Instant::now();
    while start.elapsed() < grace_period {
        if !is_process_alive(pid) {
            tracing::debug!("process {pid} terminated gracefully");
            return Ok(());
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    tracing::warn!("process {pid} did not terminate, sending SIGKILL");
    if send_signal_to_group(pid, Signal::SIGKILL).is_err() {
        send_signal(pid, Signal::SIGKILL)?;
    }
    Ok(())
}

/// Send a signal to a single process.
fn send_signal(pid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(pid as i32), signal)
}

/// Send a signal to an entire process group.
/// Uses negative PID to signal all processes in the group, ensuring children
/// forked by the daemon's launcher script also receive the signal.
fn send_signal_to_group(pgid: u32, signal: Signal) -> Result<(), nix::Error> {
    signal::kill(Pid::from_raw(-(pgid as i32)), signal)
}
