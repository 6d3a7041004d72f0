//! The rollback ledger: a serializable record of reversible side effects.
//!
//! During the forward pass, step actions append one entry per reversible
//! effect, in the order the effects occurred: files or directories brought
//! into existence, objects relocated, daemons launched. On success the ledger
//! is discarded. On failure it is serialized to the process boundary, and a
//! later, independent invocation reconstructs it from JSON and calls
//! [`RollbackLedger::roll_back`] — the serialized form is the only channel
//! between the two processes.
//!
//! Compensation undoes process entries first (a daemon holding a data
//! directory open must die before the directory is removed), then file
//! entries. Each group is replayed newest-first so dependent effects unwind
//! in the right order: a config written over a backed-up original is deleted
//! before the original is moved back. Missing targets count as already undone;
//! guard refusals and failed compensations abort the rest of the group.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::engine::safety::SafetyGuard;
use crate::error::{ActuatorError, Result};
use crate::process;

/// How long a terminated daemon gets between SIGTERM and SIGKILL.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// What kind of filesystem effect a [`FileOp`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileOpKind {
    /// The path was newly brought into existence; compensation removes it.
    Created,
    /// Something was relocated to the path; compensation moves it back.
    Moved,
}

/// One reversible filesystem effect.
///
/// Invariant: `Moved` always carries a non-empty `original_path`; `Created`
/// never does. The append methods on [`RollbackLedger`] uphold this, and
/// [`RollbackLedger::from_json`] re-checks it on the rollback side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOp {
    pub kind: FileOpKind,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<PathBuf>,
}

/// One spawned background process; compensation terminates it if still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOp {
    pub pid: u32,
}

/// Append-only record of one forward operation's reversible side effects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollbackLedger {
    #[serde(default)]
    file_ops: Vec<FileOp>,
    #[serde(default)]
    process_ops: Vec<ProcessOp>,
}

impl RollbackLedger {
    /// Empty ledger for the start of a forward operation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` was newly brought into existence
    /// (file, directory, or symlink).
    pub fn add_created_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("ledger: created {}", path.display());
        self.file_ops.push(FileOp {
            kind: FileOpKind::Created,
            path,
            original_path: None,
        });
    }

    /// Record that something was relocated from `original_path` to `path`.
    pub fn add_moved_file(
        &mut self,
        original_path: impl Into<PathBuf>,
        path: impl Into<PathBuf>,
    ) {
        let original_path = original_path.into();
        let path = path.into();
        debug!(
            "ledger: moved {} -> {}",
            original_path.display(),
            path.display()
        );
        self.file_ops.push(FileOp {
            kind: FileOpKind::Moved,
            path,
            original_path: Some(original_path),
        });
    }

    /// Record a detached process id.
    pub fn add_spawned_process(&mut self, pid: u32) {
        debug!("ledger: spawned pid {pid}");
        self.process_ops.push(ProcessOp { pid });
    }

    pub fn is_empty(&self) -> bool {
        self.file_ops.is_empty() && self.process_ops.is_empty()
    }

    pub fn file_ops(&self) -> &[FileOp] {
        &self.file_ops
    }

    pub fn process_ops(&self) -> &[ProcessOp] {
        &self.process_ops
    }

    /// Serialize for the process boundary.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Reconstruct a ledger from its serialized form, re-checking the
    /// `Created`/`Moved` invariant before it can drive any compensation.
    pub fn from_json(json: &str) -> Result<Self> {
        let ledger: Self = serde_json::from_str(json)
            .map_err(|e| ActuatorError::payload(format!("malformed rollback ledger: {e}")))?;
        for op in &ledger.file_ops {
            match op.kind {
                FileOpKind::Moved if op.original_path.is_none() => {
                    return Err(ActuatorError::payload(format!(
                        "moved entry for {} is missing its original path",
                        op.path.display()
                    )));
                }
                FileOpKind::Created if op.original_path.is_some() => {
                    return Err(ActuatorError::payload(format!(
                        "created entry for {} must not carry an original path",
                        op.path.display()
                    )));
                }
                _ => {}
            }
        }
        Ok(ledger)
    }

    /// Undo every recorded effect: process entries first, then file entries,
    /// each group newest-first. Fail-fast: the first failing compensation
    /// aborts the remaining entries.
    pub fn roll_back(&self, guard: &SafetyGuard) -> Result<()> {
        info!(
            "rolling back {} process op(s) and {} file op(s)",
            self.process_ops.len(),
            self.file_ops.len()
        );

        for op in self.process_ops.iter().rev() {
            undo_process(op)?;
        }
        for op in self.file_ops.iter().rev() {
            undo_file(op, guard)?;
        }

        info!("rollback complete");
        Ok(())
    }
}

fn undo_process(op: &ProcessOp) -> Result<()> {
    if !process::is_process_alive(op.pid) {
        // Already gone counts as already undone
        debug!("pid {} no longer running, nothing to undo", op.pid);
        return Ok(());
    }
    info!("terminating spawned process {}", op.pid);
    process::terminate_process(op.pid, TERMINATE_GRACE)
        .map_err(|e| ActuatorError::rollback(format!("pid {}", op.pid), e.to_string()))
}

fn undo_file(op: &FileOp, guard: &SafetyGuard) -> Result<()> {
    match op.kind {
        FileOpKind::Created => undo_created(&op.path, guard),
        FileOpKind::Moved => {
            let original = op.original_path.as_ref().ok_or_else(|| {
                ActuatorError::rollback(
                    op.path.display().to_string(),
                    "moved entry is missing its original path",
                )
            })?;
            undo_moved(&op.path, original)
        }
    }
}

/// Remove a created file, directory tree, or symlink.
/// The guard runs before the existence check so a protected-path deletion
/// attempt is always an error, even if the path is already gone.
fn undo_created(path: &Path, guard: &SafetyGuard) -> Result<()> {
    guard.ensure_safe(path)?;

    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("{} already removed, nothing to undo", path.display());
            return Ok(());
        }
        Err(e) => {
            return Err(ActuatorError::rollback(
                path.display().to_string(),
                format!("failed to inspect: {e}"),
            ));
        }
    };

    info!("removing created {}", path.display());
    let removal = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        // Regular files and symlinks both go through remove_file;
        // for a symlink this unlinks without following
        fs::remove_file(path)
    };
    removal.map_err(|e| {
        ActuatorError::rollback(path.display().to_string(), format!("failed to remove: {e}"))
    })
}

/// Move (or relink) the object at `path` back to `original`.
fn undo_moved(path: &Path, original: &Path) -> Result<()> {
    if fs::symlink_metadata(path).is_err() {
        return Err(ActuatorError::rollback(
            path.display().to_string(),
            format!(
                "missing source for move-back to {}",
                original.display()
            ),
        ));
    }

    info!("moving {} back to {}", path.display(), original.display());
    fs::rename(path, original).map_err(|e| {
        ActuatorError::rollback(
            path.display().to_string(),
            format!("failed to move back to {}: {e}", original.display()),
        )
    })
}
