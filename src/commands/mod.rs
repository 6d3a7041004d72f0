//! Per-product actuator commands.
//!
//! Each product module is thin glue over the engine: a serde parameter
//! struct deserialized from the orchestrator payload, a [`Command`]
//! implementation, and an ordered list of named steps that call the shell
//! seam and record reversible effects in the ledger.
//!
//! The helpers here are the ONLY sanctioned way for a step to create or
//! displace filesystem objects: every mutation they perform lands in the
//! ledger, so a failed operation can always be compensated.
//!
//! [`Command`]: crate::engine::Command

pub mod elasticsearch;
pub mod influxdb;
pub mod kafka;
pub mod pulsar;
pub mod sqlserver;

use anyhow::{Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::engine::ledger::RollbackLedger;

/// Create a directory and record it, skipping (without recording) one that
/// already existed — rollback must never delete something we didn't create.
pub(crate) fn create_recorded_dir(ledger: &mut RollbackLedger, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        bail!("refusing to create directory with empty path");
    }
    if path.exists() {
        debug!("{} already exists, not recording", path.display());
        return Ok(());
    }
    fs::create_dir_all(path)
        .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", path.display()))?;
    ledger.add_created_file(path);
    Ok(())
}

/// Write a new file and record it. Refuses to clobber an existing file:
/// callers that rewrite a live config must move it aside first so the
/// original stays recoverable.
pub(crate) fn write_recorded_file(
    ledger: &mut RollbackLedger,
    path: &Path,
    contents: &str,
) -> Result<()> {
    if path.exists() {
        bail!(
            "refusing to overwrite existing {}; move it aside first",
            path.display()
        );
    }
    fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
    ledger.add_created_file(path);
    Ok(())
}

/// Move an existing file aside to `<path>.bak` and record the relocation.
/// Returns the backup path, or `None` when there was nothing to move.
pub(crate) fn backup_aside(ledger: &mut RollbackLedger, path: &Path) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }
    let backup = PathBuf::from(format!("{}.bak", path.display()));
    if backup.exists() {
        bail!(
            "backup {} already exists; a previous operation was not cleaned up",
            backup.display()
        );
    }
    fs::rename(path, &backup).map_err(|e| {
        anyhow::anyhow!(
            "failed to move {} aside to {}: {e}",
            path.display(),
            backup.display()
        )
    })?;
    ledger.add_moved_file(path, &backup);
    Ok(Some(backup))
}

/// A path coming out of a payload must be absolute before it can drive
/// filesystem effects on the host.
pub(crate) fn ensure_absolute(name: &str, path: &Path) -> crate::error::Result<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(crate::error::ActuatorError::validation(format!(
            "{name} must be an absolute path, got '{}'",
            path.display()
        )))
    }
}
