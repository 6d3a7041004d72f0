//! Protected-path guard for destructive compensations.
//!
//! Rolling back a `Created` entry deletes a file or a whole directory tree.
//! A corrupted or hand-edited ledger must never be able to aim that at a
//! system path or a product data root, so every delete/unlink compensation
//! consults this guard immediately before acting and turns a refusal into an
//! error, never a silent skip.
//!
//! The check matches both the full path and its last component against the
//! protected set. The base-name match is intentionally broad: a nested
//! directory that merely shares a name with a data root (`.../data`) is also
//! refused. Over-refusing is the acceptable failure mode here.

use std::path::Path;

use crate::error::{ActuatorError, Result};

/// Paths that must never be the target of a destructive compensation.
/// System roots plus the product data roots used by every actuator.
const PROTECTED_PATHS: &[&str] = &["/", "/etc", "/usr", "/usr/local", "/data", "/data1"];

/// Decides whether a filesystem path may be deleted during rollback.
#[derive(Debug, Clone)]
pub struct SafetyGuard {
    protected: Vec<String>,
}

impl Default for SafetyGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyGuard {
    /// Guard over the built-in protected set.
    pub fn new() -> Self {
        Self {
            protected: PROTECTED_PATHS.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Guard over the built-in set plus additional protected paths.
    pub fn with_extra_paths<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = Self::new();
        guard.protected.extend(extra.into_iter().map(Into::into));
        guard
    }

    /// Returns true if `path` may be the target of a destructive action.
    pub fn is_safe(&self, path: &Path) -> bool {
        let raw = path.to_string_lossy();
        let raw = raw.trim();
        if raw.is_empty() {
            return false;
        }

        // Normalize trailing slashes ("/etc/" == "/etc"); a path that is
        // nothing but slashes ("//", "///") is still the root
        let stripped = raw.trim_end_matches('/');
        let normalized = if stripped.is_empty() { "/" } else { stripped };

        for entry in &self.protected {
            if normalized == entry {
                return false;
            }
            // Base-name match: refuse anything whose last component collides
            // with a protected entry's last component
            if let (Some(base), Some(entry_base)) =
                (Path::new(normalized).file_name(), Path::new(entry).file_name())
                && base == entry_base
            {
                return false;
            }
        }
        true
    }

    /// Error variant of [`is_safe`](Self::is_safe) for use on compensation paths.
    pub fn ensure_safe(&self, path: &Path) -> Result<()> {
        if self.is_safe(path) {
            Ok(())
        } else {
            Err(ActuatorError::safety_violation(path))
        }
    }
}
