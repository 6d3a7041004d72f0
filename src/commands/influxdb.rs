//! InfluxDB actuators.
//!
//! `influxdb install` lays out the data directories, renders a config, and
//! starts `influxd` detached with its pid recorded.

use serde::Deserialize;
use std::path::PathBuf;

use crate::commands::{create_recorded_dir, ensure_absolute, write_recorded_file};
use crate::context::ActuatorContext;
use crate::engine::lifecycle::Command;
use crate::engine::step::Step;
use crate::error::{ActuatorError, Result};

fn default_install_dir() -> PathBuf {
    PathBuf::from("/data/influxenv")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data/influxdata")
}

fn default_wal_dir() -> PathBuf {
    PathBuf::from("/data/influxwal")
}

fn default_influxd_path() -> PathBuf {
    PathBuf::from("/usr/bin/influxd")
}

fn default_http_port() -> u16 {
    8086
}

/// Orchestrator payload for `influxdb install`.
#[derive(Debug, Clone, Deserialize)]
pub struct InfluxdbInstallParams {
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_wal_dir")]
    pub wal_dir: PathBuf,
    #[serde(default = "default_influxd_path")]
    pub influxd_path: PathBuf,
}

impl InfluxdbInstallParams {
    fn config_path(&self) -> PathBuf {
        self.install_dir.join("influxdb.conf")
    }

    fn render_config(&self) -> String {
        format!(
            "[meta]\n  dir = \"{}/meta\"\n\n\
             [data]\n  dir = \"{}\"\n  wal-dir = \"{}\"\n\n\
             [http]\n  bind-address = \":{}\"\n",
            self.data_dir.display(),
            self.data_dir.display(),
            self.wal_dir.display(),
            self.http_port
        )
    }
}

/// `influxdb install`
pub struct InfluxdbInstall {
    params: InfluxdbInstallParams,
}

impl InfluxdbInstall {
    pub fn new(params: InfluxdbInstallParams) -> Self {
        Self { params }
    }
}

impl Command for InfluxdbInstall {
    fn name(&self) -> &str {
        "influxdb-install"
    }

    fn validate(&self) -> Result<()> {
        if self.params.http_port == 0 {
            return Err(ActuatorError::validation("http_port must not be 0"));
        }
        ensure_absolute("install_dir", &self.params.install_dir)?;
        ensure_absolute("data_dir", &self.params.data_dir)?;
        ensure_absolute("wal_dir", &self.params.wal_dir)?;
        ensure_absolute("influxd_path", &self.params.influxd_path)?;
        Ok(())
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        vec![
            Step::new("precheck-binary", move |_ledger| {
                ctx.shell
                    .run(&format!("test -x {}", params.influxd_path.display()))?
                    .ensure_success("influxd precheck")
            }),
            Step::new("create-dirs", move |ledger| {
                for dir in [&params.install_dir, &params.data_dir, &params.wal_dir] {
                    create_recorded_dir(ledger, dir)?;
                }
                Ok(())
            }),
            Step::new("render-config", move |ledger| {
                write_recorded_file(ledger, &params.config_path(), &params.render_config())
            }),
            Step::new("start-server", move |ledger| {
                let pid = ctx.launcher.start(&format!(
                    "{} -config {}",
                    params.influxd_path.display(),
                    params.config_path().display()
                ))?;
                ledger.add_spawned_process(pid);
                Ok(())
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingShell;
    use crate::engine::ledger::RollbackLedger;
    use crate::engine::step::StepRunner;
    use std::fs;
    use tempfile::TempDir;

    fn params_in(tmp: &TempDir) -> InfluxdbInstallParams {
        InfluxdbInstallParams {
            http_port: 8086,
            install_dir: tmp.path().join("influxenv"),
            data_dir: tmp.path().join("influxdata"),
            wal_dir: tmp.path().join("influxwal"),
            influxd_path: PathBuf::from("/usr/bin/influxd"),
        }
    }

    #[test]
    fn test_install_records_dirs_config_and_pid() {
        let tmp = TempDir::new().unwrap();
        let params = params_in(&tmp);

        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = InfluxdbInstall::new(params.clone());

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();

        assert_eq!(ledger.file_ops().len(), 4, "three dirs and the config");
        assert_eq!(ledger.process_ops().len(), 1);

        let rendered = fs::read_to_string(params.config_path()).unwrap();
        assert!(rendered.contains("bind-address = \":8086\""));
        assert!(shell.commands.borrow().last().unwrap().contains("-config"));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let tmp = TempDir::new().unwrap();
        let mut params = params_in(&tmp);
        params.http_port = 0;
        assert!(InfluxdbInstall::new(params).validate().is_err());
    }
}
