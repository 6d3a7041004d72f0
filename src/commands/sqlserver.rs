//! SQL Server actuators.
//!
//! `sqlserver init-conf` rewrites `mssql.conf` with the orchestrator-supplied
//! network and memory settings, then restarts the service. Same
//! backup-then-rewrite pattern as the Pulsar broker config.

use serde::Deserialize;
use std::path::PathBuf;

use crate::commands::{backup_aside, ensure_absolute, write_recorded_file};
use crate::context::ActuatorContext;
use crate::engine::lifecycle::Command;
use crate::engine::step::Step;
use crate::error::{ActuatorError, Result};

fn default_conf_path() -> PathBuf {
    PathBuf::from("/var/opt/mssql/mssql.conf")
}

fn default_tcp_port() -> u16 {
    1433
}

fn default_restart() -> bool {
    true
}

/// Orchestrator payload for `sqlserver init-conf`.
#[derive(Debug, Clone, Deserialize)]
pub struct SqlserverInitConfParams {
    #[serde(default = "default_conf_path")]
    pub conf_path: PathBuf,
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    /// Upper bound for the SQL Server memory manager, in MB
    pub memory_limit_mb: Option<u64>,
    #[serde(default = "default_restart")]
    pub restart: bool,
}

impl SqlserverInitConfParams {
    fn render(&self) -> String {
        let mut out = format!("[network]\ntcpport = {}\n", self.tcp_port);
        if let Some(limit) = self.memory_limit_mb {
            out.push_str(&format!("\n[memory]\nmemorylimitmb = {limit}\n"));
        }
        out
    }
}

/// `sqlserver init-conf`
pub struct SqlserverInitConf {
    params: SqlserverInitConfParams,
}

impl SqlserverInitConf {
    pub fn new(params: SqlserverInitConfParams) -> Self {
        Self { params }
    }
}

impl Command for SqlserverInitConf {
    fn name(&self) -> &str {
        "sqlserver-init-conf"
    }

    fn validate(&self) -> Result<()> {
        if self.params.tcp_port == 0 {
            return Err(ActuatorError::validation("tcp_port must not be 0"));
        }
        if self.params.memory_limit_mb == Some(0) {
            return Err(ActuatorError::validation("memory_limit_mb must not be 0"));
        }
        ensure_absolute("conf_path", &self.params.conf_path)
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        let mut steps = vec![
            Step::new("backup-conf", move |ledger| {
                backup_aside(ledger, &params.conf_path)?;
                Ok(())
            }),
            Step::new("render-conf", move |ledger| {
                write_recorded_file(ledger, &params.conf_path, &params.render())
            }),
        ];
        if params.restart {
            steps.push(Step::new("restart-service", move |_ledger| {
                ctx.shell
                    .run("systemctl restart mssql-server")?
                    .ensure_success("restart mssql-server")
            }));
        }
        steps
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

    fn params_in(tmp: &TempDir) -> SqlserverInitConfParams {
        SqlserverInitConfParams {
            conf_path: tmp.path().join("mssql.conf"),
            tcp_port: 1433,
            memory_limit_mb: Some(8192),
            restart: true,
        }
    }

    #[test]
    fn test_init_conf_renders_settings() {
        let tmp = TempDir::new().unwrap();
        let params = params_in(&tmp);
        fs::write(&params.conf_path, b"[network]\ntcpport = 1433\n").unwrap();

        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = SqlserverInitConf::new(params.clone());

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();

        let rendered = fs::read_to_string(&params.conf_path).unwrap();
        assert!(rendered.contains("tcpport = 1433"));
        assert!(rendered.contains("memorylimitmb = 8192"));
        assert_eq!(ledger.file_ops().len(), 2);
        assert_eq!(
            shell.commands.borrow().as_slice(),
            ["systemctl restart mssql-server"]
        );
    }

    #[test]
    fn test_restart_false_skips_the_service_step() {
        let tmp = TempDir::new().unwrap();
        let mut params = params_in(&tmp);
        params.restart = false;

        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = SqlserverInitConf::new(params);

        let steps = cmd.steps(&ctx);
        assert_eq!(StepRunner::describe(&steps), vec!["backup-conf", "render-conf"]);
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let tmp = TempDir::new().unwrap();
        let mut params = params_in(&tmp);
        params.memory_limit_mb = Some(0);
        assert!(SqlserverInitConf::new(params).validate().is_err());
    }
}
