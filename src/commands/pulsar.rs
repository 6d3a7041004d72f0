//! Pulsar actuators.
//!
//! `pulsar configure-broker` rewrites the live broker config: the current
//! file is moved aside (recorded as a move), the new one rendered in its
//! place (recorded as created), then the broker restarted. Rollback replays
//! newest-first, so the rewrite is deleted before the original moves back.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::commands::{backup_aside, ensure_absolute, write_recorded_file};
use crate::context::ActuatorContext;
use crate::engine::lifecycle::Command;
use crate::engine::step::Step;
use crate::error::{ActuatorError, Result};

fn default_install_dir() -> PathBuf {
    PathBuf::from("/data/pulsarenv")
}

fn default_conf_path() -> PathBuf {
    PathBuf::from("/data/pulsarenv/conf/broker.conf")
}

/// Orchestrator payload for `pulsar configure-broker`.
#[derive(Debug, Clone, Deserialize)]
pub struct PulsarConfigureParams {
    pub cluster_name: String,
    /// Comma-separated zookeeper quorum, e.g. "zk1:2181,zk2:2181"
    pub zookeeper_servers: String,
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_conf_path")]
    pub conf_path: PathBuf,
    /// Extra broker settings appended verbatim as key=value lines
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
}

impl PulsarConfigureParams {
    fn render(&self) -> String {
        let mut out = format!(
            "clusterName={}\nzookeeperServers={}\nconfigurationStoreServers={}\n",
            self.cluster_name, self.zookeeper_servers, self.zookeeper_servers
        );
        // BTreeMap iteration keeps the rendered file deterministic
        for (key, value) in &self.overrides {
            out.push_str(&format!("{key}={value}\n"));
        }
        out
    }
}

/// `pulsar configure-broker`
pub struct PulsarConfigure {
    params: PulsarConfigureParams,
}

impl PulsarConfigure {
    pub fn new(params: PulsarConfigureParams) -> Self {
        Self { params }
    }
}

impl Command for PulsarConfigure {
    fn name(&self) -> &str {
        "pulsar-configure-broker"
    }

    fn validate(&self) -> Result<()> {
        if self.params.cluster_name.trim().is_empty() {
            return Err(ActuatorError::validation("cluster_name must not be empty"));
        }
        if self.params.zookeeper_servers.trim().is_empty() {
            return Err(ActuatorError::validation(
                "zookeeper_servers must not be empty",
            ));
        }
        ensure_absolute("install_dir", &self.params.install_dir)?;
        ensure_absolute("conf_path", &self.params.conf_path)?;
        Ok(())
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        vec![
            Step::new("backup-config", move |ledger| {
                backup_aside(ledger, &params.conf_path)?;
                Ok(())
            }),
            Step::new("render-config", move |ledger| {
                write_recorded_file(ledger, &params.conf_path, &params.render())
            }),
            Step::new("restart-broker", move |_ledger| {
                ctx.shell
                    .run(&format!(
                        "{}/bin/pulsar-daemon restart broker",
                        params.install_dir.display()
                    ))?
                    .ensure_success("restart broker")
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingShell;
    use crate::engine::SafetyGuard;
    use crate::engine::ledger::RollbackLedger;
    use crate::engine::step::StepRunner;
    use std::fs;
    use tempfile::TempDir;

    fn params_in(tmp: &TempDir) -> PulsarConfigureParams {
        PulsarConfigureParams {
            cluster_name: "pulsar-prod".to_string(),
            zookeeper_servers: "zk1:2181,zk2:2181".to_string(),
            install_dir: tmp.path().join("pulsarenv"),
            conf_path: tmp.path().join("broker.conf"),
            overrides: BTreeMap::from([(
                "managedLedgerDefaultEnsembleSize".to_string(),
                "3".to_string(),
            )]),
        }
    }

    #[test]
    fn test_configure_backs_up_and_rewrites() {
        let tmp = TempDir::new().unwrap();
        let params = params_in(&tmp);
        fs::write(&params.conf_path, b"old settings").unwrap();

        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = PulsarConfigure::new(params.clone());

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();

        let rendered = fs::read_to_string(&params.conf_path).unwrap();
        assert!(rendered.contains("clusterName=pulsar-prod"));
        assert!(rendered.contains("managedLedgerDefaultEnsembleSize=3"));
        assert_eq!(ledger.file_ops().len(), 2, "one move, one create");
        assert!(shell.commands.borrow()[0].contains("pulsar-daemon restart broker"));
    }

    #[test]
    fn test_failed_restart_rolls_back_to_original_config() {
        let tmp = TempDir::new().unwrap();
        let params = params_in(&tmp);
        fs::write(&params.conf_path, b"old settings").unwrap();

        let mut shell = RecordingShell::new();
        shell.fail_contains = Some("pulsar-daemon");
        let ctx = shell.context();
        let cmd = PulsarConfigure::new(params.clone());

        let mut ledger = RollbackLedger::new();
        let err = StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap_err();
        assert!(err.to_string().contains("restart-broker"));

        // The emitted ledger, replayed later, restores the original file
        ledger.roll_back(&SafetyGuard::new()).unwrap();
        assert_eq!(fs::read(&params.conf_path).unwrap(), b"old settings");
    }

    #[test]
    fn test_configure_without_existing_config_records_only_create() {
        let tmp = TempDir::new().unwrap();
        let params = params_in(&tmp);

        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = PulsarConfigure::new(params);

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();
        assert_eq!(ledger.file_ops().len(), 1);
    }
}
