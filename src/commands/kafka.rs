//! Kafka actuators.
//!
//! `kafka start-broker` launches the broker fire-and-forget and records its
//! pid so an aborted operation can kill it again; `kafka stop-broker` is a
//! plain synchronous stop with no reversible effects, so its ledger stays
//! empty.

use serde::Deserialize;
use std::path::PathBuf;

use crate::commands::ensure_absolute;
use crate::context::ActuatorContext;
use crate::engine::lifecycle::Command;
use crate::engine::step::Step;
use crate::error::Result;

fn default_install_dir() -> PathBuf {
    PathBuf::from("/data/kafkaenv")
}

fn default_config_path() -> PathBuf {
    PathBuf::from("/data/kafkaenv/config/server.properties")
}

/// Orchestrator payload for `kafka start-broker`.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaStartParams {
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,
}

/// `kafka start-broker`
pub struct KafkaStart {
    params: KafkaStartParams,
}

impl KafkaStart {
    pub fn new(params: KafkaStartParams) -> Self {
        Self { params }
    }
}

impl Command for KafkaStart {
    fn name(&self) -> &str {
        "kafka-start-broker"
    }

    fn validate(&self) -> Result<()> {
        ensure_absolute("install_dir", &self.params.install_dir)?;
        ensure_absolute("config_path", &self.params.config_path)?;
        Ok(())
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        vec![
            Step::new("precheck-script", move |_ledger| {
                ctx.shell
                    .run(&format!(
                        "test -x {}/bin/kafka-server-start.sh",
                        params.install_dir.display()
                    ))?
                    .ensure_success("broker script precheck")
            }),
            Step::new("start-broker", move |ledger| {
                let pid = ctx.launcher.start(&format!(
                    "{}/bin/kafka-server-start.sh {}",
                    params.install_dir.display(),
                    params.config_path.display()
                ))?;
                ledger.add_spawned_process(pid);
                Ok(())
            }),
        ]
    }
}

/// Orchestrator payload for `kafka stop-broker`.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaStopParams {
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
}

/// `kafka stop-broker`
pub struct KafkaStop {
    params: KafkaStopParams,
}

impl KafkaStop {
    pub fn new(params: KafkaStopParams) -> Self {
        Self { params }
    }
}

impl Command for KafkaStop {
    fn name(&self) -> &str {
        "kafka-stop-broker"
    }

    fn validate(&self) -> Result<()> {
        ensure_absolute("install_dir", &self.params.install_dir)
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        vec![Step::new("stop-broker", move |_ledger| {
            ctx.shell
                .run(&format!(
                    "{}/bin/kafka-server-stop.sh",
                    params.install_dir.display()
                ))?
                .ensure_success("stop broker")
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::RecordingShell;
    use crate::engine::ledger::RollbackLedger;
    use crate::engine::step::StepRunner;

    #[test]
    fn test_start_records_broker_pid() {
        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = KafkaStart::new(KafkaStartParams {
            install_dir: PathBuf::from("/data/kafkaenv"),
            config_path: PathBuf::from("/data/kafkaenv/config/server.properties"),
        });

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();

        assert_eq!(ledger.process_ops().len(), 1);
        assert!(ledger.file_ops().is_empty());
        let commands = shell.commands.borrow();
        assert!(commands[1].contains("kafka-server-start.sh"));
        assert!(commands[1].ends_with("server.properties"));
    }

    #[test]
    fn test_stop_leaves_ledger_empty() {
        let shell = RecordingShell::new();
        let ctx = shell.context();
        let cmd = KafkaStop::new(KafkaStopParams {
            install_dir: PathBuf::from("/data/kafkaenv"),
        });

        let mut ledger = RollbackLedger::new();
        StepRunner::run(cmd.steps(&ctx), &mut ledger).unwrap();
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_validate_rejects_relative_install_dir() {
        let cmd = KafkaStart::new(KafkaStartParams {
            install_dir: PathBuf::from("kafkaenv"),
            config_path: default_config_path(),
        });
        assert!(cmd.validate().is_err());
    }
}
