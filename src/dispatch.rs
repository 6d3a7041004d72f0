//! Maps a parsed command line onto one lifecycle run and an exit code.
//!
//! Exit code is the whole contract with the calling orchestrator: 0 for
//! Succeeded or RolledBack, 1 for anything else. Diagnostics go to stderr
//! via tracing; stdout is reserved for the framed ledger on forward failure.

use serde::de::DeserializeOwned;
use tracing::{error, info};

use crate::cli::{Cli, Commands, EsOp, InfluxdbOp, KafkaOp, PulsarOp, SqlserverOp};
use crate::commands::elasticsearch::EsInstall;
use crate::commands::influxdb::InfluxdbInstall;
use crate::commands::kafka::{KafkaStart, KafkaStop};
use crate::commands::pulsar::PulsarConfigure;
use crate::commands::sqlserver::SqlserverInitConf;
use crate::context::ActuatorContext;
use crate::engine::lifecycle::{Command, Controller};
use crate::engine::step::StepRunner;
use crate::error::{ActuatorError, Result};
use crate::payload::{self, PayloadFormat};

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;

/// Run one invocation end to end and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    match execute(cli) {
        Ok(()) => EXIT_OK,
        Err(e) => {
            error!("{e}");
            EXIT_FAILED
        }
    }
}

fn execute(cli: Cli) -> Result<()> {
    let raw = cli
        .payload
        .as_deref()
        .ok_or_else(|| ActuatorError::validation("--payload is required"))?;

    if cli.rollback {
        // The payload is a ledger emitted by a previous failed invocation,
        // not operation parameters.
        let ledger_json = payload::decode(raw, cli.payload_format)?;
        let mut controller = Controller::new();
        controller.run_rollback(&ledger_json)?;
        info!("rollback complete");
        return Ok(());
    }

    let mut cmd = build_command(&cli.command, raw, cli.payload_format)?;
    let ctx = ActuatorContext::system();

    if cli.dry_run {
        cmd.validate()?;
        info!("dry run: {} would execute:", cmd.name());
        for name in StepRunner::describe(&cmd.steps(&ctx)) {
            println!("  {name}");
        }
        return Ok(());
    }

    let mut controller = Controller::new();
    controller.run_forward(cmd.as_mut(), &ctx, &mut std::io::stdout())
}

fn parse<T: DeserializeOwned>(raw: &str, format: PayloadFormat) -> Result<T> {
    payload::parse(raw, format)
}

fn build_command(
    command: &Commands,
    raw: &str,
    format: PayloadFormat,
) -> Result<Box<dyn Command>> {
    Ok(match command {
        Commands::Es { op: EsOp::Install } => Box::new(EsInstall::new(parse(raw, format)?)),
        Commands::Kafka {
            op: KafkaOp::StartBroker,
        } => Box::new(KafkaStart::new(parse(raw, format)?)),
        Commands::Kafka {
            op: KafkaOp::StopBroker,
        } => Box::new(KafkaStop::new(parse(raw, format)?)),
        Commands::Pulsar {
            op: PulsarOp::ConfigureBroker,
        } => Box::new(PulsarConfigure::new(parse(raw, format)?)),
        Commands::Influxdb {
            op: InfluxdbOp::Install,
        } => Box::new(InfluxdbInstall::new(parse(raw, format)?)),
        Commands::Sqlserver {
            op: SqlserverOp::InitConf,
        } => Box::new(SqlserverInitConf::new(parse(raw, format)?)),
    })
}
