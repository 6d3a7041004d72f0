use clap::{Parser, Subcommand};

use crate::payload::PayloadFormat;

/// dbactuator - single-host database actuators driven by an orchestrator payload
#[derive(Parser)]
#[command(name = "dbactuator")]
#[command(about = "Install, configure, start/stop and decommission database processes on one host")]
#[command(version)]
pub struct Cli {
    /// Serialized operation parameters (JSON; base64-encoded unless
    /// --payload-format=raw). With --rollback this is a serialized rollback
    /// ledger from a previous failed invocation instead.
    #[arg(short, long, global = true)]
    pub payload: Option<String>,

    /// Encoding of the payload value
    #[arg(long, global = true, value_enum, default_value_t = PayloadFormat::Base64)]
    pub payload_format: PayloadFormat,

    /// Undo a previously emitted rollback ledger instead of running forward
    #[arg(long, global = true)]
    pub rollback: bool,

    /// Print the step plan without executing
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Elasticsearch actuators
    Es {
        #[command(subcommand)]
        op: EsOp,
    },
    /// Kafka actuators
    Kafka {
        #[command(subcommand)]
        op: KafkaOp,
    },
    /// Pulsar actuators
    Pulsar {
        #[command(subcommand)]
        op: PulsarOp,
    },
    /// InfluxDB actuators
    Influxdb {
        #[command(subcommand)]
        op: InfluxdbOp,
    },
    /// SQL Server actuators
    Sqlserver {
        #[command(subcommand)]
        op: SqlserverOp,
    },
}

#[derive(Subcommand)]
pub enum EsOp {
    /// Unpack the distribution, render the node config, start the node
    Install,
}

#[derive(Subcommand)]
pub enum KafkaOp {
    /// Launch the broker detached and record its pid
    StartBroker,
    /// Stop the broker synchronously
    StopBroker,
}

#[derive(Subcommand)]
pub enum PulsarOp {
    /// Rewrite broker.conf (backup kept) and restart the broker
    ConfigureBroker,
}

#[derive(Subcommand)]
pub enum InfluxdbOp {
    /// Lay out directories, render the config, start influxd
    Install,
}

#[derive(Subcommand)]
pub enum SqlserverOp {
    /// Rewrite mssql.conf (backup kept) and restart the service
    InitConf,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
