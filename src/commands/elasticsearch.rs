//! Elasticsearch actuators.
//!
//! `es install` unpacks a pre-staged distribution tarball, renders a minimal
//! node config, and starts the node as a detached daemon. Every directory,
//! the rendered config, and the daemon pid are recorded so a failed install
//! can be compensated from a later invocation.

use serde::Deserialize;
use std::path::PathBuf;

use crate::commands::{create_recorded_dir, ensure_absolute, write_recorded_file};
use crate::context::ActuatorContext;
use crate::engine::lifecycle::Command;
use crate::engine::step::Step;
use crate::error::{ActuatorError, Result};

fn default_install_dir() -> PathBuf {
    PathBuf::from("/data/esenv")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data/esdata")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("/data/eslog")
}

fn default_package_dir() -> PathBuf {
    PathBuf::from("/data/install")
}

fn default_http_port() -> u16 {
    9200
}

/// Orchestrator payload for `es install`.
#[derive(Debug, Clone, Deserialize)]
pub struct EsInstallParams {
    /// Distribution version, e.g. "7.10.2"
    pub version: String,
    pub cluster_name: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_install_dir")]
    pub install_dir: PathBuf,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Directory where the orchestrator pre-staged the tarball
    #[serde(default = "default_package_dir")]
    pub package_dir: PathBuf,
}

impl EsInstallParams {
    fn package_path(&self) -> PathBuf {
        self.package_dir
            .join(format!("elasticsearch-{}.tar.gz", self.version))
    }

    fn home_dir(&self) -> PathBuf {
        self.install_dir.join(format!("elasticsearch-{}", self.version))
    }

    fn render_config(&self) -> String {
        format!(
            "cluster.name: {}\n\
             path.data: {}\n\
             path.logs: {}\n\
             http.port: {}\n\
             network.host: 0.0.0.0\n",
            self.cluster_name,
            self.data_dir.display(),
            self.log_dir.display(),
            self.http_port
        )
    }
}

/// `es install`
pub struct EsInstall {
    params: EsInstallParams,
}

impl EsInstall {
    pub fn new(params: EsInstallParams) -> Self {
        Self { params }
    }
}

impl Command for EsInstall {
    fn name(&self) -> &str {
        "es-install"
    }

    fn validate(&self) -> Result<()> {
        if self.params.version.trim().is_empty() {
            return Err(ActuatorError::validation("version must not be empty"));
        }
        if self.params.cluster_name.trim().is_empty() {
            return Err(ActuatorError::validation("cluster_name must not be empty"));
        }
        if self.params.http_port == 0 {
            return Err(ActuatorError::validation("http_port must not be 0"));
        }
        ensure_absolute("install_dir", &self.params.install_dir)?;
        ensure_absolute("data_dir", &self.params.data_dir)?;
        ensure_absolute("log_dir", &self.params.log_dir)?;
        ensure_absolute("package_dir", &self.params.package_dir)?;
        Ok(())
    }

    fn steps<'a>(&'a self, ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        let params = &self.params;
        vec![
            Step::new("precheck-package", move |_ledger| {
                ctx.shell
                    .run(&format!("test -f {}", params.package_path().display()))?
                    .ensure_success("package precheck")
            }),
            Step::new("create-dirs", move |ledger| {
                for dir in [&params.install_dir, &params.data_dir, &params.log_dir] {
                    create_recorded_dir(ledger, dir)?;
                }
                Ok(())
            }),
            Step::new("extract-package", move |ledger| {
                ctx.shell
                    .run(&format!(
                        "tar -xzf {} -C {}",
                        params.package_path().display(),
                        params.install_dir.display()
                    ))?
                    .ensure_success("extract package")?;
                ledger.add_created_file(params.home_dir());
                Ok(())
            }),
            Step::new("render-config", move |ledger| {
                let config = params.home_dir().join("config/elasticsearch.yml");
                write_recorded_file(ledger, &config, &params.render_config())
            }),
            Step::new("start-node", move |ledger| {
                let pid = ctx
                    .launcher
                    .start(&format!("{}/bin/elasticsearch", params.home_dir().display()))?;
                ledger.add_spawned_process(pid);
                Ok(())
            }),
        ]
    }
}
