//! End-to-end recovery tests: a forward failure emits a framed ledger, and a
//! later invocation reconstructs that ledger from the emitted line alone and
//! undoes every recorded effect. Nothing is shared between the two passes
//! except the serialized text, matching the real orchestrator hand-off.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use dbactuator::ActuatorContext;
use dbactuator::engine::ledger::RollbackLedger;
use dbactuator::engine::lifecycle::{Command, Controller, OperationStage, extract_framed_ledger};
use dbactuator::engine::step::Step;
use dbactuator::error::Result;
use tempfile::TempDir;

/// A command that builds a directory tree and a rewritten config, then fails
/// on its last step.
struct DoomedInstall {
    root: PathBuf,
    conf: PathBuf,
}

impl Command for DoomedInstall {
    fn name(&self) -> &str {
        "doomed-install"
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }

    fn steps<'a>(&'a self, _ctx: &'a ActuatorContext) -> Vec<Step<'a>> {
        vec![
            Step::new("create-tree", |ledger: &mut RollbackLedger| {
                fs::create_dir(&self.root)?;
                ledger.add_created_file(&self.root);
                let inner = self.root.join("data");
                fs::create_dir(&inner)?;
                ledger.add_created_file(&inner);
                fs::write(inner.join("seed"), b"seed")?;
                ledger.add_created_file(inner.join("seed"));
                Ok(())
            }),
            Step::new("rewrite-config", |ledger: &mut RollbackLedger| {
                let backup = PathBuf::from(format!("{}.bak", self.conf.display()));
                fs::rename(&self.conf, &backup)?;
                ledger.add_moved_file(&self.conf, &backup);
                fs::write(&self.conf, b"rewritten")?;
                ledger.add_created_file(&self.conf);
                Ok(())
            }),
            Step::new("start-service", |_ledger: &mut RollbackLedger| {
                anyhow::bail!("service refused to start")
            }),
        ]
    }
}

fn run_to_failure(cmd: &mut dyn Command) -> String {
    let mut controller = Controller::new();
    let mut out = Vec::new();
    let err = controller
        .run_forward(cmd, &ActuatorContext::system(), &mut out)
        .unwrap_err();
    assert!(err.to_string().contains("start-service"));
    assert_eq!(controller.stage(), OperationStage::Failed);
    String::from_utf8(out).unwrap()
}

#[test]
fn test_forward_failure_then_rollback_restores_the_host() {
    let tmp = TempDir::new().unwrap();
    let conf = tmp.path().join("broker.conf");
    fs::write(&conf, b"original").unwrap();

    let mut cmd = DoomedInstall {
        root: tmp.path().join("dbenv"),
        conf: conf.clone(),
    };
    let emitted = run_to_failure(&mut cmd);

    // The half-applied state is visible before recovery
    assert!(cmd.root.join("data/seed").exists());
    assert_eq!(fs::read(&conf).unwrap(), b"rewritten");

    // A fresh controller sees only the framed line, as the real rollback
    // invocation would
    let ledger_json = extract_framed_ledger(&emitted).expect("framed ledger on stdout");
    let mut recovery = Controller::new();
    recovery.run_rollback(ledger_json).unwrap();
    assert_eq!(recovery.stage(), OperationStage::RolledBack);

    assert!(!cmd.root.exists(), "created tree is removed leaf-first");
    assert_eq!(fs::read(&conf).unwrap(), b"original");
    assert!(!tmp.path().join("broker.conf.bak").exists());
}

#[test]
fn test_rollback_kills_a_recorded_process() {
    let child = std::process::Command::new("bash")
        .args(["-c", "sleep 300"])
        .spawn()
        .unwrap();
    let pid = child.id();

    let mut ledger = RollbackLedger::new();
    ledger.add_spawned_process(pid);
    let json = ledger.to_json().unwrap();

    let mut recovery = Controller::new();
    recovery.run_rollback(&json).unwrap();

    // Give the signal a moment to land, then reap
    std::thread::sleep(Duration::from_millis(200));
    let mut child = child;
    let status = child.try_wait().unwrap();
    assert!(status.is_some(), "sleeper must be gone after rollback");
}

#[test]
fn test_rollback_is_idempotent_for_dead_pids_and_gone_files() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("ephemeral");
    fs::write(&path, b"x").unwrap();

    let mut ledger = RollbackLedger::new();
    ledger.add_created_file(&path);
    let json = ledger.to_json().unwrap();

    let mut first = Controller::new();
    first.run_rollback(&json).unwrap();
    assert!(!path.exists());

    // Replaying the same ledger finds nothing to undo and still succeeds
    let mut second = Controller::new();
    second.run_rollback(&json).unwrap();
    assert_eq!(second.stage(), OperationStage::RolledBack);
}
