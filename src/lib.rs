//! angela - the trust-and-execution core of a shell-embedded assistant.
//!
//! This crate implements the subsystem that decides what will happen to the
//! user's machine once a shell command has been chosen: it classifies risk,
//! previews effects, gates on user trust and confirmation, executes, and
//! keeps enough history to roll everything back.
//!
//! # Core Modules
//!
//! - [`classifier`] - risk tier and impact assignment for a command string
//! - [`preview`] - human-readable forecast of a command's effect
//! - [`resolver`] - natural-language file reference resolution
//! - [`safety`] - adaptive confirmation gate and per-command trust store
//! - [`execution`] - command/filesystem-primitive execution
//! - [`hooks`] - pre/post hook bus driving the activity tracker
//! - [`rollback`] - transaction log and inverse-operation replay
//! - [`backup`] - timestamped file/directory snapshots
//! - [`config`] - user configuration loading and persistence
//! - [`logging`] - structured logging with sensitive data redaction
//! - [`cli`] - command-line entry point wiring the above together
//!
//! # Example
//!
//! ```no_run
//! use angela::{AngelaCore, config::UserConfiguration};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let core = AngelaCore::new(UserConfiguration::default()).await?;
//! let (classification, _impact) = core.classify("rm -rf /tmp/build");
//! println!("{}: {}", classification.tier, classification.reason);
//! # Ok(())
//! # }
//! ```

pub mod activity;
pub mod backup;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod execution;
pub mod hooks;
pub mod logging;
pub mod models;
pub mod preview;
pub mod resolver;
pub mod rollback;
pub mod safety;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use activity::SessionContext;
use backup::BackupStore;
use classifier::{Classification, CommandRiskClassifier};
use config::{ConfigError, UserConfiguration};
use execution::{CommandOutcome, ExecutionEngine, ExecutionError, FsPrimitive};
use hooks::HookBus;
use models::{ImpactSummary, RiskTier, RollbackReport, ShellType, Transaction, TransactionStatus};
use preview::{PreviewError, PreviewGenerator};
use resolver::{FileReferenceResolver, ResolutionScope};
use rollback::{RollbackError, RollbackManager};
use safety::{ConfirmationRequest, SafetyGate, TrustStore, TrustStoreError};
use uuid::Uuid;

/// Errors surfaced by [`AngelaCore`]'s façade methods. Every component's own
/// error type folds in here rather than being re-thrown as-is, so callers at
/// the CLI boundary have one thing to match on.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Trust(#[from] TrustStoreError),
    #[error(transparent)]
    Rollback(#[from] RollbackError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error(transparent)]
    Preview(#[from] PreviewError),
}

/// Result of the full classify -> preview -> confirm -> execute pipeline
/// driven by [`AngelaCore::run`].
#[derive(Debug)]
pub struct RunOutcome {
    pub classification: Classification,
    pub impact: ImpactSummary,
    pub preview: Option<String>,
    pub confirmed: bool,
    pub outcome: Option<CommandOutcome>,
}

/// Wires together the eight components (§2 of the core design) behind the
/// façade: `classify`, `preview`, `resolve_reference`, `run` (`execute`),
/// `execute_fs`, `begin_transaction`, `end_transaction`,
/// `list_recent_transactions`, `rollback_transaction`.
///
/// Dependencies only point "up" toward `models`: the classifier and preview
/// generator touch only pure data or the filesystem read-only, the safety
/// gate adds trust/history, and the execution engine sits on top of all of
/// it plus the rollback manager. No back-edges.
pub struct AngelaCore {
    classifier: CommandRiskClassifier,
    preview: PreviewGenerator,
    resolver: FileReferenceResolver,
    gate: SafetyGate,
    trust: Arc<TrustStore>,
    engine: ExecutionEngine,
    rollback: Arc<RollbackManager>,
    hooks: HookBus,
    session: SessionContext,
    config: UserConfiguration,
}

impl AngelaCore {
    /// Build every component from a loaded [`UserConfiguration`], creating
    /// the data/backup/journal directories as needed.
    pub async fn new(config: UserConfiguration) -> Result<Self, CoreError> {
        let backup = Arc::new(BackupStore::new(config.backup_dir.clone()));
        let rollback = Arc::new(RollbackManager::new(&config.journal_dir, backup.clone()).await?);
        let trust = Arc::new(TrustStore::open(&config.data_dir.join("trust.sqlite3"))?);

        let session = SessionContext::new();
        let hooks = HookBus::new();
        hooks.install_activity_tracker(session.clone());

        let shell_type = config.default_shell.unwrap_or_else(ShellType::detect);
        let engine = ExecutionEngine::new(shell_type, hooks.clone(), rollback.clone(), backup.clone())
            .with_follow_timeout(Duration::from_secs(config.interactive_stream_timeout_secs));
        let gate = SafetyGate::new(trust.clone(), config.auto_run.clone());

        Ok(Self {
            classifier: CommandRiskClassifier::new(),
            preview: PreviewGenerator::new(),
            resolver: FileReferenceResolver::new(session.clone()),
            gate,
            trust,
            engine,
            rollback,
            hooks,
            session,
            config,
        })
    }

    /// C1: assign a risk tier and impact summary to `command`.
    pub fn classify(&self, command: &str) -> (Classification, ImpactSummary) {
        let classification = self.classifier.classify(command);
        let impact = self.classifier.analyze_impact(command);
        (classification, impact)
    }

    /// C2: forecast what `command` would do, without running it.
    pub async fn preview(&self, command: &str) -> Result<Option<String>, CoreError> {
        Ok(self.preview.generate(command).await?)
    }

    /// C3: map a natural-language reference to a concrete path.
    pub fn resolve_reference(
        &self,
        text: &str,
        cwd: &Path,
        project_root: Option<&Path>,
        scope: ResolutionScope,
    ) -> Option<PathBuf> {
        self.resolver.resolve(text, cwd, project_root, scope)
    }

    /// Run the full pipeline for a single shell command: classify, preview
    /// (if configured), gate on trust/confirmation, then execute. `dry_run`
    /// short-circuits at the gate; the command never runs.
    pub async fn run(
        &self,
        command: &str,
        cwd: &Path,
        dry_run: bool,
        transaction_id: Option<Uuid>,
    ) -> Result<RunOutcome, CoreError> {
        let classification = self.classifier.classify(command);
        let impact = self.classifier.analyze_impact(command);
        let preview = if self.config.show_command_preview {
            self.preview.generate(command).await?
        } else {
            None
        };

        let confirmed = self
            .gate
            .confirm(ConfirmationRequest {
                command,
                tier: classification.tier,
                impact: &impact,
                preview: preview.as_deref(),
                explanation: Some(classification.reason.as_str()),
                confidence: None,
                dry_run,
            })
            .await;

        if !confirmed {
            return Ok(RunOutcome { classification, impact, preview, confirmed, outcome: None });
        }

        let outcome = self.engine.execute_command(command, cwd, transaction_id).await?;
        let _ = self.trust.record_run(command, outcome.result.success);
        self.gate.offer_command_learning(command, classification.tier);

        Ok(RunOutcome { classification, impact, preview, confirmed, outcome: Some(outcome) })
    }

    /// Perform a single filesystem primitive (bypasses the gate; callers
    /// that need confirmation should classify/preview/confirm it themselves
    /// first, as `run` does for shell commands).
    pub async fn execute_fs(&self, op: FsPrimitive, transaction_id: Option<Uuid>) -> Result<u64, CoreError> {
        Ok(self.engine.execute_fs_op(op, transaction_id).await?)
    }

    pub async fn begin_transaction(&self, description: impl Into<String>) -> Result<Uuid, CoreError> {
        Ok(self.rollback.begin(description).await?)
    }

    pub async fn end_transaction(&self, tx_id: Uuid, status: TransactionStatus) -> Result<(), CoreError> {
        Ok(self.rollback.end(tx_id, status).await?)
    }

    pub async fn list_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>, CoreError> {
        Ok(self.rollback.list_recent_transactions(limit).await?)
    }

    pub async fn rollback_transaction(&self, tx_id: Uuid) -> Result<RollbackReport, CoreError> {
        Ok(self.rollback.rollback_tx(tx_id).await?)
    }

    pub async fn rollback_operation(&self, op_id: u64) -> Result<bool, CoreError> {
        Ok(self.rollback.rollback_op(op_id).await?)
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn hooks(&self) -> &HookBus {
        &self.hooks
    }

    pub fn config(&self) -> &UserConfiguration {
        &self.config
    }
}

pub use models::RiskTier as Tier;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn core(root: &Path) -> AngelaCore {
        let config = UserConfiguration {
            data_dir: root.to_path_buf(),
            backup_dir: root.join("backups"),
            journal_dir: root.join("backups"),
            ..UserConfiguration::default()
        };
        AngelaCore::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn classify_reports_critical_for_rm_rf_root() {
        let root = TempDir::new().unwrap();
        let core = core(root.path()).await;
        let (classification, _impact) = core.classify("rm -rf /");
        assert_eq!(classification.tier, RiskTier::Critical);
    }

    #[tokio::test]
    async fn dry_run_never_executes_and_reports_unconfirmed() {
        let root = TempDir::new().unwrap();
        let core = core(root.path()).await;
        let outcome = core.run("echo hi", root.path(), true, None).await.unwrap();
        assert!(!outcome.confirmed);
        assert!(outcome.outcome.is_none());
    }

    #[tokio::test]
    async fn transaction_lifecycle_round_trips() {
        let root = TempDir::new().unwrap();
        let core = core(root.path()).await;
        let tx_id = core.begin_transaction("test transaction").await.unwrap();
        core.end_transaction(tx_id, TransactionStatus::Completed).await.unwrap();
        let recent = core.list_recent_transactions(10).await.unwrap();
        assert!(recent.iter().any(|tx| tx.id == tx_id));
    }
}
