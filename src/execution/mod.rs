//! Execution Engine (C5): the only component that actually runs a command
//! or touches the filesystem on the caller's behalf. Every mutating call is
//! backed up first and recorded to the [`crate::rollback::RollbackManager`]
//! so it can be undone later.
//!
//! Confirmation (the Safety Gate) happens one layer up, before a command
//! ever reaches here — by the time `execute_command`/`execute_fs_op` run,
//! the decision to proceed has already been made.

mod executor;
mod progress;
mod shell;

pub use executor::{CommandExecutor, ExecutionResult, ExecutorError};
pub use progress::CommandProgress;

use crate::backup::{BackupError, BackupStore};
use crate::hooks::{HookBus, HookContext, HookPoint};
use crate::models::{RecordKind, ShellType};
use crate::rollback::{RollbackError, RollbackManager};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Executor(#[from] ExecutorError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Rollback(#[from] RollbackError),
    #[error("`{0}` expects an interactive terminal and cannot be run headlessly here")]
    RequiresInteractiveTerminal(String),
    #[error("path already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("path does not exist: {0}")]
    NotFound(PathBuf),
}

/// Outcome of [`ExecutionEngine::execute_command`]. `new_cwd` is set when
/// the command was (or began with) a `cd`, since that has no effect on the
/// engine's own process and must be threaded back to the caller.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub result: ExecutionResult,
    pub new_cwd: Option<PathBuf>,
    pub operation_id: Option<u64>,
}

/// A single filesystem mutation the engine knows how to perform, back up,
/// and record for rollback.
#[derive(Debug, Clone)]
pub enum FsPrimitive {
    CreateFile { path: PathBuf, contents: String },
    WriteFile { path: PathBuf, contents: String },
    DeleteFile { path: PathBuf },
    CreateDirectory { path: PathBuf },
    DeleteDirectory { path: PathBuf },
    CopyFile { source: PathBuf, dest: PathBuf },
    MoveFile { source: PathBuf, dest: PathBuf },
}

pub struct ExecutionEngine {
    shell_type: ShellType,
    hooks: HookBus,
    rollback: Arc<RollbackManager>,
    backup: Arc<BackupStore>,
    follow_timeout: std::time::Duration,
}

impl ExecutionEngine {
    pub fn new(shell_type: ShellType, hooks: HookBus, rollback: Arc<RollbackManager>, backup: Arc<BackupStore>) -> Self {
        Self { shell_type, hooks, rollback, backup, follow_timeout: std::time::Duration::from_secs(30) }
    }

    pub fn with_follow_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.follow_timeout = timeout;
        self
    }

    /// Run a shell command. Handles `cd`/`cd ... &&` translation itself
    /// (a subprocess's directory change doesn't outlive the subprocess),
    /// skips the shell entirely when no metacharacters are present, and
    /// refuses commands from the interactive table rather than silently
    /// swallowing a TTY-only program's output.
    pub async fn execute_command(
        &self,
        command: &str,
        cwd: &Path,
        transaction_id: Option<Uuid>,
    ) -> Result<CommandOutcome, ExecutionError> {
        let tokens = shell_words::split(command).unwrap_or_default();
        let Some(base_cmd) = tokens.first().cloned() else {
            return Ok(CommandOutcome {
                result: empty_success(),
                new_cwd: None,
                operation_id: None,
            });
        };

        self.hooks.fire(HookPoint::PreCommand, &HookContext::for_command(command, tokens.clone(), true));

        if shell::is_interactive(&base_cmd) {
            return Err(ExecutionError::RequiresInteractiveTerminal(base_cmd));
        }

        if let Some((dir, rest)) = shell::split_cd_prefix(command) {
            let new_cwd = resolve_dir(cwd, dir);
            let result = match rest {
                Some(rest_cmd) => {
                    let rest_tokens = shell_words::split(rest_cmd).unwrap_or_default();
                    executor::execute_best_effort(rest_cmd, &rest_tokens, self.shell_type, &new_cwd, false).await?
                }
                None => empty_success(),
            };
            self.hooks.fire(HookPoint::PostCommand, &HookContext::for_command(command, tokens, result.success));
            return Ok(CommandOutcome { result, new_cwd: Some(new_cwd), operation_id: None });
        }

        let interactive = false;
        let run = executor::execute_best_effort(command, &tokens, self.shell_type, cwd, interactive);
        let result = if shell::is_continuous_follow(&base_cmd, &tokens) {
            tokio::time::timeout(self.follow_timeout, run)
                .await
                .map_err(|_| ExecutorError::Timeout(self.follow_timeout.as_millis() as u64))??
        } else {
            run.await?
        };

        let mut params = HashMap::new();
        params.insert("command".to_string(), Value::String(command.to_string()));
        params.insert("cwd".to_string(), Value::String(cwd.display().to_string()));
        let operation_id = self
            .rollback
            .record(RecordKind::Command, params, None, transaction_id, None, HashMap::new())
            .await
            .ok();

        self.hooks.fire(HookPoint::PostCommand, &HookContext::for_command(command, tokens, result.success));

        Ok(CommandOutcome { result, new_cwd: None, operation_id })
    }

    /// Perform a single filesystem primitive: back up whatever it would
    /// destroy, apply it, and record its inverse.
    pub async fn execute_fs_op(&self, op: FsPrimitive, transaction_id: Option<Uuid>) -> Result<u64, ExecutionError> {
        use crate::activity::ActivityAction;

        let (path, action, params, backup_ref, undo_info) = match &op {
            FsPrimitive::CreateFile { path, contents } => {
                if path.exists() {
                    return Err(ExecutionError::AlreadyExists(path.clone()));
                }
                self.fire_pre(path);
                tokio::fs::write(path, contents).await?;
                (path.clone(), ActivityAction::Created, fs_params("create_file", path, None), None, HashMap::new())
            }
            FsPrimitive::WriteFile { path, contents } => {
                self.fire_pre(path);
                let backup_ref = if path.exists() {
                    Some(self.backup.backup_file(path)?.backup_path)
                } else {
                    None
                };
                tokio::fs::write(path, contents).await?;
                let action = if backup_ref.is_some() { ActivityAction::Modified } else { ActivityAction::Created };
                (path.clone(), action, fs_params("write_file", path, None), backup_ref, HashMap::new())
            }
            FsPrimitive::DeleteFile { path } => {
                if !path.exists() {
                    return Err(ExecutionError::NotFound(path.clone()));
                }
                self.fire_pre(path);
                let backup_ref = Some(self.backup.backup_file(path)?.backup_path);
                tokio::fs::remove_file(path).await?;
                (path.clone(), ActivityAction::Deleted, fs_params("delete_file", path, None), backup_ref, HashMap::new())
            }
            FsPrimitive::CreateDirectory { path } => {
                self.fire_pre(path);
                tokio::fs::create_dir_all(path).await?;
                (path.clone(), ActivityAction::Created, fs_params("create_directory", path, None), None, HashMap::new())
            }
            FsPrimitive::DeleteDirectory { path } => {
                if !path.exists() {
                    return Err(ExecutionError::NotFound(path.clone()));
                }
                self.fire_pre(path);
                let backup_ref = Some(self.backup.backup_directory(path)?.backup_path);
                tokio::fs::remove_dir_all(path).await?;
                (path.clone(), ActivityAction::Deleted, fs_params("delete_directory", path, None), backup_ref, HashMap::new())
            }
            FsPrimitive::CopyFile { source, dest } => {
                if !source.exists() {
                    return Err(ExecutionError::NotFound(source.clone()));
                }
                self.fire_pre(dest);
                let mut undo_info = HashMap::new();
                if dest.exists() {
                    let dest_backup = self.backup.backup_file(dest)?;
                    undo_info.insert(
                        "dest_backup_ref".to_string(),
                        Value::String(dest_backup.backup_path.display().to_string()),
                    );
                }
                tokio::fs::copy(source, dest).await?;
                (dest.clone(), ActivityAction::Created, fs_params("copy_file", dest, None), None, undo_info)
            }
            FsPrimitive::MoveFile { source, dest } => {
                if !source.exists() {
                    return Err(ExecutionError::NotFound(source.clone()));
                }
                self.fire_pre(dest);
                let backup_ref = Some(self.backup.backup_file(source)?.backup_path);
                if tokio::fs::rename(source, dest).await.is_err() {
                    tokio::fs::copy(source, dest).await?;
                    tokio::fs::remove_file(source).await?;
                }
                (dest.clone(), ActivityAction::Created, fs_params("move_file", dest, Some(source)), backup_ref, HashMap::new())
            }
        };

        let operation_id = self
            .rollback
            .record(RecordKind::Filesystem, params, backup_ref, transaction_id, None, undo_info)
            .await?;

        self.hooks.fire(HookPoint::PostFileOperation, &HookContext::for_file_operation(path, action, true));

        Ok(operation_id)
    }

    fn fire_pre(&self, path: &Path) {
        self.hooks.fire(
            HookPoint::PreFileOperation,
            &HookContext::for_file_operation(path.to_path_buf(), crate::activity::ActivityAction::Modified, true),
        );
    }
}

fn fs_params(primitive: &str, path: &Path, source: Option<&Path>) -> HashMap<String, Value> {
    let mut params = HashMap::new();
    params.insert("primitive".to_string(), Value::String(primitive.to_string()));
    params.insert("path".to_string(), Value::String(path.display().to_string()));
    if let Some(source) = source {
        params.insert("source".to_string(), Value::String(source.display().to_string()));
    }
    params
}

fn resolve_dir(cwd: &Path, dir: &str) -> PathBuf {
    let candidate = Path::new(dir);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        cwd.join(candidate)
    }
}

fn empty_success() -> ExecutionResult {
    ExecutionResult { exit_code: 0, stdout: String::new(), stderr: String::new(), execution_time_ms: 0, success: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionStatus;
    use tempfile::TempDir;

    async fn engine(root: &Path) -> ExecutionEngine {
        let backup = Arc::new(BackupStore::new(root.join("backups")));
        let rollback = Arc::new(RollbackManager::new(root, backup.clone()).await.unwrap());
        ExecutionEngine::new(ShellType::Bash, HookBus::new(), rollback, backup)
    }

    #[tokio::test]
    async fn runs_a_plain_command() {
        let root = TempDir::new().unwrap();
        let engine = engine(root.path()).await;
        let outcome = engine.execute_command("echo hi", root.path(), None).await.unwrap();
        assert!(outcome.result.success);
        assert!(outcome.result.stdout.contains("hi"));
        assert!(outcome.new_cwd.is_none());
    }

    #[tokio::test]
    async fn bare_cd_returns_new_cwd_without_spawning() {
        let root = TempDir::new().unwrap();
        let sub = root.path().join("sub");
        tokio::fs::create_dir_all(&sub).await.unwrap();
        let engine = engine(root.path()).await;
        let outcome = engine.execute_command("cd sub", root.path(), None).await.unwrap();
        assert_eq!(outcome.new_cwd, Some(sub));
    }

    #[tokio::test]
    async fn refuses_interactive_commands() {
        let root = TempDir::new().unwrap();
        let engine = engine(root.path()).await;
        let err = engine.execute_command("vim file.txt", root.path(), None).await.unwrap_err();
        assert!(matches!(err, ExecutionError::RequiresInteractiveTerminal(_)));
    }

    #[tokio::test]
    async fn create_file_then_rollback_removes_it() {
        let root = TempDir::new().unwrap();
        let engine = engine(root.path()).await;
        let target = root.path().join("new.txt");

        let tx_id = engine.rollback.begin("create a file").await.unwrap();
        engine
            .execute_fs_op(FsPrimitive::CreateFile { path: target.clone(), contents: "hi".to_string() }, Some(tx_id))
            .await
            .unwrap();
        engine.rollback.end(tx_id, TransactionStatus::Completed).await.unwrap();
        assert!(target.exists());

        let report = engine.rollback.rollback_tx(tx_id).await.unwrap();
        assert!(report.all_succeeded());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn write_file_backs_up_previous_contents() {
        let root = TempDir::new().unwrap();
        let engine = engine(root.path()).await;
        let target = root.path().join("x.conf");
        tokio::fs::write(&target, "A=0\n").await.unwrap();

        let tx_id = engine.rollback.begin("edit config").await.unwrap();
        engine
            .execute_fs_op(FsPrimitive::WriteFile { path: target.clone(), contents: "A=1\n".to_string() }, Some(tx_id))
            .await
            .unwrap();
        engine.rollback.end(tx_id, TransactionStatus::Completed).await.unwrap();
        assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "A=1\n");

        let report = engine.rollback.rollback_tx(tx_id).await.unwrap();
        assert!(report.all_succeeded());
        assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "A=0\n");
    }
}
