//! Spawns a single command to completion, either through a shell or as a
//! bare argv, and captures its output.

use super::shell;
use crate::models::ShellType;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u64,
    pub success: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to spawn command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("command timed out after {0}ms")]
    Timeout(u64),
    #[error("command could not be tokenised: {0}")]
    InvalidCommand(String),
}

/// Runs commands for a fixed shell, used only when a command needs
/// interpretation (pipes, redirects, substitution...).
pub struct CommandExecutor {
    shell_type: ShellType,
}

impl CommandExecutor {
    pub fn new(shell_type: ShellType) -> Self {
        Self { shell_type }
    }

    /// Execute `command`, letting the shell interpret metacharacters.
    /// stdio is inherited rather than captured when `interactive` is set,
    /// so editors/pagers/REPLs work as expected.
    pub async fn execute(&self, command: &str, cwd: &Path, interactive: bool) -> Result<ExecutionResult, ExecutorError> {
        let mut cmd = self.shell_command(command);
        cmd.current_dir(cwd);
        self.run(cmd, interactive).await
    }

    /// Execute a pre-tokenised argv directly, with no shell in between.
    pub async fn execute_argv(tokens: &[String], cwd: &Path, interactive: bool) -> Result<ExecutionResult, ExecutorError> {
        let Some((program, args)) = tokens.split_first() else {
            return Err(ExecutorError::InvalidCommand("empty command".to_string()));
        };
        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(cwd);
        Self::run_cmd(cmd, interactive).await
    }

    fn shell_command(&self, command: &str) -> Command {
        let program = self.shell_type.program();
        let mut cmd = Command::new(program);
        match self.shell_type {
            ShellType::PowerShell => {
                cmd.arg("-NoProfile").arg("-Command").arg(command);
            }
            ShellType::Cmd => {
                cmd.arg("/C").arg(command);
            }
            _ => {
                cmd.arg("-c").arg(command);
            }
        }
        cmd
    }

    async fn run(&self, cmd: Command, interactive: bool) -> Result<ExecutionResult, ExecutorError> {
        Self::run_cmd(cmd, interactive).await
    }

    async fn run_cmd(mut cmd: Command, interactive: bool) -> Result<ExecutionResult, ExecutorError> {
        let start = Instant::now();

        if interactive {
            let status = cmd.status().await?;
            return Ok(ExecutionResult {
                exit_code: status.code().unwrap_or(-1),
                stdout: String::new(),
                stderr: String::new(),
                execution_time_ms: start.elapsed().as_millis() as u64,
                success: status.success(),
            });
        }

        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        let output = cmd.output().await?;
        let execution_time_ms = start.elapsed().as_millis() as u64;

        Ok(ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            execution_time_ms,
            success: output.status.success(),
        })
    }
}

/// Run `tokens` directly or, if `raw` needs shell interpretation, through
/// `shell_type`'s shell. Used by the Execution Engine to avoid spawning a
/// shell for the common metacharacter-free case.
pub async fn execute_best_effort(
    raw: &str,
    tokens: &[String],
    shell_type: ShellType,
    cwd: &Path,
    interactive: bool,
) -> Result<ExecutionResult, ExecutorError> {
    if shell::needs_shell(raw) {
        CommandExecutor::new(shell_type).execute(raw, cwd, interactive).await
    } else {
        CommandExecutor::execute_argv(tokens, cwd, interactive).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn runs_simple_command_through_shell() {
        let executor = CommandExecutor::new(ShellType::Bash);
        let result = executor.execute("echo 'Hello, World!'", Path::new("."), false).await.unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("Hello, World!"));
    }

    #[tokio::test]
    async fn captures_nonzero_exit_code() {
        let executor = CommandExecutor::new(ShellType::Bash);
        let result = executor.execute("exit 1", Path::new("."), false).await.unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, 1);
    }

    #[tokio::test]
    async fn executes_tokenised_argv_without_a_shell() {
        let tokens = vec!["echo".to_string(), "hi".to_string()];
        let result = CommandExecutor::execute_argv(&tokens, Path::new("."), false).await.unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("hi"));
    }

    #[tokio::test]
    async fn best_effort_skips_shell_when_no_metacharacters() {
        let tokens = vec!["echo".to_string(), "plain".to_string()];
        let result = execute_best_effort("echo plain", &tokens, ShellType::Bash, Path::new("."), false)
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.stdout.contains("plain"));
    }
}
