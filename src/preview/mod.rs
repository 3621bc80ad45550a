//! Preview Generator (C2): produces a human-readable forecast of what a
//! command will do, without executing it for real.

mod analyzers;

use once_cell::sync::Lazy;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("failed to spawn dry-run process: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Families with a native `--dry-run`-shaped flag we can insert and execute
/// safely, keyed by base command. Some entries depend on the subcommand
/// (docker/git); those are special-cased in [`PreviewGenerator::generate`].
static DRY_RUN_FLAGS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("apt", "--dry-run"),
        ("apt-get", "--dry-run"),
        ("dnf", "--dry-run"),
        ("yum", "--dry-run"),
        ("zypper", "--dry-run"),
        ("pacman", "--print"),
        ("rsync", "--dry-run"),
        ("mkfs", "--fake"),
        ("mount", "--fake"),
        ("umount", "--fake"),
        ("iptables", "--check"),
        ("ufw", "--dry-run"),
    ])
});

const HAND_WRITTEN: &[&str] = &[
    "mkdir", "touch", "rm", "cp", "mv", "ls", "cat", "grep", "find", "chmod", "chown",
];

/// Read-only family whose arguments are worth confirming exist.
const READ_ONLY: &[&str] = &["ls", "cat", "grep", "find"];

/// Generates previews; holds no state of its own (every analyser either
/// inspects the filesystem directly or shells out to a dry-run flag).
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewGenerator;

impl PreviewGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Produce a preview string for `command`, or `None` if no strategy
    /// applies (callers fall back to a generic "preview not available").
    pub async fn generate(&self, command: &str) -> Result<Option<String>, PreviewError> {
        let Ok(tokens) = shell_words::split(command) else {
            return Ok(Some(
                "Preview not available: command could not be parsed.".to_string(),
            ));
        };
        let Some(base_cmd) = tokens.first().cloned() else {
            return Ok(None);
        };

        if HAND_WRITTEN.contains(&base_cmd.as_str()) {
            let preview = match base_cmd.as_str() {
                "mkdir" => analyzers::preview_mkdir(&tokens),
                "touch" => analyzers::preview_touch(&tokens),
                "rm" => analyzers::preview_rm(&tokens),
                "cp" => analyzers::preview_cp_or_mv(&tokens, false),
                "mv" => analyzers::preview_cp_or_mv(&tokens, true),
                "chmod" | "chown" => analyzers::preview_chmod_or_chown(&base_cmd, &tokens),
                cmd if READ_ONLY.contains(&cmd) => analyzers::preview_read_only(cmd, &tokens),
                _ => unreachable!("base_cmd checked against HAND_WRITTEN above"),
            };
            return Ok(Some(preview));
        }

        if base_cmd == "docker" && tokens.len() > 1 {
            return Ok(Some(self.dry_run_with_flag(command, "--dry-run").await?));
        }
        if base_cmd == "git" && tokens.len() > 1 && ["add", "clean", "rm"].contains(&tokens[1].as_str()) {
            return Ok(Some(self.dry_run_with_flag(command, "--dry-run").await?));
        }
        if base_cmd == "tar" {
            return Ok(Some(self.dry_run_with_flag(command, "--list").await?));
        }

        if let Some(flag) = DRY_RUN_FLAGS.get(base_cmd.as_str()) {
            return Ok(Some(self.dry_run_with_flag(command, flag).await?));
        }

        Ok(Some(format!(
            "Preview not available for `{base_cmd}`; the command will run without a dry-run forecast."
        )))
    }

    /// Insert `flag` right after the base command and execute, capturing
    /// stdout. Safe because the flag itself guarantees the real command
    /// does not take effect.
    async fn dry_run_with_flag(&self, command: &str, flag: &str) -> Result<String, PreviewError> {
        let mut tokens = shell_words::split(command).unwrap_or_default();
        if tokens.is_empty() {
            return Ok("Preview not available.".to_string());
        }
        tokens.insert(1, flag.to_string());

        let output = tokio::process::Command::new(&tokens[0])
            .args(&tokens[1..])
            .output()
            .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            Ok(format!(
                "[dry run via {flag}] exited with status {}",
                output.status
            ))
        } else {
            Ok(stdout.trim_end().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mkdir_preview_reports_missing_target() {
        let gen = PreviewGenerator::new();
        let preview = gen
            .generate("mkdir /nonexistent-path-for-preview-test")
            .await
            .unwrap()
            .unwrap();
        assert!(preview.contains("Will create directory"));
    }

    #[tokio::test]
    async fn rm_preview_reports_missing_file() {
        let gen = PreviewGenerator::new();
        let preview = gen
            .generate("rm /nonexistent-file-for-preview-test.txt")
            .await
            .unwrap()
            .unwrap();
        assert!(preview.contains("Not found"));
    }

    #[tokio::test]
    async fn unknown_command_gets_generic_notice() {
        let gen = PreviewGenerator::new();
        let preview = gen.generate("frobnicate --wat").await.unwrap().unwrap();
        assert!(preview.contains("Preview not available"));
    }
}
