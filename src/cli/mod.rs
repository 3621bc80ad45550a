//! Command-line entry point wiring [`crate::AngelaCore`]'s façade into
//! subcommands. The CLI itself owns no business logic — it parses
//! arguments, resolves a cwd, and calls into the core.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::{ConfigManager, ShellType};
use crate::models::{LogLevel, RiskTier, TransactionStatus};
use crate::resolver::ResolutionScope;
use crate::{AngelaCore, CoreError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid transaction id: {0}")]
    InvalidUuid(#[from] uuid::Error),
}

#[derive(Parser, Debug)]
#[command(name = "angela")]
#[command(about = "Trust-and-execution core for a shell-embedded assistant")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Override the configured shell
    #[arg(long, global = true)]
    pub shell: Option<ShellType>,

    /// Override the configured log level
    #[arg(long, global = true)]
    pub log_level: Option<LogLevel>,

    /// Path to a config file, instead of the default XDG location
    #[arg(long, global = true)]
    pub config_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assign a risk tier and impact summary to a command string
    Classify {
        command: String,
    },
    /// Forecast what a command would do, without running it
    Preview {
        command: String,
    },
    /// Map a natural-language reference to a concrete path
    Resolve {
        reference: String,
        #[arg(long)]
        cwd: Option<PathBuf>,
    },
    /// Classify, preview, confirm, and run a command
    Run {
        command: String,
        #[arg(long)]
        cwd: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
        /// Group this run under an existing transaction
        #[arg(long)]
        transaction: Option<Uuid>,
    },
    /// List recently recorded transactions
    Transactions {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Roll back an entire transaction, newest operation first
    Rollback {
        transaction: Uuid,
    },
}

/// Resolve the effective configuration: file, then `ANGELA_*` env vars, then
/// explicit CLI overrides (CLI wins).
fn load_config(cli: &Cli) -> Result<crate::config::UserConfiguration, CliError> {
    let manager = match &cli.config_file {
        Some(path) => ConfigManager::with_config_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    let mut config = manager.merge_with_env()?;
    if let Some(shell) = cli.shell {
        config.default_shell = Some(shell);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    Ok(config)
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let core = AngelaCore::new(config).await?;
    let cwd = std::env::current_dir()?;

    match cli.command {
        Command::Classify { command } => {
            let (classification, impact) = core.classify(&command);
            print_classification(&classification, &impact);
        }
        Command::Preview { command } => {
            let preview = core.preview(&command).await?;
            match preview {
                Some(text) => println!("{text}"),
                None => println!("{}", "no preview produced".dimmed()),
            }
        }
        Command::Resolve { reference, cwd: resolve_cwd } => {
            let base = resolve_cwd.unwrap_or(cwd);
            match core.resolve_reference(&reference, &base, None, ResolutionScope::default()) {
                Some(path) => println!("{}", path.display()),
                None => println!("{}", "no match found".yellow()),
            }
        }
        Command::Run { command, cwd: run_cwd, dry_run, transaction } => {
            let base = run_cwd.unwrap_or(cwd);
            let result = core.run(&command, &base, dry_run, transaction).await?;
            print_classification(&result.classification, &result.impact);
            if let Some(preview) = &result.preview {
                println!("{preview}");
            }
            match result.outcome {
                Some(outcome) => {
                    print!("{}", outcome.result.stdout);
                    eprint!("{}", outcome.result.stderr);
                    if !outcome.result.success {
                        std::process::exit(outcome.result.exit_code);
                    }
                }
                None => println!("{}", "cancelled".yellow()),
            }
        }
        Command::Transactions { limit } => {
            let transactions = core.list_recent_transactions(limit).await?;
            for tx in transactions {
                println!(
                    "{}  {:?}  {} ops  {}",
                    tx.id,
                    tx.status,
                    tx.operation_ids.len(),
                    tx.description
                );
            }
        }
        Command::Rollback { transaction } => {
            let report = core.rollback_transaction(transaction).await?;
            for outcome in &report.outcomes {
                let marker = if outcome.success { "ok".green() } else { "failed".red() };
                println!("op {}: {marker} ({})", outcome.operation_id, outcome.detail);
            }
            if !report.all_succeeded() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn print_classification(classification: &crate::classifier::Classification, impact: &crate::models::ImpactSummary) {
    let badge = match classification.tier {
        RiskTier::Safe => classification.tier.as_str().green(),
        RiskTier::Low => classification.tier.as_str().cyan(),
        RiskTier::Medium => classification.tier.as_str().yellow(),
        RiskTier::High => classification.tier.as_str().truecolor(255, 140, 0),
        RiskTier::Critical => classification.tier.as_str().red().bold(),
    };
    println!("[{badge}] {}", classification.reason);
    if impact.destructive {
        println!("{}", "this command is destructive".red());
    }
}
