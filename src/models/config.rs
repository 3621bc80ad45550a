use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::Level;

/// Verbosity for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> Level {
        match self {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// The shell a command should be interpreted/spawned under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    Sh,
    PowerShell,
    Cmd,
    Unknown,
}

impl ShellType {
    /// Best-effort detection from the `SHELL` environment variable.
    pub fn detect() -> Self {
        if cfg!(windows) {
            return ShellType::PowerShell;
        }
        std::env::var("SHELL")
            .ok()
            .and_then(|path| {
                let name = path.rsplit('/').next()?.to_string();
                name.parse().ok()
            })
            .unwrap_or(ShellType::Bash)
    }

    pub fn program(self) -> &'static str {
        match self {
            ShellType::Bash => "bash",
            ShellType::Zsh => "zsh",
            ShellType::Fish => "fish",
            ShellType::Sh => "sh",
            ShellType::PowerShell => "powershell",
            ShellType::Cmd => "cmd",
            ShellType::Unknown => "sh",
        }
    }
}

impl std::str::FromStr for ShellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bash" => Ok(ShellType::Bash),
            "zsh" => Ok(ShellType::Zsh),
            "fish" => Ok(ShellType::Fish),
            "sh" | "dash" => Ok(ShellType::Sh),
            "powershell" | "pwsh" => Ok(ShellType::PowerShell),
            "cmd" | "cmd.exe" => Ok(ShellType::Cmd),
            other => Err(format!("unknown shell: {other}")),
        }
    }
}

/// A single trusted command entry and the history backing the trust decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustEntry {
    pub command: String,
    pub run_count: u32,
    pub success_count: u32,
    pub rejection_count: u32,
    pub trusted: bool,
}

impl TrustEntry {
    pub fn success_rate(&self) -> f64 {
        if self.run_count == 0 {
            0.0
        } else {
            f64::from(self.success_count) / f64::from(self.run_count)
        }
    }
}

/// Policy knobs for the safety gate's auto-run decision (§4.4 of the trust
/// and execution core: "auto-run, prompt, or refuse").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRunPolicy {
    /// Tiers at or below this auto-run without prompting, subject to trust.
    pub auto_run_threshold: super::RiskTier,
    /// Minimum prior runs before trust can auto-satisfy confirmation.
    pub min_run_count: u32,
    /// Minimum observed success rate (successes / runs) to auto-run.
    pub min_success_rate: f64,
    /// Uses of a base command before the user is first offered trust.
    pub trust_offer_threshold: u32,
    /// Added to `trust_offer_threshold` each time the offer is declined.
    pub trust_offer_backoff: u32,
}

impl Default for AutoRunPolicy {
    fn default() -> Self {
        Self {
            auto_run_threshold: super::RiskTier::Low,
            min_run_count: 5,
            min_success_rate: 0.8,
            trust_offer_threshold: 2,
            trust_offer_backoff: 2,
        }
    }
}

/// On-disk location of the trust/history store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustListConfig {
    pub database_path: PathBuf,
}

/// User-configurable behaviour of the trust-and-execution core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfiguration {
    pub log_level: LogLevel,
    pub default_shell: Option<ShellType>,
    pub auto_run: AutoRunPolicy,
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub journal_dir: PathBuf,
    pub show_command_preview: bool,
    pub use_spinners: bool,
    pub interactive_stream_timeout_secs: u64,
}

impl UserConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.auto_run.min_success_rate) {
            return Err(format!(
                "auto_run.min_success_rate must be within [0, 1], got {}",
                self.auto_run.min_success_rate
            ));
        }
        Ok(())
    }
}

impl Default for UserConfiguration {
    fn default() -> Self {
        let data_dir = directories::ProjectDirs::from("", "", "angela")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".angela"));

        Self {
            log_level: LogLevel::Info,
            default_shell: None,
            auto_run: AutoRunPolicy::default(),
            backup_dir: data_dir.join("backups"),
            journal_dir: data_dir.join("backups"),
            data_dir,
            show_command_preview: true,
            use_spinners: true,
            interactive_stream_timeout_secs: 30,
        }
    }
}

/// Fluent builder mirroring the teacher crate's configuration ergonomics.
#[derive(Debug, Default)]
pub struct UserConfigurationBuilder {
    config: UserConfiguration,
}

impl UserConfigurationBuilder {
    pub fn new() -> Self {
        Self {
            config: UserConfiguration::default(),
        }
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    pub fn data_dir(mut self, dir: PathBuf) -> Self {
        self.config.backup_dir = dir.join("backups");
        self.config.journal_dir = dir.join("backups");
        self.config.data_dir = dir;
        self
    }

    pub fn auto_run(mut self, policy: AutoRunPolicy) -> Self {
        self.config.auto_run = policy;
        self
    }

    pub fn build(self) -> UserConfiguration {
        self.config
    }
}
