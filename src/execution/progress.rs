//! Spinner feedback for in-flight command execution.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shows a spinner while a command runs, and a completion line once it's
/// done. Purely cosmetic — carries no bearing on the execution result.
pub struct CommandProgress {
    bar: ProgressBar,
    command: String,
    start_time: Instant,
    running: Arc<AtomicBool>,
}

impl CommandProgress {
    pub fn new(command: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("valid spinner template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(80));

        Self {
            bar,
            command: truncate_command(command, 50),
            start_time: Instant::now(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
        self.bar.set_message(format!("running: {}", self.command));
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish_success(&self, execution_time_ms: u64) {
        self.running.store(false, Ordering::SeqCst);
        self.bar.finish_with_message(format!("done in {}", format_duration(execution_time_ms)));
    }

    pub fn finish_error(&self, execution_time_ms: u64, exit_code: i32) {
        self.running.store(false, Ordering::SeqCst);
        self.bar
            .finish_with_message(format!("failed (exit {exit_code}) in {}", format_duration(execution_time_ms)));
    }

    pub fn finish_with_error(&self, message: &str) {
        self.running.store(false, Ordering::SeqCst);
        self.bar.finish_with_message(format!("error: {message}"));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

fn truncate_command(command: &str, max_len: usize) -> String {
    let normalized: String = command.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.len() <= max_len {
        normalized
    } else {
        format!("{}...", &normalized[..max_len - 3])
    }
}

fn format_duration(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else if ms < 60_000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{}m {}s", ms / 60_000, (ms % 60_000) / 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_and_finishes() {
        let progress = CommandProgress::new("echo 'hello'");
        assert!(!progress.is_running());
        progress.start();
        assert!(progress.is_running());
        progress.finish_success(100);
        assert!(!progress.is_running());
    }

    #[test]
    fn truncates_long_commands() {
        let long_cmd = "find . -name '*.rs' -type f -exec grep -l 'pattern' {} \\;";
        let truncated = truncate_command(long_cmd, 30);
        assert!(truncated.len() <= 30);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn formats_duration_tiers() {
        assert_eq!(format_duration(500), "500ms");
        assert_eq!(format_duration(2500), "2.5s");
        assert_eq!(format_duration(125000), "2m 5s");
    }
}
