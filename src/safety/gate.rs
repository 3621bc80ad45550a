//! Safety Gate (C4): combines risk tier, impact, preview, and trust state
//! into one decision — auto-run, prompt, or refuse.

use super::trust::TrustStore;
use crate::models::{AutoRunPolicy, ImpactSummary, RiskTier};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Confirm};
use std::sync::Arc;

/// Everything the gate needs to decide and to render a confirmation panel.
pub struct ConfirmationRequest<'a> {
    pub command: &'a str,
    pub tier: RiskTier,
    pub impact: &'a ImpactSummary,
    pub preview: Option<&'a str>,
    pub explanation: Option<&'a str>,
    pub confidence: Option<f32>,
    pub dry_run: bool,
}

pub struct SafetyGate {
    trust: Arc<TrustStore>,
    policy: AutoRunPolicy,
}

impl SafetyGate {
    pub fn new(trust: Arc<TrustStore>, policy: AutoRunPolicy) -> Self {
        Self { trust, policy }
    }

    /// Decide whether `request.command` may run. Never panics; dialoguer
    /// failures (no TTY, piped stdin) are treated as a decline.
    pub async fn confirm(&self, request: ConfirmationRequest<'_>) -> bool {
        if request.dry_run {
            Self::render_summary(&request);
            println!("{}", "This is a dry run; nothing was executed.".yellow());
            return false;
        }

        if self.auto_run_eligible(&request) {
            self.show_auto_execution_notice(request.command);
            return true;
        }

        let confirmed = if request.tier.requires_detailed_confirmation() {
            self.detailed_confirmation(&request)
        } else {
            self.simple_confirmation(&request)
        };

        if confirmed && request.tier.requires_detailed_confirmation() {
            self.offer_trust_after_confirmed_run(request.command);
        }

        confirmed
    }

    fn auto_run_eligible(&self, request: &ConfirmationRequest<'_>) -> bool {
        if request.tier == RiskTier::Critical {
            // CRITICAL never collapses to auto-run, even if trusted.
            return false;
        }
        if request.tier > self.policy.auto_run_threshold {
            return false;
        }
        let Some(entry) = self.trust.get(request.command) else {
            return false;
        };
        entry.trusted
            && entry.run_count >= self.policy.min_run_count
            && entry.success_rate() >= self.policy.min_success_rate
    }

    fn show_auto_execution_notice(&self, command: &str) {
        println!(
            "{} {} {}",
            "\u{2713}".green(),
            "auto-running trusted command:".dimmed(),
            command
        );
    }

    fn detailed_confirmation(&self, request: &ConfirmationRequest<'_>) -> bool {
        let badge = Self::tier_badge(request.tier);
        println!();
        println!("{badge} {}", request.command.bold());
        if request.tier == RiskTier::Critical {
            println!("{}", "\u{26a0}\u{fe0f}  CRITICAL: this command can cause irreversible system damage.".red().bold());
        }
        Self::render_summary(request);
        if let Some(conf) = request.confidence {
            println!("confidence: {}", Self::confidence_bar(conf));
        }

        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Proceed?")
            .default(false)
            .interact()
            .unwrap_or(false)
    }

    fn simple_confirmation(&self, request: &ConfirmationRequest<'_>) -> bool {
        let badge = Self::tier_badge(request.tier);
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("{badge} run `{}`?", request.command))
            .default(true)
            .interact()
            .unwrap_or(false)
    }

    fn offer_trust_after_confirmed_run(&self, command: &str) {
        if self.trust.is_trusted(command) {
            return;
        }
        let offered = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Add this exact command to your trust list?")
            .default(false)
            .interact()
            .unwrap_or(false);
        if offered {
            let _ = self.trust.trust(command);
        } else {
            let _ = self.trust.record_rejection(command);
        }
    }

    fn render_summary(request: &ConfirmationRequest<'_>) {
        if let Some(explanation) = request.explanation {
            println!("{}", explanation.dimmed());
        }
        if let Some(preview) = request.preview {
            println!("{}", preview);
        }
        if request.impact.destructive {
            println!("{}", "this command is destructive".red());
        }
    }

    fn tier_badge(tier: RiskTier) -> colored::ColoredString {
        match tier {
            RiskTier::Safe => "[SAFE]".green(),
            RiskTier::Low => "[LOW]".cyan(),
            RiskTier::Medium => "[MEDIUM]".yellow(),
            RiskTier::High => "[HIGH]".truecolor(255, 140, 0),
            RiskTier::Critical => "[CRITICAL]".red().bold(),
        }
    }

    fn confidence_bar(confidence: f32) -> String {
        let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
        format!("[{}{}] {:.0}%", "#".repeat(filled), "-".repeat(10 - filled), confidence * 100.0)
    }

    /// After a successful run of tier >= LOW, offer to trust the exact
    /// command once its base command has been used at least
    /// `trust_offer_threshold` times across all flag variations (rising by
    /// `trust_offer_backoff` per decline) and this exact invocation isn't
    /// already trusted.
    pub fn offer_command_learning(&self, command: &str, tier: RiskTier) {
        if tier < RiskTier::Low || self.trust.is_trusted(command) {
            return;
        }
        let entry = self.trust.usage(command);
        let threshold =
            self.policy.trust_offer_threshold + entry.rejection_count * self.policy.trust_offer_backoff;
        if entry.run_count < threshold {
            return;
        }
        let offered = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("`{command}` has run {} times successfully. Trust it?", entry.run_count))
            .default(false)
            .interact()
            .unwrap_or(false);
        if offered {
            let _ = self.trust.trust(command);
        } else {
            let _ = self.trust.record_rejection(command);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ImpactSummary;

    fn gate() -> SafetyGate {
        SafetyGate::new(Arc::new(TrustStore::in_memory().unwrap()), AutoRunPolicy::default())
    }

    #[tokio::test]
    async fn dry_run_never_executes() {
        let gate = gate();
        let impact = ImpactSummary::empty();
        let result = gate
            .confirm(ConfirmationRequest {
                command: "ls -la",
                tier: RiskTier::Safe,
                impact: &impact,
                preview: None,
                explanation: None,
                confidence: None,
                dry_run: true,
            })
            .await;
        assert!(!result);
    }

    #[tokio::test]
    async fn untrusted_command_is_not_auto_run_eligible() {
        let gate = gate();
        let impact = ImpactSummary::empty();
        let request = ConfirmationRequest {
            command: "ls -la",
            tier: RiskTier::Low,
            impact: &impact,
            preview: None,
            explanation: None,
            confidence: None,
            dry_run: false,
        };
        assert!(!gate.auto_run_eligible(&request));
    }

    #[tokio::test]
    async fn trusted_low_with_sufficient_history_auto_runs() {
        let gate = gate();
        for _ in 0..6 {
            gate.trust.record_run("ls -la", true).unwrap();
        }
        gate.trust.trust("ls -la").unwrap();
        let impact = ImpactSummary::empty();
        let request = ConfirmationRequest {
            command: "ls -la",
            tier: RiskTier::Low,
            impact: &impact,
            preview: None,
            explanation: None,
            confidence: None,
            dry_run: false,
        };
        assert!(gate.auto_run_eligible(&request));
    }

    #[tokio::test]
    async fn critical_tier_never_auto_runs_even_if_trusted() {
        let gate = gate();
        for _ in 0..10 {
            gate.trust.record_run("rm -rf /", true).unwrap();
        }
        gate.trust.trust("rm -rf /").unwrap();
        let impact = ImpactSummary::empty();
        let request = ConfirmationRequest {
            command: "rm -rf /",
            tier: RiskTier::Critical,
            impact: &impact,
            preview: None,
            explanation: None,
            confidence: None,
            dry_run: false,
        };
        assert!(!gate.auto_run_eligible(&request));
    }
}
