use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Risk tier assigned to a command string.
///
/// Ordering is significant: classification is "monotone max" over every
/// matching rule, so `RiskTier` derives `Ord` and callers compare tiers
/// directly rather than comparing the discriminant by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RiskTier {
    Safe = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Safe => "SAFE",
            RiskTier::Low => "LOW",
            RiskTier::Medium => "MEDIUM",
            RiskTier::High => "HIGH",
            RiskTier::Critical => "CRITICAL",
        }
    }

    /// True once a tier requires an explicit, non-auto-satisfiable confirmation.
    pub fn requires_detailed_confirmation(self) -> bool {
        self >= RiskTier::High
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SAFE" => Ok(RiskTier::Safe),
            "LOW" => Ok(RiskTier::Low),
            "MEDIUM" => Ok(RiskTier::Medium),
            "HIGH" => Ok(RiskTier::High),
            "CRITICAL" => Ok(RiskTier::Critical),
            other => Err(format!("unknown risk tier: {other}")),
        }
    }
}

/// A single kind of filesystem or process effect a command can have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Read,
    Create,
    Write,
    Delete,
    Move,
    Copy,
    PermissionChange,
    NetworkAccess,
    ProcessControl,
    PackageManagement,
    VersionControl,
}

/// Syntactic forecast of what a command will touch, derived without ever
/// running the command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpactSummary {
    pub operations: BTreeSet<OperationKind>,
    pub affected_files: BTreeSet<PathBuf>,
    pub affected_dirs: BTreeSet<PathBuf>,
    pub destructive: bool,
    pub creates_files: bool,
    pub modifies_files: bool,
}

impl ImpactSummary {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// `(pattern, tier, reason)` — the unit the classifier's tables are built from.
///
/// Patterns are compiled once at startup; `ClassifierRule` itself just pairs
/// the compiled regex with the tier and human-readable reason it contributes.
#[derive(Clone)]
pub struct ClassifierRule {
    pub pattern: Regex,
    pub tier: RiskTier,
    pub reason: &'static str,
    /// Substrings whose presence anywhere in the command disqualifies an
    /// otherwise-matching pattern. Stands in for the negative-lookahead
    /// guards the source patterns used (e.g. "cp, but not if -f appears"),
    /// which the backtracking-free regex engine here can't express inline.
    pub excludes: &'static [&'static str],
}

impl ClassifierRule {
    pub fn is_match(&self, command: &str) -> bool {
        self.pattern.is_match(command) && !self.excludes.iter().any(|e| command.contains(e))
    }
}

impl fmt::Debug for ClassifierRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassifierRule")
            .field("pattern", &self.pattern.as_str())
            .field("tier", &self.tier)
            .field("reason", &self.reason)
            .field("excludes", &self.excludes)
            .finish()
    }
}
