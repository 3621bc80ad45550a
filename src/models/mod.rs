//! Core data types shared across the trust-and-execution core.
//!
//! Everything in this module is inert data: no component here talks to the
//! filesystem, spawns a process, or prompts a user. The rest of the crate is
//! built so that dependencies only point "up" toward these types, never back
//! down into a component that depends on them (see `classifier`, `safety`,
//! `execution`).

mod config;
mod operation;
mod resolver;
mod risk;

pub use config::{
    AutoRunPolicy, LogLevel, ShellType, TrustEntry, TrustListConfig, UserConfiguration,
    UserConfigurationBuilder,
};
pub use operation::{
    BackupEntry, OperationRecord, RecordKind, RollbackOutcome, RollbackReport, Transaction,
    TransactionStatus,
};
pub use resolver::{FileType, ResolutionStrategy, ResolverMatch};
pub use risk::{ClassifierRule, ImpactSummary, OperationKind, RiskTier};
