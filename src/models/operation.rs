use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use uuid::Uuid;

/// The four shapes an operation can take. Mirrors the wire format in
/// `operation_history.json`: lowercase on the wire, `RecordKind` in Rust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Filesystem,
    Content,
    Command,
    Plan,
}

/// A single immutable entry in the append-only operation log.
///
/// Once written, an `OperationRecord` is never mutated or deleted; rollback
/// changes a `Transaction`'s status, not the records themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: u64,
    #[serde(rename = "operation_type")]
    pub kind: RecordKind,
    pub params: HashMap<String, Value>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "backup_path")]
    pub backup_ref: Option<PathBuf>,
    pub transaction_id: Option<Uuid>,
    pub step_id: Option<String>,
    pub undo_info: HashMap<String, Value>,
}

/// Lifecycle state of a `Transaction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Started,
    Completed,
    Failed,
    RolledBack,
}

/// An ordered group of operations that rolls back as a unit.
///
/// `operation_ids` is append-only: entries are never removed, even after a
/// successful rollback flips `status` to `RolledBack`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "transaction_id")]
    pub id: Uuid,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
    pub operation_ids: Vec<u64>,
}

impl Transaction {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            timestamp: Utc::now(),
            status: TransactionStatus::Started,
            operation_ids: Vec::new(),
        }
    }
}

/// A timestamped on-disk snapshot of a file or directory, restorable in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub backup_path: PathBuf,
    pub original_path: PathBuf,
    pub is_directory: bool,
    pub created_at: DateTime<Utc>,
}

/// Outcome of rolling back one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackOutcome {
    pub operation_id: u64,
    pub success: bool,
    pub detail: String,
}

/// Result of rolling back an entire transaction: every operation is visited,
/// newest first, and its outcome recorded regardless of earlier failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollbackReport {
    pub transaction_id: Uuid,
    pub outcomes: Vec<RollbackOutcome>,
}

impl RollbackReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.success)
    }
}
