//! Rollback/Transaction Manager (C7): records operations to an append-only
//! journal, groups them into transactions, and replays inverses in reverse.

mod compensation;
mod content;

pub use compensation::CompensationTable;

use crate::backup::{BackupError, BackupStore};
use crate::models::{
    BackupEntry, OperationRecord, RecordKind, RollbackOutcome, RollbackReport, Transaction,
    TransactionStatus,
};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RollbackError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("backup error: {0}")]
    Backup(#[from] BackupError),
    #[error("content rollback error: {0}")]
    Content(#[from] content::ContentRollbackError),
    #[error("no operation recorded with id {0}")]
    OperationNotFound(u64),
    #[error("no transaction recorded with id {0}")]
    TransactionNotFound(Uuid),
    #[error("operation {0} has no usable backup to restore from")]
    MissingBackup(u64),
    #[error("no compensating command known for: {0}")]
    Uncompensable(String),
    #[error("compensating command failed: {0}")]
    ExecutionFailure(String),
}

fn param_str<'a>(params: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

pub struct RollbackManager {
    log_path: PathBuf,
    tx_dir: PathBuf,
    backup: Arc<BackupStore>,
    compensation: CompensationTable,
    next_id: AtomicU64,
    append_lock: Mutex<()>,
}

impl RollbackManager {
    /// `data_dir` is the per-user data directory; the journal and
    /// transaction files live under `data_dir/backups`, alongside the
    /// snapshots `backup` writes.
    pub async fn new(data_dir: &Path, backup: Arc<BackupStore>) -> Result<Self, RollbackError> {
        let journal_dir = data_dir.join("backups");
        tokio::fs::create_dir_all(&journal_dir).await?;
        let tx_dir = journal_dir.join("transactions");
        tokio::fs::create_dir_all(&tx_dir).await?;
        let log_path = journal_dir.join("operation_history.json");

        let next_id = Self::scan_max_id(&log_path).await? + 1;

        Ok(Self {
            log_path,
            tx_dir,
            backup,
            compensation: CompensationTable::seed(),
            next_id: AtomicU64::new(next_id),
            append_lock: Mutex::new(()),
        })
    }

    async fn scan_max_id(log_path: &Path) -> Result<u64, RollbackError> {
        let records = Self::read_records_from(log_path).await?;
        Ok(records.iter().map(|r| r.id).max().unwrap_or(0))
    }

    /// Read every parseable record from the journal. Malformed lines are
    /// logged and skipped; the manager stays functional on a partially
    /// corrupt log.
    async fn read_records_from(log_path: &Path) -> Result<Vec<OperationRecord>, RollbackError> {
        let Ok(contents) = tokio::fs::read_to_string(log_path).await else {
            return Ok(Vec::new());
        };
        let mut records = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<OperationRecord>(line) {
                Ok(record) => records.push(record),
                Err(err) => tracing::error!(line = lineno, %err, "skipping unreadable operation log entry"),
            }
        }
        Ok(records)
    }

    async fn read_records(&self) -> Result<Vec<OperationRecord>, RollbackError> {
        Self::read_records_from(&self.log_path).await
    }

    async fn find_record(&self, op_id: u64) -> Result<OperationRecord, RollbackError> {
        self.read_records()
            .await?
            .into_iter()
            .find(|r| r.id == op_id)
            .ok_or(RollbackError::OperationNotFound(op_id))
    }

    async fn append_record(&self, record: &OperationRecord) -> Result<(), RollbackError> {
        let _guard = self.append_lock.lock().await;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    fn tx_path(&self, tx_id: Uuid) -> PathBuf {
        self.tx_dir.join(format!("{tx_id}.json"))
    }

    async fn read_transaction(&self, tx_id: Uuid) -> Result<Transaction, RollbackError> {
        let contents = tokio::fs::read_to_string(self.tx_path(tx_id))
            .await
            .map_err(|_| RollbackError::TransactionNotFound(tx_id))?;
        Ok(serde_json::from_str(&contents)?)
    }

    async fn write_transaction(&self, tx: &Transaction) -> Result<(), RollbackError> {
        let json = serde_json::to_string_pretty(tx)?;
        tokio::fs::write(self.tx_path(tx.id), json).await?;
        Ok(())
    }

    /// Begin a new transaction in STARTED state.
    pub async fn begin(&self, description: impl Into<String>) -> Result<Uuid, RollbackError> {
        let tx = Transaction::new(description);
        let id = tx.id;
        self.write_transaction(&tx).await?;
        Ok(id)
    }

    /// Append an operation to the journal and, if part of a transaction,
    /// to that transaction's ordered `operation_ids`.
    #[allow(clippy::too_many_arguments)]
    pub async fn record(
        &self,
        kind: RecordKind,
        params: HashMap<String, Value>,
        backup_ref: Option<PathBuf>,
        transaction_id: Option<Uuid>,
        step_id: Option<String>,
        undo_info: HashMap<String, Value>,
    ) -> Result<u64, RollbackError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = OperationRecord {
            id,
            kind,
            params,
            timestamp: chrono::Utc::now(),
            backup_ref,
            transaction_id,
            step_id,
            undo_info,
        };
        self.append_record(&record).await?;

        if let Some(tx_id) = transaction_id {
            let mut tx = self.read_transaction(tx_id).await?;
            tx.operation_ids.push(id);
            self.write_transaction(&tx).await?;
        }

        Ok(id)
    }

    /// Flip a transaction to COMPLETED or FAILED.
    pub async fn end(&self, tx_id: Uuid, status: TransactionStatus) -> Result<(), RollbackError> {
        let mut tx = self.read_transaction(tx_id).await?;
        tx.status = status;
        self.write_transaction(&tx).await
    }

    pub async fn list_recent_transactions(&self, limit: usize) -> Result<Vec<Transaction>, RollbackError> {
        let mut entries = tokio::fs::read_dir(&self.tx_dir).await?;
        let mut transactions = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Ok(contents) = tokio::fs::read_to_string(entry.path()).await {
                if let Ok(tx) = serde_json::from_str::<Transaction>(&contents) {
                    transactions.push(tx);
                }
            }
        }
        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.truncate(limit);
        Ok(transactions)
    }

    /// Roll back a single operation by id, returning whether it succeeded.
    pub async fn rollback_op(&self, op_id: u64) -> Result<bool, RollbackError> {
        let record = self.find_record(op_id).await?;
        match self.apply_inverse(&record).await {
            Ok(_detail) => Ok(true),
            Err(err) => {
                tracing::warn!(op_id, %err, "rollback failed");
                Ok(false)
            }
        }
    }

    /// Roll back every operation in a transaction, newest first, and flip
    /// its status to ROLLED_BACK regardless of per-op outcomes.
    pub async fn rollback_tx(&self, tx_id: Uuid) -> Result<RollbackReport, RollbackError> {
        let mut tx = self.read_transaction(tx_id).await?;
        let mut outcomes = Vec::new();

        for op_id in tx.operation_ids.iter().rev() {
            let detail = match self.find_record(*op_id).await {
                Ok(record) => match self.apply_inverse(&record).await {
                    Ok(detail) => RollbackOutcome { operation_id: *op_id, success: true, detail },
                    Err(err) => RollbackOutcome { operation_id: *op_id, success: false, detail: err.to_string() },
                },
                Err(err) => RollbackOutcome { operation_id: *op_id, success: false, detail: err.to_string() },
            };
            outcomes.push(detail);
        }

        tx.status = TransactionStatus::RolledBack;
        self.write_transaction(&tx).await?;

        Ok(RollbackReport { transaction_id: tx_id, outcomes })
    }

    async fn apply_inverse(&self, record: &OperationRecord) -> Result<String, RollbackError> {
        match record.kind {
            RecordKind::Filesystem => self.apply_filesystem_inverse(record).await,
            RecordKind::Content => self.apply_content_inverse(record).await,
            RecordKind::Command => self.apply_command_inverse(record).await,
            RecordKind::Plan => Ok("plan operations roll back via their own children".to_string()),
        }
    }

    async fn apply_filesystem_inverse(&self, record: &OperationRecord) -> Result<String, RollbackError> {
        let primitive = param_str(&record.params, "primitive").unwrap_or_default();
        let path = param_str(&record.params, "path").map(PathBuf::from);

        match primitive {
            "create_file" => {
                let path = path.ok_or(RollbackError::MissingBackup(record.id))?;
                tokio::fs::remove_file(&path).await?;
                Ok(format!("removed created file {}", path.display()))
            }
            "create_directory" => {
                let path = path.ok_or(RollbackError::MissingBackup(record.id))?;
                tokio::fs::remove_dir_all(&path).await?;
                Ok(format!("removed created directory {}", path.display()))
            }
            "write_file" | "delete_file" => {
                let path = path.ok_or(RollbackError::MissingBackup(record.id))?;
                let backup_path = record.backup_ref.clone().ok_or(RollbackError::MissingBackup(record.id))?;
                let entry = BackupEntry { backup_path, original_path: path.clone(), is_directory: false, created_at: record.timestamp };
                self.backup.restore(&entry)?;
                Ok(format!("restored {} from backup", path.display()))
            }
            "delete_directory" => {
                let path = path.ok_or(RollbackError::MissingBackup(record.id))?;
                let backup_path = record.backup_ref.clone().ok_or(RollbackError::MissingBackup(record.id))?;
                let entry = BackupEntry { backup_path, original_path: path.clone(), is_directory: true, created_at: record.timestamp };
                self.backup.restore(&entry)?;
                Ok(format!("restored directory {} from backup", path.display()))
            }
            "copy_file" => {
                let dest = path.ok_or(RollbackError::MissingBackup(record.id))?;
                if dest.exists() {
                    tokio::fs::remove_file(&dest).await?;
                }
                if let Some(dest_backup) = param_str(&record.params, "dest_backup_ref").map(PathBuf::from) {
                    let entry = BackupEntry { backup_path: dest_backup, original_path: dest.clone(), is_directory: false, created_at: record.timestamp };
                    self.backup.restore(&entry)?;
                }
                Ok(format!("removed copy at {}", dest.display()))
            }
            "move_file" => {
                let dest = path.ok_or(RollbackError::MissingBackup(record.id))?;
                let source = param_str(&record.params, "source").map(PathBuf::from).ok_or(RollbackError::MissingBackup(record.id))?;
                if dest.exists() {
                    tokio::fs::remove_file(&dest).await?;
                }
                let backup_path = record.backup_ref.clone().ok_or(RollbackError::MissingBackup(record.id))?;
                let entry = BackupEntry { backup_path, original_path: source.clone(), is_directory: false, created_at: record.timestamp };
                self.backup.restore(&entry)?;
                Ok(format!("restored {} from move backup", source.display()))
            }
            other => Err(RollbackError::Uncompensable(format!("unknown filesystem primitive {other:?}"))),
        }
    }

    async fn apply_content_inverse(&self, record: &OperationRecord) -> Result<String, RollbackError> {
        let path = param_str(&record.params, "path").map(PathBuf::from).ok_or(RollbackError::MissingBackup(record.id))?;
        let current = tokio::fs::read_to_string(&path).await.unwrap_or_default();
        let restored = content::reverse_apply(&current, &record.undo_info)?;
        tokio::fs::write(&path, restored).await?;
        Ok(format!("content of {} reverted", path.display()))
    }

    async fn apply_command_inverse(&self, record: &OperationRecord) -> Result<String, RollbackError> {
        let command = param_str(&record.params, "command").unwrap_or_default();
        let Some(inverse) = self.compensation.compensate(command) else {
            return Err(RollbackError::Uncompensable(command.to_string()));
        };

        let output = tokio::process::Command::new("sh").arg("-c").arg(&inverse).output().await?;
        if output.status.success() {
            Ok(format!("executed compensating command: {inverse}"))
        } else {
            Err(RollbackError::ExecutionFailure(inverse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn manager(root: &Path) -> RollbackManager {
        let backup = Arc::new(BackupStore::new(root.join("backups")));
        RollbackManager::new(root, backup).await.unwrap()
    }

    #[tokio::test]
    async fn record_and_rollback_create_file() {
        let root = TempDir::new().unwrap();
        let mgr = manager(root.path()).await;
        let target = root.path().join("new.txt");
        tokio::fs::write(&target, "hi").await.unwrap();

        let tx_id = mgr.begin("create a file").await.unwrap();
        let mut params = HashMap::new();
        params.insert("primitive".to_string(), Value::String("create_file".to_string()));
        params.insert("path".to_string(), Value::String(target.to_string_lossy().to_string()));
        mgr.record(RecordKind::Filesystem, params, None, Some(tx_id), None, HashMap::new()).await.unwrap();
        mgr.end(tx_id, TransactionStatus::Completed).await.unwrap();

        let report = mgr.rollback_tx(tx_id).await.unwrap();
        assert!(report.all_succeeded());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn rollback_restores_written_file_from_backup() {
        let root = TempDir::new().unwrap();
        let mgr = manager(root.path()).await;
        let backup_store = BackupStore::new(root.path().join("backups"));
        let target = root.path().join("x.conf");
        tokio::fs::write(&target, "A=0\n").await.unwrap();

        let entry = backup_store.backup_file(&target).unwrap();
        tokio::fs::write(&target, "A=1\n").await.unwrap();

        let tx_id = mgr.begin("edit config").await.unwrap();
        let mut params = HashMap::new();
        params.insert("primitive".to_string(), Value::String("write_file".to_string()));
        params.insert("path".to_string(), Value::String(target.to_string_lossy().to_string()));
        mgr.record(RecordKind::Filesystem, params, Some(entry.backup_path.clone()), Some(tx_id), None, HashMap::new())
            .await
            .unwrap();
        mgr.end(tx_id, TransactionStatus::Completed).await.unwrap();

        let report = mgr.rollback_tx(tx_id).await.unwrap();
        assert!(report.all_succeeded());
        assert_eq!(tokio::fs::read_to_string(&target).await.unwrap(), "A=0\n");

        let tx = mgr.read_transaction(tx_id).await.unwrap();
        assert_eq!(tx.status, TransactionStatus::RolledBack);
        assert_eq!(tx.operation_ids.len(), 1);
    }

    #[tokio::test]
    async fn command_rollback_uses_compensation_table() {
        let root = TempDir::new().unwrap();
        let mgr = manager(root.path()).await;

        let tx_id = mgr.begin("mkdir build").await.unwrap();
        let dir = root.path().join("build");
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let mut params = HashMap::new();
        params.insert("command".to_string(), Value::String(format!("mkdir {}", dir.display())));
        mgr.record(RecordKind::Command, params, None, Some(tx_id), None, HashMap::new()).await.unwrap();
        mgr.end(tx_id, TransactionStatus::Completed).await.unwrap();

        let report = mgr.rollback_tx(tx_id).await.unwrap();
        assert!(report.all_succeeded());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn rollback_order_is_strictly_reversed() {
        let root = TempDir::new().unwrap();
        let mgr = manager(root.path()).await;
        let tx_id = mgr.begin("two steps").await.unwrap();

        for i in 0..2 {
            let target = root.path().join(format!("f{i}.txt"));
            tokio::fs::write(&target, "x").await.unwrap();
            let mut params = HashMap::new();
            params.insert("primitive".to_string(), Value::String("create_file".to_string()));
            params.insert("path".to_string(), Value::String(target.to_string_lossy().to_string()));
            mgr.record(RecordKind::Filesystem, params, None, Some(tx_id), None, HashMap::new()).await.unwrap();
        }
        mgr.end(tx_id, TransactionStatus::Completed).await.unwrap();

        let report = mgr.rollback_tx(tx_id).await.unwrap();
        assert_eq!(report.outcomes[0].operation_id, 2);
        assert_eq!(report.outcomes[1].operation_id, 1);
    }
}
