//! Shared session state: a rolling file-activity log and a small table of
//! named entities ("current file", "last modified", resolved short names).
//!
//! This is the single event stream the Hook Bus's built-in activity handler
//! writes to and the File Reference Resolver's `RECENT_FILE`/
//! `SPECIAL_REFERENCE` strategies read from. The source system kept two
//! parallel trackers (basic and "enhanced"); this collapses them into one.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to a file, as observed by the Hook Bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityAction {
    Viewed,
    Created,
    Modified,
    Deleted,
}

#[derive(Debug, Clone)]
pub struct ActivityEvent {
    pub path: PathBuf,
    pub action: ActivityAction,
    pub timestamp: DateTime<Utc>,
}

const MAX_EVENTS: usize = 200;

#[derive(Default)]
struct Inner {
    events: Vec<ActivityEvent>,
    entities: HashMap<String, PathBuf>,
}

/// Cheaply cloneable handle shared between the hook bus, resolver, and CLI.
#[derive(Clone, Default)]
pub struct SessionContext {
    inner: Arc<RwLock<Inner>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_activity(&self, path: impl Into<PathBuf>, action: ActivityAction) {
        let mut inner = self.inner.write();
        if inner.events.len() >= MAX_EVENTS {
            inner.events.remove(0);
        }
        inner.events.push(ActivityEvent {
            path: path.into(),
            action,
            timestamp: Utc::now(),
        });
    }

    /// Most recent events, newest first.
    pub fn recent_events(&self) -> Vec<ActivityEvent> {
        let mut events = self.inner.read().events.clone();
        events.reverse();
        events
    }

    pub fn last_touched(&self, action: ActivityAction) -> Option<PathBuf> {
        self.inner
            .read()
            .events
            .iter()
            .rev()
            .find(|e| e.action == action)
            .map(|e| e.path.clone())
    }

    pub fn last_touched_any(&self) -> Option<PathBuf> {
        self.inner.read().events.last().map(|e| e.path.clone())
    }

    /// Record a stable, short-name reference so subsequent resolutions of
    /// the same text stay pinned to this path within the session.
    pub fn set_entity(&self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.inner.write().entities.insert(name.into(), path.into());
    }

    pub fn get_entity(&self, name: &str) -> Option<PathBuf> {
        self.inner.read().entities.get(name).cloned()
    }

    pub fn current_file(&self) -> Option<PathBuf> {
        self.get_entity("current_file")
    }

    pub fn set_current_file(&self, path: impl Into<PathBuf>) {
        self.set_entity("current_file", path);
    }
}

/// `base_command` → activity derived purely from the invocation shape, used
/// by the Hook Bus's built-in post-execute handler. Quoting/flag tolerant:
/// operates on already-tokenised argv.
pub fn infer_activity(base_cmd: &str, tokens: &[String], raw_command: &str) -> Vec<(PathBuf, ActivityAction)> {
    let args: Vec<&str> = tokens[1..]
        .iter()
        .filter(|t| !t.starts_with('-'))
        .map(String::as_str)
        .collect();

    match base_cmd {
        "cat" | "less" | "more" | "head" | "tail" => {
            args.iter().map(|a| (PathBuf::from(a), ActivityAction::Viewed)).collect()
        }
        "touch" => args.iter().map(|a| (PathBuf::from(a), ActivityAction::Created)).collect(),
        "rm" => args.iter().map(|a| (PathBuf::from(a), ActivityAction::Deleted)).collect(),
        "cp" => {
            if let Some((dest, sources)) = args.split_last() {
                let mut events: Vec<(PathBuf, ActivityAction)> =
                    sources.iter().map(|s| (PathBuf::from(s), ActivityAction::Viewed)).collect();
                events.push((PathBuf::from(dest), ActivityAction::Created));
                events
            } else {
                Vec::new()
            }
        }
        "mv" => {
            if let Some((dest, sources)) = args.split_last() {
                let mut events: Vec<(PathBuf, ActivityAction)> =
                    sources.iter().map(|s| (PathBuf::from(s), ActivityAction::Deleted)).collect();
                events.push((PathBuf::from(dest), ActivityAction::Created));
                events
            } else {
                Vec::new()
            }
        }
        "echo" | "printf" => infer_redirect_activity(raw_command),
        _ => Vec::new(),
    }
}

fn infer_redirect_activity(raw_command: &str) -> Vec<(PathBuf, ActivityAction)> {
    if let Some(idx) = raw_command.find(">>") {
        let target = raw_command[idx + 2..].trim().split_whitespace().next();
        target
            .map(|t| vec![(PathBuf::from(t), ActivityAction::Modified)])
            .unwrap_or_default()
    } else if let Some(idx) = raw_command.find('>') {
        let target = raw_command[idx + 1..].trim().split_whitespace().next();
        target
            .map(|t| vec![(PathBuf::from(t), ActivityAction::Created)])
            .unwrap_or_default()
    } else {
        Vec::new()
    }
}

pub fn recently_modified_within(path: &Path, seconds: u64) -> bool {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .map(|elapsed| elapsed.as_secs() < seconds)
        .unwrap_or(false)
}
