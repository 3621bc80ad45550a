//! Hook Bus (C6): a small pub/sub point the Execution Engine fires into
//! around every command and filesystem primitive. Handlers are isolated —
//! one panicking or erroring handler never stops the others or the
//! operation they're observing.

use crate::activity::{infer_activity, ActivityAction, SessionContext};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use parking_lot::RwLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    PreCommand,
    PostCommand,
    PreFileOperation,
    PostFileOperation,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("hook handler failed: {0}")]
    HandlerFailed(String),
}

/// Everything a handler might need. Fields are populated by whichever
/// engine call fired the hook; unused ones are left `None`.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub command: Option<String>,
    pub tokens: Option<Vec<String>>,
    pub path: Option<PathBuf>,
    pub action: Option<ActivityAction>,
    pub success: bool,
}

impl HookContext {
    pub fn for_command(command: impl Into<String>, tokens: Vec<String>, success: bool) -> Self {
        Self { command: Some(command.into()), tokens: Some(tokens), success, ..Default::default() }
    }

    pub fn for_file_operation(path: impl Into<PathBuf>, action: ActivityAction, success: bool) -> Self {
        Self { path: Some(path.into()), action: Some(action), success, ..Default::default() }
    }
}

type Handler = Box<dyn Fn(&HookContext) -> Result<(), HookError> + Send + Sync>;

/// Registry of hook handlers keyed by hook point, fired in registration
/// order. Cheaply cloneable — all state lives behind an `Arc`.
#[derive(Clone, Default)]
pub struct HookBus {
    handlers: Arc<RwLock<HashMap<HookPoint, Vec<Handler>>>>,
}

impl HookBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, point: HookPoint, handler: Handler) {
        self.handlers.write().entry(point).or_default().push(handler);
    }

    /// Run every handler registered at `point`. A handler that returns an
    /// error or panics is logged and skipped; it never aborts the firing
    /// command or later handlers.
    pub fn fire(&self, point: HookPoint, ctx: &HookContext) {
        let handlers = self.handlers.read();
        let Some(registered) = handlers.get(&point) else {
            return;
        };
        for handler in registered {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(ctx)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::warn!(?point, %err, "hook handler returned an error"),
                Err(_) => tracing::error!(?point, "hook handler panicked"),
            }
        }
    }

    /// Wire up the built-in activity tracker: records file touches inferred
    /// from executed commands, and direct touches from filesystem
    /// primitives, into `session`.
    pub fn install_activity_tracker(&self, session: SessionContext) {
        let for_commands = session.clone();
        self.register(
            HookPoint::PostCommand,
            Box::new(move |ctx| {
                if !ctx.success {
                    return Ok(());
                }
                let (Some(tokens), Some(raw)) = (&ctx.tokens, &ctx.command) else {
                    return Ok(());
                };
                let Some(base_cmd) = tokens.first() else {
                    return Ok(());
                };
                for (path, action) in infer_activity(base_cmd, tokens, raw) {
                    for_commands.record_activity(path, action);
                }
                Ok(())
            }),
        );

        let for_files = session;
        self.register(
            HookPoint::PostFileOperation,
            Box::new(move |ctx| {
                if !ctx.success {
                    return Ok(());
                }
                if let (Some(path), Some(action)) = (&ctx.path, ctx.action) {
                    for_files.record_activity(path.clone(), action);
                }
                Ok(())
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn handlers_fire_in_registration_order() {
        let bus = HookBus::new();
        let order = Arc::new(RwLock::new(Vec::new()));

        let a = order.clone();
        bus.register(HookPoint::PreCommand, Box::new(move |_| { a.write().push(1); Ok(()) }));
        let b = order.clone();
        bus.register(HookPoint::PreCommand, Box::new(move |_| { b.write().push(2); Ok(()) }));

        bus.fire(HookPoint::PreCommand, &HookContext::default());
        assert_eq!(*order.read(), vec![1, 2]);
    }

    #[test]
    fn a_panicking_handler_does_not_stop_the_others() {
        let bus = HookBus::new();
        let ran = Arc::new(AtomicUsize::new(0));

        bus.register(HookPoint::PreCommand, Box::new(|_| panic!("boom")));
        let flag = ran.clone();
        bus.register(HookPoint::PreCommand, Box::new(move |_| { flag.fetch_add(1, Ordering::SeqCst); Ok(()) }));

        bus.fire(HookPoint::PreCommand, &HookContext::default());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn activity_tracker_records_inferred_touches_from_commands() {
        let bus = HookBus::new();
        let session = SessionContext::new();
        bus.install_activity_tracker(session.clone());

        let ctx = HookContext::for_command("touch foo.txt", vec!["touch".to_string(), "foo.txt".to_string()], true);
        bus.fire(HookPoint::PostCommand, &ctx);

        assert_eq!(session.last_touched(ActivityAction::Created), Some(PathBuf::from("foo.txt")));
    }

    #[test]
    fn activity_tracker_records_direct_file_operation_touches() {
        let bus = HookBus::new();
        let session = SessionContext::new();
        bus.install_activity_tracker(session.clone());

        let ctx = HookContext::for_file_operation("bar.txt", ActivityAction::Modified, true);
        bus.fire(HookPoint::PostFileOperation, &ctx);

        assert_eq!(session.last_touched(ActivityAction::Modified), Some(PathBuf::from("bar.txt")));
    }

    #[test]
    fn failed_operations_are_not_tracked() {
        let bus = HookBus::new();
        let session = SessionContext::new();
        bus.install_activity_tracker(session.clone());

        let ctx = HookContext::for_file_operation("baz.txt", ActivityAction::Deleted, false);
        bus.fire(HookPoint::PostFileOperation, &ctx);

        assert_eq!(session.last_touched(ActivityAction::Deleted), None);
    }
}
