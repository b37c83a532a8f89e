//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

/// Receives progress units and answers cancellation queries.
///
/// Shared by reference with the running process, so implementations use
/// interior mutability.
pub trait ProgressSink: Send + Sync {
    fn advance(&self, units: u32);

    fn is_cancelled(&self) -> bool;

    /// Name of the step currently running
    fn set_task(&self, _name: &str) {}
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Sink that discards progress and is never cancelled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn advance(&self, _units: u32) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Counts units and records task names. Cancellation comes from a token.
#[derive(Debug, Default)]
pub struct ProgressCounter {
    worked: AtomicU32,
    token: CancellationToken,
    tasks: Mutex<Vec<String>>,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            ..Self::default()
        }
    }

    pub fn worked(&self) -> u32 {
        self.worked.load(Ordering::SeqCst)
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Task names in the order they were set
    pub fn tasks(&self) -> Vec<String> {
        self.tasks.lock().clone()
    }
}

impl ProgressSink for ProgressCounter {
    fn advance(&self, units: u32) {
        self.worked.fetch_add(units, Ordering::SeqCst);
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn set_task(&self, name: &str) {
        self.tasks.lock().push(name.to_string());
    }
}

/// A capped view onto a parent sink.
///
/// The child reports on its own `scale` (100 by default). Its work is
/// rescaled into at most `allotted` parent units, so a process that
/// over-reports can never eat into the rest of the run's budget.
pub struct SubProgress<'a> {
    parent: &'a dyn ProgressSink,
    allotted: u32,
    scale: u32,
    state: Mutex<SubState>,
}

#[derive(Default)]
struct SubState {
    child_worked: u32,
    parent_worked: u32,
}

impl<'a> SubProgress<'a> {
    pub fn new(parent: &'a dyn ProgressSink, allotted: u32) -> Self {
        Self::with_scale(parent, allotted, 100)
    }

    pub fn with_scale(parent: &'a dyn ProgressSink, allotted: u32, scale: u32) -> Self {
        Self {
            parent,
            allotted,
            scale: scale.max(1),
            state: Mutex::new(SubState::default()),
        }
    }

    /// Parent units consumed so far
    pub fn consumed(&self) -> u32 {
        self.state.lock().parent_worked
    }

    /// Report whatever is left of the allotment to the parent.
    pub fn finish(&self) {
        let mut state = self.state.lock();
        let remaining = self.allotted - state.parent_worked;
        if remaining > 0 {
            self.parent.advance(remaining);
        }
        state.child_worked = self.scale;
        state.parent_worked = self.allotted;
    }
}

impl ProgressSink for SubProgress<'_> {
    fn advance(&self, units: u32) {
        let mut state = self.state.lock();
        state.child_worked = state.child_worked.saturating_add(units).min(self.scale);
        let target =
            (u64::from(state.child_worked) * u64::from(self.allotted) / u64::from(self.scale)) as u32;
        if target > state.parent_worked {
            self.parent.advance(target - state.parent_worked);
            state.parent_worked = target;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }

    fn set_task(&self, name: &str) {
        self.parent.set_task(name);
    }
}
