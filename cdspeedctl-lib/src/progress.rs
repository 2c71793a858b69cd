//! Progress callback system.
//!
//! The library only describes what it is doing; how that is shown (terminal
//! spinner, plain lines, nothing) is decided by the implementor of
//! [`ProgressCallback`].

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// A new progress indicator.
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Step prefix, usually a hexadecimal step number.
    pub prefix: String,
    pub message: String,
}

/// Implement this trait to customize how progress is displayed.
pub trait ProgressCallback: Send + Sync {
    /// Start a new indicator and return its id.
    fn start(&self, info: ProgressInfo) -> ProgressId;

    fn update_message(&self, id: ProgressId, message: String);

    fn finish(&self, id: ProgressId, final_message: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

/// Callback that prints nothing, used for quiet runs and tests.
#[derive(Debug, Default)]
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn start(&self, _info: ProgressInfo) -> ProgressId {
        ProgressId(0)
    }

    fn update_message(&self, _id: ProgressId, _message: String) {}

    fn finish(&self, _id: ProgressId, _final_message: String) {}
}

pub type ProgressCallbackArc = Arc<dyn ProgressCallback>;

pub fn no_op_progress_callback() -> ProgressCallbackArc {
    Arc::new(NoOpProgressCallback)
}

/// Hands out step-numbered spinners.
pub struct ProgressHelper {
    callback: ProgressCallbackArc,
    step_counter: Arc<AtomicI32>,
}

impl ProgressHelper {
    pub fn new(callback: ProgressCallbackArc, initial_step: i32) -> Self {
        Self {
            callback,
            step_counter: Arc::new(AtomicI32::new(initial_step)),
        }
    }

    fn next_step(&self) -> i32 {
        self.step_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn create_spinner(&self, message: impl Into<String>) -> ProgressHandler {
        let step = self.next_step();
        let info = ProgressInfo {
            prefix: format!("0x{:02X}", step),
            message: message.into(),
        };
        let id = self.callback.start(info);
        ProgressHandler {
            callback: Arc::clone(&self.callback),
            id,
        }
    }
}

/// Handle to a single running indicator.
pub struct ProgressHandler {
    callback: ProgressCallbackArc,
    id: ProgressId,
}

impl ProgressHandler {
    pub fn set_message(&self, message: impl Into<String>) {
        self.callback.update_message(self.id, message.into());
    }

    pub fn finish_with_message(self, message: impl Into<String>) {
        self.callback.finish(self.id, message.into());
    }
}
