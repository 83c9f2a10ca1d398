#![forbid(unsafe_code)]

//! Render-frame deferral.
//!
//! [`FrameScheduler`] is the overlay layer's equivalent of a
//! request-animation-frame queue. Work queued with
//! [`request_frame`](FrameScheduler::request_frame) runs when the host calls
//! [`run_frame`](FrameScheduler::run_frame) at its next frame boundary.
//!
//! # Invariants
//!
//! 1. Tasks never run inside `request_frame`; at least one `run_frame` call
//!    separates queueing from execution.
//! 2. Tasks queued before the same `run_frame` execute in FIFO order.
//! 3. Tasks queued while a frame is running execute at the following frame.
//! 4. A task whose [`FrameHandle`] was cancelled is dropped without running.
//!
//! Cloning a scheduler yields another handle to the same queue.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::cancellation::{CancellationSource, CancellationToken};

type FrameTask = Box<dyn FnOnce()>;

struct Queued {
    token: CancellationToken,
    task: FrameTask,
}

struct SchedulerInner {
    queue: RefCell<VecDeque<Queued>>,
    frame: Cell<u64>,
}

/// Shared frame-deferral queue.
#[derive(Clone)]
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

/// Cancels a queued frame task.
///
/// Dropping the handle leaves the task queued.
#[derive(Debug)]
pub struct FrameHandle {
    source: CancellationSource,
}

impl FrameHandle {
    /// Prevent the task from running. No-op once it has run.
    pub fn cancel(&self) {
        self.source.cancel();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.source.is_cancelled()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                queue: RefCell::new(VecDeque::new()),
                frame: Cell::new(0),
            }),
        }
    }

    /// Queue `task` for the next frame boundary.
    pub fn request_frame(&self, task: impl FnOnce() + 'static) -> FrameHandle {
        let source = CancellationSource::new();
        self.inner.queue.borrow_mut().push_back(Queued {
            token: source.token(),
            task: Box::new(task),
        });
        FrameHandle { source }
    }

    /// Run every task queued before this call. Returns how many ran.
    pub fn run_frame(&self) -> usize {
        let frame = self.inner.frame.get() + 1;
        self.inner.frame.set(frame);

        // Take the batch up front so tasks queued by tasks land in the next frame
        // and no borrow is held while user code runs.
        let batch: Vec<Queued> = self.inner.queue.borrow_mut().drain(..).collect();
        let mut ran = 0;
        let mut skipped = 0;
        for queued in batch {
            if queued.token.is_cancelled() {
                skipped += 1;
                continue;
            }
            (queued.task)();
            ran += 1;
        }
        if ran > 0 || skipped > 0 {
            tracing::debug!(
                target: "blockui.frame",
                frame,
                ran,
                skipped,
                "frame tasks flushed"
            );
        }
        ran
    }

    /// Number of tasks waiting for the next frame (cancelled ones included).
    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.inner.frame.get()
    }
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FrameScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("pending", &self.pending())
            .field("frame", &self.frame_count())
            .finish()
    }
}
