// SPDX-License-Identifier: Apache-2.0
//! Supersession flags for deferred overlay work.
//!
//! Frame tasks and position computations outlive the call that queued them.
//! When a newer `show`, a `hide` or a teardown makes that work pointless, the
//! owner flips a [`CancellationSource`]; the queued closure holds a
//! [`CancellationToken`] and checks it before touching any element.
//!
//! ```
//! use blockui_core::cancellation::CancellationSource;
//!
//! let pending = CancellationSource::new();
//! let guard = pending.token();
//! pending.cancel();
//! assert!(guard.is_cancelled());
//! ```
//!
//! The flag lives in an `Rc<Cell<bool>>`: all overlay work happens on the UI
//! thread, and tokens are `!Send` like every other handle in this crate.

#![forbid(unsafe_code)]

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Read side of a cancellation flag, carried by queued work.
#[derive(Clone)]
pub struct CancellationToken {
    flag: Rc<Cell<bool>>,
}

/// Write side of a cancellation flag, kept by whoever queued the work.
///
/// Dropping it leaves outstanding tokens live; only
/// [`cancel`](Self::cancel) flips them.
pub struct CancellationSource {
    flag: Rc<Cell<bool>>,
}

impl CancellationSource {
    pub fn new() -> Self {
        Self {
            flag: Rc::new(Cell::new(false)),
        }
    }

    /// A token observing this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            flag: Rc::clone(&self.flag),
        }
    }

    /// Mark the work superseded. Repeated calls are no-ops.
    pub fn cancel(&self) {
        self.flag.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancellationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancellationSource")
            .field(&self.flag.get())
            .finish()
    }
}

impl CancellationToken {
    /// Whether the owning source was cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.get()
    }
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancellationToken")
            .field(&self.flag.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_source_is_live() {
        let pending = CancellationSource::new();
        assert!(!pending.is_cancelled());
        assert!(!pending.token().is_cancelled());
    }

    #[test]
    fn every_token_sees_the_cancel() {
        let pending = CancellationSource::default();
        let queued = [pending.token(), pending.token(), pending.token().clone()];
        pending.cancel();
        pending.cancel();
        assert!(queued.iter().all(CancellationToken::is_cancelled));
    }

    #[test]
    fn forgetting_the_source_keeps_work_live() {
        let pending = CancellationSource::new();
        let queued = pending.token();
        drop(pending);
        assert!(!queued.is_cancelled());
    }

    #[test]
    fn superseding_one_source_leaves_others() {
        let older = CancellationSource::new();
        let newer = CancellationSource::new();
        older.cancel();
        assert!(older.token().is_cancelled());
        assert!(!newer.token().is_cancelled());
    }

    #[test]
    fn debug_shows_flag() {
        let pending = CancellationSource::new();
        pending.cancel();
        assert_eq!(format!("{pending:?}"), "CancellationSource(true)");
        assert_eq!(format!("{:?}", pending.token()), "CancellationToken(true)");
    }
}
