#![forbid(unsafe_code)]

//! Active-node registry.
//!
//! Holds the node currently under pointer focus and announces transitions
//! through a [`BindingContext`]. Host hover tracking calls
//! [`show`](ActiveNodeRegistry::show) on every hover and
//! [`hide`](ActiveNodeRegistry::hide) when the pointer leaves.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::active::{ActiveNode, Message};
use crate::binding::BindingContext;

struct RegistryInner {
    ctx: BindingContext,
    active: RefCell<Option<ActiveNode>>,
}

/// Current active node plus its notification channel. Cloning shares state.
#[derive(Clone)]
pub struct ActiveNodeRegistry {
    inner: Rc<RegistryInner>,
}

impl ActiveNodeRegistry {
    pub fn new(ctx: BindingContext) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                ctx,
                active: RefCell::new(None),
            }),
        }
    }

    /// Channel the controller binds to.
    pub fn context(&self) -> &BindingContext {
        &self.inner.ctx
    }

    /// Replace the active node and announce it.
    pub fn show(&self, active: ActiveNode) {
        *self.inner.active.borrow_mut() = Some(active.clone());
        self.inner.ctx.dispatch(&Message::Show(active));
    }

    /// Clear the active node and announce the hide.
    pub fn hide(&self) {
        self.inner.active.borrow_mut().take();
        self.inner.ctx.dispatch(&Message::Hide);
    }

    /// The node most recently shown, unless hidden since.
    pub fn active(&self) -> Option<ActiveNode> {
        self.inner.active.borrow().clone()
    }
}

impl fmt::Debug for ActiveNodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveNodeRegistry")
            .field("active", &*self.inner.active.borrow())
            .field("ctx", &self.inner.ctx)
            .finish()
    }
}
