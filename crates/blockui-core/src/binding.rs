#![forbid(unsafe_code)]

//! Single-subscriber binding between the active-node registry and one
//! overlay controller.
//!
//! # Design
//!
//! A [`BindingContext`] is an explicit object handed to both the registry and
//! the controller. It owns exactly one handler slot. [`bind`](BindingContext::bind)
//! fills the slot and returns a [`Binding`] guard; dropping the guard or
//! calling [`Binding::unbind`] empties it again.
//!
//! The context also tracks which elements carry drag affordance
//! ([`add_event`](BindingContext::add_event) /
//! [`remove_event`](BindingContext::remove_event)).
//!
//! # Invariants
//!
//! 1. At most one handler is bound at a time. Binding into an occupied slot
//!    fails with [`BindError::Occupied`]; the live handler is untouched.
//! 2. Every binding gets a fresh generation. A guard only ever clears the
//!    slot it filled, so a stale guard disposed late cannot unbind a newer
//!    subscriber.
//! 3. Unbinding is idempotent.
//! 4. No internal borrow is held while the handler runs, so handlers may
//!    unbind or rebind re-entrantly.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::active::Message;
use crate::element::{DRAGGABLE_ATTR, ElementId, ElementRef};

type Handler = Rc<dyn Fn(&Message)>;

struct Slot {
    generation: u64,
    handler: Handler,
}

struct ContextInner {
    slot: RefCell<Option<Slot>>,
    next_generation: Cell<u64>,
    draggable: RefCell<BTreeSet<ElementId>>,
}

impl ContextInner {
    fn release(&self, generation: u64) -> bool {
        let mut slot = self.slot.borrow_mut();
        match slot.as_ref() {
            Some(current) if current.generation == generation => {
                *slot = None;
                true
            }
            _ => false,
        }
    }
}

/// Errors returned by [`BindingContext::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindError {
    /// Another subscriber holds the slot; unbind it first.
    Occupied { generation: u64 },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Occupied { generation } => {
                write!(f, "binding slot already held by generation {generation}")
            }
        }
    }
}

impl std::error::Error for BindError {}

/// Shared single-subscriber channel. Cloning shares the same slot.
#[derive(Clone)]
pub struct BindingContext {
    inner: Rc<ContextInner>,
}

impl BindingContext {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(ContextInner {
                slot: RefCell::new(None),
                next_generation: Cell::new(1),
                draggable: RefCell::new(BTreeSet::new()),
            }),
        }
    }

    /// Install `handler` as the subscriber.
    ///
    /// # Errors
    ///
    /// [`BindError::Occupied`] when a live binding already exists.
    pub fn bind(&self, handler: impl Fn(&Message) + 'static) -> Result<Binding, BindError> {
        let mut slot = self.inner.slot.borrow_mut();
        if let Some(current) = slot.as_ref() {
            tracing::warn!(
                target: "blockui.binding",
                generation = current.generation,
                "bind refused: slot occupied"
            );
            return Err(BindError::Occupied {
                generation: current.generation,
            });
        }
        let generation = self.inner.next_generation.get();
        self.inner.next_generation.set(generation + 1);
        *slot = Some(Slot {
            generation,
            handler: Rc::new(handler),
        });
        tracing::debug!(target: "blockui.binding", generation, "bound");
        Ok(Binding {
            ctx: Rc::downgrade(&self.inner),
            generation,
            released: Cell::new(false),
        })
    }

    /// Deliver `message` to the bound handler. Returns `false` when unbound.
    pub fn dispatch(&self, message: &Message) -> bool {
        let handler = self
            .inner
            .slot
            .borrow()
            .as_ref()
            .map(|slot| Rc::clone(&slot.handler));
        match handler {
            Some(handler) => {
                handler(message);
                true
            }
            None => {
                tracing::trace!(
                    target: "blockui.binding",
                    kind = message.kind(),
                    "dispatch with no subscriber"
                );
                false
            }
        }
    }

    /// Whether a subscriber is currently bound.
    pub fn is_bound(&self) -> bool {
        self.inner.slot.borrow().is_some()
    }

    /// Generation of the live binding, if any.
    pub fn bound_generation(&self) -> Option<u64> {
        self.inner
            .slot
            .borrow()
            .as_ref()
            .map(|slot| slot.generation)
    }

    /// Enable drag affordance on `element`.
    pub fn add_event(&self, element: &ElementRef) {
        element.set_attribute(DRAGGABLE_ATTR, Some("true"));
        self.inner.draggable.borrow_mut().insert(element.id());
    }

    /// Remove drag affordance from `element`. No-op if it had none.
    pub fn remove_event(&self, element: &ElementRef) {
        if self.inner.draggable.borrow_mut().remove(&element.id()) {
            element.set_attribute(DRAGGABLE_ATTR, None);
        }
    }

    /// Whether `id` currently carries drag affordance.
    pub fn has_event(&self, id: ElementId) -> bool {
        self.inner.draggable.borrow().contains(&id)
    }
}

impl Default for BindingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BindingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingContext")
            .field("bound", &self.bound_generation())
            .field("draggable", &self.inner.draggable.borrow().len())
            .finish()
    }
}

/// Guard for a live binding. Unbinds on drop.
pub struct Binding {
    ctx: Weak<ContextInner>,
    generation: u64,
    released: Cell<bool>,
}

impl Binding {
    /// Generation assigned at bind time.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Release the slot if this guard still owns it. Idempotent.
    pub fn unbind(&self) {
        if self.released.replace(true) {
            return;
        }
        if let Some(ctx) = self.ctx.upgrade()
            && ctx.release(self.generation)
        {
            tracing::debug!(
                target: "blockui.binding",
                generation = self.generation,
                "unbound"
            );
        }
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        self.unbind();
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("generation", &self.generation)
            .field("released", &self.released.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeElement;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&Message) + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move |_: &Message| c.set(c.get() + 1))
    }

    #[test]
    fn dispatch_reaches_bound_handler() {
        let ctx = BindingContext::new();
        let (count, handler) = counter();
        let _binding = ctx.bind(handler).unwrap();
        assert!(ctx.dispatch(&Message::Hide));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn dispatch_without_subscriber_is_dropped() {
        let ctx = BindingContext::new();
        assert!(!ctx.dispatch(&Message::Hide));
    }

    #[test]
    fn second_bind_is_refused() {
        let ctx = BindingContext::new();
        let (first, h1) = counter();
        let (second, h2) = counter();
        let binding = ctx.bind(h1).unwrap();
        let err = ctx.bind(h2).unwrap_err();
        assert_eq!(
            err,
            BindError::Occupied {
                generation: binding.generation()
            }
        );
        ctx.dispatch(&Message::Hide);
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 0);
    }

    #[test]
    fn drop_unbinds() {
        let ctx = BindingContext::new();
        let (_, handler) = counter();
        let binding = ctx.bind(handler).unwrap();
        assert!(ctx.is_bound());
        drop(binding);
        assert!(!ctx.is_bound());
    }

    #[test]
    fn unbind_is_idempotent() {
        let ctx = BindingContext::new();
        let (_, handler) = counter();
        let binding = ctx.bind(handler).unwrap();
        binding.unbind();
        binding.unbind();
        assert!(!ctx.is_bound());
    }

    #[test]
    fn stale_guard_does_not_clear_newer_binding() {
        let ctx = BindingContext::new();
        let (_, h1) = counter();
        let (count, h2) = counter();
        let old = ctx.bind(h1).unwrap();
        // Release the slot out from under the guard by hand, then rebind.
        ctx.inner.release(old.generation());
        let newer = ctx.bind(h2).unwrap();
        old.unbind();
        assert_eq!(ctx.bound_generation(), Some(newer.generation()));
        ctx.dispatch(&Message::Hide);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn handler_may_unbind_reentrantly() {
        let ctx = BindingContext::new();
        let slot: Rc<RefCell<Option<Binding>>> = Rc::new(RefCell::new(None));
        let s = slot.clone();
        let binding = ctx
            .bind(move |_| {
                if let Some(b) = s.borrow_mut().take() {
                    b.unbind();
                }
            })
            .unwrap();
        *slot.borrow_mut() = Some(binding);
        ctx.dispatch(&Message::Hide);
        assert!(!ctx.is_bound());
    }

    #[test]
    fn guard_outliving_context_is_harmless() {
        let ctx = BindingContext::new();
        let (_, handler) = counter();
        let binding = ctx.bind(handler).unwrap();
        drop(ctx);
        binding.unbind();
    }

    #[test]
    fn drag_affordance_round_trip() {
        let ctx = BindingContext::new();
        let el: ElementRef = FakeElement::new(3);
        ctx.add_event(&el);
        assert!(ctx.has_event(el.id()));
        assert_eq!(el.attribute(DRAGGABLE_ATTR).as_deref(), Some("true"));
        ctx.remove_event(&el);
        ctx.remove_event(&el);
        assert!(!ctx.has_event(el.id()));
        assert_eq!(el.attribute(DRAGGABLE_ATTR), None);
    }
}
