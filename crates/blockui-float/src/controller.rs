#![forbid(unsafe_code)]

//! Floating handle controller.
//!
//! [`FloatingHandle`] owns one floating element (a block drag handle, for
//! instance) and keeps it next to whichever node the
//! [`ActiveNodeRegistry`](blockui_core::ActiveNodeRegistry) announces.
//!
//! # State machine
//!
//! ```text
//!   lifecycle:   Uninitialized ──init ok──▶ Initialized ──destroy──▶ Destroyed
//!                      │  ▲
//!              init err│  │update() retries
//!                      ▼  │
//!                (still Uninitialized) ──policy exhausted──▶ Failed
//!
//!   visibility:  Hidden ◀──hide()── Shown ◀──solver ok── (show() in flight)
//! ```
//!
//! Initial state is `Uninitialized, Hidden`.
//!
//! # Invariants
//!
//! 1. At most one successful initialization; later `update()` calls are no-ops.
//! 2. At most one live binding and one attached element per controller.
//! 3. `hide()` is synchronous and idempotent and never calls the solver.
//! 4. A solver failure reports a diagnostic and leaves visibility unchanged.
//! 5. `destroy()` is idempotent, safe before initialization, and cancels
//!    pending frame work and position computations.
//! 6. With [`StalePolicy::Cancel`] a computation superseded by a later
//!    `show()`/`hide()` never touches the element.
//!
//! # Failure Modes
//!
//! - **Surface not mounted**: initialization fails with
//!   [`InitError::NotReady`] and is retried on the next `update()`. With a
//!   bounded [`InitPolicy`] the controller moves to
//!   [`Lifecycle::Failed`] and reports [`InitError::RetryExhausted`].
//! - **Slot occupied**: another controller holds the registry binding;
//!   treated like not-ready.
//! - **Legacy race**: with [`StalePolicy::Keep`], a computation that lands
//!   after `hide()` re-shows the element at a stale position.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use blockui_core::{
    ActiveNode, BindError, Binding, BindingContext, CancellationSource, CancellationToken,
    Diagnostic, DiagnosticSource, ElementRef, FrameHandle, FrameScheduler, Message, SinkRef,
    SurfaceError, SurfaceRef, TracingSink, set_shown,
};

use crate::config::{DerivationContext, FloatingConfig, StalePolicy};
use crate::middleware::Middleware;
use crate::placement::Placement;
use crate::solver::{ComputedPosition, PositionRequest, PositionSolver, SolverResult};

/// Initialization progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Initialized,
    /// Bounded retry policy exhausted; `update()` no longer schedules work.
    Failed,
    Destroyed,
}

/// Whether the floating element's visibility flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Shown,
}

/// Why deferred initialization did not complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitError {
    /// The editor surface is not mounted (or has nowhere to host overlays).
    NotReady(SurfaceError),
    /// Another subscriber holds the registry binding.
    Bind(BindError),
    /// Bounded retry policy ran out.
    RetryExhausted { attempts: u32 },
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady(err) => write!(f, "surface not ready: {err}"),
            Self::Bind(err) => write!(f, "registry binding unavailable: {err}"),
            Self::RetryExhausted { attempts } => {
                write!(f, "initialization abandoned after {attempts} attempts")
            }
        }
    }
}

impl std::error::Error for InitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::NotReady(err) => Some(err),
            Self::Bind(err) => Some(err),
            Self::RetryExhausted { .. } => None,
        }
    }
}

impl From<SurfaceError> for InitError {
    fn from(err: SurfaceError) -> Self {
        Self::NotReady(err)
    }
}

impl From<BindError> for InitError {
    fn from(err: BindError) -> Self {
        Self::Bind(err)
    }
}

struct ControllerState {
    lifecycle: Lifecycle,
    visibility: Visibility,
    binding: Option<Binding>,
    init_frame: Option<FrameHandle>,
    failures: u32,
    in_flight: Option<CancellationSource>,
    computations: u64,
    last_position: Option<ComputedPosition>,
}

struct Shared {
    element: ElementRef,
    surface: SurfaceRef,
    context: BindingContext,
    solver: Rc<dyn PositionSolver>,
    scheduler: FrameScheduler,
    sink: SinkRef,
    config: FloatingConfig,
    state: RefCell<ControllerState>,
    self_ref: Weak<Shared>,
}

/// Controller for one floating element. Cloning yields another handle to
/// the same controller.
#[derive(Clone)]
pub struct FloatingHandle {
    shared: Rc<Shared>,
}

/// Builder for [`FloatingHandle`].
pub struct FloatingHandleBuilder {
    element: ElementRef,
    surface: SurfaceRef,
    context: BindingContext,
    solver: Rc<dyn PositionSolver>,
    scheduler: Option<FrameScheduler>,
    sink: Option<SinkRef>,
    config: FloatingConfig,
}

impl FloatingHandleBuilder {
    /// Frame queue used for deferred initialization. A private one otherwise.
    #[must_use]
    pub fn scheduler(mut self, scheduler: FrameScheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Where solver and init failures go. [`TracingSink`] otherwise.
    #[must_use]
    pub fn sink(mut self, sink: SinkRef) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn config(mut self, config: FloatingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> FloatingHandle {
        set_shown(&*self.element, false);
        let shared = Rc::new_cyclic(|self_ref| Shared {
            element: self.element,
            surface: self.surface,
            context: self.context,
            solver: self.solver,
            scheduler: self.scheduler.unwrap_or_default(),
            sink: self.sink.unwrap_or_else(|| Rc::new(TracingSink)),
            config: self.config,
            state: RefCell::new(ControllerState {
                lifecycle: Lifecycle::Uninitialized,
                visibility: Visibility::Hidden,
                binding: None,
                init_frame: None,
                failures: 0,
                in_flight: None,
                computations: 0,
                last_position: None,
            }),
            self_ref: self_ref.clone(),
        });
        FloatingHandle { shared }
    }
}

impl FloatingHandle {
    /// Start building a controller for `element`.
    pub fn builder(
        element: ElementRef,
        surface: SurfaceRef,
        context: BindingContext,
        solver: impl PositionSolver + 'static,
    ) -> FloatingHandleBuilder {
        FloatingHandleBuilder {
            element,
            surface,
            context,
            solver: Rc::new(solver),
            scheduler: None,
            sink: None,
            config: FloatingConfig::default(),
        }
    }

    /// Schedule initialization on the next frame if it has not happened yet.
    ///
    /// Meant to be called on every render pass. Failures are retried on the
    /// next call.
    pub fn update(&self) {
        self.shared.update();
    }

    /// Position the element next to `active` and show it once solved.
    pub fn show(&self, active: &ActiveNode) {
        self.shared.show(active);
    }

    /// Hide the element immediately.
    pub fn hide(&self) {
        self.shared.hide();
    }

    /// Hide and detach the element, releasing its binding and drag marker.
    /// Idempotent.
    pub fn destroy(&self) {
        self.shared.destroy();
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.borrow().lifecycle
    }

    pub fn visibility(&self) -> Visibility {
        self.shared.state.borrow().visibility
    }

    /// Whether this controller currently holds the registry binding.
    pub fn is_bound(&self) -> bool {
        self.shared.state.borrow().binding.is_some()
    }

    /// Failed initialization attempts so far.
    pub fn init_failures(&self) -> u32 {
        self.shared.state.borrow().failures
    }

    /// Last position applied to the element.
    pub fn last_position(&self) -> Option<ComputedPosition> {
        self.shared.state.borrow().last_position
    }

    pub fn element(&self) -> &ElementRef {
        &self.shared.element
    }
}

impl fmt::Debug for FloatingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("FloatingHandle")
            .field("element", &self.shared.element.id())
            .field("lifecycle", &state.lifecycle)
            .field("visibility", &state.visibility)
            .field("bound", &state.binding.is_some())
            .field("config", &self.shared.config)
            .finish()
    }
}

impl Shared {
    fn weak(&self) -> Weak<Shared> {
        self.self_ref.clone()
    }

    fn update(&self) {
        let mut state = self.state.borrow_mut();
        if state.lifecycle != Lifecycle::Uninitialized || state.init_frame.is_some() {
            return;
        }
        let weak = self.weak();
        state.init_frame = Some(self.scheduler.request_frame(move || {
            if let Some(shared) = weak.upgrade() {
                shared.run_init();
            }
        }));
    }

    fn run_init(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.init_frame = None;
            if state.lifecycle != Lifecycle::Uninitialized {
                return;
            }
        }

        match self.try_init() {
            Ok(binding) => {
                let mut state = self.state.borrow_mut();
                state.binding = Some(binding);
                state.lifecycle = Lifecycle::Initialized;
                tracing::debug!(
                    target: "blockui.float",
                    element = self.element.id().raw(),
                    failures = state.failures,
                    "floating handle initialized"
                );
            }
            Err(err) => {
                let failures = {
                    let mut state = self.state.borrow_mut();
                    state.failures = state.failures.saturating_add(1);
                    state.failures
                };
                tracing::debug!(
                    target: "blockui.float",
                    error = %err,
                    failures,
                    "floating handle init deferred"
                );
                if self.config.init.exhausted(failures) {
                    self.state.borrow_mut().lifecycle = Lifecycle::Failed;
                    let exhausted = InitError::RetryExhausted { attempts: failures };
                    self.sink.report(Diagnostic::from_error(
                        DiagnosticSource::Initialization,
                        &exhausted,
                    ));
                }
            }
        }
    }

    /// Everything fallible happens before the element is attached.
    fn try_init(&self) -> Result<Binding, InitError> {
        self.surface.root()?;
        let container = match &self.config.root_container {
            Some(container) => Rc::clone(container),
            None => self.surface.default_container()?,
        };

        let weak = self.weak();
        let binding = self.context.bind(move |message| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            match message {
                Message::Show(active) => shared.show(active),
                Message::Hide => shared.hide(),
            }
        })?;

        container.append_child(Rc::clone(&self.element));
        self.context.add_event(&self.element);
        Ok(binding)
    }

    fn show(&self, active: &ActiveNode) {
        if self.state.borrow().lifecycle == Lifecycle::Destroyed {
            return;
        }

        let ctx = DerivationContext {
            active,
            surface: &*self.surface,
            floating: &*self.element,
        };
        let config = &self.config;
        let offset = config.get_offset.as_ref().map(|f| f(&ctx));
        let reference = config
            .get_position
            .as_ref()
            .map_or(active.dom_rect, |f| f(&ctx));
        let placement = config
            .get_placement
            .as_ref()
            .map_or(Placement::Left, |f| f(&ctx));

        let mut middleware = vec![Middleware::Flip];
        if let Some(offset) = offset {
            middleware.push(Middleware::Offset(offset));
        }
        if let Some(extra) = &config.extra_middleware {
            middleware.extend(extra(&ctx));
        }
        let overrides = config
            .solver_options
            .as_ref()
            .map(|f| f(&ctx))
            .unwrap_or_default();

        let (token, generation) = self.begin_computation();
        let _span = tracing::debug_span!(
            "float.position",
            generation,
            placement = placement.as_str(),
            rules = middleware.len(),
        )
        .entered();

        let request = PositionRequest {
            reference,
            floating: Rc::clone(&self.element),
            placement,
            middleware,
            overrides,
        };
        let weak = self.weak();
        // The solver may call back before returning; no borrow is held here.
        self.solver.compute_position(
            request,
            Box::new(move |result| {
                if let Some(shared) = weak.upgrade() {
                    shared.finish(&token, generation, result);
                }
            }),
        );
    }

    fn begin_computation(&self) -> (CancellationToken, u64) {
        let mut state = self.state.borrow_mut();
        if self.config.stale == StalePolicy::Cancel
            && let Some(previous) = state.in_flight.take()
        {
            previous.cancel();
        }
        state.computations += 1;
        let source = CancellationSource::new();
        let token = source.token();
        state.in_flight = Some(source);
        (token, state.computations)
    }

    fn finish(&self, token: &CancellationToken, generation: u64, result: SolverResult) {
        if token.is_cancelled() {
            tracing::debug!(
                target: "blockui.float",
                generation,
                "stale position dropped"
            );
            return;
        }
        if self.state.borrow().lifecycle == Lifecycle::Destroyed {
            return;
        }

        match result {
            Ok(position) => {
                self.element.set_position(position.x, position.y);
                set_shown(&*self.element, true);
                let mut state = self.state.borrow_mut();
                state.visibility = Visibility::Shown;
                state.last_position = Some(position);
                tracing::debug!(
                    target: "blockui.float",
                    generation,
                    x = position.x,
                    y = position.y,
                    placement = position.placement.as_str(),
                    "floating handle shown"
                );
            }
            Err(err) => {
                self.sink
                    .report(Diagnostic::from_error(DiagnosticSource::Position, &err));
            }
        }
    }

    fn hide(&self) {
        {
            let mut state = self.state.borrow_mut();
            if self.config.stale == StalePolicy::Cancel
                && let Some(in_flight) = state.in_flight.take()
            {
                in_flight.cancel();
            }
            state.visibility = Visibility::Hidden;
        }
        set_shown(&*self.element, false);
    }

    fn destroy(&self) {
        let binding = {
            let mut state = self.state.borrow_mut();
            if state.lifecycle == Lifecycle::Destroyed {
                return;
            }
            state.lifecycle = Lifecycle::Destroyed;
            if let Some(frame) = state.init_frame.take() {
                frame.cancel();
            }
            if let Some(in_flight) = state.in_flight.take() {
                in_flight.cancel();
            }
            state.visibility = Visibility::Hidden;
            state.binding.take()
        };
        if let Some(binding) = binding {
            binding.unbind();
        }
        set_shown(&*self.element, false);
        self.context.remove_event(&self.element);
        self.element.detach();
        tracing::debug!(
            target: "blockui.float",
            element = self.element.id().raw(),
            "floating handle destroyed"
        );
    }
}
