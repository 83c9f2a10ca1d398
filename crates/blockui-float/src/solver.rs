#![forbid(unsafe_code)]

//! Position solver contract.
//!
//! The solver is an external collaborator: given a reference rectangle, the
//! floating element, a preferred placement and a middleware chain, it
//! computes where the floating element's top-left corner belongs.
//!
//! Computation is asynchronous. [`PositionSolver::compute_position`] takes a
//! completion callback that the solver may invoke before returning, on a
//! later frame, or never. Completions for different requests may arrive in
//! any order; the caller is responsible for discarding stale ones.

use std::fmt;

use blockui_core::{ElementRef, Rect};

use crate::middleware::Middleware;
use crate::placement::Placement;

/// Caller overrides for solver defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolverOverrides {
    /// Clipping boundary replacing the solver's own viewport.
    pub boundary: Option<Rect>,
}

/// Everything a solver needs for one computation.
#[derive(Clone)]
pub struct PositionRequest {
    pub reference: Rect,
    pub floating: ElementRef,
    pub placement: Placement,
    pub middleware: Vec<Middleware>,
    pub overrides: SolverOverrides,
}

impl fmt::Debug for PositionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionRequest")
            .field("reference", &self.reference)
            .field("floating", &self.floating.id())
            .field("placement", &self.placement)
            .field("middleware", &self.middleware)
            .field("overrides", &self.overrides)
            .finish()
    }
}

/// Result of a successful computation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComputedPosition {
    pub x: f64,
    pub y: f64,
    /// Placement after flip rules ran.
    pub placement: Placement,
}

/// Why a computation failed.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// The reference rectangle has no area.
    EmptyReference(Rect),
    /// The floating element reports no size.
    Unmeasurable,
    /// Host-specific failure.
    Other(String),
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyReference(rect) => write!(
                f,
                "reference rectangle is empty ({}x{} at {},{})",
                rect.width, rect.height, rect.x, rect.y
            ),
            Self::Unmeasurable => write!(f, "floating element has no measurable size"),
            Self::Other(msg) => write!(f, "position solver failed: {msg}"),
        }
    }
}

impl std::error::Error for SolverError {}

/// Result delivered to a [`PositionCallback`].
pub type SolverResult = Result<ComputedPosition, SolverError>;

/// Completion callback for one computation.
pub type PositionCallback = Box<dyn FnOnce(SolverResult)>;

/// Computes floating coordinates.
pub trait PositionSolver {
    /// Start a computation and report its outcome through `done`.
    fn compute_position(&self, request: PositionRequest, done: PositionCallback);
}

impl<S: PositionSolver + ?Sized> PositionSolver for std::rc::Rc<S> {
    fn compute_position(&self, request: PositionRequest, done: PositionCallback) {
        (**self).compute_position(request, done);
    }
}
