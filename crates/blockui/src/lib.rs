#![forbid(unsafe_code)]

//! blockui public facade.
//!
//! Overlay control for structured editors: a floating block handle that
//! follows the hovered node, and table gestures translated into document
//! commands. This crate re-exports the common types from the internal
//! crates, adds the unified [`Error`], and offers a prelude.
//!
//! ```ignore
//! use blockui::prelude::*;
//!
//! let ctx = BindingContext::new();
//! let registry = ActiveNodeRegistry::new(ctx.clone());
//! let handle = FloatingHandle::builder(handle_el, surface, ctx, solver)
//!     .config(HandleSettings::from_file("handle.toml")?.into_config())
//!     .build();
//!
//! // every render pass
//! handle.update();
//! ```

pub mod error;

pub use error::{Error, Recovery, Result, applied};

// --- Core re-exports -------------------------------------------------------

pub use blockui_core::{
    ActiveNode, ActiveNodeRegistry, BindError, Binding, BindingContext, CancellationSource,
    CancellationToken, Diagnostic, DiagnosticSink, DiagnosticSource, EditorSurface, ElementId,
    ElementRef, FrameHandle, FrameScheduler, MemorySink, Message, Rect, SinkRef, SurfaceError,
    SurfaceRef, TracingSink, UiElement, is_shown, set_shown, toggle_shown,
};

// --- Floating handle re-exports ---------------------------------------------

pub use blockui_float::{
    ComputedPosition, DeferredSolver, DerivationContext, FloatingConfig, FloatingHandle,
    FloatingHandleBuilder, FnRule, HandleSettings, InitError, InitPolicy, LayoutRule, LayoutState,
    Lifecycle, Middleware, Placement, PositionCallback, PositionRequest, PositionSolver,
    SettingsError, SolverError, SolverOverrides, SolverResult, StalePolicy, ViewportSolver,
    Visibility,
};

// --- Table re-exports ------------------------------------------------------

pub use blockui_table::{
    Affordances, Align, Axis, CommandBus, CommandError, GestureOutcome, GestureResult, GridElement,
    GridGestureTranslator, HoverIndex, PointerGesture, SkipReason, TableCommand,
};

pub mod prelude {
    pub use crate::{
        ActiveNode, ActiveNodeRegistry, BindingContext, CommandBus, EditorSurface, Error,
        FloatingConfig, FloatingHandle, FrameScheduler, GridElement, GridGestureTranslator,
        HandleSettings, HoverIndex, Placement, PositionSolver, Rect, Recovery, Result, UiElement,
        ViewportSolver,
    };

    pub use crate::{core, float, table};
}

pub use blockui_core as core;
pub use blockui_float as float;
pub use blockui_table as table;
