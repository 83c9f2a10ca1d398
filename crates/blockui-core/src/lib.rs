#![forbid(unsafe_code)]

//! Core: geometry, host element handles, the active-node registry, and
//! frame scheduling.
//!
//! # Role in blockui
//! `blockui-core` is the leaf layer. It defines what the overlay layer knows
//! about the host (the [`UiElement`] and [`EditorSurface`] traits), the node
//! currently under pointer focus ([`ActiveNode`]), and the explicit
//! single-subscriber channel ([`BindingContext`]) the registry uses to talk
//! to one controller at a time.
//!
//! # How it fits in the system
//! `blockui-float` binds a floating handle controller to the registry and
//! defers its work through the [`FrameScheduler`]. `blockui-table` uses the
//! element traits and the scheduler to restore focus after table edits.
//! Everything here is single-threaded; handles are `Rc`-based and `!Send`.

pub mod active;
pub mod binding;
pub mod cancellation;
pub mod diagnostics;
pub mod element;
pub mod frame;
pub mod geometry;
pub mod registry;

pub use active::{ActiveNode, Message};
pub use binding::{BindError, Binding, BindingContext};
pub use cancellation::{CancellationSource, CancellationToken};
pub use diagnostics::{
    Diagnostic, DiagnosticSink, DiagnosticSource, MemorySink, SinkRef, TracingSink,
};
pub use element::{
    EditorSurface, ElementId, ElementRef, SurfaceError, SurfaceRef, UiElement, is_shown, set_shown,
    toggle_shown,
};
pub use frame::{FrameHandle, FrameScheduler};
pub use geometry::Rect;
pub use registry::ActiveNodeRegistry;
