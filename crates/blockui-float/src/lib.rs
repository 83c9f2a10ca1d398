#![forbid(unsafe_code)]

//! Floating block handle controller and position solving.
//!
//! # Role in blockui
//! `blockui-float` keeps one overlay element (typically a drag handle) glued
//! to the node the [`ActiveNodeRegistry`](blockui_core::ActiveNodeRegistry)
//! announces. It owns the controller state machine in [`controller`], the
//! solver contract in [`solver`], and a reference solver in [`viewport`].
//!
//! # How it fits in the system
//! The controller binds to a [`BindingContext`](blockui_core::BindingContext)
//! on its first successful frame, forwards `Show` messages to a
//! [`PositionSolver`], and applies results only while they are still
//! current. Configuration comes from code via [`FloatingConfig`] or from a
//! settings file via [`HandleSettings`].

pub mod config;
pub mod controller;
pub mod middleware;
pub mod placement;
pub mod solver;
pub mod viewport;

pub use config::{
    DerivationContext, FloatingConfig, HandleSettings, InitPolicy, SettingsError, StalePolicy,
};
pub use controller::{FloatingHandle, FloatingHandleBuilder, InitError, Lifecycle, Visibility};
pub use middleware::{FnRule, LayoutRule, LayoutState, Middleware};
pub use placement::Placement;
pub use solver::{
    ComputedPosition, PositionCallback, PositionRequest, PositionSolver, SolverError,
    SolverOverrides, SolverResult,
};
pub use viewport::{DeferredSolver, ViewportSolver};
