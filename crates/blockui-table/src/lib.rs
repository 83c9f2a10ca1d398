#![forbid(unsafe_code)]

//! Table gesture translation.
//!
//! # Role in blockui
//! `blockui-table` turns clicks on table affordances (gridline insertion
//! handles, row and column selectors, delete and alignment buttons) into
//! ordered [`TableCommand`] sequences for the host's [`CommandBus`].
//!
//! # How it fits in the system
//! The translator reads hover state recorded by the host, queries the live
//! [`GridElement`] for its dimensions, and uses the shared
//! [`FrameScheduler`](blockui_core::FrameScheduler) to hand focus back to
//! the [`EditorSurface`](blockui_core::EditorSurface) after an edit.

pub mod command;
pub mod gesture;
pub mod grid;

pub use command::{Align, CommandBus, CommandError, TableCommand};
pub use gesture::{
    GestureOutcome, GestureResult, GridGestureTranslator, PointerGesture, SkipReason,
    insert_sequence, select_command,
};
pub use grid::{Affordances, Axis, GridElement, HoverIndex};
