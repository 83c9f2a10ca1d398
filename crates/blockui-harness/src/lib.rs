#![forbid(unsafe_code)]

//! Test fixtures for blockui.
//!
//! Mock host elements and surfaces ([`mock`]), command bus doubles and an
//! in-memory table ([`bus`]), solvers whose completions the test controls
//! ([`solver`]), and a `tracing` capture layer ([`capture`]).
//!
//! Used from integration tests of the other workspace crates. Unit tests
//! inside those crates keep local fakes instead.

pub mod bus;
pub mod capture;
pub mod mock;
pub mod solver;

pub use bus::{MemoryTable, RecordingBus, Selection, transcript_checksum, transcript_jsonl};
pub use capture::{Captured, CapturedEvent, CapturedSpan, with_captured_tracing};
pub use mock::{MockDom, MockElement, MockGesture, MockSurface};
pub use solver::{FailingSolver, ManualSolver};
