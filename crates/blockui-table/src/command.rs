#![forbid(unsafe_code)]

//! Table commands and the bus that executes them.
//!
//! The document engine is opaque. The translator only names what it wants
//! done, in order, through a [`CommandBus`]. Each [`TableCommand`] has a
//! stable string id matching the engine's command registry
//! (`select-row`, `insert-row-after`, ...).
//!
//! # Invariants
//!
//! - Every `pos` is the document offset of the grid's start (grid position + 1).
//! - Row and column indices are zero-based and non-negative.
//! - The bus is synchronous; a returned error means the command did not apply.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One structural edit understood by the document engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "id", rename_all = "kebab-case")]
pub enum TableCommand {
    SelectRow { pos: usize, index: usize },
    SelectCol { pos: usize, index: usize },
    InsertRowBefore,
    InsertRowAfter,
    InsertColBefore,
    InsertColAfter,
    DeleteSelectedCells,
    SetAlign { direction: Align },
}

impl TableCommand {
    /// Registry id of the command.
    pub fn id(&self) -> &'static str {
        match self {
            Self::SelectRow { .. } => "select-row",
            Self::SelectCol { .. } => "select-col",
            Self::InsertRowBefore => "insert-row-before",
            Self::InsertRowAfter => "insert-row-after",
            Self::InsertColBefore => "insert-col-before",
            Self::InsertColAfter => "insert-col-after",
            Self::DeleteSelectedCells => "delete-selected-cells",
            Self::SetAlign { .. } => "set-align",
        }
    }

    /// Whether the command changes document content (selection does not).
    pub fn mutates_content(&self) -> bool {
        !matches!(self, Self::SelectRow { .. } | Self::SelectCol { .. })
    }
}

impl fmt::Display for TableCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectRow { pos, index } | Self::SelectCol { pos, index } => {
                write!(f, "{}({pos}, {index})", self.id())
            }
            Self::SetAlign { direction } => write!(f, "{}({direction})", self.id()),
            _ => f.write_str(self.id()),
        }
    }
}

/// Why the engine refused a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The engine does not know the command id.
    Unknown(&'static str),
    /// The command does not apply to the current document state.
    Rejected {
        command: &'static str,
        reason: String,
    },
}

impl CommandError {
    pub fn rejected(command: &TableCommand, reason: impl Into<String>) -> Self {
        Self::Rejected {
            command: command.id(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "unknown command `{id}`"),
            Self::Rejected { command, reason } => write!(f, "`{command}` rejected: {reason}"),
        }
    }
}

impl std::error::Error for CommandError {}

/// Executes commands against the document.
pub trait CommandBus {
    /// Run one command.
    ///
    /// # Errors
    ///
    /// [`CommandError`] when the engine refuses the command.
    fn call(&self, command: &TableCommand) -> Result<(), CommandError>;
}

impl<B: CommandBus + ?Sized> CommandBus for std::rc::Rc<B> {
    fn call(&self, command: &TableCommand) -> Result<(), CommandError> {
        (**self).call(command)
    }
}
