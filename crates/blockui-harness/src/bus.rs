#![forbid(unsafe_code)]

//! Command bus fixtures.
//!
//! [`RecordingBus`] logs every command it receives and can be told to
//! refuse one. [`MemoryTable`] is a small in-memory table that is both the
//! [`GridElement`] a gesture targets and the [`CommandBus`] it mutates, so
//! tests can assert on resulting dimensions and selection.
//!
//! Recorded sequences serialize to JSONL and hash to a stable
//! `blake3:` checksum for golden comparisons.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use blockui_table::{Align, Axis, CommandBus, CommandError, GridElement, TableCommand};

/// Checksum prefix for command transcripts.
const CHECKSUM_PREFIX: &str = "blake3:";

/// One JSON object per line.
pub fn transcript_jsonl(commands: &[TableCommand]) -> String {
    commands
        .iter()
        .map(|cmd| serde_json::to_string(cmd).unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n")
}

/// `blake3:<hex>` digest of [`transcript_jsonl`].
pub fn transcript_checksum(commands: &[TableCommand]) -> String {
    let hash = blake3::hash(transcript_jsonl(commands).as_bytes());
    format!("{CHECKSUM_PREFIX}{}", hash.to_hex())
}

/// Bus that records and accepts everything, unless told to fail.
#[derive(Default)]
pub struct RecordingBus {
    calls: RefCell<Vec<TableCommand>>,
    fail_on: Cell<Option<&'static str>>,
}

impl RecordingBus {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Refuse the next command whose id is `id`, and every later one.
    pub fn fail_on(&self, id: &'static str) {
        self.fail_on.set(Some(id));
    }

    pub fn calls(&self) -> Vec<TableCommand> {
        self.calls.borrow().clone()
    }

    /// Registry ids of the recorded calls.
    pub fn ids(&self) -> Vec<&'static str> {
        self.calls.borrow().iter().map(TableCommand::id).collect()
    }

    /// Nothing recorded yet.
    pub fn is_empty(&self) -> bool {
        self.calls.borrow().is_empty()
    }

    pub fn checksum(&self) -> String {
        transcript_checksum(&self.calls.borrow())
    }
}

impl CommandBus for RecordingBus {
    fn call(&self, command: &TableCommand) -> Result<(), CommandError> {
        if self.fail_on.get() == Some(command.id()) {
            return Err(CommandError::rejected(command, "refused by test bus"));
        }
        self.calls.borrow_mut().push(*command);
        Ok(())
    }
}

/// What is currently selected in a [`MemoryTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    None,
    Row(usize),
    Col(usize),
}

/// Table contents as cell text, row-major.
pub struct MemoryTable {
    document_position: usize,
    cells: RefCell<Vec<Vec<String>>>,
    aligns: RefCell<Vec<Align>>,
    selection: Cell<Selection>,
    log: RecordingBus,
}

impl MemoryTable {
    /// `rows`×`cols` table whose cells read `"r{row}c{col}"`.
    pub fn new(document_position: usize, rows: usize, cols: usize) -> Rc<Self> {
        let cells = (0..rows)
            .map(|r| (0..cols).map(|c| format!("r{r}c{c}")).collect())
            .collect();
        Rc::new(Self {
            document_position,
            cells: RefCell::new(cells),
            aligns: RefCell::new(vec![Align::Left; cols]),
            selection: Cell::new(Selection::None),
            log: RecordingBus::default(),
        })
    }

    pub fn selection(&self) -> Selection {
        self.selection.get()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<String> {
        self.cells.borrow().get(row)?.get(col).cloned()
    }

    pub fn align(&self, col: usize) -> Option<Align> {
        self.aligns.borrow().get(col).copied()
    }

    /// Every command applied so far.
    pub fn history(&self) -> Vec<TableCommand> {
        self.log.calls()
    }

    fn check_pos(&self, command: &TableCommand, pos: usize) -> Result<(), CommandError> {
        if pos == self.start_pos() {
            Ok(())
        } else {
            Err(CommandError::rejected(command, format!("no table at {pos}")))
        }
    }

    fn selected(&self, command: &TableCommand, axis: Axis) -> Result<usize, CommandError> {
        match (self.selection.get(), axis) {
            (Selection::Row(i), Axis::Row) | (Selection::Col(i), Axis::Col) => Ok(i),
            _ => Err(CommandError::rejected(command, "nothing selected on axis")),
        }
    }

    fn insert_row(&self, at: usize) {
        let cols = self.col_count();
        self.cells
            .borrow_mut()
            .insert(at, vec![String::new(); cols]);
    }

    fn insert_col(&self, at: usize) {
        for row in self.cells.borrow_mut().iter_mut() {
            row.insert(at, String::new());
        }
        self.aligns.borrow_mut().insert(at, Align::Left);
    }

    fn delete_selected(&self, command: &TableCommand) -> Result<(), CommandError> {
        match self.selection.get() {
            Selection::Row(i) => {
                if self.row_count() <= 1 {
                    return Err(CommandError::rejected(command, "last row"));
                }
                self.cells.borrow_mut().remove(i);
            }
            Selection::Col(i) => {
                if self.col_count() <= 1 {
                    return Err(CommandError::rejected(command, "last column"));
                }
                for row in self.cells.borrow_mut().iter_mut() {
                    row.remove(i);
                }
                self.aligns.borrow_mut().remove(i);
            }
            Selection::None => return Err(CommandError::rejected(command, "nothing selected")),
        }
        self.selection.set(Selection::None);
        Ok(())
    }
}

impl GridElement for MemoryTable {
    fn document_position(&self) -> usize {
        self.document_position
    }

    fn row_count(&self) -> usize {
        self.cells.borrow().len()
    }

    fn col_count(&self) -> usize {
        self.cells.borrow().first().map_or(0, Vec::len)
    }
}

impl CommandBus for MemoryTable {
    fn call(&self, command: &TableCommand) -> Result<(), CommandError> {
        match *command {
            TableCommand::SelectRow { pos, index } => {
                self.check_pos(command, pos)?;
                if index >= self.row_count() {
                    return Err(CommandError::rejected(command, "row out of range"));
                }
                self.selection.set(Selection::Row(index));
            }
            TableCommand::SelectCol { pos, index } => {
                self.check_pos(command, pos)?;
                if index >= self.col_count() {
                    return Err(CommandError::rejected(command, "column out of range"));
                }
                self.selection.set(Selection::Col(index));
            }
            TableCommand::InsertRowBefore => self.insert_row(self.selected(command, Axis::Row)?),
            TableCommand::InsertRowAfter => {
                self.insert_row(self.selected(command, Axis::Row)? + 1);
            }
            TableCommand::InsertColBefore => self.insert_col(self.selected(command, Axis::Col)?),
            TableCommand::InsertColAfter => {
                self.insert_col(self.selected(command, Axis::Col)? + 1);
            }
            TableCommand::DeleteSelectedCells => self.delete_selected(command)?,
            TableCommand::SetAlign { direction } => {
                let col = self.selected(command, Axis::Col)?;
                self.aligns.borrow_mut()[col] = direction;
            }
        }
        self.log.call(command)
    }
}
