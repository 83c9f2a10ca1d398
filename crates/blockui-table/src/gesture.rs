#![forbid(unsafe_code)]

//! Pointer gestures over a table, translated into command sequences.
//!
//! A gridline hover names an insertion point, a cell hover names a line to
//! select. One click on an affordance becomes an ordered list of
//! [`TableCommand`]s sent to the [`CommandBus`].
//!
//! # Insertion
//!
//! Hovering gridline `r` of a grid with `n` lines is ambiguous at the
//! trailing edge. The translator resolves it like this:
//!
//! | hover      | sequence                                          |
//! |------------|---------------------------------------------------|
//! | `r == n`   | `select(r - 1)`, `insert-after`, `select(r)`      |
//! | `r < n`    | `select(r)`, `insert-before`, `select(r)`         |
//!
//! Either way the new line lands at index `r` and ends up selected.
//!
//! # Preconditions
//!
//! Every handler suppresses the pointer event's default handling first.
//! Handlers that change the document then check editability; selection
//! works on a read-only surface too. A failed precondition yields
//! [`GestureOutcome::Skipped`] and issues nothing. A bus error aborts the
//! remaining sequence and is returned to the caller; earlier commands are
//! not rolled back.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use blockui_core::{FrameScheduler, SurfaceRef, set_shown, toggle_shown};

use crate::command::{Align, CommandBus, CommandError, TableCommand};
use crate::grid::{Affordances, Axis, GridElement, HoverIndex};

/// The pointer event that triggered a gesture.
pub trait PointerGesture {
    /// Stop the host from also handling the event.
    fn prevent_default(&self);
}

/// Why a gesture issued nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The surface does not accept edits.
    NotEditable,
    /// No grid was found under the gesture.
    NoGrid,
    /// Nothing is hovered on the gesture's axis.
    NoHover,
    /// Hovered index is beyond the live grid.
    OutOfRange { index: usize, count: usize },
    /// The grid has no lines on the gesture's axis.
    EmptyGrid,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotEditable => write!(f, "surface is not editable"),
            Self::NoGrid => write!(f, "no grid under gesture"),
            Self::NoHover => write!(f, "nothing hovered"),
            Self::OutOfRange { index, count } => write!(f, "index {index} outside grid of {count}"),
            Self::EmptyGrid => write!(f, "grid is empty"),
        }
    }
}

/// What a gesture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// All commands were accepted.
    Applied { commands: usize },
    Skipped(SkipReason),
}

pub type GestureResult = Result<GestureOutcome, CommandError>;

/// `select-row` or `select-col` at `index`.
pub fn select_command(axis: Axis, pos: usize, index: usize) -> TableCommand {
    match axis {
        Axis::Row => TableCommand::SelectRow { pos, index },
        Axis::Col => TableCommand::SelectCol { pos, index },
    }
}

/// Command sequence inserting a line at gridline `index` of a grid with
/// `count` lines, or `None` when `index` is out of range or the grid is
/// empty.
pub fn insert_sequence(
    axis: Axis,
    pos: usize,
    index: usize,
    count: usize,
) -> Option<[TableCommand; 3]> {
    if count == 0 || index > count {
        return None;
    }
    let (anchor, insert) = if index == count {
        let after = match axis {
            Axis::Row => TableCommand::InsertRowAfter,
            Axis::Col => TableCommand::InsertColAfter,
        };
        (index - 1, after)
    } else {
        let before = match axis {
            Axis::Row => TableCommand::InsertRowBefore,
            Axis::Col => TableCommand::InsertColBefore,
        };
        (index, before)
    };
    Some([
        select_command(axis, pos, anchor),
        insert,
        select_command(axis, pos, index),
    ])
}

/// Translates table gestures into [`CommandBus`] calls.
pub struct GridGestureTranslator {
    surface: SurfaceRef,
    bus: Rc<dyn CommandBus>,
    scheduler: FrameScheduler,
    affordances: Affordances,
    cell_hover: Cell<HoverIndex>,
    line_hover: Cell<HoverIndex>,
}

impl GridGestureTranslator {
    pub fn new(
        surface: SurfaceRef,
        bus: impl CommandBus + 'static,
        scheduler: FrameScheduler,
    ) -> Self {
        Self {
            surface,
            bus: Rc::new(bus),
            scheduler,
            affordances: Affordances::default(),
            cell_hover: Cell::new(HoverIndex::NONE),
            line_hover: Cell::new(HoverIndex::NONE),
        }
    }

    #[must_use]
    pub fn with_affordances(mut self, affordances: Affordances) -> Self {
        self.affordances = affordances;
        self
    }

    pub fn affordances(&self) -> &Affordances {
        &self.affordances
    }

    /// Record the hovered cell.
    pub fn set_cell_hover(&self, hover: HoverIndex) {
        self.cell_hover.set(hover);
    }

    pub fn cell_hover(&self) -> HoverIndex {
        self.cell_hover.get()
    }

    /// Record the hovered gridline.
    pub fn set_line_hover(&self, hover: HoverIndex) {
        self.line_hover.set(hover);
    }

    pub fn line_hover(&self) -> HoverIndex {
        self.line_hover.get()
    }

    /// Pointer left the table.
    pub fn clear_hover(&self) {
        self.cell_hover.set(HoverIndex::NONE);
        self.line_hover.set(HoverIndex::NONE);
    }

    /// Insert a row at the hovered row gridline, then hide the row line handle.
    ///
    /// # Errors
    ///
    /// The first [`CommandError`] from the bus.
    pub fn insert_row(
        &self,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        self.insert_line(Axis::Row, event, grid)
    }

    /// Insert a column at the hovered column gridline.
    ///
    /// The column line handle stays visible afterwards.
    ///
    /// # Errors
    ///
    /// The first [`CommandError`] from the bus.
    pub fn insert_col(
        &self,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        self.insert_line(Axis::Col, event, grid)
    }

    /// Select the hovered row and toggle its action group, except for the
    /// header row. Allowed on a read-only surface.
    ///
    /// # Errors
    ///
    /// [`CommandError`] from the bus.
    pub fn select_row(
        &self,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        self.select_line(Axis::Row, event, grid)
    }

    /// Select the hovered column and toggle its action group.
    ///
    /// # Errors
    ///
    /// [`CommandError`] from the bus.
    pub fn select_col(
        &self,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        self.select_line(Axis::Col, event, grid)
    }

    /// Delete the selected cells and refocus the surface on the next frame.
    ///
    /// # Errors
    ///
    /// [`CommandError`] from the bus.
    pub fn delete_selected(&self, event: &dyn PointerGesture) -> GestureResult {
        let _span = tracing::debug_span!(
            target: "blockui.table",
            "table.gesture",
            gesture = "delete",
        )
        .entered();
        self.single_then_focus(event, TableCommand::DeleteSelectedCells)
    }

    /// Align the selected cells and refocus the surface on the next frame.
    ///
    /// # Errors
    ///
    /// [`CommandError`] from the bus.
    pub fn set_align(&self, event: &dyn PointerGesture, direction: Align) -> GestureResult {
        let _span = tracing::debug_span!(
            target: "blockui.table",
            "table.gesture",
            gesture = "align",
            direction = direction.as_str(),
        )
        .entered();
        self.single_then_focus(event, TableCommand::SetAlign { direction })
    }

    fn insert_line(
        &self,
        axis: Axis,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        let _span = tracing::debug_span!(
            target: "blockui.table",
            "table.gesture",
            gesture = "insert",
            axis = axis.as_str(),
        )
        .entered();
        event.prevent_default();

        let grid = match self.target(grid) {
            Ok(grid) => grid,
            Err(reason) => return Ok(skipped(reason)),
        };
        let Some(index) = hovered(self.line_hover.get(), axis) else {
            return Ok(skipped(SkipReason::NoHover));
        };
        let count = axis.count(grid);
        let Some(sequence) = insert_sequence(axis, grid.start_pos(), index, count) else {
            let reason = if count == 0 {
                SkipReason::EmptyGrid
            } else {
                SkipReason::OutOfRange { index, count }
            };
            return Ok(skipped(reason));
        };

        self.issue(&sequence)?;
        if axis == Axis::Row
            && let Some(line) = self.affordances.line(axis)
        {
            set_shown(&**line, false);
        }
        Ok(GestureOutcome::Applied {
            commands: sequence.len(),
        })
    }

    fn select_line(
        &self,
        axis: Axis,
        event: &dyn PointerGesture,
        grid: Option<&dyn GridElement>,
    ) -> GestureResult {
        let _span = tracing::debug_span!(
            target: "blockui.table",
            "table.gesture",
            gesture = "select",
            axis = axis.as_str(),
        )
        .entered();
        event.prevent_default();

        let Some(grid) = grid else {
            return Ok(skipped(SkipReason::NoGrid));
        };
        let Some(index) = hovered(self.cell_hover.get(), axis) else {
            return Ok(skipped(SkipReason::NoHover));
        };
        let count = axis.count(grid);
        if index >= count {
            return Ok(skipped(SkipReason::OutOfRange { index, count }));
        }

        self.issue(&[select_command(axis, grid.start_pos(), index)])?;
        // Header row has no action group.
        let header = axis == Axis::Row && index == 0;
        if !header && let Some(actions) = self.affordances.actions(axis) {
            toggle_shown(&**actions);
        }
        Ok(GestureOutcome::Applied { commands: 1 })
    }

    fn single_then_focus(
        &self,
        event: &dyn PointerGesture,
        command: TableCommand,
    ) -> GestureResult {
        event.prevent_default();
        if !self.surface.is_editable() {
            return Ok(skipped(SkipReason::NotEditable));
        }
        self.issue(&[command])?;

        let surface = Rc::clone(&self.surface);
        let _ = self.scheduler.request_frame(move || surface.focus());
        Ok(GestureOutcome::Applied { commands: 1 })
    }

    fn target<'g>(
        &self,
        grid: Option<&'g dyn GridElement>,
    ) -> Result<&'g dyn GridElement, SkipReason> {
        if !self.surface.is_editable() {
            return Err(SkipReason::NotEditable);
        }
        grid.ok_or(SkipReason::NoGrid)
    }

    fn issue(&self, commands: &[TableCommand]) -> Result<(), CommandError> {
        for command in commands {
            tracing::debug!(
                target: "blockui.table",
                command = %command,
                mutates = command.mutates_content(),
                "issue"
            );
            if let Err(err) = self.bus.call(command) {
                tracing::debug!(
                    target: "blockui.table",
                    command = command.id(),
                    error = %err,
                    "command failed; gesture aborted"
                );
                return Err(err);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for GridGestureTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridGestureTranslator")
            .field("affordances", &self.affordances)
            .field("cell_hover", &self.cell_hover.get())
            .field("line_hover", &self.line_hover.get())
            .finish()
    }
}

fn hovered(hover: HoverIndex, axis: Axis) -> Option<usize> {
    match axis {
        Axis::Row => hover.row_index(),
        Axis::Col => hover.col_index(),
    }
}

fn skipped(reason: SkipReason) -> GestureOutcome {
    tracing::trace!(target: "blockui.table", %reason, "gesture skipped");
    GestureOutcome::Skipped(reason)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use blockui_core::{
        EditorSurface, ElementId, ElementRef, Rect, SurfaceError, UiElement, element::SHOW_ATTR,
        is_shown,
    };

    use super::*;

    #[derive(Default)]
    struct Flagged {
        attrs: RefCell<HashMap<String, String>>,
    }

    impl UiElement for Flagged {
        fn id(&self) -> ElementId {
            ElementId::new(9)
        }
        fn bounding_rect(&self) -> Rect {
            Rect::default()
        }
        fn attribute(&self, name: &str) -> Option<String> {
            self.attrs.borrow().get(name).cloned()
        }
        fn set_attribute(&self, name: &str, value: Option<&str>) {
            match value {
                Some(v) => self.attrs.borrow_mut().insert(name.into(), v.into()),
                None => self.attrs.borrow_mut().remove(name),
            };
        }
        fn query_child(&self, _selector: &str) -> Option<ElementRef> {
            None
        }
        fn set_position(&self, _x: f64, _y: f64) {}
        fn append_child(&self, _child: ElementRef) {}
        fn detach(&self) {}
        fn is_attached(&self) -> bool {
            true
        }
    }

    struct Surface {
        editable: Cell<bool>,
        focused: Cell<u32>,
    }

    impl EditorSurface for Surface {
        fn is_editable(&self) -> bool {
            self.editable.get()
        }
        fn root(&self) -> Result<ElementRef, SurfaceError> {
            Err(SurfaceError::NotMounted)
        }
        fn default_container(&self) -> Result<ElementRef, SurfaceError> {
            Err(SurfaceError::NoContainer)
        }
        fn focus(&self) {
            self.focused.set(self.focused.get() + 1);
        }
    }

    #[derive(Default)]
    struct Log {
        calls: RefCell<Vec<TableCommand>>,
        fail_on: Cell<Option<&'static str>>,
    }

    impl CommandBus for Log {
        fn call(&self, command: &TableCommand) -> Result<(), CommandError> {
            if self.fail_on.get() == Some(command.id()) {
                return Err(CommandError::rejected(command, "test"));
            }
            self.calls.borrow_mut().push(*command);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Click {
        prevented: Cell<bool>,
    }

    impl PointerGesture for Click {
        fn prevent_default(&self) {
            self.prevented.set(true);
        }
    }

    struct Grid {
        rows: usize,
        cols: usize,
    }

    impl GridElement for Grid {
        fn document_position(&self) -> usize {
            10
        }
        fn row_count(&self) -> usize {
            self.rows
        }
        fn col_count(&self) -> usize {
            self.cols
        }
    }

    struct Setup {
        translator: GridGestureTranslator,
        surface: Rc<Surface>,
        bus: Rc<Log>,
        frames: FrameScheduler,
        row_line: Rc<Flagged>,
        row_actions: Rc<Flagged>,
        col_actions: Rc<Flagged>,
    }

    fn setup() -> Setup {
        let surface = Rc::new(Surface {
            editable: Cell::new(true),
            focused: Cell::new(0),
        });
        let bus = Rc::new(Log::default());
        let frames = FrameScheduler::new();
        let row_line = Rc::new(Flagged::default());
        let row_actions = Rc::new(Flagged::default());
        let col_actions = Rc::new(Flagged::default());
        let translator = GridGestureTranslator::new(surface.clone(), bus.clone(), frames.clone())
            .with_affordances(
                Affordances::new()
                    .with_row_line(row_line.clone())
                    .with_row_actions(row_actions.clone())
                    .with_col_actions(col_actions.clone()),
            );
        Setup {
            translator,
            surface,
            bus,
            frames,
            row_line,
            row_actions,
            col_actions,
        }
    }

    fn grid(rows: usize, cols: usize) -> Grid {
        Grid { rows, cols }
    }

    #[test]
    fn append_row_selects_previous_then_inserts_after() {
        let s = setup();
        s.translator.set_line_hover(HoverIndex::row_line(3));
        let out = s.translator.insert_row(&Click::default(), Some(&grid(3, 2)));
        assert_eq!(out, Ok(GestureOutcome::Applied { commands: 3 }));
        assert_eq!(
            *s.bus.calls.borrow(),
            vec![
                TableCommand::SelectRow { pos: 11, index: 2 },
                TableCommand::InsertRowAfter,
                TableCommand::SelectRow { pos: 11, index: 3 },
            ]
        );
    }

    #[test]
    fn inner_row_selects_current_then_inserts_before() {
        let s = setup();
        s.translator.set_line_hover(HoverIndex::row_line(1));
        s.translator
            .insert_row(&Click::default(), Some(&grid(3, 2)))
            .unwrap();
        assert_eq!(
            *s.bus.calls.borrow(),
            vec![
                TableCommand::SelectRow { pos: 11, index: 1 },
                TableCommand::InsertRowBefore,
                TableCommand::SelectRow { pos: 11, index: 1 },
            ]
        );
    }

    #[test]
    fn insert_row_hides_line_handle_but_insert_col_does_not() {
        let s = setup();
        let col_line = Rc::new(Flagged::default());
        set_shown(&*col_line, true);
        set_shown(&*s.row_line, true);
        let translator = GridGestureTranslator::new(s.surface.clone(), s.bus.clone(), s.frames)
            .with_affordances(
                Affordances::new()
                    .with_row_line(s.row_line.clone())
                    .with_col_line(col_line.clone()),
            );

        translator.set_line_hover(HoverIndex::col_line(0));
        translator
            .insert_col(&Click::default(), Some(&grid(2, 2)))
            .unwrap();
        assert!(is_shown(&*col_line));

        translator.set_line_hover(HoverIndex::row_line(0));
        translator
            .insert_row(&Click::default(), Some(&grid(2, 2)))
            .unwrap();
        assert!(!is_shown(&*s.row_line));
    }

    #[test]
    fn insert_prevents_default_even_when_skipped() {
        let s = setup();
        let click = Click::default();
        let out = s.translator.insert_row(&click, Some(&grid(3, 3)));
        assert_eq!(out, Ok(GestureOutcome::Skipped(SkipReason::NoHover)));
        assert!(click.prevented.get());
        assert!(s.bus.calls.borrow().is_empty());
    }

    #[test]
    fn insert_rejects_missing_grid_and_out_of_range() {
        let s = setup();
        s.translator.set_line_hover(HoverIndex::row_line(5));
        assert_eq!(
            s.translator.insert_row(&Click::default(), None),
            Ok(GestureOutcome::Skipped(SkipReason::NoGrid))
        );
        assert_eq!(
            s.translator.insert_row(&Click::default(), Some(&grid(3, 3))),
            Ok(GestureOutcome::Skipped(SkipReason::OutOfRange { index: 5, count: 3 }))
        );
        assert!(s.bus.calls.borrow().is_empty());
    }

    #[test]
    fn insert_sequence_rejects_empty_grid() {
        assert_eq!(insert_sequence(Axis::Row, 1, 0, 0), None);
        assert_eq!(insert_sequence(Axis::Col, 1, 4, 3), None);
    }

    #[test]
    fn bus_failure_aborts_remaining_commands() {
        let s = setup();
        s.bus.fail_on.set(Some("insert-row-before"));
        s.translator.set_line_hover(HoverIndex::row_line(0));
        set_shown(&*s.row_line, true);
        let err = s
            .translator
            .insert_row(&Click::default(), Some(&grid(2, 2)))
            .unwrap_err();
        assert_eq!(
            err,
            CommandError::rejected(&TableCommand::InsertRowBefore, "test")
        );
        assert_eq!(
            *s.bus.calls.borrow(),
            vec![TableCommand::SelectRow { pos: 11, index: 0 }]
        );
        assert!(is_shown(&*s.row_line));
    }

    #[test]
    fn header_row_select_does_not_toggle_actions() {
        let s = setup();
        s.translator.set_cell_hover(HoverIndex::new(0, 1));
        s.translator
            .select_row(&Click::default(), Some(&grid(3, 3)))
            .unwrap();
        assert_eq!(s.row_actions.attribute(SHOW_ATTR), None);

        s.translator.set_cell_hover(HoverIndex::new(2, 1));
        s.translator
            .select_row(&Click::default(), Some(&grid(3, 3)))
            .unwrap();
        assert!(s.row_actions.attribute(SHOW_ATTR).is_some());
    }

    #[test]
    fn select_col_toggles_even_at_zero() {
        let s = setup();
        s.translator.set_cell_hover(HoverIndex::new(0, 0));
        s.translator
            .select_col(&Click::default(), Some(&grid(3, 3)))
            .unwrap();
        assert_eq!(
            *s.bus.calls.borrow(),
            vec![TableCommand::SelectCol { pos: 11, index: 0 }]
        );
        assert!(s.col_actions.attribute(SHOW_ATTR).is_some());
    }

    #[test]
    fn select_works_on_read_only_surface() {
        let s = setup();
        s.surface.editable.set(false);
        s.translator.set_cell_hover(HoverIndex::new(1, 1));
        let out = s.translator.select_row(&Click::default(), Some(&grid(3, 3)));
        assert_eq!(out, Ok(GestureOutcome::Applied { commands: 1 }));
        s.translator.set_line_hover(HoverIndex::row_line(1));
        let out = s.translator.insert_row(&Click::default(), Some(&grid(3, 3)));
        assert_eq!(out, Ok(GestureOutcome::Skipped(SkipReason::NotEditable)));
        assert_eq!(
            *s.bus.calls.borrow(),
            vec![TableCommand::SelectRow { pos: 11, index: 1 }]
        );
    }

    #[test]
    fn delete_refocuses_on_next_frame() {
        let s = setup();
        let out = s.translator.delete_selected(&Click::default()).unwrap();
        assert!(matches!(out, GestureOutcome::Applied { .. }));
        assert_eq!(s.surface.focused.get(), 0);
        s.frames.run_frame();
        assert_eq!(s.surface.focused.get(), 1);
    }

    #[test]
    fn align_skipped_when_read_only() {
        let s = setup();
        s.surface.editable.set(false);
        let out = s
            .translator
            .set_align(&Click::default(), Align::Center)
            .unwrap();
        assert_eq!(out, GestureOutcome::Skipped(SkipReason::NotEditable));
        assert_eq!(s.frames.pending(), 0);
        assert!(s.bus.calls.borrow().is_empty());
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(
            SkipReason::OutOfRange { index: 4, count: 2 }.to_string(),
            "index 4 outside grid of 2"
        );
    }
}
