#![forbid(unsafe_code)]

//! Live grid queries, hover indices, and table affordance elements.

use std::fmt;

use blockui_core::ElementRef;

/// A table-shaped structural node, queried live at gesture time.
///
/// Counts are never cached by the translator; the grid may have changed
/// since the affordances were last rendered.
pub trait GridElement {
    /// Document offset of the grid node itself.
    fn document_position(&self) -> usize;

    fn row_count(&self) -> usize;

    fn col_count(&self) -> usize;

    /// Offset of the grid's start, as select commands expect it.
    fn start_pos(&self) -> usize {
        self.document_position() + 1
    }
}

/// Hovered `(row, col)`, `-1` on an axis meaning nothing hovered.
///
/// For gridline hover only one axis is meaningful: the row index over a row
/// gutter, the column index over a column gutter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HoverIndex {
    pub row: isize,
    pub col: isize,
}

impl HoverIndex {
    pub const NONE: HoverIndex = HoverIndex { row: -1, col: -1 };

    pub const fn new(row: isize, col: isize) -> Self {
        Self { row, col }
    }

    /// Gridline hover over a row gutter.
    pub const fn row_line(row: isize) -> Self {
        Self { row, col: -1 }
    }

    /// Gridline hover over a column gutter.
    pub const fn col_line(col: isize) -> Self {
        Self { row: -1, col }
    }

    pub fn is_none(&self) -> bool {
        self.row < 0 && self.col < 0
    }

    /// Row as an index, `None` when negative.
    pub fn row_index(&self) -> Option<usize> {
        usize::try_from(self.row).ok()
    }

    /// Column as an index, `None` when negative.
    pub fn col_index(&self) -> Option<usize> {
        usize::try_from(self.col).ok()
    }
}

impl Default for HoverIndex {
    fn default() -> Self {
        Self::NONE
    }
}

/// Which axis a gesture operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Col,
}

impl Axis {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Row => "row",
            Self::Col => "col",
        }
    }

    /// Live count along this axis.
    pub fn count(self, grid: &dyn GridElement) -> usize {
        match self {
            Self::Row => grid.row_count(),
            Self::Col => grid.col_count(),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overlay elements rendered around a table. Any may be absent.
#[derive(Clone, Default)]
pub struct Affordances {
    /// Gridline insertion handle on the row gutter.
    pub row_line: Option<ElementRef>,
    /// Gridline insertion handle on the column gutter.
    pub col_line: Option<ElementRef>,
    /// Contextual buttons shown after selecting a row.
    pub row_actions: Option<ElementRef>,
    /// Contextual buttons shown after selecting a column.
    pub col_actions: Option<ElementRef>,
}

impl Affordances {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_row_line(mut self, el: ElementRef) -> Self {
        self.row_line = Some(el);
        self
    }

    #[must_use]
    pub fn with_col_line(mut self, el: ElementRef) -> Self {
        self.col_line = Some(el);
        self
    }

    #[must_use]
    pub fn with_row_actions(mut self, el: ElementRef) -> Self {
        self.row_actions = Some(el);
        self
    }

    #[must_use]
    pub fn with_col_actions(mut self, el: ElementRef) -> Self {
        self.col_actions = Some(el);
        self
    }

    pub(crate) fn line(&self, axis: Axis) -> Option<&ElementRef> {
        match axis {
            Axis::Row => self.row_line.as_ref(),
            Axis::Col => self.col_line.as_ref(),
        }
    }

    pub(crate) fn actions(&self, axis: Axis) -> Option<&ElementRef> {
        match axis {
            Axis::Row => self.row_actions.as_ref(),
            Axis::Col => self.col_actions.as_ref(),
        }
    }
}

impl fmt::Debug for Affordances {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let id = |el: &Option<ElementRef>| el.as_ref().map(|e| e.id());
        f.debug_struct("Affordances")
            .field("row_line", &id(&self.row_line))
            .field("col_line", &id(&self.col_line))
            .field("row_actions", &id(&self.row_actions))
            .field("col_actions", &id(&self.col_actions))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Grid(usize, usize, usize);

    impl GridElement for Grid {
        fn document_position(&self) -> usize {
            self.0
        }
        fn row_count(&self) -> usize {
            self.1
        }
        fn col_count(&self) -> usize {
            self.2
        }
    }

    #[test]
    fn start_pos_is_one_past_node() {
        assert_eq!(Grid(41, 2, 2).start_pos(), 42);
    }

    #[test]
    fn hover_none_by_default() {
        let hover = HoverIndex::default();
        assert!(hover.is_none());
        assert_eq!(hover.row_index(), None);
        assert_eq!(hover.col_index(), None);
    }

    #[test]
    fn line_hover_sets_one_axis() {
        let row = HoverIndex::row_line(3);
        assert_eq!(row.row_index(), Some(3));
        assert_eq!(row.col_index(), None);
        assert!(!row.is_none());
        assert_eq!(HoverIndex::col_line(0).col_index(), Some(0));
    }

    #[test]
    fn axis_count_reads_live_grid() {
        let grid = Grid(0, 4, 7);
        assert_eq!(Axis::Row.count(&grid), 4);
        assert_eq!(Axis::Col.count(&grid), 7);
    }
}
