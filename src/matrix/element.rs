//! Matrix elements and their arena handles.

/// Handle to an element stored in a [`SparseMatrix`](super::SparseMatrix).
///
/// Handles stay valid for the lifetime of the matrix: elements are never
/// removed, and row/column swaps relink elements without moving them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// The shared sink for every location in row 0 or column 0.
    pub const TRASH: ElementId = ElementId(0);

    /// Position of this element in the matrix arena.
    pub fn index(self) -> usize {
        self.0
    }

    /// Whether this handle refers to the trash-can element.
    pub fn is_trash(self) -> bool {
        self.0 == 0
    }
}

/// A single structural nonzero.
///
/// Within a row, elements are linked through `left`/`right` in ascending
/// column order. Within a column, they are linked through `above`/`below`
/// in ascending row order.
#[derive(Debug, Clone)]
pub struct Element<T> {
    pub(crate) value: T,
    pub(crate) row: usize,
    pub(crate) column: usize,
    pub(crate) left: Option<ElementId>,
    pub(crate) right: Option<ElementId>,
    pub(crate) above: Option<ElementId>,
    pub(crate) below: Option<ElementId>,
}

impl<T: Copy> Element<T> {
    pub(crate) fn new(row: usize, column: usize, value: T) -> Self {
        Self {
            value,
            row,
            column,
            left: None,
            right: None,
            above: None,
            below: None,
        }
    }

    pub fn value(&self) -> T {
        self.value
    }

    /// Current (internal) row of the element.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Current (internal) column of the element.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Previous element in the same row.
    pub fn left(&self) -> Option<ElementId> {
        self.left
    }

    /// Next element in the same row.
    pub fn right(&self) -> Option<ElementId> {
        self.right
    }

    /// Previous element in the same column.
    pub fn above(&self) -> Option<ElementId> {
        self.above
    }

    /// Next element in the same column.
    pub fn below(&self) -> Option<ElementId> {
        self.below
    }
}

/// Direction of a line of elements.
///
/// A `Row` line is sorted by column and linked left/right; a `Column` line
/// is sorted by row and linked above/below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    Row,
    Column,
}

impl Axis {
    pub(crate) fn other(self) -> Self {
        match self {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        }
    }
}

impl<T> Element<T> {
    /// Index of the line this element belongs to along `axis`.
    pub(crate) fn line(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.column,
        }
    }

    /// Sort key of this element inside its `axis` line.
    pub(crate) fn key(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.column,
            Axis::Column => self.row,
        }
    }

    pub(crate) fn set_line(&mut self, axis: Axis, index: usize) {
        match axis {
            Axis::Row => self.row = index,
            Axis::Column => self.column = index,
        }
    }

    pub(crate) fn next(&self, axis: Axis) -> Option<ElementId> {
        match axis {
            Axis::Row => self.right,
            Axis::Column => self.below,
        }
    }

    pub(crate) fn prev(&self, axis: Axis) -> Option<ElementId> {
        match axis {
            Axis::Row => self.left,
            Axis::Column => self.above,
        }
    }

    pub(crate) fn set_next(&mut self, axis: Axis, id: Option<ElementId>) {
        match axis {
            Axis::Row => self.right = id,
            Axis::Column => self.below = id,
        }
    }

    pub(crate) fn set_prev(&mut self, axis: Axis, id: Option<ElementId>) {
        match axis {
            Axis::Row => self.left = id,
            Axis::Column => self.above = id,
        }
    }
}
