//! Linked sparse matrix grid.

use std::fmt;
use std::ops::Index;

use super::element::{Axis, Element, ElementId};
use crate::error::{Result, SparseError};
use crate::numeric::Scalar;

/// First and last element of a row or column.
#[derive(Debug, Clone, Copy, Default)]
struct Line {
    first: Option<ElementId>,
    last: Option<ElementId>,
}

/// A square sparse matrix stored as a grid of sorted linked lists.
///
/// Elements live in an arena and are addressed by [`ElementId`]. Index 0 of
/// the arena is the trash-can element, returned for any location in row 0
/// or column 0 and never linked into a line.
#[derive(Debug, Clone)]
pub struct SparseMatrix<T> {
    size: usize,
    elements: Vec<Element<T>>,
    rows: Vec<Line>,
    columns: Vec<Line>,
    diagonal: Vec<Option<ElementId>>,
    fillins: usize,
    scratch: Vec<ElementId>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Create an empty `size` x `size` matrix.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            elements: vec![Element::new(0, 0, T::zero())],
            rows: vec![Line::default(); size + 1],
            columns: vec![Line::default(); size + 1],
            diagonal: vec![None; size + 1],
            fillins: 0,
            scratch: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of structural elements, excluding the trash can.
    pub fn len(&self) -> usize {
        self.elements.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements created by elimination.
    pub fn fillins(&self) -> usize {
        self.fillins
    }

    fn check_range(&self, row: usize, column: usize) -> Result<()> {
        if row > self.size || column > self.size {
            return Err(SparseError::IndexOutOfRange {
                row,
                column,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Get the element at a location, creating it if it does not exist.
    pub fn get_element(&mut self, row: usize, column: usize) -> Result<ElementId> {
        self.check_range(row, column)?;
        if row == 0 || column == 0 {
            return Ok(ElementId::TRASH);
        }
        if let Some(id) = self.find_element(row, column) {
            return Ok(id);
        }
        Ok(self.insert(row, column))
    }

    /// Find the element at a location without creating it.
    pub fn find_element(&self, row: usize, column: usize) -> Option<ElementId> {
        if row == 0 || column == 0 || row > self.size || column > self.size {
            return None;
        }
        if row == column {
            return self.diagonal[row];
        }
        // Lines are sorted, so the tail bounds the search
        let last = self.rows[row].last?;
        if self.elements[last.0].column < column {
            return None;
        }
        self.row_iter(row)
            .take_while(|&id| self.elements[id.0].column <= column)
            .find(|&id| self.elements[id.0].column == column)
    }

    /// Insert an element created by elimination.
    pub(crate) fn create_fillin(&mut self, row: usize, column: usize) -> ElementId {
        self.fillins += 1;
        self.insert(row, column)
    }

    fn insert(&mut self, row: usize, column: usize) -> ElementId {
        let id = ElementId(self.elements.len());
        self.elements.push(Element::new(row, column, T::zero()));
        self.link_sorted(id, Axis::Row);
        self.link_sorted(id, Axis::Column);
        if row == column {
            self.diagonal[row] = Some(id);
        }
        id
    }

    fn line(&self, axis: Axis, index: usize) -> &Line {
        match axis {
            Axis::Row => &self.rows[index],
            Axis::Column => &self.columns[index],
        }
    }

    fn line_mut(&mut self, axis: Axis, index: usize) -> &mut Line {
        match axis {
            Axis::Row => &mut self.rows[index],
            Axis::Column => &mut self.columns[index],
        }
    }

    /// Splice an unlinked element into its `axis` line in sorted position.
    fn link_sorted(&mut self, id: ElementId, axis: Axis) {
        let line_index = self.elements[id.0].line(axis);
        let key = self.elements[id.0].key(axis);
        let line = *self.line(axis, line_index);

        let (prev, next) = match line.last {
            // Appending is the common case while stamping in order
            Some(last) if self.elements[last.0].key(axis) < key => (Some(last), None),
            _ => {
                let mut prev = None;
                let mut cursor = line.first;
                while let Some(current) = cursor {
                    if self.elements[current.0].key(axis) >= key {
                        break;
                    }
                    prev = Some(current);
                    cursor = self.elements[current.0].next(axis);
                }
                (prev, cursor)
            }
        };

        self.elements[id.0].set_prev(axis, prev);
        self.elements[id.0].set_next(axis, next);
        match prev {
            Some(p) => self.elements[p.0].set_next(axis, Some(id)),
            None => self.line_mut(axis, line_index).first = Some(id),
        }
        match next {
            Some(n) => self.elements[n.0].set_prev(axis, Some(id)),
            None => self.line_mut(axis, line_index).last = Some(id),
        }
    }

    /// Remove an element from its `axis` line, leaving it unlinked along that axis.
    fn unlink(&mut self, id: ElementId, axis: Axis) {
        let line_index = self.elements[id.0].line(axis);
        let prev = self.elements[id.0].prev(axis);
        let next = self.elements[id.0].next(axis);
        match prev {
            Some(p) => self.elements[p.0].set_next(axis, next),
            None => self.line_mut(axis, line_index).first = next,
        }
        match next {
            Some(n) => self.elements[n.0].set_prev(axis, prev),
            None => self.line_mut(axis, line_index).last = prev,
        }
        self.elements[id.0].set_prev(axis, None);
        self.elements[id.0].set_next(axis, None);
    }

    /// Exchange two lines along `axis`, renumbering every moved element.
    fn swap_lines(&mut self, axis: Axis, a: usize, b: usize) {
        if a == b {
            return;
        }
        let cross = axis.other();

        let mut moved = std::mem::take(&mut self.scratch);
        moved.clear();
        for index in [a, b] {
            let mut cursor = self.line(axis, index).first;
            while let Some(id) = cursor {
                moved.push(id);
                cursor = self.elements[id.0].next(axis);
            }
        }

        for &id in &moved {
            self.unlink(id, cross);
        }

        match axis {
            Axis::Row => self.rows.swap(a, b),
            Axis::Column => self.columns.swap(a, b),
        }
        self.diagonal[a] = None;
        self.diagonal[b] = None;

        for &id in &moved {
            let element = &mut self.elements[id.0];
            let target = if element.line(axis) == a { b } else { a };
            element.set_line(axis, target);
            self.link_sorted(id, cross);
            let element = &self.elements[id.0];
            if element.row == element.column {
                self.diagonal[element.row] = Some(id);
            }
        }

        self.scratch = moved;
    }

    /// Exchange two rows.
    pub(crate) fn swap_rows(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_range(a, 0)?;
        self.check_range(b, 0)?;
        self.swap_lines(Axis::Row, a, b);
        Ok(())
    }

    /// Exchange two columns.
    pub(crate) fn swap_columns(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_range(0, a)?;
        self.check_range(0, b)?;
        self.swap_lines(Axis::Column, a, b);
        Ok(())
    }

    /// Set every value to zero. The structure is kept.
    pub fn reset(&mut self) {
        for element in &mut self.elements {
            element.value = T::zero();
        }
    }

    pub fn first_in_row(&self, row: usize) -> Option<ElementId> {
        self.rows.get(row).and_then(|line| line.first)
    }

    pub fn last_in_row(&self, row: usize) -> Option<ElementId> {
        self.rows.get(row).and_then(|line| line.last)
    }

    pub fn first_in_column(&self, column: usize) -> Option<ElementId> {
        self.columns.get(column).and_then(|line| line.first)
    }

    pub fn last_in_column(&self, column: usize) -> Option<ElementId> {
        self.columns.get(column).and_then(|line| line.last)
    }

    /// Diagonal element of row/column `index`, if present.
    pub fn diagonal(&self, index: usize) -> Option<ElementId> {
        self.diagonal.get(index).copied().flatten()
    }

    /// Iterate the elements of a row from left to right.
    pub fn row_iter(&self, row: usize) -> LineIter<'_, T> {
        LineIter {
            matrix: self,
            cursor: self.first_in_row(row),
            axis: Axis::Row,
        }
    }

    /// Iterate the elements of a column from top to bottom.
    pub fn column_iter(&self, column: usize) -> LineIter<'_, T> {
        LineIter {
            matrix: self,
            cursor: self.first_in_column(column),
            axis: Axis::Column,
        }
    }

    /// Iterate the elements following `id` in its row.
    pub fn right_of(&self, id: ElementId) -> LineIter<'_, T> {
        LineIter {
            matrix: self,
            cursor: self.elements[id.0].right,
            axis: Axis::Row,
        }
    }

    /// Iterate the elements following `id` in its column.
    pub fn below(&self, id: ElementId) -> LineIter<'_, T> {
        LineIter {
            matrix: self,
            cursor: self.elements[id.0].below,
            axis: Axis::Column,
        }
    }

    pub fn value(&self, id: ElementId) -> T {
        self.elements[id.0].value
    }

    pub fn value_mut(&mut self, id: ElementId) -> &mut T {
        &mut self.elements[id.0].value
    }

    pub fn set_value(&mut self, id: ElementId, value: T) {
        self.elements[id.0].value = value;
    }
}

impl<T> Index<ElementId> for SparseMatrix<T> {
    type Output = Element<T>;

    fn index(&self, id: ElementId) -> &Self::Output {
        &self.elements[id.0]
    }
}

/// Iterator over one row or column.
pub struct LineIter<'a, T> {
    matrix: &'a SparseMatrix<T>,
    cursor: Option<ElementId>,
    axis: Axis,
}

impl<'a, T> Iterator for LineIter<'a, T> {
    type Item = ElementId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.matrix.elements[id.0].next(self.axis);
        Some(id)
    }
}

impl<T: Scalar> fmt::Display for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 1..=self.size {
            let mut column = 1;
            for id in self.row_iter(row) {
                let element = &self.elements[id.0];
                while column < element.column {
                    write!(f, "{:>14}", ".")?;
                    column += 1;
                }
                write!(f, "{:>14}", element.value.to_string())?;
                column += 1;
            }
            while column <= self.size {
                write!(f, "{:>14}", ".")?;
                column += 1;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Check that every line is sorted, doubly linked and agrees with the
    /// element coordinates.
    fn assert_consistent(matrix: &SparseMatrix<f64>) {
        let mut seen = 0;
        for row in 1..=matrix.size() {
            let mut prev: Option<ElementId> = None;
            for id in matrix.row_iter(row) {
                let element = &matrix[id];
                assert_eq!(element.row(), row);
                assert_eq!(element.left(), prev);
                if let Some(p) = prev {
                    assert!(matrix[p].column() < element.column());
                }
                prev = Some(id);
                seen += 1;
            }
            assert_eq!(matrix.last_in_row(row), prev);
        }
        for column in 1..=matrix.size() {
            let mut prev: Option<ElementId> = None;
            for id in matrix.column_iter(column) {
                let element = &matrix[id];
                assert_eq!(element.column(), column);
                assert_eq!(element.above(), prev);
                if let Some(p) = prev {
                    assert!(matrix[p].row() < element.row());
                }
                prev = Some(id);
            }
            assert_eq!(matrix.last_in_column(column), prev);
        }
        for index in 1..=matrix.size() {
            let expected = matrix
                .row_iter(index)
                .find(|&id| matrix[id].column() == index);
            assert_eq!(matrix.diagonal(index), expected);
        }
        assert_eq!(seen, matrix.len());
    }

    fn dense(matrix: &SparseMatrix<f64>) -> Vec<Vec<f64>> {
        let n = matrix.size();
        let mut out = vec![vec![0.0; n + 1]; n + 1];
        for row in 1..=n {
            for id in matrix.row_iter(row) {
                out[row][matrix[id].column()] = matrix.value(id);
            }
        }
        out
    }

    #[test]
    fn test_get_element_creates_once() {
        let mut matrix = SparseMatrix::<f64>::new(3);
        let a = matrix.get_element(2, 3).unwrap();
        let b = matrix.get_element(2, 3).unwrap();
        assert_eq!(a, b);
        assert_eq!(matrix.len(), 1);
        assert_eq!(matrix.find_element(2, 3), Some(a));
        assert_eq!(matrix.find_element(3, 2), None);
    }

    #[test]
    fn test_ground_maps_to_trash() {
        let mut matrix = SparseMatrix::<f64>::new(2);
        assert_eq!(matrix.get_element(0, 1).unwrap(), ElementId::TRASH);
        assert_eq!(matrix.get_element(2, 0).unwrap(), ElementId::TRASH);
        assert!(matrix.is_empty());
        assert_eq!(matrix.first_in_row(0), None);
    }

    #[test]
    fn test_out_of_range() {
        let mut matrix = SparseMatrix::<f64>::new(2);
        let err = matrix.get_element(3, 1).unwrap_err();
        assert!(matches!(
            err,
            SparseError::IndexOutOfRange {
                row: 3,
                column: 1,
                size: 2
            }
        ));
    }

    #[test]
    fn test_unordered_insertion_is_sorted() {
        let mut matrix = SparseMatrix::<f64>::new(4);
        for &(r, c) in &[(2, 4), (2, 1), (4, 2), (1, 2), (2, 2), (3, 3), (2, 3)] {
            matrix.get_element(r, c).unwrap();
        }
        assert_consistent(&matrix);
        let columns: Vec<usize> = matrix.row_iter(2).map(|id| matrix[id].column()).collect();
        assert_eq!(columns, vec![1, 2, 3, 4]);
        let rows: Vec<usize> = matrix.column_iter(2).map(|id| matrix[id].row()).collect();
        assert_eq!(rows, vec![1, 2, 4]);
    }

    #[test]
    fn test_swap_rows_and_columns() {
        let mut matrix = SparseMatrix::<f64>::new(4);
        let entries = [
            (1, 1, 1.0),
            (1, 3, 2.0),
            (2, 2, 3.0),
            (2, 4, 4.0),
            (3, 1, 5.0),
            (3, 3, 6.0),
            (4, 2, 7.0),
            (4, 3, 8.0),
        ];
        for &(r, c, v) in &entries {
            let id = matrix.get_element(r, c).unwrap();
            matrix.set_value(id, v);
        }
        let before = dense(&matrix);

        matrix.swap_rows(1, 4).unwrap();
        assert_consistent(&matrix);
        let after = dense(&matrix);
        for c in 1..=4 {
            assert_eq!(after[1][c], before[4][c]);
            assert_eq!(after[4][c], before[1][c]);
            assert_eq!(after[2][c], before[2][c]);
        }

        matrix.swap_columns(2, 3).unwrap();
        assert_consistent(&matrix);
        let swapped = dense(&matrix);
        for r in 1..=4 {
            assert_eq!(swapped[r][2], after[r][3]);
            assert_eq!(swapped[r][3], after[r][2]);
        }

        // Swapping back restores the original layout
        matrix.swap_columns(3, 2).unwrap();
        matrix.swap_rows(4, 1).unwrap();
        assert_consistent(&matrix);
        assert_eq!(dense(&matrix), before);
    }

    #[test]
    fn test_swap_keeps_handles() {
        let mut matrix = SparseMatrix::<f64>::new(3);
        let id = matrix.get_element(1, 2).unwrap();
        matrix.set_value(id, 9.0);
        matrix.swap_rows(1, 3).unwrap();
        assert_eq!(matrix[id].row(), 3);
        assert_eq!(matrix.find_element(3, 2), Some(id));
        matrix.swap_columns(2, 3).unwrap();
        assert_eq!(matrix.diagonal(3), Some(id));
        assert_eq!(matrix.value(id), 9.0);
    }

    #[test]
    fn test_swap_out_of_range() {
        let mut matrix = SparseMatrix::<f64>::new(3);
        let id = matrix.get_element(1, 2).unwrap();
        assert!(matches!(
            matrix.swap_rows(1, 4),
            Err(SparseError::IndexOutOfRange { row: 4, size: 3, .. })
        ));
        assert!(matches!(
            matrix.swap_columns(5, 2),
            Err(SparseError::IndexOutOfRange { column: 5, size: 3, .. })
        ));
        // Nothing moved
        assert_eq!(matrix.find_element(1, 2), Some(id));
        assert_consistent(&matrix);
    }

    #[test]
    fn test_reset_keeps_structure() {
        let mut matrix = SparseMatrix::<f64>::new(2);
        let id = matrix.get_element(1, 1).unwrap();
        *matrix.value_mut(id) += 2.0;
        *matrix.value_mut(ElementId::TRASH) += 1.0;
        matrix.reset();
        assert_eq!(matrix.value(id), 0.0);
        assert_eq!(matrix.value(ElementId::TRASH), 0.0);
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn test_display_dense_view() {
        let mut matrix = SparseMatrix::<f64>::new(2);
        let id = matrix.get_element(2, 1).unwrap();
        matrix.set_value(id, 1.5);
        let text = matrix.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("1.5"));
        assert_eq!(lines[0].matches('.').count(), 2);
    }
}
