//! Markowitz row/column counts over the reduced submatrix.

use super::MAX_MARKOWITZ_COUNT;
use crate::matrix::{ElementId, SparseMatrix, SparseVector};
use crate::numeric::Scalar;

/// Per-index nonzero counts for the not-yet-pivoted part of the matrix.
///
/// Rows and columns store the number of reduced elements, where an existing
/// right-hand side entry counts toward its row. The Markowitz count of a
/// line is that number minus one, clamped at zero. `singletons` is the
/// number of indices from the current step up to `limit` whose product is
/// zero.
///
/// Only indices up to the search limit are tracked, but their counts
/// include elements lying beyond it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkowitzCounts {
    row: Vec<usize>,
    column: Vec<usize>,
    product: Vec<usize>,
    singletons: usize,
    limit: usize,
}

/// Product of two counts, each capped so the result fits in 32 bits.
pub(crate) fn capped_product(row: usize, column: usize) -> usize {
    row.min(MAX_MARKOWITZ_COUNT) * column.min(MAX_MARKOWITZ_COUNT)
}

impl MarkowitzCounts {
    pub fn row_count(&self, index: usize) -> usize {
        self.row[index].saturating_sub(1)
    }

    pub fn column_count(&self, index: usize) -> usize {
        self.column[index].saturating_sub(1)
    }

    pub fn product(&self, index: usize) -> usize {
        self.product[index]
    }

    pub fn singletons(&self) -> usize {
        self.singletons
    }

    /// Last tracked index.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Product for an arbitrary element position.
    pub fn product_at(&self, row: usize, column: usize) -> usize {
        capped_product(self.row_count(row), self.column_count(column))
    }

    /// Count the reduced submatrix from scratch, tracking `step..=limit`.
    pub(crate) fn setup<T: Scalar>(
        &mut self,
        matrix: &SparseMatrix<T>,
        rhs: &SparseVector<T>,
        step: usize,
        limit: usize,
    ) {
        let size = matrix.size();
        self.limit = limit.min(size);
        self.row.clear();
        self.row.resize(size + 1, 0);
        self.column.clear();
        self.column.resize(size + 1, 0);
        self.product.clear();
        self.product.resize(size + 1, 0);

        for index in step..=self.limit {
            let in_row = matrix
                .row_iter(index)
                .filter(|&id| matrix[id].column >= step)
                .count();
            let live_rhs = usize::from(rhs.is_live(index));
            self.row[index] = in_row + live_rhs;

            let in_column = matrix
                .column_iter(index)
                .filter(|&id| matrix[id].row >= step)
                .count();
            self.column[index] = in_column;
        }

        self.singletons = 0;
        for index in step..=self.limit {
            self.product[index] = self.product_at(index, index);
            if self.product[index] == 0 {
                self.singletons += 1;
            }
        }
    }

    /// Recompute a product and keep the singleton count in step with it.
    fn refresh(&mut self, index: usize) {
        let was_singleton = self.product[index] == 0;
        self.product[index] = self.product_at(index, index);
        let is_singleton = self.product[index] == 0;
        match (was_singleton, is_singleton) {
            (false, true) => self.singletons += 1,
            (true, false) => self.singletons = self.singletons.saturating_sub(1),
            _ => {}
        }
    }

    /// Bring the pivot's counts to position `step` ahead of the row/column swap.
    pub(crate) fn move_pivot(&mut self, row: usize, column: usize, step: usize) {
        self.row.swap(row, step);
        self.column.swap(column, step);
        self.refresh(row);
        self.refresh(column);
        self.refresh(step);

        // Index `step` leaves the reduced submatrix
        if self.product[step] == 0 {
            self.singletons = self.singletons.saturating_sub(1);
        }
    }

    /// Account for the pivot row and column leaving the reduced submatrix.
    pub(crate) fn update<T: Scalar>(&mut self, matrix: &SparseMatrix<T>, pivot: ElementId) {
        let limit = self.limit;
        for id in matrix.below(pivot).take_while(|&id| matrix[id].row <= limit) {
            let row = matrix[id].row;
            self.row[row] = self.row[row].saturating_sub(1);
            self.refresh(row);
        }
        for id in matrix.right_of(pivot).take_while(|&id| matrix[id].column <= limit) {
            let column = matrix[id].column;
            self.column[column] = self.column[column].saturating_sub(1);
            self.refresh(column);
        }
    }

    /// A fill-in adds one element to its row and to its column.
    pub(crate) fn create_fillin(&mut self, row: usize, column: usize) {
        if row <= self.limit {
            self.row[row] += 1;
            self.refresh(row);
        }
        if column <= self.limit {
            self.column[column] += 1;
            self.refresh(column);
        }
    }

    /// Restrict a comparison to the tracked indices still in the reduced submatrix.
    #[cfg(test)]
    pub(crate) fn reduced(&self, step: usize) -> (Vec<usize>, Vec<usize>, Vec<usize>, usize) {
        let range = step..=self.limit;
        (
            self.row[range.clone()].to_vec(),
            self.column[range.clone()].to_vec(),
            self.product[range].to_vec(),
            self.singletons,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(entries: &[(usize, usize)], size: usize) -> SparseMatrix<f64> {
        let mut matrix = SparseMatrix::new(size);
        for &(r, c) in entries {
            let id = matrix.get_element(r, c).unwrap();
            matrix.set_value(id, 1.0);
        }
        matrix
    }

    #[test]
    fn test_setup_counts() {
        // [x x .]
        // [x x x]
        // [. . x]
        let matrix = build(&[(1, 1), (1, 2), (2, 1), (2, 2), (2, 3), (3, 3)], 3);
        let rhs = SparseVector::new(3);
        let mut counts = MarkowitzCounts::default();
        counts.setup(&matrix, &rhs, 1, 3);

        assert_eq!(counts.row_count(1), 1);
        assert_eq!(counts.row_count(2), 2);
        assert_eq!(counts.row_count(3), 0);
        assert_eq!(counts.column_count(1), 1);
        assert_eq!(counts.column_count(3), 1);
        assert_eq!(counts.product(2), 2);
        assert_eq!(counts.product(3), 0);
        assert_eq!(counts.singletons(), 1);
    }

    #[test]
    fn test_rhs_counts_toward_row() {
        let matrix = build(&[(1, 1), (2, 2)], 2);
        let mut rhs = SparseVector::new(2);
        let id = rhs.get_element(2).unwrap();
        rhs.set_value(id, 3.0);
        let mut counts = MarkowitzCounts::default();
        counts.setup(&matrix, &rhs, 1, 2);
        assert_eq!(counts.row_count(1), 0);
        assert_eq!(counts.row_count(2), 1);
    }

    #[test]
    fn test_fillin_leaves_singleton_set() {
        let matrix = build(&[(1, 1), (2, 2), (3, 3)], 3);
        let rhs = SparseVector::new(3);
        let mut counts = MarkowitzCounts::default();
        counts.setup(&matrix, &rhs, 1, 3);
        assert_eq!(counts.singletons(), 3);

        counts.create_fillin(2, 3);
        assert_eq!(counts.row_count(2), 1);
        assert_eq!(counts.column_count(3), 1);
        // Neither index has both counts nonzero yet
        assert_eq!(counts.singletons(), 3);

        counts.create_fillin(3, 2);
        assert_eq!(counts.product(2), 1);
        assert_eq!(counts.product(3), 1);
        assert_eq!(counts.singletons(), 1);
    }

    #[test]
    fn test_capped_product() {
        assert_eq!(capped_product(3, 4), 12);
        assert_eq!(
            capped_product(usize::MAX, 2),
            MAX_MARKOWITZ_COUNT * 2
        );
    }

    #[test]
    fn test_limit_tracks_leading_indices() {
        // [x . x]
        // [. x .]
        // [x x x]
        let matrix = build(&[(1, 1), (1, 3), (2, 2), (3, 1), (3, 2), (3, 3)], 3);
        let rhs = SparseVector::new(3);
        let mut counts = MarkowitzCounts::default();
        counts.setup(&matrix, &rhs, 1, 2);
        assert_eq!(counts.limit(), 2);
        // The element in column 3 still counts toward row 1
        assert_eq!(counts.row_count(1), 1);
        assert_eq!(counts.column_count(2), 1);
        assert_eq!(counts.row_count(3), 0);
        // Row 2 holds a single element
        assert_eq!(counts.singletons(), 1);

        // Fill-in past the limit leaves the tracked counts alone
        counts.create_fillin(3, 3);
        assert_eq!(counts.row_count(3), 0);
        counts.create_fillin(2, 3);
        assert_eq!(counts.row_count(2), 1);
        assert_eq!(counts.singletons(), 0);
    }
}
