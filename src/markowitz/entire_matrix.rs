//! Pivot search over the whole reduced submatrix.

use tracing::warn;

use super::strategy::{Pivot, PivotContext, PivotQuality, SearchStrategy};
use crate::matrix::ElementId;
use crate::numeric::Scalar;
use crate::solver::DEFAULT_TIES_MULTIPLIER;

/// Scans every reduced element, column by column.
///
/// This is the last resort: when nothing passes the thresholds it returns
/// the largest element it saw as a [`PivotQuality::Bad`] pivot, and only
/// gives up when every reduced element is zero.
#[derive(Debug, Clone)]
pub struct EntireMatrixSearch {
    ties_multiplier: usize,
}

impl Default for EntireMatrixSearch {
    fn default() -> Self {
        Self::new(DEFAULT_TIES_MULTIPLIER)
    }
}

impl EntireMatrixSearch {
    pub fn new(ties_multiplier: usize) -> Self {
        Self { ties_multiplier }
    }
}

/// The two largest magnitudes in the reduced part of a column.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnPeaks {
    first_id: Option<ElementId>,
    first: f64,
    second: f64,
}

impl ColumnPeaks {
    fn scan<T: Scalar>(context: &PivotContext<'_, T>, column: usize) -> Self {
        let mut peaks = Self::default();
        for id in context.reduced_column(column) {
            let magnitude = context.magnitude(id);
            if peaks.first_id.is_none() || magnitude > peaks.first {
                peaks.second = peaks.first;
                peaks.first = magnitude;
                peaks.first_id = Some(id);
            } else if magnitude > peaks.second {
                peaks.second = magnitude;
            }
        }
        peaks
    }

    /// Largest magnitude among the other elements of the column.
    fn excluding(&self, id: ElementId) -> f64 {
        if self.first_id == Some(id) {
            self.second
        } else {
            self.first
        }
    }
}

impl<T: Scalar> SearchStrategy<T> for EntireMatrixSearch {
    fn name(&self) -> &'static str {
        "entire-matrix"
    }

    fn find_pivot(&mut self, context: &PivotContext<'_, T>) -> Option<Pivot> {
        let mut chosen: Option<ElementId> = None;
        let mut min_product = usize::MAX;
        let mut accepted_ratio = 0.0;
        let mut ties = 0usize;
        let mut largest: Option<(ElementId, f64)> = None;

        for column in context.step..=context.limit {
            let peaks = ColumnPeaks::scan(context, column);
            if peaks.first == 0.0 {
                continue;
            }

            for id in context.reduced_column(column) {
                let magnitude = context.magnitude(id);
                if largest.map_or(true, |(_, biggest)| magnitude > biggest) {
                    largest = Some((id, magnitude));
                }

                let element = &context.matrix[id];
                let product = context.counts.product_at(element.row, element.column);
                let others = peaks.excluding(id);
                if product > min_product
                    || magnitude <= context.relative_threshold * others
                    || magnitude <= context.absolute_threshold
                {
                    continue;
                }

                let ratio = peaks.first / magnitude;
                if product < min_product {
                    chosen = Some(id);
                    min_product = product;
                    accepted_ratio = ratio;
                    ties = 0;
                } else {
                    ties += 1;
                    if ratio < accepted_ratio {
                        chosen = Some(id);
                        accepted_ratio = ratio;
                    }
                    if ties >= min_product.saturating_mul(self.ties_multiplier) {
                        return chosen.map(|element| Pivot::new(element, PivotQuality::Suboptimal));
                    }
                }
            }
        }

        if let Some(element) = chosen {
            return Some(Pivot::new(element, PivotQuality::Good));
        }

        match largest {
            Some((element, magnitude)) if magnitude > 0.0 => {
                warn!(
                    step = context.step,
                    magnitude, "no acceptable pivot, using the largest remaining element"
                );
                Some(Pivot::new(element, PivotQuality::Bad))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markowitz::MarkowitzCounts;
    use crate::matrix::{SparseMatrix, SparseVector};

    fn build(entries: &[(usize, usize, f64)], size: usize) -> SparseMatrix<f64> {
        let mut matrix = SparseMatrix::new(size);
        for &(r, c, v) in entries {
            let id = matrix.get_element(r, c).unwrap();
            matrix.set_value(id, v);
        }
        matrix
    }

    fn search_with(
        matrix: &SparseMatrix<f64>,
        relative_threshold: f64,
        absolute_threshold: f64,
    ) -> Option<Pivot> {
        let mut counts = MarkowitzCounts::default();
        counts.setup(matrix, &SparseVector::new(matrix.size()), 1, matrix.size());
        let context = PivotContext {
            matrix,
            counts: &counts,
            step: 1,
            limit: matrix.size(),
            relative_threshold,
            absolute_threshold,
            magnitude: f64::magnitude,
        };
        EntireMatrixSearch::default().find_pivot(&context)
    }

    fn search(matrix: &SparseMatrix<f64>, absolute_threshold: f64) -> Option<Pivot> {
        search_with(matrix, 1e-3, absolute_threshold)
    }

    #[test]
    fn test_lowest_product_wins() {
        // (2,1) and (3,2) both have product one
        let matrix = build(
            &[
                (1, 1, 1.0),
                (1, 2, 1.0),
                (1, 3, 1.0),
                (2, 1, 1.0),
                (2, 3, 1.0),
                (3, 2, 2.0),
                (3, 3, 1.0),
            ],
            3,
        );
        let pivot = search(&matrix, 1e-13).unwrap();
        assert_eq!(pivot.quality, PivotQuality::Good);
        let element = &matrix[pivot.element];
        assert_eq!(
            (element.row(), element.column()),
            (2, 1),
            "first lowest-product candidate in column order"
        );
    }

    #[test]
    fn test_falls_back_to_largest() {
        let matrix = build(&[(1, 1, 1e-3), (1, 2, 2e-3), (2, 1, 3e-3), (2, 2, 1e-3)], 2);
        let pivot = search(&matrix, 1.0).unwrap();
        assert_eq!(pivot.quality, PivotQuality::Bad);
        assert_eq!(pivot.element, matrix.find_element(2, 1).unwrap());
    }

    #[test]
    fn test_all_zero_is_none() {
        let matrix = build(&[(1, 1, 0.0), (2, 2, 0.0)], 2);
        assert!(search(&matrix, 1e-13).is_none());
    }

    #[test]
    fn test_partial_pivoting_accepts_column_maximum() {
        // Every diagonal is the largest in its column
        let matrix = build(&[(1, 1, 4.0), (1, 2, 1.0), (2, 1, 1.0), (2, 2, 3.0)], 2);
        let pivot = search_with(&matrix, 1.0, 1e-13).unwrap();
        assert_eq!(pivot.quality, PivotQuality::Good);
        assert_eq!(pivot.element, matrix.find_element(1, 1).unwrap());
    }

    #[test]
    fn test_partial_pivoting_rejects_smaller_entries() {
        // Column 1 only accepts (2,1); column 2 only accepts (1,2)
        let matrix = build(&[(1, 1, 1.0), (1, 2, 5.0), (2, 1, 2.0), (2, 2, 3.0)], 2);
        let pivot = search_with(&matrix, 1.0, 1e-13).unwrap();
        assert_eq!(pivot.quality, PivotQuality::Good);
        assert_eq!(pivot.element, matrix.find_element(2, 1).unwrap());
    }
}
