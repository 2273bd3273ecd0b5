//! Fast diagonal pivot search.

use super::strategy::{Pivot, PivotContext, PivotQuality, SearchStrategy};
use crate::matrix::ElementId;
use crate::numeric::Scalar;
use crate::solver::{DEFAULT_MAX_DIAGONAL_TIES, DEFAULT_TIES_MULTIPLIER};

/// Looks for the diagonal with the lowest Markowitz product.
///
/// Candidates are screened only against the absolute threshold while
/// scanning. The relative test is applied afterwards, to the tied candidates.
#[derive(Debug, Clone)]
pub struct QuickDiagonalSearch {
    ties: Vec<ElementId>,
    max_ties: usize,
    ties_multiplier: usize,
}

impl Default for QuickDiagonalSearch {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DIAGONAL_TIES, DEFAULT_TIES_MULTIPLIER)
    }
}

impl QuickDiagonalSearch {
    pub fn new(max_ties: usize, ties_multiplier: usize) -> Self {
        Self {
            ties: Vec::with_capacity(max_ties),
            max_ties: max_ties.max(1),
            ties_multiplier,
        }
    }
}

impl<T: Scalar> SearchStrategy<T> for QuickDiagonalSearch {
    fn name(&self) -> &'static str {
        "quick-diagonal"
    }

    fn find_pivot(&mut self, context: &PivotContext<'_, T>) -> Option<Pivot> {
        let mut min_product = usize::MAX;
        self.ties.clear();

        for index in context.search_order() {
            let product = context.counts.product(index);
            if product > min_product {
                continue;
            }
            let Some(diagonal) = context.matrix.diagonal(index) else {
                continue;
            };
            let magnitude = context.magnitude(diagonal);
            if magnitude <= context.absolute_threshold {
                continue;
            }

            // One other element in both row and column: accept a dominant
            // diagonal when the two off-diagonals mirror each other
            if product == 1 {
                if let (Some(in_row), Some(in_column)) = (
                    context.other_in_row(diagonal),
                    context.other_in_column(diagonal),
                ) {
                    if context.matrix[in_row].column == context.matrix[in_column].row {
                        let largest = context
                            .magnitude(in_row)
                            .max(context.magnitude(in_column));
                        if magnitude >= largest {
                            return Some(Pivot::new(diagonal, PivotQuality::Good));
                        }
                    }
                }
            }

            if product < min_product {
                min_product = product;
                self.ties.clear();
                self.ties.push(diagonal);
            } else if self.ties.len() < self.max_ties {
                self.ties.push(diagonal);
                if self.ties.len() - 1 >= min_product.saturating_mul(self.ties_multiplier) {
                    break;
                }
            }
        }

        // Settle the tie on numerical grounds
        let mut best_ratio = 1.0 / context.relative_threshold;
        let mut chosen = None;
        for &diagonal in &self.ties {
            let magnitude = context.magnitude(diagonal);
            let ratio = context.largest_in_column_excluding(diagonal) / magnitude;
            if ratio < best_ratio {
                best_ratio = ratio;
                chosen = Some(diagonal);
            }
        }

        // The tie list may have been cut short
        chosen.map(|element| Pivot::new(element, PivotQuality::Suboptimal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markowitz::MarkowitzCounts;
    use crate::matrix::{SparseMatrix, SparseVector};

    fn stamp(matrix: &mut SparseMatrix<f64>, entries: &[(usize, usize, f64)]) {
        for &(r, c, v) in entries {
            let id = matrix.get_element(r, c).unwrap();
            matrix.set_value(id, v);
        }
    }

    fn search(matrix: &SparseMatrix<f64>) -> Option<Pivot> {
        let mut counts = MarkowitzCounts::default();
        counts.setup(matrix, &SparseVector::new(matrix.size()), 1, matrix.size());
        let context = PivotContext {
            matrix,
            counts: &counts,
            step: 1,
            limit: matrix.size(),
            relative_threshold: 1e-3,
            absolute_threshold: 1e-13,
            magnitude: f64::magnitude,
        };
        QuickDiagonalSearch::default().find_pivot(&context)
    }

    #[test]
    fn test_symmetric_product_one_is_good() {
        // Tridiagonal: index 1 and 3 have product 1 with mirrored neighbours
        let mut matrix = SparseMatrix::new(3);
        stamp(
            &mut matrix,
            &[
                (1, 1, 4.0),
                (1, 2, 1.0),
                (2, 1, 1.0),
                (2, 2, 4.0),
                (2, 3, 1.0),
                (3, 2, 1.0),
                (3, 3, 4.0),
            ],
        );
        let pivot = search(&matrix).unwrap();
        assert_eq!(pivot.quality, PivotQuality::Good);
        assert_eq!(pivot.element, matrix.diagonal(1).unwrap());
    }

    #[test]
    fn test_prefers_lowest_product() {
        // Diagonals 2 and 3 tie on product; 3 is visited first
        let mut matrix = SparseMatrix::new(3);
        stamp(
            &mut matrix,
            &[
                (1, 1, 1.0),
                (1, 2, 1.0),
                (1, 3, 1.0),
                (2, 1, 1.0),
                (2, 2, 1.0),
                (2, 3, 1.0),
                (3, 1, 1.0),
                (3, 3, 1.0),
            ],
        );
        let pivot = search(&matrix).unwrap();
        assert_eq!(pivot.element, matrix.diagonal(3).unwrap());
        assert_eq!(pivot.quality, PivotQuality::Suboptimal);
    }

    #[test]
    fn test_missing_diagonal() {
        let mut matrix = SparseMatrix::new(2);
        stamp(&mut matrix, &[(1, 2, 1.0), (2, 1, 1.0)]);
        assert!(search(&matrix).is_none());
    }
}
