//! Markowitz pivot selection.
//!
//! At every elimination step the pivot is chosen to keep fill-in low while
//! staying numerically safe. The Markowitz product of a candidate at
//! `(r, c)` is `row_count[r] * column_count[c]`, an upper bound on the
//! fill-in its elimination can create.
//!
//! ## Acceptability
//!
//! A candidate is acceptable when
//!
//! ```text
//! |a_rc| > absolute_threshold
//! |a_rc| > relative_threshold * max |a_ic|   (i != r, i in reduced rows)
//! ```
//!
//! ## Search order
//!
//! Strategies are tried in sequence and the first pivot returned wins:
//!
//! 1. [`SingletonSearch`] - a row or column with one element (no fill-in)
//! 2. [`QuickDiagonalSearch`] - lowest-product diagonal, cheap screening
//! 3. [`DiagonalSearch`] - lowest-product diagonal, full screening
//! 4. [`EntireMatrixSearch`] - every reduced element, largest-element fallback
//!
//! The diagonal searches are skipped when diagonal pivoting is disabled.
//!
//! ## Search limit
//!
//! Counts and searches can be restricted to the leading indices. Rows and
//! columns past the limit are never chosen as pivots, although their
//! elements still count toward the Markowitz counts of the leading lines.

mod counts;
mod diagonal;
mod entire_matrix;
mod quick_diagonal;
mod singleton;
mod strategy;

pub use counts::MarkowitzCounts;
pub use diagonal::DiagonalSearch;
pub use entire_matrix::EntireMatrixSearch;
pub use quick_diagonal::QuickDiagonalSearch;
pub use singleton::SingletonSearch;
pub use strategy::{Pivot, PivotContext, PivotQuality, SearchStrategy};

use std::fmt;

use tracing::trace;

use crate::matrix::{ElementId, SparseMatrix, SparseVector};
use crate::numeric::Scalar;
use crate::solver::SolverConfig;

/// Largest count used in a product, so that products fit in 32 bits.
pub const MAX_MARKOWITZ_COUNT: usize = 46340;

/// Pivot selection state and search strategies.
pub struct Markowitz<T> {
    counts: MarkowitzCounts,
    strategies: Vec<Box<dyn SearchStrategy<T>>>,
    relative_threshold: f64,
    absolute_threshold: f64,
    magnitude: fn(&T) -> f64,
}

impl<T: Scalar> Markowitz<T> {
    /// Create the default strategy list for `config`.
    pub fn new(config: &SolverConfig) -> Self {
        Self::with_strategies(config, Self::default_strategies(config))
    }

    /// Create a pivot selector with a custom list of strategies.
    pub fn with_strategies(config: &SolverConfig, strategies: Vec<Box<dyn SearchStrategy<T>>>) -> Self {
        Self {
            counts: MarkowitzCounts::default(),
            strategies,
            relative_threshold: config.relative_pivot_threshold,
            absolute_threshold: config.absolute_pivot_threshold,
            magnitude: T::magnitude,
        }
    }

    /// Replace the magnitude used for every pivot comparison.
    pub fn with_magnitude(mut self, magnitude: fn(&T) -> f64) -> Self {
        self.magnitude = magnitude;
        self
    }

    pub fn default_strategies(config: &SolverConfig) -> Vec<Box<dyn SearchStrategy<T>>> {
        let mut strategies: Vec<Box<dyn SearchStrategy<T>>> = vec![Box::new(SingletonSearch::new())];
        if config.diagonal_pivoting {
            strategies.push(Box::new(QuickDiagonalSearch::new(
                config.max_diagonal_ties,
                config.ties_multiplier,
            )));
            strategies.push(Box::new(DiagonalSearch::new(config.ties_multiplier)));
        }
        strategies.push(Box::new(EntireMatrixSearch::new(config.ties_multiplier)));
        strategies
    }

    pub fn counts(&self) -> &MarkowitzCounts {
        &self.counts
    }

    pub fn relative_threshold(&self) -> f64 {
        self.relative_threshold
    }

    pub fn absolute_threshold(&self) -> f64 {
        self.absolute_threshold
    }

    pub(crate) fn magnitude_of(&self, value: &T) -> f64 {
        (self.magnitude)(value)
    }

    /// Count the reduced submatrix starting at `step`, searching no further than `limit`.
    pub fn setup(&mut self, matrix: &SparseMatrix<T>, rhs: &SparseVector<T>, step: usize, limit: usize) {
        self.counts.setup(matrix, rhs, step, limit);
    }

    /// Run the strategies in order and return the first pivot found.
    ///
    /// Nothing is found once `step` passes the limit given to [`setup`](Self::setup).
    pub fn find_pivot(&mut self, matrix: &SparseMatrix<T>, step: usize) -> Option<Pivot> {
        let limit = self.counts.limit();
        if step > limit {
            return None;
        }
        let context = PivotContext {
            matrix,
            counts: &self.counts,
            step,
            limit,
            relative_threshold: self.relative_threshold,
            absolute_threshold: self.absolute_threshold,
            magnitude: self.magnitude,
        };
        for strategy in self.strategies.iter_mut() {
            if let Some(pivot) = strategy.find_pivot(&context) {
                trace!(
                    step,
                    strategy = strategy.name(),
                    quality = ?pivot.quality,
                    row = matrix[pivot.element].row,
                    column = matrix[pivot.element].column,
                    "pivot selected"
                );
                return Some(pivot);
            }
        }
        None
    }

    /// Move the pivot's counts to `step` before its row and column are swapped.
    pub fn move_pivot(&mut self, matrix: &SparseMatrix<T>, pivot: ElementId, step: usize) {
        let element = &matrix[pivot];
        self.counts.move_pivot(element.row, element.column, step);
    }

    /// Remove the pivot row and column, which now sit at `step`, from the counts.
    pub fn update(&mut self, matrix: &SparseMatrix<T>, pivot: ElementId) {
        self.counts.update(matrix, pivot);
    }

    /// Record a fill-in created by elimination.
    pub fn create_fillin(&mut self, row: usize, column: usize) {
        self.counts.create_fillin(row, column);
    }

    /// Whether a pivot from a stored order is still safe to reuse.
    ///
    /// Only the elements below the pivot and in rows up to `limit` are
    /// consulted, since they are the ones it is about to eliminate.
    pub fn is_valid_pivot(&self, matrix: &SparseMatrix<T>, pivot: ElementId, limit: usize) -> bool {
        let magnitude = self.magnitude_of(&matrix[pivot].value);
        if magnitude <= self.absolute_threshold {
            return false;
        }
        let largest = matrix
            .below(pivot)
            .take_while(|&id| matrix[id].row <= limit)
            .map(|id| self.magnitude_of(&matrix[id].value))
            .fold(0.0, f64::max);
        magnitude > self.relative_threshold * largest
    }
}

impl<T> fmt::Debug for Markowitz<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Markowitz")
            .field("counts", &self.counts)
            .field("strategies", &self.strategies)
            .field("relative_threshold", &self.relative_threshold)
            .field("absolute_threshold", &self.absolute_threshold)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(entries: &[(usize, usize, f64)], size: usize) -> SparseMatrix<f64> {
        let mut matrix = SparseMatrix::new(size);
        for &(r, c, v) in entries {
            let id = matrix.get_element(r, c).unwrap();
            matrix.set_value(id, v);
        }
        matrix
    }

    #[test]
    fn test_default_strategy_list() {
        let config = SolverConfig::default();
        let markowitz = Markowitz::<f64>::new(&config);
        let names: Vec<&str> = markowitz.strategies.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["singleton", "quick-diagonal", "diagonal", "entire-matrix"]
        );

        let plain = Markowitz::<f64>::new(&config.with_diagonal_pivoting(false));
        let names: Vec<&str> = plain.strategies.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["singleton", "entire-matrix"]);
    }

    #[test]
    fn test_valid_pivot_checks_column_below() {
        let matrix = build(&[(1, 1, 1e-4), (2, 1, 1.0), (1, 2, 100.0), (2, 2, 1.0)], 2);
        let markowitz = Markowitz::<f64>::new(&SolverConfig::default());
        let first = matrix.diagonal(1).unwrap();
        let second = matrix.diagonal(2).unwrap();
        assert!(!markowitz.is_valid_pivot(&matrix, first, 2));
        // Nothing below the last diagonal
        assert!(markowitz.is_valid_pivot(&matrix, second, 2));
        // Rows past the limit are not consulted
        assert!(markowitz.is_valid_pivot(&matrix, first, 1));
    }

    #[test]
    fn test_custom_magnitude() {
        let matrix = build(&[(1, 1, 1.0), (2, 1, 1.0), (1, 2, 1.0), (2, 2, 1.0)], 2);
        let markowitz = Markowitz::<f64>::new(&SolverConfig::default()).with_magnitude(|_| 0.0);
        assert!(!markowitz.is_valid_pivot(&matrix, matrix.diagonal(1).unwrap(), 2));
    }
}
