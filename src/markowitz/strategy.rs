//! Pivot search interface shared by all strategies.

use std::fmt;

use super::counts::MarkowitzCounts;
use crate::matrix::{ElementId, SparseMatrix};
use crate::numeric::Scalar;

/// How confident a strategy is in the pivot it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotQuality {
    /// Lowest product found and numerically acceptable.
    Good,
    /// Acceptable, but the tie search stopped before seeing every candidate.
    Suboptimal,
    /// Nothing was acceptable; this is the largest remaining element.
    Bad,
}

/// A selected pivot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub element: ElementId,
    pub quality: PivotQuality,
}

impl Pivot {
    pub fn new(element: ElementId, quality: PivotQuality) -> Self {
        Self { element, quality }
    }
}

/// Read-only view of the reduced submatrix at one elimination step.
///
/// Pivots may only come from rows and columns `step..=limit`.
pub struct PivotContext<'a, T> {
    pub matrix: &'a SparseMatrix<T>,
    pub counts: &'a MarkowitzCounts,
    pub step: usize,
    pub limit: usize,
    pub relative_threshold: f64,
    pub absolute_threshold: f64,
    pub(crate) magnitude: fn(&T) -> f64,
}

impl<'a, T: Scalar> PivotContext<'a, T> {
    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    pub fn magnitude(&self, id: ElementId) -> f64 {
        (self.magnitude)(&self.matrix[id].value)
    }

    /// Indices in the order singleton and diagonal searches visit them:
    /// the current step first, then from the limit back toward it.
    pub fn search_order(&self) -> impl Iterator<Item = usize> {
        let step = self.step;
        let limit = self.limit;
        std::iter::once(step)
            .filter(move |&index| index <= limit)
            .chain((step + 1..=limit).rev())
    }

    /// Elements of `column` that lie in searchable, not-yet-pivoted rows.
    pub fn reduced_column(&self, column: usize) -> impl Iterator<Item = ElementId> + 'a {
        let matrix = self.matrix;
        let step = self.step;
        let limit = self.limit;
        matrix
            .column_iter(column)
            .skip_while(move |&id| matrix[id].row < step)
            .take_while(move |&id| matrix[id].row <= limit)
    }

    /// Elements of `row` that lie in searchable, not-yet-pivoted columns.
    pub fn reduced_row(&self, row: usize) -> impl Iterator<Item = ElementId> + 'a {
        let matrix = self.matrix;
        let step = self.step;
        let limit = self.limit;
        matrix
            .row_iter(row)
            .skip_while(move |&id| matrix[id].column < step)
            .take_while(move |&id| matrix[id].column <= limit)
    }

    /// Largest magnitude in the reduced part of `id`'s column, excluding `id`.
    pub fn largest_in_column_excluding(&self, id: ElementId) -> f64 {
        self.reduced_column(self.matrix[id].column)
            .filter(|&other| other != id)
            .map(|other| self.magnitude(other))
            .fold(0.0, f64::max)
    }

    /// Absolute and relative acceptability of a candidate.
    pub fn is_acceptable(&self, id: ElementId) -> bool {
        let magnitude = self.magnitude(id);
        magnitude > self.absolute_threshold
            && magnitude > self.relative_threshold * self.largest_in_column_excluding(id)
    }

    /// The reduced element sharing a row with the diagonal `id`.
    pub(crate) fn other_in_row(&self, id: ElementId) -> Option<ElementId> {
        self.reduced_row(self.matrix[id].row).find(|&other| other != id)
    }

    /// The reduced element sharing a column with the diagonal `id`.
    pub(crate) fn other_in_column(&self, id: ElementId) -> Option<ElementId> {
        self.reduced_column(self.matrix[id].column)
            .find(|&other| other != id)
    }
}

/// One stage of the pivot search.
///
/// Strategies are tried in order and the first one to return a pivot wins.
pub trait SearchStrategy<T>: fmt::Debug + Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn find_pivot(&mut self, context: &PivotContext<'_, T>) -> Option<Pivot>;
}
