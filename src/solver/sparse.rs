//! Sparse LU solver.

use tracing::debug;

use super::config::SolverConfig;
use super::translation::{MatrixLocation, Translation};
use crate::error::{Result, SparseError};
use crate::markowitz::Markowitz;
use crate::matrix::{ElementId, SparseMatrix, SparseVector, VectorElementId};
use crate::numeric::Scalar;

/// Factorization state of a [`Solver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No usable pivot order.
    Unordered,
    /// A pivot order exists but the current values are not factored.
    Ordered,
    /// The matrix holds its LU factors.
    Factored,
}

/// A sparse linear system `A x = b` with Markowitz-ordered LU factorization.
///
/// Callers address equations by external index `1..=size`; index 0 is the
/// reference node and every access to it is discarded. Internally, rows and
/// columns are permuted as pivots are chosen.
///
/// After factoring, the matrix holds `L` below the diagonal, the reciprocal
/// of each pivot on the diagonal and the normalized `U` to the right of it.
///
/// With a nonzero degeneracy the last unknowns are left out: elimination
/// stops early, the trailing block holds the Schur complement and solves
/// treat the trailing unknowns as given.
#[derive(Debug)]
pub struct Solver<T: Scalar> {
    matrix: SparseMatrix<T>,
    rhs: SparseVector<T>,
    markowitz: Markowitz<T>,
    rows: Translation,
    columns: Translation,
    state: SolverState,
    pivots: usize,
    degeneracy: usize,
    pivot_search_reduction: usize,
    intermediate: Vec<T>,
}

impl<T: Scalar> Solver<T> {
    /// Create a solver for `size` equations with default configuration.
    pub fn new(size: usize) -> Self {
        Self::with_markowitz(size, Markowitz::new(&SolverConfig::default()))
    }

    /// Create a solver with custom configuration.
    pub fn with_config(size: usize, config: SolverConfig) -> Result<Self> {
        config.validate()?;
        let mut solver = Self::with_markowitz(size, Markowitz::new(&config));
        solver.degeneracy = config.degeneracy;
        solver.pivot_search_reduction = config.pivot_search_reduction;
        Ok(solver)
    }

    /// Create a solver around a prepared pivot selector.
    pub fn with_markowitz(size: usize, markowitz: Markowitz<T>) -> Self {
        Self {
            matrix: SparseMatrix::new(size),
            rhs: SparseVector::new(size),
            markowitz,
            rows: Translation::new(size),
            columns: Translation::new(size),
            state: SolverState::Unordered,
            pivots: 0,
            degeneracy: 0,
            pivot_search_reduction: 0,
            intermediate: Vec::with_capacity(size + 1),
        }
    }

    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    pub fn state(&self) -> SolverState {
        self.state
    }

    /// Number of elimination steps completed by the last factorization.
    pub fn pivot_count(&self) -> usize {
        self.pivots
    }

    pub fn fillins(&self) -> usize {
        self.matrix.fillins()
    }

    /// The matrix in internal order.
    pub fn matrix(&self) -> &SparseMatrix<T> {
        &self.matrix
    }

    /// The right-hand side in internal order.
    pub fn rhs(&self) -> &SparseVector<T> {
        &self.rhs
    }

    pub fn markowitz(&self) -> &Markowitz<T> {
        &self.markowitz
    }

    pub fn degeneracy(&self) -> usize {
        self.degeneracy
    }

    /// Leave the last `count` unknowns out of elimination and solving.
    ///
    /// A change drops the pivot order.
    pub fn set_degeneracy(&mut self, count: usize) {
        if count != self.degeneracy {
            self.degeneracy = count;
            self.state = SolverState::Unordered;
        }
    }

    pub fn pivot_search_reduction(&self) -> usize {
        self.pivot_search_reduction
    }

    /// Keep pivots out of the last `count` rows and columns.
    ///
    /// A change drops the pivot order.
    pub fn set_pivot_search_reduction(&mut self, count: usize) {
        if count != self.pivot_search_reduction {
            self.pivot_search_reduction = count;
            self.state = SolverState::Unordered;
        }
    }

    /// Last elimination step.
    fn order_end(&self) -> usize {
        self.size().saturating_sub(self.degeneracy)
    }

    /// Last row and column a pivot may come from.
    fn search_limit(&self) -> usize {
        self.size().saturating_sub(self.pivot_search_reduction)
    }

    // ============ Element Access ============

    fn check_location(&self, row: usize, column: usize) -> Result<()> {
        let size = self.size();
        if row > size || column > size {
            return Err(SparseError::IndexOutOfRange { row, column, size });
        }
        Ok(())
    }

    /// Map an external location to its current internal position.
    pub fn external_to_internal(&self, location: MatrixLocation) -> Result<MatrixLocation> {
        self.check_location(location.row, location.column)?;
        Ok(MatrixLocation::new(
            self.rows.to_internal(location.row),
            self.columns.to_internal(location.column),
        ))
    }

    /// Map an internal position back to the external location.
    pub fn internal_to_external(&self, location: MatrixLocation) -> Result<MatrixLocation> {
        self.check_location(location.row, location.column)?;
        Ok(MatrixLocation::new(
            self.rows.to_external(location.row),
            self.columns.to_external(location.column),
        ))
    }

    /// Get the element for an external location, creating it if needed.
    ///
    /// Creating an element after ordering changes the sparsity pattern, so
    /// the stored pivot order is dropped.
    pub fn get_element(&mut self, row: usize, column: usize) -> Result<ElementId> {
        let internal = self.external_to_internal(MatrixLocation::new(row, column))?;
        if row == 0 || column == 0 {
            return Ok(ElementId::TRASH);
        }
        if let Some(id) = self.matrix.find_element(internal.row, internal.column) {
            return Ok(id);
        }
        let id = self.matrix.get_element(internal.row, internal.column)?;
        if self.state != SolverState::Unordered {
            debug!(row, column, "new element invalidates the pivot order");
            self.state = SolverState::Unordered;
        }
        Ok(id)
    }

    pub fn find_element(&self, row: usize, column: usize) -> Option<ElementId> {
        let internal = self
            .external_to_internal(MatrixLocation::new(row, column))
            .ok()?;
        self.matrix.find_element(internal.row, internal.column)
    }

    /// Get the right-hand side entry of an external row, creating it if needed.
    pub fn get_rhs_element(&mut self, row: usize) -> Result<VectorElementId> {
        let size = self.size();
        if row > size {
            return Err(SparseError::RhsIndexOutOfRange { row, size });
        }
        self.rhs.get_element(self.rows.to_internal(row))
    }

    pub fn find_rhs_element(&self, row: usize) -> Option<VectorElementId> {
        if row > self.size() {
            return None;
        }
        self.rhs.find_element(self.rows.to_internal(row))
    }

    /// Matrix values changed, so existing factors no longer apply.
    fn touch(&mut self) {
        if self.state == SolverState::Factored {
            self.state = SolverState::Ordered;
        }
    }

    #[inline]
    pub fn add(&mut self, id: ElementId, value: T) {
        self.touch();
        *self.matrix.value_mut(id) += value;
    }

    #[inline]
    pub fn subtract(&mut self, id: ElementId, value: T) {
        self.touch();
        *self.matrix.value_mut(id) -= value;
    }

    pub fn value(&self, id: ElementId) -> T {
        self.matrix.value(id)
    }

    pub fn set_value(&mut self, id: ElementId, value: T) {
        self.touch();
        self.matrix.set_value(id, value);
    }

    #[inline]
    pub fn add_rhs(&mut self, id: VectorElementId, value: T) {
        *self.rhs.value_mut(id) += value;
    }

    #[inline]
    pub fn subtract_rhs(&mut self, id: VectorElementId, value: T) {
        *self.rhs.value_mut(id) -= value;
    }

    pub fn rhs_value(&self, id: VectorElementId) -> T {
        self.rhs.value(id)
    }

    pub fn set_rhs_value(&mut self, id: VectorElementId, value: T) {
        self.rhs.set_value(id, value);
    }

    /// Zero the matrix and right-hand side, keeping structure and order.
    pub fn reset(&mut self) {
        self.reset_matrix();
        self.reset_rhs();
    }

    pub fn reset_matrix(&mut self) {
        self.touch();
        self.matrix.reset();
    }

    pub fn reset_rhs(&mut self) {
        self.rhs.reset();
    }

    /// Remove every element and forget the pivot order.
    ///
    /// Handles obtained before clearing are no longer valid. The degeneracy
    /// goes back to zero; the pivot search reduction is kept.
    pub fn clear(&mut self) {
        let size = self.size();
        self.matrix = SparseMatrix::new(size);
        self.rhs = SparseVector::new(size);
        self.rows.reset();
        self.columns.reset();
        self.state = SolverState::Unordered;
        self.pivots = 0;
        self.degeneracy = 0;
    }

    /// Run `method` over the matrix and right-hand side in internal order.
    ///
    /// Changed values invalidate the factors. Created elements drop the
    /// pivot order.
    pub fn precondition<F>(&mut self, method: F)
    where
        F: FnOnce(&mut SparseMatrix<T>, &mut SparseVector<T>),
    {
        let elements = self.matrix.len();
        method(&mut self.matrix, &mut self.rhs);
        if self.matrix.len() != elements {
            debug!(
                created = self.matrix.len() - elements,
                "preconditioning changed the sparsity pattern"
            );
            self.state = SolverState::Unordered;
        } else {
            self.touch();
        }
    }

    // ============ Ordering and Factoring ============

    /// Search a fresh pivot order and factor the matrix along it.
    ///
    /// Ordering and elimination are interleaved, so this also factors: the
    /// solver ends in [`SolverState::Factored`] and a following
    /// [`factor`](Self::factor) does nothing until values change.
    pub fn order(&mut self) -> Result<()> {
        debug!(
            size = self.size(),
            elements = self.matrix.len(),
            "ordering matrix"
        );
        self.order_from(1)
    }

    /// Numeric factorization along the stored pivot order.
    ///
    /// Fails with [`SparseError::NotOrdered`] when no order exists. A pivot
    /// that collapses to the absolute threshold or below fails with
    /// [`SparseError::SingularMatrix`] and drops the order; the values must
    /// then be loaded again before reordering.
    pub fn factor(&mut self) -> Result<()> {
        match self.state {
            SolverState::Unordered => Err(SparseError::NotOrdered),
            SolverState::Factored => Ok(()),
            SolverState::Ordered => {
                for step in 1..=self.order_end() {
                    let pivot = match self.matrix.diagonal(step) {
                        Some(pivot) if self.is_usable_pivot(pivot) => pivot,
                        _ => return Err(self.fail(step)),
                    };
                    self.eliminate(pivot, step, false)?;
                    self.pivots = step;
                }
                self.state = SolverState::Factored;
                Ok(())
            }
        }
    }

    /// Factor, reusing the stored order for as long as its pivots stay acceptable.
    ///
    /// At the first stored pivot that fails the thresholds, a new pivot
    /// search resumes from that step over the partially reduced matrix.
    pub fn order_and_factor(&mut self) -> Result<()> {
        match self.state {
            SolverState::Unordered => return self.order(),
            SolverState::Factored => return Ok(()),
            SolverState::Ordered => {}
        }

        let limit = self.search_limit();
        for step in 1..=self.order_end() {
            let pivot = match self.matrix.diagonal(step) {
                Some(pivot) if self.markowitz.is_valid_pivot(&self.matrix, pivot, limit) => pivot,
                _ => {
                    debug!(step, "stored pivot is no longer acceptable, reordering");
                    return self.order_from(step);
                }
            };
            self.eliminate(pivot, step, false)?;
            self.pivots = step;
        }
        self.state = SolverState::Factored;
        Ok(())
    }

    fn is_usable_pivot(&self, pivot: ElementId) -> bool {
        let magnitude = self.markowitz.magnitude_of(&self.matrix.value(pivot));
        magnitude > self.markowitz.absolute_threshold()
    }

    fn order_from(&mut self, start: usize) -> Result<()> {
        self.pivots = start - 1;
        let limit = self.search_limit();
        self.markowitz.setup(&self.matrix, &self.rhs, start, limit);

        for step in start..=self.order_end() {
            let Some(pivot) = self.markowitz.find_pivot(&self.matrix, step) else {
                return Err(self.fail(step));
            };
            self.move_pivot(pivot.element, step)?;
            self.eliminate(pivot.element, step, true)?;
            self.pivots = step;
        }

        self.state = SolverState::Factored;
        debug!(fillins = self.matrix.fillins(), "ordering complete");
        Ok(())
    }

    /// Bring a pivot to `(step, step)`.
    fn move_pivot(&mut self, pivot: ElementId, step: usize) -> Result<()> {
        self.markowitz.move_pivot(&self.matrix, pivot, step);

        let row = self.matrix[pivot].row();
        if row != step {
            self.matrix.swap_rows(row, step)?;
            self.rhs.swap(row, step)?;
            self.rows.swap(row, step);
        }
        let column = self.matrix[pivot].column();
        if column != step {
            self.matrix.swap_columns(column, step)?;
            self.columns.swap(column, step);
        }

        self.markowitz.update(&self.matrix, pivot);
        Ok(())
    }

    /// Eliminate the column below the pivot at `(step, step)`.
    fn eliminate(&mut self, pivot: ElementId, step: usize, track_fillins: bool) -> Result<()> {
        let value = self.matrix.value(pivot);
        if value.is_zero() {
            return Err(self.fail(step));
        }
        let reciprocal = value.reciprocal();
        self.matrix.set_value(pivot, reciprocal);

        let mut upper = self.matrix[pivot].right();
        while let Some(upper_id) = upper {
            let multiplier = self.matrix.value(upper_id) * reciprocal;
            self.matrix.set_value(upper_id, multiplier);
            let column = self.matrix[upper_id].column();

            let mut sub = self.matrix[upper_id].below();
            let mut lower = self.matrix[pivot].below();
            while let Some(lower_id) = lower {
                let row = self.matrix[lower_id].row();
                while let Some(candidate) = sub {
                    if self.matrix[candidate].row() >= row {
                        break;
                    }
                    sub = self.matrix[candidate].below();
                }

                let target = match sub {
                    Some(candidate) if self.matrix[candidate].row() == row => candidate,
                    _ => {
                        if track_fillins {
                            self.markowitz.create_fillin(row, column);
                        } else {
                            debug!(row, column, "fill-in outside the stored pattern");
                        }
                        self.matrix.create_fillin(row, column)
                    }
                };

                let product = multiplier * self.matrix.value(lower_id);
                *self.matrix.value_mut(target) -= product;
                sub = self.matrix[target].below();
                lower = self.matrix[lower_id].below();
            }
            upper = self.matrix[upper_id].right();
        }
        Ok(())
    }

    /// Drop the order and describe the failing step.
    ///
    /// The reported row is the first reduced row whose values are all zero,
    /// which is the equation that cannot be pivoted; otherwise the row at
    /// the failing step.
    fn fail(&mut self, step: usize) -> SparseError {
        self.state = SolverState::Unordered;
        let size = self.size();
        let internal = (step..=size)
            .find(|&row| {
                self.matrix
                    .row_iter(row)
                    .all(|id| self.matrix.value(id).is_zero())
            })
            .unwrap_or(step);
        SparseError::singular(step, self.rows.to_external(internal))
    }

    // ============ Solving ============

    fn check_solution(&self, length: usize) -> Result<()> {
        if self.state != SolverState::Factored {
            return Err(SparseError::NotFactored);
        }
        let expected = self.size() + 1;
        if length != expected {
            return Err(SparseError::SolutionLengthMismatch {
                expected,
                actual: length,
            });
        }
        Ok(())
    }

    /// Solve `A x = b` for the current right-hand side.
    ///
    /// The result is indexed by external variable; entry 0 is always zero.
    /// Unknowns left out by the degeneracy come back as zero.
    pub fn solve(&mut self) -> Result<Vec<T>> {
        let mut solution = vec![T::zero(); self.size() + 1];
        self.solve_into(&mut solution)?;
        Ok(solution)
    }

    /// Solve `A x = b` into a caller-provided buffer of length `size + 1`.
    ///
    /// Unknowns left out by the degeneracy are read from the buffer and
    /// left unchanged.
    pub fn solve_into(&mut self, solution: &mut [T]) -> Result<()> {
        self.check_solution(solution.len())?;
        let size = self.size();
        let order = self.order_end();
        let matrix = &self.matrix;
        let intermediate = &mut self.intermediate;
        intermediate.clear();
        intermediate.resize(size + 1, T::zero());
        for (index, value) in self.rhs.iter().take_while(|&(index, _)| index <= order) {
            intermediate[index] = value;
        }
        for index in order + 1..=size {
            intermediate[index] = solution[self.columns.to_external(index)];
        }

        // Forward substitution through L
        for step in 1..=order {
            let mut temp = intermediate[step];
            if temp.is_zero() {
                continue;
            }
            if let Some(pivot) = matrix.diagonal(step) {
                temp *= matrix.value(pivot);
                intermediate[step] = temp;
                for id in matrix.below(pivot).take_while(|&id| matrix[id].row() <= order) {
                    let element = &matrix[id];
                    intermediate[element.row()] -= temp * element.value();
                }
            }
        }

        // Back substitution through unit U
        for step in (1..=order).rev() {
            let mut temp = intermediate[step];
            if let Some(pivot) = matrix.diagonal(step) {
                for id in matrix.right_of(pivot) {
                    let element = &matrix[id];
                    temp -= element.value() * intermediate[element.column()];
                }
            }
            intermediate[step] = temp;
        }

        solution[0] = T::zero();
        for step in 1..=order {
            solution[self.columns.to_external(step)] = intermediate[step];
        }
        Ok(())
    }

    /// Solve `A^T x = b` for the current right-hand side.
    pub fn solve_transposed(&mut self) -> Result<Vec<T>> {
        let mut solution = vec![T::zero(); self.size() + 1];
        self.solve_transposed_into(&mut solution)?;
        Ok(solution)
    }

    /// Solve `A^T x = b` into a caller-provided buffer of length `size + 1`.
    ///
    /// Unknowns left out by the degeneracy are read from the buffer and
    /// left unchanged.
    pub fn solve_transposed_into(&mut self, solution: &mut [T]) -> Result<()> {
        self.check_solution(solution.len())?;
        let size = self.size();
        let order = self.order_end();
        let matrix = &self.matrix;
        let intermediate = &mut self.intermediate;
        intermediate.clear();
        intermediate.resize(size + 1, T::zero());
        for (index, value) in self.rhs.iter() {
            let external = self.rows.to_external(index);
            let internal = self.columns.to_internal(external);
            if internal <= order {
                intermediate[internal] = value;
            }
        }
        for index in order + 1..=size {
            intermediate[index] = solution[self.rows.to_external(index)];
        }

        // Forward substitution through U^T
        for step in 1..=order {
            let temp = intermediate[step];
            if temp.is_zero() {
                continue;
            }
            if let Some(pivot) = matrix.diagonal(step) {
                for id in matrix.right_of(pivot).take_while(|&id| matrix[id].column() <= order) {
                    let element = &matrix[id];
                    intermediate[element.column()] -= temp * element.value();
                }
            }
        }

        // Back substitution through L^T
        for step in (1..=order).rev() {
            let mut temp = intermediate[step];
            if let Some(pivot) = matrix.diagonal(step) {
                for id in matrix.below(pivot) {
                    let element = &matrix[id];
                    temp -= intermediate[element.row()] * element.value();
                }
                temp *= matrix.value(pivot);
            }
            intermediate[step] = temp;
        }

        solution[0] = T::zero();
        for step in 1..=order {
            solution[self.rows.to_external(step)] = intermediate[step];
        }
        Ok(())
    }
}
