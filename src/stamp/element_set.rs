//! Cached stamp handles for one device.

use crate::error::{Result, SparseError};
use crate::matrix::{ElementId, VectorElementId};
use crate::numeric::Scalar;
use crate::solver::{MatrixLocation, Solver};

/// A fixed list of matrix and right-hand side handles.
///
/// Resolved once during setup. Every load pass then applies its values
/// positionally: matrix locations first, right-hand side rows after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSet {
    elements: Vec<ElementId>,
    rhs: Vec<VectorElementId>,
}

impl ElementSet {
    /// Resolve every location against `solver`, creating elements as needed.
    pub fn new<T: Scalar>(
        solver: &mut Solver<T>,
        locations: &[MatrixLocation],
        rhs: &[usize],
    ) -> Result<Self> {
        let elements = locations
            .iter()
            .map(|location| solver.get_element(location.row, location.column))
            .collect::<Result<Vec<_>>>()?;
        let rhs = rhs
            .iter()
            .map(|&row| solver.get_rhs_element(row))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { elements, rhs })
    }

    /// Total number of values expected by [`add`](Self::add).
    pub fn len(&self) -> usize {
        self.elements.len() + self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    pub fn rhs_elements(&self) -> &[VectorElementId] {
        &self.rhs
    }

    fn check(&self, actual: usize) -> Result<()> {
        if actual != self.len() {
            return Err(SparseError::ValueCountMismatch {
                expected: self.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Add `values` to the cached handles.
    pub fn add<T: Scalar>(&self, solver: &mut Solver<T>, values: &[T]) -> Result<()> {
        self.check(values.len())?;
        let (matrix, rhs) = values.split_at(self.elements.len());
        for (&id, &value) in self.elements.iter().zip(matrix) {
            solver.add(id, value);
        }
        for (&id, &value) in self.rhs.iter().zip(rhs) {
            solver.add_rhs(id, value);
        }
        Ok(())
    }

    /// Subtract `values` from the cached handles.
    pub fn subtract<T: Scalar>(&self, solver: &mut Solver<T>, values: &[T]) -> Result<()> {
        self.check(values.len())?;
        let (matrix, rhs) = values.split_at(self.elements.len());
        for (&id, &value) in self.elements.iter().zip(matrix) {
            solver.subtract(id, value);
        }
        for (&id, &value) in self.rhs.iter().zip(rhs) {
            solver.subtract_rhs(id, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn conductance_pattern(a: usize, b: usize) -> Vec<MatrixLocation> {
        vec![
            MatrixLocation::new(a, a),
            MatrixLocation::new(a, b),
            MatrixLocation::new(b, a),
            MatrixLocation::new(b, b),
        ]
    }

    #[test]
    fn test_stamps_positionally() {
        let mut solver = Solver::new(2);
        let resistor = ElementSet::new(&mut solver, &conductance_pattern(1, 2), &[]).unwrap();
        let source = ElementSet::new(&mut solver, &[MatrixLocation::new(1, 1)], &[1]).unwrap();
        assert_eq!(resistor.len(), 4);
        assert_eq!(source.len(), 2);

        let g = 0.5;
        resistor.add(&mut solver, &[g, -g, -g, g]).unwrap();
        source.add(&mut solver, &[1.0, 3.0]).unwrap();
        let load = ElementSet::new(&mut solver, &[MatrixLocation::new(2, 2)], &[]).unwrap();
        load.add(&mut solver, &[1.0]).unwrap();

        // [1.5 -0.5] x = [3]
        // [-0.5 1.5]     [0]
        solver.order_and_factor().unwrap();
        let x = solver.solve().unwrap();
        assert_abs_diff_eq!(x[1], 2.25, epsilon = 1e-12);
        assert_abs_diff_eq!(x[2], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_shared_locations_resolve_to_same_handle() {
        let mut solver = Solver::<f64>::new(3);
        let first = ElementSet::new(&mut solver, &conductance_pattern(1, 2), &[]).unwrap();
        let second = ElementSet::new(&mut solver, &conductance_pattern(2, 3), &[]).unwrap();
        assert_eq!(first.elements()[3], second.elements()[0]);
        assert_eq!(solver.matrix().len(), 7);
    }

    #[test]
    fn test_subtract_and_ground() {
        let mut solver = Solver::new(1);
        let set = ElementSet::new(
            &mut solver,
            &[MatrixLocation::new(1, 1), MatrixLocation::new(0, 1)],
            &[1, 0],
        )
        .unwrap();
        assert!(set.elements()[1].is_trash());
        set.add(&mut solver, &[5.0, 1.0, 2.0, 1.0]).unwrap();
        set.subtract(&mut solver, &[1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(solver.value(set.elements()[0]), 4.0);
        assert_eq!(solver.rhs_value(set.rhs_elements()[0]), 1.0);
    }

    #[test]
    fn test_value_count_mismatch() {
        let mut solver = Solver::new(2);
        let set = ElementSet::new(&mut solver, &conductance_pattern(1, 2), &[2]).unwrap();
        let err = set.add(&mut solver, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            SparseError::ValueCountMismatch {
                expected: 5,
                actual: 2
            }
        ));
        assert!(set.subtract(&mut solver, &[0.0; 6]).is_err());
    }

    #[test]
    fn test_out_of_range_location() {
        let mut solver = Solver::<f64>::new(2);
        assert!(ElementSet::new(&mut solver, &[MatrixLocation::new(3, 1)], &[]).is_err());
        assert!(ElementSet::new(&mut solver, &[], &[4]).is_err());
        let empty = ElementSet::new(&mut solver, &[], &[]).unwrap();
        assert!(empty.is_empty());
    }
}
