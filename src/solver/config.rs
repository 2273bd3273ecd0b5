//! Solver configuration.

use super::{
    DEFAULT_ABSOLUTE_PIVOT_THRESHOLD, DEFAULT_MAX_DIAGONAL_TIES, DEFAULT_RELATIVE_PIVOT_THRESHOLD,
    DEFAULT_TIES_MULTIPLIER,
};
use crate::error::{Result, SparseError};

/// Configuration for pivot selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Minimum ratio between a pivot and the largest other element in its column.
    pub relative_pivot_threshold: f64,
    /// Minimum magnitude of a pivot.
    pub absolute_pivot_threshold: f64,
    /// Bound on examined Markowitz ties, as a multiple of the best product.
    pub ties_multiplier: usize,
    /// Capacity of the tie list kept by the quick diagonal search.
    pub max_diagonal_ties: usize,
    /// Try diagonal pivots before searching the whole matrix.
    pub diagonal_pivoting: bool,
    /// Number of trailing unknowns left out of elimination and solving.
    pub degeneracy: usize,
    /// Number of trailing rows and columns never used as pivots.
    pub pivot_search_reduction: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            relative_pivot_threshold: DEFAULT_RELATIVE_PIVOT_THRESHOLD,
            absolute_pivot_threshold: DEFAULT_ABSOLUTE_PIVOT_THRESHOLD,
            ties_multiplier: DEFAULT_TIES_MULTIPLIER,
            max_diagonal_ties: DEFAULT_MAX_DIAGONAL_TIES,
            diagonal_pivoting: true,
            degeneracy: 0,
            pivot_search_reduction: 0,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the relative pivot threshold.
    ///
    /// Lower values favour sparsity, higher values favour accuracy.
    /// - 1e-3 (default): the usual choice for circuit matrices
    /// - 1.0: partial pivoting, every pivot is the largest in its column
    pub fn with_relative_pivot_threshold(mut self, threshold: f64) -> Self {
        self.relative_pivot_threshold = threshold;
        self
    }

    /// Set the absolute pivot threshold.
    pub fn with_absolute_pivot_threshold(mut self, threshold: f64) -> Self {
        self.absolute_pivot_threshold = threshold;
        self
    }

    pub fn with_ties_multiplier(mut self, multiplier: usize) -> Self {
        self.ties_multiplier = multiplier;
        self
    }

    pub fn with_max_diagonal_ties(mut self, ties: usize) -> Self {
        self.max_diagonal_ties = ties;
        self
    }

    /// Enable or disable the diagonal pivot searches.
    pub fn with_diagonal_pivoting(mut self, enabled: bool) -> Self {
        self.diagonal_pivoting = enabled;
        self
    }

    /// Leave the last `count` unknowns out of elimination.
    ///
    /// Factoring then stops after `size - count` steps, leaving the Schur
    /// complement in the trailing block, and solves take the trailing
    /// unknowns from the solution buffer.
    pub fn with_degeneracy(mut self, count: usize) -> Self {
        self.degeneracy = count;
        self
    }

    /// Keep pivots out of the last `count` rows and columns.
    ///
    /// Elimination cannot continue past the searchable rows, so this must
    /// not exceed the degeneracy.
    pub fn with_pivot_search_reduction(mut self, count: usize) -> Self {
        self.pivot_search_reduction = count;
        self
    }

    /// Check that every parameter is in range.
    pub fn validate(&self) -> Result<()> {
        let rel = self.relative_pivot_threshold;
        if !(rel > 0.0 && rel <= 1.0) {
            return Err(SparseError::invalid_parameter(
                "relative_pivot_threshold",
                format!("must be in (0, 1], got {rel}"),
            ));
        }
        let abs = self.absolute_pivot_threshold;
        if !(abs >= 0.0 && abs.is_finite()) {
            return Err(SparseError::invalid_parameter(
                "absolute_pivot_threshold",
                format!("must be a finite value >= 0, got {abs}"),
            ));
        }
        if self.pivot_search_reduction > self.degeneracy {
            return Err(SparseError::invalid_parameter(
                "pivot_search_reduction",
                format!(
                    "must not exceed the degeneracy ({}), got {}",
                    self.degeneracy, self.pivot_search_reduction
                ),
            ));
        }
        if self.max_diagonal_ties < 2 {
            return Err(SparseError::invalid_parameter(
                "max_diagonal_ties",
                format!("must be at least 2, got {}", self.max_diagonal_ties),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SolverConfig::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.relative_pivot_threshold, 1e-3);
        assert_eq!(config.absolute_pivot_threshold, 1e-13);
        assert!(config.diagonal_pivoting);
        assert_eq!(config.degeneracy, 0);
        assert_eq!(config.pivot_search_reduction, 0);
    }

    #[test]
    fn test_builder() {
        let config = SolverConfig::new()
            .with_relative_pivot_threshold(0.5)
            .with_absolute_pivot_threshold(0.0)
            .with_ties_multiplier(2)
            .with_diagonal_pivoting(false)
            .with_degeneracy(2)
            .with_pivot_search_reduction(1);
        assert!(config.validate().is_ok());
        assert_eq!(config.ties_multiplier, 2);
        assert_eq!(config.degeneracy, 2);
        assert_eq!(config.pivot_search_reduction, 1);
        assert!(!config.diagonal_pivoting);
    }

    #[test]
    fn test_rejects_bad_thresholds() {
        let config = SolverConfig::new().with_relative_pivot_threshold(0.0);
        assert!(matches!(
            config.validate(),
            Err(SparseError::InvalidParameter { .. })
        ));
        let config = SolverConfig::new().with_relative_pivot_threshold(f64::NAN);
        assert!(config.validate().is_err());
        let config = SolverConfig::new().with_absolute_pivot_threshold(-1.0);
        assert!(config.validate().is_err());
        let config = SolverConfig::new().with_max_diagonal_ties(1);
        assert!(config.validate().is_err());
        let config = SolverConfig::new().with_pivot_search_reduction(1);
        assert!(matches!(
            config.validate(),
            Err(SparseError::InvalidParameter { .. })
        ));
    }
}
