//! Error types for the sparse solver.
//!
//! This module provides a unified error type [`SparseError`] that covers
//! all error conditions that can occur while parsing a system description,
//! building the sparse structure, and factoring or solving a system.

use thiserror::Error;

/// Result type alias using [`SparseError`].
pub type Result<T> = std::result::Result<T, SparseError>;

/// Unified error type for all solver operations.
#[derive(Error, Debug)]
pub enum SparseError {
    // ============ System Description Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// Imaginary part given for a system assembled with real values
    #[error("Complex value at line {line} cannot be stored in a real system (use '.complex')")]
    ComplexValueInRealSystem { line: usize },

    // ============ Structural Errors ============
    /// Matrix location outside the solver size
    #[error("Matrix location ({row}, {column}) is outside a system of size {size}")]
    IndexOutOfRange {
        row: usize,
        column: usize,
        size: usize,
    },

    /// Right-hand side index outside the solver size
    #[error("Right-hand side row {row} is outside a system of size {size}")]
    RhsIndexOutOfRange { row: usize, size: usize },

    /// Number of values does not match the number of cached locations
    #[error("Expected {expected} values, got {actual}")]
    ValueCountMismatch { expected: usize, actual: usize },

    /// Solution buffer with the wrong length
    #[error("Solution buffer must hold {expected} entries, got {actual}")]
    SolutionLengthMismatch { expected: usize, actual: usize },

    /// Invalid configuration parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ Numeric Errors ============
    /// No acceptable pivot at an elimination step
    #[error("Singular matrix - no acceptable pivot for row {row} (elimination step {step})")]
    SingularMatrix { step: usize, row: usize },

    /// Factoring was requested before a pivot order exists
    #[error("Matrix has no pivot order - call order() or order_and_factor() first")]
    NotOrdered,

    /// Solving was requested before the matrix was factored
    #[error("Matrix is not factored")]
    NotFactored,

    // ============ I/O Errors ============
    /// Error reading a system description file
    #[error("Failed to read system file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SparseError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a singular matrix error
    pub fn singular(step: usize, row: usize) -> Self {
        Self::SingularMatrix { step, row }
    }

    /// Whether this error reports a numerically singular system.
    ///
    /// Callers driving a nonlinear loop use this to decide between
    /// retrying with adjusted stamps and aborting.
    pub fn is_singular(&self) -> bool {
        matches!(self, Self::SingularMatrix { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_singular_message_names_row() {
        let err = SparseError::singular(3, 7);
        assert!(err.is_singular());
        assert_eq!(
            err.to_string(),
            "Singular matrix - no acceptable pivot for row 7 (elimination step 3)"
        );
    }

    #[test]
    fn test_structural_errors_are_not_singular() {
        let err = SparseError::ValueCountMismatch {
            expected: 4,
            actual: 3,
        };
        assert!(!err.is_singular());
        assert_eq!(err.to_string(), "Expected 4 values, got 3");
    }
}
