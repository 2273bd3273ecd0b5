//! # Sparse MNA
//!
//! A sparse LU solver for the linear systems of circuit simulation.
//!
//! This library provides:
//! - A linked sparse matrix with O(1) handles for repeated stamping
//! - Markowitz pivot ordering with singleton and diagonal preferences
//! - Refactoring along a stored pivot order when only values change
//! - Forward and transposed solves over real or complex values
//! - A text format for describing systems, and a CLI (`spsolve`)
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`matrix`] - Sparse storage: elements linked by row and column
//! - [`markowitz`] - Markowitz counts and pivot search strategies
//! - [`solver`] - Ordering, factoring and solving
//! - [`stamp`] - Cached stamp handles and concurrent stamping
//! - [`dsl`] - Parser for the system description format
//! - [`numeric`] - The [`Scalar`] trait for real and complex values
//!
//! ## Usage
//!
//! ```
//! use sparse_mna::Solver;
//!
//! let mut solver = Solver::<f64>::new(2);
//! let a = solver.get_element(1, 1)?;
//! let b = solver.get_element(2, 2)?;
//! solver.add(a, 2.0);
//! solver.add(b, 4.0);
//! let r = solver.get_rhs_element(2)?;
//! solver.add_rhs(r, 8.0);
//!
//! solver.order_and_factor()?;
//! let x = solver.solve()?;
//! assert_eq!(x[2], 2.0);
//! # Ok::<(), sparse_mna::SparseError>(())
//! ```
//!
//! ## Solving Method
//!
//! On every pass of a nonlinear loop:
//!
//! 1. Reset the values and stamp every device through its cached handles
//! 2. Factor along the stored order, reordering only from the step whose
//!    pivot is no longer acceptable
//! 3. Solve by forward and back substitution
//!
//! A new structural element drops the order, so the next pass searches
//! pivots afresh.

pub mod dsl;
pub mod error;
pub mod markowitz;
pub mod matrix;
pub mod numeric;
pub mod solver;
pub mod stamp;

// Re-export main types for convenience
pub use error::{Result, SparseError};
pub use numeric::Scalar;
pub use solver::{MatrixLocation, Solver, SolverConfig, SolverState};
pub use stamp::{ElementSet, SharedSolver};
