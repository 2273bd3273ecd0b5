//! Sparse LU solver for MNA systems.
//!
//! This module provides the numerical engine: ordering, factoring and
//! solving `A x = b` for matrices stamped by circuit elements.
//!
//! ## Lifecycle
//!
//! ```text
//!   get_element / add          order()            solve()
//!   ───────────────▶ Unordered ───────▶ Factored ────────▶ x
//!                        ▲                │   ▲
//!          new element   │      add/reset │   │ factor()
//!                        │                ▼   │ order_and_factor()
//!                        └─────────────  Ordered
//! ```
//!
//! A new structural element invalidates the pivot order. Changing values
//! only invalidates the factors, which [`Solver::factor`] recomputes along
//! the stored order without searching again.
//!
//! ## Index spaces
//!
//! Callers use external indices `1..=size`, where 0 is the reference node.
//! Pivoting permutes rows and columns internally; [`Translation`] keeps
//! both maps, and solutions come back in external order.

mod config;
mod sparse;
mod translation;

pub use config::SolverConfig;
pub use sparse::{Solver, SolverState};
pub use translation::{MatrixLocation, Translation};

/// Default minimum ratio between a pivot and the largest element in its column.
pub const DEFAULT_RELATIVE_PIVOT_THRESHOLD: f64 = 1e-3;

/// Default minimum pivot magnitude.
pub const DEFAULT_ABSOLUTE_PIVOT_THRESHOLD: f64 = 1e-13;

/// Default bound on examined Markowitz ties, as a multiple of the best product.
pub const DEFAULT_TIES_MULTIPLIER: usize = 5;

/// Default capacity of the quick diagonal tie list.
pub const DEFAULT_MAX_DIAGONAL_TIES: usize = 100;
