//! Sparse matrix and vector storage.
//!
//! ## Layout
//!
//! A [`SparseMatrix`] owns every element in one arena. Each element is
//! linked into two sorted lists: its row (by column) and its column (by
//! row). This gives O(1) access to the structural neighbours of any entry,
//! which is all elimination and pivot search need.
//!
//! ```text
//!          col 1      col 2      col 3
//! row 1   [a11] ---------------> [a13]
//!           |                      |
//! row 2   [a21] ---> [a22]         |
//!                      |           |
//! row 3              [a32] ---> [a33]
//! ```
//!
//! Elements are never freed. Structure grows by explicit requests or by
//! fill-in during elimination, and values are cleared with `reset()`.
//!
//! Row and column 0 stand for the reference (ground) node. Requests that
//! touch them resolve to a single trash-can element that is never linked.

mod element;
mod sparse;
mod vector;

pub use element::{Element, ElementId};
pub use sparse::{LineIter, SparseMatrix};
pub use vector::{SparseVector, VectorElementId};
