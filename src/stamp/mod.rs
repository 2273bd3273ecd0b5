//! Stamping helpers.
//!
//! Devices obtain their handles once during setup and re-apply values on
//! every load pass:
//!
//! - [`ElementSet`] caches the handles of one device's stamp pattern.
//! - [`SharedSolver`] lets several tasks stamp into one parent solver
//!   through per-task [`LocalSolver`] views.

mod element_set;
mod local;

pub use element_set::ElementSet;
pub use local::{LocalElement, LocalSolver, SharedSolver};
