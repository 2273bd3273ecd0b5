//! Syntax tree for a parsed system description.

use crate::error::{Result, SparseError};
use crate::numeric::Scalar;
use crate::solver::{MatrixLocation, Solver, SolverConfig};
use crate::stamp::ElementSet;

/// Complete representation of a parsed system `A x = b`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemDef {
    /// Size given by `.size`, if any
    pub declared_size: Option<usize>,
    /// Whether `.complex` was given
    pub complex: bool,
    /// Matrix entries in file order
    pub entries: Vec<EntryDef>,
    /// Right-hand side entries in file order
    pub rhs: Vec<RhsDef>,
}

/// A matrix entry (`A row column re [im]`).
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDef {
    pub row: usize,
    pub column: usize,
    pub value: ValueDef,
    /// Source line number for error reporting
    pub line: usize,
}

/// A right-hand side entry (`B row re [im]`).
#[derive(Debug, Clone, PartialEq)]
pub struct RhsDef {
    pub row: usize,
    pub value: ValueDef,
    /// Source line number for error reporting
    pub line: usize,
}

/// A real or complex literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDef {
    pub re: f64,
    pub im: Option<f64>,
}

impl ValueDef {
    pub fn real(re: f64) -> Self {
        Self { re, im: None }
    }

    pub fn complex(re: f64, im: f64) -> Self {
        Self { re, im: Some(im) }
    }

    fn to_scalar<T: Scalar>(self, line: usize) -> Result<T> {
        T::from_parts(self.re, self.im.unwrap_or(0.0))
            .ok_or(SparseError::ComplexValueInRealSystem { line })
    }
}

impl SystemDef {
    /// Create a new empty system.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of equations: the declared size, or the largest index used.
    pub fn size(&self) -> usize {
        self.declared_size.unwrap_or_else(|| {
            let entries = self.entries.iter().map(|e| e.row.max(e.column));
            let rhs = self.rhs.iter().map(|r| r.row);
            entries.chain(rhs).max().unwrap_or(0)
        })
    }

    /// Build a solver holding this system.
    ///
    /// Every entry is stamped through one [`ElementSet`], so repeated
    /// locations accumulate.
    pub fn assemble<T: Scalar>(&self, config: SolverConfig) -> Result<Solver<T>> {
        let mut solver = Solver::with_config(self.size(), config)?;

        let locations: Vec<MatrixLocation> = self
            .entries
            .iter()
            .map(|e| MatrixLocation::new(e.row, e.column))
            .collect();
        let rows: Vec<usize> = self.rhs.iter().map(|r| r.row).collect();
        let set = ElementSet::new(&mut solver, &locations, &rows)?;

        let mut values = Vec::with_capacity(set.len());
        for entry in &self.entries {
            values.push(entry.value.to_scalar(entry.line)?);
        }
        for rhs in &self.rhs {
            values.push(rhs.value.to_scalar(rhs.line)?);
        }
        set.add(&mut solver, &values)?;
        Ok(solver)
    }
}
