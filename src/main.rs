//! spsolve - sparse linear system solver
//!
//! Reads a system description, orders and factors it and prints the solution.
//!
//! # Usage
//!
//! ```bash
//! spsolve system.sys
//! RUST_LOG=sparse_mna=trace spsolve --transposed system.sys
//! ```

use std::fmt::Display;
use std::io;
use std::path::PathBuf;

use clap::Parser;
use num_complex::Complex64;
use sparse_mna::{
    dsl::{self, SystemDef},
    error::Result,
    numeric::Scalar,
    solver::{SolverConfig, DEFAULT_ABSOLUTE_PIVOT_THRESHOLD, DEFAULT_RELATIVE_PIVOT_THRESHOLD},
};
use tracing::{debug, Level};

/// Sparse linear system solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the system description file
    #[arg(value_name = "SYSTEM_FILE")]
    system_file: PathBuf,

    /// Solve the transposed system A^T x = b
    #[arg(long)]
    transposed: bool,

    /// Relative pivot threshold
    #[arg(long, value_name = "X", default_value_t = DEFAULT_RELATIVE_PIVOT_THRESHOLD)]
    pivot_rel: f64,

    /// Absolute pivot threshold
    #[arg(long, value_name = "X", default_value_t = DEFAULT_ABSOLUTE_PIVOT_THRESHOLD)]
    pivot_abs: f64,

    /// Search the whole matrix for pivots instead of trying the diagonal first
    #[arg(long)]
    no_diagonal: bool,

    /// Log ordering details to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn run<T: Scalar + Display>(system: &SystemDef, config: SolverConfig, transposed: bool) -> Result<()> {
    let mut solver = system.assemble::<T>(config)?;
    solver.order_and_factor()?;
    debug!(
        pivots = solver.pivot_count(),
        fillins = solver.fillins(),
        "factored"
    );

    let solution = if transposed {
        solver.solve_transposed()?
    } else {
        solver.solve()?
    };
    for (index, value) in solution.iter().enumerate().skip(1) {
        println!("x[{index}] = {value}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(io::stderr)
        .init();

    let config = SolverConfig::new()
        .with_relative_pivot_threshold(args.pivot_rel)
        .with_absolute_pivot_threshold(args.pivot_abs)
        .with_diagonal_pivoting(!args.no_diagonal);

    let system = dsl::parse_file(&args.system_file)?;
    debug!(
        size = system.size(),
        entries = system.entries.len(),
        complex = system.complex,
        "parsed system"
    );

    if system.complex {
        run::<Complex64>(&system, config, args.transposed)
    } else {
        run::<f64>(&system, config, args.transposed)
    }
}
