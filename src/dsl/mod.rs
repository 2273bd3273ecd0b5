//! Text format for sparse linear systems.
//!
//! The format is line-oriented and human-editable. Each record stamps one
//! value; repeated locations accumulate.
//!
//! # Grammar Overview
//!
//! ```text
//! system      = { line }
//! line        = comment | directive | record | empty
//! comment     = ('#' | ';') { any_char }
//! directive   = ".size" index | ".complex"
//! record      = matrix | rhs
//! matrix      = "A" index index value [imaginary]
//! rhs         = "B" index value [imaginary]
//!
//! index       = digit+
//! value       = ['-'|'+'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+] [unit_suffix]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! ```
//!
//! Index 0 is the reference node: records addressing it are accepted and
//! discarded. Without `.size`, the system size is the largest index used.
//! Imaginary parts require `.complex`.
//!
//! # Example
//!
//! ```text
//! # Tridiagonal 3x3, x = [1, 1, 1]
//! A 1 1 2
//! A 1 2 1
//! A 2 1 1
//! A 2 2 3
//! A 2 3 1
//! A 3 2 1
//! A 3 3 4
//! B 1 3
//! B 2 5
//! B 3 5
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::*;
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::Result;

/// Parse a system description string.
pub fn parse(input: &str) -> Result<SystemDef> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a system description file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<SystemDef> {
    let content = std::fs::read_to_string(path).map_err(|e| crate::error::SparseError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}
