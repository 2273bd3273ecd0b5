//! Parser for the system description format.

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::error::{Result, SparseError};

/// Parser for system descriptions.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire system description.
    pub fn parse(&mut self) -> Result<SystemDef> {
        let mut system = SystemDef::new();

        while self.current.kind != TokenKind::Eof {
            // Skip empty lines
            if self.current.kind == TokenKind::Newline {
                self.advance()?;
                continue;
            }

            match self.current.kind {
                TokenKind::Directive => self.parse_directive(&mut system)?,
                TokenKind::Identifier => self.parse_record(&mut system)?,
                _ => {
                    return Err(SparseError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }

            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(SparseError::parse(
                        self.current.line,
                        format!("unexpected trailing token: {:?}", self.current.text),
                    ));
                }
            }
        }

        Self::validate(&system)?;
        Ok(system)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn at_line_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn expect_number(&mut self, what: &str) -> Result<f64> {
        if self.current.kind != TokenKind::Number {
            return Err(SparseError::parse(
                self.current.line,
                format!("expected {what}, got {:?}", self.current.text),
            ));
        }
        let value = parse_value(&self.current.text).ok_or_else(|| {
            SparseError::parse(
                self.current.line,
                format!("invalid number: {}", self.current.text),
            )
        })?;
        self.advance()?;
        Ok(value)
    }

    fn expect_index(&mut self, what: &str) -> Result<usize> {
        let line = self.current.line;
        let text = self.current.text.clone();
        if self.current.kind != TokenKind::Number {
            return Err(SparseError::parse(line, format!("expected {what}, got {text:?}")));
        }
        let index = text
            .parse::<usize>()
            .map_err(|_| SparseError::parse(line, format!("invalid {what}: {text}")))?;
        self.advance()?;
        Ok(index)
    }

    fn parse_value_def(&mut self) -> Result<ValueDef> {
        let re = self.expect_number("value")?;
        if self.at_line_end() {
            return Ok(ValueDef::real(re));
        }
        let im = self.expect_number("imaginary part")?;
        Ok(ValueDef::complex(re, im))
    }

    fn parse_directive(&mut self, system: &mut SystemDef) -> Result<()> {
        let directive = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match directive.to_lowercase().as_str() {
            ".size" => {
                if system.declared_size.is_some() {
                    return Err(SparseError::parse(line, "duplicate .size directive"));
                }
                system.declared_size = Some(self.expect_index("system size")?);
            }
            ".complex" => system.complex = true,
            _ => {
                return Err(SparseError::parse(
                    line,
                    format!("unknown directive: {directive}"),
                ));
            }
        }
        Ok(())
    }

    fn parse_record(&mut self, system: &mut SystemDef) -> Result<()> {
        let keyword = self.current.text.clone();
        let line = self.current.line;
        self.advance()?;

        match keyword.to_uppercase().as_str() {
            "A" => {
                let row = self.expect_index("row")?;
                let column = self.expect_index("column")?;
                let value = self.parse_value_def()?;
                system.entries.push(EntryDef {
                    row,
                    column,
                    value,
                    line,
                });
            }
            "B" => {
                let row = self.expect_index("row")?;
                let value = self.parse_value_def()?;
                system.rhs.push(RhsDef { row, value, line });
            }
            _ => {
                return Err(SparseError::parse(
                    line,
                    format!("unknown record type: {keyword}"),
                ));
            }
        }
        Ok(())
    }

    fn validate(system: &SystemDef) -> Result<()> {
        if !system.complex {
            let entries = system.entries.iter().map(|e| (e.line, e.value));
            let rhs = system.rhs.iter().map(|r| (r.line, r.value));
            if let Some((line, _)) = entries.chain(rhs).find(|(_, value)| value.im.is_some()) {
                return Err(SparseError::ComplexValueInRealSystem { line });
            }
        }

        if let Some(size) = system.declared_size {
            for entry in &system.entries {
                if entry.row > size || entry.column > size {
                    return Err(SparseError::parse(
                        entry.line,
                        format!(
                            "entry ({}, {}) exceeds declared size {size}",
                            entry.row, entry.column
                        ),
                    ));
                }
            }
            for rhs in &system.rhs {
                if rhs.row > size {
                    return Err(SparseError::parse(
                        rhs.line,
                        format!("right-hand side row {} exceeds declared size {size}", rhs.row),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::parse;

    #[test]
    fn test_parse_entries() {
        let input = "A 1 1 2\nA 1 2 1k\nB 1 3";
        let system = parse(input).unwrap();
        assert_eq!(system.entries.len(), 2);
        assert_eq!(system.entries[1].value, ValueDef::real(1000.0));
        assert_eq!(system.entries[1].line, 2);
        assert_eq!(system.rhs[0].row, 1);
        assert_eq!(system.size(), 2);
    }

    #[test]
    fn test_parse_directives() {
        let input = ".size 4\n.complex\nA 2 2 1 -1\nB 3 0 2";
        let system = parse(input).unwrap();
        assert_eq!(system.declared_size, Some(4));
        assert!(system.complex);
        assert_eq!(system.entries[0].value, ValueDef::complex(1.0, -1.0));
        assert_eq!(system.rhs[0].value, ValueDef::complex(0.0, 2.0));
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# header\n\nA 1 1 1 ; inline comment\n\n";
        let system = parse(input).unwrap();
        assert_eq!(system.entries.len(), 1);
    }

    #[test]
    fn test_imaginary_part_requires_complex() {
        let err = parse("A 1 1 1\nB 1 1 2").unwrap_err();
        assert!(matches!(err, SparseError::ComplexValueInRealSystem { line: 2 }));
    }

    #[test]
    fn test_rejects_malformed_records() {
        assert!(matches!(parse("C 1 1 1"), Err(SparseError::ParseError { line: 1, .. })));
        assert!(parse("A 1 1").is_err());
        assert!(parse("A 1.5 1 1").is_err());
        assert!(parse("A -1 1 1").is_err());
        assert!(parse("B 1 1 2 3").is_err());
        assert!(parse(".unknown").is_err());
        assert!(parse(".size 2\n.size 3").is_err());
    }

    #[test]
    fn test_rejects_index_beyond_declared_size() {
        let err = parse(".size 2\nA 1 3 1").unwrap_err();
        assert!(matches!(err, SparseError::ParseError { line: 2, .. }));
    }
}
