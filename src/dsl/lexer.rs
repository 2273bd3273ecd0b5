//! Lexer (tokenizer) for the system description format.

use crate::error::{Result, SparseError};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in the format.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A record keyword (`A`, `B`)
    Identifier,
    /// A number (integer or floating point, possibly with suffix)
    Number,
    /// A directive (starts with '.')
    Directive,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing a system description.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text| Token {
            kind,
            text,
            line,
            column,
        };

        let Some(&ch) = self.chars.peek() else {
            return Ok(token(TokenKind::Eof, String::new()));
        };

        match ch {
            '\n' => {
                self.advance();
                Ok(token(TokenKind::Newline, "\n".to_string()))
            }
            '.' => {
                self.advance();
                let name = self.read_identifier();
                if name.is_empty() {
                    return Err(SparseError::lexer(line, column, "expected directive name after '.'"));
                }
                Ok(token(TokenKind::Directive, format!(".{name}")))
            }
            '-' | '+' | '0'..='9' => {
                let text = self.read_number();
                // A number must end at a separator
                if let Some(&next) = self.chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '.' {
                        return Err(SparseError::lexer(
                            self.line,
                            self.column,
                            format!("unexpected character '{next}' in number '{text}'"),
                        ));
                    }
                }
                Ok(token(TokenKind::Number, text))
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let text = self.read_identifier();
                Ok(token(TokenKind::Identifier, text))
            }
            _ => Err(SparseError::lexer(
                line,
                column,
                format!("unexpected character '{ch}'"),
            )),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn advance_if(&mut self, accept: impl Fn(char) -> bool, text: &mut String) -> bool {
        match self.chars.peek() {
            Some(&ch) if accept(ch) => {
                text.push(ch);
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' || ch == ';' {
                // Skip comment until end of line
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while self.advance_if(|ch| ch.is_alphanumeric() || ch == '_', &mut text) {}
        text
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();
        let digit = |ch: char| ch.is_ascii_digit();

        self.advance_if(|ch| ch == '-' || ch == '+', &mut text);
        while self.advance_if(digit, &mut text) {}

        if self.advance_if(|ch| ch == '.', &mut text) {
            while self.advance_if(digit, &mut text) {}
        }

        if self.advance_if(|ch| ch == 'e' || ch == 'E', &mut text) {
            self.advance_if(|ch| ch == '-' || ch == '+', &mut text);
            while self.advance_if(digit, &mut text) {}
        }

        // Unit suffix (p, n, u, m, k, M, G)
        self.advance_if(
            |ch| matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G'),
            &mut text,
        );

        text
    }
}

/// Parse a number string with optional unit suffix.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => return text.parse::<f64>().ok(),
    };
    let digits = &text[..text.len() - last.len_utf8()];
    digits.parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut kinds = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            let done = token.kind == TokenKind::Eof;
            kinds.push(token.kind);
            if done {
                return kinds;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("100n").unwrap(), 100e-9);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("1M").unwrap(), 1_000_000.0);
        assert_relative_eq!(parse_value("-2.2").unwrap(), -2.2);
        assert_relative_eq!(parse_value("1e-9").unwrap(), 1e-9);
        assert!(parse_value("-").is_none());
        assert!(parse_value("").is_none());
    }

    #[test]
    fn test_lexer_record() {
        let mut lexer = Lexer::new("A 1 2 -0.5m");
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "A");

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Number);
        assert_eq!((tok.line, tok.column), (1, 3));

        lexer.next_token().unwrap();
        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.text, "-0.5m");
        assert_eq!(tok.column, 7);
    }

    #[test]
    fn test_lexer_directive_and_comments() {
        assert_eq!(
            kinds(".size 3 ; trailing\n# whole line\nB 1 2"),
            vec![
                TokenKind::Directive,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Identifier,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_errors() {
        let err = Lexer::new("A 1 2 @").tokenize().unwrap_err();
        assert!(matches!(err, SparseError::LexerError { line: 1, column: 7, .. }));
        assert!(Lexer::new("A 1x").tokenize().is_err());
        assert!(Lexer::new(". 3").tokenize().is_err());
    }

    impl Lexer<'_> {
        fn tokenize(&mut self) -> Result<Vec<Token>> {
            let mut tokens = Vec::new();
            loop {
                let token = self.next_token()?;
                if token.kind == TokenKind::Eof {
                    return Ok(tokens);
                }
                tokens.push(token);
            }
        }
    }
}
