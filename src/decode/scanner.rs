use std::fmt;

use memchr::{memchr, memchr3, memchr_iter};

use crate::{Error, Location, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    Ident,
    Str,
    Int,
    Float,
    Open,
    Close,
    Punct(char),
    Eof,
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lexeme::Ident => write!(f, "identifier"),
            Lexeme::Str => write!(f, "string"),
            Lexeme::Int => write!(f, "integer"),
            Lexeme::Float => write!(f, "float"),
            Lexeme::Open => write!(f, "`(`"),
            Lexeme::Close => write!(f, "`)`"),
            Lexeme::Punct(ch) => write!(f, "`{ch}`"),
            Lexeme::Eof => write!(f, "end of input"),
        }
    }
}

/// One scanned token: its kind, byte span and starting location.
#[derive(Debug, Clone, Copy)]
pub struct Scanned {
    pub lexeme: Lexeme,
    pub start: usize,
    pub end: usize,
    pub location: Location,
}

pub struct Scanner<'de> {
    input: &'de str,
    position: usize,
    line: usize,
    column: usize,
}

impl<'de> Scanner<'de> {
    pub fn new(input: &'de str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn input(&self) -> &'de str {
        self.input
    }

    pub fn current_location(&self) -> Location {
        Location {
            offset: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    fn peek_byte_at(&self, ahead: usize) -> Option<u8> {
        self.input.as_bytes().get(self.position + ahead).copied()
    }

    fn peek(&self) -> Option<char> {
        match self.peek_byte() {
            Some(byte) if byte.is_ascii() => Some(byte as char),
            Some(_) => self.input[self.position..].chars().next(),
            None => None,
        }
    }

    /// Moves the cursor `len` bytes forward, keeping line and column in step.
    fn bump(&mut self, len: usize) {
        let end = (self.position + len).min(self.input.len());
        for &byte in &self.input.as_bytes()[self.position..end] {
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if byte & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
        self.position = end;
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek_byte(), self.peek_byte_at(1)) {
                (Some(byte), _) if byte.is_ascii_whitespace() => self.bump(1),
                (Some(b'/'), Some(b'/')) => {
                    let rest = &self.input.as_bytes()[self.position..];
                    let len = memchr(b'\n', rest).unwrap_or(rest.len());
                    self.bump(len);
                }
                (Some(b'/'), Some(b'*')) => {
                    let location = self.current_location();
                    let rest = &self.input.as_bytes()[self.position + 2..];
                    let close = memchr_iter(b'*', rest)
                        .find(|&idx| rest.get(idx + 1) == Some(&b'/'))
                        .ok_or_else(|| Error::lexical("comment not terminated").at(location))?;
                    self.bump(close + 4);
                }
                _ => return Ok(()),
            }
        }
    }

    pub fn scan_token(&mut self) -> Result<Scanned> {
        self.skip_trivia()?;
        let location = self.current_location();
        let start = self.position;

        let lexeme = match self.peek() {
            None => Lexeme::Eof,
            Some('(') => {
                self.bump(1);
                Lexeme::Open
            }
            Some(')') => {
                self.bump(1);
                Lexeme::Close
            }
            Some('"') => {
                self.scan_quoted_string(location)?;
                Lexeme::Str
            }
            Some(ch) if ch.is_ascii_digit() => self.scan_number(),
            Some('-') if self.starts_number(1) => self.scan_number(),
            Some('.') if matches!(self.peek_byte_at(1), Some(b'0'..=b'9')) => self.scan_number(),
            Some(ch) if ch.is_alphabetic() || ch == '_' => {
                self.scan_ident();
                Lexeme::Ident
            }
            Some(ch) => {
                self.bump(ch.len_utf8());
                Lexeme::Punct(ch)
            }
        };

        Ok(Scanned {
            lexeme,
            start,
            end: self.position,
            location,
        })
    }

    fn starts_number(&self, ahead: usize) -> bool {
        match self.peek_byte_at(ahead) {
            Some(b'0'..=b'9') => true,
            Some(b'.') => matches!(self.peek_byte_at(ahead + 1), Some(b'0'..=b'9')),
            _ => false,
        }
    }

    fn skip_digits(&mut self) {
        while matches!(self.peek_byte(), Some(b'0'..=b'9')) {
            self.bump(1);
        }
    }

    fn scan_number(&mut self) -> Lexeme {
        let mut lexeme = Lexeme::Int;
        if self.peek_byte() == Some(b'-') {
            self.bump(1);
        }
        self.skip_digits();
        if self.peek_byte() == Some(b'.') {
            lexeme = Lexeme::Float;
            self.bump(1);
            self.skip_digits();
        }
        if matches!(self.peek_byte(), Some(b'e' | b'E')) {
            let digits_at = match self.peek_byte_at(1) {
                Some(b'+' | b'-') => 2,
                _ => 1,
            };
            if matches!(self.peek_byte_at(digits_at), Some(b'0'..=b'9')) {
                lexeme = Lexeme::Float;
                self.bump(digits_at);
                self.skip_digits();
            }
        }
        lexeme
    }

    fn scan_ident(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.bump(ch.len_utf8());
            } else {
                break;
            }
        }
    }

    fn scan_quoted_string(&mut self, location: Location) -> Result<()> {
        self.bump(1);
        loop {
            let rest = &self.input.as_bytes()[self.position..];
            match memchr3(b'"', b'\\', b'\n', rest) {
                Some(idx) if rest[idx] == b'"' => {
                    self.bump(idx + 1);
                    return Ok(());
                }
                Some(idx) if rest[idx] == b'\\' => {
                    self.bump(idx + 1);
                    match self.peek() {
                        Some('\n') | None => break,
                        Some(escaped) => self.bump(escaped.len_utf8()),
                    }
                }
                _ => break,
            }
        }
        Err(Error::lexical("string literal not terminated").at(location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexemes(input: &str) -> Vec<(Lexeme, &str)> {
        let mut scanner = Scanner::new(input);
        let mut out = Vec::new();
        loop {
            let token = scanner.scan_token().unwrap();
            if token.lexeme == Lexeme::Eof {
                return out;
            }
            out.push((token.lexeme, &input[token.start..token.end]));
        }
    }

    #[rstest::rstest]
    fn test_scan_structural_tokens() {
        assert_eq!(
            lexemes("(a)"),
            vec![
                (Lexeme::Open, "("),
                (Lexeme::Ident, "a"),
                (Lexeme::Close, ")"),
            ]
        );
    }

    #[rstest::rstest]
    fn test_scan_numbers() {
        assert_eq!(
            lexemes("42 -5 3.5 1e9 2.5E-3 .5 7."),
            vec![
                (Lexeme::Int, "42"),
                (Lexeme::Int, "-5"),
                (Lexeme::Float, "3.5"),
                (Lexeme::Float, "1e9"),
                (Lexeme::Float, "2.5E-3"),
                (Lexeme::Float, ".5"),
                (Lexeme::Float, "7."),
            ]
        );
    }

    #[rstest::rstest]
    fn test_scan_minus_alone_is_punct() {
        assert_eq!(
            lexemes("- x"),
            vec![(Lexeme::Punct('-'), "-"), (Lexeme::Ident, "x")]
        );
    }

    #[rstest::rstest]
    fn test_scan_quoted_string_with_escapes() {
        assert_eq!(
            lexemes(r#""a\"b" "c""#),
            vec![(Lexeme::Str, r#""a\"b""#), (Lexeme::Str, r#""c""#)]
        );
    }

    #[rstest::rstest]
    fn test_scan_unicode_ident() {
        assert_eq!(lexemes("größe_2"), vec![(Lexeme::Ident, "größe_2")]);
    }

    #[rstest::rstest]
    fn test_skips_comments() {
        assert_eq!(
            lexemes("// heading\n(1 /* inline */ 2)"),
            vec![
                (Lexeme::Open, "("),
                (Lexeme::Int, "1"),
                (Lexeme::Int, "2"),
                (Lexeme::Close, ")"),
            ]
        );
    }

    #[rstest::rstest]
    fn test_unterminated_string_reports_start() {
        let mut scanner = Scanner::new("  \"abc\n\"");
        let err = scanner.scan_token().unwrap_err();
        assert_eq!(err.kind, crate::ErrorKind::Lexical);
        assert_eq!(err.location.map(|loc| loc.column), Some(3));
    }

    #[rstest::rstest]
    fn test_unterminated_comment() {
        let mut scanner = Scanner::new("/* open");
        assert!(scanner.scan_token().is_err());
    }

    #[rstest::rstest]
    fn test_tracks_line_and_column() {
        let mut scanner = Scanner::new("(a\n  é b)");
        let mut last = None;
        for _ in 0..4 {
            last = Some(scanner.scan_token().unwrap());
        }
        let token = last.unwrap();
        assert_eq!(token.lexeme, Lexeme::Ident);
        assert_eq!((token.location.line, token.location.column), (2, 5));
    }
}
