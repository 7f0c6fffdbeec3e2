use crate::decode::scanner::{Lexeme, Scanned, Scanner};
use crate::{Error, Location, Result};

/// A one-token cursor over the scanner.
pub struct Lexer<'de> {
    scanner: Scanner<'de>,
    current: Scanned,
}

impl<'de> Lexer<'de> {
    /// Creates a lexer positioned on the first token.
    pub fn new(input: &'de str) -> Result<Self> {
        let mut lexer = Self::unprimed(input);
        lexer.advance()?;
        Ok(lexer)
    }

    /// Creates a lexer that has not scanned anything yet; the first
    /// [`advance`](Self::advance) positions it on the first token.
    pub fn unprimed(input: &'de str) -> Self {
        Self {
            scanner: Scanner::new(input),
            current: Scanned {
                lexeme: Lexeme::Eof,
                start: 0,
                end: 0,
                location: Location::start(),
            },
        }
    }

    pub fn current(&self) -> Lexeme {
        self.current.lexeme
    }

    pub fn advance(&mut self) -> Result<()> {
        self.current = self.scanner.scan_token()?;
        Ok(())
    }

    pub fn text(&self) -> &'de str {
        &self.scanner.input()[self.current.start..self.current.end]
    }

    pub fn position(&self) -> Location {
        self.current.location
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.current.lexeme == Lexeme::Ident && self.text() == name
    }

    /// Human-readable form of the current token for error messages.
    pub fn describe(&self) -> String {
        match self.current.lexeme {
            Lexeme::Eof => "end of input".to_string(),
            _ => format!("{:?}", self.text()),
        }
    }

    pub fn consume(&mut self, want: Lexeme) -> Result<()> {
        if self.current.lexeme != want {
            return Err(match self.current.lexeme {
                Lexeme::Eof => self.fail(Error::eof()),
                _ => self.fail(Error::lexical(format!(
                    "got {}, want {want}",
                    self.describe()
                ))),
            });
        }
        self.advance()
    }

    /// Reports whether the current token closes a list.
    pub fn end_list(&self) -> Result<bool> {
        match self.current.lexeme {
            Lexeme::Close => Ok(true),
            Lexeme::Eof => Err(self.fail(Error::eof())),
            _ => Ok(false),
        }
    }

    pub fn unexpected(&self) -> Error {
        match self.current.lexeme {
            Lexeme::Eof => self.fail(Error::eof()),
            _ => self.fail(Error::lexical(format!(
                "unexpected token {}",
                self.describe()
            ))),
        }
    }

    pub fn fail(&self, err: Error) -> Error {
        err.at(self.current.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[rstest::rstest]
    fn test_cursor_walk() {
        let mut lexer = Lexer::new("(x 1)").unwrap();
        assert_eq!(lexer.current(), Lexeme::Open);
        lexer.consume(Lexeme::Open).unwrap();
        assert!(lexer.is_ident("x"));
        lexer.advance().unwrap();
        assert_eq!((lexer.current(), lexer.text()), (Lexeme::Int, "1"));
        assert_eq!(lexer.position().column, 4);
        lexer.advance().unwrap();
        assert!(lexer.end_list().unwrap());
        lexer.advance().unwrap();
        assert_eq!(lexer.current(), Lexeme::Eof);
    }

    #[rstest::rstest]
    fn test_consume_mismatch() {
        let mut lexer = Lexer::new("x").unwrap();
        let err = lexer.consume(Lexeme::Open).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.message, "got \"x\", want `(`");
    }

    #[rstest::rstest]
    fn test_end_list_at_eof() {
        let lexer = Lexer::new("   ").unwrap();
        let err = lexer.end_list().unwrap_err();
        assert!(err.is_eof());
        assert_eq!(err.location.map(|loc| loc.column), Some(4));
    }

    #[rstest::rstest]
    fn test_unprimed_waits_for_advance() {
        let mut lexer = Lexer::unprimed("42");
        assert_eq!(lexer.current(), Lexeme::Eof);
        lexer.advance().unwrap();
        assert_eq!(lexer.current(), Lexeme::Int);
    }
}
