use std::fmt;

use serde::de;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The current token is not the one the grammar expects here.
    Lexical,
    /// The input structure does not fit the destination type.
    Shape,
    UnknownField,
    UnknownType,
    /// End of input while a value or list was still open.
    Eof,
    RecursionLimit,
    /// Raised by a `Deserialize` implementation through `serde::de::Error`.
    Deserialize,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub(crate) fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}{}", location_suffix(.location))]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<Location>,
}

fn location_suffix(location: &Option<Location>) -> String {
    match location {
        Some(location) => format!(" at {location}"),
        None => String::new(),
    }
}

impl Error {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            location: None,
        }
    }

    pub fn lexical(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Lexical, message)
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Shape, message)
    }

    pub fn unknown_type(descriptor: &str) -> Self {
        Self::new(ErrorKind::UnknownType, format!("unknown type {descriptor:?}"))
    }

    pub fn eof() -> Self {
        Self::new(ErrorKind::Eof, "unexpected end of input")
    }

    pub fn recursion_limit(max_depth: usize) -> Self {
        Self::new(
            ErrorKind::RecursionLimit,
            format!("recursion limit of {max_depth} nested lists exceeded"),
        )
    }

    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn with_detail(mut self, detail: &str) -> Self {
        self.message = format!("{}: {detail}", self.message);
        self
    }

    /// Attaches `location` unless the error already points somewhere more precise.
    pub fn at(mut self, location: Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location);
        }
        self
    }

    pub fn is_eof(&self) -> bool {
        self.kind == ErrorKind::Eof
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::deserialize(msg.to_string())
    }

    fn unknown_field(field: &str, expected: &'static [&'static str]) -> Self {
        let message = if expected.is_empty() {
            format!("unknown field `{field}`, there are no fields")
        } else {
            format!("unknown field `{field}`, expected one of {expected:?}")
        };
        Self::new(ErrorKind::UnknownField, message)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::io(format!("read failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_display_includes_location() {
        let err = Error::lexical("got \"x\", want `)`").at(Location {
            offset: 4,
            line: 2,
            column: 3,
        });
        assert_eq!(err.to_string(), "got \"x\", want `)` at line 2 column 3");
    }

    #[rstest::rstest]
    fn test_first_location_wins() {
        let inner = Location {
            offset: 7,
            line: 1,
            column: 8,
        };
        let err = Error::eof().at(inner).at(Location::start());
        assert_eq!(err.location, Some(inner));
        assert!(err.is_eof());
    }

    #[rstest::rstest]
    fn test_unknown_field_kind() {
        let err = <Error as de::Error>::unknown_field("z", &["x", "y"]);
        assert_eq!(err.kind, ErrorKind::UnknownField);
        assert!(err.to_string().contains("`z`"));
    }
}
