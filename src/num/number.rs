use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integer {
    Signed(i64),
    Unsigned(u64),
}

/// Parses a base-10 integer literal, widening to `u64` only when it does not fit `i64`.
pub fn parse_integer(text: &str) -> Result<Integer> {
    if let Ok(value) = text.parse::<i64>() {
        return Ok(Integer::Signed(value));
    }
    text.parse::<u64>()
        .map(Integer::Unsigned)
        .map_err(|_| Error::shape(format!("integer {text} out of range")))
}

pub fn parse_unsigned(text: &str) -> Result<u64> {
    text.parse::<u64>()
        .map_err(|_| Error::shape(format!("cannot decode {text} into an unsigned integer")))
}

pub fn parse_float(text: &str) -> Result<f64> {
    text.parse::<f64>()
        .map_err(|_| Error::lexical(format!("invalid float literal {text:?}")))
}
