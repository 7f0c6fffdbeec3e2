use smol_str::SmolStr;

/// A raw token from [`Decoder::token`](crate::Decoder::token).
///
/// End of input is not a variant; it is reported as an error whose
/// [`is_eof`](crate::Error::is_eof) returns `true`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Symbol(SmolStr),
    /// The unquoted contents of a string literal.
    String(String),
    Int(i64),
    StartList,
    EndList,
}
