mod lexer;
mod reader;
mod scanner;
mod shaped;
mod zero;

use std::io::Read;
use std::marker::PhantomData;

use serde::de::{Deserialize, DeserializeOwned};
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::decode::lexer::Lexer;
use crate::decode::reader::Reader;
use crate::decode::scanner::Lexeme;
use crate::text::string::unquote;
use crate::types::{Token, Value};
use crate::{DecodeOptions, Error, Location, Result};

pub fn from_str<'de, T: Deserialize<'de>>(input: &'de str, options: &DecodeOptions) -> Result<T> {
    let mut lexer = Lexer::new(input)?;
    let value = read_value(&mut lexer, options.max_depth)?;
    if options.strict {
        ensure_exhausted(&lexer)?;
    }
    Ok(value)
}

pub fn from_slice<'de, T: Deserialize<'de>>(
    input: &'de [u8],
    options: &DecodeOptions,
) -> Result<T> {
    from_str(utf8(input)?, options)
}

pub fn from_reader<T: DeserializeOwned, R: Read>(
    mut reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    from_str(&buf, options)
}

/// Decodes `input` into `out`. `out` is only written when decoding succeeds.
pub fn unmarshal<T: DeserializeOwned>(input: &[u8], out: &mut T) -> Result<()> {
    *out = from_slice(input, &DecodeOptions::default())?;
    Ok(())
}

/// Decodes a top-level dynamic slot such as `("[]int" (1 2 3))`.
pub fn decode_to_value(input: &str) -> Result<Value> {
    from_str(input, &DecodeOptions::default())
}

fn utf8(input: &[u8]) -> Result<&str> {
    std::str::from_utf8(input).map_err(|err| Error::lexical(format!("invalid utf-8: {err}")))
}

fn read_value<'de, T: Deserialize<'de>>(lexer: &mut Lexer<'de>, max_depth: usize) -> Result<T> {
    let mut reader = Reader::new(lexer, max_depth);
    T::deserialize(&mut reader).map_err(|err| {
        let err = err.at(reader.lexer().position());
        debug!(kind = ?err.kind, error = %err, "decode failed");
        err
    })
}

fn ensure_exhausted(lexer: &Lexer<'_>) -> Result<()> {
    if lexer.current() == Lexeme::Eof {
        return Ok(());
    }
    Err(lexer.fail(Error::lexical(format!(
        "trailing characters after value: {}",
        lexer.describe()
    ))))
}

/// Reads a sequence of values and raw tokens from one input.
///
/// The decoder keeps its position between calls, so [`decode`](Self::decode)
/// and [`token`](Self::token) can be interleaved: a caller may step over a
/// `(` with `token()` and then decode the list's elements one by one.
///
/// ```
/// use serde_sexpr::{Decoder, Token};
///
/// let mut decoder = Decoder::new("(1 2) \"three\"");
/// assert_eq!(decoder.token().unwrap(), Token::StartList);
/// let first: i32 = decoder.decode().unwrap();
/// let second: i32 = decoder.decode().unwrap();
/// assert_eq!((first, second), (1, 2));
/// assert_eq!(decoder.token().unwrap(), Token::EndList);
/// assert_eq!(decoder.decode::<String>().unwrap(), "three");
/// assert!(!decoder.more().unwrap());
/// ```
pub struct Decoder<'de> {
    lexer: Lexer<'de>,
    primed: bool,
    options: DecodeOptions,
}

impl<'de> Decoder<'de> {
    pub fn new(input: &'de str) -> Self {
        Self::with_options(input, DecodeOptions::default())
    }

    pub fn with_options(input: &'de str, options: DecodeOptions) -> Self {
        Self {
            lexer: Lexer::unprimed(input),
            primed: false,
            options,
        }
    }

    pub fn from_slice(input: &'de [u8]) -> Result<Self> {
        Ok(Self::new(utf8(input)?))
    }

    /// Scans the first token on first use so that construction never fails
    /// on malformed input.
    fn cursor(&mut self) -> Result<&mut Lexer<'de>> {
        if !self.primed {
            self.lexer.advance()?;
            self.primed = true;
        }
        Ok(&mut self.lexer)
    }

    /// Decodes the next value, starting at the first unconsumed token.
    pub fn decode<T: Deserialize<'de>>(&mut self) -> Result<T> {
        let max_depth = self.options.max_depth;
        let lexer = self.cursor()?;
        trace!(offset = lexer.position().offset, "decoding next value");
        read_value(lexer, max_depth)
    }

    /// Returns the next raw token and steps past it.
    pub fn token(&mut self) -> Result<Token> {
        let lexer = self.cursor()?;
        let location = lexer.position();
        let text = lexer.text();
        let token = match lexer.current() {
            Lexeme::Ident => Token::Symbol(SmolStr::new(text)),
            Lexeme::Str => {
                Token::String(unquote(text).map_err(|err| err.at(location))?.into_owned())
            }
            Lexeme::Int => Token::Int(text.parse().map_err(|_| {
                Error::shape(format!("integer {text} out of range for a token")).at(location)
            })?),
            Lexeme::Open => Token::StartList,
            Lexeme::Close => Token::EndList,
            Lexeme::Float | Lexeme::Punct(_) | Lexeme::Eof => return Err(lexer.unexpected()),
        };
        lexer.advance()?;
        Ok(token)
    }

    /// Reports whether any token remains.
    pub fn more(&mut self) -> Result<bool> {
        Ok(self.cursor()?.current() != Lexeme::Eof)
    }

    /// Fails unless the input has been fully consumed.
    pub fn end(&mut self) -> Result<()> {
        ensure_exhausted(self.cursor()?)
    }

    /// Location of the next unconsumed token.
    pub fn position(&self) -> Location {
        self.lexer.position()
    }

    /// Iterates over the remaining top-level values, stopping at end of input
    /// or after the first error.
    pub fn values<T: Deserialize<'de>>(&mut self) -> Values<'_, 'de, T> {
        Values {
            decoder: self,
            failed: false,
            marker: PhantomData,
        }
    }
}

pub struct Values<'d, 'de, T> {
    decoder: &'d mut Decoder<'de>,
    failed: bool,
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Iterator for Values<'_, 'de, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = match self.decoder.more() {
            Ok(false) => return None,
            Ok(true) => self.decoder.decode(),
            Err(err) => Err(err),
        };
        self.failed = result.is_err();
        Some(result)
    }
}
