//! Decoder for a parenthesized, Lisp-like notation that maps directly onto
//! any `serde::Deserialize` type.
//!
//! ```
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     tags: Vec<String>,
//! }
//!
//! let point: Point = serde_sexpr::from_str(r#"((y 2) (x 1) (tags ("a" "b")))"#).unwrap();
//! assert_eq!(point, Point { x: 1, y: 2, tags: vec!["a".into(), "b".into()] });
//! ```

pub mod decode;
pub mod error;
pub mod num;
pub mod options;
pub mod reify;
pub mod text;
pub mod types;

use std::io::Read;

use serde::de::{Deserialize, DeserializeOwned};

pub use crate::decode::{Decoder, Values};
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::options::DecodeOptions;
pub use crate::reify::{resolve, resolve_with_depth};
pub use crate::types::{Map, Shape, Token, Value};

pub type Result<T> = std::result::Result<T, Error>;

pub fn from_str<'de, T: Deserialize<'de>>(input: &'de str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::default())
}

pub fn from_str_with_options<'de, T: Deserialize<'de>>(
    input: &'de str,
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_str(input, options)
}

pub fn from_slice<'de, T: Deserialize<'de>>(input: &'de [u8]) -> Result<T> {
    from_slice_with_options(input, &DecodeOptions::default())
}

pub fn from_slice_with_options<'de, T: Deserialize<'de>>(
    input: &'de [u8],
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_slice(input, options)
}

pub fn from_reader<T: DeserializeOwned, R: Read>(reader: R) -> Result<T> {
    from_reader_with_options(reader, &DecodeOptions::default())
}

pub fn from_reader_with_options<T: DeserializeOwned, R: Read>(
    reader: R,
    options: &DecodeOptions,
) -> Result<T> {
    decode::from_reader(reader, options)
}

pub fn unmarshal<T: DeserializeOwned>(input: &[u8], out: &mut T) -> Result<()> {
    decode::unmarshal(input, out)
}

pub fn decode_to_value(input: &str) -> Result<Value> {
    decode::decode_to_value(input)
}
