use serde::de::{Deserializer, Visitor};
use serde::forward_to_deserialize_any;

use crate::decode::reader::Reader;
use crate::decode::scanner::Lexeme;
use crate::types::Shape;
use crate::{Error, Result};

/// Decodes one value under a reified shape instead of the destination's hints.
///
/// Used inside dynamic slots, where the destination is usually [`Value`] and
/// would accept anything. Scalars are checked against the shape before the
/// visitor sees them; containers carry their element shapes down.
///
/// [`Value`]: crate::Value
pub(crate) struct Shaped<'r, 'a, 'de> {
    reader: &'r mut Reader<'a, 'de>,
    shape: &'r Shape,
}

impl<'r, 'a, 'de> Shaped<'r, 'a, 'de> {
    pub(crate) fn new(reader: &'r mut Reader<'a, 'de>, shape: &'r Shape) -> Self {
        Self { reader, shape }
    }

    fn check_scalar(&self) -> Result<()> {
        if !self.shape.is_scalar() || self.reader.at_nil() {
            return Ok(());
        }
        let lexer = self.reader.lexer();
        if *self.shape == Shape::Int
            && lexer.current() == Lexeme::Int
            && lexer.text().parse::<i64>().is_err()
        {
            return Err(lexer.fail(Error::shape(format!(
                "integer {} out of range for int",
                lexer.text()
            ))));
        }
        let fits = match (self.shape, lexer.current()) {
            (Shape::Bool, Lexeme::Ident) => lexer.is_ident("t"),
            (Shape::Int | Shape::Uint, Lexeme::Int) => true,
            (Shape::Float, Lexeme::Int | Lexeme::Float) => true,
            (Shape::String, Lexeme::Str) => true,
            _ => false,
        };
        if fits {
            return Ok(());
        }
        Err(self.reader.mismatch(self.shape))
    }
}

impl<'de> Deserializer<'de> for Shaped<'_, '_, 'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.check_scalar()?;
        let Shaped { reader, shape } = self;
        match shape {
            Shape::Bool => reader.deserialize_bool(visitor),
            Shape::Int => reader.deserialize_i64(visitor),
            Shape::Uint => reader.deserialize_u64(visitor),
            Shape::Float => reader.deserialize_f64(visitor),
            Shape::String => reader.deserialize_string(visitor),
            Shape::Seq(element) => reader.read_seq(visitor, Some(element.as_ref())),
            Shape::Array(element, len) => reader.read_tuple(*len, visitor, Some(element.as_ref())),
            Shape::Map(key, value) => {
                reader.read_map(visitor, Some((key.as_ref(), value.as_ref())))
            }
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}
