use std::borrow::Cow;
use std::fmt;

use serde::de::value::BorrowedStrDeserializer;
use serde::de::{
    self, DeserializeSeed, Deserializer, EnumAccess, Expected, MapAccess, SeqAccess,
    VariantAccess, Visitor,
};

use tracing::trace;

use crate::decode::lexer::Lexer;
use crate::decode::scanner::Lexeme;
use crate::decode::shaped::Shaped;
use crate::decode::zero::{Zero, ZeroSeq};
use crate::num::number::{parse_float, parse_integer, parse_unsigned, Integer};
use crate::reify;
use crate::text::string::unquote;
use crate::types::Shape;
use crate::{Error, Result};

/// Recursive-descent reader that decodes one value into whatever shape the
/// destination's `Deserialize` implementation asks for.
pub(crate) struct Reader<'a, 'de> {
    lexer: &'a mut Lexer<'de>,
    remaining_depth: usize,
    max_depth: usize,
}

impl<'a, 'de> Reader<'a, 'de> {
    pub(crate) fn new(lexer: &'a mut Lexer<'de>, max_depth: usize) -> Self {
        Self {
            lexer,
            remaining_depth: max_depth,
            max_depth,
        }
    }

    pub(crate) fn lexer(&self) -> &Lexer<'de> {
        &*self.lexer
    }

    pub(crate) fn at_nil(&self) -> bool {
        self.lexer.is_ident("nil")
    }

    fn take_nil(&mut self) -> Result<bool> {
        if self.at_nil() {
            self.lexer.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn open_list(&mut self) -> Result<()> {
        if self.remaining_depth == 0 {
            return Err(self.lexer.fail(Error::recursion_limit(self.max_depth)));
        }
        self.remaining_depth -= 1;
        self.lexer.consume(Lexeme::Open)
    }

    fn close_list(&mut self) -> Result<()> {
        self.lexer.consume(Lexeme::Close)?;
        self.remaining_depth += 1;
        Ok(())
    }

    /// The current token cannot start a value of the `expected` shape.
    pub(crate) fn mismatch(&self, expected: impl fmt::Display) -> Error {
        match self.lexer.current() {
            Lexeme::Eof => self.lexer.fail(Error::eof()),
            Lexeme::Open => self
                .lexer
                .fail(Error::shape(format!("cannot decode list into {expected}"))),
            _ => self.lexer.fail(Error::shape(format!(
                "cannot decode {} into {expected}",
                self.lexer.describe()
            ))),
        }
    }

    /// Decodes the current atom by its token kind alone.
    fn read_atom<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let location = self.lexer.position();
        let text = self.lexer.text();
        let value = match self.lexer.current() {
            Lexeme::Ident if text == "t" => {
                self.lexer.advance()?;
                visitor.visit_bool::<Error>(true)
            }
            Lexeme::Ident if text == "nil" => {
                self.lexer.advance()?;
                visitor.visit_unit()
            }
            Lexeme::Str => {
                let unquoted = unquote(text).map_err(|err| err.at(location))?;
                self.lexer.advance()?;
                match unquoted {
                    Cow::Borrowed(s) => visitor.visit_borrowed_str(s),
                    Cow::Owned(s) => visitor.visit_string(s),
                }
            }
            Lexeme::Int => {
                let integer = parse_integer(text).map_err(|err| err.at(location))?;
                self.lexer.advance()?;
                match integer {
                    Integer::Signed(v) => visitor.visit_i64(v),
                    Integer::Unsigned(v) => visitor.visit_u64(v),
                }
            }
            Lexeme::Float => {
                let float = parse_float(text).map_err(|err| err.at(location))?;
                self.lexer.advance()?;
                visitor.visit_f64(float)
            }
            Lexeme::Open => return Err(self.mismatch(&visitor as &dyn Expected)),
            _ => return Err(self.lexer.unexpected()),
        };
        value.map_err(|err| err.at(location))
    }

    fn read_signed<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_i64(visitor);
        }
        self.read_atom(visitor)
    }

    fn read_unsigned<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_u64(visitor);
        }
        if self.lexer.current() == Lexeme::Int {
            let location = self.lexer.position();
            let value = parse_unsigned(self.lexer.text()).map_err(|err| err.at(location))?;
            self.lexer.advance()?;
            return visitor.visit_u64::<Error>(value).map_err(|err| err.at(location));
        }
        self.read_atom(visitor)
    }

    fn read_float<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_f64(visitor);
        }
        if matches!(self.lexer.current(), Lexeme::Int | Lexeme::Float) {
            let location = self.lexer.position();
            let value = parse_float(self.lexer.text()).map_err(|err| err.at(location))?;
            self.lexer.advance()?;
            return visitor.visit_f64::<Error>(value).map_err(|err| err.at(location));
        }
        self.read_atom(visitor)
    }

    /// Growable sequence: elements until `)`, in input order.
    pub(crate) fn read_seq<V>(&mut self, visitor: V, element: Option<&Shape>) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return visitor.visit_seq(ZeroSeq::new(0, None));
        }
        if self.lexer.current() != Lexeme::Open {
            return Err(self.mismatch(&visitor as &dyn Expected));
        }
        self.open_list()?;
        let value = visitor.visit_seq(ListAccess::new(self, None, element))?;
        self.close_list()?;
        Ok(value)
    }

    /// Fixed array of `len` slots. Missing trailing elements are zero;
    /// surplus elements are an error.
    pub(crate) fn read_tuple<V>(
        &mut self,
        len: usize,
        visitor: V,
        element: Option<&Shape>,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return visitor.visit_seq(ZeroSeq::new(len, element));
        }
        if self.lexer.current() != Lexeme::Open {
            return Err(self.mismatch(&visitor as &dyn Expected));
        }
        self.open_list()?;
        let value = visitor.visit_seq(ListAccess::new(self, Some(len), element))?;
        if !self.lexer.end_list()? {
            return Err(self.lexer.fail(overflow(len)));
        }
        self.close_list()?;
        Ok(value)
    }

    /// Associative map written as `((key value) ...)`; later keys overwrite earlier ones.
    pub(crate) fn read_map<V>(
        &mut self,
        visitor: V,
        entry: Option<(&Shape, &Shape)>,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_map(visitor);
        }
        if self.lexer.current() != Lexeme::Open {
            return Err(self.mismatch(&visitor as &dyn Expected));
        }
        self.open_list()?;
        let value = visitor.visit_map(PairAccess::new(self, entry))?;
        self.close_list()?;
        Ok(value)
    }

    /// Record written as `([tag] (field value) ...)`; the optional leading
    /// symbol names the record and is not checked.
    fn read_record<V>(
        &mut self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_struct(name, fields, visitor);
        }
        if self.lexer.current() != Lexeme::Open {
            return Err(self.mismatch(&visitor as &dyn Expected));
        }
        self.open_list()?;
        if self.lexer.current() == Lexeme::Ident {
            trace!(tag = self.lexer.text(), record = name, "skipping record tag");
            self.lexer.advance()?;
        }
        let value = visitor.visit_map(FieldAccess::new(self, fields))?;
        self.close_list()?;
        Ok(value)
    }

    /// Dynamic slot: `("<descriptor>" value)`.
    fn read_dynamic<V>(&mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.open_list()?;
        match self.lexer.current() {
            Lexeme::Str => {}
            Lexeme::Eof => return Err(self.lexer.fail(Error::eof())),
            _ => {
                return Err(self.lexer.fail(Error::lexical(format!(
                    "got {}, want type descriptor string",
                    self.lexer.describe()
                ))))
            }
        }
        let location = self.lexer.position();
        let descriptor = unquote(self.lexer.text()).map_err(|err| err.at(location))?;
        let shape = reify::resolve_with_depth(&descriptor, self.max_depth)
            .map_err(|err| err.at(location))?;
        self.lexer.advance()?;
        let value = Shaped::new(self, &shape).deserialize_any(visitor)?;
        self.close_list()?;
        Ok(value)
    }

    fn skip_value(&mut self) -> Result<()> {
        match self.lexer.current() {
            Lexeme::Open => {
                self.open_list()?;
                while !self.lexer.end_list()? {
                    self.skip_value()?;
                }
                self.close_list()
            }
            Lexeme::Ident | Lexeme::Str | Lexeme::Int | Lexeme::Float => self.lexer.advance(),
            _ => Err(self.lexer.unexpected()),
        }
    }
}

fn overflow(len: usize) -> Error {
    Error::shape(format!("too many elements for array of length {len}"))
}

impl<'de> Deserializer<'de> for &mut Reader<'_, 'de> {
    type Error = Error;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.lexer.current() {
            Lexeme::Open => self.read_dynamic(visitor),
            _ => self.read_atom(visitor),
        }
    }

    fn deserialize_bool<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return visitor.visit_bool(false);
        }
        self.read_atom(visitor)
    }

    fn deserialize_i8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_signed(visitor)
    }

    fn deserialize_i16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_signed(visitor)
    }

    fn deserialize_i32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_signed(visitor)
    }

    fn deserialize_i64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_signed(visitor)
    }

    fn deserialize_i128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_signed(visitor)
    }

    fn deserialize_u8<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_unsigned(visitor)
    }

    fn deserialize_u16<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_unsigned(visitor)
    }

    fn deserialize_u32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_unsigned(visitor)
    }

    fn deserialize_u64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_unsigned(visitor)
    }

    fn deserialize_u128<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_unsigned(visitor)
    }

    fn deserialize_f32<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_float(visitor)
    }

    fn deserialize_f64<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_float(visitor)
    }

    fn deserialize_char<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_char(visitor);
        }
        self.read_atom(visitor)
    }

    fn deserialize_str<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_str(visitor);
        }
        self.read_atom(visitor)
    }

    fn deserialize_string<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return Zero::new().deserialize_bytes(visitor);
        }
        self.read_atom(visitor)
    }

    fn deserialize_byte_buf<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return visitor.visit_none();
        }
        visitor.visit_some(self)
    }

    fn deserialize_unit<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.take_nil()? {
            return visitor.visit_unit();
        }
        if self.lexer.current() != Lexeme::Open {
            return Err(self.mismatch(&visitor as &dyn Expected));
        }
        self.open_list()?;
        self.close_list()?;
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_seq(visitor, None)
    }

    fn deserialize_tuple<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_tuple(len, visitor, None)
    }

    fn deserialize_tuple_struct<V>(
        self,
        _name: &'static str,
        len: usize,
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_tuple(len, visitor, None)
    }

    fn deserialize_map<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_map(visitor, None)
    }

    fn deserialize_struct<V>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.read_record(name, fields, visitor)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.lexer.current() {
            Lexeme::Ident => visitor.visit_enum(VariantReader::new(self, false)),
            Lexeme::Open => {
                self.open_list()?;
                match self.lexer.current() {
                    Lexeme::Ident => {}
                    Lexeme::Eof => return Err(self.lexer.fail(Error::eof())),
                    _ => {
                        return Err(self.lexer.fail(Error::lexical(format!(
                            "got {}, want variant name",
                            self.lexer.describe()
                        ))))
                    }
                }
                let value = visitor.visit_enum(VariantReader::new(&mut *self, true))?;
                self.close_list()?;
                Ok(value)
            }
            _ => Err(self.mismatch(&visitor as &dyn Expected)),
        }
    }

    fn deserialize_identifier<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        if self.lexer.current() == Lexeme::Ident {
            let location = self.lexer.position();
            let name = self.lexer.text();
            self.lexer.advance()?;
            return visitor
                .visit_borrowed_str::<Error>(name)
                .map_err(|err| err.at(location));
        }
        self.read_atom(visitor)
    }

    fn deserialize_ignored_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.skip_value()?;
        visitor.visit_unit()
    }
}

/// Elements of a sequence or fixed array, up to the closing `)`.
struct ListAccess<'r, 'a, 'de> {
    reader: &'r mut Reader<'a, 'de>,
    capacity: Option<usize>,
    index: usize,
    element: Option<&'r Shape>,
}

impl<'r, 'a, 'de> ListAccess<'r, 'a, 'de> {
    fn new(
        reader: &'r mut Reader<'a, 'de>,
        capacity: Option<usize>,
        element: Option<&'r Shape>,
    ) -> Self {
        Self {
            reader,
            capacity,
            index: 0,
            element,
        }
    }
}

impl<'de> SeqAccess<'de> for ListAccess<'_, '_, 'de> {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        if self.reader.lexer.end_list()? {
            return match self.capacity {
                Some(len) if self.index < len => {
                    self.index += 1;
                    seed.deserialize(Zero::shaped(self.element)).map(Some)
                }
                _ => Ok(None),
            };
        }
        if let Some(len) = self.capacity {
            if self.index >= len {
                return Err(self.reader.lexer.fail(overflow(len)));
            }
        }
        self.index += 1;
        let value = match self.element {
            Some(shape) => seed.deserialize(Shaped::new(&mut *self.reader, shape))?,
            None => seed.deserialize(&mut *self.reader)?,
        };
        Ok(Some(value))
    }

    fn size_hint(&self) -> Option<usize> {
        self.capacity.map(|len| len.saturating_sub(self.index))
    }
}

/// Entries `(key value)` of an associative map.
struct PairAccess<'r, 'a, 'de> {
    reader: &'r mut Reader<'a, 'de>,
    entry: Option<(&'r Shape, &'r Shape)>,
}

impl<'r, 'a, 'de> PairAccess<'r, 'a, 'de> {
    fn new(reader: &'r mut Reader<'a, 'de>, entry: Option<(&'r Shape, &'r Shape)>) -> Self {
        Self { reader, entry }
    }
}

impl<'de> MapAccess<'de> for PairAccess<'_, '_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        if self.reader.lexer.end_list()? {
            return Ok(None);
        }
        self.reader.lexer.consume(Lexeme::Open)?;
        let key = match self.entry {
            Some((shape, _)) => seed.deserialize(Shaped::new(&mut *self.reader, shape))?,
            None => seed.deserialize(&mut *self.reader)?,
        };
        Ok(Some(key))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = match self.entry {
            Some((_, shape)) => seed.deserialize(Shaped::new(&mut *self.reader, shape))?,
            None => seed.deserialize(&mut *self.reader)?,
        };
        self.reader.lexer.consume(Lexeme::Close)?;
        Ok(value)
    }
}

/// Fields `(name value)` of a record.
struct FieldAccess<'r, 'a, 'de> {
    reader: &'r mut Reader<'a, 'de>,
    fields: &'static [&'static str],
}

impl<'r, 'a, 'de> FieldAccess<'r, 'a, 'de> {
    fn new(reader: &'r mut Reader<'a, 'de>, fields: &'static [&'static str]) -> Self {
        Self { reader, fields }
    }
}

impl<'de> MapAccess<'de> for FieldAccess<'_, '_, 'de> {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        let lexer = &mut *self.reader.lexer;
        if lexer.end_list()? {
            return Ok(None);
        }
        lexer.consume(Lexeme::Open)?;
        match lexer.current() {
            Lexeme::Ident => {}
            Lexeme::Eof => return Err(lexer.fail(Error::eof())),
            _ => {
                return Err(lexer.fail(Error::lexical(format!(
                    "got token {}, want field name",
                    lexer.describe()
                ))))
            }
        }
        let location = lexer.position();
        let name = lexer.text();
        if !self.fields.iter().any(|field| *field == name) {
            return Err(<Error as de::Error>::unknown_field(name, self.fields).at(location));
        }
        lexer.advance()?;
        seed.deserialize(BorrowedStrDeserializer::<Error>::new(name))
            .map(Some)
            .map_err(|err| err.at(location))
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = seed.deserialize(&mut *self.reader)?;
        self.reader.lexer.consume(Lexeme::Close)?;
        Ok(value)
    }
}

/// Variant name plus payload: `Variant`, `(Variant)`, `(Variant value)`,
/// `(Variant v1 v2)` or `(Variant (field value) ...)`.
struct VariantReader<'r, 'a, 'de> {
    reader: &'r mut Reader<'a, 'de>,
    in_list: bool,
}

impl<'r, 'a, 'de> VariantReader<'r, 'a, 'de> {
    fn new(reader: &'r mut Reader<'a, 'de>, in_list: bool) -> Self {
        Self { reader, in_list }
    }

    fn require_list(&self, kind: &str) -> Result<()> {
        if self.in_list {
            return Ok(());
        }
        Err(self.reader.lexer.fail(Error::shape(format!(
            "{kind} variant must be written as a list"
        ))))
    }
}

impl<'de, 'r, 'a> EnumAccess<'de> for VariantReader<'r, 'a, 'de> {
    type Error = Error;
    type Variant = Self;

    fn variant_seed<T>(self, seed: T) -> Result<(T::Value, Self::Variant)>
    where
        T: DeserializeSeed<'de>,
    {
        let location = self.reader.lexer.position();
        let name = self.reader.lexer.text();
        self.reader.lexer.advance()?;
        let variant = seed
            .deserialize(BorrowedStrDeserializer::<Error>::new(name))
            .map_err(|err| err.at(location))?;
        Ok((variant, self))
    }
}

impl<'de, 'r, 'a> VariantAccess<'de> for VariantReader<'r, 'a, 'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        Ok(())
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        self.require_list("newtype")?;
        seed.deserialize(self.reader)
    }

    fn tuple_variant<V>(self, len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.require_list("tuple")?;
        visitor.visit_seq(ListAccess::new(self.reader, Some(len), None))
    }

    fn struct_variant<V>(self, fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        self.require_list("struct")?;
        visitor.visit_map(FieldAccess::new(self.reader, fields))
    }
}
