//! Type descriptors for dynamic slots.
//!
//! A dynamic slot announces its concrete type in-band with a descriptor such as
//! `"map[string][]int"`. The grammar is small and recursive:
//!
//! ```text
//! T := int | uint | float | bool | string | []T | [N]T | map[T]T
//! ```

use std::str::FromStr;

use tracing::trace;

use crate::options::DEFAULT_MAX_DEPTH;
use crate::types::Shape;
use crate::{Error, Result};

const ATOMS: [(&str, Shape); 5] = [
    ("int", Shape::Int),
    ("uint", Shape::Uint),
    ("float", Shape::Float),
    ("bool", Shape::Bool),
    ("string", Shape::String),
];

/// Largest length accepted in a `[N]T` descriptor.
pub const MAX_ARRAY_LEN: usize = 1 << 16;

/// Resolves a type descriptor into a [`Shape`].
///
/// Unknown leaf names fail with [`ErrorKind::UnknownType`](crate::ErrorKind::UnknownType)
/// naming the leaf that could not be resolved. Nesting is limited to
/// [`DEFAULT_MAX_DEPTH`] levels; see [`resolve_with_depth`].
pub fn resolve(descriptor: &str) -> Result<Shape> {
    resolve_with_depth(descriptor, DEFAULT_MAX_DEPTH)
}

/// Like [`resolve`], failing with [`ErrorKind::RecursionLimit`](crate::ErrorKind::RecursionLimit)
/// once the descriptor nests more than `max_depth` container types.
pub fn resolve_with_depth(descriptor: &str, max_depth: usize) -> Result<Shape> {
    let shape = Resolver { max_depth }.resolve(descriptor, max_depth)?;
    trace!(descriptor, %shape, "resolved type descriptor");
    Ok(shape)
}

struct Resolver {
    max_depth: usize,
}

impl Resolver {
    fn resolve(&self, descriptor: &str, remaining: usize) -> Result<Shape> {
        if let Some((_, atom)) = ATOMS.iter().find(|(name, _)| *name == descriptor) {
            return Ok(atom.clone());
        }
        if !descriptor.starts_with('[') && !descriptor.starts_with("map[") {
            return Err(Error::unknown_type(descriptor));
        }
        let Some(remaining) = remaining.checked_sub(1) else {
            return Err(Error::recursion_limit(self.max_depth).with_detail("in type descriptor"));
        };

        if let Some(element) = descriptor.strip_prefix("[]") {
            return Ok(Shape::seq(self.resolve(element, remaining)?));
        }

        if let Some(rest) = descriptor.strip_prefix('[') {
            let close = rest
                .find(']')
                .ok_or_else(|| Error::unknown_type(descriptor))?;
            let len = rest[..close].parse::<usize>().map_err(|_| {
                Error::unknown_type(descriptor).with_detail("array length must be a decimal integer")
            })?;
            if len > MAX_ARRAY_LEN {
                return Err(Error::unknown_type(descriptor)
                    .with_detail(&format!("array length exceeds {MAX_ARRAY_LEN}")));
            }
            return Ok(Shape::array(self.resolve(&rest[close + 1..], remaining)?, len));
        }

        let rest = &descriptor["map[".len()..];
        let close = matching_bracket(rest).ok_or_else(|| Error::unknown_type(descriptor))?;
        let key = self.resolve(&rest[..close], remaining)?;
        let value = self.resolve(&rest[close + 1..], remaining)?;
        Ok(Shape::map(key, value))
    }
}

/// Byte index of the `]` closing a `[` that has already been consumed.
fn matching_bracket(rest: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, byte) in rest.bytes().enumerate() {
        match byte {
            b'[' => depth += 1,
            b']' if depth == 0 => return Some(idx),
            b']' => depth -= 1,
            _ => {}
        }
    }
    None
}

impl FromStr for Shape {
    type Err = Error;

    fn from_str(descriptor: &str) -> Result<Self> {
        resolve(descriptor)
    }
}
