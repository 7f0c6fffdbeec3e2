use std::fmt;

/// Concrete type of a dynamic slot, reified from its textual descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
    Bool,
    Int,
    Uint,
    Float,
    String,
    /// `[]T`
    Seq(Box<Shape>),
    /// `[N]T`
    Array(Box<Shape>, usize),
    /// `map[K]V`
    Map(Box<Shape>, Box<Shape>),
}

impl Shape {
    pub fn seq(element: Shape) -> Self {
        Shape::Seq(Box::new(element))
    }

    pub fn array(element: Shape, len: usize) -> Self {
        Shape::Array(Box::new(element), len)
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            Shape::Bool | Shape::Int | Shape::Uint | Shape::Float | Shape::String
        )
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => f.write_str("bool"),
            Shape::Int => f.write_str("int"),
            Shape::Uint => f.write_str("uint"),
            Shape::Float => f.write_str("float"),
            Shape::String => f.write_str("string"),
            Shape::Seq(element) => write!(f, "[]{element}"),
            Shape::Array(element, len) => write!(f, "[{len}]{element}"),
            Shape::Map(key, value) => write!(f, "map[{key}]{value}"),
        }
    }
}
