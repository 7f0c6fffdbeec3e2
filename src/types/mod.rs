mod shape;
mod token;
mod value;

pub use shape::Shape;
pub use token::Token;
pub use value::{Map, Value};
