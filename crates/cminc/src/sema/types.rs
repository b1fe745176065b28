//! Expression types

use std::fmt;

use crate::ast::TypeSpec;

/// Type of an expression, declaration or symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpType {
    Integer,
    Void,
    IntegerArray,
}

impl ExpType {
    /// Return type named by a function's type token; anything but `int` is `Void`
    pub fn from_return_spec(spec: Option<TypeSpec>) -> Self {
        match spec {
            Some(TypeSpec::Int) => ExpType::Integer,
            Some(TypeSpec::Void) | None => ExpType::Void,
        }
    }

    /// Storage type of a variable or parameter
    pub fn storage(is_array: bool) -> Self {
        if is_array {
            ExpType::IntegerArray
        } else {
            ExpType::Integer
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExpType::Integer => "Integer",
            ExpType::Void => "Void",
            ExpType::IntegerArray => "IntegerArray",
        }
    }
}

impl fmt::Display for ExpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
