//! Type references, type kinds and visibility.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Visibility of a type or member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible everywhere.
    Public,
    /// Visible within the declaring assembly.
    Internal,
    /// Visible to derived types.
    Protected,
    /// Visible to the declaring type only.
    #[default]
    Private,
}

/// The kind of a declared type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// A reference type.
    #[default]
    Class,
    /// A value type.
    Struct,
    /// An interface.
    Interface,
}

/// The type of a value, parameter, field or return slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeRef {
    /// No value.
    Void,
    /// A boolean.
    Bool,
    /// A fixed-width integer.
    Int {
        /// Width in bits.
        width: u16,
        /// Two's complement when `true`.
        signed: bool,
    },
    /// A one-dimensional array of `element`.
    Array(Box<TypeRef>),
    /// Any other type, by full name.
    Named(String),
}

impl TypeRef {
    /// Signed 32-bit integer.
    pub fn i32() -> Self {
        TypeRef::Int {
            width: 32,
            signed: true,
        }
    }

    /// Unsigned 32-bit integer.
    pub fn u32() -> Self {
        TypeRef::Int {
            width: 32,
            signed: false,
        }
    }

    /// Signed 64-bit integer.
    pub fn i64() -> Self {
        TypeRef::Int {
            width: 64,
            signed: true,
        }
    }

    /// An array of `element`.
    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    /// Returns `true` for array types.
    pub fn is_array(&self) -> bool {
        matches!(self, TypeRef::Array(_))
    }

    /// Returns the element type of an array type.
    pub fn element(&self) -> Option<&TypeRef> {
        match self {
            TypeRef::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the bit width and signedness of scalar types. Booleans are one
    /// unsigned bit.
    pub fn scalar_shape(&self) -> Option<(u16, bool)> {
        match self {
            TypeRef::Bool => Some((1, false)),
            TypeRef::Int { width, signed } => Some((*width, *signed)),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Bool => write!(f, "bool"),
            TypeRef::Int { width, signed } => {
                write!(f, "{}{width}", if *signed { 'i' } else { 'u' })
            }
            TypeRef::Array(element) => write!(f, "{element}[]"),
            TypeRef::Named(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_types() {
        assert_eq!(TypeRef::i32().to_string(), "i32");
        assert_eq!(TypeRef::u32().to_string(), "u32");
        assert_eq!(TypeRef::array_of(TypeRef::Bool).to_string(), "bool[]");
        assert_eq!(
            TypeRef::array_of(TypeRef::array_of(TypeRef::i64())).to_string(),
            "i64[][]"
        );
        assert_eq!(TypeRef::Named("Demo.Point".into()).to_string(), "Demo.Point");
    }

    #[test]
    fn scalar_shapes() {
        assert_eq!(TypeRef::Bool.scalar_shape(), Some((1, false)));
        assert_eq!(TypeRef::i32().scalar_shape(), Some((32, true)));
        assert_eq!(TypeRef::array_of(TypeRef::Bool).scalar_shape(), None);
    }

    #[test]
    fn element_of_array() {
        let ty = TypeRef::array_of(TypeRef::u32());
        assert!(ty.is_array());
        assert_eq!(ty.element(), Some(&TypeRef::u32()));
        assert_eq!(TypeRef::Bool.element(), None);
    }

    #[test]
    fn json_shape() {
        let json = serde_json::to_string(&TypeRef::i32()).unwrap();
        assert_eq!(json, r#"{"Int":{"width":32,"signed":true}}"#);
        let vis: Visibility = serde_json::from_str("\"public\"").unwrap();
        assert_eq!(vis, Visibility::Public);
    }
}
