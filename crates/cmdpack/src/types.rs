//! # Type Descriptors
//!
//! The closed, language-neutral type model. Every exported parameter and return value is
//! described by exactly one of these, and the codec has a routine for each.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A tagged description of one wire type.
///
/// `Display` renders the neutral grammar (`i32`, `u64`, `f64`, `bool`, `string`,
/// `sequence<T>`, `array<T, L>`, `void`), which the signature translator accepts back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// Two's complement or unsigned integer of 8, 16, 32 or 64 bits.
    Int { bits: u8, signed: bool },
    /// IEEE 754 float of 32 or 64 bits.
    Float { bits: u8 },
    Bool,
    /// Length-prefixed UTF-8.
    String,
    /// Count-prefixed sequence.
    Sequence { element: Box<TypeDescriptor> },
    /// Exactly `len` elements, no prefix.
    Array { element: Box<TypeDescriptor>, len: u64 },
    Void,
}

impl TypeDescriptor {
    pub const I8: Self = Self::Int { bits: 8, signed: true };
    pub const I16: Self = Self::Int { bits: 16, signed: true };
    pub const I32: Self = Self::Int { bits: 32, signed: true };
    pub const I64: Self = Self::Int { bits: 64, signed: true };
    pub const U8: Self = Self::Int { bits: 8, signed: false };
    pub const U16: Self = Self::Int { bits: 16, signed: false };
    pub const U32: Self = Self::Int { bits: 32, signed: false };
    pub const U64: Self = Self::Int { bits: 64, signed: false };
    pub const F32: Self = Self::Float { bits: 32 };
    pub const F64: Self = Self::Float { bits: 64 };

    pub fn sequence(element: TypeDescriptor) -> Self {
        Self::Sequence { element: Box::new(element) }
    }

    pub fn array(element: TypeDescriptor, len: u64) -> Self {
        Self::Array { element: Box::new(element), len }
    }

    /// Encoded size in bytes when it does not depend on the value.
    pub fn fixed_size(&self) -> Option<u64> {
        match self {
            Self::Int { bits, .. } | Self::Float { bits } => Some(u64::from(*bits) / 8),
            Self::Bool => Some(1),
            Self::Void => Some(0),
            Self::Array { element, len } => element.fixed_size()?.checked_mul(*len),
            Self::String | Self::Sequence { .. } => None,
        }
    }

    /// True if every value of this type encodes to zero bytes.
    pub fn is_zero_sized(&self) -> bool {
        self.fixed_size() == Some(0)
    }

    /// Smallest number of bytes any value of this type occupies, given the size field width.
    pub fn min_size(&self, size_width: usize) -> u64 {
        match self {
            Self::String | Self::Sequence { .. } => size_width as u64,
            Self::Array { element, len } => element.min_size(size_width).saturating_mul(*len),
            _ => self.fixed_size().unwrap_or(0),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { bits, signed: true } => write!(f, "i{}", bits),
            Self::Int { bits, signed: false } => write!(f, "u{}", bits),
            Self::Float { bits } => write!(f, "f{}", bits),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Sequence { element } => write!(f, "sequence<{}>", element),
            Self::Array { element, len } => write!(f, "array<{}, {}>", element, len),
            Self::Void => write!(f, "void"),
        }
    }
}
