//! Checked types
//!
//! A [`Type`] is the checker's verdict on a type expression: every size has
//! been evaluated and validated, so [`Type::size_in_bits`] is always defined.

use crate::identifier::Identifier;
use crate::names::{FieldName, PackageNameQualified, TypeName};
use num_bigint::BigUint;
use std::fmt;

/// Signedness and normalization of an integer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntegerKind {
    /// Two's complement signed integer
    Signed,
    /// Unsigned integer
    Unsigned,
    /// Signed integer mapped onto `[-1, 1]`
    SignedNormalized,
    /// Unsigned integer mapped onto `[0, 1]`
    UnsignedNormalized,
}

impl IntegerKind {
    /// Keyword used for this kind in source text
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Signed => "signed",
            Self::Unsigned => "unsigned",
            Self::SignedNormalized => "signed-normalized",
            Self::UnsignedNormalized => "unsigned-normalized",
        }
    }

    /// Parses a source keyword
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "signed" => Some(Self::Signed),
            "unsigned" => Some(Self::Unsigned),
            "signed-normalized" => Some(Self::SignedNormalized),
            "unsigned-normalized" => Some(Self::UnsignedNormalized),
            _ => None,
        }
    }
}

/// A fully checked type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// Integer of some kind and width
    Integer {
        /// Signedness and normalization
        kind: IntegerKind,
        /// Width in bits
        size_bits: BigUint,
    },
    /// IEEE 754 float
    Float {
        /// Width in bits
        size_bits: BigUint,
    },
    /// Fixed-length vector of scalars
    Vector {
        /// Element type, always integer or float
        element: Box<Type>,
        /// Number of elements
        count: BigUint,
    },
    /// Fixed-shape matrix of scalars
    Matrix {
        /// Element type, always integer or float
        element: Box<Type>,
        /// Number of columns
        width: BigUint,
        /// Number of rows
        height: BigUint,
    },
    /// Set of named flags stored in a whole number of octets
    BooleanSet {
        /// Flag names, in bit order
        fields: Vec<FieldName>,
        /// Storage size in octets
        size_octets: BigUint,
    },
    /// Fixed-capacity encoded string
    String {
        /// Encoding name
        encoding: String,
        /// Capacity in octets
        size_octets: BigUint,
    },
    /// A declared record, packed record or union
    User {
        /// Identifier of the declaration
        identifier: Identifier,
        /// Declaring package
        package: PackageNameQualified,
        /// Declared name
        name: TypeName,
        /// Size of the declaration in bits
        size_bits: BigUint,
    },
}

impl Type {
    /// Size of a value of this type, in bits
    pub fn size_in_bits(&self) -> BigUint {
        match self {
            Self::Integer { size_bits, .. }
            | Self::Float { size_bits }
            | Self::User { size_bits, .. } => size_bits.clone(),
            Self::Vector { element, count } => element.size_in_bits() * count,
            Self::Matrix {
                element,
                width,
                height,
            } => element.size_in_bits() * width * height,
            Self::BooleanSet { size_octets, .. } | Self::String { size_octets, .. } => {
                size_octets * 8u32
            }
        }
    }

    /// Whether this is an integer or float type
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Integer { .. } | Self::Float { .. })
    }

    /// Whether this is an integer type of any kind
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Integer { .. })
    }

    /// Identifier of the declaration, for user-defined types
    pub fn identifier(&self) -> Option<&Identifier> {
        match self {
            Self::User { identifier, .. } => Some(identifier),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer { kind, size_bits } => {
                write!(formatter, "(integer {} {size_bits})", kind.keyword())
            }
            Self::Float { size_bits } => write!(formatter, "(float {size_bits})"),
            Self::Vector { element, count } => write!(formatter, "(vector {element} {count})"),
            Self::Matrix {
                element,
                width,
                height,
            } => write!(formatter, "(matrix {element} {width} {height})"),
            Self::BooleanSet {
                fields,
                size_octets,
            } => {
                write!(formatter, "(boolean-set {size_octets} [")?;
                for (index, field) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(formatter, " ")?;
                    }
                    write!(formatter, "{field}")?;
                }
                write!(formatter, "])")
            }
            Self::String {
                encoding,
                size_octets,
            } => write!(formatter, "(string {size_octets} {encoding:?})"),
            Self::User { package, name, .. } => write!(formatter, "{package}.{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn float(bits: u32) -> Type {
        Type::Float {
            size_bits: BigUint::from(bits),
        }
    }

    #[test]
    fn test_compound_sizes() {
        let vector = Type::Vector {
            element: Box::new(float(32)),
            count: BigUint::from(4u32),
        };
        assert_eq!(vector.size_in_bits(), BigUint::from(128u32));

        let matrix = Type::Matrix {
            element: Box::new(float(64)),
            width: BigUint::from(3u32),
            height: BigUint::from(2u32),
        };
        assert_eq!(matrix.size_in_bits(), BigUint::from(384u32));

        let string = Type::String {
            encoding: "UTF-8".to_owned(),
            size_octets: BigUint::from(16u32),
        };
        assert_eq!(string.size_in_bits(), BigUint::from(128u32));
    }

    #[test]
    fn test_display_matches_source_syntax() {
        let integer = Type::Integer {
            kind: IntegerKind::UnsignedNormalized,
            size_bits: BigUint::from(8u32),
        };
        assert_eq!(integer.to_string(), "(integer unsigned-normalized 8)");

        let set = Type::BooleanSet {
            fields: vec![FieldName::new("a").unwrap(), FieldName::new("b").unwrap()],
            size_octets: BigUint::from(1u32),
        };
        assert_eq!(set.to_string(), "(boolean-set 1 [a b])");
    }

    #[test]
    fn test_integer_keywords_round_trip() {
        for kind in [
            IntegerKind::Signed,
            IntegerKind::Unsigned,
            IntegerKind::SignedNormalized,
            IntegerKind::UnsignedNormalized,
        ] {
            assert_eq!(IntegerKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(IntegerKind::from_keyword("natural"), None);
    }
}
