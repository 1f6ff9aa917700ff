//! Type checking errors

use derive_more::Display;
use miette::Diagnostic;
use num_bigint::BigUint;
use pr_model::{FieldName, TypeName, UnionCaseName};
use pr_span::Position;
use thiserror::Error;

/// Stable code of a [`CheckError`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckErrorCode {
    /// A size, count or shape the code generator cannot render
    #[display("SIZE_UNSUPPORTED")]
    SizeUnsupported,
    /// A string encoding the code generator cannot render
    #[display("ENCODING_UNSUPPORTED")]
    EncodingUnsupported,
    /// A bit size used where whole octets are required
    #[display("SIZE_NOT_OCTETS")]
    SizeNotOctets,
    /// A record or packed field name used twice
    #[display("FIELD_NAME_DUPLICATE")]
    FieldNameDuplicate,
    /// A union case name used twice
    #[display("CASE_NAME_DUPLICATE")]
    CaseNameDuplicate,
    /// A boolean-set flag used twice
    #[display("BOOLEAN_SET_FIELD_DUPLICATE")]
    BooleanSetFieldDuplicate,
    /// More flags than the set has bits
    #[display("BOOLEAN_SET_TOO_SMALL")]
    BooleanSetTooSmall,
    /// A packed field whose type is not an integer
    #[display("PACKED_FIELD_NOT_INTEGER")]
    PackedFieldNotInteger,
    /// A packed record whose total width is not supported
    #[display("PACKED_SIZE_UNSUPPORTED")]
    PackedSizeUnsupported,
    /// A vector or matrix of a non-scalar element
    #[display("ELEMENT_NOT_SCALAR")]
    ElementNotScalar,
    /// A zero size where a positive one is required
    #[display("SIZE_ZERO")]
    SizeZero,
    /// A union without cases
    #[display("UNION_EMPTY")]
    UnionEmpty,
}

/// A resolved declaration the code generator cannot render, or an
/// inconsistent one
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CheckError {
    /// Rejected by the capability descriptor
    #[error("unsupported {what} {value}")]
    #[diagnostic(code(check::size_unsupported), help("supported: {supported}"))]
    SizeUnsupported {
        /// What was measured, e.g. "integer size"
        what: &'static str,
        /// The rejected value
        value: String,
        /// The supported values
        supported: String,
        /// Where the value occurs
        position: Position,
    },

    /// Rejected string encoding
    #[error("unsupported string encoding `{encoding}`")]
    #[diagnostic(code(check::encoding_unsupported), help("supported: {supported}"))]
    EncodingUnsupported {
        /// The rejected encoding
        encoding: String,
        /// The supported encodings
        supported: String,
        /// Where the type occurs
        position: Position,
    },

    /// Whole octets required
    #[error("size of {bits} bits is not a whole number of octets")]
    #[diagnostic(code(check::size_not_octets))]
    SizeNotOctets {
        /// The size found
        bits: BigUint,
        /// Where it occurs
        position: Position,
    },

    /// Repeated field name
    #[error("field `{name}` is declared more than once")]
    #[diagnostic(code(check::field_name_duplicate))]
    FieldNameDuplicate {
        /// The repeated name
        name: FieldName,
        /// Where the second field is declared
        position: Position,
    },

    /// Repeated case name
    #[error("case `{name}` is declared more than once")]
    #[diagnostic(code(check::case_name_duplicate))]
    CaseNameDuplicate {
        /// The repeated name
        name: UnionCaseName,
        /// Where the second case is declared
        position: Position,
    },

    /// Repeated flag name
    #[error("flag `{name}` appears more than once in the boolean set")]
    #[diagnostic(code(check::boolean_set_field_duplicate))]
    BooleanSetFieldDuplicate {
        /// The repeated name
        name: FieldName,
        /// Where the second flag occurs
        position: Position,
    },

    /// More flags than bits
    #[error("a boolean set of {size_octets} octet(s) cannot hold {flags} flags")]
    #[diagnostic(code(check::boolean_set_too_small))]
    BooleanSetTooSmall {
        /// Number of flags declared
        flags: usize,
        /// Size of the set
        size_octets: BigUint,
        /// Where the set occurs
        position: Position,
    },

    /// A packed field that is not an integer
    #[error("packed field `{name}` has type {found}; packed fields must be integers")]
    #[diagnostic(code(check::packed_field_not_integer))]
    PackedFieldNotInteger {
        /// The field
        name: FieldName,
        /// Its checked type
        found: String,
        /// Where the field is declared
        position: Position,
    },

    /// A packed record of an unsupported total width
    #[error("packed record `{name}` is {size_bits} bits wide, which is not supported")]
    #[diagnostic(code(check::packed_size_unsupported), help("supported: {supported}"))]
    PackedSizeUnsupported {
        /// The declaration
        name: TypeName,
        /// Its total width
        size_bits: BigUint,
        /// The supported widths
        supported: String,
        /// Where the declaration occurs
        position: Position,
    },

    /// Vector or matrix of a non-scalar
    #[error("element type {found} is not an integer or float")]
    #[diagnostic(code(check::element_not_scalar))]
    ElementNotScalar {
        /// The element type
        found: String,
        /// Where the element type occurs
        position: Position,
    },

    /// Zero where a positive size is required
    #[error("{what} must not be zero")]
    #[diagnostic(code(check::size_zero))]
    SizeZero {
        /// What was measured, e.g. "padding"
        what: &'static str,
        /// Where the size occurs
        position: Position,
    },

    /// A union without cases
    #[error("union `{name}` has no cases")]
    #[diagnostic(code(check::union_empty))]
    UnionEmpty {
        /// The declaration
        name: TypeName,
        /// Where it occurs
        position: Position,
    },
}

impl CheckError {
    /// The stable error code
    pub fn error_code(&self) -> CheckErrorCode {
        match self {
            Self::SizeUnsupported { .. } => CheckErrorCode::SizeUnsupported,
            Self::EncodingUnsupported { .. } => CheckErrorCode::EncodingUnsupported,
            Self::SizeNotOctets { .. } => CheckErrorCode::SizeNotOctets,
            Self::FieldNameDuplicate { .. } => CheckErrorCode::FieldNameDuplicate,
            Self::CaseNameDuplicate { .. } => CheckErrorCode::CaseNameDuplicate,
            Self::BooleanSetFieldDuplicate { .. } => CheckErrorCode::BooleanSetFieldDuplicate,
            Self::BooleanSetTooSmall { .. } => CheckErrorCode::BooleanSetTooSmall,
            Self::PackedFieldNotInteger { .. } => CheckErrorCode::PackedFieldNotInteger,
            Self::PackedSizeUnsupported { .. } => CheckErrorCode::PackedSizeUnsupported,
            Self::ElementNotScalar { .. } => CheckErrorCode::ElementNotScalar,
            Self::SizeZero { .. } => CheckErrorCode::SizeZero,
            Self::UnionEmpty { .. } => CheckErrorCode::UnionEmpty,
        }
    }

    /// Returns the position the error refers to
    pub fn position(&self) -> Position {
        match self {
            Self::SizeUnsupported { position, .. }
            | Self::EncodingUnsupported { position, .. }
            | Self::SizeNotOctets { position, .. }
            | Self::FieldNameDuplicate { position, .. }
            | Self::CaseNameDuplicate { position, .. }
            | Self::BooleanSetFieldDuplicate { position, .. }
            | Self::BooleanSetTooSmall { position, .. }
            | Self::PackedFieldNotInteger { position, .. }
            | Self::PackedSizeUnsupported { position, .. }
            | Self::ElementNotScalar { position, .. }
            | Self::SizeZero { position, .. }
            | Self::UnionEmpty { position, .. } => *position,
        }
    }
}
