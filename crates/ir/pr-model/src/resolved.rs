//! Resolved type trees
//!
//! Same shape as [`crate::ast`], but every type reference names the
//! [`Identifier`] of its declaration and the package that owns it. A value of
//! these types cannot contain a dangling name.

use crate::identifier::Identifier;
use crate::names::{FieldName, PackageNameQualified, TypeName, UnionCaseName};
use crate::types::IntegerKind;
use num_bigint::BigUint;
use pr_span::Position;

/// A reference bound to a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    /// Identifier of the referenced declaration
    pub identifier: Identifier,
    /// Package declaring the type
    pub package: PackageNameQualified,
    /// Name of the type
    pub name: TypeName,
    /// Where the reference occurs
    pub position: Position,
}

/// Resolved size expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizeExpr {
    /// Literal size
    Constant {
        /// The value
        value: BigUint,
        /// Where it occurs
        position: Position,
    },
    /// Size of a type, in octets
    InOctets {
        /// The measured type
        of: Box<TypeExpr>,
        /// Where it occurs
        position: Position,
    },
    /// Size of a type, in bits
    InBits {
        /// The measured type
        of: Box<TypeExpr>,
        /// Where it occurs
        position: Position,
    },
}

impl SizeExpr {
    /// Where the expression starts
    pub fn position(&self) -> Position {
        match self {
            Self::Constant { position, .. }
            | Self::InOctets { position, .. }
            | Self::InBits { position, .. } => *position,
        }
    }
}

/// Resolved type expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `(integer <kind> N)`
    Integer {
        /// Signedness and normalization
        kind: IntegerKind,
        /// Width in bits
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(float N)`
    Float {
        /// Width in bits
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(vector T N)`
    Vector {
        /// Element type
        element: Box<TypeExpr>,
        /// Number of elements
        count: SizeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(matrix T W H)`
    Matrix {
        /// Element type
        element: Box<TypeExpr>,
        /// Number of columns
        width: SizeExpr,
        /// Number of rows
        height: SizeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(boolean-set S [f ...])`
    BooleanSet {
        /// Size in octets
        size: SizeExpr,
        /// Flag names in declaration order
        fields: Vec<(FieldName, Position)>,
        /// Where it occurs
        position: Position,
    },
    /// `(string S "ENC")`
    String {
        /// Size in octets
        size: SizeExpr,
        /// Encoding name
        encoding: String,
        /// Where it occurs
        position: Position,
    },
    /// A declared type
    Reference(TypeReference),
    /// The declared type of a field path; the path is known to exist
    TypeOf {
        /// The type the path starts from
        reference: TypeReference,
        /// Field names to follow, outermost first
        path: Vec<FieldName>,
        /// Where it occurs
        position: Position,
    },
}

impl TypeExpr {
    /// Where the expression starts
    pub fn position(&self) -> Position {
        match self {
            Self::Integer { position, .. }
            | Self::Float { position, .. }
            | Self::Vector { position, .. }
            | Self::Matrix { position, .. }
            | Self::BooleanSet { position, .. }
            | Self::String { position, .. }
            | Self::TypeOf { position, .. } => *position,
            Self::Reference(reference) => reference.position,
        }
    }
}

/// Member of a `record` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMember {
    /// Named field
    Field {
        /// Field name
        name: FieldName,
        /// Field type
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// Padding in octets
    PaddingOctets {
        /// Padding size
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}

/// Member of a `packed` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedMember {
    /// Named field
    Field {
        /// Field name
        name: FieldName,
        /// Field type
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// Padding in bits
    PaddingBits {
        /// Padding size
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}

/// Union case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    /// Case name
    pub name: UnionCaseName,
    /// Case type
    pub ty: TypeExpr,
    /// Where it occurs
    pub position: Position,
}

/// Body of a resolved declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclBody {
    /// Byte-aligned record
    Record(Vec<RecordMember>),
    /// Bit-packed record
    Packed(Vec<PackedMember>),
    /// Tag-free union
    Union(Vec<UnionCase>),
}

/// A declaration that owns its identifier and package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Freshly allocated identifier
    pub identifier: Identifier,
    /// Package the declaration belongs to
    pub package: PackageNameQualified,
    /// Declared name
    pub name: TypeName,
    /// Members
    pub body: DeclBody,
    /// Where the declaration starts
    pub position: Position,
}

/// A resolved top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// A package was opened
    PackageBegin {
        /// Package being opened
        name: PackageNameQualified,
        /// Where it occurs
        position: Position,
    },
    /// The open package was closed
    PackageEnd {
        /// Package being closed
        name: PackageNameQualified,
        /// Where it occurs
        position: Position,
    },
    /// An import was bound; the imported package is already loaded
    Import {
        /// Imported package
        package: PackageNameQualified,
        /// Where it occurs
        position: Position,
    },
    /// A type declaration
    TypeDecl(TypeDecl),
    /// `(:type T)`
    CommandType {
        /// Expression to check
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(:size S)`
    CommandSize {
        /// Expression to evaluate
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}
