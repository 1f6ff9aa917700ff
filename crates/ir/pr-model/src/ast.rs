//! Unresolved statement and type trees
//!
//! This is what the statement parser produces: every reference to another
//! type is still a name, possibly qualified by an import alias. The resolver
//! converts each node into its counterpart in [`crate::resolved`].

use crate::names::{
    FieldName, PackageNameQualified, PackageNameUnqualified, TypeName, UnionCaseName,
};
use crate::types::IntegerKind;
use num_bigint::BigUint;
use pr_span::Position;

/// A reference to a declared type by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeReference {
    /// Import alias, if the type lives in another package
    pub package: Option<PackageNameUnqualified>,
    /// Name of the type
    pub name: TypeName,
    /// Where the reference occurs
    pub position: Position,
}

/// Unresolved size expression
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

/// Unresolved type expression
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
    /// A declared type, by name
    Reference(TypeReference),
    /// `(type-of T a.b)`: the declared type of a field path
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
    /// `(field name T)`
    Field {
        /// Field name
        name: FieldName,
        /// Field type
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(padding-octets S)`
    PaddingOctets {
        /// Padding size in octets
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}

/// Member of a `packed` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedMember {
    /// `(field name T)`
    Field {
        /// Field name
        name: FieldName,
        /// Field type; must check to an integer type
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(padding-bits S)`
    PaddingBits {
        /// Padding size in bits
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}

/// `(case name T)` in a `union` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    /// Case name
    pub name: UnionCaseName,
    /// Case type
    pub ty: TypeExpr,
    /// Where it occurs
    pub position: Position,
}

/// Body of a type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclBody {
    /// Byte-aligned record
    Record(Vec<RecordMember>),
    /// Bit-packed record
    Packed(Vec<PackedMember>),
    /// Tag-free union
    Union(Vec<UnionCase>),
}

/// `(record|packed|union Name [...])`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Declared name
    pub name: TypeName,
    /// Members
    pub body: DeclBody,
    /// Where the declaration starts
    pub position: Position,
}

/// A top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `(package-begin a.b.c)`
    PackageBegin {
        /// Package being opened
        name: PackageNameQualified,
        /// Where it occurs
        position: Position,
    },
    /// `(package-end)`
    PackageEnd {
        /// Where it occurs
        position: Position,
    },
    /// `(import a.b.c as alias)`
    Import {
        /// Imported package
        package: PackageNameQualified,
        /// Local alias for its types
        alias: PackageNameUnqualified,
        /// Where it occurs
        position: Position,
    },
    /// A type declaration
    TypeDecl(TypeDecl),
    /// `(:type T)`: show the checked form of a type expression
    CommandType {
        /// Expression to check
        ty: TypeExpr,
        /// Where it occurs
        position: Position,
    },
    /// `(:size S)`: evaluate a size expression
    CommandSize {
        /// Expression to evaluate
        size: SizeExpr,
        /// Where it occurs
        position: Position,
    },
}

impl Statement {
    /// Where the statement starts
    pub fn position(&self) -> Position {
        match self {
            Self::PackageBegin { position, .. }
            | Self::PackageEnd { position }
            | Self::Import { position, .. }
            | Self::CommandType { position, .. }
            | Self::CommandSize { position, .. } => *position,
            Self::TypeDecl(decl) => decl.position,
        }
    }
}
