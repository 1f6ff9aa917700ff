//! Data model of the schema compiler
//!
//! Three trees describe a declaration as it moves through the compiler:
//! [`ast`] holds names as written, [`resolved`] binds every reference to an
//! [`Identifier`], and [`decl`] holds the checked result with concrete
//! layouts. [`capabilities`] describes what the code generator can render.

pub mod ast;
pub mod bimap;
pub mod capabilities;
pub mod decl;
pub mod identifier;
pub mod layout;
pub mod names;
pub mod resolved;
pub mod types;

pub use bimap::{BiMap, BiMapConflict};
pub use capabilities::{Capabilities, MatrixShapes, SizeRange, SizeRanges};
pub use decl::{
    PackageContext, RecordField, RecordMember, RecordType, TypeDecl, TypeDeclKind, UnionCase,
    UnionType,
};
pub use identifier::Identifier;
pub use layout::{BitRange, PackedField, PackedMember, PackedMemberSpec, PackedType};
pub use names::{
    FieldName, NameError, PackageNameQualified, PackageNameUnqualified, TypeName, UnionCaseName,
};
pub use types::{IntegerKind, Type};
