//! Checked declarations and packages

use crate::identifier::Identifier;
use crate::layout::PackedType;
use crate::names::{FieldName, PackageNameQualified, TypeName, UnionCaseName};
use crate::types::Type;
use indexmap::IndexMap;
use num_bigint::BigUint;
use pr_span::Position;
use std::rc::Rc;

/// A named record field with its octet offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// Field name
    pub name: FieldName,
    /// Checked type
    pub ty: Type,
    /// Offset from the start of the record, in octets
    pub offset_octets: BigUint,
    /// Where the field is declared
    pub position: Position,
}

/// A member of a record, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordMember {
    /// Named field
    Field(RecordField),
    /// Explicit padding
    Padding {
        /// Offset from the start of the record, in octets
        offset_octets: BigUint,
        /// Padding size in octets
        size_octets: BigUint,
        /// Where the padding is declared
        position: Position,
    },
}

/// Byte-aligned record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordType {
    members: Vec<RecordMember>,
    fields: IndexMap<FieldName, usize>,
    size_octets: BigUint,
}

impl RecordType {
    /// Assembles a record from members whose offsets are already assigned
    pub fn new(members: Vec<RecordMember>, size_octets: BigUint) -> Self {
        let fields = members
            .iter()
            .enumerate()
            .filter_map(|(index, member)| match member {
                RecordMember::Field(field) => Some((field.name.clone(), index)),
                RecordMember::Padding { .. } => None,
            })
            .collect();
        Self {
            members,
            fields,
            size_octets,
        }
    }

    /// Members in declaration order
    pub fn members(&self) -> &[RecordMember] {
        &self.members
    }

    /// Looks up a field by name
    pub fn field(&self, name: &FieldName) -> Option<&RecordField> {
        match &self.members[*self.fields.get(name)?] {
            RecordMember::Field(field) => Some(field),
            RecordMember::Padding { .. } => None,
        }
    }

    /// Size in octets
    pub fn size_in_octets(&self) -> &BigUint {
        &self.size_octets
    }
}

/// One case of a union
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionCase {
    /// Case name
    pub name: UnionCaseName,
    /// Checked type
    pub ty: Type,
    /// Where the case is declared
    pub position: Position,
}

/// Tag-free union; as large as its largest case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionType {
    cases: IndexMap<UnionCaseName, UnionCase>,
    size_bits: BigUint,
}

impl UnionType {
    /// Assembles a union from cases with distinct names
    pub fn new(cases: Vec<UnionCase>) -> Self {
        let size_bits = cases
            .iter()
            .map(|case| case.ty.size_in_bits())
            .max()
            .unwrap_or_default();
        let cases = cases
            .into_iter()
            .map(|case| (case.name.clone(), case))
            .collect();
        Self { cases, size_bits }
    }

    /// Cases in declaration order
    pub fn cases(&self) -> impl Iterator<Item = &UnionCase> {
        self.cases.values()
    }

    /// Looks up a case by name
    pub fn case(&self, name: &UnionCaseName) -> Option<&UnionCase> {
        self.cases.get(name)
    }

    /// Size in bits
    pub fn size_in_bits(&self) -> &BigUint {
        &self.size_bits
    }
}

/// The three kinds of declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDeclKind {
    /// `record`
    Record(RecordType),
    /// `packed`
    Packed(PackedType),
    /// `union`
    Union(UnionType),
}

/// A checked type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    /// Unique identifier
    pub identifier: Identifier,
    /// Owning package
    pub package: PackageNameQualified,
    /// Declared name
    pub name: TypeName,
    /// Where the declaration starts
    pub position: Position,
    /// Layout
    pub kind: TypeDeclKind,
}

impl TypeDecl {
    /// Size of a value of this type, in bits
    pub fn size_in_bits(&self) -> BigUint {
        match &self.kind {
            TypeDeclKind::Record(record) => record.size_in_octets() * 8u32,
            TypeDeclKind::Packed(packed) => packed.size_in_bits().clone(),
            TypeDeclKind::Union(union) => union.size_in_bits().clone(),
        }
    }

    /// Declared type of a member, as used by `type-of` paths
    ///
    /// Record and packed fields are matched by field name, union cases by
    /// case name.
    pub fn field_type(&self, name: &FieldName) -> Option<&Type> {
        match &self.kind {
            TypeDeclKind::Record(record) => record.field(name).map(|field| &field.ty),
            TypeDeclKind::Packed(packed) => packed.field(name).map(|field| &field.ty),
            TypeDeclKind::Union(union) => {
                let case_name = UnionCaseName::new(name.as_str()).ok()?;
                union.case(&case_name).map(|case| &case.ty)
            }
        }
    }

    /// The checked type that refers to this declaration
    pub fn as_type(&self) -> Type {
        Type::User {
            identifier: self.identifier.clone(),
            package: self.package.clone(),
            name: self.name.clone(),
            size_bits: self.size_in_bits(),
        }
    }

    /// `record`, `packed` or `union`
    pub fn keyword(&self) -> &'static str {
        match self.kind {
            TypeDeclKind::Record(_) => "record",
            TypeDeclKind::Packed(_) => "packed",
            TypeDeclKind::Union(_) => "union",
        }
    }
}

/// A successfully compiled package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageContext {
    name: PackageNameQualified,
    types: IndexMap<TypeName, Rc<TypeDecl>>,
}

impl PackageContext {
    /// Creates a package from its checked declarations
    pub fn new(name: PackageNameQualified, types: IndexMap<TypeName, Rc<TypeDecl>>) -> Self {
        Self { name, types }
    }

    /// Qualified name
    pub fn name(&self) -> &PackageNameQualified {
        &self.name
    }

    /// Declarations by local name, in declaration order
    pub fn types(&self) -> &IndexMap<TypeName, Rc<TypeDecl>> {
        &self.types
    }

    /// Looks up a declaration by local name
    pub fn get(&self, name: &TypeName) -> Option<&Rc<TypeDecl>> {
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::IntegerKind;
    use pr_span::FileId;

    fn position() -> Position {
        Position::new(FileId::new(0), 1, 1)
    }

    fn int(bits: u32) -> Type {
        Type::Integer {
            kind: IntegerKind::Unsigned,
            size_bits: BigUint::from(bits),
        }
    }

    #[test]
    fn test_union_size_is_largest_case() {
        let union = UnionType::new(vec![
            UnionCase {
                name: UnionCaseName::new("small").unwrap(),
                ty: int(8),
                position: position(),
            },
            UnionCase {
                name: UnionCaseName::new("large").unwrap(),
                ty: int(64),
                position: position(),
            },
        ]);
        assert_eq!(union.size_in_bits(), &BigUint::from(64u32));
        let names: Vec<&str> = union.cases().map(|case| case.name.as_str()).collect();
        assert_eq!(names, ["small", "large"]);
    }

    #[test]
    fn test_record_lookup_skips_padding() {
        let record = RecordType::new(
            vec![
                RecordMember::Padding {
                    offset_octets: BigUint::from(0u32),
                    size_octets: BigUint::from(2u32),
                    position: position(),
                },
                RecordMember::Field(RecordField {
                    name: FieldName::new("x").unwrap(),
                    ty: int(16),
                    offset_octets: BigUint::from(2u32),
                    position: position(),
                }),
            ],
            BigUint::from(4u32),
        );
        let decl = TypeDecl {
            identifier: Identifier::from_raw(BigUint::from(7u32)),
            package: "a.b".parse().unwrap(),
            name: TypeName::new("R").unwrap(),
            position: position(),
            kind: TypeDeclKind::Record(record),
        };

        assert_eq!(decl.size_in_bits(), BigUint::from(32u32));
        assert_eq!(decl.field_type(&FieldName::new("x").unwrap()), Some(&int(16)));
        assert_eq!(decl.field_type(&FieldName::new("y").unwrap()), None);
        assert_eq!(decl.as_type().to_string(), "a.b.R");
        assert_eq!(decl.keyword(), "record");
    }
}
