//! Packed-record bit layout
//!
//! Members are placed contiguously with no implicit padding. The member
//! declared last occupies the least significant bits and the member declared
//! first the most significant ones; compiled schemas depend on this numbering.

use crate::names::FieldName;
use crate::types::Type;
use indexmap::IndexMap;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use pr_span::Position;
use std::fmt;

/// Inclusive range of bit positions, bit 0 being the least significant
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitRange {
    lower: BigUint,
    upper: BigUint,
}

impl BitRange {
    /// Creates `[lower, upper]`
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`
    pub fn new(lower: BigUint, upper: BigUint) -> Self {
        assert!(lower <= upper, "bit range lower bound exceeds upper bound");
        Self { lower, upper }
    }

    /// Lowest bit in the range
    pub fn lower(&self) -> &BigUint {
        &self.lower
    }

    /// Highest bit in the range
    pub fn upper(&self) -> &BigUint {
        &self.upper
    }

    /// Number of bits covered
    pub fn width(&self) -> BigUint {
        &self.upper - &self.lower + 1u32
    }

    /// Whether two ranges share at least one bit
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lower <= other.upper && other.lower <= self.upper
    }
}

impl fmt::Display for BitRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "[{}, {}]", self.lower, self.upper)
    }
}

/// Input to the layout engine: one member with a concrete width
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedMemberSpec {
    /// Named field
    Field {
        /// Field name
        name: FieldName,
        /// Checked field type
        ty: Type,
        /// Width in bits, non-zero
        width: BigUint,
        /// Where the field is declared
        position: Position,
    },
    /// Explicit padding
    Padding {
        /// Width in bits, non-zero
        width: BigUint,
        /// Where the padding is declared
        position: Position,
    },
}

impl PackedMemberSpec {
    fn width(&self) -> &BigUint {
        match self {
            Self::Field { width, .. } | Self::Padding { width, .. } => width,
        }
    }
}

/// A placed field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedField {
    /// Field name
    pub name: FieldName,
    /// Checked field type
    pub ty: Type,
    /// Bits occupied
    pub range: BitRange,
    /// Where the field is declared
    pub position: Position,
}

/// A placed member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackedMember {
    /// Named field
    Field(PackedField),
    /// Explicit padding
    Padding {
        /// Bits occupied
        range: BitRange,
        /// Where the padding is declared
        position: Position,
    },
}

impl PackedMember {
    /// Bits occupied by the member
    pub fn range(&self) -> &BitRange {
        match self {
            Self::Field(field) => &field.range,
            Self::Padding { range, .. } => range,
        }
    }
}

/// Finished layout of a packed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedType {
    members: Vec<PackedMember>,
    fields: IndexMap<FieldName, usize>,
    size_bits: BigUint,
}

impl PackedType {
    /// Places `specs`, given in declaration order
    ///
    /// Widths must already be evaluated and non-zero, and field names unique;
    /// the engine only assigns positions.
    ///
    /// # Panics
    ///
    /// Panics if a width is zero
    pub fn layout(specs: Vec<PackedMemberSpec>) -> Self {
        let size_bits: BigUint = specs.iter().map(PackedMemberSpec::width).sum();

        // Walk from the most significant end downwards, one member at a time.
        let mut cursor = size_bits.clone();
        let mut members = Vec::with_capacity(specs.len());
        let mut fields = IndexMap::new();

        for spec in specs {
            assert!(!spec.width().is_zero(), "packed member with zero width");
            let upper = &cursor - BigUint::one();
            let lower = &cursor - spec.width();
            cursor.clone_from(&lower);
            let range = BitRange::new(lower, upper);

            match spec {
                PackedMemberSpec::Field {
                    name, ty, position, ..
                } => {
                    fields.insert(name.clone(), members.len());
                    members.push(PackedMember::Field(PackedField {
                        name,
                        ty,
                        range,
                        position,
                    }));
                }
                PackedMemberSpec::Padding { position, .. } => {
                    members.push(PackedMember::Padding { range, position });
                }
            }
        }

        Self {
            members,
            fields,
            size_bits,
        }
    }

    /// Members in declaration order
    pub fn members(&self) -> &[PackedMember] {
        &self.members
    }

    /// Members from the least significant bits upwards (reverse declaration order)
    pub fn members_from_lsb(&self) -> impl Iterator<Item = &PackedMember> {
        self.members.iter().rev()
    }

    /// Looks up a field by name
    pub fn field(&self, name: &FieldName) -> Option<&PackedField> {
        let index = *self.fields.get(name)?;
        match &self.members[index] {
            PackedMember::Field(field) => Some(field),
            PackedMember::Padding { .. } => None,
        }
    }

    /// Named fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &PackedField> {
        self.members.iter().filter_map(|member| match member {
            PackedMember::Field(field) => Some(field),
            PackedMember::Padding { .. } => None,
        })
    }

    /// Total width in bits
    pub fn size_in_bits(&self) -> &BigUint {
        &self.size_bits
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

    fn field(name: &str, width: u32) -> PackedMemberSpec {
        PackedMemberSpec::Field {
            name: FieldName::new(name).unwrap(),
            ty: Type::Integer {
                kind: IntegerKind::Signed,
                size_bits: BigUint::from(width),
            },
            width: BigUint::from(width),
            position: position(),
        }
    }

    fn padding(width: u32) -> PackedMemberSpec {
        PackedMemberSpec::Padding {
            width: BigUint::from(width),
            position: position(),
        }
    }

    fn range(lower: u32, upper: u32) -> BitRange {
        BitRange::new(BigUint::from(lower), BigUint::from(upper))
    }

    #[test]
    fn test_first_declared_field_takes_highest_bits() {
        let packed = PackedType::layout(vec![
            field("f0", 4),
            field("f1", 4),
            field("f2", 4),
            field("f3", 4),
        ]);

        assert_eq!(packed.size_in_bits(), &BigUint::from(16u32));
        let by_name = |name: &str| packed.field(&FieldName::new(name).unwrap()).unwrap().range.clone();
        assert_eq!(by_name("f3"), range(0, 3));
        assert_eq!(by_name("f2"), range(4, 7));
        assert_eq!(by_name("f1"), range(8, 11));
        assert_eq!(by_name("f0"), range(12, 15));

        let from_lsb: Vec<BitRange> = packed
            .members_from_lsb()
            .map(|member| member.range().clone())
            .collect();
        assert_eq!(from_lsb, vec![range(0, 3), range(4, 7), range(8, 11), range(12, 15)]);
    }

    #[test]
    fn test_padding_is_placed_like_fields() {
        let packed = PackedType::layout(vec![field("f0", 4), padding(4), field("f2", 4), padding(4)]);

        assert_eq!(packed.size_in_bits(), &BigUint::from(16u32));
        let from_lsb: Vec<&PackedMember> = packed.members_from_lsb().collect();
        assert!(matches!(from_lsb[0], PackedMember::Padding { .. }));
        assert_eq!(from_lsb[0].range(), &range(0, 3));
        assert!(matches!(from_lsb[1], PackedMember::Field(field) if field.name.as_str() == "f2"));
        assert_eq!(from_lsb[1].range(), &range(4, 7));
        assert!(matches!(from_lsb[2], PackedMember::Padding { .. }));
        assert_eq!(from_lsb[2].range(), &range(8, 11));
        assert!(matches!(from_lsb[3], PackedMember::Field(field) if field.name.as_str() == "f0"));
        assert_eq!(from_lsb[3].range(), &range(12, 15));

        assert_eq!(packed.fields().count(), 2);
    }

    #[test]
    fn test_empty_packed_has_size_zero() {
        let packed = PackedType::layout(Vec::new());
        assert!(packed.size_in_bits().is_zero());
        assert!(packed.members().is_empty());
    }

    #[test]
    fn test_ranges_never_overlap() {
        let packed = PackedType::layout(vec![field("a", 1), field("b", 7), padding(3), field("c", 21)]);
        let members = packed.members();
        for (index, left) in members.iter().enumerate() {
            for right in &members[index + 1..] {
                assert!(!left.range().overlaps(right.range()));
            }
        }
        let total: BigUint = members.iter().map(|member| member.range().width()).sum();
        assert_eq!(&total, packed.size_in_bits());
        assert_eq!(packed.members()[0].range(), &range(31, 31));
    }

    #[test]
    fn test_range_display() {
        assert_eq!(range(4, 7).to_string(), "[4, 7]");
        assert_eq!(range(4, 7).width(), BigUint::from(4u32));
    }
}
