//! Code generator capability descriptors
//!
//! A [`Capabilities`] value lists which sizes, counts, shapes and encodings the
//! target code generator can render. The checker consults it for every
//! declaration and never mutates it. Descriptors can be written in TOML; any
//! key left out keeps its default.
//!
//! ```toml
//! record_integer_sizes = [8, 16, 32, 64]
//! packed_integer_sizes = [{ lower = 1, upper = 64 }]
//! string_encodings = ["UTF-8", "US-ASCII"]
//! ```

use anyhow::{Context, Result};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Closed interval `[lower, upper]` of supported values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SizeRangeRepr", into = "SizeRangeRepr")]
pub struct SizeRange {
    lower: BigUint,
    upper: BigUint,
}

impl SizeRange {
    /// Creates `[lower, upper]`
    ///
    /// # Panics
    ///
    /// Panics if `lower > upper`
    pub fn new(lower: impl Into<BigUint>, upper: impl Into<BigUint>) -> Self {
        let (lower, upper) = (lower.into(), upper.into());
        assert!(lower <= upper, "size range lower bound exceeds upper bound");
        Self { lower, upper }
    }

    /// The single-value range `[value, value]`
    pub fn exactly(value: impl Into<BigUint>) -> Self {
        let value = value.into();
        Self {
            lower: value.clone(),
            upper: value,
        }
    }

    /// Whether `value` lies inside the range, bounds included
    pub fn contains(&self, value: &BigUint) -> bool {
        &self.lower <= value && value <= &self.upper
    }

    /// Lower bound
    pub fn lower(&self) -> &BigUint {
        &self.lower
    }

    /// Upper bound
    pub fn upper(&self) -> &BigUint {
        &self.upper
    }
}

impl fmt::Display for SizeRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower == self.upper {
            write!(formatter, "{}", self.lower)
        } else {
            write!(formatter, "[{}, {}]", self.lower, self.upper)
        }
    }
}

/// Integers in TOML are 64-bit; larger bounds are written as strings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum BigRepr {
    Small(u64),
    Large(String),
}

impl TryFrom<BigRepr> for BigUint {
    type Error = String;

    fn try_from(repr: BigRepr) -> Result<Self, Self::Error> {
        match repr {
            BigRepr::Small(value) => Ok(Self::from(value)),
            BigRepr::Large(text) => text
                .parse()
                .map_err(|_| format!("`{text}` is not a non-negative integer")),
        }
    }
}

impl From<&BigUint> for BigRepr {
    fn from(value: &BigUint) -> Self {
        u64::try_from(value).map_or_else(|_| Self::Large(value.to_string()), Self::Small)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum SizeRangeRepr {
    Exactly(BigRepr),
    Interval { lower: BigRepr, upper: BigRepr },
}

impl TryFrom<SizeRangeRepr> for SizeRange {
    type Error = String;

    fn try_from(repr: SizeRangeRepr) -> Result<Self, Self::Error> {
        match repr {
            SizeRangeRepr::Exactly(value) => Ok(Self::exactly(BigUint::try_from(value)?)),
            SizeRangeRepr::Interval { lower, upper } => {
                let lower = BigUint::try_from(lower)?;
                let upper = BigUint::try_from(upper)?;
                if lower > upper {
                    return Err(format!("empty size range [{lower}, {upper}]"));
                }
                Ok(Self { lower, upper })
            }
        }
    }
}

impl From<SizeRange> for SizeRangeRepr {
    fn from(range: SizeRange) -> Self {
        if range.lower == range.upper {
            Self::Exactly(BigRepr::from(&range.lower))
        } else {
            Self::Interval {
                lower: BigRepr::from(&range.lower),
                upper: BigRepr::from(&range.upper),
            }
        }
    }
}

/// A union of closed intervals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SizeRanges(Vec<SizeRange>);

impl SizeRanges {
    /// Builds the union of `ranges`
    pub fn new(ranges: Vec<SizeRange>) -> Self {
        Self(ranges)
    }

    /// Supports exactly the listed values
    pub fn exactly(values: &[u64]) -> Self {
        Self(values.iter().map(|&value| SizeRange::exactly(value)).collect())
    }

    /// Supports every value in `[lower, upper]`
    pub fn between(lower: u64, upper: u64) -> Self {
        Self(vec![SizeRange::new(lower, upper)])
    }

    /// Supports nothing
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// Whether any interval contains `value`
    pub fn contains(&self, value: &BigUint) -> bool {
        self.0.iter().any(|range| range.contains(value))
    }

    /// The intervals
    pub fn ranges(&self) -> &[SizeRange] {
        &self.0
    }
}

impl fmt::Display for SizeRanges {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(formatter, "none");
        }
        for (index, range) in self.0.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{range}")?;
        }
        Ok(())
    }
}

/// Supported matrix shapes: a shape is supported when both dimensions are
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixShapes {
    /// Supported column counts
    pub widths: SizeRanges,
    /// Supported row counts
    pub heights: SizeRanges,
}

impl MatrixShapes {
    /// Whether a `width` × `height` matrix is supported
    pub fn contains(&self, width: &BigUint, height: &BigUint) -> bool {
        self.widths.contains(width) && self.heights.contains(height)
    }
}

/// What the target code generator can render
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Integer widths (bits) allowed outside packed records
    pub record_integer_sizes: SizeRanges,
    /// Float widths (bits)
    pub record_float_sizes: SizeRanges,
    /// Integer widths (bits) allowed inside packed records
    pub packed_integer_sizes: SizeRanges,
    /// Total widths (bits) a packed record may have
    pub packed_sizes: SizeRanges,
    /// Element counts for integer vectors
    pub vector_integer_counts: SizeRanges,
    /// Element counts for float vectors
    pub vector_float_counts: SizeRanges,
    /// Shapes for integer matrices
    pub matrix_integer_shapes: MatrixShapes,
    /// Shapes for float matrices
    pub matrix_float_shapes: MatrixShapes,
    /// Boolean-set sizes (octets)
    pub boolean_set_sizes: SizeRanges,
    /// String capacities (octets)
    pub string_sizes: SizeRanges,
    /// Supported string encodings
    pub string_encodings: BTreeSet<String>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            record_integer_sizes: SizeRanges::exactly(&[8, 16, 32, 64]),
            record_float_sizes: SizeRanges::exactly(&[16, 32, 64]),
            packed_integer_sizes: SizeRanges::between(1, 64),
            packed_sizes: SizeRanges::exactly(&[8, 16, 32, 64]),
            vector_integer_counts: SizeRanges::between(2, 4),
            vector_float_counts: SizeRanges::between(2, 4),
            matrix_integer_shapes: MatrixShapes::default(),
            matrix_float_shapes: MatrixShapes {
                widths: SizeRanges::between(2, 4),
                heights: SizeRanges::between(2, 4),
            },
            boolean_set_sizes: SizeRanges::between(1, 8),
            string_sizes: SizeRanges::between(1, (1 << 31) - 1),
            string_encodings: BTreeSet::from(["UTF-8".to_owned()]),
        }
    }
}

impl Capabilities {
    /// Parses a descriptor from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML or a range is malformed
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse capability descriptor")
    }

    /// Loads a descriptor from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).with_context(|| {
            format!("Failed to read capability descriptor: {}", path.display())
        })?;
        toml::from_str(&contents).with_context(|| {
            format!("Failed to parse capability descriptor: {}", path.display())
        })
    }

    /// Whether an integer of `bits` bits may appear outside packed records
    pub fn is_record_integer_size_supported(&self, bits: &BigUint) -> bool {
        self.record_integer_sizes.contains(bits)
    }

    /// Whether a float of `bits` bits is supported
    pub fn is_float_size_supported(&self, bits: &BigUint) -> bool {
        self.record_float_sizes.contains(bits)
    }

    /// Whether an integer of `bits` bits may appear inside a packed record
    pub fn is_packed_integer_size_supported(&self, bits: &BigUint) -> bool {
        self.packed_integer_sizes.contains(bits)
    }

    /// Whether a packed record may be `bits` bits wide in total
    pub fn is_packed_size_supported(&self, bits: &BigUint) -> bool {
        self.packed_sizes.contains(bits)
    }

    /// Whether an integer vector may have `count` elements
    pub fn is_integer_vector_count_supported(&self, count: &BigUint) -> bool {
        self.vector_integer_counts.contains(count)
    }

    /// Whether a float vector may have `count` elements
    pub fn is_float_vector_count_supported(&self, count: &BigUint) -> bool {
        self.vector_float_counts.contains(count)
    }

    /// Whether an integer matrix may have this shape
    pub fn is_integer_matrix_supported(&self, width: &BigUint, height: &BigUint) -> bool {
        self.matrix_integer_shapes.contains(width, height)
    }

    /// Whether a float matrix may have this shape
    pub fn is_float_matrix_supported(&self, width: &BigUint, height: &BigUint) -> bool {
        self.matrix_float_shapes.contains(width, height)
    }

    /// Whether a boolean set may occupy `octets` octets
    pub fn is_boolean_set_size_supported(&self, octets: &BigUint) -> bool {
        self.boolean_set_sizes.contains(octets)
    }

    /// Whether a string may hold `octets` octets
    pub fn is_string_size_supported(&self, octets: &BigUint) -> bool {
        self.string_sizes.contains(octets)
    }

    /// Whether `encoding` is supported
    pub fn is_string_encoding_supported(&self, encoding: &str) -> bool {
        self.string_encodings.contains(encoding)
    }
}
