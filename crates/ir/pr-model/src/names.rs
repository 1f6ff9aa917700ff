//! Validated names
//!
//! Every kind of name in the language has its own grammar. Values can only be
//! constructed through [`std::str::FromStr`] or `new`, so holding a name means
//! holding a string that satisfies its grammar.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A string rejected by a name grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The empty string
    #[error("{kind} must not be empty")]
    Empty {
        /// Which grammar rejected the name
        kind: &'static str,
    },
    /// A character the grammar does not allow at that place
    #[error("invalid {kind} `{name}`: {reason}")]
    Invalid {
        /// Which grammar rejected the name
        kind: &'static str,
        /// The rejected name
        name: String,
        /// Which rule was broken
        reason: &'static str,
    },
}

fn validate(
    kind: &'static str,
    name: &str,
    first: fn(char) -> bool,
    first_rule: &'static str,
    rest: fn(char) -> bool,
    rest_rule: &'static str,
) -> Result<(), NameError> {
    let mut chars = name.chars();
    let Some(head) = chars.next() else {
        return Err(NameError::Empty { kind });
    };
    if !first(head) {
        return Err(NameError::Invalid {
            kind,
            name: name.to_owned(),
            reason: first_rule,
        });
    }
    if !chars.all(rest) {
        return Err(NameError::Invalid {
            kind,
            name: name.to_owned(),
            reason: rest_rule,
        });
    }
    Ok(())
}

// Letters may be any script, but letter-like numerals such as `ⅻ` are not
// letters. Digits are ASCII only.
fn lower(character: char) -> bool {
    character.is_lowercase() && !character.is_numeric()
}

fn upper(character: char) -> bool {
    character.is_uppercase() && !character.is_numeric()
}

fn lower_or_digit(character: char) -> bool {
    lower(character) || character.is_ascii_digit() || character == '_'
}

fn alnum(character: char) -> bool {
    (character.is_alphabetic() && !character.is_numeric())
        || character.is_ascii_digit()
        || character == '_'
}

macro_rules! name_type {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, $first:expr, $first_rule:literal, $rest:expr, $rest_rule:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Validates `name` against the grammar
            ///
            /// # Errors
            ///
            /// Returns [`NameError`] if `name` is empty or breaks the grammar
            pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
                let name = name.into();
                validate($kind, &name, $first, $first_rule, $rest, $rest_rule)?;
                Ok(Self(name))
            }

            /// The name as written
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = NameError;

            fn from_str(name: &str) -> Result<Self, Self::Err> {
                Self::new(name)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(&self.0)
            }
        }
    };
}

name_type!(
    /// One segment of a package name: lowercase letter, then lowercase letters, digits or `_`
    PackageNameUnqualified,
    "package name",
    lower,
    "must start with a lowercase letter",
    lower_or_digit,
    "may only contain lowercase letters, digits and `_`"
);

name_type!(
    /// Name of a declared type: uppercase letter, then letters, digits or `_`
    TypeName,
    "type name",
    upper,
    "must start with an uppercase letter",
    alnum,
    "may only contain letters, digits and `_`"
);

name_type!(
    /// Name of a record/packed field or boolean-set flag: lowercase letter, then letters, digits or `_`
    FieldName,
    "field name",
    lower,
    "must start with a lowercase letter",
    alnum,
    "may only contain letters, digits and `_`"
);

name_type!(
    /// Name of a union case: lowercase letter, then letters, digits or `_`
    UnionCaseName,
    "union case name",
    lower,
    "must start with a lowercase letter",
    alnum,
    "may only contain letters, digits and `_`"
);

/// Dotted package name such as `com.example.shapes`
///
/// Never empty. Equality, ordering and hashing are structural, which agrees
/// with comparing the dotted renderings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageNameQualified(Vec<PackageNameUnqualified>);

impl PackageNameQualified {
    /// Builds a qualified name from its segments
    ///
    /// # Errors
    ///
    /// Returns [`NameError::Empty`] if `segments` is empty
    pub fn new(segments: Vec<PackageNameUnqualified>) -> Result<Self, NameError> {
        if segments.is_empty() {
            return Err(NameError::Empty {
                kind: "qualified package name",
            });
        }
        Ok(Self(segments))
    }

    /// The segments in order
    pub fn segments(&self) -> &[PackageNameUnqualified] {
        &self.0
    }

    /// The final segment
    pub fn last(&self) -> &PackageNameUnqualified {
        // Construction guarantees at least one segment.
        &self.0[self.0.len() - 1]
    }
}

impl FromStr for PackageNameQualified {
    type Err = NameError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        if name.is_empty() {
            return Err(NameError::Empty {
                kind: "qualified package name",
            });
        }
        let segments = name
            .split('.')
            .map(PackageNameUnqualified::new)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }
}

impl fmt::Display for PackageNameQualified {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.0.iter().enumerate() {
            if index > 0 {
                formatter.write_str(".")?;
            }
            formatter.write_str(segment.as_str())?;
        }
        Ok(())
    }
}
