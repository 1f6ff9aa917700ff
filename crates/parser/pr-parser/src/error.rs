//! Statement parse errors

use miette::Diagnostic;
use pr_model::NameError;
use pr_span::Position;
use thiserror::Error;

/// A well-formed expression tree that is not a valid statement
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ParseError {
    /// Something other than what the grammar requires at this place
    #[error("expected {expected}, found {found}")]
    #[diagnostic(code(parser::unexpected))]
    Expected {
        /// What the grammar requires
        expected: &'static str,
        /// What was found
        found: String,
        /// Where it was found
        position: Position,
    },

    /// A statement form that does not exist
    #[error("unknown statement `{keyword}`")]
    #[diagnostic(
        code(parser::unknown_statement),
        help(
            "statements are package-begin, package-end, import, record, packed, union, :type and :size"
        )
    )]
    UnknownStatement {
        /// The head of the list
        keyword: String,
        /// Where it occurs
        position: Position,
    },

    /// A type constructor that does not exist
    #[error("unknown type constructor `{keyword}`")]
    #[diagnostic(code(parser::unknown_type))]
    UnknownType {
        /// The head of the list
        keyword: String,
        /// Where it occurs
        position: Position,
    },

    /// A size expression form that does not exist
    #[error("unknown size expression `{keyword}`")]
    #[diagnostic(
        code(parser::unknown_size),
        help("sizes are literals, (size-in-bits T) or (size-in-octets T)")
    )]
    UnknownSize {
        /// The head of the list
        keyword: String,
        /// Where it occurs
        position: Position,
    },

    /// A member form not allowed in this kind of declaration
    #[error("`{keyword}` is not allowed in a {declaration}")]
    #[diagnostic(code(parser::unknown_member))]
    UnknownMember {
        /// The head of the member list
        keyword: String,
        /// `record`, `packed` or `union`
        declaration: &'static str,
        /// Where it occurs
        position: Position,
    },

    /// A form with the wrong number of arguments
    #[error("`{form}` takes {expected} argument(s), found {found}")]
    #[diagnostic(code(parser::arity))]
    Arity {
        /// The form's keyword
        form: String,
        /// Number of arguments the form takes
        expected: usize,
        /// Number of arguments given
        found: usize,
        /// Where the form starts
        position: Position,
    },

    /// Not one of the four integer kinds
    #[error("unknown integer kind `{kind}`")]
    #[diagnostic(
        code(parser::integer_kind),
        help("use signed, unsigned, signed-normalized or unsigned-normalized")
    )]
    IntegerKind {
        /// The rejected keyword
        kind: String,
        /// Where it occurs
        position: Position,
    },

    /// A literal size that is not a non-negative decimal integer
    #[error("`{text}` is not a valid size")]
    #[diagnostic(code(parser::invalid_size))]
    InvalidSize {
        /// The rejected literal
        text: String,
        /// Where it occurs
        position: Position,
    },

    /// A name that breaks its grammar
    #[error("{error}")]
    #[diagnostic(code(parser::invalid_name))]
    InvalidName {
        /// The grammar violation
        error: NameError,
        /// Where the name occurs
        position: Position,
    },
}

impl ParseError {
    /// Returns the position the error refers to
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::Expected { position, .. }
            | Self::UnknownStatement { position, .. }
            | Self::UnknownType { position, .. }
            | Self::UnknownSize { position, .. }
            | Self::UnknownMember { position, .. }
            | Self::Arity { position, .. }
            | Self::IntegerKind { position, .. }
            | Self::InvalidSize { position, .. }
            | Self::InvalidName { position, .. } => *position,
        }
    }
}
