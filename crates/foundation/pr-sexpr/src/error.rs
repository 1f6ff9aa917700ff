//! Lexical errors

use miette::Diagnostic;
use pr_span::Position;
use thiserror::Error;

/// Malformed source text
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum SyntaxError {
    /// A string literal runs to the end of the file
    #[error("unterminated string literal")]
    #[diagnostic(code(syntax::unterminated_string))]
    UnterminatedString {
        /// Where the string starts
        position: Position,
    },

    /// A backslash followed by something other than `"` or `\`
    #[error("invalid escape sequence `\\{found}`")]
    #[diagnostic(code(syntax::invalid_escape), help("only `\\\"` and `\\\\` are recognized"))]
    InvalidEscape {
        /// The character after the backslash
        found: char,
        /// Where the escape occurs
        position: Position,
    },

    /// A closing bracket with no list open
    #[error("unexpected `{found}`")]
    #[diagnostic(code(syntax::unbalanced))]
    UnexpectedClose {
        /// The closing bracket
        found: char,
        /// Where it occurs
        position: Position,
    },

    /// A closing bracket that does not match the innermost open list
    #[error("expected `{expected}`, found `{found}`")]
    #[diagnostic(code(syntax::mismatched_close))]
    MismatchedClose {
        /// The bracket that would close the open list
        expected: char,
        /// The bracket actually found
        found: char,
        /// Where it occurs
        position: Position,
    },

    /// End of file with a list still open
    #[error("unexpected end of file: unclosed `{opening}`")]
    #[diagnostic(code(syntax::unexpected_eof))]
    UnexpectedEof {
        /// The unclosed bracket
        opening: char,
        /// Where the unclosed list starts
        position: Position,
    },
}

impl SyntaxError {
    /// Returns the position the error refers to
    #[must_use]
    pub fn position(&self) -> Position {
        match self {
            Self::UnterminatedString { position }
            | Self::InvalidEscape { position, .. }
            | Self::UnexpectedClose { position, .. }
            | Self::MismatchedClose { position, .. }
            | Self::UnexpectedEof { position, .. } => *position,
        }
    }
}
