//! Diagnostics queued during compilation

mod check;
mod resolve;

pub use check::{CheckError, CheckErrorCode};
pub use resolve::{ResolveError, ResolveErrorCode};

use crate::graph::PackageImport;
use derive_more::Display;
use miette::Diagnostic;
use pr_model::PackageNameQualified;
use pr_parser::ParseError;
use pr_sexpr::SyntaxError;
use pr_span::Position;
use thiserror::Error;

/// Broad category of a [`CompileError`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed source text
    #[display("lexical")]
    Lexical,
    /// Well-formed text that is not a statement
    #[display("parse")]
    Parse,
    /// Name resolution or package structure
    #[display("resolution")]
    Resolution,
    /// Type checking against the capability descriptor
    #[display("check")]
    Check,
    /// A package that imports itself, directly or not
    #[display("circular import")]
    CircularImport,
    /// A source that could not be read
    #[display("I/O")]
    Io,
}

/// One queued diagnostic: a kind, a message and an optional position
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum CompileError {
    /// Malformed source text
    #[error(transparent)]
    #[diagnostic(transparent)]
    Lexical(#[from] SyntaxError),

    /// Well-formed text that is not a statement
    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    /// Name resolution or package structure
    #[error(transparent)]
    #[diagnostic(transparent)]
    Resolve(#[from] ResolveError),

    /// Type checking
    #[error(transparent)]
    #[diagnostic(transparent)]
    Check(#[from] CheckError),

    /// A package that imports itself, directly or not
    #[error("Circular import: {}", render_cycle(.path))]
    #[diagnostic(code(context::circular_import))]
    CircularImport {
        /// Every edge of the cycle, starting at the package reentered
        path: Vec<PackageImport>,
        /// The import that closes the cycle
        position: Option<Position>,
    },

    /// A source that could not be read
    #[error("could not read package `{package}`: {message}")]
    #[diagnostic(code(context::io))]
    Io {
        /// The package being read
        package: PackageNameQualified,
        /// The underlying error, with context
        message: String,
    },
}

fn render_cycle(path: &[PackageImport]) -> String {
    let Some(first) = path.first() else {
        return String::new();
    };
    let mut rendered = first.from.to_string();
    for edge in path {
        rendered.push_str(" -> ");
        rendered.push_str(&edge.to.to_string());
    }
    rendered
}

impl CompileError {
    /// Broad category
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lexical(_) => ErrorKind::Lexical,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Resolve(_) => ErrorKind::Resolution,
            Self::Check(_) => ErrorKind::Check,
            Self::CircularImport { .. } => ErrorKind::CircularImport,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// Where the problem is, if it has a location
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Lexical(error) => Some(error.position()),
            Self::Parse(error) => Some(error.position()),
            Self::Resolve(error) => error.position(),
            Self::Check(error) => Some(error.position()),
            Self::CircularImport { position, .. } => *position,
            Self::Io { .. } => None,
        }
    }

    /// The resolution error code, for resolution errors
    pub fn resolve_code(&self) -> Option<ResolveErrorCode> {
        match self {
            Self::Resolve(error) => Some(error.error_code()),
            _ => None,
        }
    }

    /// The checker error code, for check errors
    pub fn check_code(&self) -> Option<CheckErrorCode> {
        match self {
            Self::Check(error) => Some(error.error_code()),
            _ => None,
        }
    }
}

/// Why [`crate::GlobalContext::load_package`] returned no package
///
/// The details are always in the error queue; this only tells the caller
/// that loading stopped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The package is already being loaded further up the import chain
    #[error("circular import of package `{0}`")]
    Circular(PackageNameQualified),
    /// Loading failed and diagnostics were queued
    #[error("failed to load package `{0}`")]
    Failed(PackageNameQualified),
}

impl LoadError {
    /// The package that could not be loaded
    pub fn package(&self) -> &PackageNameQualified {
        match self {
            Self::Circular(package) | Self::Failed(package) => package,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pr_span::FileId;

    #[test]
    fn test_circular_import_message() {
        let edge = |from: &str, to: &str| PackageImport {
            from: from.parse().unwrap(),
            to: to.parse().unwrap(),
            position: None,
        };
        let error = CompileError::CircularImport {
            path: vec![edge("x.y.a", "x.y.b"), edge("x.y.b", "x.y.a")],
            position: None,
        };
        assert_eq!(
            error.to_string(),
            "Circular import: x.y.a -> x.y.b -> x.y.a"
        );
        assert_eq!(error.kind(), ErrorKind::CircularImport);
    }

    #[test]
    fn test_record_shape() {
        let position = Position::new(FileId::new(2), 4, 1);
        let error = CompileError::from(ResolveError::ExpectedPackage { position });
        assert_eq!(error.kind(), ErrorKind::Resolution);
        assert_eq!(error.position(), Some(position));
        assert_eq!(error.resolve_code(), Some(ResolveErrorCode::ExpectedPackage));
        assert_eq!(error.check_code(), None);
        assert_eq!(error.to_string(), "expected a package declaration");
    }

    #[test]
    fn test_suggestions_become_help() {
        let position = Position::new(FileId::new(0), 1, 1);
        let error = ResolveError::type_nonexistent(
            "Pont".to_owned(),
            position,
            &["Point".to_owned(), "Pond".to_owned()],
        );
        let help = Diagnostic::help(&error).map(|help| help.to_string());
        assert_eq!(help.as_deref(), Some("did you mean one of `Point`, `Pond`?"));
        assert_eq!(error.error_code().to_string(), "TYPE_NONEXISTENT");
    }

    #[test]
    fn test_diagnostic_codes_forward() {
        let position = Position::new(FileId::new(0), 3, 2);
        let code = |error: &CompileError| error.code().map(|code| code.to_string());

        let resolve = CompileError::from(ResolveError::TypeDuplicate {
            name: "Point".parse().unwrap(),
            position,
        });
        assert_eq!(code(&resolve).as_deref(), Some("resolve::type_duplicate"));
        assert_eq!(resolve.resolve_code(), Some(ResolveErrorCode::TypeDuplicate));

        let check = CompileError::from(CheckError::UnionEmpty {
            name: "Shape".parse().unwrap(),
            position,
        });
        assert_eq!(code(&check).as_deref(), Some("check::union_empty"));
        assert_eq!(check.check_code(), Some(CheckErrorCode::UnionEmpty));
    }
}
