//! Name resolution errors

use derive_more::Display;
use miette::Diagnostic;
use pr_model::{FieldName, PackageNameQualified, PackageNameUnqualified, TypeName};
use pr_span::Position;
use thiserror::Error;

/// Stable code of a [`ResolveError`]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolveErrorCode {
    /// `package-begin` while a package is open
    #[display("PACKAGE_NESTED")]
    PackageNested,
    /// A second `package-begin` in one file
    #[display("PACKAGE_DUPLICATE")]
    PackageDuplicate,
    /// A statement that needs an open package
    #[display("NO_CURRENT_PACKAGE")]
    NoCurrentPackage,
    /// No source exists for a package
    #[display("PACKAGE_NONEXISTENT")]
    PackageNonexistent,
    /// A source declares a package other than the one requested
    #[display("PACKAGE_UNEXPECTED")]
    PackageUnexpected,
    /// An imported package failed to load
    #[display("PACKAGE_LOAD_FAILED")]
    PackageLoadFailed,
    /// An import rebinds an alias or a package
    #[display("PACKAGE_IMPORT_CONFLICT")]
    PackageImportConflict,
    /// A qualified reference through an unbound alias
    #[display("IMPORT_NONEXISTENT")]
    ImportNonexistent,
    /// A type name declared twice in one package
    #[display("TYPE_DUPLICATE")]
    TypeDuplicate,
    /// A reference to an undeclared type
    #[display("TYPE_NONEXISTENT")]
    TypeNonexistent,
    /// A `type-of` path through a missing field
    #[display("FIELD_NONEXISTENT")]
    FieldNonexistent,
    /// A `type-of` path through a type that has no fields
    #[display("FIELD_PATH_NOT_NOMINAL")]
    FieldPathNotNominal,
    /// A file that never opens a package
    #[display("EXPECTED_PACKAGE")]
    ExpectedPackage,
    /// End of file inside an open package
    #[display("UNEXPECTED_EOF")]
    UnexpectedEof,
}

/// A name that could not be bound, or a broken package structure
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum ResolveError {
    /// `package-begin` inside an open package
    #[error("package `{current}` is still open; packages cannot be nested")]
    #[diagnostic(code(resolve::package_nested))]
    PackageNested {
        /// The open package
        current: PackageNameQualified,
        /// Where the second `package-begin` occurs
        position: Position,
    },

    /// `package-begin` after the file's package was closed
    #[error("this file already declared package `{previous}`")]
    #[diagnostic(
        code(resolve::package_duplicate),
        help("each file declares exactly one package")
    )]
    PackageDuplicate {
        /// The package declared earlier
        previous: PackageNameQualified,
        /// Where the second `package-begin` occurs
        position: Position,
    },

    /// A statement outside any package
    #[error("no package is open")]
    #[diagnostic(
        code(resolve::no_current_package),
        help("open a package with (package-begin ...)")
    )]
    NoCurrentPackage {
        /// Where the statement occurs
        position: Position,
    },

    /// A package with no source
    #[error("package `{package}` does not exist")]
    #[diagnostic(code(resolve::package_nonexistent))]
    PackageNonexistent {
        /// The missing package
        package: PackageNameQualified,
        /// The import that asked for it, if any
        position: Option<Position>,
    },

    /// A source that declares the wrong package
    #[error("expected package `{expected}`, but the source declares `{found}`")]
    #[diagnostic(code(resolve::package_unexpected))]
    PackageUnexpected {
        /// The requested package
        expected: PackageNameQualified,
        /// The declared package
        found: PackageNameQualified,
        /// Where the declaration occurs
        position: Position,
    },

    /// An import whose package could not be loaded
    #[error("Error loading package `{package}`")]
    #[diagnostic(code(resolve::package_load_failed))]
    PackageLoadFailed {
        /// The imported package
        package: PackageNameQualified,
        /// Where the import occurs
        position: Position,
    },

    /// An import that rebinds an alias or imports a package twice
    #[error("import of `{package}` as `{alias}` conflicts with an earlier import")]
    #[diagnostic(code(resolve::package_import_conflict))]
    PackageImportConflict {
        /// The imported package
        package: PackageNameQualified,
        /// The requested alias
        alias: PackageNameUnqualified,
        /// Where the import occurs
        position: Position,
    },

    /// `alias.Name` with no import bound to `alias`
    #[error("no import is bound to `{alias}`")]
    #[diagnostic(code(resolve::import_nonexistent))]
    ImportNonexistent {
        /// The unbound alias
        alias: PackageNameUnqualified,
        /// Where the reference occurs
        position: Position,
    },

    /// A type declared twice in one package
    #[error("type `{name}` is already declared in this package")]
    #[diagnostic(code(resolve::type_duplicate))]
    TypeDuplicate {
        /// The repeated name
        name: TypeName,
        /// Where the second declaration occurs
        position: Position,
    },

    /// A reference to a type that does not exist
    #[error("type `{name}` does not exist")]
    #[diagnostic(code(resolve::type_nonexistent))]
    TypeNonexistent {
        /// The name as written, including any alias
        name: String,
        /// Where the reference occurs
        position: Position,
        /// Similar names in scope
        #[help]
        suggestion: Option<String>,
    },

    /// A `type-of` path segment naming no field
    #[error("type `{ty}` has no field `{field}`")]
    #[diagnostic(code(resolve::field_nonexistent))]
    FieldNonexistent {
        /// The type searched
        ty: String,
        /// The missing field
        field: FieldName,
        /// Where the path occurs
        position: Position,
    },

    /// A `type-of` path continuing through a type without fields
    #[error("cannot look up `{field}` in `{found}`; only declared types have fields")]
    #[diagnostic(code(resolve::field_path_not_nominal))]
    FieldPathNotNominal {
        /// The segment that could not be followed
        field: FieldName,
        /// The type reached so far
        found: String,
        /// Where the path occurs
        position: Position,
    },

    /// A file without `package-begin`
    #[error("expected a package declaration")]
    #[diagnostic(
        code(resolve::expected_package),
        help("every source file starts with (package-begin ...)")
    )]
    ExpectedPackage {
        /// End of the file
        position: Position,
    },

    /// End of file inside an open package
    #[error("unexpected end of file: package `{package}` is still open")]
    #[diagnostic(code(resolve::unexpected_eof), help("close it with (package-end)"))]
    UnexpectedEof {
        /// The open package
        package: PackageNameQualified,
        /// End of the file
        position: Position,
    },
}

impl ResolveError {
    /// Builds a [`ResolveError::TypeNonexistent`] with "did you mean" help
    pub fn type_nonexistent(name: String, position: Position, suggestions: &[String]) -> Self {
        let suggestion = match suggestions {
            [] => None,
            [only] => Some(format!("did you mean `{only}`?")),
            several => Some(format!(
                "did you mean one of {}?",
                several
                    .iter()
                    .map(|name| format!("`{name}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        };
        Self::TypeNonexistent {
            name,
            position,
            suggestion,
        }
    }

    /// The stable error code
    pub fn error_code(&self) -> ResolveErrorCode {
        match self {
            Self::PackageNested { .. } => ResolveErrorCode::PackageNested,
            Self::PackageDuplicate { .. } => ResolveErrorCode::PackageDuplicate,
            Self::NoCurrentPackage { .. } => ResolveErrorCode::NoCurrentPackage,
            Self::PackageNonexistent { .. } => ResolveErrorCode::PackageNonexistent,
            Self::PackageUnexpected { .. } => ResolveErrorCode::PackageUnexpected,
            Self::PackageLoadFailed { .. } => ResolveErrorCode::PackageLoadFailed,
            Self::PackageImportConflict { .. } => ResolveErrorCode::PackageImportConflict,
            Self::ImportNonexistent { .. } => ResolveErrorCode::ImportNonexistent,
            Self::TypeDuplicate { .. } => ResolveErrorCode::TypeDuplicate,
            Self::TypeNonexistent { .. } => ResolveErrorCode::TypeNonexistent,
            Self::FieldNonexistent { .. } => ResolveErrorCode::FieldNonexistent,
            Self::FieldPathNotNominal { .. } => ResolveErrorCode::FieldPathNotNominal,
            Self::ExpectedPackage { .. } => ResolveErrorCode::ExpectedPackage,
            Self::UnexpectedEof { .. } => ResolveErrorCode::UnexpectedEof,
        }
    }

    /// Returns the position the error refers to, if it has one
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::PackageNonexistent { position, .. } => *position,
            Self::PackageNested { position, .. }
            | Self::PackageDuplicate { position, .. }
            | Self::NoCurrentPackage { position }
            | Self::PackageUnexpected { position, .. }
            | Self::PackageLoadFailed { position, .. }
            | Self::PackageImportConflict { position, .. }
            | Self::ImportNonexistent { position, .. }
            | Self::TypeDuplicate { position, .. }
            | Self::TypeNonexistent { position, .. }
            | Self::FieldNonexistent { position, .. }
            | Self::FieldPathNotNominal { position, .. }
            | Self::ExpectedPackage { position }
            | Self::UnexpectedEof { position, .. } => Some(*position),
        }
    }
}
