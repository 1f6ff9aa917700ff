//! Cross-package compilation state
//!
//! [`GlobalContext`] owns everything that outlives a single source file:
//! identifiers, loaded packages, checked declarations and the error queue.
//! Packages are obtained through [`GlobalContext::load_package`], which
//! delegates to a [`PackageLoader`] and detects circular imports.

mod context;
pub mod error;
mod graph;
mod loader;

pub use context::GlobalContext;
pub use error::{
    CheckError, CheckErrorCode, CompileError, ErrorKind, LoadError, ResolveError,
    ResolveErrorCode,
};
pub use graph::{ImportGraph, PackageImport};
pub use loader::PackageLoader;
