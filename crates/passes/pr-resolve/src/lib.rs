//! Name resolution
//!
//! Turns unresolved statements into resolved ones: package structure is
//! enforced, imports are loaded and bound to aliases, and every type
//! reference is bound to the identifier of a checked declaration.

mod resolver;
mod scope;
mod suggest;

pub use resolver::Resolver;
pub use scope::{FileScope, PackageState};
