//! Compilation driver
//!
//! Ties the passes together: a [`Pipeline`] takes one file's expressions
//! through parsing, resolution and checking, the loaders map package names
//! to sources, and [`check_packages`] runs a batch and collects every
//! diagnostic per package.

mod check;
mod loader;
mod pipeline;

pub use check::{CheckReport, check_packages};
pub use loader::{FileSystemLoader, MemoryLoader, SOURCE_EXTENSION};
pub use pipeline::{Abort, CommandResult, Pipeline, compile_source};
