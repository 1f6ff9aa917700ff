//! Integration test utilities for the packrec compiler

pub mod multi_file;
