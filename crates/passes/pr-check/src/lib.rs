//! Checker for resolved declarations
//!
//! Evaluates size expressions, validates every type against the active
//! [`pr_model::Capabilities`] and computes record offsets, packed bit ranges
//! and union sizes. Checked declarations are registered in the
//! [`pr_context::GlobalContext`] type table.

mod checker;
mod eval;

#[cfg(test)]
mod test_support;

pub use checker::Checker;
pub use eval::{Placement, TypeEvaluator};
