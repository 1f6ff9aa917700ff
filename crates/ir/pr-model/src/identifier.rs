//! Globally unique identifiers

use derive_more::Display;
use num_bigint::BigUint;

/// Opaque token naming one declared type for the lifetime of a compilation run
///
/// Identifiers are minted by the global context's allocator and never reused.
/// They are unbounded so that no schema can exhaust them.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{_0}")]
pub struct Identifier(BigUint);

impl Identifier {
    /// Wraps a raw counter value; only allocators should call this
    pub fn from_raw(value: BigUint) -> Self {
        Self(value)
    }

    /// The underlying counter value
    pub fn value(&self) -> &BigUint {
        &self.0
    }
}
