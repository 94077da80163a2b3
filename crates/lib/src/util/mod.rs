//! Shared utilities.
//!
//! Content hashing for change detection and test helpers.

pub mod hash;

#[cfg(test)]
pub mod testutil;
