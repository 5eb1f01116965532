//! Shared utilities.
//!
//! Hashing and test helpers.

pub mod hash;
