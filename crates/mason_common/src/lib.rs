//! Shared foundational types used across the Mason build engine.
//!
//! This crate provides the content signature type used for the up-to-date
//! decision and the content hash used for store integrity checks.

#![warn(missing_docs)]

pub mod hash;
pub mod signature;

pub use hash::ContentHash;
pub use signature::Signature;
