//! Content hashing for Keystone.
//!
//! Every content-addressed value in Keystone is identified by a SHA-256
//! digest over a canonical byte encoding. This crate owns both halves of
//! that contract: [`ContentHasher`] computes digests, and [`canonical_json`]
//! produces the stable byte encoding for serializable values.
//!
//! All crypto operations wrap the `sha2` crate; there is no custom cryptography.

pub mod canonical;
pub mod hasher;

pub use canonical::{canonical_json, CanonicalError};
pub use hasher::ContentHasher;
