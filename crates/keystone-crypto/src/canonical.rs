//! Canonical JSON encoding.
//!
//! Values are first converted to a `serde_json::Value`, whose object type is
//! a `BTreeMap`, and then written without whitespace. Object keys therefore
//! always appear in sorted order regardless of struct field order or map
//! iteration order, which makes the encoding stable across builds.

use serde::Serialize;

/// Errors from canonical encoding.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("canonical encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Encode `value` as canonical JSON bytes.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&value)?)
}
