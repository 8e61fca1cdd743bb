//! Error types for the protocol layer.
//!
//! Each crate in Fastwitter defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in serialization or in the
//! shape of a request body, not in storage or session handling.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing required fields,
    /// wrong data types, or a truncated cache entry.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The value parsed, but violates a field rule (too short a name,
    /// too short a password, ...). Carries every failed field.
    #[error("invalid input: {} field(s) failed validation", .0.len())]
    Invalid(Vec<crate::ValidationError>),
}
