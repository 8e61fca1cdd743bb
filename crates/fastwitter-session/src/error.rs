//! Error types for the session layer.

use fastwitter_protocol::ProtocolError;
use fastwitter_store::StoreError;

/// Errors that can occur while loading or saving a session.
///
/// Only writes surface these to callers. Reads are recovered inside the
/// resolver: an unreachable cache or an undecodable blob just means the
/// request continues with a fresh anonymous session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The cache failed to read or write the session blob.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The session data could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
