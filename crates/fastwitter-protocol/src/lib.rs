//! API types for Fastwitter.
//!
//! This crate defines the shapes that clients and the server exchange:
//!
//! - **Types** ([`User`], [`Post`], [`SignUp`], [`SuccessResponse`], etc.):
//!   the request bodies and response envelopes of the `/api/v1` routes.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how values are converted
//!   to/from bytes, both on the HTTP boundary and in the cache.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding or validation.
//!
//! # Architecture
//!
//! The protocol layer is the bottom of the workspace. It knows nothing about
//! caches, databases, or sessions. Every other crate depends on it.
//!
//! ```text
//! Protocol (types, codec) ← Store (cache, repositories) ← Session ← Server
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ErrorResponse, ListData, MeResponse, NewPost, Post, PostId, SignIn,
    SignUp, SuccessResponse, UpdatePost, User, UserId, Validate,
    ValidationError,
};
