//! Request session management for Fastwitter.
//!
//! Every HTTP request gets exactly one [`Session`]. This crate finds it:
//!
//! 1. **Credentials**: up to three raw session keys read off a request
//!    ([`Credentials`]), tried in the fixed order cookie, header, query.
//! 2. **Storage**: the session blob kept in the cache under
//!    `session_{key}` ([`SessionStore`]).
//! 3. **Resolution**: turning credentials into a hydrated session, or
//!    minting a fresh anonymous one ([`SessionResolver`]).
//!
//! Binding the session to a request and writing it back afterwards is
//! the HTTP server's job; this crate has no HTTP dependency.
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)  ← resolves before the handler, writes back after it
//!     ↕
//! Session Layer (this crate)  ← session identity and its cached state
//!     ↕
//! Store + Protocol (below)  ← Cache, UserRepository, User, JsonCodec
//! ```

mod credentials;
mod error;
mod resolver;
mod session;
mod store;

pub use credentials::Credentials;
pub use error::SessionError;
pub use resolver::SessionResolver;
pub use session::{
    generate_key, Session, SessionData, SessionKind, ANONYMOUS_TTL_SECS,
    AUTHENTICATED_TTL_SECS, COOKIE_NAME, HEADER_NAME, KEY_LEN, QUERY_PARAM,
};
pub use store::{cache_key, SessionStore};

/// First eight characters of a session key, safe to put in a log line.
pub(crate) fn key_prefix(key: &str) -> &str {
    key.char_indices().nth(8).map_or(key, |(i, _)| &key[..i])
}
