//! Cache-backed session storage.

use std::time::Duration;

use fastwitter_protocol::{Codec, JsonCodec};
use fastwitter_store::Cache;

use crate::{key_prefix, Session, SessionData, SessionError};

/// Namespace of session entries in the cache.
const KEY_PREFIX: &str = "session_";

/// The cache key a session key is stored under.
pub fn cache_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

/// Reads and writes [`SessionData`] blobs in a [`Cache`].
///
/// There is no in-process copy: every call goes to the cache, so several
/// server processes can share sessions through one Redis.
#[derive(Debug, Clone)]
pub struct SessionStore<C> {
    cache: C,
    codec: JsonCodec,
}

impl<C: Cache> SessionStore<C> {
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            codec: JsonCodec,
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Loads the blob of `key`.
    ///
    /// A missing key and an undecodable blob both come back as
    /// `Ok(None)`; the latter is logged. Only cache failures are errors.
    pub async fn get(
        &self,
        key: &str,
    ) -> Result<Option<SessionData>, SessionError> {
        let Some(bytes) = self.cache.get(&cache_key(key)).await? else {
            return Ok(None);
        };
        match self.codec.decode(&bytes) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                tracing::warn!(
                    key = key_prefix(key),
                    error = %e,
                    "discarding undecodable session blob"
                );
                Ok(None)
            }
        }
    }

    /// Overwrites the blob of `key`, expiring `ttl` from now.
    pub async fn set(
        &self,
        key: &str,
        ttl: Duration,
        data: &SessionData,
    ) -> Result<(), SessionError> {
        let bytes = self.codec.encode(data)?;
        self.cache.set_ex(&cache_key(key), bytes, ttl).await?;
        Ok(())
    }

    pub async fn delete(&self, key: &str) -> Result<(), SessionError> {
        self.cache.delete(&cache_key(key)).await?;
        Ok(())
    }

    /// Writes `session` back with its current max-age as TTL.
    pub async fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.set(session.key(), session.max_age(), session.data())
            .await
    }
}
