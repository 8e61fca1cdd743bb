//! Session resolution: credentials in, hydrated session out.

use std::sync::Arc;

use fastwitter_store::{Cache, UserRepository};

use crate::{
    key_prefix, Credentials, Session, SessionError, SessionStore,
};

/// Finds the session of a request.
///
/// ## Resolution order
///
/// ```text
/// cookie ──miss──→ header ──miss──→ query ──miss──→ new anonymous cookie session
///   │hit             │hit             │hit
///   ▼                ▼                ▼
/// restore(kind, key, data) ──→ hydrate user from data.user_id
/// ```
///
/// The first hit wins. Lower-priority candidates are never consulted
/// after a hit, even if hydrating its user fails.
///
/// Nothing here returns an error. A cache that can't be read, a blob that
/// can't be decoded, a user that no longer exists: each degrades to an
/// anonymous session and a log line. Only [`SessionResolver::write_back`]
/// can fail.
pub struct SessionResolver<C, U> {
    store: SessionStore<C>,
    users: Arc<U>,
}

impl<C: Cache, U: UserRepository> SessionResolver<C, U> {
    pub fn new(store: SessionStore<C>, users: Arc<U>) -> Self {
        Self { store, users }
    }

    pub fn store(&self) -> &SessionStore<C> {
        &self.store
    }

    /// Resolves `credentials` to a session, minting a new one if no
    /// candidate key is found in the store.
    pub async fn resolve(&self, credentials: &Credentials) -> Session {
        for (key, kind) in credentials.candidates() {
            match self.store.get(key).await {
                Ok(Some(data)) => {
                    let session = Session::restore(kind, key, data);
                    return self.hydrate(session).await;
                }
                Ok(None) => {
                    tracing::debug!(%kind, key = key_prefix(key), "session miss");
                }
                Err(e) => {
                    tracing::warn!(
                        %kind,
                        key = key_prefix(key),
                        error = %e,
                        "session read failed, treating as miss"
                    );
                }
            }
        }

        let session = Session::new();
        tracing::debug!(key = key_prefix(session.key()), "new session");
        session
    }

    /// Attaches the user named by the stored `user_id`, if any.
    async fn hydrate(&self, mut session: Session) -> Session {
        let Some(user_id) = session.stored_user_id() else {
            return session;
        };

        match self.users.get_user(user_id).await {
            Ok(Some(user)) => session.set_user(user),
            Ok(None) => {
                // The user is gone; the next writeback stores `null`.
                tracing::warn!(
                    %user_id,
                    key = key_prefix(session.key()),
                    "session references missing user, resetting"
                );
                session.reset_user();
            }
            Err(e) => {
                // Stay anonymous for this request but keep `user_id`,
                // so the next request tries again.
                tracing::warn!(
                    %user_id,
                    error = %e,
                    "user lookup failed, continuing anonymous"
                );
            }
        }
        session
    }

    /// Persists `session` with its current max-age.
    ///
    /// # Errors
    /// Returns the store's error. Callers must not swallow it: a lost
    /// writeback silently undoes a sign-in or logout.
    pub async fn write_back(&self, session: &Session) -> Result<(), SessionError> {
        self.store.save(session).await
    }
}
