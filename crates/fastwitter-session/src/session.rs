//! Session types: the per-request record of who is calling.
//!
//! A "session" binds a random key to an optional user. It tracks:
//! - WHICH key identifies it (48 hex characters, never changes)
//! - HOW the key arrived (cookie, header, or query parameter)
//! - WHO the user is (anonymous until hydrated or signed in)
//! - WHAT gets cached between requests ([`SessionData`])

use std::fmt;
use std::time::Duration;

use fastwitter_protocol::{User, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Cache TTL of an anonymous session: one hour.
pub const ANONYMOUS_TTL_SECS: u64 = 3600;

/// Cache TTL of an authenticated session: thirty days.
pub const AUTHENTICATED_TTL_SECS: u64 = 2_592_000;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "sid";

/// Name of the session header.
pub const HEADER_NAME: &str = "X-SID";

/// Name of the session query parameter.
pub const QUERY_PARAM: &str = "sid";

/// Random bytes in a session key.
const KEY_BYTES: usize = 24;

/// Length of a hex-encoded session key.
pub const KEY_LEN: usize = KEY_BYTES * 2;

// ---------------------------------------------------------------------------
// SessionKind
// ---------------------------------------------------------------------------

/// The transport a session key arrived on.
///
/// A session found through a key keeps that key's transport. A freshly
/// minted session is always `Cookie`, since the cookie is the only
/// transport the server can hand a new key back on by itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// The `sid` cookie.
    Cookie,
    /// The `X-SID` header.
    Header,
    /// The `sid` query parameter.
    Token,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionKind::Cookie => "cookie",
            SessionKind::Header => "header",
            SessionKind::Token => "token",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// SessionData
// ---------------------------------------------------------------------------

/// The part of a session that lives in the cache.
///
/// Serialized flat: `user_id` sits next to any extra keys, so the stored
/// blob is `{"user_id": 7}` or `{"user_id": null, ...}`. `user_id` is
/// always written, even when `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Keys other than `user_id`, kept as-is across writebacks.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionData {
    /// The stored user id, if it names a real user.
    ///
    /// A stored `0` is treated like `null`: both mean anonymous.
    pub fn authenticated_user_id(&self) -> Option<UserId> {
        self.user_id.filter(|id| !id.is_anonymous())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One request's session.
///
/// Created fresh for every request and never shared between requests.
/// Handlers change it only through [`Session::set_user`] and
/// [`Session::reset_user`]; the key and kind are fixed at construction.
#[derive(Debug, Clone)]
pub struct Session {
    key: String,
    kind: SessionKind,
    user: User,
    data: SessionData,
}

impl Session {
    /// Mints a new anonymous cookie session with a fresh random key.
    pub fn new() -> Self {
        Self {
            key: generate_key(),
            kind: SessionKind::Cookie,
            user: User::anonymous(),
            data: SessionData::default(),
        }
    }

    /// Rebuilds a session found in the store.
    ///
    /// The user starts out anonymous; the resolver hydrates it from
    /// `data.user_id` afterwards.
    pub fn restore(
        kind: SessionKind,
        key: impl Into<String>,
        data: SessionData,
    ) -> Self {
        Self {
            key: key.into(),
            kind,
            user: User::anonymous(),
            data,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// The user id recorded in the cached blob. Can differ from
    /// `user().id` when hydration failed.
    pub fn stored_user_id(&self) -> Option<UserId> {
        self.data.authenticated_user_id()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_authenticated()
    }

    /// How long the session should live in the cache (and the cookie in
    /// the browser) after this request.
    pub fn max_age(&self) -> Duration {
        if self.is_authenticated() {
            Duration::from_secs(AUTHENTICATED_TTL_SECS)
        } else {
            Duration::from_secs(ANONYMOUS_TTL_SECS)
        }
    }

    /// Binds `user` to the session. Calling it twice with the same user
    /// changes nothing. Binding the anonymous user stores `null`.
    pub fn set_user(&mut self, user: User) {
        self.data.user_id = Some(user.id).filter(|id| !id.is_anonymous());
        self.user = user;
    }

    /// Drops the bound user. The key stays the same, so the next
    /// writeback overwrites the cached blob with an anonymous one.
    pub fn reset_user(&mut self) {
        self.user = User::anonymous();
        self.data.user_id = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates a session key: 24 bytes from the thread-local CSPRNG,
/// hex-encoded to 48 lowercase characters.
pub fn generate_key() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; KEY_BYTES] = rng.random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Shorthand for an authenticated user with the given id.
    fn user(id: i64) -> User {
        User {
            id: UserId(id),
            en: Some(true),
            name: format!("user{id}"),
            join_date: None,
        }
    }

    // =====================================================================
    // generate_key()
    // =====================================================================

    #[test]
    fn test_generate_key_is_48_lowercase_hex_chars() {
        let key = generate_key();
        assert_eq!(key.len(), KEY_LEN);
        assert!(key.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    }

    #[test]
    fn test_generate_key_is_unique() {
        assert_ne!(generate_key(), generate_key());
    }

    // =====================================================================
    // Session::new() / restore()
    // =====================================================================

    #[test]
    fn test_new_session_is_anonymous_cookie() {
        let session = Session::new();

        assert_eq!(session.kind(), SessionKind::Cookie);
        assert_eq!(session.key().len(), KEY_LEN);
        assert!(!session.is_authenticated());
        assert_eq!(session.data().user_id, None);
        assert_eq!(session.max_age(), Duration::from_secs(3600));
    }

    #[test]
    fn test_restore_keeps_key_kind_and_data() {
        let data = SessionData {
            user_id: Some(UserId(4)),
            ..SessionData::default()
        };
        let session = Session::restore(SessionKind::Header, "abc", data);

        assert_eq!(session.key(), "abc");
        assert_eq!(session.kind(), SessionKind::Header);
        assert_eq!(session.stored_user_id(), Some(UserId(4)));
        // Not hydrated yet.
        assert!(!session.is_authenticated());
    }

    // =====================================================================
    // set_user() / reset_user()
    // =====================================================================

    #[test]
    fn test_set_user_mirrors_id_into_data() {
        let mut session = Session::new();
        session.set_user(user(7));

        assert!(session.is_authenticated());
        assert_eq!(session.data().user_id, Some(UserId(7)));
        assert_eq!(session.max_age(), Duration::from_secs(2_592_000));
    }

    #[test]
    fn test_set_user_twice_is_idempotent() {
        let mut session = Session::new();
        session.set_user(user(7));
        let before = session.data().clone();
        session.set_user(user(7));

        assert_eq!(session.data(), &before);
    }

    #[test]
    fn test_set_user_anonymous_stores_null() {
        let mut session = Session::new();
        session.set_user(User::anonymous());
        assert_eq!(session.data().user_id, None);
    }

    #[test]
    fn test_set_user_then_reset_user_clears_user_id() {
        let mut session = Session::new();
        let key = session.key().to_owned();
        session.set_user(user(7));
        session.reset_user();

        assert!(!session.is_authenticated());
        assert_eq!(session.data().user_id, None);
        assert_eq!(session.max_age(), Duration::from_secs(3600));
        // The key never rotates.
        assert_eq!(session.key(), key);
    }

    #[test]
    fn test_reset_user_keeps_extra_keys() {
        let mut data = SessionData::default();
        data.extra.insert("theme".into(), "dark".into());
        let mut session = Session::restore(SessionKind::Cookie, "k", data);

        session.reset_user();
        assert_eq!(session.data().extra["theme"], "dark");
    }

    // =====================================================================
    // SessionData wire format
    // =====================================================================

    #[test]
    fn test_session_data_serializes_null_user_id() {
        let json = serde_json::to_value(SessionData::default()).unwrap();
        assert_eq!(json, serde_json::json!({"user_id": null}));
    }

    #[test]
    fn test_session_data_flattens_extra_keys() {
        let json = r#"{"user_id": 3, "theme": "dark"}"#;
        let data: SessionData = serde_json::from_str(json).unwrap();

        assert_eq!(data.user_id, Some(UserId(3)));
        assert_eq!(data.extra["theme"], "dark");
        assert!(!data.extra.contains_key("user_id"));

        let back = serde_json::to_value(&data).unwrap();
        assert_eq!(back, serde_json::json!({"user_id": 3, "theme": "dark"}));
    }

    #[test]
    fn test_session_data_missing_user_id_is_anonymous() {
        let data: SessionData = serde_json::from_str("{}").unwrap();
        assert_eq!(data.authenticated_user_id(), None);
    }

    #[test]
    fn test_session_data_zero_user_id_is_anonymous() {
        let data: SessionData =
            serde_json::from_str(r#"{"user_id": 0}"#).unwrap();
        assert_eq!(data.authenticated_user_id(), None);
    }

    #[test]
    fn test_session_kind_display() {
        assert_eq!(SessionKind::Cookie.to_string(), "cookie");
        assert_eq!(SessionKind::Header.to_string(), "header");
        assert_eq!(SessionKind::Token.to_string(), "token");
    }
}
