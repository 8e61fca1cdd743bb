//! Core API types for Fastwitter.
//!
//! Every type here either travels over HTTP as JSON (request bodies,
//! response envelopes) or is stored as part of a cached blob. The serde
//! attributes therefore define the public wire format; the tests at the
//! bottom of the file pin the exact JSON shapes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user.
///
/// Newtype over the database's `BIGSERIAL` key. `#[serde(transparent)]`
/// keeps it a plain number on the wire: `UserId(42)` is `42`, which is
/// also how it appears inside session blobs and like-sets.
///
/// `UserId(0)` is reserved for the anonymous user. The database never
/// hands out id 0, so "zero" and "no user" can share one representation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl UserId {
    /// The id carried by the anonymous user.
    pub const ANONYMOUS: UserId = UserId(0);

    /// Returns `true` for the reserved anonymous id.
    pub fn is_anonymous(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A unique identifier for a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user as seen by handlers and clients.
///
/// The anonymous user is not a separate type: it is `User::default()`,
/// id 0 with an empty name. Handlers always get a `User` and ask
/// [`User::is_authenticated`] instead of matching on an `Option`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    /// Enabled flag. `None` for the anonymous user.
    #[serde(default)]
    pub en: Option<bool>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub join_date: Option<DateTime<Utc>>,
}

impl User {
    /// The anonymous user (id 0).
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        !self.id.is_anonymous()
    }
}

// ---------------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------------

/// A post with its like-set attached.
///
/// `likes` is not a database column. It is filled in from the cache
/// (`post_{id}`) right before the post is returned to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub author_id: UserId,
    #[serde(default)]
    pub likes: Vec<UserId>,
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub body: String,
}

/// Body of `POST /posts/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePost {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

impl UpdatePost {
    /// `true` when the update would change nothing.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

const MIN_NAME_LEN: usize = 4;
const MIN_PASSWORD_LEN: usize = 8;

/// Body of `POST /auth/sign-up`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignUp {
    pub name: String,
    pub password: String,
}

/// Body of `POST /auth/sign-in`. Same fields and rules as sign-up.
pub type SignIn = SignUp;

/// Response data of every `/auth` route: the session key and the user
/// bound to it after the handler ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeResponse {
    pub token: String,
    pub me: User,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One failed field rule, reported back to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Field rules checked after a body has been deserialized.
///
/// The default accepts everything, so bodies without rules only need an
/// empty `impl Validate for T {}`.
pub trait Validate {
    /// # Errors
    /// Returns `ProtocolError::Invalid` listing every failed field.
    fn validate(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

impl Validate for NewPost {}

impl Validate for UpdatePost {}

impl Validate for SignUp {
    fn validate(&self) -> Result<(), ProtocolError> {
        let mut errors = Vec::new();
        if self.name.chars().count() < MIN_NAME_LEN {
            errors.push(min_length("name", MIN_NAME_LEN));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(min_length("password", MIN_PASSWORD_LEN));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::Invalid(errors))
        }
    }
}

fn min_length(field: &str, min: usize) -> ValidationError {
    ValidationError::new(
        field,
        format!("ensure this value has at least {min} characters"),
    )
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------

/// The `{"success": true, "data": ...}` envelope of every 2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: Option<T>,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }

    /// A success envelope without data (`"data": null`).
    pub fn empty() -> Self {
        Self {
            success: true,
            data: None,
        }
    }
}

/// A page of items plus the pagination that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListData<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub page: i64,
    pub total: i64,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub validation_error: Option<Vec<ValidationError>>,
    pub debug: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            validation_error: None,
            debug: None,
        }
    }

    pub fn with_validation(mut self, errors: Vec<ValidationError>) -> Self {
        self.validation_error = Some(errors);
        self
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The JSON shapes below are what existing clients parse. A change
    //! here is a breaking API change.

    use super::*;

    fn sign_up(name: &str, password: &str) -> SignUp {
        SignUp {
            name: name.into(),
            password: password.into(),
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(7).to_string(), "U-7");
        assert_eq!(PostId(3).to_string(), "#3");
    }

    #[test]
    fn test_user_id_zero_is_anonymous() {
        assert!(UserId(0).is_anonymous());
        assert!(!UserId(1).is_anonymous());
        assert_eq!(UserId::default(), UserId::ANONYMOUS);
    }

    // =====================================================================
    // User
    // =====================================================================

    #[test]
    fn test_anonymous_user_json_format() {
        let json = serde_json::to_value(User::anonymous()).unwrap();

        assert_eq!(json["id"], 0);
        assert_eq!(json["name"], "");
        assert!(json["en"].is_null());
        assert!(json["join_date"].is_null());
    }

    #[test]
    fn test_user_is_authenticated_iff_id_non_zero() {
        assert!(!User::anonymous().is_authenticated());

        let alice = User {
            id: UserId(5),
            en: Some(true),
            name: "alice".into(),
            join_date: Some(Utc::now()),
        };
        assert!(alice.is_authenticated());
    }

    #[test]
    fn test_user_deserializes_with_missing_optional_fields() {
        let user: User = serde_json::from_str(r#"{"id": 3}"#).unwrap();
        assert_eq!(user.id, UserId(3));
        assert!(user.name.is_empty());
        assert!(user.join_date.is_none());
    }

    // =====================================================================
    // Posts
    // =====================================================================

    #[test]
    fn test_post_likes_default_to_empty() {
        let json = r#"{
            "id": 1,
            "title": "t",
            "body": "b",
            "created_at": "2024-01-01T00:00:00Z",
            "author_id": 2
        }"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.likes.is_empty());
        assert_eq!(post.author_id, UserId(2));
    }

    #[test]
    fn test_update_post_missing_fields_is_empty() {
        let update: UpdatePost = serde_json::from_str("{}").unwrap();
        assert!(update.is_empty());

        let update: UpdatePost =
            serde_json::from_str(r#"{"title": "new"}"#).unwrap();
        assert!(!update.is_empty());
        assert!(update.body.is_none());
    }

    #[test]
    fn test_new_post_missing_body_returns_error() {
        let result: Result<NewPost, _> =
            serde_json::from_str(r#"{"title": "only"}"#);
        assert!(result.is_err());
    }

    // =====================================================================
    // Validation
    // =====================================================================

    #[test]
    fn test_sign_up_validate_accepts_minimum_lengths() {
        assert!(sign_up("alic", "password").validate().is_ok());
    }

    #[test]
    fn test_sign_up_validate_short_name_reports_name() {
        let err = sign_up("bob", "password1").validate().unwrap_err();
        let ProtocolError::Invalid(errors) = err else {
            panic!("expected Invalid, got {err:?}");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "name");
    }

    #[test]
    fn test_sign_up_validate_reports_every_failed_field() {
        let err = sign_up("", "short").validate().unwrap_err();
        let ProtocolError::Invalid(errors) = err else {
            panic!("expected Invalid, got {err:?}");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["name", "password"]);
    }

    #[test]
    fn test_sign_up_validate_counts_chars_not_bytes() {
        // Four characters, eight bytes.
        assert!(sign_up("ёжик", "password").validate().is_ok());
    }

    // =====================================================================
    // Envelopes
    // =====================================================================

    #[test]
    fn test_success_response_json_format() {
        let json = serde_json::to_value(SuccessResponse::new(1)).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": 1}));
    }

    #[test]
    fn test_success_response_empty_has_null_data() {
        let json =
            serde_json::to_value(SuccessResponse::<()>::empty()).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": null}));
    }

    #[test]
    fn test_error_response_json_format() {
        let body = ErrorResponse::new("Client sent incomplete data")
            .with_validation(vec![ValidationError::new("name", "too short")]);
        let json = serde_json::to_value(body).unwrap();

        assert_eq!(json["error"], "Client sent incomplete data");
        assert_eq!(json["validation_error"][0]["field"], "name");
        assert!(json["debug"].is_null());
    }

    #[test]
    fn test_me_response_json_format() {
        let me = MeResponse {
            token: "abc".into(),
            me: User::anonymous(),
        };
        let json = serde_json::to_value(me).unwrap();
        assert_eq!(json["token"], "abc");
        assert_eq!(json["me"]["id"], 0);
    }
}
