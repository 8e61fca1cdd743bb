//! Request-scoped session lifecycle.
//!
//! [`session_lifecycle`] wraps every route:
//!
//! ```text
//! request ─→ read credentials ─→ resolve ─→ bind SessionHandle ─→ handler
//!                                                                    │
//! response ←─ Set-Cookie (cookie sessions) ←─ write back session ←───┘
//! ```
//!
//! The write-back runs for every response the inner service produces:
//! successes, `ApiError`s, extractor rejections, unknown routes, and
//! panics (turned into 500s by the `CatchPanicLayer` inside this one).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{FromRequestParts, Query, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use cookie::{Cookie, SameSite};
use fastwitter_protocol::User;
use fastwitter_session::{
    Credentials, Session, SessionKind, COOKIE_NAME, HEADER_NAME, QUERY_PARAM,
};
use fastwitter_store::{Cache, Repository};
use tokio::sync::{Mutex, MutexGuard};

use crate::server::ServerState;
use crate::ApiError;

// ---------------------------------------------------------------------------
// SessionHandle
// ---------------------------------------------------------------------------

/// The current request's session, shared between the middleware and the
/// handler.
///
/// Each request gets its own handle; it is never visible to another
/// request. Handlers take it as an extractor and lock it to read or
/// change the bound user.
#[derive(Debug, Clone)]
pub struct SessionHandle(Arc<Mutex<Session>>);

impl SessionHandle {
    pub fn new(session: Session) -> Self {
        Self(Arc::new(Mutex::new(session)))
    }

    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.0.lock().await
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SessionHandle {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<SessionHandle>().cloned().ok_or_else(|| {
            tracing::error!("route is missing the session lifecycle layer");
            ApiError::Internal
        })
    }
}

/// Extracts the signed-in user, rejecting anonymous sessions with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S: Send + Sync> FromRequestParts<S> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let handle = SessionHandle::from_request_parts(parts, state).await?;
        let session = handle.lock().await;
        if session.is_authenticated() {
            Ok(Self(session.user().clone()))
        } else {
            Err(ApiError::Unauthenticated)
        }
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Resolves the session before the handler and writes it back after.
///
/// A failed write-back replaces the handler's response with a 500 and
/// sets no cookie: the client must not believe a sign-in or logout took
/// effect when the cache never saw it.
pub async fn session_lifecycle<C, R>(
    State(state): State<Arc<ServerState<C, R>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    C: Cache + Clone,
    R: Repository,
{
    let credentials = credentials_from(request.headers(), request.uri());
    let session = state.sessions.resolve(&credentials).await;

    let handle = SessionHandle::new(session);
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let session = handle.lock().await;
    if let Err(e) = state.sessions.write_back(&session).await {
        tracing::error!(
            kind = %session.kind(),
            error = %e,
            "session write-back failed"
        );
        return ApiError::Internal.into_response();
    }

    if session.kind() == SessionKind::Cookie {
        match HeaderValue::from_str(&session_cookie(&session).to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => {
                tracing::warn!(error = %e, "session cookie is not a valid header");
            }
        }
    }
    response
}

/// Reads the three credential candidates off a request.
pub(crate) fn credentials_from(headers: &HeaderMap, uri: &Uri) -> Credentials {
    let cookie = headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|c| c.name() == COOKIE_NAME)
        .map(|c| c.value().to_owned());

    let header = headers
        .get(HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let query = Query::<HashMap<String, String>>::try_from_uri(uri)
        .ok()
        .and_then(|Query(mut params)| params.remove(QUERY_PARAM));

    Credentials {
        cookie,
        header,
        query,
    }
}

/// The sliding `sid` cookie for `session`'s current state.
pub(crate) fn session_cookie(session: &Session) -> Cookie<'static> {
    let max_age =
        i64::try_from(session.max_age().as_secs()).unwrap_or(i64::MAX);
    Cookie::build((COOKIE_NAME, session.key().to_owned()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(cookie::time::Duration::seconds(max_age))
        .build()
}
