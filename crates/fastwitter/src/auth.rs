//! `/auth` routes: who am I, sign up, sign in, log out.
//!
//! Every route answers with the session key and the user bound to the
//! session after the handler ran, so a client using the `X-SID` header
//! or `sid` query parameter learns its key from the body.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use fastwitter_protocol::{MeResponse, SignIn, SignUp, SuccessResponse};
use fastwitter_session::Session;
use fastwitter_store::{Cache, Repository, StoreError};

use crate::extract::ValidJson;
use crate::lifecycle::SessionHandle;
use crate::server::ServerState;
use crate::{password, ApiError};

type MeResult = Result<Json<SuccessResponse<MeResponse>>, ApiError>;

const NAME_TAKEN: &str = "This name already exist";

fn me_response(session: &Session) -> Json<SuccessResponse<MeResponse>> {
    Json(SuccessResponse::new(MeResponse {
        token: session.key().to_owned(),
        me: session.user().clone(),
    }))
}

/// `GET /auth/me`
pub async fn me(session: SessionHandle) -> MeResult {
    Ok(me_response(&*session.lock().await))
}

/// `POST /auth/sign-up`
pub async fn sign_up<C, R>(
    State(state): State<Arc<ServerState<C, R>>>,
    session: SessionHandle,
    ValidJson(body): ValidJson<SignUp>,
) -> MeResult
where
    C: Cache + Clone,
    R: Repository,
{
    let mut session = session.lock().await;
    if session.is_authenticated() {
        return Err(ApiError::Unauthenticated);
    }

    if state.repo.get_user_by_name(&body.name).await?.is_some() {
        return Err(ApiError::BadRequest(NAME_TAKEN.into()));
    }

    let pass_hash = password::hash_password_blocking(body.password).await?;
    let user = match state.repo.create_user(&body.name, &pass_hash).await {
        Ok(user) => user,
        // Lost a race with another sign-up for the same name.
        Err(StoreError::Conflict(_)) => {
            return Err(ApiError::BadRequest(NAME_TAKEN.into()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = %user.id, "user signed up");
    session.set_user(user);
    Ok(me_response(&session))
}

/// `POST /auth/sign-in`
///
/// An unknown name and a wrong password are both 404.
pub async fn sign_in<C, R>(
    State(state): State<Arc<ServerState<C, R>>>,
    session: SessionHandle,
    ValidJson(body): ValidJson<SignIn>,
) -> MeResult
where
    C: Cache + Clone,
    R: Repository,
{
    let mut session = session.lock().await;
    if session.is_authenticated() {
        return Err(ApiError::Unauthenticated);
    }

    let Some(record) = state.repo.get_user_by_name(&body.name).await? else {
        return Err(ApiError::NotFound);
    };
    let verified =
        password::verify_password_blocking(body.password, record.pass_hash)
            .await?;
    if !verified {
        tracing::info!(user_id = %record.user.id, "sign-in rejected");
        return Err(ApiError::NotFound);
    }

    tracing::info!(user_id = %record.user.id, "user signed in");
    session.set_user(record.user);
    Ok(me_response(&session))
}

/// `POST /auth/logout`
///
/// Keeps the session key; the write-back overwrites it as anonymous.
pub async fn logout(session: SessionHandle) -> MeResult {
    let mut session = session.lock().await;
    if session.is_authenticated() {
        tracing::info!(user_id = %session.user().id, "user logged out");
    }
    session.reset_user();
    Ok(me_response(&session))
}
