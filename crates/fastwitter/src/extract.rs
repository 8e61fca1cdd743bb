//! Extractors that reject with [`ApiError`] instead of axum's plain-text
//! rejections, so every 4xx body has the same `ErrorResponse` shape.

use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use fastwitter_protocol::{PostId, Validate, ValidationError};
use serde::de::DeserializeOwned;

use crate::ApiError;

/// A JSON body that has been deserialized and passed [`Validate`].
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ValidationError::new(
                    "body",
                    rejection.body_text(),
                )])
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query parameters, rejecting with a validation error.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ValidationError::new(
                    "query",
                    rejection.body_text(),
                )])
            })?;
        Ok(Self(value))
    }
}

/// The `{id}` segment of a `/posts/{id}` route.
#[derive(Debug, Clone, Copy)]
pub struct PostIdPath(pub PostId);

impl<S: Send + Sync> FromRequestParts<S> for PostIdPath {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ValidationError::new(
                    "post_id",
                    rejection.body_text(),
                )])
            })?;
        Ok(Self(PostId(id)))
    }
}
