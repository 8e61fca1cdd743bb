//! `/posts` routes. All of them require a signed-in user.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use fastwitter_protocol::{
    ListData, NewPost, Post, PostId, SuccessResponse, UpdatePost,
};
use fastwitter_store::{Cache, Repository};
use serde::Deserialize;

use crate::extract::{PostIdPath, ValidJson, ValidQuery};
use crate::lifecycle::AuthenticatedUser;
use crate::server::ServerState;
use crate::ApiError;

type ApiResult<T> = Result<Json<SuccessResponse<T>>, ApiError>;
type AppState<C, R> = State<Arc<ServerState<C, R>>>;

/// Largest page a client can ask for.
pub const MAX_PAGE_SIZE: i64 = 20;

/// Query of `GET /posts`. Out-of-range values are clamped, not rejected.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageParams {
    /// `(page, limit)` with `page >= 1` and `1 <= limit <= 20`.
    pub fn clamped(&self) -> (i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }
}

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(SuccessResponse::new(data)))
}

/// Loads `id` and checks that `user` wrote it.
async fn owned_post<C, R>(
    state: &ServerState<C, R>,
    id: PostId,
    user: &AuthenticatedUser,
) -> Result<Post, ApiError>
where
    C: Cache + Clone,
    R: Repository,
{
    let post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;
    if post.author_id != user.0.id {
        return Err(ApiError::Forbidden);
    }
    Ok(post)
}

async fn with_likes<C, R>(
    state: &ServerState<C, R>,
    mut post: Post,
) -> Result<Post, ApiError>
where
    C: Cache + Clone,
    R: Repository,
{
    post.likes = state.likes.load(post.id).await?;
    Ok(post)
}

/// `POST /posts`
pub async fn create<C, R>(
    State(state): AppState<C, R>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(body): ValidJson<NewPost>,
) -> ApiResult<Post>
where
    C: Cache + Clone,
    R: Repository,
{
    let post = state.repo.create_post(user.id, &body).await?;
    state.likes.init(post.id).await?;
    tracing::debug!(post_id = %post.id, user_id = %user.id, "post created");
    ok(post)
}

/// `GET /posts?page&limit`
pub async fn list<C, R>(
    State(state): AppState<C, R>,
    _user: AuthenticatedUser,
    ValidQuery(params): ValidQuery<PageParams>,
) -> ApiResult<ListData<Post>>
where
    C: Cache + Clone,
    R: Repository,
{
    let (page, limit) = params.clamped();
    let mut items = Vec::new();
    for post in state.repo.list_posts(page, limit).await? {
        items.push(with_likes(&state, post).await?);
    }
    let total = state.repo.count_posts().await?;
    ok(ListData {
        items,
        limit,
        page,
        total,
    })
}

/// `POST /posts/{id}`
///
/// A body with neither field returns the post unchanged.
pub async fn update<C, R>(
    State(state): AppState<C, R>,
    user: AuthenticatedUser,
    PostIdPath(id): PostIdPath,
    ValidJson(body): ValidJson<UpdatePost>,
) -> ApiResult<Post>
where
    C: Cache + Clone,
    R: Repository,
{
    let post = owned_post(&state, id, &user).await?;
    if body.is_empty() {
        return ok(with_likes(&state, post).await?);
    }
    let post = state
        .repo
        .update_post(id, &body)
        .await?
        .ok_or(ApiError::NotFound)?;
    ok(with_likes(&state, post).await?)
}

/// `DELETE /posts/{id}`
pub async fn delete<C, R>(
    State(state): AppState<C, R>,
    user: AuthenticatedUser,
    PostIdPath(id): PostIdPath,
) -> ApiResult<()>
where
    C: Cache + Clone,
    R: Repository,
{
    owned_post(&state, id, &user).await?;
    if state.repo.delete_post(id).await?.is_none() {
        return Err(ApiError::NotFound);
    }
    state.likes.clear(id).await?;
    tracing::debug!(post_id = %id, user_id = %user.0.id, "post deleted");
    Ok(Json(SuccessResponse::empty()))
}

/// `GET /posts/{id}/like`
///
/// Toggles the caller's like: the first call adds it, the next removes it.
pub async fn like<C, R>(
    State(state): AppState<C, R>,
    AuthenticatedUser(user): AuthenticatedUser,
    PostIdPath(id): PostIdPath,
) -> ApiResult<Post>
where
    C: Cache + Clone,
    R: Repository,
{
    let mut post = state.repo.get_post(id).await?.ok_or(ApiError::NotFound)?;
    post.likes = state.likes.toggle(id, user.id).await?;
    ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(page: Option<i64>, limit: Option<i64>) -> PageParams {
        PageParams { page, limit }
    }

    #[test]
    fn test_clamped_defaults_to_first_page_of_twenty() {
        assert_eq!(PageParams::default().clamped(), (1, 20));
    }

    #[test]
    fn test_clamped_caps_limit_at_twenty() {
        assert_eq!(params(Some(2), Some(500)).clamped(), (2, 20));
    }

    #[test]
    fn test_clamped_raises_non_positive_values_to_one() {
        assert_eq!(params(Some(0), Some(0)).clamped(), (1, 1));
        assert_eq!(params(Some(-3), Some(-10)).clamped(), (1, 1));
    }
}
