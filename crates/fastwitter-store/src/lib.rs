//! Storage abstraction layer for Fastwitter.
//!
//! Provides the seams between the application and its two stores:
//!
//! - [`Cache`]: an ephemeral key/value store with optional TTL. Sessions
//!   (`session_{key}`) and post like-sets (`post_{id}`) live here.
//! - [`UserRepository`] and [`PostRepository`]: the durable store.
//!
//! # Feature Flags
//!
//! - `redis` (default): [`RedisCache`] via `deadpool-redis`
//! - `postgres` (default): [`PgRepository`] via `sqlx`
//!
//! The in-memory backends ([`MemoryCache`], [`MemoryRepository`]) are
//! always available. They back the test suites and local development.

#![allow(async_fn_in_trait)]

mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
#[cfg(feature = "redis")]
mod redis;

pub use error::StoreError;
pub use memory::{MemoryCache, MemoryRepository};
#[cfg(feature = "postgres")]
pub use postgres::PgRepository;
#[cfg(feature = "redis")]
pub use redis::RedisCache;

use std::future::Future;
use std::time::Duration;

use fastwitter_protocol::{NewPost, Post, PostId, UpdatePost, User, UserId};

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// An ephemeral byte-oriented key/value store.
///
/// Every write overwrites unconditionally: concurrent writers to the same
/// key are last-write-wins. Values are opaque bytes; encoding is the
/// caller's business (see `fastwitter_protocol::Codec`).
///
/// Implementations may use `async fn`; the returned futures must be
/// `Send`.
pub trait Cache: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` when the key is
    /// absent or has expired.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, StoreError>> + Send;

    /// Stores `value` under `key` without expiry.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Stores `value` under `key`, expiring `ttl` from now.
    /// Overwriting resets the timer.
    fn set_ex(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes `key`. Removing a missing key is not an error.
    fn delete(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// A user row together with its password hash.
///
/// Only sign-in ever needs the hash, so it is kept out of [`User`] and
/// can never leak into a response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: User,
    pub pass_hash: String,
}

/// Durable storage of user accounts.
pub trait UserRepository: Send + Sync + 'static {
    /// Inserts a new user and returns it.
    ///
    /// # Errors
    /// `StoreError::Conflict` if `name` is already taken.
    fn create_user(
        &self,
        name: &str,
        pass_hash: &str,
    ) -> impl Future<Output = Result<User, StoreError>> + Send;

    /// Looks a user up by id. `Ok(None)` if no such user exists.
    fn get_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, StoreError>> + Send;

    /// Looks a user up by name, including the password hash.
    fn get_user_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, StoreError>> + Send;
}

/// Durable storage of posts. Returned posts carry an empty `likes` list;
/// like-sets live in the cache.
pub trait PostRepository: Send + Sync + 'static {
    fn create_post(
        &self,
        author: UserId,
        post: &NewPost,
    ) -> impl Future<Output = Result<Post, StoreError>> + Send;

    fn get_post(
        &self,
        id: PostId,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send;

    /// Updates only the fields present in `update`. `Ok(None)` if the
    /// post does not exist.
    fn update_post(
        &self,
        id: PostId,
        update: &UpdatePost,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send;

    /// Deletes a post and returns the removed row.
    fn delete_post(
        &self,
        id: PostId,
    ) -> impl Future<Output = Result<Option<Post>, StoreError>> + Send;

    /// Returns page `page` (1-based) of `limit` posts, ordered by id.
    fn list_posts(
        &self,
        page: i64,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<Post>, StoreError>> + Send;

    fn count_posts(
        &self,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;
}

/// Both repositories behind one handle, which is how the server holds
/// its durable store.
pub trait Repository: UserRepository + PostRepository {}

impl<T: UserRepository + PostRepository> Repository for T {}

/// Row offset of a 1-based page. Saturates instead of overflowing, so a
/// huge page number reads past the end and comes back empty.
pub(crate) fn page_offset(page: i64, limit: i64) -> i64 {
    limit.max(0).saturating_mul(page.max(1) - 1)
}
