//! In-process backends.
//!
//! Both types are cheap to clone: clones share the same underlying map,
//! so a test can keep one handle for inspection and give another to the
//! server.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use fastwitter_protocol::{NewPost, Post, PostId, UpdatePost, User, UserId};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{
    page_offset, Cache, PostRepository, StoreError, UserRecord,
    UserRepository,
};

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// A [`Cache`] backed by a `HashMap`.
///
/// Expiry is lazy: an expired entry is dropped the next time its key is
/// read. Deadlines are `tokio::time::Instant`s, so tests can pause the
/// clock and `advance` past a TTL.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining time-to-live of `key`.
    ///
    /// `None` if the key is missing, expired, or stored without expiry.
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock().await;
        let entry = entries.get(key).filter(|e| !e.is_expired(now))?;
        entry.expires_at.map(|at| at - now)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .await
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn insert(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), Entry { value, expires_at });
    }
}

impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StoreError> {
        self.insert(key, value, None).await;
        Ok(())
    }

    async fn set_ex(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.insert(key, value, Some(ttl)).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemoryRepository
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, UserRecord>,
    posts: BTreeMap<i64, Post>,
    last_user_id: i64,
    last_post_id: i64,
}

/// User and post tables held in memory.
///
/// Ids start at 1, like a `BIGSERIAL` column, so no real user ever
/// gets the anonymous id 0.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes a user. Existing sessions that still reference the id
    /// will fail to hydrate afterwards.
    pub async fn remove_user(&self, id: UserId) -> Option<User> {
        self.tables
            .lock()
            .await
            .users
            .remove(&id.0)
            .map(|record| record.user)
    }
}

impl UserRepository for MemoryRepository {
    async fn create_user(
        &self,
        name: &str,
        pass_hash: &str,
    ) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|r| r.user.name == name) {
            return Err(StoreError::Conflict(format!(
                "user name {name:?} is taken"
            )));
        }

        tables.last_user_id += 1;
        let user = User {
            id: UserId(tables.last_user_id),
            en: Some(true),
            name: name.to_owned(),
            join_date: Some(Utc::now()),
        };
        tables.users.insert(
            user.id.0,
            UserRecord {
                user: user.clone(),
                pass_hash: pass_hash.to_owned(),
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id.0).map(|r| r.user.clone()))
    }

    async fn get_user_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|r| r.user.name == name).cloned())
    }
}

impl PostRepository for MemoryRepository {
    async fn create_post(
        &self,
        author: UserId,
        post: &NewPost,
    ) -> Result<Post, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.last_post_id += 1;
        let post = Post {
            id: PostId(tables.last_post_id),
            title: post.title.clone(),
            body: post.body.clone(),
            created_at: Utc::now(),
            author_id: author,
            likes: Vec::new(),
        };
        tables.posts.insert(post.id.0, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        Ok(self.tables.lock().await.posts.get(&id.0).cloned())
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &UpdatePost,
    ) -> Result<Option<Post>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(post) = tables.posts.get_mut(&id.0) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            post.title.clone_from(title);
        }
        if let Some(body) = &update.body {
            post.body.clone_from(body);
        }
        Ok(Some(post.clone()))
    }

    async fn delete_post(
        &self,
        id: PostId,
    ) -> Result<Option<Post>, StoreError> {
        Ok(self.tables.lock().await.posts.remove(&id.0))
    }

    async fn list_posts(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let offset = usize::try_from(page_offset(page, limit)).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        let tables = self.tables.lock().await;
        Ok(tables
            .posts
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        let count = self.tables.lock().await.posts.len();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }
}
