//! Post like-sets, kept in the cache under `post_{id}`.
//!
//! The blob is `{"likes": [user ids]}` with no expiry. Updates are
//! read-modify-write without a lock; two concurrent toggles on one post
//! are last-write-wins.

use fastwitter_protocol::{Codec, JsonCodec, PostId, UserId};
use fastwitter_store::Cache;
use serde::{Deserialize, Serialize};

use crate::FastwitterError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LikeSet {
    #[serde(default)]
    likes: Vec<UserId>,
}

fn cache_key(post: PostId) -> String {
    format!("post_{}", post.0)
}

/// Reads and writes like-sets.
#[derive(Debug, Clone)]
pub struct LikeStore<C> {
    cache: C,
    codec: JsonCodec,
}

impl<C: Cache> LikeStore<C> {
    pub fn new(cache: C) -> Self {
        Self {
            cache,
            codec: JsonCodec,
        }
    }

    /// Stores an empty like-set for a new post.
    pub async fn init(&self, post: PostId) -> Result<(), FastwitterError> {
        self.store(post, &LikeSet::default()).await
    }

    /// The users who like `post`. A missing or unreadable blob is an
    /// empty set.
    pub async fn load(
        &self,
        post: PostId,
    ) -> Result<Vec<UserId>, FastwitterError> {
        let Some(bytes) = self.cache.get(&cache_key(post)).await? else {
            return Ok(Vec::new());
        };
        match self.codec.decode::<LikeSet>(&bytes) {
            Ok(set) => Ok(set.likes),
            Err(e) => {
                tracing::warn!(%post, error = %e, "discarding undecodable like-set");
                Ok(Vec::new())
            }
        }
    }

    /// Adds `user` to the like-set of `post`, or removes it if present.
    /// Returns the new set.
    pub async fn toggle(
        &self,
        post: PostId,
        user: UserId,
    ) -> Result<Vec<UserId>, FastwitterError> {
        let mut likes = self.load(post).await?;
        if let Some(pos) = likes.iter().position(|id| *id == user) {
            likes.remove(pos);
        } else {
            likes.push(user);
        }
        let set = LikeSet { likes };
        self.store(post, &set).await?;
        Ok(set.likes)
    }

    pub async fn clear(&self, post: PostId) -> Result<(), FastwitterError> {
        self.cache.delete(&cache_key(post)).await?;
        Ok(())
    }

    async fn store(
        &self,
        post: PostId,
        set: &LikeSet,
    ) -> Result<(), FastwitterError> {
        let bytes = self.codec.encode(set)?;
        self.cache.set(&cache_key(post), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fastwitter_store::MemoryCache;

    use super::*;

    #[tokio::test]
    async fn test_init_stores_empty_like_set() {
        let cache = MemoryCache::new();
        let likes = LikeStore::new(cache.clone());
        likes.init(PostId(1)).await.unwrap();

        let raw = cache.get("post_1").await.unwrap().unwrap();
        assert_eq!(raw, br#"{"likes":[]}"#);
    }

    #[tokio::test]
    async fn test_toggle_twice_adds_then_removes() {
        let likes = LikeStore::new(MemoryCache::new());
        likes.init(PostId(1)).await.unwrap();

        assert_eq!(
            likes.toggle(PostId(1), UserId(5)).await.unwrap(),
            [UserId(5)]
        );
        assert!(likes.toggle(PostId(1), UserId(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_keeps_other_users() {
        let likes = LikeStore::new(MemoryCache::new());
        likes.toggle(PostId(1), UserId(1)).await.unwrap();
        likes.toggle(PostId(1), UserId(2)).await.unwrap();

        assert_eq!(
            likes.toggle(PostId(1), UserId(1)).await.unwrap(),
            [UserId(2)]
        );
    }

    #[tokio::test]
    async fn test_load_missing_or_garbage_is_empty() {
        let cache = MemoryCache::new();
        let likes = LikeStore::new(cache.clone());
        assert!(likes.load(PostId(1)).await.unwrap().is_empty());

        cache.set("post_2", b"nope".to_vec()).await.unwrap();
        assert!(likes.load(PostId(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_removes_like_set() {
        let cache = MemoryCache::new();
        let likes = LikeStore::new(cache.clone());
        likes.init(PostId(1)).await.unwrap();
        likes.clear(PostId(1)).await.unwrap();

        assert!(cache.get("post_1").await.unwrap().is_none());
    }
}
