//! Integration tests for the in-memory backends.
//!
//! The session layer and the HTTP tests both run on these backends, so
//! they have to honour the same contract as Redis and PostgreSQL: TTLs
//! that expire, overwrites that reset them, misses that are `Ok(None)`.

use std::time::Duration;

use fastwitter_protocol::{NewPost, PostId, UpdatePost, UserId};
use fastwitter_store::{
    Cache, MemoryCache, MemoryRepository, PostRepository, StoreError,
    UserRepository,
};

fn new_post(title: &str) -> NewPost {
    NewPost {
        title: title.into(),
        body: format!("{title} body"),
    }
}

// =========================================================================
// MemoryCache
// =========================================================================

#[tokio::test]
async fn test_cache_set_then_get_returns_value() {
    let cache = MemoryCache::new();
    cache.set("k", b"v".to_vec()).await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), Some(b"v".to_vec()));
}

#[tokio::test]
async fn test_cache_get_missing_key_returns_none() {
    let cache = MemoryCache::new();
    assert_eq!(cache.get("nope").await.unwrap(), None);
}

#[tokio::test]
async fn test_cache_delete_removes_key() {
    let cache = MemoryCache::new();
    cache.set("k", b"v".to_vec()).await.unwrap();
    cache.delete("k").await.unwrap();
    assert_eq!(cache.get("k").await.unwrap(), None);

    // Deleting again is fine.
    cache.delete("k").await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_cache_set_ex_expires_after_ttl() {
    let cache = MemoryCache::new();
    cache
        .set_ex("k", b"v".to_vec(), Duration::from_secs(10))
        .await
        .unwrap();

    tokio::time::advance(Duration::from_secs(9)).await;
    assert!(cache.get("k").await.unwrap().is_some());

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("k").await.unwrap(), None);
    assert!(cache.is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_cache_set_ex_overwrite_resets_ttl() {
    let cache = MemoryCache::new();
    let ttl = Duration::from_secs(10);
    cache.set_ex("k", b"a".to_vec(), ttl).await.unwrap();

    tokio::time::advance(Duration::from_secs(8)).await;
    cache.set_ex("k", b"b".to_vec(), ttl).await.unwrap();

    tokio::time::advance(Duration::from_secs(8)).await;
    assert_eq!(cache.get("k").await.unwrap(), Some(b"b".to_vec()));
    assert_eq!(cache.ttl("k").await, Some(Duration::from_secs(2)));
}

#[tokio::test]
async fn test_cache_set_without_ttl_has_no_expiry() {
    let cache = MemoryCache::new();
    cache.set("k", b"v".to_vec()).await.unwrap();
    assert_eq!(cache.ttl("k").await, None);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_cache_clones_share_entries() {
    let cache = MemoryCache::new();
    let other = cache.clone();
    cache.set("k", b"v".to_vec()).await.unwrap();
    assert_eq!(other.get("k").await.unwrap(), Some(b"v".to_vec()));
}

// =========================================================================
// MemoryRepository: users
// =========================================================================

#[tokio::test]
async fn test_create_user_assigns_non_zero_ids() {
    let repo = MemoryRepository::new();
    let alice = repo.create_user("alice", "hash-a").await.unwrap();
    let bob = repo.create_user("bobby", "hash-b").await.unwrap();

    assert_eq!(alice.id, UserId(1));
    assert_eq!(bob.id, UserId(2));
    assert!(alice.is_authenticated());
    assert_eq!(alice.en, Some(true));
    assert!(alice.join_date.is_some());
}

#[tokio::test]
async fn test_create_user_duplicate_name_returns_conflict() {
    let repo = MemoryRepository::new();
    repo.create_user("alice", "h").await.unwrap();

    let result = repo.create_user("alice", "h2").await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn test_get_user_by_name_returns_hash() {
    let repo = MemoryRepository::new();
    let alice = repo.create_user("alice", "hash-a").await.unwrap();

    let record = repo.get_user_by_name("alice").await.unwrap().unwrap();
    assert_eq!(record.user, alice);
    assert_eq!(record.pass_hash, "hash-a");

    assert!(repo.get_user_by_name("carol").await.unwrap().is_none());
}

#[tokio::test]
async fn test_remove_user_then_get_user_returns_none() {
    let repo = MemoryRepository::new();
    let alice = repo.create_user("alice", "h").await.unwrap();

    assert!(repo.remove_user(alice.id).await.is_some());
    assert!(repo.get_user(alice.id).await.unwrap().is_none());
}

// =========================================================================
// MemoryRepository: posts
// =========================================================================

#[tokio::test]
async fn test_create_and_get_post() {
    let repo = MemoryRepository::new();
    let post = repo.create_post(UserId(3), &new_post("hi")).await.unwrap();

    assert_eq!(post.author_id, UserId(3));
    assert!(post.likes.is_empty());
    assert_eq!(repo.get_post(post.id).await.unwrap(), Some(post));
    assert!(repo.get_post(PostId(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_post_changes_only_present_fields() {
    let repo = MemoryRepository::new();
    let post = repo.create_post(UserId(1), &new_post("old")).await.unwrap();

    let update = UpdatePost {
        title: Some("new".into()),
        body: None,
    };
    let updated = repo.update_post(post.id, &update).await.unwrap().unwrap();

    assert_eq!(updated.title, "new");
    assert_eq!(updated.body, "old body");
}

#[tokio::test]
async fn test_update_post_missing_returns_none() {
    let repo = MemoryRepository::new();
    let result = repo.update_post(PostId(1), &UpdatePost::default()).await;
    assert!(result.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_post_returns_removed_row() {
    let repo = MemoryRepository::new();
    let post = repo.create_post(UserId(1), &new_post("x")).await.unwrap();

    assert_eq!(repo.delete_post(post.id).await.unwrap(), Some(post.clone()));
    assert!(repo.delete_post(post.id).await.unwrap().is_none());
    assert_eq!(repo.count_posts().await.unwrap(), 0);
}

#[tokio::test]
async fn test_list_posts_paginates_by_id() {
    let repo = MemoryRepository::new();
    for i in 0..5 {
        repo.create_post(UserId(1), &new_post(&format!("p{i}")))
            .await
            .unwrap();
    }

    let first = repo.list_posts(1, 2).await.unwrap();
    let third = repo.list_posts(3, 2).await.unwrap();
    let beyond = repo.list_posts(4, 2).await.unwrap();

    let titles: Vec<_> = first.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, ["p0", "p1"]);
    assert_eq!(third.len(), 1);
    assert_eq!(third[0].title, "p4");
    assert!(beyond.is_empty());
    assert_eq!(repo.count_posts().await.unwrap(), 5);
}

#[tokio::test]
async fn test_list_posts_huge_page_returns_empty() {
    let repo = MemoryRepository::new();
    repo.create_post(UserId(1), &new_post("only")).await.unwrap();

    assert!(repo.list_posts(i64::MAX, 20).await.unwrap().is_empty());
}
