/// Errors that can occur in the storage layer.
///
/// A miss is never an error: lookups return `Ok(None)` for that. These
/// variants are the "store is unreachable or refused the write" cases.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A uniqueness rule was violated (e.g. a taken user name).
    #[error("conflict: {0}")]
    Conflict(String),

    /// A PostgreSQL query failed.
    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A Redis command failed.
    #[cfg(feature = "redis")]
    #[error("cache error: {0}")]
    Cache(#[from] deadpool_redis::redis::RedisError),

    /// No Redis connection could be taken from the pool.
    #[cfg(feature = "redis")]
    #[error("cache pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),
}
