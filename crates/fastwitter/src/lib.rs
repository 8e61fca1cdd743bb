//! # Fastwitter
//!
//! REST backend for posts and user accounts.
//!
//! Every request runs inside a session lifecycle: the session is resolved
//! from the `sid` cookie, the `X-SID` header or the `sid` query parameter
//! (in that order) before the handler runs, and written back to the cache
//! after it, whatever the handler returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fastwitter::prelude::*;
//!
//! # async fn run() -> Result<(), FastwitterError> {
//! let settings = Settings::load()?;
//! let repo = PgRepository::connect(
//!     &settings.database.url,
//!     settings.database.max_connections,
//! )
//! .await?;
//! let cache = RedisCache::connect(
//!     &settings.redis.url,
//!     settings.redis.max_connections,
//! )?;
//! let server = FastwitterServer::builder()
//!     .bind(&settings.server.bind)
//!     .build(cache, repo)
//!     .await?;
//! server.run().await
//! # }
//! ```

mod auth;
mod error;
mod extract;
mod lifecycle;
mod likes;
mod password;
mod posts;
mod server;
mod settings;

pub use error::{ApiError, FastwitterError};
pub use extract::{PostIdPath, ValidJson, ValidQuery};
pub use lifecycle::{session_lifecycle, AuthenticatedUser, SessionHandle};
pub use likes::LikeStore;
pub use password::{
    hash_password, hash_password_blocking, verify_password,
    verify_password_blocking,
};
pub use posts::{PageParams, MAX_PAGE_SIZE};
pub use server::{
    router, FastwitterServer, FastwitterServerBuilder, ServerState,
    API_PREFIX,
};
pub use settings::{
    DatabaseSettings, RedisSettings, ServerSettings, Settings,
    CONFIG_PATH_VAR,
};

/// Everything needed to run a server, in one import.
pub mod prelude {
    pub use crate::{
        router, ApiError, FastwitterError, FastwitterServer, ServerState,
        SessionHandle, Settings,
    };
    pub use fastwitter_protocol::{Post, PostId, User, UserId};
    pub use fastwitter_session::{Session, SessionKind};
    pub use fastwitter_store::{
        Cache, MemoryCache, MemoryRepository, PgRepository, PostRepository,
        RedisCache, Repository, UserRepository,
    };
}
