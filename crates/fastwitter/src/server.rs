//! `FastwitterServer` builder, shared state, and router.
//!
//! This ties the layers together: store → session → HTTP routes.

use std::any::Any;
use std::sync::Arc;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use fastwitter_session::{SessionResolver, SessionStore};
use fastwitter_store::{Cache, Repository};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::lifecycle::session_lifecycle;
use crate::likes::LikeStore;
use crate::{auth, posts, ApiError, FastwitterError};

/// Prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Largest accepted request body.
const MAX_BODY_SIZE: usize = 64 * 1024;

/// Shared server state passed to every handler.
///
/// Wrapped in `Arc` so it can be cheaply cloned into each request.
/// Holds no per-request data: sessions live in the cache and are loaded
/// fresh by the lifecycle middleware.
pub struct ServerState<C, R> {
    pub(crate) repo: Arc<R>,
    pub(crate) sessions: SessionResolver<C, R>,
    pub(crate) likes: LikeStore<C>,
}

impl<C, R> ServerState<C, R>
where
    C: Cache + Clone,
    R: Repository,
{
    pub fn new(cache: C, repo: R) -> Arc<Self> {
        let repo = Arc::new(repo);
        Arc::new(Self {
            sessions: SessionResolver::new(
                SessionStore::new(cache.clone()),
                Arc::clone(&repo),
            ),
            likes: LikeStore::new(cache),
            repo,
        })
    }
}

/// Builds the full application router over `state`.
pub fn router<C, R>(state: Arc<ServerState<C, R>>) -> Router
where
    C: Cache + Clone,
    R: Repository,
{
    let api = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/sign-in", post(auth::sign_in::<C, R>))
        .route("/auth/sign-up", post(auth::sign_up::<C, R>))
        .route("/auth/logout", post(auth::logout))
        .route(
            "/posts",
            get(posts::list::<C, R>).post(posts::create::<C, R>),
        )
        .route(
            "/posts/{id}",
            post(posts::update::<C, R>).delete(posts::delete::<C, R>),
        )
        .route("/posts/{id}/like", get(posts::like::<C, R>));

    // Layers wrap everything added before them: the panic catcher sits
    // inside the session lifecycle so a panicking handler still gets
    // its session written back.
    Router::new()
        .nest(API_PREFIX, api)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            session_lifecycle::<C, R>,
        ))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("handler panicked");
    ApiError::Internal.into_response()
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring and starting a Fastwitter server.
///
/// # Example
///
/// ```rust,no_run
/// use fastwitter::prelude::*;
///
/// # async fn run() -> Result<(), FastwitterError> {
/// let server = FastwitterServer::builder()
///     .bind("127.0.0.1:8010")
///     .build(MemoryCache::new(), MemoryRepository::new())
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct FastwitterServerBuilder {
    bind_addr: String,
}

impl FastwitterServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8010".to_string(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and builds the server over the given stores.
    pub async fn build<C, R>(
        self,
        cache: C,
        repo: R,
    ) -> Result<FastwitterServer, FastwitterError>
    where
        C: Cache + Clone,
        R: Repository,
    {
        let listener = TcpListener::bind(&self.bind_addr).await?;
        let app = router(ServerState::new(cache, repo));
        Ok(FastwitterServer { listener, app })
    }
}

impl Default for FastwitterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Fastwitter server.
///
/// Call [`run()`](Self::run) to start serving requests.
pub struct FastwitterServer {
    listener: TcpListener,
    app: Router,
}

impl FastwitterServer {
    /// Creates a new builder.
    pub fn builder() -> FastwitterServerBuilder {
        FastwitterServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until Ctrl-C, then lets in-flight requests
    /// finish (including their session write-back).
    pub async fn run(self) -> Result<(), FastwitterError> {
        let addr = self.local_addr()?;
        tracing::info!(%addr, "Fastwitter server running");
        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("Fastwitter server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
