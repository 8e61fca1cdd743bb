use fastwitter::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), FastwitterError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;

    let repo = PgRepository::connect(
        &settings.database.url,
        settings.database.max_connections,
    )
    .await?;
    let cache = RedisCache::connect(
        &settings.redis.url,
        settings.redis.max_connections,
    )?;
    if let Err(e) = cache.ping().await {
        tracing::warn!(error = %e, "Redis not reachable yet");
    }

    let server = FastwitterServer::builder()
        .bind(&settings.server.bind)
        .build(cache.clone(), repo.clone())
        .await?;
    let result = server.run().await;

    cache.close();
    repo.close().await;
    result
}
