//! PostgreSQL repository implementation using `sqlx`.

use chrono::{DateTime, Utc};
use fastwitter_protocol::{NewPost, Post, PostId, UpdatePost, User, UserId};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::{
    page_offset, PostRepository, StoreError, UserRecord, UserRepository,
};

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, name, en, join_date, pass_hash";
const POST_COLUMNS: &str = "id, title, body, created_at, author_id";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    en: Option<bool>,
    join_date: Option<DateTime<Utc>>,
    pass_hash: String,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            user: User {
                id: UserId(self.id),
                en: self.en,
                name: self.name,
                join_date: self.join_date,
            },
            pass_hash: self.pass_hash,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    author_id: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: PostId(row.id),
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            author_id: UserId(row.author_id),
            likes: Vec::new(),
        }
    }
}

/// User and post tables in PostgreSQL.
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    /// Connects a pool of at most `max_connections` and creates the
    /// tables if they do not exist yet.
    pub async fn connect(
        url: &str,
        max_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let repo = Self { pool };
        repo.init_schema().await?;
        tracing::info!(max_connections, "PostgreSQL pool connected");
        Ok(repo)
    }

    /// Wraps an existing pool without touching the schema.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                pass_hash TEXT NOT NULL,
                en BOOLEAN DEFAULT TRUE,
                join_date TIMESTAMPTZ DEFAULT now()
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id BIGSERIAL PRIMARY KEY,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                author_id BIGINT NOT NULL REFERENCES users (id)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("PostgreSQL pool closed");
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .is_some_and(|code| code == UNIQUE_VIOLATION)
}

impl UserRepository for PgRepository {
    async fn create_user(
        &self,
        name: &str,
        pass_hash: &str,
    ) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (name, pass_hash) VALUES ($1, $2) \
             RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(name)
            .bind(pass_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!(
                        "user name {name:?} is taken"
                    ))
                } else {
                    StoreError::Database(e)
                }
            })?;
        Ok(row.into_record().user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.into_record().user))
    }

    async fn get_user_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UserRecord>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE name = $1");
        let row: Option<UserRow> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(UserRow::into_record))
    }
}

impl PostRepository for PgRepository {
    async fn create_post(
        &self,
        author: UserId,
        post: &NewPost,
    ) -> Result<Post, StoreError> {
        let sql = format!(
            "INSERT INTO posts (author_id, title, body) VALUES ($1, $2, $3) \
             RETURNING {POST_COLUMNS}"
        );
        let row: PostRow = sqlx::query_as(&sql)
            .bind(author.0)
            .bind(&post.title)
            .bind(&post.body)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, StoreError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &UpdatePost,
    ) -> Result<Option<Post>, StoreError> {
        // COALESCE keeps the stored value for every absent field.
        let sql = format!(
            "UPDATE posts SET title = COALESCE($2, title), \
             body = COALESCE($3, body) WHERE id = $1 \
             RETURNING {POST_COLUMNS}"
        );
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .bind(update.title.as_deref())
            .bind(update.body.as_deref())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn delete_post(
        &self,
        id: PostId,
    ) -> Result<Option<Post>, StoreError> {
        let sql =
            format!("DELETE FROM posts WHERE id = $1 RETURNING {POST_COLUMNS}");
        let row: Option<PostRow> = sqlx::query_as(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list_posts(
        &self,
        page: i64,
        limit: i64,
    ) -> Result<Vec<Post>, StoreError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts ORDER BY id LIMIT $1 OFFSET $2"
        );
        let rows: Vec<PostRow> = sqlx::query_as(&sql)
            .bind(limit)
            .bind(page_offset(page, limit))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn count_posts(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
