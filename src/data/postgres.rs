//! Postgres-backed repositories.
//!
//! Each repository call is its own unit of work: a transaction is opened,
//! the statements run, and the transaction is committed. Any early return
//! drops the transaction, which rolls it back and hands the connection
//! back to the pool.

use crate::domain::error::DomainError;
use crate::domain::note::{NewNote, Note};
use crate::domain::repository::{NoteRepository, UserRepository};
use crate::domain::user::{NewUser, User};
use crate::infrastructure::config::DatabaseConfig;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::FromRow;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

const ACQUIRE_TIMEOUT_SECS: u64 = 30;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    hashed_password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct NoteRow {
    id: i64,
    title: String,
    content: String,
    user_email: String,
}

impl From<NoteRow> for Note {
    fn from(row: NoteRow) -> Self {
        Note {
            id: row.id,
            title: row.title,
            content: row.content,
            user_email: row.user_email,
        }
    }
}

/// Opens the pool and brings the schema up to date.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool> {
    let start = Instant::now();
    info!(
        max_connections = config.max_connections,
        "Creating database connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(ACQUIRE_TIMEOUT_SECS))
        .connect(&config.url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    info!(
        pool_size = pool.size(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Database ready"
    );
    Ok(pool)
}

#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn classify(err: sqlx::Error) -> anyhow::Error {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return DomainError::Conflict("Email already registered".to_string()).into();
        }
        if db_err.is_foreign_key_violation() {
            warn!(error = %db_err, "Write referenced a user that does not exist");
            return DomainError::Unauthorized("Unknown user".to_string()).into();
        }
    }
    err.into()
}

#[async_trait]
impl UserRepository for PgRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
             RETURNING id, email, hashed_password",
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;

        debug!(user_id = row.id, "User inserted");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl NoteRepository for PgRepository {
    #[instrument(skip(self, note), fields(owner = %note.user_email))]
    async fn create_note(&self, note: NewNote) -> Result<Note> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, NoteRow>(
            "INSERT INTO notes (title, content, user_email) VALUES ($1, $2, $3) \
             RETURNING id, title, content, user_email",
        )
        .bind(&note.title)
        .bind(&note.content)
        .bind(&note.user_email)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;
        tx.commit().await?;

        debug!(note_id = row.id, "Note inserted");
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_notes_by_owner(&self, owner: &str) -> Result<Vec<Note>> {
        let mut tx = self.pool.begin().await?;
        let rows = sqlx::query_as::<_, NoteRow>(
            "SELECT id, title, content, user_email FROM notes WHERE user_email = $1 ORDER BY id",
        )
        .bind(owner)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(rows.into_iter().map(Note::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_note(&self, id: i64, owner: &str) -> Result<Option<Note>> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, NoteRow>(
            "SELECT id, title, content, user_email FROM notes WHERE id = $1 AND user_email = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.map(Note::from))
    }

    #[instrument(skip(self))]
    async fn delete_note(&self, id: i64, owner: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_email = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("Note not found or unauthorized".to_string()).into());
        }
        tx.commit().await?;
        Ok(())
    }
}
