use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use time::{format_description::FormatItem, macros::format_description, OffsetDateTime};

/// RFC 3339 with a fixed-width fraction, so lexicographic ordering of the
/// stored TEXT matches chronological ordering.
const TIMESTAMP_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z");

pub fn timestamp(t: OffsetDateTime) -> anyhow::Result<String> {
    Ok(t.format(TIMESTAMP_FORMAT)?)
}

/// Opens the database file, creating it (and its parent directory) if
/// missing. WAL journaling and foreign-key enforcement are always on.
pub async fn connect(database_path: &str) -> anyhow::Result<SqlitePool> {
    if let Some(dir) = std::path::Path::new(database_path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create data directory {}", dir.display()))?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .context("open database")?;
    Ok(pool)
}

/// Creates the schema if it does not exist yet. Safe to call on every start.
pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            salt TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            slug TEXT UNIQUE NOT NULL,
            excerpt TEXT NOT NULL DEFAULT '',
            content TEXT NOT NULL DEFAULT '',
            cover_image TEXT,
            published INTEGER NOT NULL DEFAULT 0,
            author_id INTEGER NOT NULL REFERENCES users(id),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
        "CREATE INDEX IF NOT EXISTS idx_posts_slug ON posts(slug)",
        "CREATE INDEX IF NOT EXISTS idx_posts_published ON posts(published, created_at)",
    ];

    for sql in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .context("create schema")?;
    }
    Ok(())
}

/// Single-connection in-memory database for tests. A pool with more than one
/// connection would hand each connection its own empty memory database.
#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    init_schema(&pool).await.expect("schema");
    pool
}
