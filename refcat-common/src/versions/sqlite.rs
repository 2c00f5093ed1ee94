//! SQLite version store

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

use super::{VersionStore, UNKNOWN_VERSION};
use crate::Result;

/// Version store backed by a `collection_versions` table
#[derive(Clone)]
pub struct SqliteVersionStore {
    pool: SqlitePool,
}

impl SqliteVersionStore {
    /// Open (creating if needed) the database file and its table
    pub async fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // mode=rwc: read, write, create
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        tracing::debug!("Connecting to version database: {}", db_url);

        let pool = SqlitePool::connect(&db_url).await?;
        Self::from_pool(pool).await
    }

    /// Private in-memory database (one connection, so every query sees the same data)
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::from_pool(pool).await
    }

    /// Use an existing pool, creating the table if it doesn't exist
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS collection_versions (
                key TEXT PRIMARY KEY,
                version TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl VersionStore for SqliteVersionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT version FROM collection_versions WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(version,)| version))
    }

    async fn set(&self, key: &str, token: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO collection_versions (key, version, updated_at)
             VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET
                 version = excluded.version,
                 updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn compare_and_swap(&self, key: &str, expected: &str, new: &str) -> Result<bool> {
        // A missing row only matches when the caller expects UNKNOWN_VERSION
        let result = if expected == UNKNOWN_VERSION {
            sqlx::query(
                "INSERT INTO collection_versions (key, version, updated_at)
                 VALUES (?, ?, CURRENT_TIMESTAMP)
                 ON CONFLICT(key) DO UPDATE SET
                     version = excluded.version,
                     updated_at = excluded.updated_at
                 WHERE collection_versions.version = ?",
            )
            .bind(key)
            .bind(new)
            .bind(expected)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE collection_versions
                 SET version = ?, updated_at = CURRENT_TIMESTAMP
                 WHERE key = ? AND version = ?",
            )
            .bind(new)
            .bind(key)
            .bind(expected)
            .execute(&self.pool)
            .await?
        };

        Ok(result.rows_affected() == 1)
    }
}
