//! SQLite backed token storage

use std::path::Path;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::store::{StoreError, TokenStore};

/// Store keeping slots in the `token_slots` table
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Database access
    db: sqlx::SqlitePool,
}

impl SqliteStore {
    /// Store on top of an existing pool
    ///
    /// Migrations are not executed, see [`SqliteStore::migrate`].
    pub fn new(db: sqlx::SqlitePool) -> Self {
        Self { db }
    }

    /// Store in the in-memory database, with migrations applied
    pub async fn memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true)
            .shared_cache(true);

        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(opts);

        let store = Self { db };
        store.migrate().await?;
        Ok(store)
    }

    /// Store in the database file at `path`, created if missing
    pub async fn open(
        path: &Path,
        max_connections: u32,
        migrate: bool,
    ) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);

        let db = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_lazy_with(opts);

        let store = Self { db };
        if migrate {
            store.migrate().await?;
        }
        Ok(store)
    }

    /// Runs the embedded migrations
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        Ok(())
    }

    /// Accesses the DB pool
    pub fn db(&self) -> &sqlx::SqlitePool {
        &self.db
    }
}

impl TokenStore for SqliteStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("select value from token_slots where key = ?")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|(value,)| value))
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query(
            "insert into token_slots (key, value, updated_at) values (?, ?, ?) \
             on conflict(key) do update set value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("delete from token_slots where key = ?")
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_empty_initially() {
        let store = SqliteStore::memory().await.unwrap();

        let (count,): (i64,) = sqlx::query_as("select count(*) from token_slots")
            .fetch_one(store.db())
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(store.load("jwtToken").await.unwrap(), None);
    }

    #[tokio::test]
    async fn saving_replaces_slot() {
        let store = SqliteStore::memory().await.unwrap();

        store.save("jwtToken", "token1").await.unwrap();
        store.save("jwtToken", "token2").await.unwrap();
        store.save("other", "token3").await.unwrap();

        assert_eq!(
            store.load("jwtToken").await.unwrap().as_deref(),
            Some("token2")
        );

        let (count,): (i64,) = sqlx::query_as("select count(*) from token_slots")
            .fetch_one(store.db())
            .await
            .unwrap();
        assert_eq!(count, 2);

        store.remove("jwtToken").await.unwrap();
        store.remove("jwtToken").await.unwrap();
        assert_eq!(store.load("jwtToken").await.unwrap(), None);
        assert_eq!(store.load("other").await.unwrap().as_deref(), Some("token3"));
    }

    #[tokio::test]
    async fn file_database_survives_reopening() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");

        let store = SqliteStore::open(&path, 1, true).await.unwrap();
        store.save("jwtToken", "token1").await.unwrap();
        store.db().close().await;

        let store = SqliteStore::open(&path, 1, true).await.unwrap();
        assert_eq!(
            store.load("jwtToken").await.unwrap().as_deref(),
            Some("token1")
        );
    }
}
