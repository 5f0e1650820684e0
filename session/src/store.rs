//! Durable token storage
//!
//! A store is a tiny key-value slot surviving process restarts. The session manager is the only
//! writer, and it only ever keeps the bearer token there.

use std::future::Future;

use thiserror::Error;

mod file;
mod memory;
mod sqlite;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Token storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Token database failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Token database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Invalid storage key {0:?}")]
    InvalidKey(String),
}

/// Persistence slot for string values
pub trait TokenStore: Send + Sync {
    /// Reads value stored under `key`, `None` if nothing is stored
    fn load(&self, key: &str) -> impl Future<Output = Result<Option<String>, StoreError>> + Send;

    /// Stores `value` under `key`, replacing previous one
    fn save(&self, key: &str, value: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes value under `key`. Removing missing value is not an error.
    fn remove(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Store selected at runtime
#[derive(Debug, Clone)]
pub enum Store {
    Memory(MemoryStore),
    File(FileStore),
    Sqlite(SqliteStore),
}

impl TokenStore for Store {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            Self::Memory(store) => store.load(key).await,
            Self::File(store) => store.load(key).await,
            Self::Sqlite(store) => store.load(key).await,
        }
    }

    async fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(key, value).await,
            Self::File(store) => store.save(key, value).await,
            Self::Sqlite(store) => store.save(key, value).await,
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.remove(key).await,
            Self::File(store) => store.remove(key).await,
            Self::Sqlite(store) => store.remove(key).await,
        }
    }
}

impl From<MemoryStore> for Store {
    fn from(store: MemoryStore) -> Self {
        Self::Memory(store)
    }
}

impl From<FileStore> for Store {
    fn from(store: FileStore) -> Self {
        Self::File(store)
    }
}

impl From<SqliteStore> for Store {
    fn from(store: SqliteStore) -> Self {
        Self::Sqlite(store)
    }
}
