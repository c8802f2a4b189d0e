use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use nf_core::{ArticleStore, Error, NoteStore, Result, UserStore};
use tracing::info;

pub mod backends;

pub use backends::*;

#[async_trait]
pub trait StorageBackend: ArticleStore + NoteStore + UserStore + Sized + 'static {
    fn get_error_message() -> &'static str;
    async fn new(config: &StorageConfig) -> Result<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    SQLite,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            "sqlite" => Ok(StorageKind::SQLite),
            other => Err(Error::Storage(format!("Unknown storage backend: {}", other))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
            StorageKind::SQLite => f.write_str("sqlite"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            path: PathBuf::from("newsflash.db"),
        }
    }
}

/// One backend seen through each of the store traits.
#[derive(Clone)]
pub struct Storage {
    pub articles: Arc<dyn ArticleStore>,
    pub notes: Arc<dyn NoteStore>,
    pub users: Arc<dyn UserStore>,
}

impl Storage {
    pub fn from_backend<T: StorageBackend>(backend: T) -> Self {
        Self::from_shared(Arc::new(backend))
    }

    pub fn from_shared<T: StorageBackend>(backend: Arc<T>) -> Self {
        Self {
            articles: backend.clone(),
            notes: backend.clone(),
            users: backend,
        }
    }
}

async fn open<T: StorageBackend>(config: &StorageConfig) -> Result<Storage> {
    let backend = T::new(config)
        .await
        .map_err(|e| Error::Storage(format!("{} ({})", T::get_error_message(), e)))?;
    Ok(Storage::from_backend(backend))
}

pub async fn create_storage(config: &StorageConfig) -> Result<Storage> {
    info!(backend = %config.kind, "🏦 Opening storage");
    match config.kind {
        StorageKind::Memory => open::<MemoryStorage>(config).await,
        #[cfg(feature = "sqlite")]
        StorageKind::SQLite => open::<SQLiteStorage>(config).await,
        #[cfg(not(feature = "sqlite"))]
        StorageKind::SQLite => Err(Error::Storage(
            "SQLite support is not compiled in; rebuild with the `sqlite` feature".to_string(),
        )),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{create_storage, Storage, StorageBackend, StorageConfig, StorageKind};
}
