use async_trait::async_trait;
use classroom_core::model::Identity;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Device-local cache of who is using this client.
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Load the cached identity, if one was ever saved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or holds invalid data.
    async fn get_identity(&self) -> Result<Option<Identity>, StorageError>;

    /// Replace the cached identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the identity cannot be stored.
    async fn save_identity(&self, identity: &Identity) -> Result<(), StorageError>;

    /// Forget the cached identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be written.
    async fn clear_identity(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    identity: Arc<Mutex<Option<Identity>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityRepository for InMemoryRepository {
    async fn get_identity(&self) -> Result<Option<Identity>, StorageError> {
        let guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn save_identity(&self, identity: &Identity) -> Result<(), StorageError> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(identity.clone());
        Ok(())
    }

    async fn clear_identity(&self) -> Result<(), StorageError> {
        let mut guard = self
            .identity
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub identity: Arc<dyn IdentityRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let identity: Arc<dyn IdentityRepository> = Arc::new(InMemoryRepository::new());
        Self { identity }
    }
}
