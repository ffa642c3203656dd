use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use classroom_core::model::{Identity, IdentityDraft};
use storage::repository::IdentityRepository;

use crate::error::IdentityServiceError;

/// Asks the user who they are; `None` means the prompt was dismissed.
#[async_trait]
pub trait IdentityPrompt: Send + Sync {
    async fn ask(&self) -> Option<IdentityDraft>;
}

/// Process-wide identity shared by the quiz engine and all trackers.
///
/// Read paths never prompt; only writes go through [`IdentityService::require`].
pub struct IdentityService {
    repo: Arc<dyn IdentityRepository>,
    cached: RwLock<Option<Identity>>,
}

impl IdentityService {
    /// Build the service and warm the cache from the local store.
    ///
    /// A store that cannot be read starts the session anonymous.
    pub async fn load(repo: Arc<dyn IdentityRepository>) -> Self {
        let cached = match repo.get_identity().await {
            Ok(identity) => identity,
            Err(err) => {
                tracing::warn!(error = %err, "could not read cached identity");
                None
            }
        };
        Self {
            repo,
            cached: RwLock::new(cached),
        }
    }

    pub async fn current(&self) -> Option<Identity> {
        self.cached.read().await.clone()
    }

    /// Validate and persist a new identity, replacing the cached one.
    ///
    /// # Errors
    ///
    /// Returns `IdentityServiceError::Invalid` for blank fields (nothing is
    /// stored) or `IdentityServiceError::Storage` if it cannot be persisted.
    pub async fn remember(&self, draft: IdentityDraft) -> Result<Identity, IdentityServiceError> {
        let identity = draft.validate()?;
        self.repo.save_identity(&identity).await?;
        *self.cached.write().await = Some(identity.clone());
        tracing::info!(class_group = identity.class_group(), "identity saved");
        Ok(identity)
    }

    /// Return the cached identity, prompting once if there is none.
    ///
    /// # Errors
    ///
    /// Returns `IdentityServiceError::Declined` when the prompt is dismissed,
    /// otherwise the errors of [`IdentityService::remember`].
    pub async fn require(
        &self,
        prompt: &dyn IdentityPrompt,
    ) -> Result<Identity, IdentityServiceError> {
        if let Some(identity) = self.current().await {
            return Ok(identity);
        }
        let draft = prompt.ask().await.ok_or(IdentityServiceError::Declined)?;
        self.remember(draft).await
    }

    /// # Errors
    ///
    /// Returns `IdentityServiceError::Storage` if the local store cannot be written.
    pub async fn forget(&self) -> Result<(), IdentityServiceError> {
        self.repo.clear_identity().await?;
        *self.cached.write().await = None;
        Ok(())
    }
}
