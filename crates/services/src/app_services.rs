use std::sync::Arc;

use classroom_core::model::{ArticleId, QuizId, SlideId};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::identity::IdentityService;
use crate::notes::CollaborativeNotes;
use crate::persist::PersisterConfig;
use crate::quiz::{QuizEngine, QuizSession};
use crate::remote::{HttpRemoteStore, RemoteConfig, RemoteStore};
use crate::trackers::{AnnotationBoard, InteractionTracker, ProgressMeter, ReactionCounter};

/// Wires the remote store, the identity cache and the per-page components.
#[derive(Clone)]
pub struct AppServices {
    clock: Clock,
    persist: PersisterConfig,
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP API.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization or HTTP client setup fails.
    pub async fn new_sqlite(
        db_url: &str,
        remote: RemoteConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let remote: Arc<dyn RemoteStore> = Arc::new(HttpRemoteStore::new(remote)?);
        Ok(Self::from_parts(storage, remote, clock).await)
    }

    /// Assemble from already-built parts (in-memory storage, fake stores).
    pub async fn from_parts(storage: Storage, remote: Arc<dyn RemoteStore>, clock: Clock) -> Self {
        let identity = Arc::new(IdentityService::load(Arc::clone(&storage.identity)).await);
        Self {
            clock,
            persist: PersisterConfig::default(),
            remote,
            identity,
        }
    }

    #[must_use]
    pub fn with_persister_config(mut self, persist: PersisterConfig) -> Self {
        self.persist = persist;
        self
    }

    #[must_use]
    pub fn persister_config(&self) -> PersisterConfig {
        self.persist
    }

    #[must_use]
    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.remote)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<IdentityService> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn quiz(&self, quiz_id: QuizId) -> QuizEngine {
        QuizEngine::new(self.remote(), self.identity(), quiz_id).with_clock(self.clock)
    }

    #[must_use]
    pub fn quiz_session(&self, quiz_id: QuizId) -> QuizSession {
        QuizSession::new(self.quiz(quiz_id))
    }

    #[must_use]
    pub fn notes(&self, article_id: ArticleId) -> CollaborativeNotes {
        CollaborativeNotes::new(self.remote(), self.identity(), article_id, self.persist.debounce)
    }

    #[must_use]
    pub fn progress(&self, article_id: ArticleId) -> Arc<ProgressMeter> {
        Arc::new(ProgressMeter::new(self.remote(), self.identity(), article_id).with_clock(self.clock))
    }

    #[must_use]
    pub fn interactions(&self, article_id: ArticleId) -> InteractionTracker {
        InteractionTracker::new(
            self.remote(),
            self.identity(),
            article_id,
            self.persist.scroll_debounce,
        )
    }

    #[must_use]
    pub fn reactions(&self, article_id: ArticleId) -> ReactionCounter {
        ReactionCounter::new(self.remote(), article_id)
    }

    #[must_use]
    pub fn annotations(&self, slide: SlideId) -> AnnotationBoard {
        AnnotationBoard::new(self.remote(), self.identity(), slide)
    }
}
