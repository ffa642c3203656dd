//! Shared per-class notes attached to an article.

use std::ops::Range;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use classroom_core::model::{
    ArticleId, CollaborativeNote, Formatting, NoteKey, NoteUpdate, SaveStatus, Version,
};

use crate::error::PersistError;
use crate::identity::{IdentityPrompt, IdentityService};
use crate::persist::{DebouncedPersister, DocumentSink, FlushOutcome, PersistState};
use crate::remote::RemoteStore;

/// Writes the full note text for the current identity's class group.
///
/// With a prompt attached, the first write by an anonymous reader asks who
/// they are; without one it fails with `PersistError::MissingIdentity`.
pub struct NoteSink {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    article_id: ArticleId,
    prompt: Option<Arc<dyn IdentityPrompt>>,
    contributors: Mutex<Vec<String>>,
}

impl NoteSink {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        identity: Arc<IdentityService>,
        article_id: ArticleId,
    ) -> Self {
        Self {
            remote,
            identity,
            article_id,
            prompt: None,
            contributors: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn IdentityPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    #[must_use]
    pub fn contributors(&self) -> Vec<String> {
        self.contributors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_contributors(&self, contributors: Vec<String>) {
        *self
            .contributors
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = contributors;
    }
}

#[async_trait]
impl DocumentSink for NoteSink {
    type Content = String;

    async fn persist(&self, content: &String) -> Result<Version, PersistError> {
        let identity = match &self.prompt {
            Some(prompt) => self.identity.require(prompt.as_ref()).await?,
            None => self
                .identity
                .current()
                .await
                .ok_or(PersistError::MissingIdentity)?,
        };
        let key = NoteKey::new(self.article_id.clone(), identity.class_group());
        let saved = self
            .remote
            .update_note(&NoteUpdate::new(&key, &identity, content.as_str()))
            .await?;
        self.set_contributors(saved.contributors);
        Ok(saved.version)
    }
}

/// Editor state for one article's class note.
pub struct CollaborativeNotes {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    article_id: ArticleId,
    debounce: Duration,
    persister: DebouncedPersister<NoteSink>,
    is_locked: bool,
}

impl CollaborativeNotes {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        identity: Arc<IdentityService>,
        article_id: ArticleId,
        debounce: Duration,
    ) -> Self {
        let sink = NoteSink::new(Arc::clone(&remote), Arc::clone(&identity), article_id.clone());
        Self {
            remote,
            identity,
            article_id,
            debounce,
            persister: DebouncedPersister::new(sink, String::new(), Version::default(), debounce),
            is_locked: false,
        }
    }

    /// Ask `prompt` for an identity the first time an anonymous reader saves.
    /// Starts from an empty note, so attach it before [`CollaborativeNotes::load`].
    #[must_use]
    pub fn with_prompt(mut self, prompt: Arc<dyn IdentityPrompt>) -> Self {
        let sink = NoteSink::new(
            Arc::clone(&self.remote),
            Arc::clone(&self.identity),
            self.article_id.clone(),
        )
        .with_prompt(prompt);
        self.persister = DebouncedPersister::new(sink, String::new(), Version::default(), self.debounce);
        self
    }

    /// Fetch the class group's note and start from it as saved state.
    ///
    /// Returns `false` when no stored note was read: the reader is anonymous
    /// (there is no class group to read) or the store could not be reached.
    /// Either way the editor starts empty at version 0.
    pub async fn load(&mut self) -> bool {
        let Some(identity) = self.identity.current().await else {
            tracing::debug!(article_id = %self.article_id, "no identity; note not loaded");
            return false;
        };
        let key = NoteKey::new(self.article_id.clone(), identity.class_group());
        match self.remote.fetch_note(&key).await {
            Ok(CollaborativeNote {
                content,
                version,
                contributors,
                is_locked,
                ..
            }) => {
                self.persister.sink().set_contributors(contributors);
                self.persister.reset(content, version);
                self.is_locked = is_locked;
                tracing::debug!(article_id = %self.article_id, %version, "note loaded");
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, article_id = %self.article_id, "could not load note; starting empty");
                self.persister.sink().set_contributors(Vec::new());
                self.persister.reset(String::new(), Version::default());
                self.is_locked = false;
                false
            }
        }
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.persister.has_unsaved_changes()
    }

    pub fn edit(&self, content: impl Into<String>) {
        self.persister.edit(content.into());
    }

    /// Wrap `selection` in markdown and treat the result as an edit.
    ///
    /// Returns `false` and leaves the note unchanged when the range is invalid.
    pub fn apply_formatting(&self, formatting: Formatting, selection: Range<usize>) -> bool {
        match formatting.apply(&self.persister.content(), selection) {
            Some(text) => {
                self.persister.edit(text);
                true
            }
            None => false,
        }
    }

    pub async fn save_now(&self) -> FlushOutcome {
        self.persister.save_now().await
    }

    pub async fn close(self) -> FlushOutcome {
        self.persister.close().await
    }

    #[must_use]
    pub fn content(&self) -> String {
        self.persister.content()
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.persister.version()
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.persister.status()
    }

    #[must_use]
    pub fn contributors(&self) -> Vec<String> {
        self.persister.sink().contributors()
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PersistState> {
        self.persister.subscribe()
    }
}
