use std::sync::Arc;

use classroom_core::model::{
    Annotation, AnnotationDraft, AnnotationError, AnnotationId, AnnotationReply, NewReply,
    SlideId,
};

use crate::error::TrackerError;
use crate::identity::{IdentityPrompt, IdentityService};
use crate::remote::RemoteStore;

/// Highlights and comments pinned to one slide.
pub struct AnnotationBoard {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    slide: SlideId,
    annotations: Vec<Annotation>,
}

impl AnnotationBoard {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, identity: Arc<IdentityService>, slide: SlideId) -> Self {
        Self {
            remote,
            identity,
            slide,
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Public annotations plus those of the reader's class group.
    /// Anything that goes wrong reads as an empty board.
    pub async fn load(&mut self) -> &[Annotation] {
        let class_group = self
            .identity
            .current()
            .await
            .map(|identity| identity.class_group().to_owned())
            .unwrap_or_default();
        self.annotations = match self.remote.slide_annotations(self.slide, &class_group).await {
            Ok(annotations) => annotations,
            Err(err) => {
                tracing::warn!(error = %err, slide = %self.slide, "could not load annotations");
                Vec::new()
            }
        };
        &self.annotations
    }

    /// # Errors
    ///
    /// Draft problems are reported before anyone is prompted; then identity
    /// and remote errors.
    pub async fn add(
        &mut self,
        draft: AnnotationDraft,
        prompt: &dyn IdentityPrompt,
    ) -> Result<Annotation, TrackerError> {
        draft.check()?;
        let identity = self.identity.require(prompt).await?;
        let new = draft.validate(self.slide, &identity)?;
        let created = self.remote.add_annotation(&new).await?;
        self.annotations.push(created.clone());
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns `TrackerError::Remote`.
    pub async fn like(&mut self, id: AnnotationId) -> Result<u64, TrackerError> {
        let likes = self.remote.like_annotation(id).await?;
        if let Some(annotation) = self.find_mut(id) {
            annotation.likes_count = likes;
        }
        Ok(likes)
    }

    /// # Errors
    ///
    /// Returns `AnnotationError::EmptyReply` (wrapped) for blank content,
    /// otherwise identity and remote errors.
    pub async fn reply(
        &mut self,
        id: AnnotationId,
        content: &str,
        prompt: &dyn IdentityPrompt,
    ) -> Result<AnnotationReply, TrackerError> {
        if content.trim().is_empty() {
            return Err(AnnotationError::EmptyReply.into());
        }
        let identity = self.identity.require(prompt).await?;
        let reply = NewReply::new(&identity, content)?;
        let posted = self.remote.reply_annotation(id, &reply).await?;
        if let Some(annotation) = self.find_mut(id) {
            annotation.replies_count += 1;
        }
        Ok(posted)
    }

    fn find_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|annotation| annotation.id == id)
    }
}
