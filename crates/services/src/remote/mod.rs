//! Contract for the backend JSON API. Implementations own no domain state.

mod http;

use async_trait::async_trait;

use classroom_core::model::{
    Annotation, AnnotationId, AnnotationReply, ArticleId, CollaborativeNote, GlossaryTerm,
    Identity, Interaction, NewAnnotation, NewReply, NoteKey, NoteSaved, NoteUpdate, ProgressAck,
    ProgressRecord, ProgressUpdate, Quiz, QuizId, QuizResult, QuizSubmission, ReactionCounts,
    ReactionKind, ReactionToggle, SlideId, TimelineEvent,
};

use crate::error::RemoteError;

pub use http::{HttpRemoteStore, RemoteConfig};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// `GET api/quiz/{id}/`
    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, RemoteError>;

    /// `POST api/quiz/{id}/submit/`; grading happens on the server.
    async fn submit_quiz(
        &self,
        id: QuizId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, RemoteError>;

    async fn fetch_note(&self, key: &NoteKey) -> Result<CollaborativeNote, RemoteError>;

    /// Overwrites the whole note; the store assigns the next version.
    async fn update_note(&self, update: &NoteUpdate) -> Result<NoteSaved, RemoteError>;

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<ProgressAck, RemoteError>;

    async fn fetch_progress(&self, identity: &Identity)
    -> Result<Vec<ProgressRecord>, RemoteError>;

    async fn add_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation, RemoteError>;

    /// Public annotations plus those of `class_group`.
    async fn slide_annotations(
        &self,
        slide: SlideId,
        class_group: &str,
    ) -> Result<Vec<Annotation>, RemoteError>;

    /// Returns the new like count.
    async fn like_annotation(&self, id: AnnotationId) -> Result<u64, RemoteError>;

    async fn reply_annotation(
        &self,
        id: AnnotationId,
        reply: &NewReply,
    ) -> Result<AnnotationReply, RemoteError>;

    async fn reactions(&self, article: &ArticleId) -> Result<ReactionCounts, RemoteError>;

    async fn toggle_reaction(
        &self,
        article: &ArticleId,
        kind: ReactionKind,
    ) -> Result<ReactionToggle, RemoteError>;

    /// Fire-and-forget analytics event.
    async fn track_interaction(&self, interaction: &Interaction) -> Result<(), RemoteError>;

    async fn glossary_terms(&self) -> Result<Vec<GlossaryTerm>, RemoteError>;

    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>, RemoteError>;
}
