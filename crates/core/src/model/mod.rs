mod annotation;
mod document;
mod identity;
mod ids;
mod interaction;
mod library;
mod note;
mod progress;
mod quiz;
mod reaction;
mod response;
mod result;

pub use annotation::{
    Annotation, AnnotationColor, AnnotationDraft, AnnotationError, AnnotationReply, NewAnnotation,
    NewReply,
};
pub use document::{SaveStatus, Version};
pub use identity::{Identity, IdentityDraft, IdentityError};
pub use ids::{AnnotationId, AnswerId, ArticleId, QuestionId, QuizId, SlideId};
pub use interaction::{Interaction, InteractionKind};
pub use library::{GlossaryTerm, RelatedArticle, TimelineEvent};
pub use note::{CollaborativeNote, Formatting, NoteKey, NoteSaved, NoteUpdate};
pub use progress::{Completion, ProgressAck, ProgressRecord, ProgressUpdate, ScrollPosition};
pub use quiz::{Answer, Question, QuestionKind, Quiz, QuizDataError};
pub use reaction::{ReactionAction, ReactionCounts, ReactionKind, ReactionToggle};
pub use response::{Response, ResponseBook, ResponseError, ResponseValue};
pub use result::{QuestionOutcome, QuizResult, QuizSubmission};
