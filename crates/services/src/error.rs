//! Shared error types for the services crate.

use thiserror::Error;

use classroom_core::model::{AnnotationError, IdentityError, QuizDataError, ResponseError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Failures talking to the backend API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("invalid endpoint url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `IdentityService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityServiceError {
    #[error("identity prompt was dismissed")]
    Declined,
    #[error(transparent)]
    Invalid(#[from] IdentityError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the quiz engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz is not loaded")]
    NotLoaded,
    #[error("quiz has already been started")]
    AlreadyStarted,
    #[error("quiz is not in progress")]
    NotInProgress,
    #[error("already at the first question")]
    AtFirstQuestion,
    #[error("already at the last question")]
    AtLastQuestion,
    #[error("submit is only available from the last question")]
    NotAtLastQuestion,
    #[error("countdown has not run out")]
    TimeRemaining,
    #[error(transparent)]
    Identity(#[from] IdentityServiceError),
    #[error(transparent)]
    Data(#[from] QuizDataError),
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl From<IdentityError> for QuizError {
    fn from(err: IdentityError) -> Self {
        QuizError::Identity(IdentityServiceError::Invalid(err))
    }
}

/// Errors from a single flush of a persisted document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistError {
    #[error("no identity available to save under")]
    MissingIdentity,
    #[error(transparent)]
    Identity(#[from] IdentityServiceError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted by the minor trackers (reactions, annotations, progress).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackerError {
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Identity(#[from] IdentityServiceError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}
