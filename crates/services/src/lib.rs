#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod identity;
pub mod notes;
pub mod persist;
pub mod quiz;
pub mod remote;
pub mod trackers;

pub use classroom_core::Clock;

pub use app_services::AppServices;
pub use error::{
    AppServicesError, IdentityServiceError, PersistError, QuizError, RemoteError, TrackerError,
};
pub use identity::{IdentityPrompt, IdentityService};
pub use notes::{CollaborativeNotes, NoteSink};
pub use persist::{
    DebouncedPersister, DocumentSink, FlushOutcome, NOTE_DEBOUNCE, PROGRESS_FLUSH_INTERVAL,
    PersistState, PersisterConfig, SCROLL_DEBOUNCE,
};
pub use quiz::{
    Countdown, CountdownTick, QuestionInput, QuizEngine, QuizPhase, QuizSession, SubmitConfirm,
    SubmitOutcome, TimerLevel,
};
pub use remote::{HttpRemoteStore, RemoteConfig, RemoteStore};
pub use trackers::{
    AnnotationBoard, InteractionTracker, PeriodicFlush, ProgressMeter, ReactionCounter,
};
