//! Taking a quiz: navigation, response capture, countdown and submission.

mod countdown;
mod engine;
mod session;

pub use countdown::{Countdown, CountdownTick, TimerLevel};
pub use engine::{QuestionInput, QuizEngine, QuizPhase, SubmitConfirm, SubmitOutcome};
pub use session::QuizSession;
