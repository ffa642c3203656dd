use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use classroom_core::Clock;
use classroom_core::model::{
    AnswerId, Identity, IdentityDraft, Question, Quiz, QuizId, QuizResult, QuizSubmission,
    Response, ResponseBook, ResponseValue,
};

use super::countdown::{Countdown, CountdownTick};
use crate::error::QuizError;
use crate::identity::IdentityService;
use crate::remote::RemoteStore;

/// Where an attempt stands.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizPhase {
    NotLoaded,
    /// Quiz fetched, waiting for the student to begin.
    Start,
    InProgress { index: usize },
    /// Submission sent, no answer yet.
    Submitted,
    Results(QuizResult),
}

/// Contents of the answer control for the question on screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum QuestionInput {
    #[default]
    Empty,
    Choice(AnswerId),
    Text(String),
}

impl QuestionInput {
    fn restore(response: Option<&Response>) -> Self {
        match response.map(|r| &r.value) {
            Some(ResponseValue::Choice(answer)) => QuestionInput::Choice(*answer),
            Some(ResponseValue::Text(text)) => QuestionInput::Text(text.clone()),
            None => QuestionInput::Empty,
        }
    }
}

/// Asked before handing in an attempt with unanswered questions.
#[async_trait]
pub trait SubmitConfirm: Send {
    async fn confirm_incomplete(&mut self, answered: usize, total: usize) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The student chose to keep working.
    Declined,
    Completed(QuizResult),
}

/// One student's attempt at one quiz.
pub struct QuizEngine {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    quiz_id: QuizId,
    clock: Clock,
    quiz: Option<Quiz>,
    phase: QuizPhase,
    responses: ResponseBook,
    input: QuestionInput,
    student: Option<Identity>,
    started_at: Option<DateTime<Utc>>,
    countdown: Option<Countdown>,
}

impl QuizEngine {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        identity: Arc<IdentityService>,
        quiz_id: QuizId,
    ) -> Self {
        Self {
            remote,
            identity,
            quiz_id,
            clock: Clock::default(),
            quiz: None,
            phase: QuizPhase::NotLoaded,
            responses: ResponseBook::new(),
            input: QuestionInput::Empty,
            student: None,
            started_at: None,
            countdown: None,
        }
    }

    /// Override the clock (usually for deterministic testing).
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn quiz_id(&self) -> QuizId {
        self.quiz_id
    }

    #[must_use]
    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn responses(&self) -> &ResponseBook {
        &self.responses
    }

    #[must_use]
    pub fn input(&self) -> &QuestionInput {
        &self.input
    }

    #[must_use]
    pub fn result(&self) -> Option<&QuizResult> {
        match &self.phase {
            QuizPhase::Results(result) => Some(result),
            _ => None,
        }
    }

    /// Index of the question on screen and the question count.
    #[must_use]
    pub fn position(&self) -> Option<(usize, usize)> {
        match (&self.phase, &self.quiz) {
            (QuizPhase::InProgress { index }, Some(quiz)) => Some((*index, quiz.len())),
            _ => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        let (index, _) = self.position()?;
        self.quiz.as_ref()?.question(index)
    }

    /// Remaining time, when the attempt is timed and running.
    #[must_use]
    pub fn countdown(&self) -> Option<CountdownTick> {
        self.countdown.as_ref().map(Countdown::snapshot)
    }

    /// Fetch the quiz definition.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyStarted` once an attempt is under way and
    /// `QuizError::Remote` if the quiz cannot be fetched or decoded.
    pub async fn load(&mut self) -> Result<&Quiz, QuizError> {
        if !matches!(self.phase, QuizPhase::NotLoaded | QuizPhase::Start) {
            return Err(QuizError::AlreadyStarted);
        }
        let quiz = self.remote.fetch_quiz(self.quiz_id).await?;
        tracing::debug!(quiz_id = %self.quiz_id, questions = quiz.len(), "quiz loaded");
        self.phase = QuizPhase::Start;
        Ok(self.quiz.insert(quiz))
    }

    /// Record who is taking the quiz and show the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Identity` for blank fields (the phase is unchanged),
    /// `QuizError::NotLoaded` or `QuizError::AlreadyStarted` when called out of order.
    pub async fn begin(&mut self, draft: IdentityDraft) -> Result<(), QuizError> {
        match self.phase {
            QuizPhase::Start => {}
            QuizPhase::NotLoaded => return Err(QuizError::NotLoaded),
            _ => return Err(QuizError::AlreadyStarted),
        }
        let student = draft.clone().validate()?;
        if let Err(err) = self.identity.remember(draft).await {
            tracing::warn!(error = %err, "could not cache identity; continuing with the attempt");
        }
        let time_limit = self.quiz.as_ref().and_then(Quiz::time_limit);

        self.student = Some(student);
        self.responses = ResponseBook::new();
        self.started_at = Some(self.clock.now());
        self.countdown = time_limit.map(Countdown::new);
        self.show(0);
        tracing::info!(quiz_id = %self.quiz_id, ?time_limit, "quiz started");
        Ok(())
    }

    /// Replace the answer control's contents for the current question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotInProgress` outside an attempt and
    /// `QuizError::Response` when the input does not fit the question.
    pub fn set_input(&mut self, input: QuestionInput) -> Result<(), QuizError> {
        let question = self.current_question().ok_or(QuizError::NotInProgress)?;
        match &input {
            QuestionInput::Empty => {}
            QuestionInput::Choice(answer) => {
                question.accepts(&ResponseValue::Choice(*answer))?;
            }
            QuestionInput::Text(text) => {
                question.accepts(&ResponseValue::Text(text.clone()))?;
            }
        }
        self.input = input;
        Ok(())
    }

    /// Keep the current answer and move forward.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AtLastQuestion` on the last question.
    pub fn next(&mut self) -> Result<(), QuizError> {
        let (index, total) = self.position().ok_or(QuizError::NotInProgress)?;
        if index + 1 >= total {
            return Err(QuizError::AtLastQuestion);
        }
        self.capture();
        self.show(index + 1);
        Ok(())
    }

    /// Move back without keeping what is in the answer control.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AtFirstQuestion` on the first question.
    pub fn prev(&mut self) -> Result<(), QuizError> {
        let (index, _) = self.position().ok_or(QuizError::NotInProgress)?;
        if index == 0 {
            return Err(QuizError::AtFirstQuestion);
        }
        self.show(index - 1);
        Ok(())
    }

    /// Hand the attempt in from the last question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NotAtLastQuestion` before the last question and
    /// `QuizError::Remote` if the submission fails; the attempt is then back
    /// in progress with the countdown stopped.
    pub async fn submit(
        &mut self,
        confirm: &mut dyn SubmitConfirm,
    ) -> Result<SubmitOutcome, QuizError> {
        let (index, total) = self.position().ok_or(QuizError::NotInProgress)?;
        if index + 1 != total {
            return Err(QuizError::NotAtLastQuestion);
        }
        self.capture();
        let answered = self.responses.len();
        if answered < total && !confirm.confirm_incomplete(answered, total).await {
            tracing::debug!(answered, total, "incomplete submission declined");
            return Ok(SubmitOutcome::Declined);
        }
        self.deliver(index).await.map(SubmitOutcome::Completed)
    }

    /// Advance the countdown by one second. `None` when nothing is counting.
    pub fn tick(&mut self) -> Option<CountdownTick> {
        if self.position().is_none() {
            return None;
        }
        self.countdown.as_mut().map(Countdown::tick)
    }

    /// Forced hand-in once the countdown is exhausted, from any question and
    /// without asking.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::TimeRemaining` while time is left and
    /// `QuizError::Remote` if the submission fails.
    pub async fn expire(&mut self) -> Result<QuizResult, QuizError> {
        let (index, _) = self.position().ok_or(QuizError::NotInProgress)?;
        if !self.countdown.as_ref().is_some_and(Countdown::is_expired) {
            return Err(QuizError::TimeRemaining);
        }
        tracing::info!(quiz_id = %self.quiz_id, "time is up; submitting");
        self.capture();
        self.deliver(index).await
    }

    fn show(&mut self, index: usize) {
        let saved = self
            .quiz
            .as_ref()
            .and_then(|quiz| quiz.question(index))
            .and_then(|question| self.responses.get(question.id()));
        self.input = QuestionInput::restore(saved);
        self.phase = QuizPhase::InProgress { index };
    }

    /// Store the answer control's contents; blank text records nothing.
    fn capture(&mut self) {
        let Some(question_id) = self.current_question().map(Question::id) else {
            return;
        };
        match &self.input {
            QuestionInput::Empty => {}
            QuestionInput::Choice(answer) => {
                self.responses.record(Response::choice(question_id, *answer));
            }
            QuestionInput::Text(text) if text.trim().is_empty() => {}
            QuestionInput::Text(text) => {
                self.responses
                    .record(Response::text(question_id, text.clone()));
            }
        }
    }

    async fn deliver(&mut self, from: usize) -> Result<QuizResult, QuizError> {
        let student = self.student.clone().ok_or(QuizError::NotInProgress)?;
        self.countdown = None;
        self.phase = QuizPhase::Submitted;

        let time_taken = self
            .started_at
            .map_or(0, |started| self.clock.elapsed_secs(started));
        let submission = QuizSubmission::new(&student, self.responses.to_vec(), time_taken);
        match self.remote.submit_quiz(self.quiz_id, &submission).await {
            Ok(result) => {
                tracing::info!(
                    quiz_id = %self.quiz_id,
                    score = result.score,
                    passed = result.passed,
                    "quiz graded"
                );
                self.phase = QuizPhase::Results(result.clone());
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(error = %err, quiz_id = %self.quiz_id, "quiz submission failed");
                self.phase = QuizPhase::InProgress { index: from };
                Err(err.into())
            }
        }
    }
}
