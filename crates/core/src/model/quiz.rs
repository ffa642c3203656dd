use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerId, QuestionId, QuizId, ResponseError, ResponseValue};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizDataError {
    #[error("quiz has no questions")]
    NoQuestions,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} must be worth at least one point")]
    ZeroPoints(QuestionId),

    #[error("question {0} offers no answers to choose from")]
    MissingAnswers(QuestionId),
}

//
// ─── ANSWER ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub id: AnswerId,
    pub text: String,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Question shape, carrying the answers only for kinds that offer a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    MultipleChoice { answers: Vec<Answer> },
    TrueFalse { answers: Vec<Answer> },
    OpenEnded,
    Matching { answers: Vec<Answer> },
}

impl QuestionKind {
    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        match self {
            QuestionKind::MultipleChoice { answers }
            | QuestionKind::TrueFalse { answers }
            | QuestionKind::Matching { answers } => answers,
            QuestionKind::OpenEnded => &[],
        }
    }

    /// Human label shown next to the question.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "Multiple choice",
            QuestionKind::TrueFalse { .. } => "True or false",
            QuestionKind::OpenEnded => "Open answer",
            QuestionKind::Matching { .. } => "Matching",
        }
    }

    #[must_use]
    pub fn accepts_text(&self) -> bool {
        matches!(self, QuestionKind::OpenEnded)
    }

    fn wire_type(&self) -> QuestionType {
        match self {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::TrueFalse { .. } => QuestionType::TrueFalse,
            QuestionKind::OpenEnded => QuestionType::OpenEnded,
            QuestionKind::Matching { .. } => QuestionType::Matching,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    id: QuestionId,
    text: String,
    points: u32,
    kind: QuestionKind,
}

impl Question {
    /// Build a validated question.
    ///
    /// # Errors
    ///
    /// Returns `QuizDataError::ZeroPoints` for a zero-point question and
    /// `QuizDataError::MissingAnswers` for a choice question with no answers.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        points: u32,
        kind: QuestionKind,
    ) -> Result<Self, QuizDataError> {
        if points == 0 {
            return Err(QuizDataError::ZeroPoints(id));
        }
        if !kind.accepts_text() && kind.answers().is_empty() {
            return Err(QuizDataError::MissingAnswers(id));
        }
        Ok(Self {
            id,
            text: text.into(),
            points,
            kind,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn points(&self) -> u32 {
        self.points
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn answers(&self) -> &[Answer] {
        self.kind.answers()
    }

    #[must_use]
    pub fn offers(&self, answer: AnswerId) -> bool {
        self.answers().iter().any(|a| a.id == answer)
    }

    /// Check that `value` is something this question can be answered with.
    ///
    /// # Errors
    ///
    /// Returns `ResponseError::KindMismatch` for a choice on an open question
    /// (or text on a choice question) and `ResponseError::NotOffered` for an
    /// answer id the question does not list.
    pub fn accepts(&self, value: &ResponseValue) -> Result<(), ResponseError> {
        match value {
            ResponseValue::Text(_) if self.kind.accepts_text() => Ok(()),
            ResponseValue::Choice(answer) if !self.kind.accepts_text() => {
                if self.offers(*answer) {
                    Ok(())
                } else {
                    Err(ResponseError::NotOffered {
                        question: self.id,
                        answer: *answer,
                    })
                }
            }
            _ => Err(ResponseError::KindMismatch(self.id)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum QuestionType {
    MultipleChoice,
    TrueFalse,
    OpenEnded,
    Matching,
}

/// Wire shape: `{id, type, text, points, answers}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuestionRecord {
    id: QuestionId,
    #[serde(rename = "type")]
    kind: QuestionType,
    text: String,
    points: u32,
    #[serde(default)]
    answers: Vec<Answer>,
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuizDataError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        let answers = record.answers;
        let kind = match record.kind {
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice { answers },
            QuestionType::TrueFalse => QuestionKind::TrueFalse { answers },
            // open questions never carry choices; stray ones are dropped
            QuestionType::OpenEnded => QuestionKind::OpenEnded,
            QuestionType::Matching => QuestionKind::Matching { answers },
        };
        Question::new(record.id, record.text, record.points, kind)
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        let kind = question.kind.wire_type();
        let answers = match question.kind {
            QuestionKind::MultipleChoice { answers }
            | QuestionKind::TrueFalse { answers }
            | QuestionKind::Matching { answers } => answers,
            QuestionKind::OpenEnded => Vec::new(),
        };
        Self {
            id: question.id,
            kind,
            text: question.text,
            points: question.points,
            answers,
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// A loaded quiz. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuizRecord", into = "QuizRecord")]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: String,
    difficulty: String,
    time_limit: Option<u32>,
    passing_score: u32,
    questions: Vec<Question>,
}

impl Quiz {
    /// # Errors
    ///
    /// Returns `QuizDataError::NoQuestions` for an empty quiz and
    /// `QuizDataError::DuplicateQuestion` when two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        time_limit: Option<u32>,
        passing_score: u32,
        questions: Vec<Question>,
    ) -> Result<Self, QuizDataError> {
        if questions.is_empty() {
            return Err(QuizDataError::NoQuestions);
        }
        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizDataError::DuplicateQuestion(question.id()));
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            description: String::new(),
            difficulty: String::new(),
            // a zero limit means "untimed"
            time_limit: time_limit.filter(|secs| *secs > 0),
            passing_score,
            questions,
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = difficulty.into();
        self
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn difficulty(&self) -> &str {
        &self.difficulty
    }

    /// Time limit in seconds, if the quiz is timed.
    #[must_use]
    pub fn time_limit(&self) -> Option<u32> {
        self.time_limit
    }

    /// Minimum percentage needed to pass.
    #[must_use]
    pub fn passing_score(&self) -> u32 {
        self.passing_score
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn question_by_id(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(Question::points).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuizRecord {
    id: QuizId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    difficulty: String,
    #[serde(default)]
    time_limit: Option<u32>,
    passing_score: u32,
    questions: Vec<Question>,
}

impl TryFrom<QuizRecord> for Quiz {
    type Error = QuizDataError;

    fn try_from(record: QuizRecord) -> Result<Self, Self::Error> {
        Ok(Quiz::new(
            record.id,
            record.title,
            record.time_limit,
            record.passing_score,
            record.questions,
        )?
        .with_description(record.description)
        .with_difficulty(record.difficulty))
    }
}

impl From<Quiz> for QuizRecord {
    fn from(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            description: quiz.description,
            difficulty: quiz.difficulty,
            time_limit: quiz.time_limit,
            passing_score: quiz.passing_score,
            questions: quiz.questions,
        }
    }
}
