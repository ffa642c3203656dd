use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnswerId, QuestionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResponseError {
    #[error("response for question {0} carries neither an answer id nor text")]
    Empty(QuestionId),

    #[error("response for question {0} carries both an answer id and text")]
    Ambiguous(QuestionId),

    #[error("question {question} does not offer answer {answer}")]
    NotOffered {
        question: QuestionId,
        answer: AnswerId,
    },

    #[error("question {0} expects a different kind of answer")]
    KindMismatch(QuestionId),
}

/// What a student gave for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseValue {
    Choice(AnswerId),
    Text(String),
}

/// A single captured answer. Wire shape `{question_id, answer_id}` or
/// `{question_id, answer_text}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ResponseRecord", into = "ResponseRecord")]
pub struct Response {
    pub question_id: QuestionId,
    pub value: ResponseValue,
}

impl Response {
    #[must_use]
    pub fn choice(question_id: QuestionId, answer: AnswerId) -> Self {
        Self {
            question_id,
            value: ResponseValue::Choice(answer),
        }
    }

    #[must_use]
    pub fn text(question_id: QuestionId, text: impl Into<String>) -> Self {
        Self {
            question_id,
            value: ResponseValue::Text(text.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ResponseRecord {
    question_id: QuestionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_id: Option<AnswerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    answer_text: Option<String>,
}

impl TryFrom<ResponseRecord> for Response {
    type Error = ResponseError;

    fn try_from(record: ResponseRecord) -> Result<Self, Self::Error> {
        let value = match (record.answer_id, record.answer_text) {
            (Some(id), None) => ResponseValue::Choice(id),
            (None, Some(text)) => ResponseValue::Text(text),
            (None, None) => return Err(ResponseError::Empty(record.question_id)),
            (Some(_), Some(_)) => return Err(ResponseError::Ambiguous(record.question_id)),
        };
        Ok(Self {
            question_id: record.question_id,
            value,
        })
    }
}

impl From<Response> for ResponseRecord {
    fn from(response: Response) -> Self {
        let (answer_id, answer_text) = match response.value {
            ResponseValue::Choice(id) => (Some(id), None),
            ResponseValue::Text(text) => (None, Some(text)),
        };
        Self {
            question_id: response.question_id,
            answer_id,
            answer_text,
        }
    }
}

/// Responses of one attempt, at most one per question, in first-answered order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseBook {
    entries: Vec<Response>,
}

impl ResponseBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a response, replacing any earlier one for the same question in place.
    pub fn record(&mut self, response: Response) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.question_id == response.question_id)
        {
            Some(slot) => *slot = response,
            None => self.entries.push(response),
        }
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&Response> {
        self.entries.iter().find(|r| r.question_id == question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Response> {
        self.entries.iter()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Response> {
        self.entries.clone()
    }
}
