use serde::{Deserialize, Serialize};

use crate::model::{Identity, QuestionId, Response};

/// Body posted when an attempt is handed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub student_name: String,
    pub class_group: String,
    pub responses: Vec<Response>,
    /// Whole seconds from the first question shown to submission.
    pub time_taken: u64,
}

impl QuizSubmission {
    #[must_use]
    pub fn new(identity: &Identity, responses: Vec<Response>, time_taken: u64) -> Self {
        Self {
            student_name: identity.student_name().to_owned(),
            class_group: identity.class_group().to_owned(),
            responses,
            time_taken,
        }
    }
}

/// Per-question verdict as judged by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    #[serde(default)]
    pub is_correct: bool,
    #[serde(default)]
    pub points_earned: u32,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub feedback: String,
}

/// Graded attempt. Grading happens remotely; this is displayed as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub passed: bool,
    #[serde(default)]
    pub results: Vec<QuestionOutcome>,
    #[serde(default)]
    pub attempt_id: Option<u64>,
}

impl QuizResult {
    /// One-line score readout, e.g. `"7/10 (70%) passed"`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let verdict = if self.passed { "passed" } else { "not passed" };
        format!(
            "{}/{} ({:.0}%) {verdict}",
            self.score, self.max_score, self.percentage
        )
    }
}
