use serde::{Deserialize, Serialize};

use crate::model::{ArticleId, Identity};

/// Reading completion in percent, always within `[0, 100]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Completion(f64);

impl Completion {
    #[must_use]
    pub fn new(percent: f64) -> Self {
        if percent.is_nan() {
            return Self(0.0);
        }
        Self(percent.clamp(0.0, 100.0))
    }

    #[must_use]
    pub fn percent(&self) -> f64 {
        self.0
    }

    #[must_use]
    pub fn rounded(&self) -> u8 {
        // clamped to [0, 100] so the cast cannot truncate
        self.0.round() as u8
    }
}

/// Viewport geometry sampled on scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollPosition {
    pub scroll_top: f64,
    pub viewport_height: f64,
    pub document_height: f64,
}

impl ScrollPosition {
    /// Share of the scrollable distance already covered.
    ///
    /// A document that fits in the viewport counts as fully read.
    #[must_use]
    pub fn completion(&self) -> Completion {
        let scrollable = self.document_height - self.viewport_height;
        if scrollable <= 0.0 {
            return Completion::new(100.0);
        }
        Completion::new(self.scroll_top / scrollable * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub student_name: String,
    pub class_group: String,
    pub article_id: ArticleId,
    pub completion_percentage: Completion,
    /// Seconds spent reading since the previous successful update.
    pub time_increment: u64,
}

impl ProgressUpdate {
    #[must_use]
    pub fn new(
        identity: &Identity,
        article_id: ArticleId,
        completion: Completion,
        time_increment: u64,
    ) -> Self {
        Self {
            student_name: identity.student_name().to_owned(),
            class_group: identity.class_group().to_owned(),
            article_id,
            completion_percentage: completion,
            time_increment,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressAck {
    #[serde(default)]
    pub completion_percentage: Completion,
    #[serde(default)]
    pub time_spent: u64,
}

/// One stored per-article record for a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub article_id: ArticleId,
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub completion: Completion,
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default)]
    pub last_accessed: Option<String>,
}
