use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("student name is required")]
    MissingName,
    #[error("class group is required")]
    MissingClassGroup,
}

/// The `(student_name, class_group)` pair scoping everything a student saves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    student_name: String,
    class_group: String,
}

/// Raw form input, validated into an [`Identity`].
#[derive(Debug, Clone, Default)]
pub struct IdentityDraft {
    pub student_name: String,
    pub class_group: String,
}

impl IdentityDraft {
    #[must_use]
    pub fn new(student_name: impl Into<String>, class_group: impl Into<String>) -> Self {
        Self {
            student_name: student_name.into(),
            class_group: class_group.into(),
        }
    }

    /// Trim both fields and reject blanks.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MissingName` or `IdentityError::MissingClassGroup`.
    pub fn validate(self) -> Result<Identity, IdentityError> {
        let student_name = self.student_name.trim();
        if student_name.is_empty() {
            return Err(IdentityError::MissingName);
        }
        let class_group = self.class_group.trim();
        if class_group.is_empty() {
            return Err(IdentityError::MissingClassGroup);
        }
        Ok(Identity {
            student_name: student_name.to_owned(),
            class_group: class_group.to_owned(),
        })
    }
}

impl Identity {
    /// # Errors
    ///
    /// Returns `IdentityError` when a persisted value is blank.
    pub fn from_persisted(
        student_name: String,
        class_group: String,
    ) -> Result<Self, IdentityError> {
        IdentityDraft {
            student_name,
            class_group,
        }
        .validate()
    }

    #[must_use]
    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    #[must_use]
    pub fn class_group(&self) -> &str {
        &self.class_group
    }
}
