use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AnnotationId, Identity, SlideId};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum AnnotationError {
    #[error("annotation note must not be empty")]
    EmptyNote,
    #[error("no text selected to annotate")]
    EmptySelection,
    #[error("reply must not be empty")]
    EmptyReply,
}

const EXCERPT_CHARS: usize = 100;

/// Highlight colour; the four palette entries plus anything else the server stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnotationColor {
    #[default]
    Gold,
    Green,
    Sky,
    Pink,
    Other(String),
}

impl AnnotationColor {
    #[must_use]
    pub fn hex(&self) -> &str {
        match self {
            AnnotationColor::Gold => "#FFD700",
            AnnotationColor::Green => "#90EE90",
            AnnotationColor::Sky => "#87CEEB",
            AnnotationColor::Pink => "#FFB6C1",
            AnnotationColor::Other(hex) => hex,
        }
    }
}

impl From<String> for AnnotationColor {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "#FFD700" => AnnotationColor::Gold,
            "#90EE90" => AnnotationColor::Green,
            "#87CEEB" => AnnotationColor::Sky,
            "#FFB6C1" => AnnotationColor::Pink,
            _ => AnnotationColor::Other(value),
        }
    }
}

impl From<AnnotationColor> for String {
    fn from(color: AnnotationColor) -> Self {
        color.hex().to_owned()
    }
}

/// What the reader filled in before saving a highlight.
#[derive(Debug, Clone, Default)]
pub struct AnnotationDraft {
    pub slide_id: Option<SlideId>,
    pub selection: String,
    pub note: String,
    pub x: f64,
    pub y: f64,
    pub color: AnnotationColor,
    pub is_public: bool,
}

impl AnnotationDraft {
    /// Content checks that do not need an identity.
    ///
    /// # Errors
    ///
    /// Returns `AnnotationError::EmptySelection` or `AnnotationError::EmptyNote`.
    pub fn check(&self) -> Result<(), AnnotationError> {
        if self.selection.trim().is_empty() {
            return Err(AnnotationError::EmptySelection);
        }
        if self.note.trim().is_empty() {
            return Err(AnnotationError::EmptyNote);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`AnnotationDraft::check`].
    pub fn validate(
        self,
        slide_id: SlideId,
        identity: &Identity,
    ) -> Result<NewAnnotation, AnnotationError> {
        self.check()?;
        let selection = self.selection.trim();
        Ok(NewAnnotation {
            slide_id: self.slide_id.unwrap_or(slide_id),
            text: selection.to_owned(),
            note: self.note,
            x: self.x,
            y: self.y,
            color: self.color,
            is_public: self.is_public,
            student_name: identity.student_name().to_owned(),
            class_group: identity.class_group().to_owned(),
        })
    }

    /// Selection preview, cut after a hundred characters.
    #[must_use]
    pub fn excerpt(&self) -> String {
        let selection = self.selection.trim();
        let mut chars = selection.chars();
        let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnnotation {
    pub slide_id: SlideId,
    pub text: String,
    pub note: String,
    pub x: f64,
    pub y: f64,
    pub color: AnnotationColor,
    pub is_public: bool,
    pub student_name: String,
    pub class_group: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub student_name: String,
    pub note: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub color: AnnotationColor,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub replies_count: u64,
    #[serde(default)]
    pub likes_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReply {
    pub author_name: String,
    pub content: String,
}

impl NewReply {
    /// # Errors
    ///
    /// Returns `AnnotationError::EmptyReply` for blank content.
    pub fn new(identity: &Identity, content: impl Into<String>) -> Result<Self, AnnotationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(AnnotationError::EmptyReply);
        }
        Ok(Self {
            author_name: identity.student_name().to_owned(),
            content,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationReply {
    pub id: u64,
    pub author_name: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentityDraft;

    fn identity() -> Identity {
        IdentityDraft::new("Ada", "5A").validate().unwrap()
    }

    #[test]
    fn blank_note_is_rejected() {
        let draft = AnnotationDraft {
            selection: "Carthago delenda est".into(),
            note: "  ".into(),
            ..AnnotationDraft::default()
        };
        assert_eq!(
            draft.validate(SlideId::new(1), &identity()).unwrap_err(),
            AnnotationError::EmptyNote
        );
    }

    #[test]
    fn validated_annotation_carries_identity_and_default_color() {
        let draft = AnnotationDraft {
            selection: " Senate ".into(),
            note: "who sat here?".into(),
            x: 10.0,
            y: 20.0,
            ..AnnotationDraft::default()
        };
        let new = draft.validate(SlideId::new(4), &identity()).unwrap();
        assert_eq!(new.text, "Senate");
        assert_eq!(new.class_group, "5A");
        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["color"], "#FFD700");
        assert_eq!(json["slide_id"], 4);
    }

    #[test]
    fn unknown_colors_survive() {
        let color: AnnotationColor = serde_json::from_str("\"#123456\"").unwrap();
        assert_eq!(color, AnnotationColor::Other("#123456".into()));
        let color: AnnotationColor = serde_json::from_str("\"#90ee90\"").unwrap();
        assert_eq!(color, AnnotationColor::Green);
    }

    #[test]
    fn excerpt_truncates_long_selections() {
        let draft = AnnotationDraft {
            selection: "x".repeat(120),
            ..AnnotationDraft::default()
        };
        let excerpt = draft.excerpt();
        assert_eq!(excerpt.len(), 103);
        assert!(excerpt.ends_with("..."));
    }

    #[test]
    fn blank_reply_rejected() {
        assert_eq!(
            NewReply::new(&identity(), " ").unwrap_err(),
            AnnotationError::EmptyReply
        );
    }
}
