use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::model::{ArticleId, Identity, Version};

/// One shared note exists per article and class group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteKey {
    pub article_id: ArticleId,
    pub class_group: String,
}

impl NoteKey {
    #[must_use]
    pub fn new(article_id: ArticleId, class_group: impl Into<String>) -> Self {
        Self {
            article_id,
            class_group: class_group.into(),
        }
    }
}

/// Note as served by the remote store. A missing note reads as empty at version 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaborativeNote {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub version: Version,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default)]
    pub last_edited: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
}

/// Full-content write; there is no diffing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteUpdate {
    pub article_id: ArticleId,
    pub class_group: String,
    pub content: String,
    pub contributor: String,
}

impl NoteUpdate {
    #[must_use]
    pub fn new(key: &NoteKey, identity: &Identity, content: impl Into<String>) -> Self {
        Self {
            article_id: key.article_id.clone(),
            class_group: key.class_group.clone(),
            content: content.into(),
            contributor: identity.student_name().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteSaved {
    pub version: Version,
    #[serde(default)]
    pub contributors: Vec<String>,
    #[serde(default)]
    pub last_edited: Option<String>,
}

/// Markdown shortcuts offered by the note toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatting {
    Bold,
    Italic,
    ListItem,
}

impl Formatting {
    /// Wrap `selection` (byte offsets) of `text`.
    ///
    /// Returns `None` if the range is out of bounds or splits a character.
    #[must_use]
    pub fn apply(self, text: &str, selection: Range<usize>) -> Option<String> {
        let selected = text.get(selection.clone())?;
        let formatted = match self {
            Formatting::Bold => format!("**{selected}**"),
            Formatting::Italic => format!("*{selected}*"),
            Formatting::ListItem => format!("\n- {selected}"),
        };
        let mut out = String::with_capacity(text.len() + formatted.len());
        out.push_str(&text[..selection.start]);
        out.push_str(&formatted);
        out.push_str(&text[selection.end..]);
        Some(out)
    }
}
