use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Heart,
    Star,
    Thinking,
    Clap,
}

impl ReactionKind {
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Heart,
        ReactionKind::Star,
        ReactionKind::Thinking,
        ReactionKind::Clap,
    ];

    #[must_use]
    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionKind::Heart => "❤️",
            ReactionKind::Star => "⭐",
            ReactionKind::Thinking => "🤔",
            ReactionKind::Clap => "👏",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "heart" => Some(ReactionKind::Heart),
            "star" => Some(ReactionKind::Star),
            "thinking" => Some(ReactionKind::Thinking),
            "clap" => Some(ReactionKind::Clap),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionAction {
    Added,
    Removed,
}

/// Server reply to a toggle: what happened and the new total for that kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionToggle {
    pub action: ReactionAction,
    pub count: u64,
}

/// Totals per kind; kinds missing from a response count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    #[serde(default)]
    pub heart: u64,
    #[serde(default)]
    pub star: u64,
    #[serde(default)]
    pub thinking: u64,
    #[serde(default)]
    pub clap: u64,
}

impl ReactionCounts {
    #[must_use]
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Heart => self.heart,
            ReactionKind::Star => self.star,
            ReactionKind::Thinking => self.thinking,
            ReactionKind::Clap => self.clap,
        }
    }

    pub fn set(&mut self, kind: ReactionKind, count: u64) {
        match kind {
            ReactionKind::Heart => self.heart = count,
            ReactionKind::Star => self.star = count,
            ReactionKind::Thinking => self.thinking = count,
            ReactionKind::Clap => self.clap = count,
        }
    }
}
