//! Read-only reference material: glossary entries and the history timeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::ArticleId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedArticle {
    pub id: ArticleId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub id: u64,
    pub term: String,
    pub definition: String,
    #[serde(default)]
    pub extended_explanation: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub related_articles: Vec<RelatedArticle>,
}

impl GlossaryTerm {
    /// Case-insensitive substring search over the term and its definition.
    /// A blank query matches everything.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self.term.to_lowercase().contains(&query)
            || self.definition.to_lowercase().contains(&query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: u64,
    pub date: NaiveDate,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "default_importance")]
    pub importance: u8,
    #[serde(default)]
    pub related_articles: Vec<RelatedArticle>,
}

fn default_importance() -> u8 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_event_parses_iso_date() {
        let event: TimelineEvent = serde_json::from_str(
            r#"{"id": 1, "date": "1492-10-12", "title": "Landfall"}"#,
        )
        .unwrap();
        assert_eq!(event.date, NaiveDate::from_ymd_opt(1492, 10, 12).unwrap());
        assert_eq!(event.importance, 1);
    }

    #[test]
    fn glossary_matching_ignores_case() {
        let term: GlossaryTerm = serde_json::from_str(
            r#"{"id": 1, "term": "Feudalism", "definition": "..."}"#,
        )
        .unwrap();
        assert!(term.matches(" feudalism"));
    }

    #[test]
    fn glossary_search_finds_fragments_in_term_and_definition() {
        let term: GlossaryTerm = serde_json::from_str(
            r#"{"id": 1, "term": "Feudalism", "definition": "Land held in exchange for Service"}"#,
        )
        .unwrap();
        assert!(term.matches("FEUD"));
        assert!(term.matches("service"));
        assert!(term.matches(""));
        assert!(!term.matches("empire"));
    }
}
