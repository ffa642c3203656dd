use serde::{Deserialize, Serialize};

use crate::model::{ArticleId, Identity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Click,
    Hover,
    Scroll,
    Download,
}

/// Analytics event for one article. Anonymous readers send an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    pub article_id: ArticleId,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub element: String,
    #[serde(default)]
    pub student_name: String,
}

impl Interaction {
    #[must_use]
    pub fn new(
        article_id: ArticleId,
        kind: InteractionKind,
        element: impl Into<String>,
        reader: Option<&Identity>,
    ) -> Self {
        Self {
            article_id,
            kind,
            element: element.into(),
            student_name: reader
                .map(|identity| identity.student_name().to_owned())
                .unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn scroll_depth(article_id: ArticleId, scroll_top: f64, reader: Option<&Identity>) -> Self {
        Self::new(
            article_id,
            InteractionKind::Scroll,
            Self::depth_label(scroll_top),
            reader,
        )
    }

    /// Scroll depth in whole pixels, labelled the way the backend groups it.
    #[must_use]
    pub fn depth_label(scroll_top: f64) -> String {
        let depth = scroll_top.round();
        format!("depth-{}", if depth > 0.0 { depth } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::IdentityDraft;

    #[test]
    fn wire_shape_uses_type_key() {
        let reader = IdentityDraft::new("Ada", "5A").validate().unwrap();
        let event = Interaction::new(
            ArticleId::new("rome"),
            InteractionKind::Click,
            "pdf-button",
            Some(&reader),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "article_id": "rome",
                "type": "click",
                "element": "pdf-button",
                "student_name": "Ada"
            })
        );
    }

    #[test]
    fn scroll_depth_is_rounded_and_anonymous_without_reader() {
        let event = Interaction::scroll_depth(ArticleId::new("rome"), 812.6, None);
        assert_eq!(event.element, "depth-813");
        assert_eq!(event.student_name, "");

        let event = Interaction::scroll_depth(ArticleId::new("rome"), -4.0, None);
        assert_eq!(event.element, "depth-0");
    }
}
