use std::collections::BTreeSet;
use std::sync::Arc;

use classroom_core::model::{ArticleId, ReactionAction, ReactionCounts, ReactionKind, ReactionToggle};

use crate::error::TrackerError;
use crate::remote::RemoteStore;

/// Reaction totals for one article plus the kinds this reader has switched on.
pub struct ReactionCounter {
    remote: Arc<dyn RemoteStore>,
    article_id: ArticleId,
    counts: ReactionCounts,
    active: BTreeSet<ReactionKind>,
}

impl ReactionCounter {
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>, article_id: ArticleId) -> Self {
        Self {
            remote,
            article_id,
            counts: ReactionCounts::default(),
            active: BTreeSet::new(),
        }
    }

    /// Fetch the totals; an unreachable store reads as all zeros.
    pub async fn load(&mut self) -> ReactionCounts {
        self.counts = match self.remote.reactions(&self.article_id).await {
            Ok(counts) => counts,
            Err(err) => {
                tracing::warn!(error = %err, article_id = %self.article_id, "could not load reactions");
                ReactionCounts::default()
            }
        };
        self.counts
    }

    /// Send the toggle and adopt the server's count and verdict.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Remote`; local counts are left untouched.
    pub async fn toggle(&mut self, kind: ReactionKind) -> Result<ReactionToggle, TrackerError> {
        let toggle = self.remote.toggle_reaction(&self.article_id, kind).await?;
        self.counts.set(kind, toggle.count);
        match toggle.action {
            ReactionAction::Added => self.active.insert(kind),
            ReactionAction::Removed => self.active.remove(&kind),
        };
        Ok(toggle)
    }

    #[must_use]
    pub fn counts(&self) -> ReactionCounts {
        self.counts
    }

    #[must_use]
    pub fn is_active(&self, kind: ReactionKind) -> bool {
        self.active.contains(&kind)
    }
}
