use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

use classroom_core::model::{ArticleId, Interaction, InteractionKind};

use crate::identity::IdentityService;
use crate::remote::RemoteStore;

struct Reporter {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    article_id: ArticleId,
}

impl Reporter {
    async fn send(&self, kind: InteractionKind, element: String) {
        let reader = self.identity.current().await;
        let event = Interaction::new(self.article_id.clone(), kind, element, reader.as_ref());
        if let Err(err) = self.remote.track_interaction(&event).await {
            tracing::warn!(error = %err, article_id = %self.article_id, ?kind, "interaction not tracked");
        }
    }
}

/// Reader analytics for one article: clicks go out at once, scroll depth
/// only after scrolling has settled for the debounce window.
///
/// Anonymous readers are tracked with an empty name and never prompted.
pub struct InteractionTracker {
    reporter: Arc<Reporter>,
    window: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl InteractionTracker {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        identity: Arc<IdentityService>,
        article_id: ArticleId,
        window: Duration,
    ) -> Self {
        Self {
            reporter: Arc::new(Reporter {
                remote,
                identity,
                article_id,
            }),
            window,
            pending: Mutex::new(None),
        }
    }

    pub async fn click(&self, element: &str) {
        self.reporter
            .send(InteractionKind::Click, element.to_owned())
            .await;
    }

    /// Restart the quiet window; only the last depth of a burst is sent.
    pub fn record_scroll(&self, scroll_top: f64) {
        let reporter = Arc::clone(&self.reporter);
        let window = self.window;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(window).await;
            reporter
                .send(InteractionKind::Scroll, Interaction::depth_label(scroll_top))
                .await;
        });
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
    }
}

impl Drop for InteractionTracker {
    fn drop(&mut self) {
        if let Some(handle) = self
            .pending
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }
}
