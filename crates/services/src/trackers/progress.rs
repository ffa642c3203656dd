use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use classroom_core::Clock;
use classroom_core::model::{
    ArticleId, Completion, ProgressAck, ProgressRecord, ProgressUpdate, ScrollPosition,
};

use crate::error::TrackerError;
use crate::identity::IdentityService;
use crate::remote::RemoteStore;

struct Meter {
    clock: Clock,
    completion: Completion,
    /// Start of the reading time not yet reported.
    since: DateTime<Utc>,
}

/// Tracks how far an article has been read and reports it periodically.
pub struct ProgressMeter {
    remote: Arc<dyn RemoteStore>,
    identity: Arc<IdentityService>,
    article_id: ArticleId,
    meter: Mutex<Meter>,
}

impl ProgressMeter {
    #[must_use]
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        identity: Arc<IdentityService>,
        article_id: ArticleId,
    ) -> Self {
        let clock = Clock::default();
        Self {
            remote,
            identity,
            article_id,
            meter: Mutex::new(Meter {
                clock,
                completion: Completion::default(),
                since: clock.now(),
            }),
        }
    }

    /// Start measuring from `clock` instead of the wall clock.
    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        {
            let mut meter = self.lock();
            meter.clock = clock;
            meter.since = clock.now();
        }
        self
    }

    /// Swap the clock without resetting the unreported time (usually for tests).
    pub fn set_clock(&self, clock: Clock) {
        self.lock().clock = clock;
    }

    fn lock(&self) -> MutexGuard<'_, Meter> {
        self.meter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn article_id(&self) -> &ArticleId {
        &self.article_id
    }

    #[must_use]
    pub fn completion(&self) -> Completion {
        self.lock().completion
    }

    /// Update completion from the current viewport. Nothing is sent.
    pub fn record_scroll(&self, position: ScrollPosition) -> Completion {
        let completion = position.completion();
        self.lock().completion = completion;
        completion
    }

    /// Send the latest completion and the seconds read since the last
    /// successful send. Without an identity nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::Remote` if the update is rejected; the unreported
    /// time is kept for the next attempt.
    pub async fn flush(&self) -> Result<Option<ProgressAck>, TrackerError> {
        let Some(identity) = self.identity.current().await else {
            tracing::debug!(article_id = %self.article_id, "no identity; progress not sent");
            return Ok(None);
        };
        let (completion, increment, sent_at) = {
            let meter = self.lock();
            let now = meter.clock.now();
            (meter.completion, meter.clock.elapsed_secs(meter.since), now)
        };
        let update = ProgressUpdate::new(&identity, self.article_id.clone(), completion, increment);
        let ack = self.remote.update_progress(&update).await?;
        {
            let mut meter = self.lock();
            if sent_at > meter.since {
                meter.since = sent_at;
            }
        }
        tracing::debug!(
            article_id = %self.article_id,
            completion = completion.rounded(),
            increment,
            "progress sent"
        );
        Ok(Some(ack))
    }

    /// Flush every `every` until the returned handle is stopped or dropped.
    #[must_use]
    pub fn spawn_periodic(self: &Arc<Self>, every: Duration) -> PeriodicFlush {
        let meter = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = meter.flush().await {
                    tracing::warn!(error = %err, article_id = %meter.article_id, "periodic progress flush failed");
                }
            }
        });
        PeriodicFlush { handle }
    }

    /// Final flush when the reader leaves the page. Failures are logged only.
    pub async fn close(&self) {
        if let Err(err) = self.flush().await {
            tracing::warn!(error = %err, article_id = %self.article_id, "final progress flush failed");
        }
    }

    /// Stored record for this article, if the backend has one.
    pub async fn load(&self) -> Option<ProgressRecord> {
        let identity = self.identity.current().await?;
        match self.remote.fetch_progress(&identity).await {
            Ok(records) => records
                .into_iter()
                .find(|record| record.article_id == self.article_id),
            Err(err) => {
                tracing::warn!(error = %err, "could not load reading progress");
                None
            }
        }
    }
}

/// Background flush loop; stops when dropped.
pub struct PeriodicFlush {
    handle: JoinHandle<()>,
}

impl PeriodicFlush {
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for PeriodicFlush {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
