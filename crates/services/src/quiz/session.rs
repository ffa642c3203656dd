use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use classroom_core::model::IdentityDraft;

use super::countdown::CountdownTick;
use super::engine::{QuizEngine, SubmitConfirm, SubmitOutcome};
use crate::error::QuizError;

const TICK: Duration = Duration::from_secs(1);

/// A quiz engine shared with its countdown task.
///
/// The countdown ticks once a second while the attempt is in progress and
/// forces submission when it runs out. Dropping the session stops it.
pub struct QuizSession {
    engine: Arc<Mutex<QuizEngine>>,
    ticks: watch::Sender<Option<CountdownTick>>,
    countdown: Option<JoinHandle<()>>,
}

impl QuizSession {
    #[must_use]
    pub fn new(engine: QuizEngine) -> Self {
        let (ticks, _) = watch::channel(None);
        Self {
            engine: Arc::new(Mutex::new(engine)),
            ticks,
            countdown: None,
        }
    }

    #[must_use]
    pub fn engine(&self) -> Arc<Mutex<QuizEngine>> {
        Arc::clone(&self.engine)
    }

    /// Latest countdown reading; stays `None` for untimed quizzes.
    #[must_use]
    pub fn subscribe_countdown(&self) -> watch::Receiver<Option<CountdownTick>> {
        self.ticks.subscribe()
    }

    /// # Errors
    ///
    /// Returns `QuizError::Remote` if the quiz cannot be fetched.
    pub async fn load(&self) -> Result<(), QuizError> {
        self.engine.lock().await.load().await.map(|_| ())
    }

    /// Begin the attempt and start the countdown if the quiz is timed.
    ///
    /// # Errors
    ///
    /// Same as [`QuizEngine::begin`].
    pub async fn begin(&mut self, draft: IdentityDraft) -> Result<(), QuizError> {
        let first = {
            let mut engine = self.engine.lock().await;
            engine.begin(draft).await?;
            engine.countdown()
        };
        if let Some(first) = first {
            self.ticks.send_replace(Some(first));
            self.countdown = Some(self.spawn_countdown());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Same as [`QuizEngine::submit`].
    pub async fn submit(
        &mut self,
        confirm: &mut dyn SubmitConfirm,
    ) -> Result<SubmitOutcome, QuizError> {
        let outcome = self.engine.lock().await.submit(confirm).await;
        if !matches!(outcome, Ok(SubmitOutcome::Declined)) {
            self.stop_countdown();
        }
        outcome
    }

    fn stop_countdown(&mut self) {
        if let Some(handle) = self.countdown.take() {
            handle.abort();
        }
    }

    fn spawn_countdown(&self) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let ticks = self.ticks.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut engine = engine.lock().await;
                let Some(tick) = engine.tick() else {
                    break;
                };
                ticks.send_replace(Some(tick));
                if tick.expired {
                    if let Err(err) = engine.expire().await {
                        tracing::warn!(error = %err, "forced submission failed");
                    }
                    break;
                }
            }
        })
    }
}

impl Drop for QuizSession {
    fn drop(&mut self) {
        self.stop_countdown();
    }
}
