//! Edit locally, persist lazily: the debounce-and-flush cycle shared by
//! collaborative notes and other editable documents.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use classroom_core::model::{SaveStatus, Version};

use crate::error::PersistError;

/// Quiet period after the last note edit before it is written.
pub const NOTE_DEBOUNCE: Duration = Duration::from_millis(3_000);

/// Reading progress is sent on this cadence rather than per edit.
pub const PROGRESS_FLUSH_INTERVAL: Duration = Duration::from_millis(30_000);

/// Scroll depth is reported once scrolling has been still this long.
pub const SCROLL_DEBOUNCE: Duration = Duration::from_millis(1_000);

/// Save policy handed to every editable document and tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersisterConfig {
    pub debounce: Duration,
    pub flush_interval: Duration,
    pub scroll_debounce: Duration,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            debounce: NOTE_DEBOUNCE,
            flush_interval: PROGRESS_FLUSH_INTERVAL,
            scroll_debounce: SCROLL_DEBOUNCE,
        }
    }
}

/// Where a document's full content is written.
#[async_trait]
pub trait DocumentSink: Send + Sync + 'static {
    type Content: Clone + PartialEq + Send + Sync + 'static;

    /// Write `content` and return the version the store assigned to it.
    async fn persist(&self, content: &Self::Content) -> Result<Version, PersistError>;
}

/// What observers of a document see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistState {
    pub status: SaveStatus,
    pub version: Version,
}

#[derive(Debug)]
pub enum FlushOutcome {
    /// Nothing changed since the last confirmed save.
    Clean,
    Saved(Version),
    Failed(PersistError),
}

struct Document<C> {
    content: C,
    confirmed: Option<C>,
    /// Send that produced `confirmed`; older sends landing later are ignored.
    confirmed_seq: u64,
    /// Newest send still waiting for the store.
    in_flight: Option<(u64, C)>,
    next_seq: u64,
    version: Version,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

struct Inner<S: DocumentSink> {
    sink: S,
    window: Duration,
    doc: Mutex<Document<S::Content>>,
    state: watch::Sender<PersistState>,
}

/// Coalesces bursts of edits into one delayed write of the latest content.
///
/// Editing requires a running tokio runtime: each edit (re)arms a timer task.
pub struct DebouncedPersister<S: DocumentSink> {
    inner: Arc<Inner<S>>,
}

impl<S: DocumentSink> Clone for DebouncedPersister<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: DocumentSink> DebouncedPersister<S> {
    /// Start from content already known to be stored at `version`.
    #[must_use]
    pub fn new(sink: S, content: S::Content, version: Version, window: Duration) -> Self {
        let (state, _) = watch::channel(PersistState {
            status: SaveStatus::Saved,
            version,
        });
        Self {
            inner: Arc::new(Inner {
                sink,
                window,
                doc: Mutex::new(Document {
                    confirmed: Some(content.clone()),
                    content,
                    confirmed_seq: 0,
                    in_flight: None,
                    next_seq: 0,
                    version,
                    generation: 0,
                    pending: None,
                }),
                state,
            }),
        }
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.inner.sink
    }

    #[must_use]
    pub fn content(&self) -> S::Content {
        self.inner.lock().content.clone()
    }

    #[must_use]
    pub fn version(&self) -> Version {
        self.inner.lock().version
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        self.inner.state.borrow().status
    }

    /// True while the in-memory content is not what the store will hold
    /// once every write in flight has landed.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        !self.inner.lock().is_clean()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PersistState> {
        self.inner.state.subscribe()
    }

    /// Replace the document with freshly loaded remote state, dropping any pending write.
    pub fn reset(&self, content: S::Content, version: Version) {
        {
            let mut doc = self.inner.lock();
            doc.cancel_pending();
            doc.confirmed = Some(content.clone());
            doc.confirmed_seq = doc.next_seq;
            doc.in_flight = None;
            doc.content = content;
            doc.version = version;
        }
        self.inner.state.send_replace(PersistState {
            status: SaveStatus::Saved,
            version,
        });
    }

    /// Apply an edit now and restart the debounce window.
    pub fn edit(&self, content: S::Content) {
        {
            let mut doc = self.inner.lock();
            doc.content = content;
            Inner::arm(&self.inner, &mut doc);
        }
        self.inner.set_status(SaveStatus::Unsaved);
    }

    /// Write the current content unless it is already stored.
    pub async fn flush(&self) -> FlushOutcome {
        Inner::flush(&self.inner).await
    }

    /// Skip the remaining debounce window and write immediately.
    pub async fn save_now(&self) -> FlushOutcome {
        self.inner.lock().cancel_pending();
        Inner::flush(&self.inner).await
    }

    /// Final best-effort write before teardown. No timer survives it.
    pub async fn close(self) -> FlushOutcome {
        let outcome = self.save_now().await;
        self.inner.lock().cancel_pending();
        if let FlushOutcome::Failed(err) = &outcome {
            tracing::warn!(error = %err, "final save before close failed");
        }
        outcome
    }
}

impl<C: PartialEq> Document<C> {
    fn cancel_pending(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Content matches the last confirmed save and no newer write is carrying
    /// something else.
    fn is_clean(&self) -> bool {
        self.confirmed.as_ref() == Some(&self.content)
            && self
                .in_flight
                .as_ref()
                .is_none_or(|(_, sent)| *sent == self.content)
    }

    fn settled_status(&self) -> SaveStatus {
        if self.is_clean() {
            SaveStatus::Saved
        } else if self
            .in_flight
            .as_ref()
            .is_some_and(|(_, sent)| *sent == self.content)
        {
            SaveStatus::Saving
        } else {
            SaveStatus::Unsaved
        }
    }
}

impl<S: DocumentSink> Inner<S> {
    fn lock(&self) -> MutexGuard<'_, Document<S::Content>> {
        self.doc.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: SaveStatus) {
        self.state.send_modify(|state| state.status = status);
    }

    /// Replace any running timer with a fresh debounce window.
    fn arm(this: &Arc<Self>, doc: &mut Document<S::Content>) {
        doc.cancel_pending();
        let generation = doc.generation;
        let inner = Arc::clone(this);
        doc.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.window).await;
            if inner.claim_timer(generation) {
                Inner::flush(&inner).await;
            }
        }));
    }

    /// The timer for `generation` fired; detach it so later edits cannot abort
    /// the write it is about to start.
    fn claim_timer(&self, generation: u64) -> bool {
        let mut doc = self.lock();
        if doc.generation != generation {
            return false;
        }
        doc.pending = None;
        true
    }

    async fn flush(this: &Arc<Self>) -> FlushOutcome {
        let (seq, content) = {
            let mut doc = this.lock();
            if doc.is_clean() {
                drop(doc);
                this.state.send_if_modified(|state| {
                    let stale = matches!(state.status, SaveStatus::Unsaved | SaveStatus::Failed);
                    if stale {
                        state.status = SaveStatus::Saved;
                    }
                    stale
                });
                return FlushOutcome::Clean;
            }
            doc.next_seq += 1;
            let seq = doc.next_seq;
            let sent = doc.content.clone();
            doc.in_flight = Some((seq, sent.clone()));
            (seq, sent)
        };

        this.set_status(SaveStatus::Saving);
        let result = this.sink.persist(&content).await;

        let mut doc = this.lock();
        if doc.in_flight.as_ref().is_some_and(|(sent, _)| *sent == seq) {
            doc.in_flight = None;
        }
        match result {
            Ok(version) => {
                doc.version.advance_to(version);
                if seq > doc.confirmed_seq {
                    doc.confirmed = Some(content);
                    doc.confirmed_seq = seq;
                }
                let status = doc.settled_status();
                // a newer edit is still waiting but nothing will send it
                if status == SaveStatus::Unsaved && doc.pending.is_none() {
                    Inner::arm(this, &mut doc);
                }
                let version = doc.version;
                drop(doc);
                this.state.send_replace(PersistState { status, version });
                tracing::debug!(%version, seq, "document saved");
                FlushOutcome::Saved(version)
            }
            Err(err) => {
                let superseded = seq < doc.confirmed_seq || doc.in_flight.is_some();
                let status = if superseded {
                    doc.settled_status()
                } else {
                    SaveStatus::Failed
                };
                drop(doc);
                tracing::warn!(error = %err, seq, "document save failed");
                this.set_status(status);
                FlushOutcome::Failed(err)
            }
        }
    }
}
