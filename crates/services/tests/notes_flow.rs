mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use classroom_core::model::{
    ArticleId, CollaborativeNote, Formatting, IdentityDraft, SaveStatus, Version,
};
use classroom_core::time::fixed_clock;
use services::{AppServices, FlushOutcome, PersistError};
use storage::repository::Storage;
use tokio::time::Instant;

use common::{FakeRemote, ScriptedPrompt, ada};

async fn services_with(remote: &Arc<FakeRemote>) -> AppServices {
    let remote_store: Arc<dyn services::RemoteStore> = remote.clone();
    AppServices::from_parts(Storage::in_memory(), remote_store, fixed_clock()).await
}

async fn signed_in(remote: &Arc<FakeRemote>) -> AppServices {
    let services = services_with(remote).await;
    services
        .identity()
        .remember(IdentityDraft::new("Ada", "5A"))
        .await
        .unwrap();
    services
}

fn stored_note(content: &str, version: u64) -> CollaborativeNote {
    CollaborativeNote {
        content: content.into(),
        version: Version::new(version),
        contributors: vec!["Bo".into()],
        ..CollaborativeNote::default()
    }
}

#[tokio::test(start_paused = true)]
async fn typing_burst_is_saved_once_after_the_quiet_period() {
    let remote = Arc::new(FakeRemote::default());
    *remote.note.lock().unwrap() = stored_note("abc", 3);
    let services = signed_in(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));
    assert!(notes.load().await);
    assert_eq!(notes.content(), "abc");
    assert_eq!(notes.version(), Version::new(3));

    let start = Instant::now();
    notes.edit("abcd");
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    notes.edit("abcde");
    assert_eq!(notes.status(), SaveStatus::Unsaved);

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    let updates = remote.note_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0.content, "abcde");
    assert_eq!(updates[0].0.contributor, "Ada");
    assert_eq!(updates[0].0.class_group, "5A");
    assert_eq!(updates[0].1 - start, Duration::from_millis(4_000));

    assert_eq!(notes.status(), SaveStatus::Saved);
    assert_eq!(notes.version(), Version::new(4));
    assert_eq!(notes.contributors(), vec!["Bo".to_string(), "Ada".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn failed_save_is_retried_by_the_next_one() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));
    notes.load().await;

    remote.fail_notes.store(true, Ordering::SeqCst);
    notes.edit("draft");
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(notes.status(), SaveStatus::Failed);
    assert_eq!(notes.version(), Version::new(0));

    remote.fail_notes.store(false, Ordering::SeqCst);
    assert!(matches!(notes.save_now().await, FlushOutcome::Saved(v) if v == Version::new(1)));
    assert_eq!(notes.status(), SaveStatus::Saved);
    assert_eq!(remote.note_contents(), vec!["draft".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn anonymous_reader_neither_loads_nor_saves() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));

    assert!(!notes.load().await);
    assert_eq!(remote.note_fetches.load(Ordering::SeqCst), 0);

    notes.edit("mine");
    let outcome = notes.save_now().await;
    assert!(matches!(
        outcome,
        FlushOutcome::Failed(PersistError::MissingIdentity)
    ));
    assert_eq!(notes.status(), SaveStatus::Failed);
    assert!(remote.note_contents().is_empty());
}

#[tokio::test(start_paused = true)]
async fn formatting_counts_as_an_edit() {
    let remote = Arc::new(FakeRemote::default());
    *remote.note.lock().unwrap() = stored_note("make this bold", 1);
    let services = signed_in(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));
    notes.load().await;

    assert!(notes.apply_formatting(Formatting::Bold, 5..9));
    assert_eq!(notes.content(), "make **this** bold");
    assert_eq!(notes.status(), SaveStatus::Unsaved);
    assert!(!notes.apply_formatting(Formatting::Italic, 40..50));

    let outcome = notes.close().await;
    assert!(matches!(outcome, FlushOutcome::Saved(_)));
    assert_eq!(remote.note_contents(), vec!["make **this** bold".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn first_save_by_anonymous_reader_asks_who_they_are() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let prompt = Arc::new(ScriptedPrompt::answering("Ada", "5A"));
    let mut notes = services
        .notes(ArticleId::new("rome"))
        .with_prompt(prompt.clone());

    assert!(!notes.load().await);
    assert_eq!(prompt.asked(), 0);

    notes.edit("first thoughts");
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(prompt.asked(), 1);
    assert_eq!(notes.status(), SaveStatus::Saved);
    assert_eq!(services.identity().current().await, Some(ada()));

    notes.edit("second thoughts");
    assert!(matches!(notes.save_now().await, FlushOutcome::Saved(_)));
    assert_eq!(prompt.asked(), 1);
    let updates = remote.note_updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].0.contributor, "Ada");
    assert_eq!(updates[0].0.class_group, "5A");
}

#[tokio::test(start_paused = true)]
async fn unreachable_note_opens_an_empty_editor() {
    let remote = Arc::new(FakeRemote::default());
    *remote.note.lock().unwrap() = stored_note("abc", 3);
    remote.fail_reads.store(true, Ordering::SeqCst);
    let services = signed_in(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));

    assert!(!notes.load().await);
    assert_eq!(remote.note_fetches.load(Ordering::SeqCst), 1);
    assert_eq!(notes.content(), "");
    assert_eq!(notes.version(), Version::new(0));
    assert_eq!(notes.status(), SaveStatus::Saved);
    assert!(notes.contributors().is_empty());

    notes.edit("offline draft");
    assert!(matches!(notes.save_now().await, FlushOutcome::Saved(_)));
    assert_eq!(remote.note_contents(), vec!["offline draft".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn edit_back_to_stored_text_during_slow_write_is_sent_last() {
    let remote = Arc::new(FakeRemote::default());
    *remote.note.lock().unwrap() = stored_note("abc", 3);
    remote
        .note_delays
        .lock()
        .unwrap()
        .extend([Duration::from_secs(5), Duration::from_secs(5)]);
    let services = signed_in(&remote).await;
    let mut notes = services.notes(ArticleId::new("rome"));
    notes.load().await;

    notes.edit("x");
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(notes.status(), SaveStatus::Saving);

    notes.edit("abc");
    assert!(notes.has_unsaved_changes());
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(remote.note_contents(), vec!["x".to_string(), "abc".to_string()]);
    assert_eq!(remote.note.lock().unwrap().content, "abc");
    assert_eq!(notes.status(), SaveStatus::Saved);
    assert!(!notes.has_unsaved_changes());
    assert_eq!(notes.version(), Version::new(5));
}
