mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use classroom_core::model::{
    AnnotationError, AnnotationId, ArticleId, Completion, IdentityDraft, InteractionKind,
    ProgressRecord,
    ReactionAction, ReactionCounts, ReactionKind, ScrollPosition, SlideId,
};
use classroom_core::time::{fixed_clock, fixed_now};
use services::{AppServices, Clock, PROGRESS_FLUSH_INTERVAL, SCROLL_DEBOUNCE, TrackerError};
use storage::repository::Storage;

use common::{FakeRemote, ScriptedPrompt, gold_draft};

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

fn scrolled(top: f64) -> ScrollPosition {
    ScrollPosition {
        scroll_top: top,
        viewport_height: 1_000.0,
        document_height: 3_000.0,
    }
}

fn at(seconds: i64) -> Clock {
    Clock::fixed(fixed_now() + ChronoDuration::seconds(seconds))
}

#[tokio::test]
async fn progress_reports_time_since_last_successful_send() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let meter = services.progress(ArticleId::new("rome"));

    meter.record_scroll(scrolled(500.0));
    meter.set_clock(at(40));
    meter.flush().await.unwrap();

    remote.fail_progress.store(true, Ordering::SeqCst);
    meter.record_scroll(scrolled(2_000.0));
    meter.set_clock(at(70));
    assert!(matches!(meter.flush().await, Err(TrackerError::Remote(_))));

    remote.fail_progress.store(false, Ordering::SeqCst);
    meter.set_clock(at(75));
    meter.flush().await.unwrap();

    let updates = remote.progress_updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].time_increment, 40);
    assert_eq!(updates[0].completion_percentage, Completion::new(25.0));
    assert_eq!(updates[1].time_increment, 35);
    assert_eq!(updates[1].completion_percentage, Completion::new(100.0));
    assert_eq!(updates[1].article_id, ArticleId::new("rome"));
    assert_eq!(updates[1].class_group, "5A");
}

#[tokio::test]
async fn progress_is_not_sent_anonymously() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let meter = services.progress(ArticleId::new("rome"));
    meter.record_scroll(scrolled(100.0));
    assert_eq!(meter.flush().await.unwrap(), None);
    assert!(remote.progress_updates().is_empty());
    assert_eq!(meter.load().await, None);
}

#[tokio::test(start_paused = true)]
async fn periodic_flush_runs_until_stopped() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let meter = services.progress(ArticleId::new("rome"));
    let ticker = meter.spawn_periodic(PROGRESS_FLUSH_INTERVAL);

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(remote.progress_updates().is_empty());
    tokio::time::sleep(Duration::from_secs(32)).await;
    assert_eq!(remote.progress_updates().len(), 2);

    ticker.stop();
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(remote.progress_updates().len(), 2);

    meter.close().await;
    assert_eq!(remote.progress_updates().len(), 3);
}

#[tokio::test]
async fn progress_load_picks_this_article() {
    let remote = Arc::new(FakeRemote::default());
    *remote.progress_records.lock().unwrap() = vec![
        ProgressRecord {
            article_id: ArticleId::new("greece"),
            article_title: "Greece".into(),
            completion: Completion::new(10.0),
            time_spent: 5,
            last_accessed: None,
        },
        ProgressRecord {
            article_id: ArticleId::new("rome"),
            article_title: "Rome".into(),
            completion: Completion::new(80.0),
            time_spent: 300,
            last_accessed: None,
        },
    ];
    let services = signed_in(&remote).await;
    let meter = services.progress(ArticleId::new("rome"));
    assert_eq!(meter.load().await.unwrap().time_spent, 300);

    remote.fail_reads.store(true, Ordering::SeqCst);
    assert_eq!(meter.load().await, None);
}

#[tokio::test]
async fn reactions_follow_the_server() {
    let remote = Arc::new(FakeRemote::default());
    *remote.reactions.lock().unwrap() = ReactionCounts {
        heart: 2,
        ..ReactionCounts::default()
    };
    let services = services_with(&remote).await;
    let mut reactions = services.reactions(ArticleId::new("rome"));
    assert_eq!(reactions.load().await.heart, 2);

    let toggle = reactions.toggle(ReactionKind::Heart).await.unwrap();
    assert_eq!(toggle.action, ReactionAction::Added);
    assert_eq!(reactions.counts().heart, 3);
    assert!(reactions.is_active(ReactionKind::Heart));

    let toggle = reactions.toggle(ReactionKind::Heart).await.unwrap();
    assert_eq!(toggle.action, ReactionAction::Removed);
    assert_eq!(reactions.counts().heart, 2);
    assert!(!reactions.is_active(ReactionKind::Heart));
}

#[tokio::test]
async fn unreachable_reactions_read_as_zero() {
    let remote = Arc::new(FakeRemote::default());
    remote.fail_reads.store(true, Ordering::SeqCst);
    let services = services_with(&remote).await;
    let mut reactions = services.reactions(ArticleId::new("rome"));
    assert_eq!(reactions.load().await, ReactionCounts::default());
}

#[tokio::test]
async fn annotation_prompts_for_identity_once() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let mut board = services.annotations(SlideId::new(3));
    assert!(board.load().await.is_empty());

    let prompt = ScriptedPrompt::answering("Ada", "5A");
    let err = board
        .add(gold_draft("Senate", "  "), &prompt)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackerError::Annotation(AnnotationError::EmptyNote)));
    assert_eq!(prompt.asked(), 0);

    let first = board
        .add(gold_draft("Senate", "who sat here?"), &prompt)
        .await
        .unwrap();
    board
        .add(gold_draft("Forum", "markets"), &prompt)
        .await
        .unwrap();
    assert_eq!(prompt.asked(), 1);
    assert_eq!(board.annotations().len(), 2);

    let added = remote.added.lock().unwrap().clone();
    assert_eq!(added[0].slide_id, SlideId::new(3));
    assert_eq!(added[0].class_group, "5A");
    assert_eq!(first.student_name, "Ada");
}

#[tokio::test]
async fn likes_and_replies_update_the_board() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let mut board = services.annotations(SlideId::new(3));
    let prompt = ScriptedPrompt::default();
    let created = board
        .add(gold_draft("Senate", "who sat here?"), &prompt)
        .await
        .unwrap();

    assert_eq!(board.like(created.id).await.unwrap(), 1);
    assert_eq!(board.annotations()[0].likes_count, 1);

    let reply = board.reply(created.id, "the senators", &prompt).await.unwrap();
    assert_eq!(reply.author_name, "Ada");
    assert_eq!(board.annotations()[0].replies_count, 1);

    assert!(matches!(
        board.reply(created.id, " ", &prompt).await,
        Err(TrackerError::Annotation(AnnotationError::EmptyReply))
    ));
    assert!(board.like(AnnotationId::new(99)).await.is_err());
    assert_eq!(prompt.asked(), 0);
}

#[tokio::test]
async fn unreachable_board_reads_as_empty() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let prompt = ScriptedPrompt::default();
    let mut board = services.annotations(SlideId::new(3));
    board
        .add(gold_draft("Senate", "note"), &prompt)
        .await
        .unwrap();

    remote.fail_reads.store(true, Ordering::SeqCst);
    assert!(board.load().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn scrolling_reports_only_the_settled_depth() {
    let remote = Arc::new(FakeRemote::default());
    let services = signed_in(&remote).await;
    let tracker = services.interactions(ArticleId::new("rome"));
    let start = tokio::time::Instant::now();

    for top in [120.0, 480.0, 812.4] {
        tracker.record_scroll(top);
        tokio::time::sleep(Duration::from_millis(300)).await;
    }
    assert!(remote.interactions().is_empty());

    tokio::time::sleep(SCROLL_DEBOUNCE).await;
    let sent = remote.interactions.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0.kind, InteractionKind::Scroll);
    assert_eq!(sent[0].0.element, "depth-812");
    assert_eq!(sent[0].0.student_name, "Ada");
    assert_eq!(sent[0].1 - start, Duration::from_millis(1_600));
}

#[tokio::test(start_paused = true)]
async fn clicks_go_out_at_once_even_for_anonymous_readers() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let tracker = services.interactions(ArticleId::new("rome"));

    tracker.click("pdf-button").await;
    let sent = remote.interactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, InteractionKind::Click);
    assert_eq!(sent[0].element, "pdf-button");
    assert_eq!(sent[0].student_name, "");

    remote.fail_interactions.store(true, Ordering::SeqCst);
    tracker.click("card-link").await;
    assert_eq!(remote.interactions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_tracker_discards_a_pending_scroll() {
    let remote = Arc::new(FakeRemote::default());
    let services = services_with(&remote).await;
    let tracker = services.interactions(ArticleId::new("rome"));

    tracker.record_scroll(300.0);
    drop(tracker);
    tokio::time::sleep(SCROLL_DEBOUNCE * 3).await;
    assert!(remote.interactions().is_empty());
}
