#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use classroom_core::model::{
    Annotation, AnnotationColor, AnnotationId, AnnotationReply, Answer, AnswerId, ArticleId,
    CollaborativeNote, GlossaryTerm, Identity, IdentityDraft, Interaction, NewAnnotation, NewReply, NoteKey,
    NoteSaved, NoteUpdate, ProgressAck, ProgressRecord, ProgressUpdate, Question, QuestionId,
    QuestionKind, Quiz, QuizId, QuizResult, QuizSubmission, ReactionAction, ReactionCounts,
    ReactionKind, ReactionToggle, SlideId, TimelineEvent, Version,
};
use services::{IdentityPrompt, RemoteError, RemoteStore, SubmitConfirm};

pub fn offline() -> RemoteError {
    RemoteError::HttpStatus(reqwest::StatusCode::SERVICE_UNAVAILABLE)
}

pub fn ada() -> Identity {
    IdentityDraft::new("Ada", "5A").validate().unwrap()
}

pub fn choice_question(id: u64, answers: &[u64]) -> Question {
    let answers = answers
        .iter()
        .map(|a| Answer {
            id: AnswerId::new(*a),
            text: format!("answer {a}"),
        })
        .collect();
    Question::new(
        QuestionId::new(id),
        format!("question {id}"),
        1,
        QuestionKind::MultipleChoice { answers },
    )
    .unwrap()
}

pub fn open_question(id: u64) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("question {id}"),
        2,
        QuestionKind::OpenEnded,
    )
    .unwrap()
}

pub fn quiz(time_limit: Option<u32>, questions: Vec<Question>) -> Quiz {
    Quiz::new(QuizId::new(7), "Ancient Rome", time_limit, 60, questions).unwrap()
}

/// In-memory backend recording every write it receives.
#[derive(Default)]
pub struct FakeRemote {
    pub quiz: Mutex<Option<Quiz>>,
    pub submissions: Mutex<Vec<QuizSubmission>>,
    pub fail_submit: AtomicBool,

    pub note: Mutex<CollaborativeNote>,
    pub note_fetches: AtomicUsize,
    pub note_updates: Mutex<Vec<(NoteUpdate, Instant)>>,
    /// Per-write latency; the write is applied after the delay elapses.
    pub note_delays: Mutex<VecDeque<Duration>>,
    pub fail_notes: AtomicBool,

    pub progress_updates: Mutex<Vec<ProgressUpdate>>,
    pub progress_records: Mutex<Vec<ProgressRecord>>,
    pub fail_progress: AtomicBool,

    pub annotations: Mutex<Vec<Annotation>>,
    pub added: Mutex<Vec<NewAnnotation>>,
    pub replies: Mutex<Vec<(AnnotationId, NewReply)>>,
    pub reactions: Mutex<ReactionCounts>,
    pub mine: Mutex<Vec<ReactionKind>>,
    pub interactions: Mutex<Vec<(Interaction, Instant)>>,
    pub fail_interactions: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl FakeRemote {
    pub fn with_quiz(quiz: Quiz) -> Self {
        let remote = Self::default();
        *remote.quiz.lock().unwrap() = Some(quiz);
        remote
    }

    pub fn submissions(&self) -> Vec<QuizSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn note_contents(&self) -> Vec<String> {
        self.note_updates
            .lock()
            .unwrap()
            .iter()
            .map(|(update, _)| update.content.clone())
            .collect()
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.interactions
            .lock()
            .unwrap()
            .iter()
            .map(|(event, _)| event.clone())
            .collect()
    }

    pub fn progress_updates(&self) -> Vec<ProgressUpdate> {
        self.progress_updates.lock().unwrap().clone()
    }

    fn reads(&self) -> Result<(), RemoteError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(offline())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for FakeRemote {
    async fn fetch_quiz(&self, _id: QuizId) -> Result<Quiz, RemoteError> {
        self.quiz.lock().unwrap().clone().ok_or_else(offline)
    }

    async fn submit_quiz(
        &self,
        _id: QuizId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, RemoteError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.submissions.lock().unwrap().push(submission.clone());
        let score = u32::try_from(submission.responses.len()).unwrap();
        Ok(QuizResult {
            score,
            max_score: 5,
            percentage: f64::from(score) * 20.0,
            passed: score >= 3,
            results: Vec::new(),
            attempt_id: Some(1),
        })
    }

    async fn fetch_note(&self, _key: &NoteKey) -> Result<CollaborativeNote, RemoteError> {
        self.note_fetches.fetch_add(1, Ordering::SeqCst);
        self.reads()?;
        Ok(self.note.lock().unwrap().clone())
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<NoteSaved, RemoteError> {
        if self.fail_notes.load(Ordering::SeqCst) {
            return Err(offline());
        }
        let delay = self.note_delays.lock().unwrap().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.note_updates
            .lock()
            .unwrap()
            .push((update.clone(), Instant::now()));
        let mut note = self.note.lock().unwrap();
        note.content = update.content.clone();
        note.version = Version::new(note.version.value() + 1);
        if !note.contributors.contains(&update.contributor) {
            note.contributors.push(update.contributor.clone());
        }
        Ok(NoteSaved {
            version: note.version,
            contributors: note.contributors.clone(),
            last_edited: None,
        })
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<ProgressAck, RemoteError> {
        if self.fail_progress.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.progress_updates.lock().unwrap().push(update.clone());
        Ok(ProgressAck {
            completion_percentage: update.completion_percentage,
            time_spent: update.time_increment,
        })
    }

    async fn fetch_progress(
        &self,
        _identity: &Identity,
    ) -> Result<Vec<ProgressRecord>, RemoteError> {
        self.reads()?;
        Ok(self.progress_records.lock().unwrap().clone())
    }

    async fn add_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation, RemoteError> {
        self.added.lock().unwrap().push(annotation.clone());
        let mut stored = self.annotations.lock().unwrap();
        let created = Annotation {
            id: AnnotationId::new(stored.len() as u64 + 1),
            student_name: annotation.student_name.clone(),
            note: annotation.note.clone(),
            x: annotation.x,
            y: annotation.y,
            color: annotation.color.clone(),
            created_at: None,
            replies_count: 0,
            likes_count: 0,
        };
        stored.push(created.clone());
        Ok(created)
    }

    async fn slide_annotations(
        &self,
        _slide: SlideId,
        _class_group: &str,
    ) -> Result<Vec<Annotation>, RemoteError> {
        self.reads()?;
        Ok(self.annotations.lock().unwrap().clone())
    }

    async fn like_annotation(&self, id: AnnotationId) -> Result<u64, RemoteError> {
        let mut stored = self.annotations.lock().unwrap();
        let annotation = stored
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(offline)?;
        annotation.likes_count += 1;
        Ok(annotation.likes_count)
    }

    async fn reply_annotation(
        &self,
        id: AnnotationId,
        reply: &NewReply,
    ) -> Result<AnnotationReply, RemoteError> {
        let mut replies = self.replies.lock().unwrap();
        replies.push((id, reply.clone()));
        Ok(AnnotationReply {
            id: replies.len() as u64,
            author_name: reply.author_name.clone(),
            content: reply.content.clone(),
            created_at: None,
        })
    }

    async fn reactions(&self, _article: &ArticleId) -> Result<ReactionCounts, RemoteError> {
        self.reads()?;
        Ok(*self.reactions.lock().unwrap())
    }

    async fn toggle_reaction(
        &self,
        _article: &ArticleId,
        kind: ReactionKind,
    ) -> Result<ReactionToggle, RemoteError> {
        let mut mine = self.mine.lock().unwrap();
        let mut counts = self.reactions.lock().unwrap();
        let current = counts.get(kind);
        let action = if let Some(pos) = mine.iter().position(|k| *k == kind) {
            mine.remove(pos);
            counts.set(kind, current.saturating_sub(1));
            ReactionAction::Removed
        } else {
            mine.push(kind);
            counts.set(kind, current + 1);
            ReactionAction::Added
        };
        Ok(ReactionToggle {
            action,
            count: counts.get(kind),
        })
    }

    async fn track_interaction(&self, interaction: &Interaction) -> Result<(), RemoteError> {
        if self.fail_interactions.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.interactions
            .lock()
            .unwrap()
            .push((interaction.clone(), Instant::now()));
        Ok(())
    }

    async fn glossary_terms(&self) -> Result<Vec<GlossaryTerm>, RemoteError> {
        self.reads()?;
        Ok(Vec::new())
    }

    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>, RemoteError> {
        self.reads()?;
        Ok(Vec::new())
    }
}

pub fn gold_draft(selection: &str, note: &str) -> classroom_core::model::AnnotationDraft {
    classroom_core::model::AnnotationDraft {
        selection: selection.into(),
        note: note.into(),
        color: AnnotationColor::Gold,
        ..Default::default()
    }
}

/// Answers the identity prompt with a fixed identity and counts how often it was asked.
#[derive(Default)]
pub struct ScriptedPrompt {
    pub answer: Option<(&'static str, &'static str)>,
    pub asked: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn answering(name: &'static str, group: &'static str) -> Self {
        Self {
            answer: Some((name, group)),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityPrompt for ScriptedPrompt {
    async fn ask(&self) -> Option<IdentityDraft> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.answer.map(|(name, group)| IdentityDraft::new(name, group))
    }
}

/// Records every confirmation request and answers with `accept`.
pub struct RecordingConfirm {
    pub accept: bool,
    pub asked: Vec<(usize, usize)>,
}

impl RecordingConfirm {
    pub fn answering(accept: bool) -> Self {
        Self {
            accept,
            asked: Vec::new(),
        }
    }
}

#[async_trait]
impl SubmitConfirm for RecordingConfirm {
    async fn confirm_incomplete(&mut self, answered: usize, total: usize) -> bool {
        self.asked.push((answered, total));
        self.accept
    }
}
