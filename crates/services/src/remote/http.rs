use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use classroom_core::model::{
    Annotation, AnnotationId, AnnotationReply, ArticleId, CollaborativeNote, GlossaryTerm,
    Identity, Interaction, NewAnnotation, NewReply, NoteKey, NoteSaved, NoteUpdate, ProgressAck,
    ProgressRecord, ProgressUpdate, Quiz, QuizId, QuizResult, QuizSubmission, ReactionCounts,
    ReactionKind, ReactionToggle, SlideId, TimelineEvent,
};

use super::RemoteStore;
use crate::error::RemoteError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

impl RemoteConfig {
    /// # Errors
    ///
    /// Returns `url::ParseError` if `base_url` is not an absolute URL.
    pub fn new(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: normalize_base(base_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Reads `CLASSROOM_API_URL` and `CLASSROOM_API_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `url::ParseError` if the configured URL is invalid.
    pub fn from_env() -> Result<Self, url::ParseError> {
        let base_url =
            env::var("CLASSROOM_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout = env::var("CLASSROOM_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Ok(Self::new(&base_url)?.with_timeout(Duration::from_secs(timeout)))
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// `Url::join` drops the last segment unless the base ends with a slash.
fn normalize_base(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

/// `RemoteStore` over HTTP with JSON bodies.
#[derive(Clone)]
pub struct HttpRemoteStore {
    client: Client,
    config: RemoteConfig,
}

impl HttpRemoteStore {
    /// # Errors
    ///
    /// Returns `RemoteError::Http` if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        Ok(self.config.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RemoteError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T, RemoteError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    /// GET an envelope whose malformed body reads as empty rather than failing.
    async fn get_lenient<T: DeserializeOwned + Default>(&self, url: Url) -> Result<T, RemoteError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(RemoteError::HttpStatus(response.status()));
        }
        let bytes = response.bytes().await?;
        Ok(decode_lenient(&url, &bytes))
    }
}

fn decode_lenient<T: DeserializeOwned + Default>(url: &Url, bytes: &[u8]) -> T {
    serde_json::from_slice(bytes).unwrap_or_else(|err| {
        tracing::warn!(%url, error = %err, "malformed response, treating as empty");
        T::default()
    })
}

#[derive(Debug, Default, Deserialize)]
struct ProgressEnvelope {
    #[serde(default)]
    progress: Vec<ProgressRecord>,
}

#[derive(Debug, Default, Deserialize)]
struct AnnotationsEnvelope {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Default, Deserialize)]
struct ReactionsEnvelope {
    #[serde(default)]
    reactions: ReactionCounts,
}

#[derive(Debug, Default, Deserialize)]
struct GlossaryEnvelope {
    #[serde(default)]
    terms: Vec<GlossaryTerm>,
}

#[derive(Debug, Default, Deserialize)]
struct TimelineEnvelope {
    #[serde(default)]
    events: Vec<TimelineEvent>,
}

#[derive(Debug, Deserialize)]
struct LikeResponse {
    #[serde(default)]
    likes_count: u64,
}

#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    status: String,
}

#[derive(Debug, Serialize)]
struct ReactionRequest {
    #[serde(rename = "type")]
    kind: ReactionKind,
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn fetch_quiz(&self, id: QuizId) -> Result<Quiz, RemoteError> {
        let url = self.endpoint(&format!("api/quiz/{id}/"))?;
        self.get_json(url).await
    }

    async fn submit_quiz(
        &self,
        id: QuizId,
        submission: &QuizSubmission,
    ) -> Result<QuizResult, RemoteError> {
        let url = self.endpoint(&format!("api/quiz/{id}/submit/"))?;
        self.post_json(url, submission).await
    }

    async fn fetch_note(&self, key: &NoteKey) -> Result<CollaborativeNote, RemoteError> {
        let mut url = self.endpoint("api/notes/collaborative/get/")?;
        url.query_pairs_mut()
            .append_pair("article_id", key.article_id.as_str())
            .append_pair("class_group", &key.class_group);
        self.get_json(url).await
    }

    async fn update_note(&self, update: &NoteUpdate) -> Result<NoteSaved, RemoteError> {
        let url = self.endpoint("api/notes/collaborative/update/")?;
        self.post_json(url, update).await
    }

    async fn update_progress(&self, update: &ProgressUpdate) -> Result<ProgressAck, RemoteError> {
        let url = self.endpoint("api/progress/update/")?;
        self.post_json(url, update).await
    }

    async fn fetch_progress(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ProgressRecord>, RemoteError> {
        let mut url = self.endpoint("api/progress/get/")?;
        url.query_pairs_mut()
            .append_pair("student_name", identity.student_name())
            .append_pair("class_group", identity.class_group());
        let envelope: ProgressEnvelope = self.get_lenient(url).await?;
        Ok(envelope.progress)
    }

    async fn add_annotation(&self, annotation: &NewAnnotation) -> Result<Annotation, RemoteError> {
        let url = self.endpoint("api/annotations/add/")?;
        self.post_json(url, annotation).await
    }

    async fn slide_annotations(
        &self,
        slide: SlideId,
        class_group: &str,
    ) -> Result<Vec<Annotation>, RemoteError> {
        let mut url = self.endpoint(&format!("api/annotations/slide/{slide}/"))?;
        url.query_pairs_mut().append_pair("class_group", class_group);
        let envelope: AnnotationsEnvelope = self.get_lenient(url).await?;
        Ok(envelope.annotations)
    }

    async fn like_annotation(&self, id: AnnotationId) -> Result<u64, RemoteError> {
        let url = self.endpoint(&format!("api/annotations/{id}/like/"))?;
        let response: LikeResponse = self.post_json(url, &serde_json::json!({})).await?;
        Ok(response.likes_count)
    }

    async fn reply_annotation(
        &self,
        id: AnnotationId,
        reply: &NewReply,
    ) -> Result<AnnotationReply, RemoteError> {
        let url = self.endpoint(&format!("api/annotations/{id}/reply/"))?;
        self.post_json(url, reply).await
    }

    async fn reactions(&self, article: &ArticleId) -> Result<ReactionCounts, RemoteError> {
        let url = self.endpoint(&format!("api/articles/{article}/reactions/get/"))?;
        let envelope: ReactionsEnvelope = self.get_lenient(url).await?;
        Ok(envelope.reactions)
    }

    async fn toggle_reaction(
        &self,
        article: &ArticleId,
        kind: ReactionKind,
    ) -> Result<ReactionToggle, RemoteError> {
        let url = self.endpoint(&format!("api/articles/{article}/reactions/"))?;
        self.post_json(url, &ReactionRequest { kind }).await
    }

    async fn track_interaction(&self, interaction: &Interaction) -> Result<(), RemoteError> {
        let url = self.endpoint("api/interactions/track/")?;
        let response: TrackResponse = self.post_json(url, interaction).await?;
        tracing::trace!(status = %response.status, kind = ?interaction.kind, "interaction tracked");
        Ok(())
    }

    async fn glossary_terms(&self) -> Result<Vec<GlossaryTerm>, RemoteError> {
        let url = self.endpoint("api/glossary/terms/")?;
        let envelope: GlossaryEnvelope = self.get_lenient(url).await?;
        Ok(envelope.terms)
    }

    async fn timeline_events(&self) -> Result<Vec<TimelineEvent>, RemoteError> {
        let url = self.endpoint("api/timeline/events/")?;
        let envelope: TimelineEnvelope = self.get_lenient(url).await?;
        Ok(envelope.events)
    }
}
