//! Transcription queue processor.
//!
//! `NoteService` composes the repository, retry scheduler, and backend
//! client, and owns the lifecycle of a note from "just recorded" through
//! "transcribed, summarized, or permanently failed".
//!
//! Ordering rests on two invariants: at most one attempt is in flight per
//! note (queued selection skips `Pending` notes, and the scheduler keeps a
//! single timer per id), and the drain flag keeps at most one backlog drain
//! running. Mutations all funnel through the repository, so a note deleted
//! mid-upload turns the late completion into a no-op.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::adapters::{ApiError, TranscribeApi};
use crate::domain::{Note, Notice, Summary, TranscriptStatus};
use crate::store::KvStore;

use super::repository::Repository;
use super::scheduler::{RetryPolicy, RetryScheduler, RetryTask};

/// Errors surfaced by the notes service
#[derive(Debug, Error)]
pub enum NotesError {
    #[error("Note not found: {0}")]
    NotFound(Uuid),

    #[error("No transcript. Record and transcribe first.")]
    NoTranscript,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Notes engine: repository + scheduler + backend, one instance per app.
#[derive(Clone)]
pub struct NoteService {
    inner: Arc<Inner>,
}

struct Inner {
    repo: Repository,
    scheduler: RetryScheduler,
    api: Arc<dyn TranscribeApi>,
    policy: RetryPolicy,
    notices: UnboundedSender<Notice>,
    draining: AtomicBool,
}

/// Clears the drain flag on every exit path, including early returns
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl NoteService {
    /// Load the persisted collection and assemble the service.
    ///
    /// Returns the service together with the receiving end of the notice
    /// channel; advisories from background retries arrive there.
    pub async fn load(
        store: Arc<dyn KvStore>,
        api: Arc<dyn TranscribeApi>,
        policy: RetryPolicy,
    ) -> (Self, UnboundedReceiver<Notice>) {
        let repo = Repository::load(store).await;
        let (notices, rx) = mpsc::unbounded_channel();

        let service = Self {
            inner: Arc::new(Inner {
                repo,
                scheduler: RetryScheduler::new(),
                api,
                policy,
                notices,
                draining: AtomicBool::new(false),
            }),
        };
        (service, rx)
    }

    /// Snapshot of the full collection, most-recent-first
    pub fn notes(&self) -> Vec<Note> {
        self.inner.repo.list()
    }

    /// Snapshot of a single note
    pub fn get(&self, id: Uuid) -> Option<Note> {
        self.inner.repo.get(id)
    }

    /// Notes with outstanding or failed transcription work
    pub fn queued_count(&self) -> usize {
        self.inner.repo.queued_count()
    }

    /// Create a note for a finished recording. The caller is expected to
    /// start transcription right after, which is why the note is born with
    /// `needs_transcription = false`.
    pub async fn create(&self, audio_uri: impl Into<String>, duration_ms: u64) -> Note {
        self.inner.repo.create(audio_uri.into(), duration_ms).await
    }

    /// Apply a mutation to a note (transcript edits, duration corrections).
    /// No-op returning false when the id is absent.
    pub async fn update<F>(&self, id: Uuid, mutate: F) -> bool
    where
        F: FnOnce(&mut Note),
    {
        self.inner.repo.update(id, mutate).await
    }

    /// Delete a note, cancelling any armed retry timer for it.
    ///
    /// An upload already in flight is not cancelled; its completion lands
    /// on the missing id and does nothing.
    pub async fn delete(&self, id: Uuid) -> bool {
        self.inner.scheduler.cancel(id);
        self.inner.repo.delete(id).await
    }

    /// Drive one note through a transcription attempt.
    ///
    /// `is_retry` marks attempts that logically follow earlier failures
    /// (scheduled retries and queue drains); those check the retry cap
    /// before doing any work. Fresh attempts always get a full try.
    pub fn transcribe(
        &self,
        id: Uuid,
        audio_uri: impl Into<String>,
        is_retry: bool,
    ) -> RetryTask {
        let service = self.clone();
        let audio_uri = audio_uri.into();
        Box::pin(async move { service.attempt(id, audio_uri, is_retry).await })
    }

    async fn attempt(&self, id: Uuid, audio_uri: String, is_retry: bool) {
        debug!("Transcribing note {} (retry: {})", id, is_retry);

        let mut retry_count = 0;
        if is_retry {
            // The note may have been deleted while the timer was pending
            let Some(note) = self.inner.repo.get(id) else {
                debug!("Note {} gone before retry, skipping", id);
                return;
            };

            retry_count = note.retry_count;
            if retry_count >= self.inner.policy.max_attempts {
                info!("Max retries reached for note {}", id);
                self.inner
                    .repo
                    .update(id, |n| {
                        n.transcript_status = TranscriptStatus::Error;
                        n.needs_transcription = false;
                    })
                    .await;
                let _ = self.inner.notices.send(Notice::MaxRetriesReached { id });
                return;
            }
        }

        self.inner
            .repo
            .update(id, |n| n.transcript_status = TranscriptStatus::Pending)
            .await;

        match self.inner.api.upload(&audio_uri).await {
            Ok(result) => {
                info!(
                    "Transcription succeeded for note {} ({} chars)",
                    id,
                    result.transcript.len()
                );
                self.inner
                    .repo
                    .update(id, |n| {
                        n.transcript = Some(result.transcript);
                        n.transcript_status = TranscriptStatus::Done;
                        n.needs_transcription = false;
                        n.retry_count = 0;
                    })
                    .await;
            }
            Err(e) => {
                warn!("Transcription failed for note {}: {}", id, e);

                // A scheduled retry that exhausts the budget fails the
                // note terminally; a fresh attempt doing the same only
                // gets an advisory and stays queued (the cap check on the
                // next scheduled pass makes it terminal).
                let new_count = retry_count + 1;
                let exhausted = new_count >= self.inner.policy.max_attempts;
                let terminal = exhausted && is_retry;

                self.inner
                    .repo
                    .update(id, |n| {
                        n.transcript_status = TranscriptStatus::Error;
                        n.retry_count = new_count;
                        n.last_retry_at = Some(Utc::now());
                        n.needs_transcription = !terminal;
                    })
                    .await;

                if !exhausted {
                    let delay = self.inner.policy.delay_for(new_count);
                    debug!(
                        "Scheduling retry for note {} in {:?} (attempt {})",
                        id,
                        delay,
                        new_count + 1
                    );
                    self.inner
                        .scheduler
                        .arm(id, delay, self.transcribe(id, audio_uri, true));
                } else if terminal {
                    info!("Retry budget exhausted for note {}", id);
                    let _ = self.inner.notices.send(Notice::MaxRetriesReached { id });
                } else {
                    let _ = self.inner.notices.send(Notice::WillRetryAutomatically {
                        id,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    /// Drain every note with outstanding transcription work, sequentially.
    ///
    /// At most one drain runs at a time; a call while another drain is in
    /// progress is a no-op returning 0. Notes already mid-flight
    /// (`Pending`) are skipped. Returns the number of attempts made.
    pub async fn drain_queue(&self) -> usize {
        if self
            .inner
            .draining
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Queue already draining, skipping");
            return 0;
        }
        let _guard = DrainGuard(&self.inner.draining);

        let queued: Vec<Note> = self
            .inner
            .repo
            .list()
            .into_iter()
            .filter(|n| {
                n.needs_transcription && n.transcript_status != TranscriptStatus::Pending
            })
            .collect();

        info!("Draining {} queued transcription(s)", queued.len());

        let mut processed = 0;
        for note in queued {
            self.transcribe(note.id, note.audio_uri, true).await;
            processed += 1;
            // Pause between uploads to avoid bursting the backend
            tokio::time::sleep(self.inner.policy.queue_gap).await;
        }

        debug!("Queue drain complete ({} attempted)", processed);
        processed
    }

    /// Manual retry: always gets at least one more full attempt, even when
    /// the note already sits at the retry cap.
    pub async fn retry(&self, id: Uuid) -> Result<(), NotesError> {
        let note = self.inner.repo.get(id).ok_or(NotesError::NotFound(id))?;

        self.inner.scheduler.cancel(id);
        self.inner.repo.update(id, |n| n.retry_count = 0).await;
        self.transcribe(id, note.audio_uri, false).await;
        Ok(())
    }

    /// Request an AI summary for a transcribed note.
    ///
    /// Rejected before any network call when no transcript is present. On
    /// failure the note is left untouched; summaries are re-triggerable at
    /// will and never consume transcription retry budget.
    pub async fn summarize(&self, id: Uuid) -> Result<Summary, NotesError> {
        let note = self.inner.repo.get(id).ok_or(NotesError::NotFound(id))?;

        let transcript = note
            .transcript
            .filter(|t| !t.trim().is_empty())
            .ok_or(NotesError::NoTranscript)?;

        let summary = self.inner.api.summarize(&transcript).await?;

        self.inner
            .repo
            .update(id, |n| {
                n.ai_summary = Some(summary.summary.clone());
                n.ai_key_points = Some(summary.key_points.clone());
                n.ai_title_suggestion = summary.title_suggestion.clone();
            })
            .await;

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::Transcript;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Backend double that fails every upload and counts calls
    struct CountingApi {
        uploads: AtomicU32,
        summaries: AtomicU32,
    }

    impl CountingApi {
        fn new() -> Self {
            Self {
                uploads: AtomicU32::new(0),
                summaries: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl TranscribeApi for CountingApi {
        async fn upload(&self, _audio_uri: &str) -> Result<Transcript, ApiError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Http {
                status: 500,
                message: "boom".to_string(),
            })
        }

        async fn summarize(&self, _transcript: &str) -> Result<Summary, ApiError> {
            self.summaries.fetch_add(1, Ordering::SeqCst);
            Ok(Summary {
                summary: "recap".to_string(),
                key_points: vec!["one".to_string()],
                title_suggestion: Some("Title".to_string()),
            })
        }
    }

    async fn service() -> (NoteService, Arc<CountingApi>) {
        let api = Arc::new(CountingApi::new());
        let (service, _notices) = NoteService::load(
            Arc::new(MemoryStore::new()),
            Arc::clone(&api) as Arc<dyn TranscribeApi>,
            RetryPolicy::default(),
        )
        .await;
        (service, api)
    }

    #[tokio::test]
    async fn test_summarize_without_transcript_makes_no_call() {
        let (service, api) = service().await;
        let note = service.create("file:///a.m4a", 1000).await;

        let err = service.summarize(note.id).await.unwrap_err();
        assert!(matches!(err, NotesError::NoTranscript));

        // Whitespace-only transcripts are also rejected
        service
            .update(note.id, |n| n.transcript = Some("   ".to_string()))
            .await;
        let err = service.summarize(note.id).await.unwrap_err();
        assert!(matches!(err, NotesError::NoTranscript));

        assert_eq!(api.summaries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_stores_ai_fields() {
        let (service, api) = service().await;
        let note = service.create("file:///a.m4a", 1000).await;
        service
            .update(note.id, |n| n.transcript = Some("hello world".to_string()))
            .await;

        let summary = service.summarize(note.id).await.unwrap();
        assert_eq!(summary.summary, "recap");
        assert_eq!(api.summaries.load(Ordering::SeqCst), 1);

        let stored = service.get(note.id).unwrap();
        assert_eq!(stored.ai_summary.as_deref(), Some("recap"));
        assert_eq!(stored.ai_key_points.as_deref(), Some(&["one".to_string()][..]));
        assert_eq!(stored.ai_title_suggestion.as_deref(), Some("Title"));
        // Transcription state is untouched by summaries
        assert_eq!(stored.retry_count, 0);
    }

    #[tokio::test]
    async fn test_summarize_missing_note() {
        let (service, _) = service().await;
        let err = service.summarize(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NotesError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_retry_missing_note() {
        let (service, api) = service().await;
        let err = service.retry(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, NotesError::NotFound(_)));
        assert_eq!(api.uploads.load(Ordering::SeqCst), 0);
    }
}
