//! Shared test doubles for queue integration tests.

// Each integration test crate compiles this module separately and uses a
// different subset of it.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::Notify;

use memovox::{
    ApiError, KvStore, MemoryStore, NoteService, Notice, RetryPolicy, Summary, TranscribeApi,
    Transcript,
};

/// One scripted response for an upload call
pub enum UploadStep {
    /// Succeed with this transcript
    Ok(&'static str),

    /// Fail with this HTTP status and message
    Fail(u16, &'static str),

    /// Succeed, but only after the gate is released (simulates an upload
    /// in flight)
    OkAfterGate(Arc<Notify>, &'static str),
}

/// Backend double that replays a script of upload responses.
///
/// Unscripted uploads fail with a 500 so a test that under-scripts shows
/// up as extra failed attempts rather than a hang.
pub struct ScriptedApi {
    uploads: Mutex<VecDeque<UploadStep>>,
    pub upload_calls: AtomicU32,
    pub summarize_calls: AtomicU32,
}

impl ScriptedApi {
    pub fn new(steps: Vec<UploadStep>) -> Self {
        Self {
            uploads: Mutex::new(steps.into()),
            upload_calls: AtomicU32::new(0),
            summarize_calls: AtomicU32::new(0),
        }
    }

    pub fn upload_count(&self) -> u32 {
        self.upload_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscribeApi for ScriptedApi {
    async fn upload(&self, _audio_uri: &str) -> Result<Transcript, ApiError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);

        let step = self.uploads.lock().unwrap().pop_front();
        match step {
            Some(UploadStep::Ok(transcript)) => Ok(Transcript {
                transcript: transcript.to_string(),
            }),
            Some(UploadStep::Fail(status, message)) => Err(ApiError::Http {
                status,
                message: message.to_string(),
            }),
            Some(UploadStep::OkAfterGate(gate, transcript)) => {
                gate.notified().await;
                Ok(Transcript {
                    transcript: transcript.to_string(),
                })
            }
            None => Err(ApiError::Http {
                status: 500,
                message: "unscripted upload".to_string(),
            }),
        }
    }

    async fn summarize(&self, _transcript: &str) -> Result<Summary, ApiError> {
        self.summarize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Summary {
            summary: "scripted summary".to_string(),
            key_points: vec!["point".to_string()],
            title_suggestion: None,
        })
    }
}

/// Service over an in-memory store with the default retry policy
pub async fn scripted_service(
    steps: Vec<UploadStep>,
) -> (NoteService, Arc<ScriptedApi>, UnboundedReceiver<Notice>) {
    scripted_service_with_policy(steps, RetryPolicy::default()).await
}

/// Service over an in-memory store with a custom retry policy
pub async fn scripted_service_with_policy(
    steps: Vec<UploadStep>,
    policy: RetryPolicy,
) -> (NoteService, Arc<ScriptedApi>, UnboundedReceiver<Notice>) {
    let api = Arc::new(ScriptedApi::new(steps));
    let (service, notices) = NoteService::load(
        Arc::new(MemoryStore::new()) as Arc<dyn KvStore>,
        Arc::clone(&api) as Arc<dyn TranscribeApi>,
        policy,
    )
    .await;
    (service, api, notices)
}
