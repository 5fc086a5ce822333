//! Voice note record and transcription lifecycle status.
//!
//! Notes serialize with camelCase field names to match the persisted
//! `voicenotes_v1` JSON layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transcription lifecycle status of a note.
///
/// Queue decisions are driven by this status together with the
/// `needs_transcription` flag: a note can sit in `Error` with outstanding
/// work (`needs_transcription == true`), or in `Error` terminally after the
/// retry budget is exhausted (`needs_transcription == false`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptStatus {
    /// Transcription requested or in flight
    Pending,

    /// Transcript present
    Done,

    /// Last attempt failed
    Error,
}

/// One voice recording and its derived artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier, assigned at creation, never reused
    pub id: Uuid,

    /// Opaque reference (URI/path) to the recorded audio asset
    pub audio_uri: String,

    /// Recording duration in milliseconds; 0 if the recorder could not
    /// report one, correctable post-hoc via update
    pub duration_ms: u64,

    /// When the note was created
    pub created_at: DateTime<Utc>,

    /// Transcript text, set only on successful transcription; user-editable
    /// once present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Current transcription status
    pub transcript_status: TranscriptStatus,

    /// True while this note has outstanding transcription work
    #[serde(default)]
    pub needs_transcription: bool,

    /// Failed attempts since the last success or manual reset
    #[serde(default)]
    pub retry_count: u32,

    /// When the most recent attempt failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_retry_at: Option<DateTime<Utc>>,

    /// AI-generated summary, independent of transcript status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,

    /// AI-generated key points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_key_points: Option<Vec<String>>,

    /// AI-suggested title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_title_suggestion: Option<String>,
}

impl Note {
    /// Create a fresh note for a just-finished recording.
    ///
    /// Status starts as `Pending` with `needs_transcription = false`: the
    /// recording flow transcribes immediately, so there is no queued work
    /// yet.
    pub fn new(audio_uri: String, duration_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            audio_uri,
            duration_ms,
            created_at: Utc::now(),
            transcript: None,
            transcript_status: TranscriptStatus::Pending,
            needs_transcription: false,
            retry_count: 0,
            last_retry_at: None,
            ai_summary: None,
            ai_key_points: None,
            ai_title_suggestion: None,
        }
    }

    /// Whether this note counts toward the queued backlog
    pub fn is_queued(&self) -> bool {
        self.needs_transcription || self.transcript_status == TranscriptStatus::Error
    }
}

/// Result of an AI summary request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub summary: String,

    #[serde(default)]
    pub key_points: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_suggestion: Option<String>,
}
