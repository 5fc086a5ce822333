//! User-visible advisories from the background transcription queue.
//!
//! Failures on asynchronous paths (scheduled retries) have no caller to
//! return a `Result` to; they surface through a notice channel instead.

use uuid::Uuid;

/// An advisory intended for the user, emitted by the queue processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A fresh (non-retry) attempt failed and its failure count reached the
    /// retry cap outright
    WillRetryAutomatically { id: Uuid, message: String },

    /// A scheduled retry exhausted the retry budget, or found it already
    /// exhausted; the note is terminally failed until a manual retry
    MaxRetriesReached { id: Uuid },
}
