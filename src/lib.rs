//! memovox - voice memo engine with a durable transcription queue
//!
//! Records are created by a recording flow, persisted locally, uploaded to
//! a remote transcription backend, and optionally enriched with an
//! AI-generated summary. The core of the crate is the transcription queue
//! and retry subsystem: it owns the lifecycle of a note from "just
//! recorded" through "transcribed, summarized, or permanently failed",
//! coordinates background retries with table-based exponential backoff,
//! deduplicates concurrent processing, and persists every state transition.
//!
//! # Architecture
//!
//! - Mutations flow through one repository that writes the full collection
//!   through to a key-value store on every change
//! - Failed uploads arm per-note retry timers (2s / 5s / 10s, capped at 3
//!   attempts); exhausting the cap fails the note terminally until a
//!   manual retry
//! - A reentrancy-guarded drain processes the whole backlog sequentially
//!
//! # Modules
//!
//! - `adapters`: Transcription backend HTTP client
//! - `domain`: Data structures (Note, Settings, Notice)
//! - `notes`: Repository, retry scheduler, queue processor
//! - `store`: Durable key-value persistence
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Import a recording and transcribe it
//! memovox import recording.m4a --duration-ms 4200
//!
//! # Drain queued/failed transcriptions
//! memovox process
//!
//! # Retry a terminally failed note
//! memovox retry <note-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod notes;
pub mod store;

// Re-export main types at crate root for convenience
pub use adapters::{ApiError, BackendClient, TranscribeApi, Transcript};
pub use domain::{Note, Notice, Settings, Summary, TranscriptStatus};
pub use notes::{NoteService, NotesError, Repository, RetryPolicy, RetryScheduler};
pub use store::{FileStore, KvStore, MemoryStore, StoreError};
