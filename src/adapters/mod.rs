//! Adapter interfaces for external systems.
//!
//! The transcription backend is the only remote collaborator: a plain
//! JSON-over-HTTP service with a multipart `/transcribe` upload and a JSON
//! `/summarize` endpoint. The `TranscribeApi` trait is the seam the notes
//! core consumes; tests substitute a scripted implementation.

pub mod backend;

pub use backend::{ApiError, BackendClient, Transcript, TranscribeApi};
