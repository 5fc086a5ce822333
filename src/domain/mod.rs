//! Domain types for the memovox engine.
//!
//! This module contains the core data structures:
//! - Note: A voice recording and its derived artifacts
//! - TranscriptStatus: Lifecycle status of a note's transcription
//! - Settings: Persisted app settings
//! - Notice: User-visible advisories emitted by the background queue

pub mod note;
pub mod notice;
pub mod settings;

// Re-export commonly used types
pub use note::{Note, Summary, TranscriptStatus};
pub use notice::Notice;
pub use settings::Settings;
