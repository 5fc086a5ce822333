//! Notes core: repository, retry scheduler, and queue processor.
//!
//! The pieces compose into a `NoteService`:
//!
//! ```text
//! recorder stop ──▶ Repository.create ──▶ transcribe ──▶ backend
//!                        │                    │ failure
//!                        ▼                    ▼
//!                     KvStore          RetryScheduler ──(backoff)──▶ transcribe
//! ```
//!
//! All queue state (timer map, drain flag) lives on the service instance;
//! there are no module-level singletons, so tests can run independent
//! services side by side.

pub mod repository;
pub mod scheduler;
pub mod service;

pub use repository::Repository;
pub use scheduler::{RetryPolicy, RetryScheduler};
pub use service::{NoteService, NotesError};
