//! In-memory note collection with write-through persistence.
//!
//! The repository exclusively owns the authoritative collection for the
//! running session. Every mutation persists the full collection after the
//! in-memory state settles; persistence is best-effort (failures are
//! logged by the store helpers, never propagated).

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::domain::Note;
use crate::store::{self, KvStore};

/// Ordered note collection, most-recent-first.
pub struct Repository {
    notes: Mutex<Vec<Note>>,
    store: Arc<dyn KvStore>,
}

impl Repository {
    /// Load the persisted collection from the store
    pub async fn load(store: Arc<dyn KvStore>) -> Self {
        let notes = store::load_notes(store.as_ref()).await;
        Self {
            notes: Mutex::new(notes),
            store,
        }
    }

    /// Create a new note for a finished recording and insert it at the
    /// front of the collection.
    pub async fn create(&self, audio_uri: String, duration_ms: u64) -> Note {
        let note = Note::new(audio_uri, duration_ms);
        self.notes.lock().unwrap().insert(0, note.clone());
        self.persist().await;
        note
    }

    /// Apply a mutation to the note matching `id`.
    ///
    /// Returns false without persisting when the id is absent; a late
    /// completion for a deleted note is a harmless no-op.
    pub async fn update<F>(&self, id: Uuid, mutate: F) -> bool
    where
        F: FnOnce(&mut Note),
    {
        let applied = {
            let mut notes = self.notes.lock().unwrap();
            match notes.iter_mut().find(|n| n.id == id) {
                Some(note) => {
                    mutate(note);
                    true
                }
                None => false,
            }
        };

        if applied {
            self.persist().await;
        }
        applied
    }

    /// Remove the note matching `id`. Returns false when absent.
    pub async fn delete(&self, id: Uuid) -> bool {
        let removed = {
            let mut notes = self.notes.lock().unwrap();
            let before = notes.len();
            notes.retain(|n| n.id != id);
            notes.len() != before
        };

        if removed {
            self.persist().await;
        }
        removed
    }

    /// Snapshot of a single note
    pub fn get(&self, id: Uuid) -> Option<Note> {
        self.notes.lock().unwrap().iter().find(|n| n.id == id).cloned()
    }

    /// Snapshot of the full collection, most-recent-first
    pub fn list(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    /// Notes with outstanding or failed transcription work
    pub fn queued_count(&self) -> usize {
        self.notes.lock().unwrap().iter().filter(|n| n.is_queued()).count()
    }

    async fn persist(&self) {
        let snapshot = self.list();
        store::save_notes(self.store.as_ref(), &snapshot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TranscriptStatus;
    use crate::store::MemoryStore;

    async fn repo() -> Repository {
        Repository::load(Arc::new(MemoryStore::new())).await
    }

    #[tokio::test]
    async fn test_create_inserts_at_front() {
        let repo = repo().await;

        let first = repo.create("file:///a.m4a".to_string(), 1000).await;
        let second = repo.create("file:///b.m4a".to_string(), 2000).await;

        let notes = repo.list();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].id, second.id);
        assert_eq!(notes[1].id, first.id);
    }

    #[tokio::test]
    async fn test_update_missing_id_is_noop() {
        let repo = repo().await;
        repo.create("file:///a.m4a".to_string(), 0).await;

        let applied = repo
            .update(Uuid::new_v4(), |n| n.transcript = Some("ghost".to_string()))
            .await;

        assert!(!applied);
        assert!(repo.list()[0].transcript.is_none());
    }

    #[tokio::test]
    async fn test_mutations_write_through() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::load(Arc::clone(&store) as Arc<dyn KvStore>).await;

        let note = repo.create("file:///a.m4a".to_string(), 0).await;
        repo.update(note.id, |n| {
            n.transcript = Some("hello".to_string());
            n.transcript_status = TranscriptStatus::Done;
        })
        .await;

        // A fresh repository over the same store sees the persisted state
        let reloaded = Repository::load(store).await;
        let persisted = reloaded.get(note.id).unwrap();
        assert_eq!(persisted.transcript.as_deref(), Some("hello"));
        assert_eq!(persisted.transcript_status, TranscriptStatus::Done);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = Arc::new(MemoryStore::new());
        let repo = Repository::load(Arc::clone(&store) as Arc<dyn KvStore>).await;

        let note = repo.create("file:///a.m4a".to_string(), 0).await;
        assert!(repo.delete(note.id).await);
        assert!(!repo.delete(note.id).await);
        assert!(repo.get(note.id).is_none());

        let reloaded = Repository::load(store).await;
        assert!(reloaded.list().is_empty());
    }

    #[tokio::test]
    async fn test_queued_count() {
        let repo = repo().await;

        let a = repo.create("file:///a.m4a".to_string(), 0).await;
        let b = repo.create("file:///b.m4a".to_string(), 0).await;
        repo.create("file:///c.m4a".to_string(), 0).await;

        repo.update(a.id, |n| {
            n.transcript_status = TranscriptStatus::Error;
            n.needs_transcription = true;
        })
        .await;
        repo.update(b.id, |n| {
            n.transcript_status = TranscriptStatus::Done;
            n.transcript = Some("done".to_string());
        })
        .await;

        assert_eq!(repo.queued_count(), 1);
    }
}
