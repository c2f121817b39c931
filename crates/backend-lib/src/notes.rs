// ============================
// notes-backend-lib/src/notes.rs
// ============================
//! Note operations scoped to the authenticated owner.
//!
//! Every lookup goes through [`NoteService::owned`], so a note that belongs
//! to someone else behaves exactly like a note that does not exist: reads
//! return nothing and writes have no effect.
use metrics::counter;
use notes_common::{NoteId, UserId};
use tracing::{debug, info, instrument};

use crate::error::AppError;
use crate::metrics::{NOTE_CREATED, NOTE_DELETED, NOTE_UPDATED};
use crate::models::{NewNote, Note, NotePatch};
use crate::storage::NoteStore;

#[derive(Clone)]
pub struct NoteService<S> {
    store: S,
}

impl<S: NoteStore> NoteService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn owned(&self, owner: UserId, id: NoteId) -> Result<Option<Note>, AppError> {
        let note = self.store.find_note(id).await?;
        Ok(note.filter(|n| n.is_owned_by(owner)))
    }

    /// All notes of `owner`
    pub async fn list(&self, owner: UserId) -> Result<Vec<Note>, AppError> {
        Ok(self.store.list_notes(owner).await?)
    }

    /// The note if `owner` owns it
    pub async fn get(&self, owner: UserId, id: NoteId) -> Result<Option<Note>, AppError> {
        self.owned(owner, id).await
    }

    #[instrument(skip(self, new))]
    pub async fn create(&self, owner: UserId, new: NewNote) -> Result<Note, AppError> {
        let note = self.store.create_note(owner, new).await?;
        counter!(NOTE_CREATED).increment(1);
        info!(note_id = note.id, "note created");
        Ok(note)
    }

    /// Partial update, applied only when `owner` owns the note
    #[instrument(skip(self, patch))]
    pub async fn edit(
        &self,
        owner: UserId,
        id: NoteId,
        patch: NotePatch,
    ) -> Result<Option<Note>, AppError> {
        let Some(note) = self.owned(owner, id).await? else {
            debug!("edit ignored, note not owned by caller");
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(note));
        }

        let updated = self.store.update_note(note.id, patch).await?;
        counter!(NOTE_UPDATED).increment(1);
        Ok(updated)
    }

    /// Remove the note when `owner` owns it. Returns whether anything was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, owner: UserId, id: NoteId) -> Result<bool, AppError> {
        if self.owned(owner, id).await?.is_none() {
            debug!("delete ignored, note not owned by caller");
            return Ok(false);
        }

        let deleted = self.store.delete_note(id).await?;
        if deleted {
            counter!(NOTE_DELETED).increment(1);
            info!("note deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::storage::{MemoryStorage, UserStore};

    async fn setup() -> (NoteService<MemoryStorage>, UserId, UserId) {
        let store = MemoryStorage::new();
        let mut ids = Vec::new();
        for email in ["a@notes.io", "b@notes.io"] {
            let user = store
                .create_user(NewUser {
                    email: email.to_string(),
                    hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (NoteService::new(store), ids[0], ids[1])
    }

    fn note(title: &str, description: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            description: Some(description.to_string()),
        }
    }

    #[tokio::test]
    async fn test_notes_are_invisible_to_other_users() {
        let (service, alice, bob) = setup().await;
        let created = service.create(alice, note("foo note", "baz note")).await.unwrap();
        assert_eq!(created.user_id, alice);

        assert_eq!(service.list(alice).await.unwrap(), vec![created.clone()]);
        assert!(service.list(bob).await.unwrap().is_empty());

        assert_eq!(service.get(alice, created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(service.get(bob, created.id).await.unwrap(), None);
        assert_eq!(service.get(alice, 999).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_edit_by_non_owner_has_no_effect() {
        let (service, alice, bob) = setup().await;
        let created = service.create(alice, note("foo note", "baz note")).await.unwrap();

        let patch = NotePatch {
            title: Some("hijacked".to_string()),
            description: None,
        };
        assert_eq!(service.edit(bob, created.id, patch.clone()).await.unwrap(), None);
        let unchanged = service.get(alice, created.id).await.unwrap().unwrap();
        assert_eq!(unchanged.title, "foo note");

        let edited = service.edit(alice, created.id, patch).await.unwrap().unwrap();
        assert_eq!(edited.title, "hijacked");
        assert_eq!(edited.description.as_deref(), Some("baz note"));
    }

    #[tokio::test]
    async fn test_empty_patch_returns_note_unchanged() {
        let (service, alice, _) = setup().await;
        let created = service.create(alice, note("foo note", "baz note")).await.unwrap();
        let same = service
            .edit(alice, created.id, NotePatch::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_has_no_effect() {
        let (service, alice, bob) = setup().await;
        let created = service.create(alice, note("foo note", "baz note")).await.unwrap();

        assert!(!service.delete(bob, created.id).await.unwrap());
        assert!(service.get(alice, created.id).await.unwrap().is_some());

        assert!(service.delete(alice, created.id).await.unwrap());
        assert!(service.get(alice, created.id).await.unwrap().is_none());
        // deleting again is harmless
        assert!(!service.delete(alice, created.id).await.unwrap());
    }
}
