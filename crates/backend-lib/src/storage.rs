// ============================
// notes-backend-lib/src/storage.rs
// ============================
//! Record store abstraction with in-memory and flat-file implementations.
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use notes_common::{NoteId, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::{debug, warn};

use crate::models::{NewNote, NewUser, Note, NotePatch, User, UserPatch};

/// Name of the snapshot file inside the data directory
pub const STORE_FILE: &str = "store.json";

/// Errors raised by a record store
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("unique constraint violated on {0}")]
    UniqueViolation(&'static str),

    #[error("foreign key constraint violated on {0}")]
    ForeignKeyViolation(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Repository for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by id
    async fn find_user(&self, id: UserId) -> StorageResult<Option<User>>;

    /// Find a user by its unique email
    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>>;

    /// Insert a user. Fails with `UniqueViolation("email")` on a taken email.
    async fn create_user(&self, new: NewUser) -> StorageResult<User>;

    /// Apply a partial update. Returns `None` when the user does not exist.
    async fn update_user(&self, id: UserId, patch: UserPatch) -> StorageResult<Option<User>>;
}

/// Repository for note records
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes of `owner`, ordered by id
    async fn list_notes(&self, owner: UserId) -> StorageResult<Vec<Note>>;

    /// Find a note by id, regardless of owner
    async fn find_note(&self, id: NoteId) -> StorageResult<Option<Note>>;

    /// Insert a note. Fails with `ForeignKeyViolation` when `owner` is unknown.
    async fn create_note(&self, owner: UserId, new: NewNote) -> StorageResult<Note>;

    /// Apply a partial update. Returns `None` when the note does not exist.
    async fn update_note(&self, id: NoteId, patch: NotePatch) -> StorageResult<Option<Note>>;

    /// Remove a note. Returns whether a record was removed.
    async fn delete_note(&self, id: NoteId) -> StorageResult<bool>;
}

/// Everything the application needs from a store
pub trait Storage: UserStore + NoteStore + Clone + 'static {}

impl<T> Storage for T where T: UserStore + NoteStore + Clone + 'static {}

/// Serialized form of the whole store
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    next_user_id: u64,
    next_note_id: u64,
    users: Vec<User>,
    notes: Vec<Note>,
}

#[derive(Default)]
struct Tables {
    users: DashMap<UserId, User>,
    /// Unique index on `User::email`
    emails: DashMap<String, UserId>,
    notes: DashMap<NoteId, Note>,
    next_user_id: AtomicU64,
    next_note_id: AtomicU64,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let tables = Self {
            next_user_id: AtomicU64::new(snapshot.next_user_id),
            next_note_id: AtomicU64::new(snapshot.next_note_id),
            ..Self::default()
        };
        for user in snapshot.users {
            tables.emails.insert(user.email.clone(), user.id);
            tables.users.insert(user.id, user);
        }
        for note in snapshot.notes {
            tables.notes.insert(note.id, note);
        }
        tables
    }

    fn snapshot(&self) -> Snapshot {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by_key(|u| u.id);
        let mut notes: Vec<Note> = self.notes.iter().map(|e| e.value().clone()).collect();
        notes.sort_by_key(|n| n.id);
        Snapshot {
            next_user_id: self.next_user_id.load(Ordering::SeqCst),
            next_note_id: self.next_note_id.load(Ordering::SeqCst),
            users,
            notes,
        }
    }

    /// Claim `email` for `id` in the unique index. Returns false when another
    /// user already owns it.
    fn claim_email(&self, email: &str, id: UserId) -> bool {
        match self.emails.entry(email.to_string()) {
            Entry::Occupied(owner) => *owner.get() == id,
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            },
        }
    }

    /// Drop a user row and its index entry
    fn remove_user(&self, id: UserId) {
        if let Some((_, user)) = self.users.remove(&id) {
            self.emails.remove_if(&user.email, |_, owner| *owner == id);
        }
    }

    /// Put a previous version of a user row back, index included
    fn restore_user(&self, prior: User) {
        let current = self.users.get(&prior.id).map(|u| u.email.clone());
        if let Some(email) = current.filter(|email| *email != prior.email) {
            self.emails.remove_if(&email, |_, owner| *owner == prior.id);
        }
        self.emails.insert(prior.email.clone(), prior.id);
        self.users.insert(prior.id, prior);
    }
}

/// In-memory store backed by concurrent hash maps
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStorage {
    async fn find_user(&self, id: UserId) -> StorageResult<Option<User>> {
        Ok(self.tables.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let id = self.tables.emails.get(email).map(|e| *e.value());
        match id {
            Some(id) => self.find_user(id).await,
            None => Ok(None),
        }
    }

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        let id = self.tables.next_user_id.fetch_add(1, Ordering::SeqCst) + 1;
        if !self.tables.claim_email(&new.email, id) {
            return Err(StorageError::UniqueViolation("email"));
        }

        let now = Utc::now();
        let user = User {
            id,
            email: new.email,
            hash: new.hash,
            first_name: None,
            last_name: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> StorageResult<Option<User>> {
        // row guard stays held across the email index swap
        let Some(mut user) = self.tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(user.clone()));
        }

        if let Some(email) = patch.email.filter(|email| *email != user.email) {
            if !self.tables.claim_email(&email, id) {
                return Err(StorageError::UniqueViolation("email"));
            }
            self.tables.emails.remove(&user.email);
            user.email = email;
        }
        if let Some(first_name) = patch.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = patch.last_name {
            user.last_name = Some(last_name);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl NoteStore for MemoryStorage {
    async fn list_notes(&self, owner: UserId) -> StorageResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .tables
            .notes
            .iter()
            .filter(|e| e.value().is_owned_by(owner))
            .map(|e| e.value().clone())
            .collect();
        notes.sort_by_key(|n| n.id);
        Ok(notes)
    }

    async fn find_note(&self, id: NoteId) -> StorageResult<Option<Note>> {
        Ok(self.tables.notes.get(&id).map(|n| n.value().clone()))
    }

    async fn create_note(&self, owner: UserId, new: NewNote) -> StorageResult<Note> {
        if !self.tables.users.contains_key(&owner) {
            return Err(StorageError::ForeignKeyViolation("user_id"));
        }

        let id = self.tables.next_note_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now = Utc::now();
        let note = Note {
            id,
            user_id: owner,
            title: new.title,
            description: new.description,
            created_at: now,
            updated_at: now,
        };
        self.tables.notes.insert(id, note.clone());
        Ok(note)
    }

    async fn update_note(&self, id: NoteId, patch: NotePatch) -> StorageResult<Option<Note>> {
        let Some(mut note) = self.tables.notes.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(description) = patch.description {
            note.description = Some(description);
        }
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete_note(&self, id: NoteId) -> StorageResult<bool> {
        Ok(self.tables.notes.remove(&id).is_some())
    }
}

/// Flat-file store: the in-memory tables plus a JSON snapshot on disk,
/// rewritten after every mutation.
#[derive(Clone)]
pub struct FlatFileStorage {
    root: PathBuf,
    memory: MemoryStorage,
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileStorage {
    /// Open (or create) a store rooted at `root`, loading any existing snapshot
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let path = root.join(STORE_FILE);
        let snapshot = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Snapshot::default()
        };
        debug!(
            path = %path.display(),
            users = snapshot.users.len(),
            notes = snapshot.notes.len(),
            "loaded store snapshot"
        );

        Ok(Self {
            root,
            memory: MemoryStorage {
                tables: Arc::new(Tables::from_snapshot(snapshot)),
            },
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Path of the snapshot file
    pub fn path(&self) -> PathBuf {
        self.root.join(STORE_FILE)
    }

    /// Write the current tables to disk via a temp file and rename. Callers
    /// hold `write_lock`.
    async fn write_snapshot(&self) -> StorageResult<()> {
        let snapshot = self.memory.tables.snapshot();
        let json = serde_json::to_vec_pretty(&snapshot)?;

        let tmp = self.root.join(format!("{STORE_FILE}.tmp"));
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, self.path()).await?;
        Ok(())
    }

    /// Persist after a mutation, running `undo` on the tables when the write fails
    async fn commit<F>(&self, undo: F) -> StorageResult<()>
    where
        F: FnOnce(&Tables),
    {
        if let Err(e) = self.write_snapshot().await {
            warn!(error = %e, "snapshot write failed, rolling back");
            undo(&self.memory.tables);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for FlatFileStorage {
    async fn find_user(&self, id: UserId) -> StorageResult<Option<User>> {
        self.memory.find_user(id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        self.memory.find_user_by_email(email).await
    }

    async fn create_user(&self, new: NewUser) -> StorageResult<User> {
        let _guard = self.write_lock.lock().await;
        let user = self.memory.create_user(new).await?;
        self.commit(|tables| tables.remove_user(user.id)).await?;
        Ok(user)
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> StorageResult<Option<User>> {
        if patch.is_empty() {
            return self.memory.find_user(id).await;
        }

        let _guard = self.write_lock.lock().await;
        let Some(prior) = self.memory.find_user(id).await? else {
            return Ok(None);
        };
        let user = self.memory.update_user(id, patch).await?;
        if user.is_some() {
            self.commit(|tables| tables.restore_user(prior)).await?;
        }
        Ok(user)
    }
}

#[async_trait]
impl NoteStore for FlatFileStorage {
    async fn list_notes(&self, owner: UserId) -> StorageResult<Vec<Note>> {
        self.memory.list_notes(owner).await
    }

    async fn find_note(&self, id: NoteId) -> StorageResult<Option<Note>> {
        self.memory.find_note(id).await
    }

    async fn create_note(&self, owner: UserId, new: NewNote) -> StorageResult<Note> {
        let _guard = self.write_lock.lock().await;
        let note = self.memory.create_note(owner, new).await?;
        self.commit(|tables| {
            tables.notes.remove(&note.id);
        })
        .await?;
        Ok(note)
    }

    async fn update_note(&self, id: NoteId, patch: NotePatch) -> StorageResult<Option<Note>> {
        if patch.is_empty() {
            return self.memory.find_note(id).await;
        }

        let _guard = self.write_lock.lock().await;
        let Some(prior) = self.memory.find_note(id).await? else {
            return Ok(None);
        };
        let note = self.memory.update_note(id, patch).await?;
        if note.is_some() {
            self.commit(|tables| {
                tables.notes.insert(prior.id, prior);
            })
            .await?;
        }
        Ok(note)
    }

    async fn delete_note(&self, id: NoteId) -> StorageResult<bool> {
        let _guard = self.write_lock.lock().await;
        let Some(prior) = self.memory.find_note(id).await? else {
            return Ok(false);
        };
        let deleted = self.memory.delete_note(id).await?;
        if deleted {
            self.commit(|tables| {
                tables.notes.insert(prior.id, prior);
            })
            .await?;
        }
        Ok(deleted)
    }
}
