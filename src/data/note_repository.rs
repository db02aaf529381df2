use crate::data::user_repository::InMemoryUserRepository;
use crate::domain::error::DomainError;
use crate::domain::note::{NewNote, Note};
use crate::domain::repository::{NoteRepository, UserRepository};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace, warn};

#[derive(Default)]
struct NoteTable {
    // BTreeMap keeps listings in insertion (id) order.
    rows: BTreeMap<i64, Note>,
    last_id: i64,
}

/// Notes kept in memory. Owners are checked against the shared user table.
#[derive(Clone)]
pub struct InMemoryNoteRepository {
    storage: Arc<RwLock<NoteTable>>,
    users: InMemoryUserRepository,
}

impl InMemoryNoteRepository {
    pub fn new(users: InMemoryUserRepository) -> Self {
        Self {
            storage: Arc::new(RwLock::new(NoteTable::default())),
            users,
        }
    }
}

#[async_trait]
impl NoteRepository for InMemoryNoteRepository {
    #[instrument(skip(self, note), fields(owner = %note.user_email))]
    async fn create_note(&self, note: NewNote) -> Result<Note> {
        if self.users.find_user_by_email(&note.user_email).await?.is_none() {
            warn!(owner = %note.user_email, "Note owner has no account");
            return Err(DomainError::Unauthorized("Unknown user".to_string()).into());
        }

        let mut storage = self.storage.write().await;
        storage.last_id += 1;
        let note = Note {
            id: storage.last_id,
            title: note.title,
            content: note.content,
            user_email: note.user_email,
        };
        storage.rows.insert(note.id, note.clone());
        debug!(note_id = note.id, "Note saved to memory storage");
        Ok(note)
    }

    #[instrument(skip(self))]
    async fn list_notes_by_owner(&self, owner: &str) -> Result<Vec<Note>> {
        let storage = self.storage.read().await;
        let notes: Vec<Note> = storage
            .rows
            .values()
            .filter(|n| n.user_email == owner)
            .cloned()
            .collect();
        trace!(count = notes.len(), "Listed notes");
        Ok(notes)
    }

    #[instrument(skip(self))]
    async fn find_note(&self, id: i64, owner: &str) -> Result<Option<Note>> {
        let storage = self.storage.read().await;
        Ok(storage
            .rows
            .get(&id)
            .filter(|n| n.user_email == owner)
            .cloned())
    }

    #[instrument(skip(self))]
    async fn delete_note(&self, id: i64, owner: &str) -> Result<()> {
        let mut storage = self.storage.write().await;
        let owned = storage
            .rows
            .get(&id)
            .is_some_and(|note| note.user_email == owner);
        if !owned {
            return Err(DomainError::NotFound("Note not found or unauthorized".to_string()).into());
        }
        storage.rows.remove(&id);
        debug!(note_id = id, "Note removed from memory storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::NewUser;

    fn new_note(title: &str, owner: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: format!("{} body", title),
            user_email: owner.to_string(),
        }
    }

    async fn repo_for(owners: &[&str]) -> InMemoryNoteRepository {
        let users = InMemoryUserRepository::new();
        for owner in owners {
            users
                .create_user(NewUser {
                    email: owner.to_string(),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
        }
        InMemoryNoteRepository::new(users)
    }

    fn is_not_found(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<DomainError>(), Some(DomainError::NotFound(_)))
    }

    #[tokio::test]
    async fn test_create_and_list_by_owner() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        repo.create_note(new_note("one", "a@x.com")).await.unwrap();
        repo.create_note(new_note("two", "b@x.com")).await.unwrap();
        repo.create_note(new_note("three", "a@x.com")).await.unwrap();

        let notes = repo.list_notes_by_owner("a@x.com").await.unwrap();
        let titles: Vec<_> = notes.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "three"]);
        assert!(notes.iter().all(|n| n.user_email == "a@x.com"));
    }

    #[tokio::test]
    async fn test_list_for_unknown_owner_is_empty() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        repo.create_note(new_note("one", "a@x.com")).await.unwrap();
        assert!(repo.list_notes_by_owner("z@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_note_checks_owner() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        let note = repo.create_note(new_note("mine", "a@x.com")).await.unwrap();

        assert_eq!(repo.find_note(note.id, "a@x.com").await.unwrap(), Some(note.clone()));
        assert!(repo.find_note(note.id, "b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_note_by_owner() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        let note = repo.create_note(new_note("mine", "a@x.com")).await.unwrap();

        repo.delete_note(note.id, "a@x.com").await.unwrap();
        assert!(repo.list_notes_by_owner("a@x.com").await.unwrap().is_empty());

        let err = repo.delete_note(note.id, "a@x.com").await.unwrap_err();
        assert!(is_not_found(&err));
    }

    #[tokio::test]
    async fn test_delete_note_of_other_owner_is_not_found() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        let note = repo.create_note(new_note("mine", "a@x.com")).await.unwrap();

        let err = repo.delete_note(note.id, "b@x.com").await.unwrap_err();
        assert!(is_not_found(&err));
        // Still there for the owner.
        assert!(repo.find_note(note.id, "a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let repo = repo_for(&["a@x.com", "b@x.com"]).await;
        let first = repo.create_note(new_note("a", "a@x.com")).await.unwrap();
        repo.delete_note(first.id, "a@x.com").await.unwrap();
        let second = repo.create_note(new_note("b", "a@x.com")).await.unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_create_note_for_unknown_owner_is_rejected() {
        let repo = repo_for(&["a@x.com"]).await;

        let err = repo.create_note(new_note("ghost", "ghost@x.com")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DomainError>(),
            Some(DomainError::Unauthorized(msg)) if msg == "Unknown user"
        ));
        assert!(repo.list_notes_by_owner("ghost@x.com").await.unwrap().is_empty());
    }
}
