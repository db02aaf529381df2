use crate::domain::note::{NewNote, Note};
use crate::domain::user::{NewUser, User};
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. Fails with `DomainError::Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn create_note(&self, note: NewNote) -> Result<Note>;
    async fn list_notes_by_owner(&self, owner: &str) -> Result<Vec<Note>>;
    async fn find_note(&self, id: i64, owner: &str) -> Result<Option<Note>>;
    /// Deletes a note only if `owner` owns it. A note that is missing and a
    /// note that belongs to someone else both yield `DomainError::NotFound`.
    async fn delete_note(&self, id: i64, owner: &str) -> Result<()>;
}
