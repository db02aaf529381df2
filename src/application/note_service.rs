use crate::domain::inference::TextPipeline;
use crate::domain::note::{NewNote, Note, NoteCreate, with_summary};
use crate::domain::repository::NoteRepository;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct NoteService {
    repository: Arc<dyn NoteRepository>,
    summarizer: Arc<dyn TextPipeline>,
}

impl NoteService {
    pub fn new(repository: Arc<dyn NoteRepository>, summarizer: Arc<dyn TextPipeline>) -> Self {
        Self {
            repository,
            summarizer,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, owner: &str) -> Result<Vec<Note>> {
        let notes = self.repository.list_notes_by_owner(owner).await?;
        debug!(count = notes.len(), "Notes listed");
        Ok(notes)
    }

    /// Summarizes the content and stores it with the summary appended.
    #[instrument(skip(self, req), fields(title = %req.title, content_len = req.content.len()))]
    pub async fn create(&self, owner: &str, req: NoteCreate) -> Result<Note> {
        let summary = self.summarizer.run(&req.content).await?;
        debug!(summary_len = summary.len(), "Summary generated");

        let note = self
            .repository
            .create_note(NewNote {
                title: req.title,
                content: with_summary(&req.content, &summary),
                user_email: owner.to_string(),
            })
            .await?;

        info!(note_id = note.id, "Note created");
        Ok(note)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, owner: &str, id: i64) -> Result<()> {
        self.repository.delete_note(id, owner).await?;
        info!(note_id = id, "Note deleted");
        Ok(())
    }
}
