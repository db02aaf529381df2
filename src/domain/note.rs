use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_email: String,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub user_email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
}

/// Appends a generated summary to note content.
///
/// The result always ends with `(Summary: ...)`, which is how stored notes
/// are recognised as summarized. The summary is kept exactly as generated.
pub fn with_summary(content: &str, summary: &str) -> String {
    format!("{}\n\n(Summary: {})", content, summary)
}
