//! Document service — create, edit and save in-memory documents.
//!
//! DESIGN
//! ======
//! Documents are whole-value records: every content update replaces the text,
//! bumps `updated_at`, refreshes the word count and marks the editor dirty.
//! Saving only clears the dirty flag; there is no storage behind it.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::services::template;
use crate::state::{AppState, Document, DocumentMetadata, DocumentState, EditorState, Selection};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found: {0}")]
    NotFound(Uuid),
}

/// Create a document. When `template_id` names a known template its code
/// seeds the content; an unknown template id is kept as a reference only.
pub async fn create_document(state: &AppState, title: &str, template_id: Option<String>) -> DocumentState {
    let content = match template_id.as_deref() {
        Some(id) => template::get_template(state, id)
            .await
            .map(|t| t.typst_code)
            .unwrap_or_default(),
        None => String::new(),
    };

    let now = OffsetDateTime::now_utc();
    let document = Document {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        metadata: DocumentMetadata { word_count: Some(word_count(&content)), ..DocumentMetadata::default() },
        content,
        template_id,
        created_at: now,
        updated_at: now,
    };
    let entry = DocumentState { document, editor: EditorState::default() };

    state
        .documents
        .write()
        .await
        .insert(entry.document.id, entry.clone());
    info!(document_id = %entry.document.id, title, "document: created");
    entry
}

/// # Errors
///
/// Returns [`DocumentError::NotFound`] for an unknown id.
pub async fn get_document(state: &AppState, id: Uuid) -> Result<DocumentState, DocumentError> {
    state
        .documents
        .read()
        .await
        .get(&id)
        .cloned()
        .ok_or(DocumentError::NotFound(id))
}

/// All documents, most recently updated first.
pub async fn list_documents(state: &AppState) -> Vec<Document> {
    let mut docs: Vec<Document> = state
        .documents
        .read()
        .await
        .values()
        .map(|entry| entry.document.clone())
        .collect();
    docs.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    docs
}

/// Replace the content wholesale and mark the editor dirty.
///
/// # Errors
///
/// Returns [`DocumentError::NotFound`] for an unknown id.
pub async fn update_content(state: &AppState, id: Uuid, content: String) -> Result<DocumentState, DocumentError> {
    let mut docs = state.documents.write().await;
    let entry = docs.get_mut(&id).ok_or(DocumentError::NotFound(id))?;
    apply_content(entry, content);
    Ok(entry.clone())
}

pub(crate) fn apply_content(entry: &mut DocumentState, content: String) {
    entry.document.metadata.word_count = Some(word_count(&content));
    entry.document.content = content;
    entry.document.updated_at = OffsetDateTime::now_utc();
    entry.editor.is_dirty = true;
}

/// Record cursor and selection. Absent values (outer `None`) are left
/// untouched; `Some(None)` clears the selection.
///
/// # Errors
///
/// Returns [`DocumentError::NotFound`] for an unknown id.
pub async fn update_editor(
    state: &AppState,
    id: Uuid,
    cursor_position: Option<usize>,
    selection: Option<Option<Selection>>,
) -> Result<EditorState, DocumentError> {
    let mut docs = state.documents.write().await;
    let entry = docs.get_mut(&id).ok_or(DocumentError::NotFound(id))?;
    if let Some(cursor) = cursor_position {
        entry.editor.cursor_position = cursor;
    }
    if let Some(selection) = selection {
        entry.editor.selection = selection;
    }
    Ok(entry.editor.clone())
}

/// Mark the document clean.
///
/// # Errors
///
/// Returns [`DocumentError::NotFound`] for an unknown id.
pub async fn save_document(state: &AppState, id: Uuid) -> Result<DocumentState, DocumentError> {
    let mut docs = state.documents.write().await;
    let entry = docs.get_mut(&id).ok_or(DocumentError::NotFound(id))?;
    entry.editor.is_dirty = false;
    info!(document_id = %id, bytes = entry.document.content.len(), "document: saved");
    Ok(entry.clone())
}

/// # Errors
///
/// Returns [`DocumentError::NotFound`] for an unknown id.
pub async fn delete_document(state: &AppState, id: Uuid) -> Result<(), DocumentError> {
    if state.documents.write().await.remove(&id).is_none() {
        return Err(DocumentError::NotFound(id));
    }
    info!(document_id = %id, "document: deleted");
    Ok(())
}

/// Whitespace-separated word count.
#[must_use]
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
