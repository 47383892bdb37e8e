//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the memoized compiler handle plus the in-memory stores the
//! editor front end works against: open documents with their editor state,
//! the template catalog, and the chat log. Nothing here is persisted; a
//! restart starts from the built-in templates and an empty workspace.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::compiler::CompilerHandle;
use crate::services::chat::ChatMessage;
use crate::services::template::{Template, builtin_templates};

// =============================================================================
// DOCUMENT
// =============================================================================

/// Free-form document metadata. `word_count` is refreshed on every content update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
}

/// A markup document. Content is replaced wholesale on every edit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub metadata: DocumentMetadata,
}

// =============================================================================
// EDITOR STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub from: usize,
    pub to: usize,
}

/// Transient editor state tracked alongside each document.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorState {
    pub cursor_position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<Selection>,
    /// Set by content updates, cleared by save.
    pub is_dirty: bool,
}

/// Per-document live state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub document: Document,
    pub editor: EditorState,
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub compiler: CompilerHandle,
    pub documents: Arc<RwLock<HashMap<Uuid, DocumentState>>>,
    pub templates: Arc<RwLock<Vec<Template>>>,
    pub chat: Arc<RwLock<Vec<ChatMessage>>>,
}

impl AppState {
    #[must_use]
    pub fn new(compiler: CompilerHandle) -> Self {
        Self {
            compiler,
            documents: Arc::new(RwLock::new(HashMap::new())),
            templates: Arc::new(RwLock::new(builtin_templates())),
            chat: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
