//! Context assembly for answer generation

use serde::{Deserialize, Serialize};

use crate::document::{RetrievalMethod, RetrievalResult};

/// Characters kept in a snippet preview
pub const PREVIEW_CHARS: usize = 200;

/// Retrieved contents joined by blank lines, in rank order
pub fn assemble_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .map(|r| r.document.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compact view of a retrieved document for API responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextSnippet {
    pub id: String,
    pub preview: String,
    pub score: f32,
    pub retrieval_method: RetrievalMethod,
}

impl ContextSnippet {
    pub fn from_result(result: &RetrievalResult) -> Self {
        let mut preview: String = result.document.content.chars().take(PREVIEW_CHARS).collect();
        preview.push_str("...");
        Self {
            id: result.document.id.clone(),
            preview,
            score: result.score,
            retrieval_method: result.retrieval_method,
        }
    }
}
