//! Keyword Scoring
//!
//! Lexical overlap between a query and a set of documents. Exact-term recall
//! for Strong's numbers and proper nouns that embeddings tend to underweight.

use crate::document::{Document, SearchResult};

/// Score added when a keyword occurs in the content
pub const CONTENT_WEIGHT: f32 = 2.0;

/// Score added when a keyword occurs in the flattened metadata
pub const METADATA_WEIGHT: f32 = 1.0;

/// Tokens of this length or shorter are ignored
pub const MIN_KEYWORD_LEN: usize = 2;

/// Scores documents by substring matches of query keywords
#[derive(Debug, Clone)]
pub struct KeywordScorer {
    keywords: Vec<String>,
}

impl KeywordScorer {
    /// Tokenize `query` on whitespace, lower-case, drop short tokens
    pub fn new(query: &str) -> Self {
        let keywords = query
            .split_whitespace()
            .map(str::to_lowercase)
            .filter(|token| token.chars().count() > MIN_KEYWORD_LEN)
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// +2 per keyword found in the content, +1 per keyword found in metadata
    pub fn score(&self, document: &Document) -> f32 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let content = document.content.to_lowercase();
        let metadata = document.metadata_text();

        self.keywords.iter().fold(0.0, |score, keyword| {
            let mut score = score;
            if content.contains(keyword.as_str()) {
                score += CONTENT_WEIGHT;
            }
            if metadata.contains(keyword.as_str()) {
                score += METADATA_WEIGHT;
            }
            score
        })
    }

    /// Top `k` documents with a non-zero score, stable on ties
    pub fn rank<'a, I>(&self, documents: I, k: usize) -> Vec<SearchResult>
    where
        I: IntoIterator<Item = &'a Document>,
    {
        if self.keywords.is_empty() || k == 0 {
            return Vec::new();
        }

        let mut results: Vec<SearchResult> = documents
            .into_iter()
            .filter_map(|doc| {
                let score = self.score(doc);
                (score > 0.0).then(|| SearchResult::new(doc.clone(), score))
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(k);
        results
    }
}
