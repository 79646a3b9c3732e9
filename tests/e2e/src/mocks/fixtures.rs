//! Test Data Factory
//!
//! Verses and Strong's word studies shaped like the production seed files.

use exegete_core::{Document, SeedRecord};
use serde_json::{Value, json};

use super::embeddings::ConceptEmbeddings;

/// Factory for fixture records
pub struct TestDataFactory;

fn record(id: &str, content: &str, metadata: Value) -> SeedRecord {
    SeedRecord {
        id: id.to_string(),
        content: content.to_string(),
        metadata: match metadata {
            Value::Object(map) => map,
            _ => Default::default(),
        },
    }
}

impl TestDataFactory {
    /// Seven verses, in seed order
    pub fn verses() -> Vec<SeedRecord> {
        vec![
            record(
                "gen-1-1",
                "In the beginning God created the heavens and the earth.",
                json!({"book": "Genesis", "chapter": 1, "verse": 1}),
            ),
            record(
                "jn-1-1",
                "In the beginning was the Word, and the Word was with God, and the Word was God.",
                json!({"book": "John", "chapter": 1, "verse": 1}),
            ),
            record(
                "jn-3-16",
                "For God so loved the world that he gave his only Son, that whoever believes in him should not perish.",
                json!({"book": "John", "chapter": 3, "verse": 16}),
            ),
            record(
                "ps-23-1",
                "The LORD is my shepherd; I shall not want.",
                json!({"book": "Psalms", "chapter": 23, "verse": 1}),
            ),
            record(
                "1jn-4-8",
                "Anyone who does not love does not know God, because God is love.",
                json!({"book": "1 John", "chapter": 4, "verse": 8}),
            ),
            record(
                "eph-2-8",
                "For by grace you have been saved through faith.",
                json!({"book": "Ephesians", "chapter": 2, "verse": 8}),
            ),
            record(
                "ps-119-105",
                "Your word is a lamp to my feet and a light to my path.",
                json!({"book": "Psalms", "chapter": 119, "verse": 105}),
            ),
        ]
    }

    /// Five Strong's entries, in seed order
    pub fn word_studies() -> Vec<SeedRecord> {
        vec![
            record(
                "G26",
                "agape: love, goodwill, benevolence; the love of God for humanity",
                json!({"strongs": "G26", "language": "greek", "lemma": "ἀγάπη"}),
            ),
            record(
                "G3056",
                "logos: a word, saying, the divine expression",
                json!({"strongs": "G3056", "language": "greek", "lemma": "λόγος"}),
            ),
            record(
                "G4102",
                "pistis: faith, belief, trust, confidence",
                json!({"strongs": "G4102", "language": "greek", "lemma": "πίστις"}),
            ),
            record(
                "H430",
                "elohim: God, gods, the supreme God",
                json!({"strongs": "H430", "language": "hebrew", "lemma": "אֱלֹהִים"}),
            ),
            record(
                "H7462",
                "raah: to pasture, tend, shepherd a flock",
                json!({"strongs": "H7462", "language": "hebrew", "lemma": "רָעָה"}),
            ),
        ]
    }

    /// Verses followed by word studies
    pub fn all() -> Vec<SeedRecord> {
        let mut records = Self::verses();
        records.extend(Self::word_studies());
        records
    }

    /// One JSON object per line
    pub fn to_ndjson(records: &[SeedRecord]) -> String {
        records
            .iter()
            .filter_map(|r| serde_json::to_string(r).ok())
            .map(|line| line + "\n")
            .collect()
    }

    /// Records as documents embedded with [`ConceptEmbeddings`]
    pub fn embedded_documents(records: &[SeedRecord]) -> Vec<Document> {
        records
            .iter()
            .map(|r| Document {
                id: r.id.clone(),
                content: r.content.clone(),
                metadata: r.metadata.clone(),
                embedding: ConceptEmbeddings::vector_for(&r.content),
            })
            .collect()
    }
}
