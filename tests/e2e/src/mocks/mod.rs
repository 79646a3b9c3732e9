//! Mocks and fixtures

mod embeddings;
mod fixtures;

pub use embeddings::{CONCEPT_DIMENSIONS, ConceptEmbeddings, FailingEmbeddings, FlakyEmbeddings};
pub use fixtures::TestDataFactory;
pub use stores::BrokenListingStore;
