//! Degradation scenarios: failing providers, failing stores, unavailable backends

use std::sync::Arc;

use exegete_core::config::{RetrievalConfig, StoreConfig, VectorStoreKind};
use exegete_core::{
    DegradedPath, DocumentStore, ExegeteError, HybridRetriever, Ingestor, ManagedSearchStore,
    MemoryStore, RetrievalMethod, open_store,
};
use exegete_e2e_tests::harness::TestStoreManager;
use exegete_e2e_tests::mocks::{
    BrokenListingStore, ConceptEmbeddings, FailingEmbeddings, FlakyEmbeddings, TestDataFactory,
    CONCEPT_DIMENSIONS,
};

#[tokio::test]
async fn test_all_paths_healthy_reports_no_degradation() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let retrieval = db.retriever().retrieve_detailed("grace", 3).await.unwrap();
    assert!(retrieval.degraded.is_none());
    assert_eq!(retrieval.results[0].document.id, "eph-2-8");
}

#[tokio::test]
async fn test_provider_outage_falls_back_to_keywords() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let retriever = HybridRetriever::new(
        db.store.clone(),
        Arc::new(FailingEmbeddings::new(CONCEPT_DIMENSIONS)),
        RetrievalConfig::default(),
    );
    let retrieval = retriever.retrieve_detailed("faith", 3).await.unwrap();

    match &retrieval.degraded {
        Some(DegradedPath::Vector(reason)) => assert!(reason.contains("503")),
        other => panic!("expected vector degradation, got {:?}", other),
    }
    let ids: Vec<_> = retrieval.results.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["eph-2-8", "G4102"]);
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.retrieval_method == RetrievalMethod::Keyword));
}

#[tokio::test]
async fn test_listing_failure_falls_back_to_vectors() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let store = Arc::new(BrokenListingStore::new(db.store.clone()));
    let retriever = HybridRetriever::new(store, db.provider(), RetrievalConfig::default());
    let retrieval = retriever.retrieve_detailed("agape", 2).await.unwrap();

    assert!(matches!(retrieval.degraded, Some(DegradedPath::Keyword(_))));
    let ids: Vec<_> = retrieval.results.iter().map(|r| r.document.id.as_str()).collect();
    assert_eq!(ids, vec!["G26", "1jn-4-8"]);
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.retrieval_method == RetrievalMethod::Vector));
}

#[tokio::test]
async fn test_both_paths_failing_surfaces_vector_error() {
    let store: Arc<dyn DocumentStore> = Arc::new(ManagedSearchStore::default());

    let retriever = HybridRetriever::new(
        store.clone(),
        Arc::new(FailingEmbeddings::new(CONCEPT_DIMENSIONS)),
        RetrievalConfig::default(),
    );
    let err = retriever.retrieve("grace", 3).await.unwrap_err();
    assert!(matches!(err, ExegeteError::Provider(_)));

    let retriever = HybridRetriever::new(
        store,
        Arc::new(ConceptEmbeddings::new()),
        RetrievalConfig::default(),
    );
    let err = retriever.retrieve("grace", 3).await.unwrap_err();
    assert!(matches!(err, ExegeteError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_empty_query_makes_no_provider_calls() {
    let db = TestStoreManager::new_memory();
    let retriever = db.retriever();

    assert!(retriever.retrieve("", 5).await.unwrap().is_empty());
    assert!(retriever.retrieve("grace", 0).await.unwrap().is_empty());
    assert_eq!(db.embeddings.calls(), 0);
}

#[tokio::test]
async fn test_seed_survives_broken_batch_endpoint() {
    let store = Arc::new(MemoryStore::new());
    let embeddings = Arc::new(FlakyEmbeddings::new());
    let ingestor = Ingestor::new(store.clone(), embeddings.clone());

    let ndjson = TestDataFactory::to_ndjson(&TestDataFactory::all());
    let report = ingestor.seed_reader(ndjson.as_bytes()).await.unwrap();

    assert_eq!(report.added, 12);
    assert_eq!(embeddings.batch_attempts(), 1);
    assert_eq!(embeddings.single_calls(), 12);
    assert_eq!(store.len(), 12);
}

#[tokio::test]
async fn test_seed_with_provider_down_skips_everything() {
    let store = Arc::new(MemoryStore::new());
    let ingestor = Ingestor::new(store.clone(), Arc::new(FailingEmbeddings::new(CONCEPT_DIMENSIONS)));

    let ndjson = TestDataFactory::to_ndjson(&TestDataFactory::verses());
    let report = ingestor.seed_reader(ndjson.as_bytes()).await.unwrap();

    assert_eq!(report.parsed, 7);
    assert_eq!(report.added, 0);
    assert_eq!(report.skipped, 7);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_seeding_unavailable_backend_fails_fast() {
    let ingestor = Ingestor::new(
        Arc::new(ManagedSearchStore::default()),
        Arc::new(ConceptEmbeddings::new()),
    );
    let ndjson = TestDataFactory::to_ndjson(&TestDataFactory::verses());
    let err = ingestor.seed_reader(ndjson.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ExegeteError::StoreUnavailable(_)));
}

#[test]
fn test_factory_rejects_unimplemented_and_mismatched_backends() {
    let managed = StoreConfig {
        kind: VectorStoreKind::ManagedSearch,
        ..Default::default()
    };
    let err = open_store(&managed, Arc::new(ConceptEmbeddings::new())).err().unwrap();
    assert!(matches!(err, ExegeteError::StoreUnavailable(_)));

    // default store dimensions (1536) disagree with the 8-d concept embedder
    let dir = tempfile::tempdir().unwrap();
    let local = StoreConfig {
        kind: VectorStoreKind::LocalIndex,
        data_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    };
    let err = open_store(&local, Arc::new(ConceptEmbeddings::new())).err().unwrap();
    assert!(matches!(err, ExegeteError::Configuration(_)));
}
