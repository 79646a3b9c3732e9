//! Retrieval journeys: seed → retrieve → delete → retrieve, across store backends

use exegete_core::{ContextSnippet, RetrievalMethod, assemble_context};
use exegete_e2e_tests::harness::TestStoreManager;

fn ids(results: &[exegete_core::RetrievalResult]) -> Vec<&str> {
    results.iter().map(|r| r.document.id.as_str()).collect()
}

#[tokio::test]
async fn test_seed_reports_every_fixture() {
    let db = TestStoreManager::new_memory();
    let report = db.seed_fixtures().await;

    assert_eq!(report.parsed, 12);
    assert_eq!(report.added, 12);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.malformed, 0);
    assert_eq!(db.document_count().await, 12);
    // one batch call for twelve records
    assert_eq!(db.embeddings.calls(), 1);
}

#[tokio::test]
async fn test_transliteration_found_by_both_paths() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let results = db.retriever().retrieve("agape", 3).await.unwrap();

    assert_eq!(ids(&results), vec!["G26", "1jn-4-8", "jn-3-16"]);
    assert_eq!(results[0].retrieval_method, RetrievalMethod::Hybrid);
    assert!((results[0].score - 1.6).abs() < 1e-5);
    assert_eq!(results[1].retrieval_method, RetrievalMethod::Vector);
    assert!((results[1].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
}

#[tokio::test]
async fn test_strongs_number_recalled_by_keyword_path() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    // "h7462" means nothing to the embedder; only metadata matches it
    let results = db.retriever().retrieve("H7462", 3).await.unwrap();

    assert_eq!(results[0].document.id, "H7462");
    assert_eq!(results[0].retrieval_method, RetrievalMethod::Keyword);
    assert!((results[0].score - 0.6).abs() < 1e-5);
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn test_shepherd_journey_on_both_backends() {
    for db in [TestStoreManager::new_memory(), TestStoreManager::new_local_index()] {
        db.seed_fixtures().await;

        let results = db.retriever().retrieve("shepherd", 2).await.unwrap();
        assert_eq!(ids(&results), vec!["H7462", "ps-23-1"]);
        assert!(results
            .iter()
            .all(|r| r.retrieval_method == RetrievalMethod::Hybrid));

        let context = assemble_context(&results);
        assert_eq!(
            context,
            "raah: to pasture, tend, shepherd a flock\n\nThe LORD is my shepherd; I shall not want."
        );
    }
}

#[tokio::test]
async fn test_deleted_document_never_returns() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    db.store.delete_document("G26").await.unwrap();
    assert!(db.store.get_document("G26").await.unwrap().is_none());

    let results = db.retriever().retrieve("agape", 5).await.unwrap();
    assert!(!ids(&results).contains(&"G26"));
    assert!(results
        .iter()
        .all(|r| r.retrieval_method == RetrievalMethod::Vector));
    assert_eq!(results[0].document.id, "1jn-4-8");
}

#[tokio::test]
async fn test_retrieve_by_vector_skips_keyword_path() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let vector = db.provider().embed("agape").await.unwrap();
    let results = db.retriever().retrieve_by_vector(&vector, 5).await.unwrap();

    assert_eq!(results.len(), 5);
    assert_eq!(results[0].document.id, "G26");
    assert!(results
        .iter()
        .all(|r| r.retrieval_method == RetrievalMethod::Vector));
}

#[tokio::test]
async fn test_local_index_survives_reopen() {
    let mut db = TestStoreManager::new_local_index();
    db.seed_fixtures().await;
    db.reopen();

    assert_eq!(db.document_count().await, 12);
    let first_page: Vec<String> = db
        .store
        .list_documents(3, 0)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(first_page, vec!["gen-1-1", "jn-1-1", "jn-3-16"]);

    let results = db.retriever().retrieve("agape", 1).await.unwrap();
    assert_eq!(results[0].document.id, "G26");
}

#[tokio::test]
async fn test_reindex_after_seed_keeps_results_stable() {
    let db = TestStoreManager::new_local_index();
    db.seed_fixtures().await;

    let report = db.ingestor().reindex(5).await.unwrap();
    assert_eq!(report.parsed, 12);
    assert_eq!(report.added, 12);

    let results = db.retriever().retrieve("shepherd", 2).await.unwrap();
    assert_eq!(ids(&results), vec!["H7462", "ps-23-1"]);
}

#[tokio::test]
async fn test_snippets_for_api_response() {
    let db = TestStoreManager::new_memory();
    db.seed_fixtures().await;

    let results = db.retriever().retrieve("faith grace", 2).await.unwrap();
    let snippets: Vec<ContextSnippet> = results.iter().map(ContextSnippet::from_result).collect();

    assert_eq!(snippets[0].id, "eph-2-8");
    assert!(snippets[0].preview.starts_with("For by grace"));
    assert!(snippets[0].preview.ends_with("..."));
}
