mod support;

use std::fs;

use scholar_stream::{bootstrap, build_from_config, paper_text, ModelRole, VectorStore};
use scholar_stream::CollectionStatus;
use support::{record, Fixture};

#[tokio::test]
async fn corrupt_snapshot_only_fails_its_own_collection() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();

    let custom = fx.config.collection_name(ModelRole::Custom).to_string();
    let snapshot = fx.index_dir().join(format!("{custom}.snapshot"));
    assert!(snapshot.exists());
    fs::write(&snapshot, b"definitely not a snapshot").unwrap();

    let store = VectorStore::open(fx.config.store_config()).unwrap();
    assert!(matches!(store.status(&custom), CollectionStatus::Corrupt { .. }));

    let retriever = bootstrap(&fx.config).await.unwrap();
    let paper = record(1);
    let result = retriever.retrieve(&paper_text(&paper)).await.unwrap();

    let base = result.space(ModelRole::Base);
    assert_eq!(base[0].as_hit().unwrap().id, paper.id);

    let failed = result.space(ModelRole::Custom);
    assert_eq!(failed.len(), 1);
    let json = serde_json::to_value(&failed[0]).unwrap();
    assert_eq!(json["error"], format!("Search failed on {custom}"));
}

#[tokio::test]
async fn deleted_collection_only_fails_its_own_collection() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();

    let base = fx.config.collection_name(ModelRole::Base).to_string();
    fs::remove_file(fx.index_dir().join(format!("{base}.snapshot"))).unwrap();

    let retriever = bootstrap(&fx.config).await.unwrap();
    let result = retriever.retrieve("stochastic optimization").await.unwrap();
    assert!(result.space(ModelRole::Base)[0].is_error());
    assert!(result
        .space(ModelRole::Custom)
        .iter()
        .all(|hit| hit.as_hit().is_some()));
}

#[tokio::test]
async fn papers_missing_from_metadata_keep_their_hits() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();

    // Drop the last paper from the CSV after the vectors were built.
    let rows = &support::PAPERS[..support::PAPERS.len() - 1];
    support::write_csv(&fx.config.metadata.path, rows);

    let retriever = bootstrap(&fx.config).await.unwrap();
    let orphan = record(support::PAPERS.len() - 1);
    let result = retriever.retrieve(&paper_text(&orphan)).await.unwrap();
    for role in ModelRole::ALL {
        let top = result.space(role)[0].as_hit().unwrap();
        assert_eq!(top.id, orphan.id);
        assert_eq!(top.title, "N/A");
        assert_eq!(top.description, "N/A");
    }
}
