mod support;

use scholar_stream::{bootstrap, build_from_config, VectorStore};
use support::Fixture;

#[tokio::test]
async fn repeated_queries_return_identical_results() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();
    let retriever = bootstrap(&fx.config).await.unwrap();

    let first = retriever.retrieve("transformers for language").await.unwrap();
    for _ in 0..5 {
        let again = retriever.retrieve("transformers for language").await.unwrap();
        assert_eq!(first, again);
    }
}

#[tokio::test]
async fn independent_builds_produce_the_same_rankings() {
    let a = Fixture::new();
    let b = Fixture::new();
    build_from_config(&a.config).await.unwrap();
    build_from_config(&b.config).await.unwrap();

    let ra = bootstrap(&a.config).await.unwrap();
    let rb = bootstrap(&b.config).await.unwrap();
    for query in ["graph attention", "optimization", "deep networks", "dropout"] {
        assert_eq!(
            ra.retrieve(query).await.unwrap(),
            rb.retrieve(query).await.unwrap(),
            "{query}"
        );
    }
}

#[tokio::test]
async fn reopened_store_answers_like_the_first_load() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();

    let before = bootstrap(&fx.config).await.unwrap();
    let expected = before.retrieve("bidirectional pre-training").await.unwrap();
    drop(before);

    // Open and drop a store to make sure reading never rewrites snapshots.
    drop(VectorStore::open(fx.config.store_config()).unwrap());

    let after = bootstrap(&fx.config).await.unwrap();
    assert_eq!(after.retrieve("bidirectional pre-training").await.unwrap(), expected);
}
