mod support;

use std::sync::Arc;

use scholar_stream::{
    bootstrap, build_from_config, paper_text, ModelRole, RetrievalError, RetrievalService,
};
use support::{record, Fixture, PAPERS};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_queries_get_their_own_answers() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();
    let retriever = Arc::new(bootstrap(&fx.config).await.unwrap());

    let mut tasks = Vec::new();
    for round in 0..8 {
        for idx in 0..PAPERS.len() {
            let retriever = retriever.clone();
            tasks.push(tokio::spawn(async move {
                let paper = record(idx);
                let result = retriever.retrieve(&paper_text(&paper)).await.unwrap();
                (round, paper.id, result)
            }));
        }
    }

    for task in tasks {
        let (_, id, result) = task.await.unwrap();
        for role in ModelRole::ALL {
            assert_eq!(result.space(role)[0].as_hit().unwrap().id, id);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn service_switches_to_ready_under_load() {
    let fx = Fixture::new();
    build_from_config(&fx.config).await.unwrap();
    let service = Arc::new(RetrievalService::new());

    let early = service.retrieve("adam").await;
    assert_eq!(early, Err(RetrievalError::Unavailable));

    service.install(bootstrap(&fx.config).await.unwrap());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move { service.retrieve(&format!("query {i}")).await })
        })
        .collect();
    for handle in handles {
        let result = handle.await.unwrap().unwrap();
        assert_eq!(result.base.len(), PAPERS.len());
        assert_eq!(result.custom.len(), PAPERS.len());
    }
}
