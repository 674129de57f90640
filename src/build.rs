//! One-shot bulk build of both collections from the metadata CSV.
//!
//! For each embedding space: create the collection (idempotent), encode every
//! paper with that space's encoder, insert, train the IVF index and persist
//! the snapshot. Papers are encoded in fixed-size batches spread over the
//! rayon pool.

use std::time::Instant;

use index::VectorStore;
use metadata::{MetadataStore, PaperRecord};
use rayon::prelude::*;
use semantic::{EmbeddingProvider, ModelRole, SemanticError, TextEncoder};
use serde::Serialize;
use tracing::{info, warn};

use crate::BootstrapError;
use crate::config::ScholarConfig;

/// Outcome of building one collection.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionReport {
    pub space: ModelRole,
    pub collection: String,
    pub created: bool,
    pub inserted: usize,
    pub skipped: usize,
    pub indexed: bool,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BuildReport {
    pub papers: usize,
    pub collections: Vec<CollectionReport>,
}

/// Text embedded for a paper: the title followed by its description.
pub fn paper_text(record: &PaperRecord) -> String {
    match (record.title.trim(), record.description.trim()) {
        ("", description) => description.to_string(),
        (title, "") => title.to_string(),
        (title, description) => format!("{title}. {description}"),
    }
}

/// Builds both collections into `store`. Blocking; run it off the async runtime.
pub fn build_collections(
    cfg: &ScholarConfig,
    metadata: &MetadataStore,
    provider: &EmbeddingProvider,
    store: &mut VectorStore,
) -> Result<BuildReport, BootstrapError> {
    let papers: Vec<&PaperRecord> = metadata.iter_sorted().collect();
    let mut collections = Vec::with_capacity(ModelRole::ALL.len());
    for role in ModelRole::ALL {
        let encoder = provider.encoder(role);
        collections.push(build_one(cfg, role, encoder.as_ref(), &papers, store)?);
    }
    Ok(BuildReport {
        papers: papers.len(),
        collections,
    })
}

fn build_one(
    cfg: &ScholarConfig,
    role: ModelRole,
    encoder: &dyn TextEncoder,
    papers: &[&PaperRecord],
    store: &mut VectorStore,
) -> Result<CollectionReport, BootstrapError> {
    let started = Instant::now();
    let schema = cfg.collection_schema(role);
    let name = schema.name.clone();
    let max_id_length = schema.max_id_length;
    let created = store.create_collection(schema)?;

    let (accepted, rejected): (Vec<&PaperRecord>, Vec<&PaperRecord>) = papers
        .iter()
        .copied()
        .partition(|p| p.id.len() <= max_id_length);
    for paper in &rejected {
        warn!(
            collection = %name,
            id = %paper.id,
            max_id_length,
            "skipping paper whose id is too long"
        );
    }

    info!(
        collection = %name,
        space = %role,
        model = encoder.model_name(),
        papers = accepted.len(),
        "encoding papers"
    );
    let vectors = encode_all(encoder, &accepted, cfg.build.batch_size)?;
    let inserted = store.insert_batch(
        &name,
        accepted
            .iter()
            .zip(vectors.iter())
            .map(|(paper, vector)| (paper.id.as_str(), vector.as_slice())),
    )?;
    let indexed = store.build_index(&name)?;
    store.persist(&name)?;

    let report = CollectionReport {
        space: role,
        collection: name,
        created,
        inserted,
        skipped: rejected.len(),
        indexed,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        collection = %report.collection,
        inserted = report.inserted,
        skipped = report.skipped,
        indexed = report.indexed,
        elapsed_ms = report.elapsed_ms,
        "collection built"
    );
    Ok(report)
}

fn encode_all(
    encoder: &dyn TextEncoder,
    papers: &[&PaperRecord],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let batches: Vec<Vec<Vec<f32>>> = papers
        .par_chunks(batch_size.max(1))
        .map(|chunk| {
            let texts: Vec<String> = chunk.iter().map(|p| paper_text(p)).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            encoder.encode_batch(&refs)
        })
        .collect::<Result<_, _>>()?;
    Ok(batches.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use index::{CollectionStatus, IvfConfig, VectorSearch};
    use semantic::StubEncoder;

    fn provider(dim: usize) -> EmbeddingProvider {
        EmbeddingProvider::from_encoders(
            Box::new(StubEncoder::new("base", dim, true)),
            Box::new(StubEncoder::new("custom", dim, true)),
            dim,
            0,
        )
    }

    fn config(dim: usize) -> ScholarConfig {
        ScholarConfig {
            dimension: dim,
            build: crate::config::BuildYamlConfig { batch_size: 3 },
            ..ScholarConfig::default()
        }
    }

    fn papers(n: usize) -> MetadataStore {
        MetadataStore::from_records(
            (0..n).map(|i| PaperRecord::new(format!("p{i}"), format!("Title {i}"), "Body")),
        )
        .unwrap()
    }

    #[test]
    fn paper_text_joins_title_and_description() {
        let p = PaperRecord::new("p", "Deep Learning", "A survey");
        assert_eq!(paper_text(&p), "Deep Learning. A survey");
        assert_eq!(paper_text(&PaperRecord::new("p", "", "Only body")), "Only body");
        assert_eq!(paper_text(&PaperRecord::new("p", "Only title", " ")), "Only title");
    }

    #[test]
    fn builds_both_collections() {
        let cfg = config(8);
        let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
        let report = build_collections(&cfg, &papers(10), &provider(8), &mut store).unwrap();

        assert_eq!(report.papers, 10);
        assert_eq!(report.collections.len(), 2);
        for c in &report.collections {
            assert!(c.created);
            assert_eq!(c.inserted, 10);
            assert!(!c.indexed);
        }
        assert_eq!(
            store.status("research_papers"),
            CollectionStatus::Ready {
                len: 10,
                indexed: false
            }
        );
    }

    #[test]
    fn stored_vectors_match_the_space_encoder() {
        let cfg = config(8);
        let provider = provider(8);
        let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
        let meta = papers(4);
        build_collections(&cfg, &meta, &provider, &mut store).unwrap();

        let paper = meta.lookup("p2").unwrap();
        let query = provider
            .encode(&paper_text(paper), ModelRole::Custom)
            .unwrap();
        let hits = store.search("research_papers_custom", &query, 1).unwrap();
        assert_eq!(hits[0].id, "p2");
    }

    #[test]
    fn overlong_ids_are_skipped() {
        let cfg = config(4);
        let meta = MetadataStore::from_records(vec![
            PaperRecord::new("ok", "t", "d"),
            PaperRecord::new("x".repeat(40), "t", "d"),
        ])
        .unwrap();
        let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
        let report = build_collections(&cfg, &meta, &provider(4), &mut store).unwrap();
        assert_eq!(report.collections[0].inserted, 1);
        assert_eq!(report.collections[0].skipped, 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let cfg = config(4);
        let meta = papers(5);
        let provider = provider(4);
        let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
        build_collections(&cfg, &meta, &provider, &mut store).unwrap();
        let again = build_collections(&cfg, &meta, &provider, &mut store).unwrap();
        assert!(again.collections.iter().all(|c| !c.created));
        assert_eq!(
            store.collection("research_papers").unwrap().len(),
            5
        );
    }
}
