#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use scholar_stream::{PaperRecord, ScholarConfig};
use tempfile::TempDir;

pub const PAPERS: &[(&str, &str, &str)] = &[
    ("2101.00001", "Attention Is All You Need", "Sequence transduction with self-attention only."),
    ("2101.00002", "Graph Attention Networks", "Masked self-attention over graph neighbourhoods."),
    ("2101.00003", "Deep Residual Learning", "Identity shortcuts make very deep networks trainable."),
    ("2101.00004", "BERT", "Bidirectional pre-training of transformers for language understanding."),
    ("2101.00005", "Adam", "A method for stochastic optimization."),
    ("2101.00006", "Dropout", ""),
];

/// A temp directory holding `papers.csv`, an index dir and a config pointing at both.
pub struct Fixture {
    pub dir: TempDir,
    pub config: ScholarConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("papers.csv");
        write_csv(&csv, PAPERS);

        let mut config = ScholarConfig::from_yaml(
            r#"
version: "1"
dimension: 32
models:
  base:
    mode: "fast"
    model_name: "base-stub"
    normalize: true
  custom:
    mode: "fast"
    model_name: "custom-stub"
    normalize: true
build:
  batch_size: 4
"#,
        )
        .unwrap();
        config.metadata.path = csv;
        config.index.data_dir = Some(dir.path().join("index"));
        Self { dir, config }
    }

    pub fn index_dir(&self) -> PathBuf {
        self.dir.path().join("index")
    }
}

pub fn write_csv(path: &Path, rows: &[(&str, &str, &str)]) {
    let mut out = String::from("id,title,description\n");
    for (id, title, description) in rows {
        out.push_str(&format!("{id},\"{title}\",\"{description}\"\n"));
    }
    fs::write(path, out).unwrap();
}

pub fn record(idx: usize) -> PaperRecord {
    let (id, title, description) = PAPERS[idx];
    PaperRecord::new(id, title, description)
}
