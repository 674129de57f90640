//! # Paper metadata store
//!
//! Read-only mapping from paper identifier to [`PaperRecord`]. The store is
//! loaded exactly once at startup from a CSV file and shared (behind an
//! `Arc`) by every request afterwards. Nothing mutates it after load.
//!
//! The CSV must have a header row with at least the `id`, `title` and
//! `description` columns. Any other columns are ignored.
//!
//! ```
//! use metadata::{MetadataStore, PaperRecord};
//!
//! let store = MetadataStore::from_records(vec![PaperRecord::new(
//!     "p1",
//!     "Deep Learning",
//!     "A survey of deep learning methods",
//! )])
//! .unwrap();
//!
//! assert_eq!(store.lookup("p1").unwrap().title, "Deep Learning");
//! assert!(store.lookup("p2").is_none());
//! ```
//!
//! A lookup miss is not an error: the retrieval layer substitutes
//! [`MISSING_FIELD`] for the title and description instead.

mod error;
mod record;

pub use crate::error::MetadataError;
pub use crate::record::{truncate_chars, PaperRecord, MISSING_FIELD};

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::record::CsvRow;

const REQUIRED_COLUMNS: [&str; 3] = ["id", "title", "description"];

/// In-memory, immutable id -> record map.
#[derive(Debug, Default, Clone)]
pub struct MetadataStore {
    records: HashMap<String, PaperRecord>,
}

impl MetadataStore {
    /// Load the store from a CSV file on disk.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self, MetadataError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MetadataError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            records = store.len(),
            "Loaded paper metadata"
        );
        Ok(store)
    }

    /// Parse CSV content from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, MetadataError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(MetadataError::from_csv)?
            .clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(MetadataError::MissingColumn(column));
            }
        }

        let mut records = HashMap::new();
        for raw in csv_reader.records() {
            let raw = raw.map_err(MetadataError::from_csv)?;
            // Quoted fields may span lines, so take the line from the parser.
            let line = raw.position().map(|pos| pos.line()).unwrap_or(0);
            let row: CsvRow = raw
                .deserialize(Some(&headers))
                .map_err(MetadataError::from_csv)?;
            let record = PaperRecord::from(row);
            if record.id.is_empty() {
                return Err(MetadataError::EmptyId(line));
            }
            if records.contains_key(&record.id) {
                return Err(MetadataError::DuplicateId {
                    id: record.id,
                    line,
                });
            }
            records.insert(record.id.clone(), record);
        }

        Ok(Self { records })
    }

    /// Build a store from records already in memory.
    pub fn from_records<I>(records: I) -> Result<Self, MetadataError>
    where
        I: IntoIterator<Item = PaperRecord>,
    {
        let mut map = HashMap::new();
        for (idx, record) in records.into_iter().enumerate() {
            let line = idx as u64 + 1;
            if record.id.is_empty() {
                return Err(MetadataError::EmptyId(line));
            }
            if map.contains_key(&record.id) {
                return Err(MetadataError::DuplicateId {
                    id: record.id,
                    line,
                });
            }
            map.insert(record.id.clone(), record);
        }
        Ok(Self { records: map })
    }

    pub fn lookup(&self, id: &str) -> Option<&PaperRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records sorted by id, so bulk jobs see a stable order.
    pub fn iter_sorted(&self) -> impl Iterator<Item = &PaperRecord> {
        let mut records: Vec<&PaperRecord> = self.records.values().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "id,title,description,categories\n\
p1,Deep Learning,\"A survey of deep learning methods, old and new\",cs.LG\n\
p2,Graph Networks,Message passing on graphs,cs.AI\n";

    #[test]
    fn parses_required_columns_and_ignores_extra() {
        let store = MetadataStore::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.len(), 2);
        let p1 = store.lookup("p1").unwrap();
        assert_eq!(p1.title, "Deep Learning");
        assert_eq!(
            p1.description,
            "A survey of deep learning methods, old and new"
        );
    }

    #[test]
    fn quoted_multiline_description() {
        let csv = "id,title,description\np1,T,\"line one\nline two\"\n";
        let store = MetadataStore::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(store.lookup("p1").unwrap().description, "line one\nline two");
    }

    #[test]
    fn empty_cells_become_empty_strings() {
        let csv = "id,title,description\np1,,\n";
        let store = MetadataStore::from_reader(csv.as_bytes()).unwrap();
        let record = store.lookup("p1").unwrap();
        assert_eq!(record.title, "");
        assert_eq!(record.description, "");
    }

    #[test]
    fn missing_description_column_is_fatal() {
        let csv = "id,title\np1,T\n";
        let err = MetadataStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, MetadataError::MissingColumn("description")));
    }

    #[test]
    fn ragged_row_is_malformed() {
        let csv = "id,title,description\np1,T,D\np2,T\n";
        let err = MetadataStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, MetadataError::Malformed { .. }));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let csv = "id,title,description\np1,A,a\np1,B,b\n";
        let err = MetadataStore::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            MetadataError::DuplicateId { id, line } => {
                assert_eq!(id, "p1");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_id_is_rejected() {
        let csv = "id,title,description\n,A,a\n";
        let err = MetadataStore::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, MetadataError::EmptyId(2)));
    }

    #[test]
    fn lookup_miss_is_none() {
        let store = MetadataStore::from_reader(SAMPLE.as_bytes()).unwrap();
        assert!(store.lookup("nope").is_none());
        assert!(!store.contains("nope"));
    }

    #[test]
    fn load_csv_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let store = MetadataStore::load_csv(file.path()).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("p2"));
    }

    #[test]
    fn load_csv_missing_file_is_unreadable() {
        let err = MetadataStore::load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, MetadataError::Unreadable { .. }));
    }

    #[test]
    fn from_records_rejects_duplicates() {
        let err = MetadataStore::from_records(vec![
            PaperRecord::new("a", "t", "d"),
            PaperRecord::new("a", "t2", "d2"),
        ])
        .unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateId { .. }));
    }

    #[test]
    fn iter_sorted_is_ordered_by_id() {
        let store = MetadataStore::from_records(vec![
            PaperRecord::new("c", "", ""),
            PaperRecord::new("a", "", ""),
            PaperRecord::new("b", "", ""),
        ])
        .unwrap();
        let ids: Vec<&str> = store.iter_sorted().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}
