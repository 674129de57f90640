//! # Vector collections
//!
//! Named collections of (paper id, embedding) pairs with top-K inner-product
//! search. Each collection lives in exactly one embedding space; the crate
//! never mixes vectors across collections.
//!
//! ## Core Features
//!
//! - **Inner-product ranking**: higher score = more similar. Scores are the
//!   raw dot product, never rescaled.
//! - **IVF acceleration**: [`VectorStore::build_index`] trains a seeded
//!   inverted-file index; smaller collections are scanned exactly. See [`ivf`].
//! - **Snapshots**: one zstd-compressed bincode file per collection. A file
//!   that fails to decode marks only that collection as corrupt.
//! - **Search seam**: callers depend on [`VectorSearch`], so tests can swap
//!   in failing or counting indexes.
//!
//! ## Example Usage
//!
//! ```
//! use index::{CollectionSchema, IvfConfig, VectorSearch, VectorStore};
//!
//! let mut store = VectorStore::in_memory(IvfConfig::default()).unwrap();
//! store
//!     .create_collection(CollectionSchema::new("research_papers", 3))
//!     .unwrap();
//! store.insert("research_papers", "p1", &[0.87, 0.0, 0.0]).unwrap();
//! store.insert("research_papers", "p2", &[0.0, 1.0, 0.0]).unwrap();
//!
//! let hits = store.search("research_papers", &[1.0, 0.0, 0.0], 10).unwrap();
//! assert_eq!(hits[0].id, "p1");
//! assert!((hits[0].score - 0.87).abs() < 1e-6);
//! ```

mod collection;
pub mod ivf;
mod schema;
mod store;

pub use crate::collection::Collection;
pub use crate::ivf::IvfConfig;
pub use crate::schema::{CollectionSchema, Metric, DEFAULT_MAX_ID_LENGTH};
pub use crate::store::{CollectionStatus, StoreConfig, VectorStore, SNAPSHOT_FORMAT_VERSION};

use bincode::error::{DecodeError, EncodeError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zstd::{decode_all, encode_all};

/// One search result: a stored id and its raw inner-product score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

/// Top-K search over named collections.
pub trait VectorSearch: Send + Sync {
    /// At most `top_k` hits from `collection`, best first.
    fn search(
        &self,
        collection: &str,
        query: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchHit>, IndexError>;
}

/// Compression codec options for snapshots.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionCodec {
    None,
    #[default]
    Zstd,
}

/// Compression behavior configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    pub codec: CompressionCodec,
    /// Zstd level (1-22, higher = smaller but slower).
    pub level: i32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            codec: CompressionCodec::default(),
            level: 3,
        }
    }
}

impl CompressionConfig {
    pub fn new(codec: CompressionCodec, level: i32) -> Self {
        Self { codec, level }
    }

    pub(crate) fn compress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                encode_all(data, self.level).map_err(|e| IndexError::Zstd(e.to_string()))
            }
        }
    }

    pub(crate) fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, IndexError> {
        match self.codec {
            CompressionCodec::None => Ok(data.to_vec()),
            CompressionCodec::Zstd => {
                decode_all(data).map_err(|e| IndexError::Zstd(e.to_string()))
            }
        }
    }
}

/// Errors raised by collection management and search.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),
    #[error("collection '{name}' is corrupt: {reason}")]
    CollectionCorrupt { name: String, reason: String },
    #[error("collection '{collection}' expects {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
    #[error("invalid id: {0}")]
    InvalidId(String),
    #[error("invalid index config: {0}")]
    InvalidConfig(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("Serialization encode error: {0}")]
    Encode(String),
    #[error("Serialization decode error: {0}")]
    Decode(String),
    #[error("Compression error: {0}")]
    Zstd(String),
}

impl From<EncodeError> for IndexError {
    fn from(e: EncodeError) -> Self {
        IndexError::Encode(e.to_string())
    }
}

impl From<DecodeError> for IndexError {
    fn from(e: DecodeError) -> Self {
        IndexError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zstd_round_trip() {
        let cfg = CompressionConfig::default();
        let data = b"research_papers research_papers research_papers".to_vec();
        let packed = cfg.compress(&data).unwrap();
        assert_eq!(cfg.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn decompress_garbage_is_zstd_error() {
        let cfg = CompressionConfig::default();
        assert!(matches!(
            cfg.decompress(b"not a frame"),
            Err(IndexError::Zstd(_))
        ));
    }

    #[test]
    fn none_codec_passes_through() {
        let cfg = CompressionConfig::new(CompressionCodec::None, 0);
        assert_eq!(cfg.compress(b"abc").unwrap(), b"abc".to_vec());
    }

    #[test]
    fn error_messages_name_the_collection() {
        let err = IndexError::CollectionCorrupt {
            name: "research_papers_custom".into(),
            reason: "bad frame".into(),
        };
        assert!(err.to_string().contains("research_papers_custom"));
    }
}
