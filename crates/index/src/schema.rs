use serde::{Deserialize, Serialize};

use crate::IndexError;

/// Longest id a collection accepts unless configured otherwise.
pub const DEFAULT_MAX_ID_LENGTH: usize = 36;

/// Similarity used to rank hits. Higher scores are closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Metric {
    #[default]
    #[serde(rename = "IP")]
    InnerProduct,
}

/// Shape of a collection: its name, vector width and id limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchema {
    pub name: String,
    pub dimension: usize,
    pub max_id_length: usize,
    pub metric: Metric,
    pub description: String,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            max_id_length: DEFAULT_MAX_ID_LENGTH,
            metric: Metric::InnerProduct,
            description: String::new(),
        }
    }

    pub fn with_max_id_length(mut self, max: usize) -> Self {
        self.max_id_length = max;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Names double as snapshot file stems, so only `[A-Za-z0-9_-]` is allowed.
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.name.is_empty()
            || !self
                .name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IndexError::InvalidConfig(format!(
                "invalid collection name '{}'",
                self.name
            )));
        }
        if self.dimension == 0 {
            return Err(IndexError::InvalidConfig(format!(
                "collection '{}' must have a dimension > 0",
                self.name
            )));
        }
        if self.max_id_length == 0 {
            return Err(IndexError::InvalidConfig(format!(
                "collection '{}' must allow ids of at least one byte",
                self.name
            )));
        }
        Ok(())
    }

    pub(crate) fn check_id(&self, id: &str) -> Result<(), IndexError> {
        if id.is_empty() {
            return Err(IndexError::InvalidId("id must not be empty".into()));
        }
        if id.len() > self.max_id_length {
            return Err(IndexError::InvalidId(format!(
                "id '{id}' is {} bytes, collection '{}' allows {}",
                id.len(),
                self.name,
                self.max_id_length
            )));
        }
        Ok(())
    }

    pub(crate) fn check_dimension(&self, len: usize) -> Result<(), IndexError> {
        if len != self.dimension {
            return Err(IndexError::DimensionMismatch {
                collection: self.name.clone(),
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}
