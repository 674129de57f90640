//! YAML configuration for Scholar Stream.
//!
//! One file describes the whole deployment: the vector dimension, where the
//! metadata CSV lives, which model backs each embedding space, the collection
//! names, the index directory and IVF knobs, and retrieval limits.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "arxiv demo"
//! dimension: 384
//!
//! metadata:
//!   path: "./data/papers.csv"
//!
//! models:
//!   base:
//!     mode: "onnx"
//!     model_name: "all-MiniLM-L6-v2"
//!     model_path: "./models/all-MiniLM-L6-v2/model.onnx"
//!     tokenizer_path: "./models/all-MiniLM-L6-v2/tokenizer.json"
//!   custom:
//!     mode: "onnx"
//!     model_name: "finetuned-minilm"
//!     model_path: "./models/finetuned/model.onnx"
//!     tokenizer_path: "./models/finetuned/tokenizer.json"
//!   query_cache_capacity: 0
//!
//! collections:
//!   base: "research_papers"
//!   custom: "research_papers_custom"
//!
//! index:
//!   data_dir: "./data/index"
//!   ivf:
//!     nlist: 384
//!     nprobe: 10
//!
//! retrieval:
//!   top_k: 10
//!   description_chars: 100
//! ```
//!
//! ## Environment overrides
//!
//! [`ScholarConfig::load`] applies these after reading the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `SCHOLAR_DIMENSION` | `dimension` |
//! | `SCHOLAR_METADATA_PATH` | `metadata.path` |
//! | `SCHOLAR_INDEX_DIR` | `index.data_dir` |
//! | `SCHOLAR_ENCODER_MODE` | `models.base.mode` and `models.custom.mode` |
//! | `SCHOLAR_BASE_MODEL_PATH` | `models.base.model_path` |
//! | `SCHOLAR_CUSTOM_MODEL_PATH` | `models.custom.model_path` |
//! | `SCHOLAR_TOP_K` | `retrieval.top_k` |
//! | `SCHOLAR_NPROBE` | `index.ivf.nprobe` |

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use index::{CollectionSchema, CompressionConfig, IvfConfig, StoreConfig, DEFAULT_MAX_ID_LENGTH};
use retrieval::RetrievalConfig;
use semantic::{EncoderMode, ModelRole, ProviderConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),

    #[error("invalid value for {key}: {reason}")]
    EnvOverride { key: String, reason: String },
}

/// Top-level configuration for a Scholar Stream deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScholarConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Width of every embedding, in both spaces.
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    #[serde(default)]
    pub metadata: MetadataYamlConfig,

    /// Base and custom encoders.
    #[serde(default)]
    pub models: ProviderConfig,

    #[serde(default)]
    pub collections: CollectionsYamlConfig,

    #[serde(default)]
    pub index: IndexYamlConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub build: BuildYamlConfig,
}

impl ScholarConfig {
    /// Reads `path`, applies `SCHOLAR_*` environment overrides, then validates.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        let mut config: ScholarConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file from the given path, without env overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: ScholarConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Applies overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_overrides_with<F>(&mut self, lookup: F) -> Result<(), ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SCHOLAR_DIMENSION") {
            self.dimension = parse_env("SCHOLAR_DIMENSION", &v)?;
        }
        if let Some(v) = lookup("SCHOLAR_METADATA_PATH") {
            self.metadata.path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SCHOLAR_INDEX_DIR") {
            self.index.data_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SCHOLAR_ENCODER_MODE") {
            let mode = match v.trim().to_ascii_lowercase().as_str() {
                "onnx" => EncoderMode::Onnx,
                "fast" => EncoderMode::Fast,
                other => {
                    return Err(ConfigLoadError::EnvOverride {
                        key: "SCHOLAR_ENCODER_MODE".into(),
                        reason: format!("unknown mode '{other}', expected onnx or fast"),
                    });
                }
            };
            self.models.base.mode = mode;
            self.models.custom.mode = mode;
        }
        if let Some(v) = lookup("SCHOLAR_BASE_MODEL_PATH") {
            self.models.base.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SCHOLAR_CUSTOM_MODEL_PATH") {
            self.models.custom.model_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("SCHOLAR_TOP_K") {
            self.retrieval.top_k = parse_env("SCHOLAR_TOP_K", &v)?;
        }
        if let Some(v) = lookup("SCHOLAR_NPROBE") {
            self.index.ivf.nprobe = parse_env("SCHOLAR_NPROBE", &v)?;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        if self.dimension == 0 {
            return Err(ConfigLoadError::Validation("dimension must be > 0".into()));
        }
        self.models
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.collections.validate(self.dimension)?;
        self.index
            .ivf
            .validate()
            .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        self.retrieval
            .validate()
            .map_err(ConfigLoadError::Validation)?;
        self.build.validate()?;
        Ok(())
    }

    pub fn collection_name(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Base => &self.collections.base,
            ModelRole::Custom => &self.collections.custom,
        }
    }

    /// Schema used when creating the collection for `role`.
    pub fn collection_schema(&self, role: ModelRole) -> CollectionSchema {
        CollectionSchema::new(self.collection_name(role), self.dimension)
            .with_max_id_length(self.collections.max_id_length)
            .with_description(format!("Research paper embeddings ({role} model)"))
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            data_dir: self.index.data_dir.clone(),
            compression: self.index.compression.clone(),
            ivf: self.index.ivf,
        }
    }
}

impl Default for ScholarConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            dimension: default_dimension(),
            metadata: MetadataYamlConfig::default(),
            models: ProviderConfig::default(),
            collections: CollectionsYamlConfig::default(),
            index: IndexYamlConfig::default(),
            retrieval: RetrievalConfig::default(),
            build: BuildYamlConfig::default(),
        }
    }
}

/// Metadata source YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetadataYamlConfig {
    #[serde(default = "default_metadata_path")]
    pub path: PathBuf,
}

impl Default for MetadataYamlConfig {
    fn default() -> Self {
        Self {
            path: default_metadata_path(),
        }
    }
}

/// Collection names, one per embedding space.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionsYamlConfig {
    #[serde(default = "default_base_collection")]
    pub base: String,

    #[serde(default = "default_custom_collection")]
    pub custom: String,

    #[serde(default = "default_max_id_length")]
    pub max_id_length: usize,
}

impl CollectionsYamlConfig {
    fn validate(&self, dimension: usize) -> Result<(), ConfigLoadError> {
        if self.base == self.custom {
            return Err(ConfigLoadError::Validation(format!(
                "base and custom collections must differ, both are '{}'",
                self.base
            )));
        }
        for name in [&self.base, &self.custom] {
            CollectionSchema::new(name.as_str(), dimension)
                .with_max_id_length(self.max_id_length)
                .validate()
                .map_err(|e| ConfigLoadError::Validation(e.to_string()))?;
        }
        Ok(())
    }
}

impl Default for CollectionsYamlConfig {
    fn default() -> Self {
        Self {
            base: default_base_collection(),
            custom: default_custom_collection(),
            max_id_length: default_max_id_length(),
        }
    }
}

/// Index YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexYamlConfig {
    /// Snapshot directory; `null` keeps collections in memory only.
    #[serde(default = "default_index_dir")]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub compression: CompressionConfig,

    #[serde(default)]
    pub ivf: IvfConfig,
}

impl Default for IndexYamlConfig {
    fn default() -> Self {
        Self {
            data_dir: default_index_dir(),
            compression: CompressionConfig::default(),
            ivf: IvfConfig::default(),
        }
    }
}

/// Bulk build YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BuildYamlConfig {
    /// Papers encoded per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl BuildYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.batch_size == 0 {
            return Err(ConfigLoadError::Validation(
                "build.batch_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for BuildYamlConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigLoadError::EnvOverride {
            key: key.to_string(),
            reason: e.to_string(),
        })
}

fn default_dimension() -> usize {
    384
}
fn default_metadata_path() -> PathBuf {
    PathBuf::from("./data/papers.csv")
}
fn default_index_dir() -> Option<PathBuf> {
    Some(PathBuf::from("./data/index"))
}

fn default_base_collection() -> String {
    "research_papers".to_string()
}
fn default_custom_collection() -> String {
    "research_papers_custom".to_string()
}
fn default_max_id_length() -> usize {
    DEFAULT_MAX_ID_LENGTH
}
fn default_batch_size() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
dimension: 8
metadata:
  path: "papers.csv"
models:
  base:
    mode: "fast"
    model_name: "base-stub"
  custom:
    mode: "fast"
    model_name: "custom-stub"
"#;

        let config = ScholarConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        assert_eq!(config.dimension, 8);
        assert_eq!(config.models.base.mode, EncoderMode::Fast);
        assert_eq!(config.collections.base, "research_papers");
        assert_eq!(config.collections.custom, "research_papers_custom");
        assert_eq!(config.retrieval.top_k, 10);
        assert_eq!(config.index.ivf.nlist, 384);
        assert_eq!(config.index.ivf.nprobe, 10);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1"
dimension: 16
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = ScholarConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.dimension, 16);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ScholarConfig::default();
        assert_eq!(config.dimension, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_index_dir_defaults_to_data_index() {
        let expected = Some(PathBuf::from("./data/index"));
        assert_eq!(ScholarConfig::default().index.data_dir, expected);

        let partial = ScholarConfig::from_yaml("version: \"1\"\nindex:\n  ivf:\n    nprobe: 4\n").unwrap();
        assert_eq!(partial.index.data_dir, expected);

        let in_memory =
            ScholarConfig::from_yaml("version: \"1\"\nindex:\n  data_dir: null\n").unwrap();
        assert_eq!(in_memory.index.data_dir, None);

        let yaml = ScholarConfig::default().to_yaml().unwrap();
        assert_eq!(ScholarConfig::from_yaml(&yaml).unwrap().index.data_dir, expected);
    }

    #[test]
    fn test_unsupported_version() {
        let err = ScholarConfig::from_yaml("version: \"2.0\"\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn test_same_collection_for_both_spaces_is_rejected() {
        let yaml = r#"
version: "1.0"
collections:
  base: "papers"
  custom: "papers"
"#;
        let err = ScholarConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_collection_name_must_be_file_safe() {
        let yaml = r#"
version: "1.0"
collections:
  base: "../papers"
"#;
        assert!(ScholarConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let yaml = r#"
version: "1.0"
retrieval:
  top_k: 0
"#;
        let err = ScholarConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("SCHOLAR_METADATA_PATH", "/srv/papers.csv"),
            ("SCHOLAR_INDEX_DIR", "/srv/index"),
            ("SCHOLAR_ENCODER_MODE", "FAST"),
            ("SCHOLAR_TOP_K", "25"),
            ("SCHOLAR_NPROBE", "32"),
            ("SCHOLAR_CUSTOM_MODEL_PATH", "/srv/models/ft.onnx"),
        ]
        .into_iter()
        .collect();

        let mut config = ScholarConfig::default();
        config
            .apply_env_overrides_with(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.metadata.path, PathBuf::from("/srv/papers.csv"));
        assert_eq!(config.index.data_dir, Some(PathBuf::from("/srv/index")));
        assert_eq!(config.models.base.mode, EncoderMode::Fast);
        assert_eq!(config.models.custom.mode, EncoderMode::Fast);
        assert_eq!(config.retrieval.top_k, 25);
        assert_eq!(config.index.ivf.nprobe, 32);
        assert_eq!(
            config.models.custom.model_path,
            PathBuf::from("/srv/models/ft.onnx")
        );
        assert_eq!(config.store_config().data_dir, Some(PathBuf::from("/srv/index")));
    }

    #[test]
    fn test_bad_env_override_names_the_variable() {
        let mut config = ScholarConfig::default();
        let err = config
            .apply_env_overrides_with(|key| (key == "SCHOLAR_TOP_K").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("SCHOLAR_TOP_K"));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = ScholarConfig {
            name: Some("roundtrip".into()),
            ..ScholarConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(ScholarConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_collection_schema_follows_config() {
        let config = ScholarConfig::default();
        let schema = config.collection_schema(ModelRole::Custom);
        assert_eq!(schema.name, "research_papers_custom");
        assert_eq!(schema.dimension, 384);
        assert_eq!(schema.max_id_length, 36);
    }
}
