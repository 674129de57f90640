use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::SemanticError;

/// Which backend an encoder runs on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMode {
    /// Local ONNX sentence-transformer plus `tokenizer.json`.
    #[default]
    Onnx,
    /// Deterministic hash-derived vectors. Development and tests only.
    Fast,
}

/// Describes one encoder: where its weights live and how to post-process vectors.
///
/// # Example
/// ```
/// use semantic::{EncoderConfig, EncoderMode};
///
/// let cfg = EncoderConfig {
///     mode: EncoderMode::Fast,
///     model_name: "all-MiniLM-L6-v2".into(),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EncoderConfig {
    pub mode: EncoderMode,
    /// Label used in logs and error messages.
    pub model_name: String,
    /// Local path of the ONNX file (also the download target when
    /// [`model_url`](Self::model_url) is set).
    pub model_path: PathBuf,
    /// Fetched when [`model_path`](Self::model_path) is missing.
    pub model_url: Option<String>,
    /// Path to `tokenizer.json`. When absent and [`tokenizer_url`](Self::tokenizer_url) is
    /// provided the file is stored next to the model.
    pub tokenizer_path: Option<PathBuf>,
    pub tokenizer_url: Option<String>,
    /// Longer inputs are truncated to this many tokens.
    pub max_sequence_length: usize,
    /// Scale vectors to unit length so inner product equals cosine similarity.
    pub normalize: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            mode: EncoderMode::Onnx,
            model_name: "all-MiniLM-L6-v2".into(),
            model_path: PathBuf::from("./models/all-MiniLM-L6-v2/model.onnx"),
            model_url: None,
            tokenizer_path: Some(PathBuf::from("./models/all-MiniLM-L6-v2/tokenizer.json")),
            tokenizer_url: None,
            max_sequence_length: 256,
            normalize: true,
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), SemanticError> {
        if self.model_name.trim().is_empty() {
            return Err(SemanticError::InvalidConfig(
                "model_name must not be empty".into(),
            ));
        }
        if self.max_sequence_length == 0 {
            return Err(SemanticError::InvalidConfig(format!(
                "max_sequence_length must be > 0 for model '{}'",
                self.model_name
            )));
        }
        if self.mode == EncoderMode::Onnx
            && self.tokenizer_path.is_none()
            && self.tokenizer_url.is_none()
        {
            return Err(SemanticError::InvalidConfig(format!(
                "model '{}' needs tokenizer_path or tokenizer_url",
                self.model_name
            )));
        }
        Ok(())
    }
}

/// Both encoders plus the optional query embedding cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Generic pretrained model.
    pub base: EncoderConfig,
    /// Domain fine-tuned model.
    pub custom: EncoderConfig,
    /// Entries per model in the query LRU cache; `0` disables caching.
    pub query_cache_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base: EncoderConfig::default(),
            custom: EncoderConfig {
                model_name: "custom-minilm".into(),
                model_path: PathBuf::from("./models/custom-minilm/model.onnx"),
                tokenizer_path: Some(PathBuf::from("./models/custom-minilm/tokenizer.json")),
                ..EncoderConfig::default()
            },
            query_cache_capacity: 0,
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), SemanticError> {
        self.base.validate()?;
        self.custom.validate()
    }
}
