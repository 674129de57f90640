use std::io;
use thiserror::Error;

/// Errors surfaced while loading or running an encoder.
#[derive(Debug, Error)]
pub enum SemanticError {
    /// The ONNX model could not be located locally and no download URL was provided.
    #[error("model file not found: {0}")]
    ModelNotFound(String),
    /// The tokenizer JSON is missing and there was no remote URL to fetch it from.
    #[error("tokenizer missing: {0}")]
    TokenizerMissing(String),
    /// Configuration is inconsistent (unknown mode, zero dimension, ...).
    #[error("invalid semantic config: {0}")]
    InvalidConfig(String),
    /// Unable to download remote assets.
    #[error("download failed: {0}")]
    Download(String),
    /// Low-level IO failures while touching the filesystem.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// ONNX Runtime or tokenizer errors.
    #[error("inference failure: {0}")]
    Inference(String),
    /// The encoder produced a vector of the wrong length.
    #[error("model '{model}' produced {actual}-dimensional vectors, expected {expected}")]
    DimensionMismatch {
        model: String,
        expected: usize,
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_model_not_found() {
        let err = SemanticError::ModelNotFound("/path/to/model.onnx".into());
        assert!(err.to_string().contains("model file not found"));
        assert!(err.to_string().contains("/path/to/model.onnx"));
    }

    #[test]
    fn error_dimension_mismatch_names_model() {
        let err = SemanticError::DimensionMismatch {
            model: "custom-minilm".into(),
            expected: 384,
            actual: 768,
        };
        let msg = err.to_string();
        assert!(msg.contains("custom-minilm"));
        assert!(msg.contains("768"));
        assert!(msg.contains("384"));
    }

    #[test]
    fn error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: SemanticError = io_err.into();
        assert!(err.to_string().contains("io error"));
    }
}
