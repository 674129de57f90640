use crate::assets::{resolve_model_assets, ModelAssets};
use crate::cache::get_or_load_model_handle;
use crate::normalize::l2_normalize_in_place;
use crate::onnx::run_onnx_embeddings;
use crate::stub::make_stub_vector;
use crate::{EncoderConfig, EncoderMode, SemanticError};

/// Maps text to a fixed-length dense vector in one embedding space.
///
/// Implementations must be deterministic for fixed weights and safe to call
/// from many threads at once.
pub trait TextEncoder: Send + Sync {
    /// Label of the model behind this encoder.
    fn model_name(&self) -> &str;

    /// Length of every vector this encoder returns.
    fn dimension(&self) -> usize;

    fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError>;

    /// Encodes several texts. The default runs them one by one.
    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        texts.iter().map(|text| self.encode(text)).collect()
    }
}

/// Builds the encoder described by `cfg` and checks it produces `dimension`-long vectors.
pub async fn load_encoder(
    cfg: &EncoderConfig,
    dimension: usize,
) -> Result<Box<dyn TextEncoder>, SemanticError> {
    cfg.validate()?;
    if dimension == 0 {
        return Err(SemanticError::InvalidConfig(
            "embedding dimension must be > 0".into(),
        ));
    }
    match cfg.mode {
        EncoderMode::Fast => Ok(Box::new(StubEncoder::new(
            cfg.model_name.clone(),
            dimension,
            cfg.normalize,
        ))),
        EncoderMode::Onnx => Ok(Box::new(OnnxEncoder::load(cfg, dimension).await?)),
    }
}

/// Hash-derived encoder used when `mode: fast`.
#[derive(Debug, Clone)]
pub struct StubEncoder {
    model_name: String,
    dimension: usize,
    normalize: bool,
}

impl StubEncoder {
    pub fn new(model_name: impl Into<String>, dimension: usize, normalize: bool) -> Self {
        Self {
            model_name: model_name.into(),
            dimension,
            normalize,
        }
    }
}

impl TextEncoder for StubEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        Ok(make_stub_vector(
            &self.model_name,
            text,
            self.dimension,
            self.normalize,
        ))
    }
}

/// Sentence-transformer running on ONNX Runtime.
///
/// Holds only asset paths; the session itself lives in a per-thread cache and
/// is created the first time a thread encodes.
#[derive(Debug, Clone)]
pub struct OnnxEncoder {
    model_name: String,
    assets: ModelAssets,
    dimension: usize,
    max_sequence_length: usize,
    normalize: bool,
}

impl OnnxEncoder {
    /// Resolves (and if needed downloads) the assets, then runs one warm-up
    /// encode on the blocking pool to verify the output dimension.
    pub async fn load(cfg: &EncoderConfig, dimension: usize) -> Result<Self, SemanticError> {
        let assets = resolve_model_assets(cfg).await?;
        let encoder = Self {
            model_name: cfg.model_name.clone(),
            assets,
            dimension,
            max_sequence_length: cfg.max_sequence_length,
            normalize: cfg.normalize,
        };

        let probe = encoder.clone();
        let warmed = tokio::task::spawn_blocking(move || probe.run(&["warm-up"]))
            .await
            .map_err(|e| SemanticError::Inference(format!("warm-up task failed: {e}")))??;
        let actual = warmed.first().map(Vec::len).unwrap_or(0);
        if actual != dimension {
            return Err(SemanticError::DimensionMismatch {
                model: encoder.model_name.clone(),
                expected: dimension,
                actual,
            });
        }

        tracing::info!(
            model = %encoder.model_name,
            path = %encoder.assets.model_path.display(),
            dimension,
            "ONNX encoder ready"
        );
        Ok(encoder)
    }

    fn run(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        let handle = get_or_load_model_handle(&self.assets, self.max_sequence_length)?;
        let mut vectors = run_onnx_embeddings(handle.as_ref(), texts, self.max_sequence_length)?;
        if vectors.len() != texts.len() {
            return Err(SemanticError::Inference(format!(
                "model returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        if self.normalize {
            vectors.iter_mut().for_each(|v| l2_normalize_in_place(v));
        }
        Ok(vectors)
    }
}

impl TextEncoder for OnnxEncoder {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        self.run(&[text])?
            .pop()
            .ok_or_else(|| SemanticError::Inference("model returned no outputs".into()))
    }

    fn encode_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SemanticError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.run(texts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fast(name: &str) -> EncoderConfig {
        EncoderConfig {
            mode: EncoderMode::Fast,
            model_name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn fast_mode_builds_stub_of_requested_dimension() {
        let encoder = load_encoder(&fast("base"), 16).await.unwrap();
        assert_eq!(encoder.dimension(), 16);
        assert_eq!(encoder.model_name(), "base");
        assert_eq!(encoder.encode("query").unwrap().len(), 16);
    }

    #[tokio::test]
    async fn zero_dimension_is_rejected() {
        let err = load_encoder(&fast("base"), 0).await.err().unwrap();
        assert!(matches!(err, SemanticError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn missing_onnx_assets_fail_instead_of_falling_back() {
        let cfg = EncoderConfig {
            model_path: PathBuf::from("./missing/model.onnx"),
            tokenizer_path: Some(PathBuf::from("./missing/tokenizer.json")),
            ..Default::default()
        };
        let err = load_encoder(&cfg, 384).await.err().unwrap();
        assert!(matches!(err, SemanticError::ModelNotFound(_)));
    }

    #[test]
    fn default_batch_matches_single_encodes() {
        let encoder = StubEncoder::new("custom", 8, true);
        let batch = encoder.encode_batch(&["a", "b"]).unwrap();
        assert_eq!(batch[0], encoder.encode("a").unwrap());
        assert_eq!(batch[1], encoder.encode("b").unwrap());
    }

    #[tokio::test]
    #[ignore = "requires local ONNX + tokenizer assets under models/"]
    async fn real_model_produces_unit_vectors() {
        let cfg = EncoderConfig::default();
        let encoder = OnnxEncoder::load(&cfg, 384).await.unwrap();
        let v = encoder.encode("graph neural networks").unwrap();
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }
}
