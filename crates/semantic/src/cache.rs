use once_cell::sync::OnceCell;
use onnxruntime::{environment::Environment, session::Session};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;
use tokenizers::Tokenizer;

use crate::assets::ModelAssets;
use crate::SemanticError;

static ORT_ENV: OnceCell<Environment> = OnceCell::new();

// ONNX sessions are not `Sync`, so every worker thread keeps its own copy.
thread_local! {
    static MODEL_CACHE: RefCell<HashMap<ModelCacheKey, Rc<CachedModel>>> =
        RefCell::new(HashMap::new());
}

#[derive(Hash, PartialEq, Eq, Clone)]
struct ModelCacheKey {
    model_path: PathBuf,
    tokenizer_path: PathBuf,
    max_sequence_length: usize,
}

pub(crate) struct CachedModel {
    pub(crate) tokenizer: Tokenizer,
    pub(crate) session: RefCell<Session<'static>>,
}

impl CachedModel {
    fn load(assets: &ModelAssets, max_sequence_length: usize) -> Result<Self, SemanticError> {
        let mut tokenizer = Tokenizer::from_file(&assets.tokenizer_path)
            .map_err(|e| SemanticError::Inference(e.to_string()))?;
        tokenizer
            .with_truncation(Some(tokenizers::TruncationParams {
                max_length: max_sequence_length,
                ..Default::default()
            }))
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        let env = ort_environment()?;
        let session = env
            .new_session_builder()
            .map_err(|e| SemanticError::Inference(e.to_string()))?
            .with_model_from_file(assets.model_path.clone())
            .map_err(|e| SemanticError::Inference(e.to_string()))?;

        Ok(Self {
            tokenizer,
            session: RefCell::new(session),
        })
    }
}

/// Returns this thread's handle for `assets`, loading it on first use.
pub(crate) fn get_or_load_model_handle(
    assets: &ModelAssets,
    max_sequence_length: usize,
) -> Result<Rc<CachedModel>, SemanticError> {
    let key = ModelCacheKey {
        model_path: assets.model_path.clone(),
        tokenizer_path: assets.tokenizer_path.clone(),
        max_sequence_length,
    };

    MODEL_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(handle) = cache.get(&key) {
            return Ok(handle.clone());
        }

        tracing::debug!(model = %assets.model_path.display(), "Loading ONNX session on worker thread");
        let handle = Rc::new(CachedModel::load(assets, max_sequence_length)?);
        cache.insert(key, handle.clone());
        Ok(handle)
    })
}

fn ort_environment() -> Result<&'static Environment, SemanticError> {
    ORT_ENV.get_or_try_init(|| {
        Environment::builder()
            .with_name("scholar-semantic")
            .build()
            .map_err(|e| SemanticError::Inference(e.to_string()))
    })
}
