//! Scholar Stream text encoders
//!
//! Turns query and paper text into dense vectors. Two encoders are loaded side
//! by side: `base` (a generic pretrained sentence model) and `custom` (the
//! domain fine-tuned one). Each lives in its own embedding space; vectors from
//! one must never be compared against the other's collection.
//!
//! Backends:
//!
//! - **ONNX** - Sentence-transformer exported to ONNX plus `tokenizer.json`.
//!   Token vectors are mean-pooled under the attention mask.
//! - **Fast** - Deterministic hash-derived vectors for development and tests.
//!
//! Missing or broken assets are a hard error. There is no silent fallback to
//! the stub: a service that loaded the wrong space would return nonsense.
//!
//! ## Threading notes
//!
//! ONNX sessions are cached per thread. The first encode on a thread pays the
//! setup cost; `OnnxEncoder::load` does one warm-up encode to check the output
//! dimension before anything is served.
//!
//! ## Quick example
//!
//! ```
//! use semantic::{EmbeddingProvider, EncoderConfig, EncoderMode, ModelRole, ProviderConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let stub = |name: &str| EncoderConfig {
//!     mode: EncoderMode::Fast,
//!     model_name: name.into(),
//!     ..Default::default()
//! };
//! let cfg = ProviderConfig {
//!     base: stub("base"),
//!     custom: stub("custom"),
//!     query_cache_capacity: 0,
//! };
//! let provider = EmbeddingProvider::load(&cfg, 384).await.unwrap();
//! let v = provider.encode("graph neural networks", ModelRole::Custom).unwrap();
//! assert_eq!(v.len(), 384);
//! # }
//! ```

pub mod config;
pub mod encoder;
pub mod error;
pub mod provider;

mod assets;
mod cache;
mod normalize;
mod onnx;
mod stub;

pub use crate::config::{EncoderConfig, EncoderMode, ProviderConfig};
pub use crate::encoder::{load_encoder, OnnxEncoder, StubEncoder, TextEncoder};
pub use crate::error::SemanticError;
pub use crate::provider::{EmbeddingProvider, ModelRole, RoleEncoder};
