//! Core inference modules
//!
//! The model-serving client and the trait the service pipeline talks to.

pub mod ollama;

use crate::error::ServiceResult;
use async_trait::async_trait;

pub use ollama::OllamaClient;

/// Trait for text-generation backends
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Generate a completion for `input` under the given system instructions
    async fn generate(&self, instructions: &str, input: &str) -> ServiceResult<String>;

    /// Name of the model requests are sent to
    fn model(&self) -> &str;
}
