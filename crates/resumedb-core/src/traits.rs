use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::Embedding;

/// Text to dense vector. Implementations return one L2-normalized vector of
/// `dim()` floats per input, in input order.
pub trait Embedder: Send + Sync {
    /// Stable identifier for the model (e.g. `hash:d384`).
    fn id(&self) -> &str;
    fn dim(&self) -> usize;
    fn max_len(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    fn embed_one(&self, text: &str) -> Result<Embedding> {
        let mut out = self.embed_batch(&[text.to_string()])?;
        out.pop().ok_or_else(|| {
            Error::ExternalService(format!("embedder {} returned no vector", self.id()))
        })
    }
}

/// Prompt to free text. Backend failures surface as
/// [`Error::ExternalService`]. Dropping the returned future abandons the
/// request.
#[async_trait]
pub trait Completer: Send + Sync {
    fn id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String>;
}
