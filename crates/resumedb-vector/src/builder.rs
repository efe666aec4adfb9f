use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use resumedb_core::config::SearchConfig;
use resumedb_core::traits::Embedder;
use resumedb_core::types::{Chunk, ChunkMetadata};
use resumedb_core::{Error, Result};

use crate::store::VectorStore;

/// Offline pipeline step: embed chunks in batches and append them to a fresh
/// store sized to the embedder's dimension.
pub struct IndexBuilder<'a> {
    embedder: &'a dyn Embedder,
    batch_size: usize,
    policy: SearchConfig,
    progress: bool,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self {
            embedder,
            batch_size: 32,
            policy: SearchConfig::default(),
            progress: false,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn policy(mut self, policy: SearchConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn build(&self, chunks: &[Chunk]) -> Result<VectorStore> {
        let mut store = VectorStore::with_policy(self.embedder.dim(), self.policy);
        store.set_embedder_id(self.embedder.id());
        if chunks.is_empty() {
            info!("no chunks to index");
            return Ok(store);
        }
        info!(chunks = chunks.len(), embedder = self.embedder.id(), "building vector store");

        let pb = if self.progress {
            ProgressBar::new(chunks.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        let template = concat!(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] ",
            "{pos}/{len} chunks ({percent}%) {msg}"
        );
        if let Ok(style) = ProgressStyle::default_bar().template(template) {
            pb.set_style(style.progress_chars("#>-"));
        }
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.content.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts)?;
            if vectors.len() != texts.len() {
                return Err(Error::ExternalService(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    texts.len()
                )));
            }
            let metadata: Vec<ChunkMetadata> = batch.iter().map(|c| c.metadata.clone()).collect();
            store.add(&vectors, &texts, &metadata)?;
            pb.inc(batch.len() as u64);
        }
        pb.finish_with_message("done");
        info!(vectors = store.len(), "vector store built");
        Ok(store)
    }
}
