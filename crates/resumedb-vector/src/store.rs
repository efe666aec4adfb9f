use serde::{Deserialize, Serialize};
use tracing::debug;

use resumedb_core::config::SearchConfig;
use resumedb_core::types::{ChunkMetadata, DocType, Embedding, SearchHit};
use resumedb_core::{Error, Result};

use crate::flat::FlatIpIndex;

/// Side-car payload, one entry per vector ordinal.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PayloadStore {
    pub contents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
}

impl PayloadStore {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// Vectors and their payloads behind one owner. Ordinal `i` of the flat
/// index always describes `payload.contents[i]` / `payload.metadata[i]`.
#[derive(Debug, Clone)]
pub struct VectorStore {
    pub(crate) index: FlatIpIndex,
    pub(crate) payload: PayloadStore,
    pub(crate) policy: SearchConfig,
    pub(crate) embedder_id: Option<String>,
}

impl VectorStore {
    pub fn new(dim: usize) -> Self {
        Self::with_policy(dim, SearchConfig::default())
    }

    pub fn with_policy(dim: usize, policy: SearchConfig) -> Self {
        Self {
            index: FlatIpIndex::new(dim),
            payload: PayloadStore::default(),
            policy,
            embedder_id: None,
        }
    }

    /// Assemble a store from parts, enforcing the ordinal invariant.
    pub(crate) fn from_parts(
        index: FlatIpIndex,
        payload: PayloadStore,
        policy: SearchConfig,
    ) -> Result<Self> {
        let vectors = index.len();
        if vectors != payload.contents.len() || payload.contents.len() != payload.metadata.len() {
            return Err(Error::IndexCorruption(format!(
                "{} vectors but {} contents and {} metadata entries",
                vectors,
                payload.contents.len(),
                payload.metadata.len()
            )));
        }
        Ok(Self { index, payload, policy, embedder_id: None })
    }

    pub fn dim(&self) -> usize {
        self.index.dim()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn embedder_id(&self) -> Option<&str> {
        self.embedder_id.as_deref()
    }

    pub fn set_embedder_id(&mut self, id: impl Into<String>) {
        self.embedder_id = Some(id.into());
    }

    pub fn metadata(&self) -> impl Iterator<Item = &ChunkMetadata> {
        self.payload.metadata.iter()
    }

    /// Append vectors with their payloads. Everything is validated first, so a
    /// failure leaves the store unchanged.
    pub fn add(
        &mut self,
        vectors: &[Embedding],
        contents: &[String],
        metadata: &[ChunkMetadata],
    ) -> Result<()> {
        if vectors.len() != contents.len() || contents.len() != metadata.len() {
            return Err(Error::LengthMismatch {
                vectors: vectors.len(),
                contents: contents.len(),
                metadata: metadata.len(),
            });
        }
        self.index.check(vectors)?;
        self.index.add(vectors)?;
        self.payload.contents.extend_from_slice(contents);
        self.payload.metadata.extend_from_slice(metadata);
        debug_assert_eq!(self.index.len(), self.payload.len());
        Ok(())
    }

    /// Candidate pool size for one query: widened when a type filter will
    /// discard part of the neighbourhood, floored, and capped at the corpus.
    pub fn candidate_count(&self, top_k: usize, filtered: bool) -> usize {
        let multiplier = if filtered {
            self.policy.filtered_multiplier
        } else {
            self.policy.unfiltered_multiplier
        };
        top_k.saturating_mul(multiplier).max(self.policy.min_candidates).min(self.len())
    }

    /// Up to `top_k` hits by descending inner product, optionally restricted
    /// to one document type. Filtering never reorders.
    pub fn search(
        &self,
        query: &[f32],
        top_k: usize,
        filter_type: Option<DocType>,
    ) -> Result<Vec<SearchHit>> {
        if self.is_empty() {
            return Err(Error::EmptyIndex);
        }
        let search_k = self.candidate_count(top_k, filter_type.is_some());
        let neighbors = self.index.search(query, search_k)?;
        let mut results = Vec::with_capacity(top_k.min(search_k));
        for n in neighbors {
            if results.len() >= top_k {
                break;
            }
            let Some(ordinal) = n.ordinal else { continue };
            let meta = &self.payload.metadata[ordinal];
            if filter_type.is_some_and(|t| meta.doc_type != t) {
                continue;
            }
            results.push(SearchHit {
                content: self.payload.contents[ordinal].clone(),
                metadata: meta.clone(),
                score: n.score,
            });
        }
        debug!(top_k, search_k, filter = ?filter_type, returned = results.len(), "vector search");
        Ok(results)
    }
}
