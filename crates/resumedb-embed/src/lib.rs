//! resumedb-embed
//!
//! Embedding providers behind `resumedb_core::traits::Embedder`: a candle BERT
//! sentence encoder for real indexes and a deterministic feature-hashing
//! embedder for tests and development.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use resumedb_core::config::{expand_path, EmbeddingBackend, EmbeddingConfig};
use resumedb_core::traits::Embedder;
use resumedb_core::types::Embedding;
use resumedb_core::{Error, Result};

pub mod device;
pub mod pool;
pub mod tokenize;

pub use pool::masked_mean_l2;

pub(crate) fn model_err(e: impl std::fmt::Display) -> Error {
    Error::ExternalService(format!("embedding model: {}", e))
}

/// Sentence encoder over a local BERT-family checkpoint (config.json,
/// tokenizer.json and model.safetensors or pytorch_model.bin).
pub struct BertEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    id: String,
    dim: usize,
    max_len: usize,
    pad_id: u32,
}

impl BertEmbedder {
    pub fn load(model_dir: &Path, max_len: usize) -> Result<Self> {
        let device = device::select_device();
        info!(dir = %model_dir.display(), "loading embedding model");
        let tokenizer_path = model_dir.join("tokenizer.json");
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::NotFound(format!("tokenizer {}: {}", tokenizer_path.display(), e))
        })?;
        let raw = std::fs::read_to_string(model_dir.join("config.json"))?;
        let config: BertConfig = serde_json::from_str(&raw)?;
        let fields: serde_json::Value = serde_json::from_str(&raw)?;
        let dim = fields["hidden_size"].as_u64().unwrap_or(0) as usize;
        let max_positions = fields["max_position_embeddings"].as_u64().unwrap_or(512) as usize;
        let weights = load_weights(model_dir, &device)?;
        let vb = VarBuilder::from_tensors(weights, DType::F32, &device);
        let model = BertModel::load(vb, &config).map_err(model_err)?;
        let pad_id = tokenizer.get_padding().map(|p| p.pad_id).unwrap_or(0);
        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "bert".into());
        info!(model = %name, dim, "embedding model loaded");
        Ok(Self {
            model,
            tokenizer,
            device,
            id: format!("bert:{}:d{}", name, dim),
            dim,
            max_len: max_len.min(max_positions),
            pad_id,
        })
    }
}

fn load_weights(model_dir: &Path, device: &Device) -> Result<HashMap<String, Tensor>> {
    let safetensors = model_dir.join("model.safetensors");
    if safetensors.exists() {
        return candle_core::safetensors::load(&safetensors, device).map_err(model_err);
    }
    let pickle = model_dir.join("pytorch_model.bin");
    if pickle.exists() {
        let tensors = candle_core::pickle::read_all(&pickle).map_err(model_err)?;
        return Ok(tensors.into_iter().collect());
    }
    Err(Error::NotFound(format!("no model weights under {}", model_dir.display())))
}

impl Embedder for BertEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        self.max_len
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let start = Instant::now();
        let (input_ids, attention_mask) = tokenize::tokenize_batch(
            &self.tokenizer,
            texts,
            self.max_len,
            self.pad_id,
            &self.device,
        )?;
        let token_type_ids = input_ids.zeros_like().map_err(model_err)?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))
            .map_err(model_err)?;
        let pooled = masked_mean_l2(&hidden, &attention_mask).map_err(model_err)?;
        let out: Vec<Vec<f32>> =
            pooled.to_device(&Device::Cpu).and_then(|t| t.to_vec2()).map_err(model_err)?;
        let elapsed = start.elapsed();
        if elapsed.as_millis() > 100 * texts.len() as u128 {
            warn!(batch = texts.len(), ?elapsed, "slow embedding batch");
        }
        debug!(batch = texts.len(), ?elapsed, "embedded batch");
        Ok(out)
    }
}

/// Feature-hashing embedder. Each whitespace token lands in one bucket picked
/// by its xxHash64; the vector is L2-normalized. Same text, same vector.
pub struct HashEmbedder {
    dim: usize,
    id: String,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim, id: format!("hash:d{}", dim) }
    }

    fn embed_text(&self, text: &str) -> Embedding {
        use std::hash::{Hash, Hasher};
        use twox_hash::XxHash64;
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl Embedder for HashEmbedder {
    fn id(&self) -> &str {
        &self.id
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn max_len(&self) -> usize {
        usize::MAX
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Pick the embedder from config. `APP_USE_FAKE_EMBEDDINGS=1` forces the hash
/// embedder regardless of `embedding.backend`.
pub fn default_embedder(config: &EmbeddingConfig, dim: usize) -> Result<Box<dyn Embedder>> {
    if env_flag("APP_USE_FAKE_EMBEDDINGS") || config.backend == EmbeddingBackend::Hash {
        info!(dim, "using hash embedder");
        return Ok(Box::new(HashEmbedder::new(dim)));
    }
    let model_dir = resolve_model_dir(&config.model_dir)?;
    let embedder = BertEmbedder::load(&model_dir, config.max_len)?;
    if embedder.dim() != dim {
        return Err(Error::InvalidConfig(format!(
            "model {} produces {}-d vectors but index.dim is {}",
            embedder.id(),
            embedder.dim(),
            dim
        )));
    }
    Ok(Box::new(embedder))
}

fn resolve_model_dir(configured: &str) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("APP_MODEL_DIR") {
        let p = expand_path(&dir);
        if p.exists() {
            return Ok(p);
        }
    }
    let p = expand_path(configured);
    if p.exists() {
        return Ok(p);
    }
    Err(Error::NotFound(format!("embedding model directory {}", p.display())))
}
