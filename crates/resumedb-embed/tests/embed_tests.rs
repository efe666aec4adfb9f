use resumedb_core::config::{EmbeddingBackend, EmbeddingConfig};
use resumedb_core::traits::Embedder;
use resumedb_embed::{default_embedder, HashEmbedder};

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[test]
fn hash_embedder_shapes_and_determinism() {
    let embedder = HashEmbedder::new(384);
    let texts = vec!["python machine learning".to_string(), "python machine learning".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    assert_eq!(embs.len(), 2);
    assert_eq!(embs[0].len(), 384);

    let norm: f32 = dot(&embs[0], &embs[0]).sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");
    for (a, b) in embs[0].iter().zip(embs[1].iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn hash_embedder_overlapping_text_scores_higher() {
    let embedder = HashEmbedder::new(384);
    let q = embedder.embed_one("rust backend engineer").unwrap();
    let near = embedder.embed_one("senior rust backend engineer").unwrap();
    let far = embedder.embed_one("pastry chef croissants").unwrap();
    assert!(dot(&q, &near) > dot(&q, &far));
}

#[test]
fn hash_backend_needs_no_model_files() {
    let config = EmbeddingConfig {
        backend: EmbeddingBackend::Hash,
        model_dir: "/nonexistent".into(),
        ..EmbeddingConfig::default()
    };
    let embedder = default_embedder(&config, 64).expect("hash embedder");
    assert_eq!(embedder.dim(), 64);
    assert_eq!(embedder.id(), "hash:d64");
}

#[test]
fn bert_backend_with_missing_model_dir_is_not_found() {
    if std::env::var("APP_USE_FAKE_EMBEDDINGS").is_ok() || std::env::var("APP_MODEL_DIR").is_ok() {
        return;
    }
    let config = EmbeddingConfig {
        backend: EmbeddingBackend::Bert,
        model_dir: "/nonexistent/model".into(),
        ..EmbeddingConfig::default()
    };
    let err = default_embedder(&config, 384).err().expect("missing model");
    assert!(matches!(err, resumedb_core::Error::NotFound(_)));
}
