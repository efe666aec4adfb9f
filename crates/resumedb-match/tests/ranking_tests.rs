use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use resumedb_core::config::{RankingConfig, ScoringConfig};
use resumedb_core::traits::{Completer, Embedder};
use resumedb_core::types::{ChunkMetadata, Embedding, ResumeChunk, SearchHit};
use resumedb_core::{Error, Result};
use resumedb_match::{rank_hits, ResumeMatcher};
use resumedb_vector::VectorStore;

const DIM: usize = 4;

/// Every text maps to the first axis, so a chunk's score is its first component.
struct AxisEmbedder;

impl Embedder for AxisEmbedder {
    fn id(&self) -> &str {
        "axis"
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn max_len(&self) -> usize {
        512
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0, 0.0]).collect())
    }
}

/// Answers with the first `Content:` line of the prompt, after a delay that
/// shrinks with each call so later calls finish first.
#[derive(Default)]
struct EchoCompleter {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Completer for EchoCompleter {
    fn id(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(60u64.saturating_sub(n as u64 * 20))).await;
        self.prompts.lock().unwrap().push(prompt.to_string());
        let first = prompt.lines().find_map(|l| l.strip_prefix("Content: ")).unwrap_or("");
        Ok(format!("Fit:\n- {first}"))
    }
}

struct FailingCompleter;

#[async_trait]
impl Completer for FailingCompleter {
    fn id(&self) -> &str {
        "down"
    }

    async fn complete(&self, _prompt: &str) -> Result<String> {
        Err(Error::ExternalService("backend unavailable".into()))
    }
}

struct SharedCompleter(Arc<EchoCompleter>);

#[async_trait]
impl Completer for SharedCompleter {
    fn id(&self) -> &str {
        self.0.id()
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        self.0.complete(prompt).await
    }
}

fn hit(doc_id: &str, section: &str, score: f32) -> SearchHit {
    SearchHit {
        content: format!("{doc_id} {section}"),
        metadata: ChunkMetadata::resume(doc_id, section),
        score,
    }
}

/// A: 5 chunks avg 0.85, B: 2 chunks avg 0.95, C: 1 chunk 0.99, plus one
/// job description chunk that must never be ranked.
fn scenario_store() -> VectorStore {
    let rows: Vec<(ChunkMetadata, f32)> = vec![
        (ChunkMetadata::resume("C", "Summary").with_category("Data"), 0.99),
        (ChunkMetadata::resume("B", "Skills").with_category("Engineering"), 0.96),
        (ChunkMetadata::resume("B", "Experience").with_category("Engineering"), 0.94),
        (ChunkMetadata::resume("A", "Skills").with_category("Engineering"), 0.9),
        (ChunkMetadata::resume("A", "Projects").with_category("Engineering"), 0.9),
        (ChunkMetadata::resume("A", "Skills").with_category("Engineering"), 0.85),
        (ChunkMetadata::resume("A", "Experience").with_category("Engineering"), 0.8),
        (ChunkMetadata::resume("A", "Education").with_category("Engineering"), 0.8),
        (ChunkMetadata::job_description("J", "Requirements"), 1.0),
    ];
    let mut store = VectorStore::new(DIM);
    let vectors: Vec<Embedding> = rows.iter().map(|(_, s)| vec![*s, 0.0, 0.0, 0.0]).collect();
    let contents: Vec<String> = rows
        .iter()
        .enumerate()
        .map(|(i, (m, _))| format!("{} chunk {}", m.doc_id, i))
        .collect();
    let metadata: Vec<ChunkMetadata> = rows.into_iter().map(|(m, _)| m).collect();
    store.add(&vectors, &contents, &metadata).expect("seed");
    store
}

fn matcher(completer: Box<dyn Completer>) -> ResumeMatcher {
    ResumeMatcher::new(Arc::new(scenario_store()), Box::new(AxisEmbedder), completer)
        .expect("matcher")
}

#[test]
fn breadth_outranks_single_best_chunk() {
    let hits = vec![
        hit("C", "Summary", 0.99),
        hit("B", "Skills", 0.96),
        hit("B", "Experience", 0.94),
        hit("A", "Skills", 0.9),
        hit("A", "Projects", 0.9),
        hit("A", "Skills", 0.85),
        hit("A", "Experience", 0.8),
        hit("A", "Education", 0.8),
    ];
    let full = rank_hits(hits.clone(), 10);
    let order: Vec<&str> = full.groups.iter().map(|g| g.doc_id.as_str()).collect();
    assert_eq!(order, ["A", "B", "C"]);
    assert!((full.groups[0].avg_score - 0.85).abs() < 1e-6);
    assert!((full.groups[0].rank_score - 4.25).abs() < 1e-5);
    assert!((full.groups[1].rank_score - 1.9).abs() < 1e-5);

    let top = rank_hits(hits, 2);
    assert_eq!(top.groups.len(), 2);
    assert_eq!(top.groups[1].doc_id, "B");
    assert_eq!(top.distinct_resumes, 3);
}

#[test]
fn averages_are_clamped_and_groups_unique() {
    let hits = vec![hit("X", "Skills", 1.5), hit("Y", "Skills", -0.4), hit("X", "Tools", 1.5)];
    let ranking = rank_hits(hits, 5);
    let ids: HashSet<&str> = ranking.groups.iter().map(|g| g.doc_id.as_str()).collect();
    assert_eq!(ids.len(), ranking.groups.len());
    assert_eq!(ranking.groups[0].doc_id, "X");
    assert_eq!(ranking.groups[0].avg_score, 1.0);
    assert_eq!(ranking.groups[0].count(), 2);
    assert_eq!(ranking.groups[1].avg_score, 0.0);
}

#[test]
fn ties_keep_first_encounter_order() {
    let ranking = rank_hits(vec![hit("late", "Skills", 0.5), hit("early", "Skills", 0.5)], 2);
    let order: Vec<&str> = ranking.groups.iter().map(|g| g.doc_id.as_str()).collect();
    assert_eq!(order, ["late", "early"]);
}

#[test]
fn no_hits_is_an_empty_ranking() {
    let ranking = rank_hits(Vec::new(), 5);
    assert!(ranking.is_empty());
    assert_eq!(ranking.distinct_resumes, 0);
}

#[tokio::test]
async fn match_job_assembles_report_in_rank_order() {
    let matcher = Arc::new(matcher(Box::new(EchoCompleter::default())));
    let report = matcher.match_job("job-7", "Rust backend engineer", 2).await.unwrap();

    assert_eq!(report.job_id, "job-7");
    assert_eq!(report.total_resumes_scanned, 3);
    let ids: Vec<&str> = report.top_matches.iter().map(|m| m.resume_id.as_str()).collect();
    assert_eq!(ids, ["A", "B"]);

    let a = &report.top_matches[0];
    assert_eq!(a.category, "Engineering");
    assert_eq!(a.match_score, 74.5);
    assert_eq!(a.matched_sections, ["Education", "Experience", "Projects", "Skills"]);
    assert!(a.explanation.starts_with("Fit:\n- A chunk"));
}

#[tokio::test]
async fn resumes_without_category_report_unknown() {
    let mut store = VectorStore::new(DIM);
    store
        .add(
            &[vec![0.6, 0.0, 0.0, 0.0]],
            &["plain".into()],
            &[ChunkMetadata::resume("R", "General")],
        )
        .unwrap();
    let completer = Box::new(EchoCompleter::default());
    let matcher =
        Arc::new(ResumeMatcher::new(Arc::new(store), Box::new(AxisEmbedder), completer).unwrap());
    let report = matcher.match_job("j", "anything", 5).await.unwrap();
    assert_eq!(report.top_matches[0].category, "Unknown");
    assert_eq!(report.top_matches[0].match_score, 45.0);
}

#[tokio::test]
async fn explain_caps_chunks_handed_to_backend() {
    let echo = Arc::new(EchoCompleter::default());
    let ranking = RankingConfig { explain_chunks: 2, ..RankingConfig::default() };
    let matcher = matcher(Box::new(SharedCompleter(Arc::clone(&echo))))
        .with_policies(ranking, ScoringConfig::default());
    let chunks: Vec<ResumeChunk> = (0..4)
        .map(|i| ResumeChunk { content: format!("c{i}"), section: None })
        .collect();
    matcher.explain("JD", &chunks).await.unwrap();

    let prompts = echo.prompts.lock().unwrap();
    assert_eq!(prompts[0].matches("Content: ").count(), 2);
    assert!(prompts[0].contains("Section: General"));
}

#[tokio::test]
async fn backend_failure_fails_the_match() {
    let matcher = Arc::new(matcher(Box::new(FailingCompleter)));
    let err = matcher.match_job("j", "jd", 2).await.unwrap_err();
    assert!(matches!(err, Error::ExternalService(_)));
}

#[test]
fn empty_store_surfaces_empty_index() {
    let store = Arc::new(VectorStore::new(DIM));
    let matcher =
        ResumeMatcher::new(store, Box::new(AxisEmbedder), Box::new(FailingCompleter)).unwrap();
    assert!(matches!(matcher.rank_text("jd", 3), Err(Error::EmptyIndex)));
}

#[test]
fn mismatched_embedder_is_rejected() {
    let store = Arc::new(VectorStore::new(8));
    let result = ResumeMatcher::new(store, Box::new(AxisEmbedder), Box::new(FailingCompleter));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_explanations_preserve_rank_order() -> anyhow::Result<()> {
    let matcher = Arc::new(matcher(Box::new(EchoCompleter::default())));
    let concurrent = matcher.match_job("job-7", "Rust backend engineer", 3).await?;
    let ids: Vec<&str> = concurrent.top_matches.iter().map(|m| m.resume_id.as_str()).collect();
    assert_eq!(ids, ["A", "B", "C"]);
    for m in &concurrent.top_matches {
        let expected = format!("Fit:\n- {} chunk", m.resume_id);
        assert!(m.explanation.starts_with(&expected), "{}: {}", m.resume_id, m.explanation);
    }

    let json = serde_json::to_value(&concurrent)?;
    assert_eq!(json["total_resumes_scanned"], 3);
    assert_eq!(json["top_matches"][2]["matched_sections"], serde_json::json!(["Summary"]));
    Ok(())
}
