use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use resumedb_core::config::{RankingConfig, ScoringConfig};
use resumedb_core::traits::{Completer, Embedder};
use resumedb_core::types::{DocType, ResumeChunk};
use resumedb_core::{Error, Result};
use resumedb_vector::VectorStore;

use crate::prompt::build_explanation_prompt;
use crate::ranking::{rank_hits, Ranking, ResumeGroup};
use crate::scoring::match_score;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedMatch {
    pub resume_id: String,
    pub category: String,
    pub match_score: f64,
    pub matched_sections: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchReport {
    pub job_id: String,
    pub total_resumes_scanned: usize,
    pub top_matches: Vec<RankedMatch>,
}

/// Read-only matching context: the loaded store plus the embedding and
/// explanation backends.
pub struct ResumeMatcher {
    store: Arc<VectorStore>,
    embedder: Box<dyn Embedder>,
    completer: Box<dyn Completer>,
    ranking: RankingConfig,
    scoring: ScoringConfig,
}

impl ResumeMatcher {
    pub fn new(
        store: Arc<VectorStore>,
        embedder: Box<dyn Embedder>,
        completer: Box<dyn Completer>,
    ) -> Result<Self> {
        if embedder.dim() != store.dim() {
            return Err(Error::InvalidConfig(format!(
                "embedder {} produces {}-d vectors, index holds {}-d",
                embedder.id(),
                embedder.dim(),
                store.dim()
            )));
        }
        if let Some(built_with) = store.embedder_id().filter(|id| *id != embedder.id()) {
            warn!(
                index = built_with,
                query = embedder.id(),
                "index was built with a different embedder"
            );
        }
        Ok(Self {
            store,
            embedder,
            completer,
            ranking: RankingConfig::default(),
            scoring: ScoringConfig::default(),
        })
    }

    pub fn with_policies(mut self, ranking: RankingConfig, scoring: ScoringConfig) -> Self {
        self.ranking = ranking;
        self.scoring = scoring;
        self
    }

    pub fn rank(&self, query: &[f32], top_k: usize) -> Result<Ranking> {
        let wanted = top_k.saturating_mul(self.ranking.chunk_multiplier);
        let hits = self.store.search(query, wanted, Some(DocType::Resume))?;
        let ranking = rank_hits(hits, top_k);
        debug!(
            top_k,
            wanted,
            groups = ranking.groups.len(),
            distinct = ranking.distinct_resumes,
            "ranked resumes"
        );
        Ok(ranking)
    }

    pub fn rank_text(&self, job_description: &str, top_k: usize) -> Result<Ranking> {
        let query = self.embedder.embed_one(job_description)?;
        self.rank(&query, top_k)
    }

    /// Ask the backend for a rationale over at most `explain_chunks` chunks.
    pub async fn explain(&self, job_description: &str, chunks: &[ResumeChunk]) -> Result<String> {
        let take = chunks.len().min(self.ranking.explain_chunks);
        let prompt = build_explanation_prompt(job_description, &chunks[..take]);
        self.completer.complete(&prompt).await
    }

    /// Rank, score and explain. Embedding runs on the blocking pool; the
    /// explanations are awaited together and stay in rank order. The first
    /// failed explanation fails the match and drops the others.
    pub async fn match_job(
        self: &Arc<Self>,
        job_id: &str,
        job_description: &str,
        top_k: usize,
    ) -> Result<MatchReport> {
        let start = Instant::now();
        let this = Arc::clone(self);
        let query_jd = job_description.to_string();
        let ranking = tokio::task::spawn_blocking(move || this.rank_text(&query_jd, top_k))
            .await
            .map_err(join_err)??;

        let inputs: Vec<Vec<ResumeChunk>> = ranking
            .groups
            .iter()
            .map(|group| explain_input(group, self.ranking.explain_chunks))
            .collect();
        let explanations =
            try_join_all(inputs.iter().map(|chunks| self.explain(job_description, chunks))).await?;

        let report = self.assemble(job_id, ranking, explanations);
        info!(
            job_id,
            matches = report.top_matches.len(),
            elapsed = ?start.elapsed(),
            "matched job"
        );
        Ok(report)
    }

    fn assemble(&self, job_id: &str, ranking: Ranking, explanations: Vec<String>) -> MatchReport {
        let top_matches = ranking
            .groups
            .into_iter()
            .zip(explanations)
            .map(|(group, explanation)| {
                let matched_sections: BTreeSet<String> =
                    group.hits.iter().map(|h| h.metadata.section.clone()).collect();
                let category = group
                    .hits
                    .first()
                    .and_then(|h| h.metadata.category.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                RankedMatch {
                    match_score: match_score(group.avg_score, group.count(), &self.scoring),
                    resume_id: group.doc_id,
                    category,
                    matched_sections: matched_sections.into_iter().collect(),
                    explanation,
                }
            })
            .collect();
        MatchReport {
            job_id: job_id.to_string(),
            total_resumes_scanned: ranking.distinct_resumes,
            top_matches,
        }
    }
}

fn explain_input(group: &ResumeGroup, limit: usize) -> Vec<ResumeChunk> {
    group.hits.iter().take(limit).map(ResumeChunk::from).collect()
}

fn join_err(e: tokio::task::JoinError) -> Error {
    Error::ExternalService(format!("matching task failed: {e}"))
}
