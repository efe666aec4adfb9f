use std::collections::HashMap;

use resumedb_core::types::{DocId, SearchHit};

/// All hits of one resume, in hit-rank order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumeGroup {
    pub doc_id: DocId,
    pub hits: Vec<SearchHit>,
    /// Mean hit score clamped to `[0, 1]`.
    pub avg_score: f32,
    pub rank_score: f32,
}

impl ResumeGroup {
    pub fn count(&self) -> usize {
        self.hits.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub groups: Vec<ResumeGroup>,
    /// Distinct resumes among all hits, including those cut by `top_k`.
    pub distinct_resumes: usize,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Group hits per resume and order groups by `avg_score * count`, keeping
/// first-encounter order on ties, then keep the best `top_k`.
pub fn rank_hits(hits: Vec<SearchHit>, top_k: usize) -> Ranking {
    let mut slots: HashMap<DocId, usize> = HashMap::new();
    let mut grouped: Vec<(DocId, Vec<SearchHit>)> = Vec::new();
    for hit in hits {
        match slots.get(&hit.metadata.doc_id) {
            Some(&slot) => grouped[slot].1.push(hit),
            None => {
                slots.insert(hit.metadata.doc_id.clone(), grouped.len());
                grouped.push((hit.metadata.doc_id.clone(), vec![hit]));
            }
        }
    }

    let distinct_resumes = grouped.len();
    let mut groups: Vec<ResumeGroup> = grouped
        .into_iter()
        .map(|(doc_id, hits)| {
            let mean = hits.iter().map(|h| h.score).sum::<f32>() / hits.len() as f32;
            let avg_score = if mean.is_nan() { 0.0 } else { mean.clamp(0.0, 1.0) };
            let rank_score = avg_score * hits.len() as f32;
            ResumeGroup { doc_id, hits, avg_score, rank_score }
        })
        .collect();
    groups.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));
    groups.truncate(top_k);
    Ranking { groups, distinct_resumes }
}
