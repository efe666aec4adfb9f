use resumedb_core::config::ScoringConfig;

/// Percentage blending similarity with coverage (matched chunks over
/// `max_chunks`, capped at 1), rounded to two decimals and kept in `[0, 100]`.
pub fn match_score(avg_score: f32, count: usize, policy: &ScoringConfig) -> f64 {
    let coverage = if policy.max_chunks == 0 {
        if count > 0 {
            1.0
        } else {
            0.0
        }
    } else {
        (count as f64 / policy.max_chunks as f64).min(1.0)
    };
    let similarity = policy.similarity_weight as f64 * avg_score as f64;
    let blended = similarity + policy.coverage_weight as f64 * coverage;
    let score = (blended * 100.0 * 100.0).round() / 100.0;
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_reference_points() {
        let policy = ScoringConfig::default();
        assert_eq!(match_score(1.0, 10, &policy), 100.0);
        assert_eq!(match_score(0.0, 0, &policy), 0.0);
        assert_eq!(match_score(0.5, 5, &policy), 50.0);
        assert_eq!(match_score(0.85, 5, &policy), 74.5);
        assert_eq!(match_score(1.0, 40, &policy), 100.0);
    }

    #[test]
    fn zero_max_chunks_counts_any_hit_as_full_coverage() {
        let policy = ScoringConfig { max_chunks: 0, ..ScoringConfig::default() };
        assert_eq!(match_score(0.0, 0, &policy), 0.0);
        assert_eq!(match_score(0.0, 1, &policy), 30.0);
    }

    #[test]
    fn heavy_weights_are_clamped() {
        let policy = ScoringConfig { similarity_weight: 2.0, coverage_weight: 1.0, max_chunks: 10 };
        assert_eq!(match_score(1.0, 10, &policy), 100.0);
    }
}
