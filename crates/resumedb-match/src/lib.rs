//! resumedb-match
//!
//! Turns chunk-level similarity hits into a ranked list of resumes, scores
//! each one and asks the explanation backend for a rationale.

pub mod matcher;
pub mod prompt;
pub mod ranking;
pub mod scoring;

pub use matcher::{MatchReport, RankedMatch, ResumeMatcher};
pub use prompt::build_explanation_prompt;
pub use ranking::{rank_hits, Ranking, ResumeGroup};
pub use scoring::match_score;
