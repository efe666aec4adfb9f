//! Exact inner-product index over a dense row-major matrix.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use resumedb_core::types::Embedding;
use resumedb_core::{Error, Result};

/// One slot of a k-NN answer. `ordinal` is `None` for the padding slots
/// returned when fewer than `k` vectors are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub ordinal: Option<usize>,
    pub score: f32,
}

impl Neighbor {
    pub const NONE: Neighbor = Neighbor { ordinal: None, score: f32::NEG_INFINITY };
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatIpIndex {
    dim: usize,
    data: Vec<f32>,
}

fn by_rank(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
}

impl FlatIpIndex {
    pub fn new(dim: usize) -> Self {
        Self { dim, data: Vec::new() }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Check every vector against the index dimension without mutating.
    pub fn check(&self, vectors: &[Embedding]) -> Result<()> {
        match vectors.iter().position(|v| v.len() != self.dim) {
            Some(position) => Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: vectors[position].len(),
                position,
            }),
            None => Ok(()),
        }
    }

    pub fn add(&mut self, vectors: &[Embedding]) -> Result<()> {
        self.check(vectors)?;
        self.data.reserve(vectors.len() * self.dim);
        for v in vectors {
            self.data.extend_from_slice(v);
        }
        Ok(())
    }

    /// The `k` highest inner products, descending; ties go to the lower
    /// ordinal. Always returns exactly `k` slots, padded with
    /// [`Neighbor::NONE`].
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dim {
            return Err(Error::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
                position: 0,
            });
        }
        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dim.max(1))
            .map(|row| row.iter().zip(query).map(|(a, b)| a * b).sum::<f32>())
            .enumerate()
            .collect();
        if k < scored.len() {
            if k > 0 {
                scored.select_nth_unstable_by(k - 1, by_rank);
            }
            scored.truncate(k);
        }
        scored.sort_by(by_rank);
        let mut out: Vec<Neighbor> = scored
            .into_iter()
            .map(|(i, s)| Neighbor { ordinal: Some(i), score: s })
            .collect();
        out.resize(k, Neighbor::NONE);
        Ok(out)
    }
}
