//! Candidate scoring.

use crate::embedding::{check_dimension, dot, is_zero};
use crate::models::{CandidateFeatures, TrackId};
use crate::Result;

/// A candidate with its current score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Track identifier.
    pub id: TrackId,
    /// Artist label, carried along for diversity adjustment.
    pub artist: String,
    /// Affinity score.
    pub score: f32,
}

/// Scores candidates by dot product with a taste vector.
///
/// Both sides are unit vectors (or the taste is zero), so scores fall in
/// `[-1, 1]` and are left as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandidateScorer;

impl CandidateScorer {
    /// Scores each candidate, preserving candidate order.
    ///
    /// A zero taste vector yields exactly `0.0` for every candidate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if a candidate embedding has a
    /// different dimension than the taste vector.
    pub fn score(taste: &[f32], candidates: &[CandidateFeatures]) -> Result<Vec<ScoredCandidate>> {
        let cold = is_zero(taste);

        candidates
            .iter()
            .map(|c| {
                check_dimension(&c.embedding, taste.len(), "candidate embedding")?;
                Ok(ScoredCandidate {
                    id: c.id.clone(),
                    artist: c.artist.clone(),
                    score: if cold { 0.0 } else { dot(taste, &c.embedding) },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, embedding: Vec<f32>) -> CandidateFeatures {
        CandidateFeatures {
            id: TrackId::new(id),
            artist: "artist".to_string(),
            embedding,
        }
    }

    #[test]
    fn test_scores_in_candidate_order() {
        let scored = CandidateScorer::score(
            &[1.0, 0.0],
            &[candidate("b", vec![0.0, 1.0]), candidate("a", vec![0.6, 0.8])],
        )
        .unwrap();
        assert_eq!(scored[0].id.as_str(), "b");
        assert_eq!(scored[0].score, 0.0);
        assert!((scored[1].score - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_zero_taste_scores_exactly_zero() {
        let scored = CandidateScorer::score(
            &[0.0, 0.0],
            &[candidate("a", vec![-0.6, 0.8]), candidate("b", vec![1.0, 0.0])],
        )
        .unwrap();
        assert!(scored.iter().all(|s| s.score == 0.0 && s.score.is_sign_positive()));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(CandidateScorer::score(&[1.0], &[]).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = CandidateScorer::score(&[1.0, 0.0], &[candidate("a", vec![1.0])]);
        assert!(matches!(result, Err(crate::Error::InvalidInput(_))));
    }
}
