//! Artist diversity penalty.

use std::collections::HashMap;

use super::scoring::ScoredCandidate;
use crate::config::RecommenderConfig;

/// Damps scores of artists that appear several times in one batch.
///
/// A track whose artist occurs `k > 1` times in the batch has its score
/// multiplied by `1 - rate * (k - 1)`. Counts are per call; nothing is
/// remembered between batches. For large `k` the multiplier goes negative,
/// which flips the sign of the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiversityAdjuster {
    penalty_rate: f32,
}

impl Default for DiversityAdjuster {
    fn default() -> Self {
        Self::from_config(&RecommenderConfig::default())
    }
}

impl DiversityAdjuster {
    /// Creates an adjuster with the given per-repeat penalty.
    #[must_use]
    pub const fn new(penalty_rate: f32) -> Self {
        Self { penalty_rate }
    }

    /// Creates an adjuster from the configured penalty.
    #[must_use]
    pub const fn from_config(config: &RecommenderConfig) -> Self {
        Self::new(config.diversity_artist_penalty)
    }

    /// Returns the per-repeat penalty rate.
    #[must_use]
    pub const fn penalty_rate(&self) -> f32 {
        self.penalty_rate
    }

    /// Score multiplier for an artist seen `occurrences` times.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn multiplier(&self, occurrences: usize) -> f32 {
        if occurrences <= 1 {
            1.0
        } else {
            1.0 - self.penalty_rate * (occurrences - 1) as f32
        }
    }

    /// Rewrites the scores of a batch, keeping its order.
    #[must_use]
    pub fn adjust(&self, mut batch: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for candidate in &batch {
            *counts.entry(candidate.artist.clone()).or_insert(0) += 1;
        }

        for candidate in &mut batch {
            let k = counts.get(&candidate.artist).copied().unwrap_or(1);
            if k > 1 {
                candidate.score *= self.multiplier(k);
            }
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackId;
    use test_case::test_case;

    fn scored(id: &str, artist: &str, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            id: TrackId::new(id),
            artist: artist.to_string(),
            score,
        }
    }

    #[test_case(1, 1.0 ; "singleton untouched")]
    #[test_case(2, 0.7 ; "one repeat")]
    #[test_case(3, 0.4 ; "two repeats")]
    #[test_case(5, -0.2 ; "goes negative")]
    fn test_multiplier(k: usize, expected: f32) {
        let adjuster = DiversityAdjuster::new(0.3);
        assert!((adjuster.multiplier(k) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_adjust_penalizes_repeated_artist() {
        let batch = vec![
            scored("a1", "A", 0.9),
            scored("b1", "B", 0.5),
            scored("a2", "A", 0.8),
        ];
        let adjusted = DiversityAdjuster::new(0.3).adjust(batch);

        assert!((adjusted[0].score - 0.63).abs() < 1e-6);
        assert!((adjusted[1].score - 0.5).abs() < f32::EPSILON);
        assert!((adjusted[2].score - 0.56).abs() < 1e-6);
        let ids: Vec<&str> = adjusted.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b1", "a2"]);
    }

    #[test_case(2, 0.3 ; "pair")]
    #[test_case(4, 0.1 ; "four light")]
    #[test_case(6, 0.5 ; "six heavy")]
    fn test_equal_scores_repeats_rank_below_singleton(k: usize, rate: f32) {
        let mut batch: Vec<_> = (0..k).map(|i| scored(&format!("a{i}"), "A", 0.8)).collect();
        batch.push(scored("solo", "B", 0.8));
        let adjusted = DiversityAdjuster::new(rate).adjust(batch);

        let (solo, repeats) = adjusted.split_last().unwrap();
        assert!((solo.score - 0.8).abs() < f32::EPSILON);
        assert!(repeats.iter().all(|c| c.score < solo.score));
    }

    #[test]
    fn test_zero_rate_is_identity() {
        let batch = vec![scored("a1", "A", 0.9), scored("a2", "A", 0.8)];
        assert_eq!(DiversityAdjuster::new(0.0).adjust(batch.clone()), batch);
    }

    #[test]
    fn test_empty_batch() {
        assert!(DiversityAdjuster::default().adjust(Vec::new()).is_empty());
    }
}
