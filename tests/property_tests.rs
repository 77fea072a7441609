//! Property-based tests for the recommendation math.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Normalization is idempotent and yields unit or zero vectors
//! - Reversing a delta is `normalize(current - delta)` for any input
//! - Undo of the latest feedback restores the previous taste vector
//! - Seeded sampling is deterministic and never repeats an id
//! - Diversity penalties never raise a positive score
//! - Repeated-artist tracks rank strictly below an equally scored singleton
//! - Vibe quotas always sum to the limit

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use vibefeed::embedding::{is_zero, l2_norm, normalize};
use vibefeed::models::{FeedbackAction, TrackId};
use vibefeed::services::{
    DiversityAdjuster, PreferenceModel, ScoredCandidate, rng_for, sample_ids, vibe_quotas,
};

fn vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-10.0_f32..10.0, dim)
}

fn unit_vector(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    vector(dim)
        .prop_filter("non-degenerate", |v| l2_norm(v) > 1e-3)
        .prop_map(|v| normalize(&v))
}

fn action() -> impl Strategy<Value = FeedbackAction> {
    prop::sample::select(FeedbackAction::all().to_vec())
}

fn pool(n: usize) -> Vec<TrackId> {
    (0..n).map(|i| TrackId::new(format!("t{i:03}"))).collect()
}

proptest! {
    /// Property: normalize(normalize(v)) == normalize(v) within float tolerance.
    #[test]
    fn prop_normalize_idempotent(v in vector(8)) {
        let once = normalize(&v);
        let twice = normalize(&once);
        for (a, b) in once.iter().zip(&twice) {
            prop_assert!((a - b).abs() < 1e-6);
        }
        let norm = l2_norm(&once);
        prop_assert!(is_zero(&once) || (norm - 1.0).abs() < 1e-5);
    }

    /// Property: reverse_delta(apply_delta(t, d), d) is
    /// normalize(normalize(t + d) - d) for arbitrary, unnormalized inputs.
    #[test]
    fn prop_reverse_of_apply_matches_formula(t in vector(5), d in vector(5)) {
        let applied = PreferenceModel::apply_delta(&t, &d);
        let got = PreferenceModel::reverse_delta(&applied, &d);

        let sum: Vec<f32> = t.iter().zip(&d).map(|(a, b)| a + b).collect();
        let normalized = normalize(&sum);
        let diff: Vec<f32> = normalized.iter().zip(&d).map(|(a, b)| a - b).collect();
        prop_assert_eq!(got, normalize(&diff));
    }

    /// Property: undo from a fresh user is exact.
    #[test]
    fn prop_undo_from_zero_is_exact(e in unit_vector(6), action in action()) {
        let model = PreferenceModel::default();
        let zero = vec![0.0; 6];
        let update = model.learn(&zero, action, &e).unwrap();
        let restored = PreferenceModel::reverse_delta(&update.preference, &update.delta);
        prop_assert!(is_zero(&restored));
    }

    /// Property: undo restores a unit taste vector within tolerance.
    #[test]
    fn prop_undo_restores_previous(
        current in unit_vector(6),
        e in unit_vector(6),
        action in action(),
    ) {
        let model = PreferenceModel::default();
        let update = model.learn(&current, action, &e).unwrap();
        prop_assume!(!is_zero(&update.preference));

        let restored = PreferenceModel::reverse_delta(&update.preference, &update.delta);
        for (a, b) in restored.iter().zip(&current) {
            prop_assert!((a - b).abs() < 1e-4, "{:?} != {:?}", restored, current);
        }
    }

    /// Property: the same seed over the same pool draws the same ids.
    #[test]
    fn prop_seeded_sampling_is_deterministic(seed in any::<u64>(), n in 0usize..60, k in 0usize..80) {
        let ids = pool(n);
        let a = sample_ids(&ids, k, &mut rng_for(Some(seed)));
        let b = sample_ids(&ids, k, &mut rng_for(Some(seed)));
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), k.min(n));

        let unique: HashSet<&TrackId> = a.iter().collect();
        prop_assert_eq!(unique.len(), a.len());
    }

    /// Property: vibe quotas split the limit exactly.
    #[test]
    fn prop_vibe_quotas_sum(limit in 1usize..200, ratio in 0.0_f32..=1.0) {
        let (liked, unseen) = vibe_quotas(limit, ratio);
        prop_assert_eq!(liked + unseen, limit);
        prop_assert!(unseen <= limit);
    }

    /// Property: adding a same-artist track never raises another track's
    /// non-negative score.
    #[test]
    fn prop_diversity_monotone(
        scores in prop::collection::vec(0.0_f32..1.0, 1..12),
        rate in 0.0_f32..0.5,
    ) {
        let adjuster = DiversityAdjuster::new(rate);
        let batch: Vec<ScoredCandidate> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| ScoredCandidate {
                id: TrackId::new(format!("t{i}")),
                artist: "same".to_string(),
                score: *s,
            })
            .collect();

        let before = adjuster.adjust(batch.clone());
        let mut grown = batch;
        grown.push(ScoredCandidate {
            id: TrackId::new("extra"),
            artist: "same".to_string(),
            score: 0.5,
        });
        let after = adjuster.adjust(grown);

        for (b, a) in before.iter().zip(&after) {
            prop_assert!(a.score <= b.score + 1e-6);
        }
    }

    /// Property: with equal positive raw scores, every track of an artist
    /// seen k > 1 times ends strictly below a singleton track.
    #[test]
    fn prop_repeated_artist_below_singleton(
        k in 2usize..10,
        raw in 0.01_f32..1.0,
        rate in 0.01_f32..0.99,
    ) {
        let adjuster = DiversityAdjuster::new(rate);
        let mut batch: Vec<ScoredCandidate> = (0..k)
            .map(|i| ScoredCandidate {
                id: TrackId::new(format!("r{i}")),
                artist: "repeated".to_string(),
                score: raw,
            })
            .collect();
        batch.push(ScoredCandidate {
            id: TrackId::new("solo"),
            artist: "solo".to_string(),
            score: raw,
        });

        let adjusted = adjuster.adjust(batch);
        let (singleton, repeated) = adjusted.split_last().unwrap();
        prop_assert_eq!(singleton.score, raw);
        for candidate in repeated {
            prop_assert!(
                candidate.score < singleton.score,
                "{} not below {}", candidate.score, singleton.score
            );
        }
    }
}
