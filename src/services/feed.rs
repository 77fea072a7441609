//! Feed composition.
//!
//! # Explore mode
//!
//! Draws `min(|unseen|, limit * M)` tracks uniformly from everything the
//! user has not been shown, scores them against the taste vector, applies
//! the artist diversity penalty over the drawn set, and keeps the top
//! `limit` by a stable descending sort.
//!
//! # Vibe mode
//!
//! Splits `limit` into `floor(limit * ratio)` unseen slots and the rest for
//! liked tracks. Liked tracks carrying the vibe are sampled; unseen tracks
//! carrying the vibe are ranked exactly as in explore mode. The two parts are
//! concatenated, shuffled and truncated. Short pools give short feeds.
//!
//! Every returned id is added to the user's seen set before returning.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use tracing::instrument;

use super::diversity::DiversityAdjuster;
use super::scoring::CandidateScorer;
use crate::config::RecommenderConfig;
use crate::embedding::check_dimension;
use crate::models::{CandidateFeatures, FeedMode, FeedRequest, TrackId, UserId, VibeId};
use crate::storage::traits::{CatalogBackend, ProfileBackend};
use crate::{Error, Result, current_timestamp};

/// Returns a seeded RNG, or a fresh OS-seeded one when `seed` is `None`.
#[must_use]
pub fn rng_for(seed: Option<u64>) -> StdRng {
    seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64)
}

/// Samples up to `amount` ids from `pool` without replacement.
///
/// The result is in draw order, so it depends only on the pool order and the
/// RNG state.
pub fn sample_ids<R: Rng + ?Sized>(pool: &[TrackId], amount: usize, rng: &mut R) -> Vec<TrackId> {
    let amount = amount.min(pool.len());
    if amount == 0 {
        return Vec::new();
    }
    sample(rng, pool.len(), amount)
        .into_iter()
        .map(|i| pool[i].clone())
        .collect()
}

/// Scores, diversity-adjusts and ranks candidates, returning the top `limit`.
///
/// Equal scores keep their candidate order.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] on an embedding dimension mismatch.
pub fn rank_candidates(
    taste: &[f32],
    candidates: &[CandidateFeatures],
    diversity: &DiversityAdjuster,
    limit: usize,
) -> Result<Vec<TrackId>> {
    let scored = CandidateScorer::score(taste, candidates)?;
    let mut adjusted = diversity.adjust(scored);
    adjusted.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(adjusted.into_iter().take(limit).map(|c| c.id).collect())
}

/// Splits a vibe feed `limit` into `(liked, unseen)` slot counts.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn vibe_quotas(limit: usize, unseen_ratio: f32) -> (usize, usize) {
    let unseen = ((limit as f64) * f64::from(unseen_ratio)).floor() as usize;
    let unseen = unseen.min(limit);
    (limit - unseen, unseen)
}

/// Composes ranked feeds for users.
pub struct FeedService {
    catalog: Arc<dyn CatalogBackend>,
    profiles: Arc<dyn ProfileBackend>,
    config: RecommenderConfig,
    diversity: DiversityAdjuster,
}

impl FeedService {
    /// Creates a feed service over the given stores.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn CatalogBackend>,
        profiles: Arc<dyn ProfileBackend>,
        config: RecommenderConfig,
    ) -> Self {
        let diversity = DiversityAdjuster::from_config(&config);
        Self {
            catalog,
            profiles,
            config,
            diversity,
        }
    }

    /// Returns the recommender configuration.
    #[must_use]
    pub const fn config(&self) -> &RecommenderConfig {
        &self.config
    }

    /// Composes a feed and registers the returned tracks as seen.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The limit is outside `1..=max_feed_size`
    /// - The user does not exist
    /// - The stored taste vector has the wrong dimension
    /// - A store call fails
    #[instrument(
        skip(self, request),
        fields(user_id = %user.as_str(), mode = %request.mode, limit = request.limit)
    )]
    pub fn compose(&self, user: &UserId, request: &FeedRequest) -> Result<Vec<TrackId>> {
        let start = Instant::now();
        let mode = request.mode.as_str();

        let result: Result<Vec<TrackId>> = (|| {
            request.validate(self.config.max_feed_size)?;

            let taste = self
                .profiles
                .get_preference(user)?
                .ok_or_else(|| Error::UserNotFound(user.clone()))?;
            check_dimension(&taste, self.config.embedding_dim, "taste vector")?;

            let seen = self.profiles.seen_tracks(user)?;
            let mut rng = rng_for(request.seed);

            let feed = match request.mode {
                FeedMode::Explore => self.explore(&taste, &seen, request.limit, &mut rng)?,
                FeedMode::Vibe(vibe) => {
                    self.vibe(user, vibe, &taste, &seen, request.limit, &mut rng)?
                },
            };

            self.profiles.mark_seen(user, &feed, current_timestamp())?;
            Ok(feed)
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("feed_compose_total", "mode" => mode, "status" => status).increment(1);
        metrics::histogram!("feed_compose_duration_ms", "mode" => mode)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        if let Ok(feed) = &result {
            #[allow(clippy::cast_precision_loss)]
            let returned = feed.len() as f64;
            metrics::histogram!("feed_tracks_returned").record(returned);
            tracing::debug!(
                user_id = %user.as_str(),
                mode = %request.mode,
                returned = feed.len(),
                seeded = request.seed.is_some(),
                "Composed feed"
            );
        }

        result
    }

    fn explore(
        &self,
        taste: &[f32],
        seen: &HashSet<TrackId>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<TrackId>> {
        let pool: Vec<TrackId> = self
            .catalog
            .track_ids(None)?
            .into_iter()
            .filter(|id| !seen.contains(id))
            .collect();
        if pool.is_empty() {
            tracing::debug!("Explore pool exhausted");
            return Ok(Vec::new());
        }

        let draw = limit.saturating_mul(self.config.explore_candidate_multiplier);
        let sampled = sample_ids(&pool, draw, rng);
        let candidates = self.catalog.candidate_features(&sampled)?;

        rank_candidates(taste, &candidates, &self.diversity, limit)
    }

    fn vibe(
        &self,
        user: &UserId,
        vibe: VibeId,
        taste: &[f32],
        seen: &HashSet<TrackId>,
        limit: usize,
        rng: &mut StdRng,
    ) -> Result<Vec<TrackId>> {
        let (liked_quota, unseen_quota) = vibe_quotas(limit, self.config.vibe_unseen_ratio);

        let tagged = self.catalog.track_ids(Some(vibe))?;
        let tagged_set: HashSet<&TrackId> = tagged.iter().collect();

        let liked_pool: Vec<TrackId> = self
            .profiles
            .liked_tracks(user)?
            .into_iter()
            .filter(|id| tagged_set.contains(id))
            .collect();
        let mut feed = sample_ids(&liked_pool, liked_quota, rng);

        if unseen_quota > 0 {
            let picked: HashSet<&TrackId> = feed.iter().collect();
            let unseen_pool: Vec<TrackId> = tagged
                .iter()
                .filter(|id| !seen.contains(*id) && !picked.contains(id))
                .cloned()
                .collect();
            let candidates = self.catalog.candidate_features(&unseen_pool)?;
            let ranked = rank_candidates(taste, &candidates, &self.diversity, unseen_quota)?;
            feed.extend(ranked);
        }

        tracing::debug!(
            vibe_id = vibe.get(),
            liked_pool = liked_pool.len(),
            liked_quota,
            unseen_quota,
            "Vibe feed components"
        );

        feed.shuffle(rng);
        feed.truncate(limit);
        Ok(feed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackAction, NewFeedback, Track, User};
    use crate::storage::InMemoryStore;
    use test_case::test_case;

    fn ids(names: &[&str]) -> Vec<TrackId> {
        names.iter().map(|n| TrackId::new(*n)).collect()
    }

    fn service_with(tracks: Vec<Track>) -> (Arc<InMemoryStore>, FeedService, UserId) {
        let store = Arc::new(InMemoryStore::new());
        for track in &tracks {
            store.upsert_track(track).unwrap();
        }
        let user = UserId::new("u1");
        store.create_user(&User::guest(user.clone(), 2, 0)).unwrap();
        let config = RecommenderConfig::default().with_embedding_dim(2);
        let service = FeedService::new(store.clone(), store.clone(), config);
        (store, service, user)
    }

    #[test_case(10, 0.4, (6, 4) ; "default ratio")]
    #[test_case(5, 0.4, (3, 2) ; "odd limit")]
    #[test_case(1, 0.4, (1, 0) ; "single slot goes to liked")]
    #[test_case(4, 1.0, (0, 4) ; "all unseen")]
    #[test_case(4, 0.0, (4, 0) ; "all liked")]
    fn test_vibe_quotas(limit: usize, ratio: f32, expected: (usize, usize)) {
        assert_eq!(vibe_quotas(limit, ratio), expected);
    }

    #[test]
    fn test_sample_ids_is_seeded() {
        let pool = ids(&["a", "b", "c", "d", "e", "f"]);
        let first = sample_ids(&pool, 3, &mut rng_for(Some(7)));
        let second = sample_ids(&pool, 3, &mut rng_for(Some(7)));
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        let unique: HashSet<_> = first.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_sample_ids_clamps_to_pool() {
        let pool = ids(&["a", "b"]);
        assert_eq!(sample_ids(&pool, 10, &mut rng_for(Some(1))).len(), 2);
        assert!(sample_ids(&[], 3, &mut rng_for(Some(1))).is_empty());
    }

    #[test]
    fn test_rank_candidates_ties_keep_order() {
        let candidates: Vec<CandidateFeatures> = ["c", "a", "b"]
            .iter()
            .enumerate()
            .map(|(i, id)| CandidateFeatures {
                id: TrackId::new(*id),
                artist: format!("artist-{i}"),
                embedding: vec![1.0, 0.0],
            })
            .collect();
        let ranked = rank_candidates(&[0.0, 0.0], &candidates, &DiversityAdjuster::default(), 2)
            .unwrap();
        assert_eq!(ranked, ids(&["c", "a"]));
    }

    #[test]
    fn test_rank_candidates_orders_by_score() {
        let candidates = vec![
            CandidateFeatures {
                id: TrackId::new("far"),
                artist: "x".to_string(),
                embedding: vec![0.0, 1.0],
            },
            CandidateFeatures {
                id: TrackId::new("near"),
                artist: "y".to_string(),
                embedding: vec![1.0, 0.0],
            },
        ];
        let ranked =
            rank_candidates(&[1.0, 0.0], &candidates, &DiversityAdjuster::default(), 5).unwrap();
        assert_eq!(ranked, ids(&["near", "far"]));
    }

    #[test]
    fn test_explore_marks_seen_and_empties() {
        let tracks = (0..3)
            .map(|i| Track::new(format!("t{i}"), "Title", format!("A{i}"), vec![1.0, 0.0]))
            .collect();
        let (store, service, user) = service_with(tracks);

        let first = service
            .compose(&user, &FeedRequest::explore(2).with_seed(1))
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(store.seen_tracks(&user).unwrap().len(), 2);

        let second = service
            .compose(&user, &FeedRequest::explore(2).with_seed(1))
            .unwrap();
        assert_eq!(second.len(), 1);
        assert!(!first.contains(&second[0]));

        let third = service
            .compose(&user, &FeedRequest::explore(2).with_seed(1))
            .unwrap();
        assert!(third.is_empty());
    }

    #[test]
    fn test_compose_rejects_bad_limit_and_unknown_user() {
        let (_, service, user) = service_with(Vec::new());
        assert!(matches!(
            service.compose(&user, &FeedRequest::explore(0)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.compose(&user, &FeedRequest::explore(51)),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            service.compose(&UserId::new("ghost"), &FeedRequest::explore(5)),
            Err(Error::UserNotFound(_))
        ));
    }

    #[test]
    fn test_vibe_feed_mixes_liked_and_unseen() {
        let chill = VibeId::new(2);
        let tracks = (0..10)
            .map(|i| {
                Track::new(format!("t{i:02}"), "Title", format!("A{i}"), vec![1.0, 0.0])
                    .with_vibe(chill)
            })
            .collect();
        let (store, service, user) = service_with(tracks);

        for liked in ["t00", "t01", "t02", "t03"] {
            store
                .append_feedback(NewFeedback {
                    user_id: user.clone(),
                    track_id: TrackId::new(liked),
                    action: FeedbackAction::Like,
                    delta: vec![0.0, 0.0],
                    created_at: 0,
                })
                .unwrap();
        }
        store.mark_seen(&user, &ids(&["t00", "t01", "t02", "t03"]), 0).unwrap();

        // limit 5 -> 3 liked slots, 2 unseen slots
        let feed = service
            .compose(&user, &FeedRequest::vibe(chill, 5).with_seed(9))
            .unwrap();
        assert_eq!(feed.len(), 5);
        let liked: HashSet<TrackId> = ids(&["t00", "t01", "t02", "t03"]).into_iter().collect();
        assert_eq!(feed.iter().filter(|id| liked.contains(*id)).count(), 3);
        let unique: HashSet<_> = feed.iter().collect();
        assert_eq!(unique.len(), 5);
    }

    #[test]
    fn test_vibe_feed_without_likes_is_underfilled() {
        let party = VibeId::new(6);
        let tracks = (0..10)
            .map(|i| {
                Track::new(format!("t{i}"), "Title", format!("A{i}"), vec![0.0, 1.0])
                    .with_vibe(party)
            })
            .collect();
        let (_, service, user) = service_with(tracks);

        let feed = service
            .compose(&user, &FeedRequest::vibe(party, 10).with_seed(3))
            .unwrap();
        assert_eq!(feed.len(), 4);
    }
}
