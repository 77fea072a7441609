//! Taste vector updates from feedback.
//!
//! A feedback action moves the taste vector toward (or away from) a track's
//! embedding by a fixed learning rate, after which the vector is
//! re-normalized. The change actually applied is returned as an explicit
//! delta so it can be logged and reversed later.

use crate::config::RecommenderConfig;
use crate::embedding::{add, check_dimension, normalize, scale, sub};
use crate::models::FeedbackAction;
use crate::Result;

/// Result of learning from one feedback event.
#[derive(Debug, Clone, PartialEq)]
pub struct PreferenceUpdate {
    /// The new, normalized taste vector.
    pub preference: Vec<f32>,
    /// `preference - previous`, the exact quantity to log for undo.
    pub delta: Vec<f32>,
}

/// Learning rates per feedback action.
///
/// # Example
///
/// ```rust
/// use vibefeed::models::FeedbackAction;
/// use vibefeed::services::PreferenceModel;
///
/// let model = PreferenceModel::new(0.3, 0.5, 0.6);
/// let delta = model.compute_delta(FeedbackAction::Dislike, &[1.0, 0.0]);
/// assert_eq!(delta, vec![-0.5, 0.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreferenceModel {
    alpha_like: f32,
    beta_dislike: f32,
    gamma_more_like: f32,
}

impl Default for PreferenceModel {
    fn default() -> Self {
        Self::from_config(&RecommenderConfig::default())
    }
}

impl PreferenceModel {
    /// Creates a model with explicit learning rates.
    #[must_use]
    pub const fn new(alpha_like: f32, beta_dislike: f32, gamma_more_like: f32) -> Self {
        Self {
            alpha_like,
            beta_dislike,
            gamma_more_like,
        }
    }

    /// Creates a model from the configured learning rates.
    #[must_use]
    pub const fn from_config(config: &RecommenderConfig) -> Self {
        Self::new(
            config.alpha_like,
            config.beta_dislike,
            config.gamma_more_like,
        )
    }

    /// Signed learning rate for an action.
    #[must_use]
    pub const fn signed_rate(&self, action: FeedbackAction) -> f32 {
        match action {
            FeedbackAction::Like => self.alpha_like,
            FeedbackAction::Dislike => -self.beta_dislike,
            FeedbackAction::MoreLikeThis => self.gamma_more_like,
        }
    }

    /// Nominal delta for an action: the embedding scaled by the signed rate.
    #[must_use]
    pub fn compute_delta(&self, action: FeedbackAction, embedding: &[f32]) -> Vec<f32> {
        scale(embedding, self.signed_rate(action))
    }

    /// Returns `normalize(current + delta)`.
    #[must_use]
    pub fn apply_delta(current: &[f32], delta: &[f32]) -> Vec<f32> {
        normalize(&add(current, delta))
    }

    /// Returns `normalize(current - delta)`.
    #[must_use]
    pub fn reverse_delta(current: &[f32], delta: &[f32]) -> Vec<f32> {
        normalize(&sub(current, delta))
    }

    /// Applies an action and returns the new vector with its effective delta.
    ///
    /// The nominal delta is not reversible on its own because normalization
    /// sits between it and the stored vector. Logging the effective delta
    /// instead means `reverse_delta(preference, delta)` recovers `current`
    /// up to re-normalization, and exactly when `current` is zero.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidInput`] if the two vectors differ in
    /// length.
    pub fn learn(
        &self,
        current: &[f32],
        action: FeedbackAction,
        embedding: &[f32],
    ) -> Result<PreferenceUpdate> {
        check_dimension(embedding, current.len(), "track embedding")?;

        let preference = Self::apply_delta(current, &self.compute_delta(action, embedding));
        let delta = sub(&preference, current);
        Ok(PreferenceUpdate { preference, delta })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{is_zero, l2_norm};
    use test_case::test_case;

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test_case(FeedbackAction::Like, 0.3 ; "like")]
    #[test_case(FeedbackAction::Dislike, -0.5 ; "dislike")]
    #[test_case(FeedbackAction::MoreLikeThis, 0.6 ; "more like this")]
    fn test_compute_delta(action: FeedbackAction, expected: f32) {
        let model = PreferenceModel::default();
        assert_eq!(model.compute_delta(action, &[1.0, 0.0]), vec![expected, 0.0]);
    }

    #[test]
    fn test_like_from_zero_gives_embedding() {
        let model = PreferenceModel::default();
        let update = model
            .learn(&[0.0, 0.0, 0.0], FeedbackAction::Like, &[1.0, 0.0, 0.0])
            .unwrap();
        assert_close(&update.preference, &[1.0, 0.0, 0.0]);
        assert_eq!(update.delta, update.preference);
    }

    #[test]
    fn test_dislike_from_zero_points_away() {
        let model = PreferenceModel::default();
        let update = model
            .learn(&[0.0, 0.0], FeedbackAction::Dislike, &[0.0, 1.0])
            .unwrap();
        assert_close(&update.preference, &[0.0, -1.0]);
    }

    #[test]
    fn test_apply_keeps_unit_length() {
        let model = PreferenceModel::default();
        let current = normalize(&[0.2, 0.9, -0.1]);
        let update = model
            .learn(&current, FeedbackAction::MoreLikeThis, &normalize(&[1.0, 0.0, 1.0]))
            .unwrap();
        assert!((l2_norm(&update.preference) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_undo_from_zero_is_exact() {
        let model = PreferenceModel::default();
        let zero = vec![0.0; 4];
        let update = model
            .learn(&zero, FeedbackAction::Like, &normalize(&[0.1, 0.7, -0.2, 0.4]))
            .unwrap();
        let restored = PreferenceModel::reverse_delta(&update.preference, &update.delta);
        assert!(is_zero(&restored));
    }

    #[test]
    fn test_undo_restores_nonzero_taste() {
        let model = PreferenceModel::default();
        let current = normalize(&[0.5, 0.5, 0.0]);
        let update = model
            .learn(&current, FeedbackAction::Dislike, &normalize(&[0.0, 1.0, 1.0]))
            .unwrap();
        let restored = PreferenceModel::reverse_delta(&update.preference, &update.delta);
        assert_close(&restored, &current);
    }

    #[test]
    fn test_reverse_delta_normalizes_short_difference() {
        // A difference far from unit length is still just normalized.
        let restored = PreferenceModel::reverse_delta(&[1.0, 0.0], &[0.6, 0.0]);
        assert_eq!(restored, vec![1.0, 0.0]);
    }

    #[test]
    fn test_cancelling_update_leaves_zero() {
        // A dislike exactly opposite a unit taste with rate 1 sums to zero.
        let model = PreferenceModel::new(0.3, 1.0, 0.6);
        let update = model
            .learn(&[1.0, 0.0], FeedbackAction::Dislike, &[1.0, 0.0])
            .unwrap();
        assert!(is_zero(&update.preference));
        assert!(update.preference.iter().all(|x| !x.is_nan()));
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = PreferenceModel::default();
        assert!(model.learn(&[0.0, 0.0], FeedbackAction::Like, &[1.0]).is_err());
    }
}
