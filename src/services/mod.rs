//! Business logic services.
//!
//! The pure recommendation pieces ([`PreferenceModel`], [`CandidateScorer`],
//! [`DiversityAdjuster`]) carry no state. The services around them
//! orchestrate the storage backends and own logging and metrics.

mod catalog;
mod diversity;
mod feed;
mod feedback;
mod preference;
mod scoring;
mod user_locks;
mod users;

pub use catalog::CatalogService;
pub use diversity::DiversityAdjuster;
pub use feed::{FeedService, rank_candidates, rng_for, sample_ids, vibe_quotas};
pub use feedback::{FeedbackOutcome, FeedbackService};
pub use preference::{PreferenceModel, PreferenceUpdate};
pub use scoring::{CandidateScorer, ScoredCandidate};
pub use user_locks::UserLocks;
pub use users::UserService;
