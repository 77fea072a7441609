//! `feed` command.

use std::fmt;

use super::App;
use crate::Result;
use crate::models::{FeedMode, FeedRequest, Track, UserId};

/// Output of `feed`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedReport {
    /// Mode the feed was composed in.
    pub mode: FeedMode,
    /// Tracks in feed order.
    pub tracks: Vec<Track>,
}

impl fmt::Display for FeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tracks.is_empty() {
            return write!(f, "No tracks available for {} feed", self.mode);
        }
        write!(f, "{} feed ({} tracks):", self.mode, self.tracks.len())?;
        for (i, track) in self.tracks.iter().enumerate() {
            write!(
                f,
                "\n{:>3}. {}  {} - {}",
                i + 1,
                track.id,
                track.artist,
                track.title
            )?;
        }
        Ok(())
    }
}

/// Composes a feed and loads the track details for display.
///
/// `vibe` is resolved by id or name. `limit` defaults to the configured
/// feed size.
///
/// # Errors
///
/// Returns an error for unknown modes, vibes or users, an out-of-range
/// limit, or a failing store call.
pub fn feed(
    app: &App,
    user: &str,
    mode: &str,
    vibe: Option<&str>,
    limit: Option<usize>,
    seed: Option<u64>,
) -> Result<FeedReport> {
    let vibe_id = vibe
        .map(|v| app.catalog.resolve_vibe(v))
        .transpose()?
        .map(|v| v.id);
    let mode = FeedMode::parse(mode, vibe_id)?;

    let request = FeedRequest {
        mode,
        limit: limit.unwrap_or(app.config.recommender.default_feed_size),
        seed,
    };
    let ids = app.feed.compose(&UserId::new(user), &request)?;
    let tracks = ids
        .iter()
        .map(|id| app.catalog.get_track(id))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeedReport { mode, tracks })
}
