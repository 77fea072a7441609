//! Database schema.

/// Tables for the catalog, users, seen sets and the feedback log.
///
/// All statements are idempotent so the schema can be applied on every open.
pub const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS users (
        user_id TEXT PRIMARY KEY,
        user_type TEXT NOT NULL CHECK(user_type IN ('guest', 'linked')),
        preference_vector TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vibes (
        vibe_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        description TEXT,
        color TEXT,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS tracks (
        track_id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        artist TEXT NOT NULL,
        album TEXT,
        duration_ms INTEGER,
        embedding TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS track_vibes (
        track_id TEXT NOT NULL,
        vibe_id INTEGER NOT NULL,
        PRIMARY KEY (track_id, vibe_id)
    );

    CREATE INDEX IF NOT EXISTS idx_track_vibes_vibe ON track_vibes(vibe_id, track_id);

    CREATE TABLE IF NOT EXISTS feedback (
        feedback_id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        track_id TEXT NOT NULL,
        action TEXT NOT NULL CHECK(action IN ('like', 'dislike', 'more_like_this')),
        preference_delta TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        undone INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_feedback_user ON feedback(user_id, undone, feedback_id);

    CREATE TABLE IF NOT EXISTS seen_tracks (
        user_id TEXT NOT NULL,
        track_id TEXT NOT NULL,
        seen_at INTEGER NOT NULL,
        PRIMARY KEY (user_id, track_id)
    );
";
