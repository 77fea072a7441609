//! `SQLite` store.
//!
//! One database file holds the catalog and all user state. Every trait call
//! runs under the connection mutex, and multi-statement writes run inside a
//! transaction, so each call is atomic.

use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;

use rusqlite::{Connection, OptionalExtension, params};

use super::connection::{lock_connection, open_file, record_operation};
use super::rows::{
    FeedbackRow, UserRow, decode_vector, encode_vector, from_db_timestamp, to_db_timestamp,
};
use super::schema::SCHEMA;
use crate::models::{
    CandidateFeatures, FeedbackAction, FeedbackEvent, FeedbackId, NewFeedback, Track, TrackId,
    User, UserId, Vibe, VibeId,
};
use crate::storage::traits::{CatalogBackend, ProfileBackend};
use crate::{Error, Result, current_timestamp};

use std::collections::HashSet;

/// SQLite-backed catalog and profile store.
pub struct SqliteStore {
    /// Database connection (mutex for interior mutability).
    conn: Mutex<Connection>,
}

fn db_error(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
    move |e| Error::OperationFailed {
        operation: operation.to_string(),
        cause: e.to_string(),
    }
}

fn to_db_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

impl SqliteStore {
    /// Opens (or creates) a database file and applies the schema.
    ///
    /// Parent directories are created if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or initialized.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_connection(open_file(path.as_ref())?)
    }

    /// Creates an in-memory database (for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_error("open_database_memory"))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(db_error("initialize_schema"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Runs `f` under the connection lock and records operation metrics.
    fn run<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut Connection) -> Result<T>,
    ) -> Result<T> {
        let start = Instant::now();
        let result = {
            let mut conn = lock_connection(&self.conn);
            f(&mut conn)
        };
        record_operation(operation, start, result.is_ok());
        result
    }

    fn track_vibes(conn: &Connection, id: &TrackId) -> Result<Vec<VibeId>> {
        let mut stmt = conn
            .prepare_cached("SELECT vibe_id FROM track_vibes WHERE track_id = ?1 ORDER BY vibe_id")
            .map_err(db_error("get_track_vibes"))?;
        let ids = stmt
            .query_map(params![id.as_str()], |row| row.get::<_, i64>(0))
            .map_err(db_error("get_track_vibes"))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(db_error("get_track_vibes"))?;
        Ok(ids.into_iter().map(VibeId::new).collect())
    }

    fn vibe_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Vibe> {
        Ok(Vibe {
            id: VibeId::new(row.get(0)?),
            name: row.get(1)?,
            description: row.get(2)?,
            color: row.get(3)?,
        })
    }
}

impl CatalogBackend for SqliteStore {
    fn upsert_track(&self, track: &Track) -> Result<()> {
        self.run("upsert_track", |conn| {
            let embedding = encode_vector(&track.embedding)?;
            let tx = conn.transaction().map_err(db_error("upsert_track"))?;

            let existing: Option<String> = tx
                .query_row(
                    "SELECT embedding FROM tracks WHERE track_id = ?1",
                    params![track.id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error("upsert_track"))?;
            if let Some(existing) = existing {
                if decode_vector(&existing)? != track.embedding {
                    return Err(Error::InvalidInput(format!(
                        "embedding of track {} cannot change",
                        track.id
                    )));
                }
            }

            let duration = track
                .duration_ms
                .map(|d| i64::try_from(d).unwrap_or(i64::MAX));
            tx.execute(
                "INSERT INTO tracks (track_id, title, artist, album, duration_ms, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(track_id) DO UPDATE SET
                    title = excluded.title,
                    artist = excluded.artist,
                    album = excluded.album,
                    duration_ms = excluded.duration_ms",
                params![
                    track.id.as_str(),
                    track.title,
                    track.artist,
                    track.album,
                    duration,
                    embedding,
                    to_db_timestamp(current_timestamp()),
                ],
            )
            .map_err(db_error("upsert_track"))?;

            tx.execute(
                "DELETE FROM track_vibes WHERE track_id = ?1",
                params![track.id.as_str()],
            )
            .map_err(db_error("upsert_track"))?;
            {
                let mut stmt = tx
                    .prepare("INSERT OR IGNORE INTO track_vibes (track_id, vibe_id) VALUES (?1, ?2)")
                    .map_err(db_error("upsert_track"))?;
                for vibe in &track.vibes {
                    stmt.execute(params![track.id.as_str(), vibe.get()])
                        .map_err(db_error("upsert_track"))?;
                }
            }

            tx.commit().map_err(db_error("upsert_track"))
        })
    }

    fn get_track(&self, id: &TrackId) -> Result<Option<Track>> {
        self.run("get_track", |conn| {
            let row = conn
                .query_row(
                    "SELECT title, artist, album, duration_ms, embedding FROM tracks WHERE track_id = ?1",
                    params![id.as_str()],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, Option<i64>>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(db_error("get_track"))?;

            let Some((title, artist, album, duration, embedding)) = row else {
                return Ok(None);
            };

            Ok(Some(Track {
                id: id.clone(),
                title,
                artist,
                album,
                duration_ms: duration.and_then(|d| u64::try_from(d).ok()),
                embedding: decode_vector(&embedding)?,
                vibes: Self::track_vibes(conn, id)?,
            }))
        })
    }

    fn get_embedding(&self, id: &TrackId) -> Result<Option<Vec<f32>>> {
        self.run("get_embedding", |conn| {
            let text: Option<String> = conn
                .query_row(
                    "SELECT embedding FROM tracks WHERE track_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error("get_embedding"))?;
            text.map(|t| decode_vector(&t)).transpose()
        })
    }

    fn candidate_features(&self, ids: &[TrackId]) -> Result<Vec<CandidateFeatures>> {
        self.run("candidate_features", |conn| {
            let mut stmt = conn
                .prepare_cached("SELECT artist, embedding FROM tracks WHERE track_id = ?1")
                .map_err(db_error("candidate_features"))?;

            let mut features = Vec::with_capacity(ids.len());
            for id in ids {
                let row: Option<(String, String)> = stmt
                    .query_row(params![id.as_str()], |row| Ok((row.get(0)?, row.get(1)?)))
                    .optional()
                    .map_err(db_error("candidate_features"))?;
                if let Some((artist, embedding)) = row {
                    features.push(CandidateFeatures {
                        id: id.clone(),
                        artist,
                        embedding: decode_vector(&embedding)?,
                    });
                }
            }
            Ok(features)
        })
    }

    fn track_ids(&self, vibe: Option<VibeId>) -> Result<Vec<TrackId>> {
        self.run("track_ids", |conn| {
            let ids = match vibe {
                Some(vibe) => {
                    let mut stmt = conn
                        .prepare_cached(
                            "SELECT track_id FROM track_vibes WHERE vibe_id = ?1 ORDER BY track_id",
                        )
                        .map_err(db_error("track_ids"))?;
                    stmt.query_map(params![vibe.get()], |row| row.get::<_, String>(0))
                        .map_err(db_error("track_ids"))?
                        .collect::<rusqlite::Result<Vec<_>>>()
                },
                None => {
                    let mut stmt = conn
                        .prepare_cached("SELECT track_id FROM tracks ORDER BY track_id")
                        .map_err(db_error("track_ids"))?;
                    stmt.query_map([], |row| row.get::<_, String>(0))
                        .map_err(db_error("track_ids"))?
                        .collect::<rusqlite::Result<Vec<_>>>()
                },
            }
            .map_err(db_error("track_ids"))?;

            Ok(ids.into_iter().map(TrackId::new).collect())
        })
    }

    fn track_count(&self) -> Result<usize> {
        self.run("track_count", |conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0))
                .map_err(db_error("track_count"))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    fn upsert_vibe(&self, vibe: &Vibe) -> Result<()> {
        self.run("upsert_vibe", |conn| {
            let tx = conn.transaction().map_err(db_error("upsert_vibe"))?;

            let taken: Option<i64> = tx
                .query_row(
                    "SELECT vibe_id FROM vibes WHERE lower(name) = lower(?1) AND vibe_id != ?2",
                    params![vibe.name, vibe.id.get()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error("upsert_vibe"))?;
            if taken.is_some() {
                return Err(Error::InvalidInput(format!(
                    "vibe name '{}' is already in use",
                    vibe.name
                )));
            }

            tx.execute(
                "INSERT INTO vibes (vibe_id, name, description, color, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(vibe_id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    color = excluded.color",
                params![
                    vibe.id.get(),
                    vibe.name,
                    vibe.description,
                    vibe.color,
                    to_db_timestamp(current_timestamp()),
                ],
            )
            .map_err(db_error("upsert_vibe"))?;

            tx.commit().map_err(db_error("upsert_vibe"))
        })
    }

    fn list_vibes(&self) -> Result<Vec<Vibe>> {
        self.run("list_vibes", |conn| {
            let mut stmt = conn
                .prepare_cached("SELECT vibe_id, name, description, color FROM vibes ORDER BY name")
                .map_err(db_error("list_vibes"))?;
            stmt.query_map([], Self::vibe_from_row)
                .map_err(db_error("list_vibes"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_error("list_vibes"))
        })
    }

    fn find_vibe(&self, name: &str) -> Result<Option<Vibe>> {
        self.run("find_vibe", |conn| {
            conn.query_row(
                "SELECT vibe_id, name, description, color FROM vibes WHERE lower(name) = lower(?1)",
                params![name.trim()],
                Self::vibe_from_row,
            )
            .optional()
            .map_err(db_error("find_vibe"))
        })
    }
}

impl ProfileBackend for SqliteStore {
    fn create_user(&self, user: &User) -> Result<()> {
        self.run("create_user", |conn| {
            let preference = encode_vector(&user.preference)?;
            let inserted = conn
                .execute(
                    "INSERT OR IGNORE INTO users (user_id, user_type, preference_vector, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        user.id.as_str(),
                        user.user_type.as_str(),
                        preference,
                        to_db_timestamp(user.created_at),
                        to_db_timestamp(user.updated_at),
                    ],
                )
                .map_err(db_error("create_user"))?;

            if inserted == 0 {
                return Err(Error::InvalidInput(format!(
                    "user {} already exists",
                    user.id
                )));
            }
            Ok(())
        })
    }

    fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        self.run("get_user", |conn| {
            let sql = format!("SELECT {} FROM users WHERE user_id = ?1", UserRow::COLUMNS);
            conn.query_row(&sql, params![id.as_str()], UserRow::from_row)
                .optional()
                .map_err(db_error("get_user"))?
                .map(UserRow::into_user)
                .transpose()
        })
    }

    fn get_preference(&self, id: &UserId) -> Result<Option<Vec<f32>>> {
        self.run("get_preference", |conn| {
            let text: Option<String> = conn
                .query_row(
                    "SELECT preference_vector FROM users WHERE user_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_error("get_preference"))?;
            text.map(|t| decode_vector(&t)).transpose()
        })
    }

    fn set_preference(&self, id: &UserId, preference: &[f32], updated_at: u64) -> Result<()> {
        self.run("set_preference", |conn| {
            let text = encode_vector(preference)?;
            let updated = conn
                .execute(
                    "UPDATE users SET preference_vector = ?1, updated_at = ?2 WHERE user_id = ?3",
                    params![text, to_db_timestamp(updated_at), id.as_str()],
                )
                .map_err(db_error("set_preference"))?;
            if updated == 0 {
                return Err(Error::UserNotFound(id.clone()));
            }
            Ok(())
        })
    }

    fn seen_tracks(&self, id: &UserId) -> Result<HashSet<TrackId>> {
        self.run("seen_tracks", |conn| {
            let mut stmt = conn
                .prepare_cached("SELECT track_id FROM seen_tracks WHERE user_id = ?1")
                .map_err(db_error("seen_tracks"))?;
            let ids = stmt
                .query_map(params![id.as_str()], |row| row.get::<_, String>(0))
                .map_err(db_error("seen_tracks"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_error("seen_tracks"))?;
            Ok(ids.into_iter().map(TrackId::new).collect())
        })
    }

    fn mark_seen(&self, id: &UserId, tracks: &[TrackId], seen_at: u64) -> Result<()> {
        if tracks.is_empty() {
            return Ok(());
        }
        self.run("mark_seen", |conn| {
            let tx = conn.transaction().map_err(db_error("mark_seen"))?;
            {
                let mut stmt = tx
                    .prepare(
                        "INSERT OR IGNORE INTO seen_tracks (user_id, track_id, seen_at) VALUES (?1, ?2, ?3)",
                    )
                    .map_err(db_error("mark_seen"))?;
                for track in tracks {
                    stmt.execute(params![id.as_str(), track.as_str(), to_db_timestamp(seen_at)])
                        .map_err(db_error("mark_seen"))?;
                }
            }
            tx.commit().map_err(db_error("mark_seen"))
        })
    }

    fn append_feedback(&self, feedback: NewFeedback) -> Result<FeedbackEvent> {
        self.run("append_feedback", |conn| {
            let delta = encode_vector(&feedback.delta)?;
            conn.execute(
                "INSERT INTO feedback (user_id, track_id, action, preference_delta, created_at, undone)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![
                    feedback.user_id.as_str(),
                    feedback.track_id.as_str(),
                    feedback.action.as_str(),
                    delta,
                    to_db_timestamp(feedback.created_at),
                ],
            )
            .map_err(db_error("append_feedback"))?;

            let id = FeedbackId::new(conn.last_insert_rowid());
            Ok(FeedbackEvent::from_new(id, feedback))
        })
    }

    fn latest_active_feedback(&self, id: &UserId) -> Result<Option<FeedbackEvent>> {
        self.run("latest_active_feedback", |conn| {
            let sql = format!(
                "SELECT {} FROM feedback WHERE user_id = ?1 AND undone = 0
                 ORDER BY feedback_id DESC LIMIT 1",
                FeedbackRow::COLUMNS
            );
            conn.query_row(&sql, params![id.as_str()], FeedbackRow::from_row)
                .optional()
                .map_err(db_error("latest_active_feedback"))?
                .map(FeedbackRow::into_event)
                .transpose()
        })
    }

    fn active_feedback_count(&self, id: &UserId) -> Result<usize> {
        self.run("active_feedback_count", |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM feedback WHERE user_id = ?1 AND undone = 0",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .map_err(db_error("active_feedback_count"))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }

    fn mark_undone(&self, feedback: FeedbackId) -> Result<()> {
        self.run("mark_undone", |conn| {
            let updated = conn
                .execute(
                    "UPDATE feedback SET undone = 1 WHERE feedback_id = ?1",
                    params![feedback.get()],
                )
                .map_err(db_error("mark_undone"))?;
            if updated == 0 {
                return Err(Error::OperationFailed {
                    operation: "mark_undone".to_string(),
                    cause: format!("Feedback not found: {feedback}"),
                });
            }
            Ok(())
        })
    }

    fn liked_tracks(&self, id: &UserId) -> Result<Vec<TrackId>> {
        self.run("liked_tracks", |conn| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT DISTINCT track_id FROM feedback
                     WHERE user_id = ?1 AND undone = 0 AND action IN (?2, ?3)
                     ORDER BY track_id",
                )
                .map_err(db_error("liked_tracks"))?;
            let ids = stmt
                .query_map(
                    params![
                        id.as_str(),
                        FeedbackAction::Like.as_str(),
                        FeedbackAction::MoreLikeThis.as_str()
                    ],
                    |row| row.get::<_, String>(0),
                )
                .map_err(db_error("liked_tracks"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_error("liked_tracks"))?;
            Ok(ids.into_iter().map(TrackId::new).collect())
        })
    }

    fn feedback_history(&self, id: &UserId, limit: usize) -> Result<Vec<FeedbackEvent>> {
        self.run("feedback_history", |conn| {
            let sql = format!(
                "SELECT {} FROM feedback WHERE user_id = ?1 ORDER BY feedback_id DESC LIMIT ?2",
                FeedbackRow::COLUMNS
            );
            let mut stmt = conn.prepare(&sql).map_err(db_error("feedback_history"))?;
            let rows = stmt
                .query_map(params![id.as_str(), to_db_count(limit)], FeedbackRow::from_row)
                .map_err(db_error("feedback_history"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(db_error("feedback_history"))?;
            rows.into_iter().map(FeedbackRow::into_event).collect()
        })
    }

    fn feedback_count(&self, id: &UserId) -> Result<usize> {
        self.run("feedback_count", |conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM feedback WHERE user_id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .map_err(db_error("feedback_count"))?;
            Ok(usize::try_from(count).unwrap_or(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SqliteStore {
        SqliteStore::in_memory().unwrap()
    }

    #[test]
    fn test_schema_is_idempotent() {
        let store = store();
        let conn = lock_connection(&store.conn);
        conn.execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_track_roundtrip() {
        let store = store();
        let track = Track::new("t1", "Song", "Band", vec![0.6, 0.8])
            .with_album("Record")
            .with_vibe(VibeId::new(1))
            .with_vibe(VibeId::new(4));
        store.upsert_track(&track).unwrap();

        assert_eq!(store.get_track(&TrackId::new("t1")).unwrap(), Some(track));
        assert!(store.get_track(&TrackId::new("t2")).unwrap().is_none());
    }

    #[test]
    fn test_upsert_replaces_tags_not_embedding() {
        let store = store();
        let id = TrackId::new("t1");
        store
            .upsert_track(&Track::new("t1", "Song", "Band", vec![1.0, 0.0]).with_vibe(VibeId::new(1)))
            .unwrap();
        store
            .upsert_track(&Track::new("t1", "Song", "Band", vec![1.0, 0.0]).with_vibe(VibeId::new(2)))
            .unwrap();
        assert_eq!(store.track_ids(Some(VibeId::new(1))).unwrap(), Vec::<TrackId>::new());
        assert_eq!(store.track_ids(Some(VibeId::new(2))).unwrap(), vec![id.clone()]);

        let changed = Track::new("t1", "Song", "Band", vec![0.0, 1.0]);
        assert!(matches!(store.upsert_track(&changed), Err(Error::InvalidInput(_))));
        assert_eq!(store.get_embedding(&id).unwrap(), Some(vec![1.0, 0.0]));
    }

    #[test]
    fn test_create_user_twice_fails() {
        let store = store();
        let user = User::guest(UserId::new("u1"), 2, 10);
        store.create_user(&user).unwrap();
        assert!(matches!(store.create_user(&user), Err(Error::InvalidInput(_))));
        assert_eq!(store.get_user(&user.id).unwrap(), Some(user));
    }

    #[test]
    fn test_feedback_row_roundtrip() {
        let store = store();
        let event = store
            .append_feedback(NewFeedback {
                user_id: UserId::new("u1"),
                track_id: TrackId::new("t1"),
                action: FeedbackAction::MoreLikeThis,
                delta: vec![0.25, -0.125],
                created_at: 42,
            })
            .unwrap();
        let loaded = store
            .latest_active_feedback(&UserId::new("u1"))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, event);
        assert_eq!(from_db_timestamp(to_db_timestamp(loaded.created_at)), 42);
    }

    #[test]
    fn test_active_feedback_count_skips_undone() {
        let store = store();
        let user = UserId::new("u1");
        let events: Vec<_> = ["t1", "t2", "t3"]
            .into_iter()
            .map(|track| {
                store
                    .append_feedback(NewFeedback {
                        user_id: user.clone(),
                        track_id: TrackId::new(track),
                        action: FeedbackAction::Like,
                        delta: vec![1.0, 0.0],
                        created_at: 1,
                    })
                    .unwrap()
            })
            .collect();
        store.mark_undone(events[2].id).unwrap();

        assert_eq!(store.active_feedback_count(&user).unwrap(), 2);
        assert_eq!(store.active_feedback_count(&UserId::new("u2")).unwrap(), 0);
        assert_eq!(store.feedback_count(&user).unwrap(), 3);
    }

    #[test]
    fn test_mark_undone_unknown_id() {
        assert!(store().mark_undone(FeedbackId::new(99)).is_err());
    }
}
