//! Opening and locking the `SQLite` connection.

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// How long a statement waits on a locked database file.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens a database file, creating parent directories, and applies the
/// connection pragmas.
///
/// WAL lets the CLI read while another process writes; `synchronous =
/// NORMAL` is durable under WAL except on power loss.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] if the directory cannot be created,
/// the file cannot be opened, or the busy timeout cannot be set.
pub fn open_file(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::OperationFailed {
            operation: "create_database_dir".to_string(),
            cause: format!("{}: {e}", parent.display()),
        })?;
    }

    let conn = Connection::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_database".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;

    // journal_mode answers with a row, so pragma_update reports an error
    // even when the mode was applied.
    let _ = conn.pragma_update(None, "journal_mode", "WAL");
    let _ = conn.pragma_update(None, "synchronous", "NORMAL");
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| Error::OperationFailed {
            operation: "set_busy_timeout".to_string(),
            cause: e.to_string(),
        })?;

    Ok(conn)
}

/// Locks the connection, recovering from poison.
///
/// A panic while the lock was held cannot leave a half-applied write:
/// multi-statement writes run in a transaction that rolls back on drop.
pub fn lock_connection(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("SQLite connection mutex was poisoned, recovering");
        metrics::counter!("sqlite_mutex_poison_recovery_total").increment(1);
        poisoned.into_inner()
    })
}

/// Records `storage_operations_total` and `storage_operation_duration_ms`
/// for one store call.
pub fn record_operation(operation: &'static str, start: Instant, ok: bool) {
    let status = if ok { "success" } else { "error" };
    metrics::counter!(
        "storage_operations_total",
        "backend" => "sqlite",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        "storage_operation_duration_ms",
        "backend" => "sqlite",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64() * 1000.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_open_file_sets_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("feed.db");
        let conn = open_file(&path).unwrap();
        assert!(path.exists());

        let timeout: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn test_lock_connection_recovers_from_poison() {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let poisoner = Arc::clone(&conn);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison the connection");
        })
        .join();

        assert!(conn.is_poisoned());
        let guard = lock_connection(&conn);
        let one: i64 = guard.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
        assert_eq!(one, 1);
    }

    #[test]
    fn test_record_operation_without_recorder() {
        record_operation("get_track", Instant::now(), true);
        record_operation("get_track", Instant::now(), false);
    }
}
