//! CSV catalog import.
//!
//! Reads one track per row. Headers are matched case-insensitively and a
//! few aliases are accepted so common dataset exports load unchanged:
//!
//! | Field | Headers |
//! |-------|---------|
//! | id (required) | `track_id`, `id` |
//! | title (required) | `title`, `track_name`, `name` |
//! | artist (required) | `artist`, `artists` |
//! | embedding (required) | `embedding`, `embedding_vector`, `vector` |
//! | album | `album`, `album_name` |
//! | duration | `duration_ms`, `duration` |
//! | vibes | `vibes`, `tags` |
//!
//! Embeddings are either a JSON array or numbers separated by whitespace or
//! `;`. Vibes are names or ids separated by `|`, `;` or `,`.
//!
//! Rows missing a required field, or failing validation, are skipped and
//! reported; they do not abort the import.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::models::{Track, TrackId, VibeId};
use crate::services::CatalogService;
use crate::{Error, Result};

/// Maps CSV column indices to track fields.
#[derive(Debug, Default)]
struct ColumnMap {
    id: Option<usize>,
    title: Option<usize>,
    artist: Option<usize>,
    album: Option<usize>,
    duration_ms: Option<usize>,
    embedding: Option<usize>,
    vibes: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &::csv::StringRecord) -> Result<Self> {
        let mut map = Self::default();

        for (i, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "track_id" | "id" => map.id = Some(i),
                "title" | "track_name" | "name" => map.title = Some(i),
                "artist" | "artists" => map.artist = Some(i),
                "album" | "album_name" => map.album = Some(i),
                "duration_ms" | "duration" => map.duration_ms = Some(i),
                "embedding" | "embedding_vector" | "vector" => map.embedding = Some(i),
                "vibes" | "tags" => map.vibes = Some(i),
                _ => {},
            }
        }

        let missing: Vec<&str> = [
            ("track_id", map.id),
            ("title", map.title),
            ("artist", map.artist),
            ("embedding", map.embedding),
        ]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "CSV is missing required columns: {}",
                missing.join(", ")
            )));
        }

        Ok(map)
    }
}

/// A parsed but not yet validated row.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackRecord {
    /// Track id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Artist label.
    pub artist: String,
    /// Album name.
    pub album: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Raw embedding components.
    pub embedding: Vec<f32>,
    /// Vibe names or ids.
    pub vibes: Vec<String>,
}

/// Parses an embedding cell.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if a component is not a number.
pub fn parse_embedding(cell: &str) -> Result<Vec<f32>> {
    let cell = cell.trim();
    if cell.starts_with('[') {
        return serde_json::from_str(cell)
            .map_err(|e| Error::InvalidInput(format!("bad embedding array: {e}")));
    }

    cell.split(|c: char| c.is_whitespace() || c == ';')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f32>()
                .map_err(|_| Error::InvalidInput(format!("bad embedding component '{s}'")))
        })
        .collect()
}

/// Splits a vibes cell into trimmed, non-empty entries.
#[must_use]
pub fn parse_vibes(cell: &str) -> Vec<String> {
    cell.split(['|', ';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Streaming reader of [`TrackRecord`]s.
pub struct CsvTrackSource<R: Read> {
    reader: ::csv::Reader<R>,
    columns: ColumnMap,
}

impl<R: Read> CsvTrackSource<R> {
    /// Creates a source and reads the header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the headers cannot be read or a required column
    /// is missing.
    pub fn new(reader: R) -> Result<Self> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(::csv::Trim::All)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| Error::OperationFailed {
                operation: "read_csv_headers".to_string(),
                cause: e.to_string(),
            })?
            .clone();
        let columns = ColumnMap::from_headers(&headers)?;

        Ok(Self { reader, columns })
    }

    /// Reads the next row.
    ///
    /// Returns `None` at end of input. The inner result carries the line
    /// number and either the parsed record or the reason it was rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails.
    pub fn next_record(&mut self) -> Result<Option<(u64, Result<TrackRecord>)>> {
        let mut record = ::csv::StringRecord::new();
        let has_record = self
            .reader
            .read_record(&mut record)
            .map_err(|e| Error::OperationFailed {
                operation: "read_csv".to_string(),
                cause: e.to_string(),
            })?;
        if !has_record {
            return Ok(None);
        }

        let line = record.position().map_or(0, ::csv::Position::line);
        Ok(Some((line, self.parse_record(&record))))
    }

    fn parse_record(&self, record: &::csv::StringRecord) -> Result<TrackRecord> {
        let get_field = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        };
        let required = |idx: Option<usize>, name: &str| {
            get_field(idx).ok_or_else(|| Error::InvalidInput(format!("missing {name}")))
        };

        let id = required(self.columns.id, "track_id")?;
        let title = required(self.columns.title, "title")?;
        let artist = required(self.columns.artist, "artist")?;
        let embedding = parse_embedding(&required(self.columns.embedding, "embedding")?)?;

        let duration_ms = get_field(self.columns.duration_ms)
            .map(|s| {
                s.parse::<u64>()
                    .map_err(|_| Error::InvalidInput(format!("bad duration_ms '{s}'")))
            })
            .transpose()?;

        Ok(TrackRecord {
            id,
            title,
            artist,
            album: get_field(self.columns.album),
            duration_ms,
            embedding,
            vibes: get_field(self.columns.vibes)
                .map(|v| parse_vibes(&v))
                .unwrap_or_default(),
        })
    }
}

/// Options for a catalog import.
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    /// Stop after this many imported tracks.
    pub limit: Option<usize>,
    /// Validate rows without storing them.
    pub dry_run: bool,
}

/// A rejected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportIssue {
    /// 1-based line number in the input.
    pub line: u64,
    /// Why the row was skipped.
    pub message: String,
}

/// Summary of a catalog import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Rows stored (or that would be stored, in a dry run).
    pub imported: usize,
    /// Rows skipped.
    pub skipped: usize,
    /// Reasons for each skipped row.
    pub issues: Vec<ImportIssue>,
}

/// Imports tracks from CSV into the catalog.
///
/// Vibe entries are resolved by id or name against the stored taxonomy, so
/// vibes should be seeded first.
///
/// # Errors
///
/// Returns an error if the header row is invalid or reading fails. Per-row
/// problems are reported in [`ImportResult::issues`].
pub fn import_tracks<R: Read>(
    reader: R,
    catalog: &CatalogService,
    options: &ImportOptions,
) -> Result<ImportResult> {
    let mut source = CsvTrackSource::new(reader)?;
    let mut result = ImportResult::default();

    while let Some((line, parsed)) = source.next_record()? {
        if options.limit.is_some_and(|limit| result.imported >= limit) {
            break;
        }

        match parsed.and_then(|record| store_record(catalog, record, options.dry_run)) {
            Ok(()) => result.imported += 1,
            Err(e) => {
                tracing::debug!(line, error = %e, "Skipping CSV row");
                result.skipped += 1;
                result.issues.push(ImportIssue {
                    line,
                    message: e.to_string(),
                });
            },
        }
    }

    metrics::counter!("catalog_tracks_imported_total").increment(result.imported as u64);
    tracing::info!(
        imported = result.imported,
        skipped = result.skipped,
        dry_run = options.dry_run,
        "Catalog import finished"
    );
    Ok(result)
}

/// Imports tracks from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, or as [`import_tracks`].
pub fn import_file(
    path: impl AsRef<Path>,
    catalog: &CatalogService,
    options: &ImportOptions,
) -> Result<ImportResult> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| Error::OperationFailed {
        operation: "open_csv".to_string(),
        cause: format!("{}: {e}", path.display()),
    })?;
    import_tracks(BufReader::new(file), catalog, options)
}

fn store_record(catalog: &CatalogService, record: TrackRecord, dry_run: bool) -> Result<()> {
    let mut track = Track::new(
        TrackId::new(record.id),
        record.title,
        record.artist,
        record.embedding,
    );
    track.album = record.album;
    track.duration_ms = record.duration_ms;

    for vibe in &record.vibes {
        let id: VibeId = catalog.resolve_vibe(vibe)?.id;
        track = track.with_vibe(id);
    }

    if dry_run {
        catalog.validate_track(track).map(|_| ())
    } else {
        catalog.add_track(track).map(|_| ())
    }
}
