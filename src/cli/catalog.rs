//! `init`, `import` and `vibes` commands.

use std::fmt;
use std::path::{Path, PathBuf};

use super::App;
use crate::Result;
use crate::io::{ImportOptions, ImportResult, import_file};
use crate::models::Vibe;

/// Output of `init`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    /// Database location.
    pub database: PathBuf,
    /// Number of default vibes ensured.
    pub vibes: usize,
    /// Tracks already in the catalog.
    pub tracks: usize,
}

impl fmt::Display for InitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database ready: {}", self.database.display())?;
        writeln!(f, "  Vibes:  {}", self.vibes)?;
        write!(f, "  Tracks: {}", self.tracks)
    }
}

/// Seeds the default vibes.
///
/// # Errors
///
/// Returns an error if a store call fails.
pub fn init(app: &App) -> Result<InitReport> {
    Ok(InitReport {
        database: app.config.database_path(),
        vibes: app.catalog.seed_default_vibes()?,
        tracks: app.catalog.track_count()?,
    })
}

/// Output of `import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    /// Source file.
    pub path: PathBuf,
    /// Whether nothing was stored.
    pub dry_run: bool,
    /// Import counts and issues.
    pub result: ImportResult,
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Validated" } else { "Imported" };
        write!(
            f,
            "{verb} {} tracks from {} ({} skipped)",
            self.result.imported,
            self.path.display(),
            self.result.skipped
        )?;
        for issue in &self.result.issues {
            write!(f, "\n  line {}: {}", issue.line, issue.message)?;
        }
        Ok(())
    }
}

/// Imports a CSV file into the catalog.
///
/// # Errors
///
/// Returns an error if the file cannot be read or has no usable header.
pub fn import(app: &App, path: &Path, options: &ImportOptions) -> Result<ImportReport> {
    let result = import_file(path, &app.catalog, options)?;
    Ok(ImportReport {
        path: path.to_path_buf(),
        dry_run: options.dry_run,
        result,
    })
}

/// Output of `vibes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VibeList(pub Vec<Vibe>);

impl fmt::Display for VibeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "No vibes defined. Run `vibefeed init` first.");
        }
        for (i, vibe) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>3}  {:<12}", vibe.id, vibe.name)?;
            if let Some(description) = &vibe.description {
                write!(f, "  {description}")?;
            }
        }
        Ok(())
    }
}

/// Lists vibes.
///
/// # Errors
///
/// Returns an error if the store read fails.
pub fn vibes(app: &App) -> Result<VibeList> {
    app.catalog.list_vibes().map(VibeList)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::test_support::app;

    #[test]
    fn test_init_reports_counts() {
        let report = init(&app()).unwrap();
        assert_eq!(report.vibes, 6);
        assert_eq!(report.tracks, 3);
        assert!(report.to_string().contains("Tracks: 3"));
    }

    #[test]
    fn test_import_report_lists_issues() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracks.csv");
        std::fs::write(
            &path,
            "track_id,title,artist,embedding\nt9,New,C,0.6 0.8\nt10,,C,1 0\n",
        )
        .unwrap();

        let app = app();
        let report = import(&app, &path, &ImportOptions::default()).unwrap();
        assert_eq!(report.result.imported, 1);
        assert_eq!(report.result.skipped, 1);
        let text = report.to_string();
        assert!(text.starts_with("Imported 1 tracks"));
        assert!(text.contains("line 3"));
        assert_eq!(app.catalog.track_count().unwrap(), 4);
    }

    #[test]
    fn test_vibes_listing() {
        let text = vibes(&app()).unwrap().to_string();
        assert_eq!(text.lines().count(), 6);
        assert!(text.lines().next().unwrap().contains("chill"));
        assert!(VibeList(Vec::new()).to_string().contains("vibefeed init"));
    }
}
