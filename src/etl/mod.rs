/// ETL Module
///
/// One source file at a time:
/// - Extract: decode JSON-lines song metadata or activity logs
/// - Transform: map records to star-schema rows
/// - Load: submit the rows through a [`load::StarSchemaStore`]
pub mod extract;
pub mod load;
pub mod transform;

use anyhow::Result;
use load::StarSchemaStore;
use std::path::Path;

/// Row counts produced from one source file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub events_read: usize,
    pub events_retained: usize,
    pub songs: usize,
    pub artists: usize,
    pub time_rows: usize,
    pub users: usize,
    pub songplays: usize,
    pub songplays_resolved: usize,
}

/// Turns one source file into rows submitted to the store
pub trait FileProcessor {
    /// Short name of the dataset, used in progress output
    fn dataset(&self) -> &'static str;

    async fn process<S: StarSchemaStore>(&self, store: &mut S, path: &Path) -> Result<FileSummary>;
}

/// Song-metadata files: one `songs` row and one `artists` row per file
#[derive(Debug, Clone, Copy, Default)]
pub struct SongFileProcessor;

impl FileProcessor for SongFileProcessor {
    fn dataset(&self) -> &'static str {
        "song metadata"
    }

    async fn process<S: StarSchemaStore>(&self, store: &mut S, path: &Path) -> Result<FileSummary> {
        let record = extract::read_song_file(path).await?;
        load::load_song_record(store, &record).await
    }
}

/// Activity-log files: `time`, `users` and `songplays` rows for every `NextSong` event
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFileProcessor;

impl FileProcessor for LogFileProcessor {
    fn dataset(&self) -> &'static str {
        "activity log"
    }

    async fn process<S: StarSchemaStore>(&self, store: &mut S, path: &Path) -> Result<FileSummary> {
        let log = extract::read_log_file(path).await?;
        let summary = load::load_log_events(store, path, &log.events).await?;

        let unresolved = summary.songplays - summary.songplays_resolved;
        if unresolved > 0 {
            tracing::debug!("{} of {} songplays in {} matched no song", unresolved, summary.songplays, path.display());
        }

        Ok(FileSummary { events_read: log.events_read, events_retained: log.events.len(), ..summary })
    }
}
