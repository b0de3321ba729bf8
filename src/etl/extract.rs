/// Extract Module
///
/// Reads JSON-lines source files and decodes them into source records.
use crate::error::SourceError;
use crate::models::{LogEvent, SongRecord};
use std::path::Path;

/// `page` value of the events that represent a song being played
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// A retained log event with its 1-based line number in the source file
#[derive(Debug, Clone)]
pub struct ExtractedEvent {
    pub line: usize,
    pub event: LogEvent,
}

/// All `NextSong` events of one log file, in file order
#[derive(Debug, Clone, Default)]
pub struct ExtractedLog {
    /// Number of events in the file, before filtering
    pub events_read: usize,
    pub events: Vec<ExtractedEvent>,
}

async fn read_source(path: &Path) -> Result<String, SourceError> {
    tokio::fs::read_to_string(path).await.map_err(|source| SourceError::Io { path: path.to_path_buf(), source })
}

/// Non-blank lines with their 1-based line numbers
fn json_lines(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents.lines().enumerate().map(|(index, line)| (index + 1, line.trim())).filter(|(_, line)| !line.is_empty())
}

/// Read a song-metadata file and return its record
pub async fn read_song_file(path: &Path) -> Result<SongRecord, SourceError> {
    let contents = read_source(path).await?;
    parse_song_record(path, &contents)
}

/// Decode the first record of a song-metadata file
///
/// Song files hold a single record; any further lines are ignored.
pub fn parse_song_record(path: &Path, contents: &str) -> Result<SongRecord, SourceError> {
    let mut lines = json_lines(contents);
    let (line, first) = lines.next().ok_or_else(|| SourceError::EmptyFile { path: path.to_path_buf() })?;

    let record = serde_json::from_str::<SongRecord>(first).map_err(|source| SourceError::Malformed {
        path: path.to_path_buf(),
        line,
        source,
    })?;

    let ignored = lines.count();
    if ignored > 0 {
        tracing::debug!("Ignoring {} extra records in {}", ignored, path.display());
    }

    Ok(record)
}

/// Read a log file and return its `NextSong` events
pub async fn read_log_file(path: &Path) -> Result<ExtractedLog, SourceError> {
    let contents = read_source(path).await?;
    parse_log_events(path, &contents)
}

/// Decode a log file, keeping only `NextSong` events
///
/// Every line must be a JSON object. Events with any other `page` are dropped
/// before being decoded, so they may omit the song fields entirely.
pub fn parse_log_events(path: &Path, contents: &str) -> Result<ExtractedLog, SourceError> {
    let mut extracted = ExtractedLog::default();

    for (line, text) in json_lines(contents) {
        let malformed = |source| SourceError::Malformed { path: path.to_path_buf(), line, source };

        let value: serde_json::Value = serde_json::from_str(text).map_err(malformed)?;
        if !value.is_object() {
            return Err(SourceError::NotAnObject { path: path.to_path_buf(), line });
        }
        extracted.events_read += 1;

        if value.get("page").and_then(|p| p.as_str()) != Some(NEXT_SONG_PAGE) {
            continue;
        }

        let event = serde_json::from_value::<LogEvent>(value).map_err(malformed)?;
        extracted.events.push(ExtractedEvent { line, event });
    }

    Ok(extracted)
}
