/// Error Module
///
/// Typed failures for malformed source files. Any of these aborts the file
/// being processed, and with it the whole run.
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} contains no records", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("{}:{line}: malformed record", .path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{}:{line}: expected a JSON object", .path.display())]
    NotAnObject { path: PathBuf, line: usize },

    #[error("{}:{line}: timestamp {ts} is out of range", .path.display())]
    InvalidTimestamp { path: PathBuf, line: usize, ts: i64 },
}
