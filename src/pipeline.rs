/// Pipeline Module
///
/// Drives one dataset through the ETL: discover every source file under a
/// root, process each one and commit before moving on to the next.
use crate::etl::{load::StarSchemaStore, FileProcessor, FileSummary};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Extension of the source files
pub const SOURCE_EXTENSION: &str = "json";

/// Pipeline execution statistics
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub rows: FileSummary,
    pub elapsed_time: Duration,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, summary: &FileSummary) {
        self.files_processed += 1;
        self.rows.events_read += summary.events_read;
        self.rows.events_retained += summary.events_retained;
        self.rows.songs += summary.songs;
        self.rows.artists += summary.artists;
        self.rows.time_rows += summary.time_rows;
        self.rows.users += summary.users;
        self.rows.songplays += summary.songplays;
        self.rows.songplays_resolved += summary.songplays_resolved;
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.files_processed as f64 / secs
        }
    }

    /// Share of songplays that matched a known song, in percent
    pub fn resolution_rate(&self) -> f64 {
        if self.rows.songplays == 0 {
            0.0
        } else {
            (self.rows.songplays_resolved as f64 / self.rows.songplays as f64) * 100.0
        }
    }
}

/// Every file with the given extension under `root`, recursively
///
/// Paths are absolute and sorted. A root that does not exist has no files.
pub fn discover_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        tracing::warn!("Data directory {} does not exist", root.display());
        return Ok(Vec::new());
    }

    let root = root.canonicalize().with_context(|| format!("Failed to resolve {}", root.display()))?;
    let pattern = format!("{}/**/*.{}", glob::Pattern::escape(&root.to_string_lossy()), extension);

    let mut files = Vec::new();
    for entry in glob::glob(&pattern).with_context(|| format!("Invalid glob pattern {}", pattern))? {
        let path = entry.context("Failed to read directory entry")?;
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Batch driver over a single shared store
pub struct Pipeline<'a, S> {
    store: &'a mut S,
}

impl<'a, S: StarSchemaStore> Pipeline<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Process every source file under `root`, committing after each one
    ///
    /// The first failing file aborts the run; its uncommitted rows are
    /// discarded with the open transaction.
    pub async fn process_data<P: FileProcessor>(&mut self, root: &Path, processor: &P) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let mut stats = PipelineStats::new();

        let files = discover_files(root, SOURCE_EXTENSION)?;
        stats.files_found = files.len();

        tracing::info!("Loading {} {} files from {}", files.len(), processor.dataset(), root.display());
        println!("{} files found in {}", files.len(), root.display());

        for (index, file) in files.iter().enumerate() {
            let summary = processor
                .process(&mut *self.store, file)
                .await
                .with_context(|| format!("Failed to process {}", file.display()))?;
            self.store.commit().await.with_context(|| format!("Failed to commit {}", file.display()))?;

            stats.record(&summary);
            tracing::debug!("Processed {}: {:?}", file.display(), summary);
            println!("{}/{} files processed.", index + 1, stats.files_found);
        }

        stats.elapsed_time = start_time.elapsed();
        Ok(stats)
    }
}

/// Print final statistics for one dataset
pub fn print_stats(dataset: &str, stats: &PipelineStats) {
    println!("\n📊 {} statistics:", dataset);
    println!("   ⏱️  Total time: {:.2}s", stats.elapsed_time.as_secs_f64());
    println!("   📁 Files: {} found, {} processed", stats.files_found, stats.files_processed);
    println!("   ⚡ Speed: {:.2} files/sec", stats.files_per_second());

    let rows = &stats.rows;
    if rows.songs > 0 || rows.artists > 0 {
        println!("   🎵 Songs: {} | 🎤 Artists: {}", rows.songs, rows.artists);
    }
    if rows.events_read > 0 {
        println!("   📝 Events: {} read, {} song plays", rows.events_read, rows.events_retained);
        println!("   🕒 Time rows: {} | 👤 User rows: {}", rows.time_rows, rows.users);
        println!(
            "   ▶️  Songplays: {} ({} resolved, {:.1}%)",
            rows.songplays,
            rows.songplays_resolved,
            stats.resolution_rate()
        );
    }
}
