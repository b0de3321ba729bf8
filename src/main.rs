/// Sparkify ETL
///
/// Loads the song metadata and user activity datasets into the Sparkify
/// star schema: songs and artists first, then time, users and songplays.
mod cli;
mod db;
mod error;
mod etl;
mod models;
mod pipeline;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use db::Database;
use etl::{FileProcessor, LogFileProcessor, SongFileProcessor};
use pipeline::{Pipeline, PipelineStats};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    cli.validate()?;

    println!("🚀 Starting Sparkify ETL...");

    println!("\n💾 Connecting to PostgreSQL database...");
    let mut database = Database::new(&cli.database_url)
        .await
        .context("Failed to connect to PostgreSQL database")?
        .with_chunk_size(cli.chunk_size);

    // The connection is released on every path out of the load
    let outcome = run(&cli, &mut database).await;
    database.close().await;
    let (song_stats, log_stats) = outcome?;

    pipeline::print_stats(SongFileProcessor.dataset(), &song_stats);
    pipeline::print_stats(LogFileProcessor.dataset(), &log_stats);

    println!(
        "\n✨ ETL complete! {} files loaded, {} songplays recorded",
        format_number((song_stats.files_processed + log_stats.files_processed) as u64),
        format_number(log_stats.rows.songplays as u64)
    );

    Ok(())
}

/// Song metadata must be loaded before the logs: songplays resolve against it
async fn run(cli: &Cli, database: &mut Database) -> Result<(PipelineStats, PipelineStats)> {
    database.test_connection().await.context("Database connection test failed")?;
    println!("✅ Database connected successfully!");

    if cli.create_schema {
        println!("📋 Creating star schema...");
        database.migrate().await.context("Failed to create star schema")?;
    }

    let mut pipeline = Pipeline::new(database);

    println!("\n🎵 Loading song metadata...");
    let song_stats =
        pipeline.process_data(&cli.song_data, &SongFileProcessor).await.context("Song metadata load failed")?;
    tracing::info!("Loaded {} song files", song_stats.files_processed);

    println!("\n📝 Loading activity logs...");
    let log_stats = pipeline.process_data(&cli.log_data, &LogFileProcessor).await.context("Activity log load failed")?;
    tracing::info!(
        "Loaded {} log files: {} songplays, {} resolved",
        log_stats.files_processed,
        log_stats.rows.songplays,
        log_stats.rows.songplays_resolved
    );

    Ok((song_stats, log_stats))
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
