/// Database Module
///
/// This module handles all PostgreSQL database operations including:
/// - A single-connection pool for the whole run
/// - The per-file transaction behind `StarSchemaStore::commit`
/// - Schema migrations
#[cfg(test)]
pub mod memory;
pub mod queries;

use crate::etl::load::StarSchemaStore;
use crate::models::{Artist, Song, SongMatch, SongPlay, TimeRow, User};
use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, QueryBuilder, Transaction};

/// Rows per bulk insert statement unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;

pub struct Database {
    pool: PgPool,
    /// Open transaction holding everything since the last commit
    tx: Option<Transaction<'static, Postgres>>,
    chunk_size: usize,
}

impl Database {
    /// Connect to PostgreSQL with exactly one connection
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        Ok(Self { pool, tx: None, chunk_size: DEFAULT_CHUNK_SIZE })
    }

    /// Set the number of rows sent in one bulk insert
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.context("Failed to run database migrations")?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.context("Database connection test failed")?;

        Ok(())
    }

    /// Roll back uncommitted work and release the connection
    pub async fn close(mut self) {
        if let Some(tx) = self.tx.take() {
            if let Err(e) = tx.rollback().await {
                tracing::warn!("Failed to roll back open transaction: {}", e);
            } else {
                tracing::info!("Rolled back uncommitted work");
            }
        }

        self.pool.close().await;
        tracing::info!("Database connection closed");
    }

    /// The open transaction, beginning one if needed
    async fn transaction(&mut self) -> Result<&mut Transaction<'static, Postgres>> {
        if self.tx.is_none() {
            let tx = self.pool.begin().await.context("Failed to begin transaction")?;
            self.tx = Some(tx);
        }

        self.tx.as_mut().context("No open transaction")
    }
}

impl StarSchemaStore for Database {
    async fn insert_song(&mut self, song: &Song) -> Result<()> {
        let tx = self.transaction().await?;

        sqlx::query(queries::SONG_INSERT)
            .bind(&song.song_id)
            .bind(&song.title)
            .bind(&song.artist_id)
            .bind(song.year)
            .bind(song.duration)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert song {}", song.song_id))?;

        Ok(())
    }

    async fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        let tx = self.transaction().await?;

        sqlx::query(queries::ARTIST_INSERT)
            .bind(&artist.artist_id)
            .bind(&artist.name)
            .bind(&artist.location)
            .bind(artist.latitude)
            .bind(artist.longitude)
            .execute(&mut **tx)
            .await
            .with_context(|| format!("Failed to insert artist {}", artist.artist_id))?;

        Ok(())
    }

    async fn insert_times(&mut self, rows: &[TimeRow]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let chunk_size = self.chunk_size;
        let tx = self.transaction().await?;

        for chunk in rows.chunks(chunk_size) {
            let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(queries::TIME_INSERT);
            qb.push_values(chunk, |mut b, row| {
                b.push_bind(row.start_time)
                    .push_bind(row.hour)
                    .push_bind(row.day)
                    .push_bind(row.week)
                    .push_bind(row.month)
                    .push_bind(row.year)
                    .push_bind(row.weekday);
            });
            qb.push(queries::TIME_ON_CONFLICT);

            qb.build().execute(&mut **tx).await.context("Failed to insert time rows")?;
        }

        tracing::debug!("Inserted {} time rows", rows.len());
        Ok(())
    }

    async fn insert_users(&mut self, rows: &[User]) -> Result<()> {
        let tx = self.transaction().await?;

        // One statement per row: a single upsert cannot touch the same user twice.
        for user in rows {
            sqlx::query(queries::USER_UPSERT)
                .bind(user.user_id)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.gender)
                .bind(&user.level)
                .execute(&mut **tx)
                .await
                .with_context(|| format!("Failed to upsert user {}", user.user_id))?;
        }

        tracing::debug!("Upserted {} users", rows.len());
        Ok(())
    }

    async fn insert_songplays(&mut self, rows: &[SongPlay]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let chunk_size = self.chunk_size;
        let tx = self.transaction().await?;

        for chunk in rows.chunks(chunk_size) {
            let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(queries::SONGPLAY_INSERT);
            qb.push_values(chunk, |mut b, play| {
                b.push_bind(play.start_time)
                    .push_bind(play.user_id)
                    .push_bind(play.level.clone())
                    .push_bind(play.song_id.clone())
                    .push_bind(play.artist_id.clone())
                    .push_bind(play.location.clone())
                    .push_bind(play.user_agent.clone());
            });

            qb.build().execute(&mut **tx).await.context("Failed to insert songplays")?;
        }

        tracing::debug!("Inserted {} songplays", rows.len());
        Ok(())
    }

    async fn find_song(&mut self, title: &str, artist_name: &str, duration: f64) -> Result<Option<SongMatch>> {
        let tx = self.transaction().await?;

        let found = sqlx::query_as::<_, SongMatch>(queries::SONG_SELECT)
            .bind(title)
            .bind(artist_name)
            .bind(duration)
            .fetch_optional(&mut **tx)
            .await
            .with_context(|| format!("Failed to look up song {:?} by {:?}", title, artist_name))?;

        Ok(found)
    }

    async fn commit(&mut self) -> Result<()> {
        if let Some(tx) = self.tx.take() {
            tx.commit().await.context("Failed to commit transaction")?;
        }

        Ok(())
    }
}
