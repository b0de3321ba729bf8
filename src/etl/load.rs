/// Load Module
///
/// Submits transformed rows to the star schema through [`StarSchemaStore`].
/// The store is a single connection: statements run in program order and
/// nothing becomes durable until [`StarSchemaStore::commit`].
use super::extract::ExtractedEvent;
use super::transform;
use super::FileSummary;
use crate::error::SourceError;
use crate::models::{Artist, Song, SongMatch, SongPlay, SongRecord, TimeRow, User};
use anyhow::Result;
use std::path::Path;

/// Statement executor for the star schema
pub trait StarSchemaStore {
    /// Insert a song, leaving an existing row with the same `song_id` untouched
    async fn insert_song(&mut self, song: &Song) -> Result<()>;

    /// Insert an artist, leaving an existing row with the same `artist_id` untouched
    async fn insert_artist(&mut self, artist: &Artist) -> Result<()>;

    /// Insert time rows; timestamps already present are skipped
    async fn insert_times(&mut self, rows: &[TimeRow]) -> Result<()>;

    /// Upsert users in order, so the last row for a `user_id` decides its `level`
    async fn insert_users(&mut self, rows: &[User]) -> Result<()>;

    async fn insert_songplays(&mut self, rows: &[SongPlay]) -> Result<()>;

    /// Look up a song by exact title, artist name and duration
    async fn find_song(&mut self, title: &str, artist_name: &str, duration: f64) -> Result<Option<SongMatch>>;

    /// Make everything submitted since the last commit durable
    async fn commit(&mut self) -> Result<()>;
}

/// Load one song-metadata record: the song row first, then its artist
pub async fn load_song_record<S: StarSchemaStore>(store: &mut S, record: &SongRecord) -> Result<FileSummary> {
    let (song, artist) = transform::song_rows(record);

    store.insert_song(&song).await?;
    store.insert_artist(&artist).await?;

    Ok(FileSummary { songs: 1, artists: 1, ..FileSummary::default() })
}

/// Load the `NextSong` events of one log file
///
/// All time rows are submitted, then all users, then the songplays. Each
/// songplay is resolved against the song/artist dimensions; a miss still
/// produces a fact row with empty song and artist ids.
pub async fn load_log_events<S: StarSchemaStore>(
    store: &mut S,
    path: &Path,
    events: &[ExtractedEvent],
) -> Result<FileSummary> {
    let stamped = events
        .iter()
        .map(|extracted| {
            transform::event_time(extracted.event.ts).map(|start_time| (start_time, &extracted.event)).ok_or_else(|| {
                SourceError::InvalidTimestamp { path: path.to_path_buf(), line: extracted.line, ts: extracted.event.ts }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let times: Vec<TimeRow> = stamped.iter().map(|(start_time, _)| transform::time_row(*start_time)).collect();
    store.insert_times(&times).await?;

    let users: Vec<User> = stamped.iter().map(|(_, event)| transform::user_row(event)).collect();
    store.insert_users(&users).await?;

    let mut songplays = Vec::with_capacity(stamped.len());
    let mut resolved = 0;
    for (start_time, event) in &stamped {
        let song = store.find_song(&event.song, &event.artist, event.length).await?;
        if song.is_some() {
            resolved += 1;
        }
        songplays.push(transform::songplay_row(event, *start_time, song));
    }
    store.insert_songplays(&songplays).await?;

    Ok(FileSummary {
        time_rows: times.len(),
        users: users.len(),
        songplays: songplays.len(),
        songplays_resolved: resolved,
        ..FileSummary::default()
    })
}
