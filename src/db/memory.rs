/// In-memory star schema with the same conflict policies as the Postgres tables
///
/// Writes are staged until `commit`, like the per-file transaction of
/// `Database`. The public tables only ever hold committed rows.
use crate::etl::load::StarSchemaStore;
use crate::models::{Artist, Song, SongMatch, SongPlay, TimeRow, User};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum StagedWrite {
    Song(Song),
    Artist(Artist),
    Times(Vec<TimeRow>),
    Users(Vec<User>),
    Songplays(Vec<SongPlay>),
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub songs: BTreeMap<String, Song>,
    pub artists: BTreeMap<String, Artist>,
    pub times: BTreeMap<DateTime<Utc>, TimeRow>,
    pub users: BTreeMap<i64, User>,
    pub songplays: Vec<SongPlay>,
    /// Store calls in the order they were made
    pub statements: Vec<&'static str>,
    pub commits: usize,
    /// Song title whose lookup fails, simulating a statement error
    pub fail_lookup_of: Option<String>,
    pub(crate) staged: Vec<StagedWrite>,
}

impl MemoryStore {
    /// Whether writes are waiting for a commit
    pub fn has_uncommitted(&self) -> bool {
        !self.staged.is_empty()
    }

    fn apply(&mut self, write: StagedWrite) {
        match write {
            StagedWrite::Song(song) => {
                self.songs.entry(song.song_id.clone()).or_insert(song);
            }
            StagedWrite::Artist(artist) => {
                self.artists.entry(artist.artist_id.clone()).or_insert(artist);
            }
            StagedWrite::Times(rows) => {
                for row in rows {
                    self.times.entry(row.start_time).or_insert(row);
                }
            }
            StagedWrite::Users(rows) => {
                for user in rows {
                    self.users
                        .entry(user.user_id)
                        .and_modify(|existing| existing.level = user.level.clone())
                        .or_insert(user);
                }
            }
            StagedWrite::Songplays(rows) => self.songplays.extend(rows),
        }
    }
}

impl StarSchemaStore for MemoryStore {
    async fn insert_song(&mut self, song: &Song) -> Result<()> {
        self.statements.push("song");
        self.staged.push(StagedWrite::Song(song.clone()));
        Ok(())
    }

    async fn insert_artist(&mut self, artist: &Artist) -> Result<()> {
        self.statements.push("artist");
        self.staged.push(StagedWrite::Artist(artist.clone()));
        Ok(())
    }

    async fn insert_times(&mut self, rows: &[TimeRow]) -> Result<()> {
        self.statements.push("times");
        self.staged.push(StagedWrite::Times(rows.to_vec()));
        Ok(())
    }

    async fn insert_users(&mut self, rows: &[User]) -> Result<()> {
        self.statements.push("users");
        self.staged.push(StagedWrite::Users(rows.to_vec()));
        Ok(())
    }

    async fn insert_songplays(&mut self, rows: &[SongPlay]) -> Result<()> {
        self.statements.push("songplays");
        self.staged.push(StagedWrite::Songplays(rows.to_vec()));
        Ok(())
    }

    /// Sees committed dimension rows only
    async fn find_song(&mut self, title: &str, artist_name: &str, duration: f64) -> Result<Option<SongMatch>> {
        self.statements.push("find_song");
        if self.fail_lookup_of.as_deref() == Some(title) {
            anyhow::bail!("lookup of {:?} failed", title);
        }

        let found = self.songs.values().find_map(|song| {
            let artist = self.artists.get(&song.artist_id)?;
            (song.title == title && artist.name == artist_name && song.duration == duration)
                .then(|| SongMatch { song_id: song.song_id.clone(), artist_id: artist.artist_id.clone() })
        });
        Ok(found)
    }

    async fn commit(&mut self) -> Result<()> {
        for write in std::mem::take(&mut self.staged) {
            self.apply(write);
        }
        self.commits += 1;
        Ok(())
    }
}
