/// Transform Module
///
/// Pure mapping from source records to star-schema rows.
use crate::models::{Artist, LogEvent, Song, SongMatch, SongPlay, SongRecord, TimeRow, User};
use chrono::{DateTime, Datelike, Timelike, Utc};

/// Split a song-metadata record into its `songs` and `artists` rows
///
/// Values pass through unchanged.
pub fn song_rows(record: &SongRecord) -> (Song, Artist) {
    let song = Song {
        song_id: record.song_id.clone(),
        title: record.title.clone(),
        artist_id: record.artist_id.clone(),
        year: record.year,
        duration: record.duration,
    };

    let artist = Artist {
        artist_id: record.artist_id.clone(),
        name: record.artist_name.clone(),
        location: record.artist_location.clone(),
        latitude: record.artist_latitude,
        longitude: record.artist_longitude,
    };

    (song, artist)
}

/// Convert an epoch-milliseconds timestamp to UTC
///
/// Returns `None` when the value is outside chrono's representable range.
pub fn event_time(ts_millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_millis)
}

/// Decompose a timestamp into its `time` dimension row
pub fn time_row(start_time: DateTime<Utc>) -> TimeRow {
    TimeRow {
        start_time,
        hour: start_time.hour() as i32,
        day: start_time.day() as i32,
        week: start_time.iso_week().week() as i32,
        month: start_time.month() as i32,
        year: start_time.year(),
        weekday: start_time.weekday().num_days_from_monday() as i32,
    }
}

pub fn user_row(event: &LogEvent) -> User {
    User {
        user_id: event.user_id,
        first_name: event.first_name.clone(),
        last_name: event.last_name.clone(),
        gender: event.gender.clone(),
        level: event.level.clone(),
    }
}

/// Build the fact row for a play; an unmatched song leaves both ids empty
pub fn songplay_row(event: &LogEvent, start_time: DateTime<Utc>, song: Option<SongMatch>) -> SongPlay {
    let (song_id, artist_id) = match song {
        Some(found) => (Some(found.song_id), Some(found.artist_id)),
        None => (None, None),
    };

    SongPlay {
        start_time,
        user_id: event.user_id,
        level: event.level.clone(),
        song_id,
        artist_id,
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    }
}
