/// Data Models Module
///
/// Source record shapes (song metadata files, activity log events) and the
/// rows produced for the star schema: `songs`, `artists`, `time`, `users`
/// dimensions and the `songplays` fact table.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// One song-metadata record, as found in `song_data/**/*.json`
///
/// Every field must be present. The artist location and coordinates are
/// frequently `null` in the dataset, which is accepted.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    #[serde(deserialize_with = "Option::deserialize")]
    pub artist_location: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub artist_latitude: Option<f64>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub artist_longitude: Option<f64>,
}

/// One user-activity event from `log_data/**/*.json`
///
/// Only events whose `page` is `NextSong` are decoded into this shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Epoch milliseconds
    pub ts: i64,
    #[serde(deserialize_with = "user_id_from_json")]
    pub user_id: i64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub first_name: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub last_name: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub gender: Option<String>,
    pub level: String,
    pub song: String,
    pub artist: String,
    pub length: f64,
    #[serde(deserialize_with = "Option::deserialize")]
    pub location: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub user_agent: Option<String>,
}

/// The logs carry `userId` as a string (`"39"`); older exports use a number.
fn user_id_from_json<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Number(i64),
        Text(String),
    }

    match RawUserId::deserialize(deserializer)? {
        RawUserId::Number(id) => Ok(id),
        RawUserId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid userId {:?}", text))),
    }
}

/// Row for the `songs` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// Row for the `artists` dimension
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Row for the `time` dimension, derived entirely from `start_time`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRow {
    pub start_time: DateTime<Utc>,
    pub hour: i32,
    pub day: i32,
    /// ISO-8601 week number
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// Monday = 0 .. Sunday = 6
    pub weekday: i32,
}

/// Row for the `users` dimension (upserted, latest `level` wins)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// Row for the `songplays` fact table
#[derive(Debug, Clone, PartialEq)]
pub struct SongPlay {
    pub start_time: DateTime<Utc>,
    pub user_id: i64,
    pub level: String,
    /// `None` when the played song is not in the `songs`/`artists` dimensions
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of the song/artist lookup used to resolve a songplay
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_record_accepts_null_artist_fields() {
        let record: SongRecord = serde_json::from_str(
            r#"{"num_songs":1,"artist_id":"ARD7TVE1187B99BFB1","artist_latitude":null,"artist_longitude":null,
                "artist_location":"California - LA","artist_name":"Casual","song_id":"SOMZWCG12A8C13C480",
                "title":"I Didn't Mean To","duration":218.93179,"year":0}"#,
        )
        .unwrap();

        assert_eq!(record.song_id, "SOMZWCG12A8C13C480");
        assert_eq!(record.artist_latitude, None);
        assert_eq!(record.artist_location.as_deref(), Some("California - LA"));
        assert_eq!(record.year, 0);
    }

    #[test]
    fn test_song_record_requires_nullable_fields_to_be_present() {
        let result = serde_json::from_str::<SongRecord>(
            r#"{"song_id":"S1","title":"T","artist_id":"A1","year":2000,"duration":180.0,
                "artist_name":"AR","artist_location":"LOC","artist_latitude":1.0}"#,
        );

        let err = result.unwrap_err().to_string();
        assert!(err.contains("artist_longitude"), "unexpected error: {}", err);
    }

    #[test]
    fn test_log_event_user_id_as_string_or_number() {
        let base = r#""ts":1541440043796,"page":"NextSong","firstName":"Kaylee","lastName":"Summers",
            "gender":"F","level":"free","song":"T","artist":"AR","length":180.0,
            "location":"Phoenix-Mesa-Scottsdale, AZ","userAgent":"Mozilla/5.0""#;

        let text: LogEvent = serde_json::from_str(&format!(r#"{{"userId":"8",{}}}"#, base)).unwrap();
        let number: LogEvent = serde_json::from_str(&format!(r#"{{"userId":8,{}}}"#, base)).unwrap();

        assert_eq!(text.user_id, 8);
        assert_eq!(number.user_id, 8);
        assert_eq!(text.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_log_event_rejects_blank_user_id() {
        let result = serde_json::from_str::<LogEvent>(
            r#"{"ts":1,"page":"NextSong","userId":"","firstName":null,"lastName":null,"gender":null,
                "level":"free","song":"T","artist":"AR","length":1.0,"location":null,"userAgent":null}"#,
        );

        assert!(result.is_err());
    }
}
