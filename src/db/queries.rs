/// Statement templates for the star schema
///
/// Bulk inserts are split into a `*_INSERT` prefix, completed with
/// `QueryBuilder::push_values`, and an optional conflict clause.

pub const SONG_INSERT: &str = r#"
    INSERT INTO songs (song_id, title, artist_id, year, duration)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (song_id) DO NOTHING
"#;

pub const ARTIST_INSERT: &str = r#"
    INSERT INTO artists (artist_id, name, location, latitude, longitude)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (artist_id) DO NOTHING
"#;

pub const TIME_INSERT: &str = "INSERT INTO time (start_time, hour, day, week, month, year, weekday) ";

pub const TIME_ON_CONFLICT: &str = " ON CONFLICT (start_time) DO NOTHING";

/// Users are a slowly changing dimension: the latest subscription level wins.
pub const USER_UPSERT: &str = r#"
    INSERT INTO users (user_id, first_name, last_name, gender, level)
    VALUES ($1, $2, $3, $4, $5)
    ON CONFLICT (user_id)
    DO UPDATE SET level = EXCLUDED.level
"#;

pub const SONGPLAY_INSERT: &str =
    "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, location, user_agent) ";

/// Columns bound per songplay row; the widest bulk insert
pub const SONGPLAY_COLUMNS: usize = 7;

pub const SONG_SELECT: &str = r#"
    SELECT s.song_id, a.artist_id
    FROM songs s
    JOIN artists a ON s.artist_id = a.artist_id
    WHERE s.title = $1 AND a.name = $2 AND s.duration = $3
    LIMIT 1
"#;

/// Postgres accepts at most this many bind parameters per statement
pub const MAX_BIND_PARAMETERS: usize = 65_535;
