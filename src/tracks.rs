//! Tracks and their rule vocabulary, the richest of all kinds: a track row joins its
//! file, album, artist and genre so searches and listings can match the denormalized
//! names without extra queries.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::common::{sql_now, SortBy};
use crate::dialect::Dialect;
use crate::entity::{base_rule, default_sorting, entity_accessors, EntityModel, Rateable, Starrable};
use crate::errors::{AriaError, Result};
use crate::mapper::{Mapper, Paging};
use crate::rules::{RuleOperator, SqlCondition};

#[derive(Debug, Clone, Default)]
pub struct Track {
    pub id: i64,
    pub user_id: String,
    pub title: Option<String>,
    pub number: Option<i64>,
    pub disk: Option<i64>,
    pub year: Option<i64>,
    pub artist_id: i64,
    pub album_id: i64,
    pub length: Option<i64>,
    pub file_id: i64,
    pub bitrate: Option<i64>,
    pub mbid: Option<String>,
    pub starred: Option<String>,
    pub rating: i64,
    pub genre_id: Option<i64>,
    pub play_count: i64,
    pub last_played: Option<String>,
    pub created: String,
    pub updated: String,
    // denormalized from the joined tables
    pub filename: Option<String>,
    pub size: Option<i64>,
    pub album_name: Option<String>,
    pub artist_name: Option<String>,
    pub genre_name: Option<String>,
}

impl EntityModel for Track {
    const TABLE: &'static str = "tracks";
    const NAME_COLUMN: &'static str = "title";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["file_id"];
    const PARENT_COLUMN: Option<&'static str> = Some("artist_id");
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Track> {
        Ok(Track {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            title: row.get("title")?,
            number: row.get("number")?,
            disk: row.get("disk")?,
            year: row.get("year")?,
            artist_id: row.get("artist_id")?,
            album_id: row.get("album_id")?,
            length: row.get("length")?,
            file_id: row.get("file_id")?,
            bitrate: row.get("bitrate")?,
            mbid: row.get("mbid")?,
            starred: row.get("starred")?,
            rating: row.get("rating")?,
            genre_id: row.get("genre_id")?,
            play_count: row.get("play_count")?,
            last_played: row.get("last_played")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
            filename: row.get("filename")?,
            size: row.get("size")?,
            album_name: row.get("album_name")?,
            artist_name: row.get("artist_name")?,
            genre_name: row.get("genre_name")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("title", Value::from(self.title.clone())),
            ("number", Value::from(self.number)),
            ("disk", Value::from(self.disk)),
            ("year", Value::from(self.year)),
            ("artist_id", Value::from(self.artist_id)),
            ("album_id", Value::from(self.album_id)),
            ("length", Value::from(self.length)),
            ("file_id", Value::from(self.file_id)),
            ("bitrate", Value::from(self.bitrate)),
            ("mbid", Value::from(self.mbid.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
            ("genre_id", Value::from(self.genre_id)),
            ("play_count", Value::from(self.play_count)),
            ("last_played", Value::from(self.last_played.clone())),
        ]
    }

    fn select_sql(condition: &str, extension: &str) -> String {
        format!(
            "SELECT tracks.*, files.name AS filename, files.size AS size, \
             albums.name AS album_name, artists.name AS artist_name, \
             genres.name AS genre_name \
             FROM tracks \
             INNER JOIN files ON tracks.file_id = files.id \
             INNER JOIN albums ON tracks.album_id = albums.id \
             INNER JOIN artists ON tracks.artist_id = artists.id \
             LEFT JOIN genres ON tracks.genre_id = genres.id \
             WHERE {condition} {extension}"
        )
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "song" => Ok(op.column("tracks.title")),
            "album" => Ok(op.column("albums.name")),
            "artist" => Ok(op.column("artists.name")),
            "album_artist" => Ok(op.with_param(
                format!(
                    "tracks.album_id IN (SELECT id FROM albums WHERE album_artist_id IN \
                     (SELECT id FROM artists WHERE {}))",
                    op.cmp("name")
                ),
            )),
            "time" => Ok(op.column("tracks.length")),
            "year" => Ok(op.column("tracks.year")),
            "bitrate" => Ok(op.column("tracks.bitrate")),
            "played_times" => Ok(op.column("tracks.play_count")),
            "last_play" => Ok(op.column("tracks.last_played")),
            "played" | "myplayed" => Ok(op.column("tracks.last_played")),
            "myplayedalbum" => Ok(played_parent_rule(op, "album_id")),
            "myplayedartist" => Ok(played_parent_rule(op, "artist_id")),
            "genre" => Ok(op.column("genres.name")),
            "no_genre" => Ok(no_genre_rule(rule, op, "genres.name")?),
            "playlist" => Ok(playlist_rule(op, dialect, "tracks.id")),
            "playlist_name" => Ok(playlist_name_rule(op, dialect, "tracks.id")),
            "file" => Ok(op.column("files.name")),
            "recent_played" => recent_played_rule(rule, op),
            "mbid" | "mbid_song" => Ok(op.column("tracks.mbid")),
            "mbid_album" => Ok(op.column("albums.mbid")),
            "mbid_artist" => Ok(op.column("artists.mbid")),
            "songrating" => Ok(op.column("tracks.rating")),
            "albumrating" => Ok(op.column("albums.rating")),
            "artistrating" => Ok(op.column("artists.rating")),
            "favorite_album" => Ok(op.with_param(format!(
                "({} AND albums.starred IS NOT NULL)",
                op.cmp("albums.name")
            ))),
            "favorite_artist" => Ok(op.with_param(format!(
                "({} AND artists.starred IS NOT NULL)",
                op.cmp("artists.name")
            ))),
            "anywhere" => {
                let parts = [
                    op.cmp("tracks.title"),
                    op.cmp("artists.name"),
                    op.cmp("albums.name"),
                    op.cmp("genres.name"),
                ];
                let params: Vec<Value> =
                    std::iter::repeat(op.param()).take(4).flatten().collect();
                Ok(SqlCondition::with(format!("({})", parts.join(" OR ")), params))
            }
            _ => base_rule::<Track>(rule, op),
        }
    }

    fn sorting_clause(sort: SortBy, invert: bool) -> Option<String> {
        let (asc, desc) = if invert { ("DESC", "ASC") } else { ("ASC", "DESC") };
        match sort {
            SortBy::Parent => Some(format!(
                "ORDER BY LOWER(artists.name) {asc}, LOWER(albums.name) {asc}, \
                 tracks.disk {asc}, tracks.number {asc}"
            )),
            SortBy::PlayCount => Some(format!("ORDER BY tracks.play_count {desc}")),
            SortBy::LastPlayed => Some(format!("ORDER BY tracks.last_played {desc}")),
            _ => default_sorting::<Track>(sort, invert),
        }
    }
}

impl Starrable for Track {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for Track {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

/// "Did I ever play anything under this parent" check, compiled as a HAVING aggregate
/// over the user's own tracks.
fn played_parent_rule(op: &RuleOperator, parent_col: &str) -> SqlCondition {
    let cond = op.cmp("MAX(last_played)");
    let sql = format!(
        "tracks.{parent_col} IN (SELECT {parent_col} FROM tracks WHERE user_id = ? \
         GROUP BY {parent_col} HAVING {cond})"
    );
    SqlCondition::with(sql, vec![op.user_param()])
}

/// Tracks whose genre is absent or the empty pseudo-genre. The `false` polarity flips
/// to tracks with a real genre.
pub(crate) fn no_genre_rule(rule: &str, op: &RuleOperator, name_expr: &str) -> Result<SqlCondition> {
    match op.truth() {
        Some(true) => Ok(SqlCondition::new(format!(
            "({name_expr} IS NULL OR {name_expr} = '')"
        ))),
        Some(false) => Ok(SqlCondition::new(format!(
            "({name_expr} IS NOT NULL AND {name_expr} != '')"
        ))),
        None => Err(AriaError::unsupported_rule(rule)),
    }
}

/// Membership of a track id in a playlist's encoded track list (`|1|2|3|`). The
/// operator contributes the bare or NOT prefix on the EXISTS.
pub(crate) fn playlist_rule(op: &RuleOperator, dialect: &dyn Dialect, id_expr: &str) -> SqlCondition {
    let needle = dialect.concat(&["'%|'", id_expr, "'|%'"]);
    let sql = format!(
        "{} EXISTS (SELECT 1 FROM playlists WHERE id = ? AND user_id = ? \
         AND track_ids LIKE {needle})",
        op.sql_op
    );
    let mut params: Vec<Value> = op.param().into_iter().collect();
    params.push(op.user_param());
    SqlCondition::with(sql, params)
}

pub(crate) fn playlist_name_rule(
    op: &RuleOperator,
    dialect: &dyn Dialect,
    id_expr: &str,
) -> SqlCondition {
    let needle = dialect.concat(&["'%|'", id_expr, "'|%'"]);
    let cond = op.cmp("name");
    let sql = format!(
        "EXISTS (SELECT 1 FROM playlists WHERE user_id = ? AND {cond} \
         AND track_ids LIKE {needle})"
    );
    let mut params = vec![op.user_param()];
    params.extend(op.param());
    SqlCondition::with(sql, params)
}

fn recent_played_rule(rule: &str, op: &RuleOperator) -> Result<SqlCondition> {
    let n = op.limit_count(rule)?;
    let sql = format!(
        "tracks.id IN (SELECT * FROM (SELECT id FROM tracks WHERE user_id = ? \
         AND last_played IS NOT NULL ORDER BY last_played DESC LIMIT {n}) recents)"
    );
    Ok(SqlCondition::with(sql, op.param().into_iter().collect()))
}

impl<'c> Mapper<'c, Track> {
    pub fn find_all_by_artist(&self, artist_id: i64, user_id: &str, paging: Paging) -> Result<Vec<Track>> {
        self.find_all_by_parent("tracks.artist_id", artist_id, user_id, paging)
    }

    pub fn find_all_by_album(&self, album_id: i64, user_id: &str, paging: Paging) -> Result<Vec<Track>> {
        self.find_all_by_parent("tracks.album_id", album_id, user_id, paging)
    }

    pub fn find_all_by_genre(&self, genre_id: i64, user_id: &str, paging: Paging) -> Result<Vec<Track>> {
        self.find_all_by_parent("tracks.genre_id", genre_id, user_id, paging)
    }

    fn find_all_by_parent(
        &self,
        column: &str,
        parent_id: i64,
        user_id: &str,
        paging: Paging,
    ) -> Result<Vec<Track>> {
        let order = Track::sorting_clause(SortBy::Parent, false).unwrap_or_default();
        let sql = self.select_user_entities(
            &format!("{column} = ?"),
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(
            &sql,
            vec![Value::from(user_id.to_string()), Value::Integer(parent_id)],
        )
    }

    /// The user's most played tracks.
    pub fn find_frequent_play(&self, user_id: &str, paging: Paging) -> Result<Vec<Track>> {
        let order = Track::sorting_clause(SortBy::PlayCount, false).unwrap_or_default();
        let sql = self.select_user_entities(
            "tracks.play_count > 0",
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(&sql, vec![Value::from(user_id.to_string())])
    }

    /// The user's most recently played tracks.
    pub fn find_recent_play(&self, user_id: &str, paging: Paging) -> Result<Vec<Track>> {
        let order = Track::sorting_clause(SortBy::LastPlayed, false).unwrap_or_default();
        let sql = self.select_user_entities(
            "tracks.last_played IS NOT NULL",
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(&sql, vec![Value::from(user_id.to_string())])
    }

    /// Bump the play count and move the last-played timestamp forward. The timestamp
    /// defaults to now; scrobbling front-ends may pass the client's time instead.
    pub fn record_track_played(
        &self,
        id: i64,
        user_id: &str,
        time_of_play: Option<String>,
    ) -> Result<()> {
        let when = time_of_play.unwrap_or_else(sql_now);
        let affected = self.connection().execute(
            "UPDATE tracks SET play_count = play_count + 1, last_played = ?2 \
             WHERE id = ?1 AND user_id = ?3 \
             AND (last_played IS NULL OR last_played < ?2)",
            rusqlite::params![id, when, user_id],
        )?;
        if affected == 0 {
            // Either the track does not exist, or the play is older than what we have.
            let sql = "UPDATE tracks SET play_count = play_count + 1 \
                       WHERE id = ?1 AND user_id = ?2";
            let affected = self.connection().execute(sql, rusqlite::params![id, user_id])?;
            if affected == 0 {
                return Err(AriaError::NotFound);
            }
        }
        Ok(())
    }
}
