//! Albums join their album artist for the denormalized artist name. Most of the
//! album rule vocabulary aggregates over the album's tracks; those rules compile to
//! `id IN (...)` subqueries with the condition in a HAVING clause, wrapped in one
//! extra SELECT shell because MySQL rejects certain subquery shapes inside IN.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::common::SortBy;
use crate::dialect::Dialect;
use crate::entity::{base_rule, default_sorting, entity_accessors, EntityModel, Rateable, Starrable};
use crate::errors::Result;
use crate::mapper::{Mapper, Paging};
use crate::rules::{RuleOperator, SqlCondition};
use crate::tracks::no_genre_rule;

#[derive(Debug, Clone, Default)]
pub struct Album {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub mbid: Option<String>,
    pub cover_file_id: Option<i64>,
    pub album_artist_id: i64,
    pub hash: String,
    pub starred: Option<String>,
    pub rating: i64,
    pub created: String,
    pub updated: String,
    pub album_artist_name: Option<String>,
}

impl EntityModel for Album {
    const TABLE: &'static str = "albums";
    const NAME_COLUMN: &'static str = "name";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["hash"];
    const PARENT_COLUMN: Option<&'static str> = Some("album_artist_id");
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Album> {
        Ok(Album {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            mbid: row.get("mbid")?,
            cover_file_id: row.get("cover_file_id")?,
            album_artist_id: row.get("album_artist_id")?,
            hash: row.get("hash")?,
            starred: row.get("starred")?,
            rating: row.get("rating")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
            album_artist_name: row.get("album_artist_name")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("name", Value::from(self.name.clone())),
            ("mbid", Value::from(self.mbid.clone())),
            ("cover_file_id", Value::from(self.cover_file_id)),
            ("album_artist_id", Value::from(self.album_artist_id)),
            ("hash", Value::from(self.hash.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
        ]
    }

    fn select_sql(condition: &str, extension: &str) -> String {
        format!(
            "SELECT albums.*, artists.name AS album_artist_name \
             FROM albums \
             INNER JOIN artists ON albums.album_artist_id = artists.id \
             WHERE {condition} {extension}"
        )
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "album" => Ok(op.column("albums.name")),
            "album_artist" | "artist" => Ok(op.column("artists.name")),
            "song_artist" => Ok(op.with_param(format!(
                "albums.id IN (SELECT album_id FROM tracks WHERE artist_id IN \
                 (SELECT id FROM artists WHERE {}))",
                op.cmp("name")
            ))),
            "song" => Ok(op.with_param(format!(
                "albums.id IN (SELECT album_id FROM tracks WHERE {})",
                op.cmp("title")
            ))),
            // an album's year is its earliest track year; reissue bonus tracks
            // must not shift it
            "original_year" | "year" => Ok(track_aggregate(op, &op.cmp("MIN(year)"))),
            "songrating" => Ok(op.with_param(format!(
                "albums.id IN (SELECT album_id FROM tracks WHERE {})",
                op.cmp("rating")
            ))),
            "artistrating" => Ok(op.column("artists.rating")),
            "played_times" => Ok(track_aggregate(op, &op.cmp("SUM(play_count)"))),
            "last_play" => Ok(track_aggregate(op, &op.cmp("MAX(last_played)"))),
            "played" | "myplayed" | "myplayedalbum" => {
                Ok(track_aggregate(op, &op.cmp("MAX(last_played)")))
            }
            "myplayedartist" => {
                let cond = op.cmp("MAX(last_played)");
                let sql = format!(
                    "albums.album_artist_id IN (SELECT * FROM (SELECT artist_id FROM tracks \
                     WHERE user_id = ? GROUP BY artist_id HAVING {cond}) agg)"
                );
                let mut params = vec![op.user_param()];
                params.extend(op.param());
                Ok(SqlCondition::with(sql, params))
            }
            "song_count" => Ok(track_aggregate(op, &op.cmp("COUNT(id)"))),
            "disk_count" => Ok(track_aggregate(op, &op.cmp("MAX(disk)"))),
            "time" => Ok(track_aggregate(op, &op.cmp("SUM(length)"))),
            "album_genre" | "genre" => {
                let agg = dialect.group_concat("g.name");
                let cond = op.cmp(&agg);
                let sql = format!(
                    "albums.id IN (SELECT * FROM (SELECT t.album_id FROM tracks t \
                     LEFT JOIN genres g ON t.genre_id = g.id WHERE t.user_id = ? \
                     GROUP BY t.album_id HAVING {cond}) agg)"
                );
                let mut params = vec![op.user_param()];
                params.extend(op.param());
                Ok(SqlCondition::with(sql, params))
            }
            "song_genre" => Ok(op.with_param(format!(
                "albums.id IN (SELECT t.album_id FROM tracks t \
                 INNER JOIN genres g ON t.genre_id = g.id WHERE {})",
                op.cmp("g.name")
            ))),
            "no_genre" => {
                let inner = no_genre_rule(rule, op, "g.name")?;
                Ok(SqlCondition::new(format!(
                    "albums.id IN (SELECT t.album_id FROM tracks t \
                     LEFT JOIN genres g ON t.genre_id = g.id WHERE {})",
                    inner.sql
                )))
            }
            // quantified per track: `ne` matches albums with some track outside
            // the playlist, not just albums with no track in it
            "playlist" => {
                let needle = dialect.concat(&["'%|'", "t.id", "'|%'"]);
                let sql = format!(
                    "albums.id IN (SELECT t.album_id FROM tracks t WHERE {} EXISTS \
                     (SELECT 1 FROM playlists p WHERE p.id = ? AND p.user_id = ? \
                     AND p.track_ids LIKE {needle}))",
                    op.sql_op
                );
                let mut params: Vec<Value> = op.param().into_iter().collect();
                params.push(op.user_param());
                Ok(SqlCondition::with(sql, params))
            }
            "playlist_name" => {
                let needle = dialect.concat(&["'%|'", "t.id", "'|%'"]);
                let cond = op.cmp("p.name");
                let sql = format!(
                    "albums.id IN (SELECT t.album_id FROM tracks t WHERE EXISTS \
                     (SELECT 1 FROM playlists p WHERE p.user_id = ? AND {cond} \
                     AND p.track_ids LIKE {needle}))"
                );
                let mut params = vec![op.user_param()];
                params.extend(op.param());
                Ok(SqlCondition::with(sql, params))
            }
            "file" => Ok(op.with_param(format!(
                "albums.id IN (SELECT t.album_id FROM tracks t \
                 INNER JOIN files f ON t.file_id = f.id WHERE {})",
                op.cmp("f.name")
            ))),
            "recent_played" => {
                let n = op.limit_count(rule)?;
                let sql = format!(
                    "albums.id IN (SELECT * FROM (SELECT album_id FROM tracks \
                     WHERE user_id = ? GROUP BY album_id \
                     ORDER BY MAX(last_played) DESC LIMIT {n}) recents)"
                );
                Ok(SqlCondition::with(sql, op.param().into_iter().collect()))
            }
            "mbid" | "mbid_album" => Ok(op.column("albums.mbid")),
            "mbid_song" => Ok(op.with_param(format!(
                "albums.id IN (SELECT album_id FROM tracks WHERE {})",
                op.cmp("mbid")
            ))),
            "mbid_artist" => Ok(op.column("artists.mbid")),
            "has_image" => Ok(op.column("albums.cover_file_id")),
            _ => base_rule::<Album>(rule, op),
        }
    }

    fn sorting_clause(sort: SortBy, invert: bool) -> Option<String> {
        let asc = if invert { "DESC" } else { "ASC" };
        match sort {
            SortBy::Parent => Some(format!(
                "ORDER BY LOWER(artists.name) {asc}, LOWER(albums.name) {asc}"
            )),
            _ => default_sorting::<Album>(sort, invert),
        }
    }
}

impl Starrable for Album {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for Album {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

/// Compile a per-album aggregate condition over the user's tracks.
fn track_aggregate(op: &RuleOperator, having: &str) -> SqlCondition {
    let sql = format!(
        "albums.id IN (SELECT * FROM (SELECT album_id FROM tracks WHERE user_id = ? \
         GROUP BY album_id HAVING {having}) agg)"
    );
    let mut params = vec![op.user_param()];
    params.extend(op.param());
    SqlCondition::with(sql, params)
}

impl<'c> Mapper<'c, Album> {
    /// Albums whose album artist is the given artist.
    pub fn find_all_by_artist(&self, artist_id: i64, user_id: &str, paging: Paging) -> Result<Vec<Album>> {
        let order = Album::sorting_clause(SortBy::Name, false).unwrap_or_default();
        let sql = self.select_user_entities(
            "albums.album_artist_id = ?",
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(
            &sql,
            vec![Value::from(user_id.to_string()), Value::Integer(artist_id)],
        )
    }
}
