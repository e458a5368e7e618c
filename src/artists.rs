//! Artists have no joined columns of their own; their rule vocabulary reaches into
//! albums and tracks through subqueries keyed on the artist id.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::common::SortBy;
use crate::dialect::Dialect;
use crate::entity::{base_rule, entity_accessors, EntityModel, Rateable, Starrable};
use crate::errors::Result;
use crate::mapper::{Mapper, Paging};
use crate::rules::{RuleOperator, SqlCondition};
use crate::tracks::no_genre_rule;

#[derive(Debug, Clone, Default)]
pub struct Artist {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub cover_file_id: Option<i64>,
    pub mbid: Option<String>,
    pub hash: String,
    pub starred: Option<String>,
    pub rating: i64,
    pub created: String,
    pub updated: String,
}

impl EntityModel for Artist {
    const TABLE: &'static str = "artists";
    const NAME_COLUMN: &'static str = "name";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["hash"];
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Artist> {
        Ok(Artist {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            cover_file_id: row.get("cover_file_id")?,
            mbid: row.get("mbid")?,
            hash: row.get("hash")?,
            starred: row.get("starred")?,
            rating: row.get("rating")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("name", Value::from(self.name.clone())),
            ("cover_file_id", Value::from(self.cover_file_id)),
            ("mbid", Value::from(self.mbid.clone())),
            ("hash", Value::from(self.hash.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
        ]
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "artist" => Ok(op.column("artists.name")),
            "album" => Ok(op.with_param(format!(
                "artists.id IN (SELECT album_artist_id FROM albums WHERE {})",
                op.cmp("name")
            ))),
            "song" => Ok(op.with_param(format!(
                "artists.id IN (SELECT artist_id FROM tracks WHERE {})",
                op.cmp("title")
            ))),
            "album_count" => Ok(aggregate(
                op,
                "albums",
                "album_artist_id",
                &op.cmp("COUNT(id)"),
            )),
            "song_count" => Ok(aggregate(op, "tracks", "artist_id", &op.cmp("COUNT(id)"))),
            "time" => Ok(aggregate(op, "tracks", "artist_id", &op.cmp("SUM(length)"))),
            "played_times" => {
                Ok(aggregate(op, "tracks", "artist_id", &op.cmp("SUM(play_count)")))
            }
            "last_play" => Ok(aggregate(op, "tracks", "artist_id", &op.cmp("MAX(last_played)"))),
            "played" | "myplayed" | "myplayedartist" => {
                Ok(aggregate(op, "tracks", "artist_id", &op.cmp("MAX(last_played)")))
            }
            "genre" | "song_genre" | "artist_genre" => Ok(op.with_param(format!(
                "artists.id IN (SELECT t.artist_id FROM tracks t \
                 INNER JOIN genres g ON t.genre_id = g.id WHERE {})",
                op.cmp("g.name")
            ))),
            "no_genre" => {
                let inner = no_genre_rule(rule, op, "g.name")?;
                Ok(SqlCondition::new(format!(
                    "artists.id IN (SELECT t.artist_id FROM tracks t \
                     LEFT JOIN genres g ON t.genre_id = g.id WHERE {})",
                    inner.sql
                )))
            }
            // quantified per track, like the album rule: `ne` matches artists with
            // some track outside the playlist
            "playlist" => {
                let needle = dialect.concat(&["'%|'", "t.id", "'|%'"]);
                let sql = format!(
                    "artists.id IN (SELECT t.artist_id FROM tracks t WHERE {} EXISTS \
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
                    "artists.id IN (SELECT t.artist_id FROM tracks t WHERE EXISTS \
                     (SELECT 1 FROM playlists p WHERE p.user_id = ? AND {cond} \
                     AND p.track_ids LIKE {needle}))"
                );
                let mut params = vec![op.user_param()];
                params.extend(op.param());
                Ok(SqlCondition::with(sql, params))
            }
            "recent_played" => {
                let n = op.limit_count(rule)?;
                let sql = format!(
                    "artists.id IN (SELECT * FROM (SELECT artist_id FROM tracks \
                     WHERE user_id = ? AND last_played IS NOT NULL GROUP BY artist_id \
                     ORDER BY MAX(last_played) DESC LIMIT {n}) recents)"
                );
                Ok(SqlCondition::with(sql, op.param().into_iter().collect()))
            }
            "mbid" | "mbid_artist" => Ok(op.column("artists.mbid")),
            "artistrating" => Ok(op.column("artists.rating")),
            "has_image" => Ok(op.column("artists.cover_file_id")),
            _ => base_rule::<Artist>(rule, op),
        }
    }
}

impl Starrable for Artist {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for Artist {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

/// Per-artist aggregate over a child table, compiled as a HAVING subquery.
fn aggregate(op: &RuleOperator, table: &str, parent_col: &str, having: &str) -> SqlCondition {
    let sql = format!(
        "artists.id IN (SELECT * FROM (SELECT {parent_col} FROM {table} WHERE user_id = ? \
         GROUP BY {parent_col} HAVING {having}) agg)"
    );
    let mut params = vec![op.user_param()];
    params.extend(op.param());
    SqlCondition::with(sql, params)
}

impl<'c> Mapper<'c, Artist> {
    /// Artists appearing as the album artist of at least one album. Performing
    /// artists with no albums of their own are excluded.
    pub fn find_all_having_albums(&self, user_id: &str, paging: Paging) -> Result<Vec<Artist>> {
        let order = Artist::sorting_clause(SortBy::Name, false).unwrap_or_default();
        let sql = self.select_user_entities(
            "artists.id IN (SELECT album_artist_id FROM albums WHERE user_id = ?)",
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(
            &sql,
            vec![
                Value::from(user_id.to_string()),
                Value::from(user_id.to_string()),
            ],
        )
    }
}
