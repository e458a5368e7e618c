//! Playlists store their track list as the original's delimited encoding
//! (`|1|2|3|`), which is what the `playlist`/`playlist_name` rules LIKE against.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::entity::{base_rule, entity_accessors, EntityModel, Rateable, Starrable};
use crate::errors::Result;
use crate::rules::{RuleOperator, SqlCondition};
use crate::dialect::Dialect;

#[derive(Debug, Clone, Default)]
pub struct Playlist {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub track_ids: String,
    pub comment: Option<String>,
    pub starred: Option<String>,
    pub rating: i64,
    pub created: String,
    pub updated: String,
}

impl Playlist {
    /// Decode the stored track list, preserving order and duplicates.
    pub fn track_id_list(&self) -> Vec<i64> {
        self.track_ids
            .split('|')
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse().ok())
            .collect()
    }

    pub fn set_track_id_list(&mut self, ids: &[i64]) {
        self.track_ids = encode_track_ids(ids);
    }

    pub fn track_count(&self) -> usize {
        self.track_id_list().len()
    }
}

pub fn encode_track_ids(ids: &[i64]) -> String {
    if ids.is_empty() {
        return String::new();
    }
    let inner: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
    format!("|{}|", inner.join("|"))
}

impl EntityModel for Playlist {
    const TABLE: &'static str = "playlists";
    const NAME_COLUMN: &'static str = "name";
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Playlist> {
        Ok(Playlist {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            track_ids: row.get("track_ids")?,
            comment: row.get("comment")?,
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
            ("track_ids", Value::from(self.track_ids.clone())),
            ("comment", Value::from(self.comment.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
        ]
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, _dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "playlist_name" => Ok(op.column("playlists.name")),
            _ => base_rule::<Playlist>(rule, op),
        }
    }
}

impl Starrable for Playlist {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for Playlist {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_id_round_trip() {
        let mut p = Playlist::default();
        p.set_track_id_list(&[3, 1, 3]);
        assert_eq!(p.track_ids, "|3|1|3|");
        assert_eq!(p.track_id_list(), vec![3, 1, 3]);
        assert_eq!(p.track_count(), 3);
    }

    #[test]
    fn test_empty_track_list() {
        let mut p = Playlist::default();
        p.set_track_id_list(&[]);
        assert_eq!(p.track_ids, "");
        assert!(p.track_id_list().is_empty());
    }
}
