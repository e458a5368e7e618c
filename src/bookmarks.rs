//! Listening-position bookmarks. One bookmark per (user, entry type, entry id); the
//! free-form comment doubles as the entity name.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::entity::{entity_accessors, EntityModel};

pub const TYPE_TRACK: i64 = 1;
pub const TYPE_PODCAST_EPISODE: i64 = 2;

#[derive(Debug, Clone, Default)]
pub struct Bookmark {
    pub id: i64,
    pub user_id: String,
    pub entry_type: i64,
    pub entry_id: i64,
    pub position: i64,
    pub comment: Option<String>,
    pub created: String,
    pub updated: String,
}

impl EntityModel for Bookmark {
    const TABLE: &'static str = "bookmarks";
    const NAME_COLUMN: &'static str = "comment";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["type", "entry_id"];

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            entry_type: row.get("type")?,
            entry_id: row.get("entry_id")?,
            position: row.get("position")?,
            comment: row.get("comment")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("type", Value::from(self.entry_type)),
            ("entry_id", Value::from(self.entry_id)),
            ("position", Value::from(self.position)),
            ("comment", Value::from(self.comment.clone())),
        ]
    }
}
