//! Internet radio stations: plain per-user rows with no relations to the rest of
//! the library.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::entity::{entity_accessors, EntityModel};

#[derive(Debug, Clone, Default)]
pub struct RadioStation {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub stream_url: String,
    pub home_url: Option<String>,
    pub created: String,
    pub updated: String,
}

impl EntityModel for RadioStation {
    const TABLE: &'static str = "radio_stations";
    const NAME_COLUMN: &'static str = "name";

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<RadioStation> {
        Ok(RadioStation {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            stream_url: row.get("stream_url")?,
            home_url: row.get("home_url")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("name", Value::from(self.name.clone())),
            ("stream_url", Value::from(self.stream_url.clone())),
            ("home_url", Value::from(self.home_url.clone())),
        ]
    }
}
