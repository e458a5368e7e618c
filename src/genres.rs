//! Genres are identified case-insensitively through `lower_name`; the empty name is a
//! valid pseudo-genre meaning "scanned but untagged". Listings carry usage counts
//! aggregated from the user's tracks.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::entity::{entity_accessors, EntityModel};

#[derive(Debug, Clone, Default)]
pub struct Genre {
    pub id: i64,
    pub user_id: String,
    pub name: Option<String>,
    pub created: String,
    pub updated: String,
    // aggregated in every select
    pub track_count: i64,
    pub album_count: i64,
    pub artist_count: i64,
}

impl EntityModel for Genre {
    const TABLE: &'static str = "genres";
    const NAME_COLUMN: &'static str = "name";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["lower_name"];

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<Genre> {
        Ok(Genre {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
            track_count: row.get("track_count")?,
            album_count: row.get("album_count")?,
            artist_count: row.get("artist_count")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("name", Value::from(self.name.clone())),
            ("lower_name", Value::from(self.name.as_ref().map(|n| n.to_lowercase()))),
        ]
    }

    fn select_sql(condition: &str, extension: &str) -> String {
        format!(
            "SELECT genres.*, COUNT(t.id) AS track_count, \
             COUNT(DISTINCT t.album_id) AS album_count, \
             COUNT(DISTINCT t.artist_id) AS artist_count \
             FROM genres \
             LEFT JOIN tracks t ON t.genre_id = genres.id AND t.user_id = genres.user_id \
             WHERE {condition} GROUP BY genres.id {extension}"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SortBy;
    use crate::mapper::{Mapper, Paging, TimeRange};
    use crate::testing;

    #[test]
    fn test_listing_carries_usage_counts() {
        let conn = testing::seeded_db();
        let mapper: Mapper<Genre> = Mapper::new(&conn);

        let genres = mapper
            .find_all("alice", SortBy::Name, Paging::NONE, &TimeRange::NONE, &TimeRange::NONE)
            .unwrap();
        assert_eq!(genres.len(), 2);

        let rock = genres.iter().find(|g| g.name.as_deref() == Some("Rock")).unwrap();
        assert_eq!(rock.track_count, 1);
        assert_eq!(rock.album_count, 1);
        assert_eq!(rock.artist_count, 1);

        let untagged = genres.iter().find(|g| g.name.as_deref() == Some("")).unwrap();
        assert_eq!(untagged.track_count, 1);
    }

    #[test]
    fn test_counts_exclude_other_users() {
        let conn = testing::seeded_db();
        let mapper: Mapper<Genre> = Mapper::new(&conn);
        let genres = mapper
            .find_all("bob", SortBy::Name, Paging::NONE, &TimeRange::NONE, &TimeRange::NONE)
            .unwrap();
        assert_eq!(genres.len(), 1);
        assert_eq!(genres[0].name.as_deref(), Some("Pop"));
        assert_eq!(genres[0].track_count, 1);
    }
}
