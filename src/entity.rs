//! Model traits implemented by every library entity (tracks, albums, artists, genres,
//! playlists, podcast channels and episodes, bookmarks, radio stations).
//!
//! `EntityModel` carries the table metadata and row mapping consumed by the generic
//! `Mapper`; entities opt into starring and rating by additionally implementing the
//! `Starrable`/`Rateable` capability traits. Rule vocabulary not shared by all kinds is
//! provided by overriding `advanced_rule` and delegating unknown rules to `base_rule`.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::common::SortBy;
use crate::dialect::Dialect;
use crate::errors::{AriaError, Result};
use crate::rules::{RuleOperator, SqlCondition};

pub trait EntityModel: Sized {
    const TABLE: &'static str;
    /// Column holding the human-readable name; the target of `title` rules and the
    /// default sort key.
    const NAME_COLUMN: &'static str;
    /// Columns identifying a row uniquely within one user's library, used by upserts.
    const UNIQUE_COLUMNS: &'static [&'static str] = &[];
    /// Foreign key to the parent entity, when `SortBy::Parent` is meaningful.
    const PARENT_COLUMN: Option<&'static str> = None;
    const STARRED_COLUMN: Option<&'static str> = None;
    const RATING_COLUMN: Option<&'static str> = None;

    fn id(&self) -> i64;
    fn set_id(&mut self, id: i64);
    fn user_id(&self) -> &str;
    fn created(&self) -> &str;
    fn set_created(&mut self, created: String);
    fn updated(&self) -> &str;
    fn set_updated(&mut self, updated: String);

    fn from_row(row: &Row) -> rusqlite::Result<Self>;

    /// The entity's content columns and their current values, excluding `id`,
    /// `created` and `updated`. Order is fixed; inserts and updates are generated
    /// from this list.
    fn content_columns(&self) -> Vec<(&'static str, Value)>;

    /// SELECT statement template. Kinds that join auxiliary tables for denormalized
    /// columns override this; `condition` lands in the WHERE clause and `extension`
    /// carries ORDER BY / LIMIT.
    fn select_sql(condition: &str, extension: &str) -> String {
        let t = Self::TABLE;
        format!("SELECT {t}.* FROM {t} WHERE {condition} {extension}")
    }

    /// Compile one advanced-search rule. The default vocabulary is the base rule set;
    /// kinds extend it by overriding and falling back to `base_rule` for the rest.
    fn advanced_rule(
        rule: &str,
        op: &RuleOperator,
        dialect: &dyn Dialect,
    ) -> Result<SqlCondition> {
        let _ = dialect;
        base_rule::<Self>(rule, op)
    }

    /// ORDER BY clause for one sort order, or None when the kind does not support it.
    /// `invert` flips the natural direction of the chosen order.
    fn sorting_clause(sort: SortBy, invert: bool) -> Option<String> {
        default_sorting::<Self>(sort, invert)
    }
}

/// The shared sort orders; overrides of `sorting_clause` fall back here for the
/// orders they do not customize.
pub(crate) fn default_sorting<E: EntityModel>(sort: SortBy, invert: bool) -> Option<String> {
    let t = E::TABLE;
    let (asc, desc) = if invert { ("DESC", "ASC") } else { ("ASC", "DESC") };
    match sort {
        SortBy::Name => Some(format!("ORDER BY LOWER({t}.{}) {asc}", E::NAME_COLUMN)),
        // newest first by default
        SortBy::Newest => Some(format!("ORDER BY {t}.id {desc}")),
        SortBy::Rating => E::RATING_COLUMN
            .map(|c| format!("ORDER BY {t}.{c} {desc}, LOWER({t}.{}) {asc}", E::NAME_COLUMN)),
        _ => None,
    }
}

/// Rules every entity kind answers: the name, the bookkeeping timestamps, and the
/// star/rating state where the kind has it.
pub fn base_rule<E: EntityModel>(rule: &str, op: &RuleOperator) -> Result<SqlCondition> {
    let t = E::TABLE;
    match rule {
        "title" => Ok(op.column(&format!("{t}.{}", E::NAME_COLUMN))),
        "added" => Ok(op.column(&format!("{t}.created"))),
        "updated" => Ok(op.column(&format!("{t}.updated"))),
        "recent_added" => recent_rule::<E>(rule, op, "id"),
        "recent_updated" => recent_rule::<E>(rule, op, "updated"),
        "rating" | "myrating" => match E::RATING_COLUMN {
            Some(col) => Ok(op.column(&format!("{t}.{col}"))),
            None => Err(AriaError::unsupported_rule(rule)),
        },
        "my_flagged" => match E::STARRED_COLUMN {
            Some(col) => Ok(op.column(&format!("{t}.{col}"))),
            None => Err(AriaError::unsupported_rule(rule)),
        },
        "favorite" => match E::STARRED_COLUMN {
            Some(col) => {
                let name = op.cmp(&format!("{t}.{}", E::NAME_COLUMN));
                let sql = format!("({name} AND {t}.{col} IS NOT NULL)");
                Ok(SqlCondition::with(sql, op.param().into_iter().collect()))
            }
            None => Err(AriaError::unsupported_rule(rule)),
        },
        _ => Err(AriaError::unsupported_rule(rule)),
    }
}

/// The `recent_added`/`recent_updated` rules select membership in the N most recent
/// rows of the user's library. The inner SELECT is wrapped once more because MySQL
/// refuses LIMIT within an IN subquery.
fn recent_rule<E: EntityModel>(rule: &str, op: &RuleOperator, order_col: &str) -> Result<SqlCondition> {
    let n = op.limit_count(rule)?;
    let t = E::TABLE;
    let sql = format!(
        "{t}.id IN (SELECT * FROM (SELECT id FROM {t} WHERE user_id = ? \
         ORDER BY {order_col} DESC LIMIT {n}) recents)"
    );
    Ok(SqlCondition::with(sql, op.param().into_iter().collect()))
}

/// Entities that can be flagged as favorites. `starred` holds the flagging timestamp.
pub trait Starrable: EntityModel {
    fn starred(&self) -> Option<&str>;
    fn set_starred(&mut self, starred: Option<String>);
}

/// Entities carrying a personal 0..=5 rating.
pub trait Rateable: EntityModel {
    fn rating(&self) -> i64;
    fn set_rating(&mut self, rating: i64);
}

/// Generates the seven bookkeeping accessors of `EntityModel` for structs with the
/// conventional `id`/`user_id`/`created`/`updated` fields.
macro_rules! entity_accessors {
    () => {
        fn id(&self) -> i64 {
            self.id
        }
        fn set_id(&mut self, id: i64) {
            self.id = id;
        }
        fn user_id(&self) -> &str {
            &self.user_id
        }
        fn created(&self) -> &str {
            &self.created
        }
        fn set_created(&mut self, created: String) {
            self.created = created;
        }
        fn updated(&self) -> &str {
            &self.updated
        }
        fn set_updated(&mut self, updated: String) {
            self.updated = updated;
        }
    };
}
pub(crate) use entity_accessors;
