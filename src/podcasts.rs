//! Podcast channels and their episodes. Channel rows are keyed by a hash of the RSS
//! url, episodes by a hash of their guid, so a feed refresh upserts cleanly.

use rusqlite::types::Value;
use rusqlite::Row;

use crate::common::SortBy;
use crate::dialect::Dialect;
use crate::entity::{base_rule, entity_accessors, EntityModel, Rateable, Starrable};
use crate::errors::{AriaError, Result};
use crate::mapper::{Mapper, Paging};
use crate::rules::{RuleOperator, SqlCondition};

#[derive(Debug, Clone, Default)]
pub struct PodcastChannel {
    pub id: i64,
    pub user_id: String,
    pub rss_url: String,
    pub rss_hash: String,
    pub title: Option<String>,
    pub link_url: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub update_checked: Option<String>,
    pub starred: Option<String>,
    pub rating: i64,
    pub created: String,
    pub updated: String,
}

impl EntityModel for PodcastChannel {
    const TABLE: &'static str = "podcast_channels";
    const NAME_COLUMN: &'static str = "title";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["rss_hash"];
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<PodcastChannel> {
        Ok(PodcastChannel {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            rss_url: row.get("rss_url")?,
            rss_hash: row.get("rss_hash")?,
            title: row.get("title")?,
            link_url: row.get("link_url")?,
            published: row.get("published")?,
            author: row.get("author")?,
            description: row.get("description")?,
            image_url: row.get("image_url")?,
            update_checked: row.get("update_checked")?,
            starred: row.get("starred")?,
            rating: row.get("rating")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("rss_url", Value::from(self.rss_url.clone())),
            ("rss_hash", Value::from(self.rss_hash.clone())),
            ("title", Value::from(self.title.clone())),
            ("link_url", Value::from(self.link_url.clone())),
            ("published", Value::from(self.published.clone())),
            ("author", Value::from(self.author.clone())),
            ("description", Value::from(self.description.clone())),
            ("image_url", Value::from(self.image_url.clone())),
            ("update_checked", Value::from(self.update_checked.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
        ]
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, _dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "podcast" => Ok(op.column("podcast_channels.title")),
            "podcast_episode" => Ok(op.with_param(format!(
                "podcast_channels.id IN (SELECT channel_id FROM podcast_episodes WHERE {})",
                op.cmp("title")
            ))),
            "pubdate" => Ok(op.column("podcast_channels.published")),
            "time" => {
                let cond = op.cmp("SUM(duration)");
                let sql = format!(
                    "podcast_channels.id IN (SELECT * FROM (SELECT channel_id \
                     FROM podcast_episodes WHERE user_id = ? GROUP BY channel_id \
                     HAVING {cond}) agg)"
                );
                let mut params = vec![op.user_param()];
                params.extend(op.param());
                Ok(SqlCondition::with(sql, params))
            }
            _ => base_rule::<PodcastChannel>(rule, op),
        }
    }
}

impl Starrable for PodcastChannel {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for PodcastChannel {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

#[derive(Debug, Clone, Default)]
pub struct PodcastEpisode {
    pub id: i64,
    pub user_id: String,
    pub channel_id: i64,
    pub guid_hash: String,
    pub title: Option<String>,
    pub episode: Option<i64>,
    pub stream_url: Option<String>,
    pub mimetype: Option<String>,
    pub duration: Option<i64>,
    pub published: Option<String>,
    pub description: Option<String>,
    pub starred: Option<String>,
    pub rating: i64,
    pub created: String,
    pub updated: String,
}

/// Bookmark type tag for episode listening positions; the `played` rule checks for
/// the presence of such a bookmark.
pub const EPISODE_BOOKMARK_TYPE: i64 = 2;

impl EntityModel for PodcastEpisode {
    const TABLE: &'static str = "podcast_episodes";
    const NAME_COLUMN: &'static str = "title";
    const UNIQUE_COLUMNS: &'static [&'static str] = &["guid_hash"];
    const PARENT_COLUMN: Option<&'static str> = Some("channel_id");
    const STARRED_COLUMN: Option<&'static str> = Some("starred");
    const RATING_COLUMN: Option<&'static str> = Some("rating");

    entity_accessors!();

    fn from_row(row: &Row) -> rusqlite::Result<PodcastEpisode> {
        Ok(PodcastEpisode {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            channel_id: row.get("channel_id")?,
            guid_hash: row.get("guid_hash")?,
            title: row.get("title")?,
            episode: row.get("episode")?,
            stream_url: row.get("stream_url")?,
            mimetype: row.get("mimetype")?,
            duration: row.get("duration")?,
            published: row.get("published")?,
            description: row.get("description")?,
            starred: row.get("starred")?,
            rating: row.get("rating")?,
            created: row.get("created")?,
            updated: row.get("updated")?,
        })
    }

    fn content_columns(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", Value::from(self.user_id.clone())),
            ("channel_id", Value::from(self.channel_id)),
            ("guid_hash", Value::from(self.guid_hash.clone())),
            ("title", Value::from(self.title.clone())),
            ("episode", Value::from(self.episode)),
            ("stream_url", Value::from(self.stream_url.clone())),
            ("mimetype", Value::from(self.mimetype.clone())),
            ("duration", Value::from(self.duration)),
            ("published", Value::from(self.published.clone())),
            ("description", Value::from(self.description.clone())),
            ("starred", Value::from(self.starred.clone())),
            ("rating", Value::from(self.rating)),
        ]
    }

    fn advanced_rule(rule: &str, op: &RuleOperator, _dialect: &dyn Dialect) -> Result<SqlCondition> {
        match rule {
            "podcast" => Ok(op.with_param(format!(
                "podcast_episodes.channel_id IN (SELECT id FROM podcast_channels WHERE {})",
                op.cmp("title")
            ))),
            "podcast_episode" => Ok(op.column("podcast_episodes.title")),
            "pubdate" => Ok(op.column("podcast_episodes.published")),
            "time" => Ok(op.column("podcast_episodes.duration")),
            "episode" => Ok(op.column("podcast_episodes.episode")),
            // Playback state of an episode is a listening-position bookmark.
            "played" | "myplayed" => {
                let membership = format!(
                    "podcast_episodes.id IN (SELECT entry_id FROM bookmarks \
                     WHERE user_id = ? AND type = {EPISODE_BOOKMARK_TYPE})"
                );
                let sql = match op.truth() {
                    Some(true) => membership,
                    Some(false) => format!("NOT ({membership})"),
                    None => return Err(AriaError::unsupported_rule(rule)),
                };
                Ok(SqlCondition::with(sql, vec![op.user_param()]))
            }
            _ => base_rule::<PodcastEpisode>(rule, op),
        }
    }

    fn sorting_clause(sort: SortBy, invert: bool) -> Option<String> {
        let desc = if invert { "ASC" } else { "DESC" };
        match sort {
            // episode listings read newest first
            SortBy::Parent => Some(format!(
                "ORDER BY podcast_episodes.channel_id ASC, podcast_episodes.published {desc}"
            )),
            _ => crate::entity::default_sorting::<PodcastEpisode>(sort, invert),
        }
    }
}

impl Starrable for PodcastEpisode {
    fn starred(&self) -> Option<&str> {
        self.starred.as_deref()
    }
    fn set_starred(&mut self, starred: Option<String>) {
        self.starred = starred;
    }
}

impl Rateable for PodcastEpisode {
    fn rating(&self) -> i64 {
        self.rating
    }
    fn set_rating(&mut self, rating: i64) {
        self.rating = rating;
    }
}

impl<'c> Mapper<'c, PodcastEpisode> {
    pub fn find_all_by_channel(
        &self,
        channel_id: i64,
        user_id: &str,
        paging: Paging,
    ) -> Result<Vec<PodcastEpisode>> {
        let order = PodcastEpisode::sorting_clause(SortBy::Parent, false).unwrap_or_default();
        let sql = self.select_user_entities(
            "podcast_episodes.channel_id = ?",
            &format!("{order} {}", paging.to_sql()),
        );
        self.find_entities(
            &sql,
            vec![Value::from(user_id.to_string()), Value::Integer(channel_id)],
        )
    }

    /// Remove all episodes of a channel, e.g. when the subscription is dropped.
    pub fn delete_by_channel(&self, channel_id: i64, user_id: &str) -> Result<usize> {
        Ok(self.connection().execute(
            "DELETE FROM podcast_episodes WHERE channel_id = ? AND user_id = ?",
            rusqlite::params![channel_id, user_id],
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Conjunction;
    use crate::rules::SearchRule;
    use crate::testing;

    fn search_channels(conn: &rusqlite::Connection, rules: &[SearchRule]) -> Vec<i64> {
        let mapper: Mapper<PodcastChannel> = Mapper::new(conn);
        mapper
            .find_all_advanced(Conjunction::And, rules, "alice", SortBy::Name, None, Paging::NONE)
            .unwrap()
            .iter()
            .map(|c| c.id)
            .collect()
    }

    fn search_episodes(conn: &rusqlite::Connection, rules: &[SearchRule]) -> Vec<i64> {
        let mapper: Mapper<PodcastEpisode> = Mapper::new(conn);
        mapper
            .find_all_advanced(Conjunction::And, rules, "alice", SortBy::Name, None, Paging::NONE)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect()
    }

    #[test]
    fn test_channel_rules() {
        let conn = testing::seeded_db();
        assert_eq!(search_channels(&conn, &[SearchRule::new("podcast", "contain", "tech")]), vec![1]);
        assert_eq!(
            search_channels(&conn, &[SearchRule::new("podcast_episode", "contain", "two")]),
            vec![1]
        );
        assert_eq!(search_channels(&conn, &[SearchRule::new("time", ">=", "4000")]), vec![1]);
        assert_eq!(search_channels(&conn, &[SearchRule::new("time", ">=", "5000")]), Vec::<i64>::new());
        assert_eq!(
            search_channels(&conn, &[SearchRule::new("pubdate", "after", "2024-01-01 00:00:00.000")]),
            vec![1]
        );
    }

    #[test]
    fn test_episode_rules() {
        let conn = testing::seeded_db();
        assert_eq!(search_episodes(&conn, &[SearchRule::new("podcast", "contain", "tech")]), vec![1, 2]);
        assert_eq!(search_episodes(&conn, &[SearchRule::new("podcast_episode", "is", "episode two")]), vec![2]);
        assert_eq!(search_episodes(&conn, &[SearchRule::new("episode", "=", "2")]), vec![2]);
        assert_eq!(search_episodes(&conn, &[SearchRule::new("time", ">", "2000")]), vec![2]);
        // playback state comes from the listening-position bookmark on episode 1
        assert_eq!(search_episodes(&conn, &[SearchRule::new("played", "true", "")]), vec![1]);
        assert_eq!(search_episodes(&conn, &[SearchRule::new("played", "false", "")]), vec![2]);
    }

    #[test]
    fn test_episode_channel_listing() {
        let conn = testing::seeded_db();
        let mapper: Mapper<PodcastEpisode> = Mapper::new(&conn);

        // newest first within the channel
        let episodes = mapper.find_all_by_channel(1, "alice", Paging::NONE).unwrap();
        assert_eq!(episodes.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2, 1]);

        assert_eq!(mapper.delete_by_channel(1, "bob").unwrap(), 0);
        assert_eq!(mapper.delete_by_channel(1, "alice").unwrap(), 2);
    }
}
