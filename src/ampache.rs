//! Protocol-facing translation of Ampache advanced-search requests into the crate's
//! rule triples.
//!
//! The wire format names rules with a handful of legacy aliases and encodes the
//! operator as a small integer whose meaning depends on the rule's category. Both
//! mappings are total matches here: adding a rule without placing it in a bucket, or
//! a bucket without its code table, fails to compile rather than misbehaving at
//! runtime.

use chrono::{Duration, Utc};

use crate::common::{Conjunction, SQL_DATE_FORMAT};
use crate::errors::{AriaError, Result};
use crate::rules::SearchRule;

/// Entity kinds addressable by a search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Song,
    Album,
    Artist,
    Genre,
    Playlist,
    Podcast,
    PodcastEpisode,
    Bookmark,
    RadioStation,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Song => "song",
            EntityKind::Album => "album",
            EntityKind::Artist => "artist",
            EntityKind::Genre => "genre",
            EntityKind::Playlist => "playlist",
            EntityKind::Podcast => "podcast",
            EntityKind::PodcastEpisode => "podcast_episode",
            EntityKind::Bookmark => "bookmark",
            EntityKind::RadioStation => "live_stream",
        }
    }
}

/// Resolve a search type. The pseudo-types `album_artist` and `song_artist` search
/// artists restricted to those having albums/songs; the restriction comes back as a
/// synthetic rule appended to the search.
fn parse_search_type(search_type: &str) -> Result<(EntityKind, Option<SearchRule>)> {
    let plain = |kind| Ok((kind, None));
    match search_type {
        "song" | "track" => plain(EntityKind::Song),
        "album" => plain(EntityKind::Album),
        "artist" => plain(EntityKind::Artist),
        "album_artist" => Ok((
            EntityKind::Artist,
            Some(SearchRule::new("album_count", ">", "0")),
        )),
        "song_artist" => Ok((
            EntityKind::Artist,
            Some(SearchRule::new("song_count", ">", "0")),
        )),
        "genre" | "tag" => plain(EntityKind::Genre),
        "playlist" => plain(EntityKind::Playlist),
        "podcast" => plain(EntityKind::Podcast),
        "podcast_episode" => plain(EntityKind::PodcastEpisode),
        "bookmark" => plain(EntityKind::Bookmark),
        "live_stream" | "radio" => plain(EntityKind::RadioStation),
        other => Err(AriaError::Generic(format!("unknown search type '{other}'"))),
    }
}

/// Legacy rule-name aliases from older protocol revisions.
pub fn resolve_rule_alias(rule: &str) -> &str {
    match rule {
        "name" => "title",
        "song_title" => "song",
        "album_title" => "album",
        "artist_title" => "artist",
        "podcast_title" => "podcast",
        "podcast_episode_title" => "podcast_episode",
        "album_artist_title" => "album_artist",
        "song_artist_title" => "song_artist",
        "tag" => "genre",
        "song_tag" => "song_genre",
        "album_tag" => "album_genre",
        "artist_tag" => "artist_genre",
        "no_tag" => "no_genre",
        other => other,
    }
}

/// Operator categories. The wire operator code is meaningless without knowing the
/// rule's category first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorBucket {
    Text,
    Numeric,
    /// The code itself is ignored; the input is a row count.
    NumericLimit,
    /// Input is an absolute timestamp.
    Date,
    /// Input is an age in days, converted to a timestamp before compilation.
    Day,
    Boolean,
    /// Boolean polarity applied to a numeric input (playlist membership).
    BooleanNumeric,
}

/// Category of each known rule, after alias resolution. Unknown rules land in Text
/// and are rejected later by the per-kind rule tables.
pub fn bucket_for_rule(rule: &str) -> OperatorBucket {
    match rule {
        "time" | "year" | "original_year" | "rating" | "myrating" | "songrating"
        | "albumrating" | "artistrating" | "played_times" | "album_count" | "song_count"
        | "disk_count" | "bitrate" | "episode" => OperatorBucket::Numeric,
        "recent_played" | "recent_added" | "recent_updated" => OperatorBucket::NumericLimit,
        "added" | "updated" | "pubdate" => OperatorBucket::Date,
        "last_play" => OperatorBucket::Day,
        "played" | "myplayed" | "myplayedalbum" | "myplayedartist" | "has_image"
        | "my_flagged" | "no_genre" => OperatorBucket::Boolean,
        "playlist" => OperatorBucket::BooleanNumeric,
        _ => OperatorBucket::Text,
    }
}

impl OperatorBucket {
    /// Decode the wire operator code into the compiler's operator string.
    pub fn operator(self, code: u32, rule: &str) -> Result<&'static str> {
        let unsupported = || AriaError::unsupported_operator(rule, &code.to_string());
        match self {
            OperatorBucket::Text => match code {
                0 => Ok("contain"),
                1 => Ok("notcontain"),
                2 => Ok("start"),
                3 => Ok("end"),
                4 => Ok("is"),
                5 => Ok("isnot"),
                6 => Ok("sounds"),
                7 => Ok("notsounds"),
                8 => Ok("regexp"),
                9 => Ok("notregexp"),
                _ => Err(unsupported()),
            },
            OperatorBucket::Numeric => match code {
                0 => Ok(">="),
                1 => Ok("<="),
                2 => Ok("="),
                3 => Ok("!="),
                4 => Ok(">"),
                5 => Ok("<"),
                _ => Err(unsupported()),
            },
            OperatorBucket::NumericLimit => Ok("limit"),
            OperatorBucket::Date | OperatorBucket::Day => match code {
                0 => Ok("before"),
                1 => Ok("after"),
                _ => Err(unsupported()),
            },
            OperatorBucket::Boolean => match code {
                0 => Ok("true"),
                1 => Ok("false"),
                _ => Err(unsupported()),
            },
            OperatorBucket::BooleanNumeric => match code {
                0 => Ok("equal"),
                1 => Ok("ne"),
                _ => Err(unsupported()),
            },
        }
    }
}

/// One rule as it arrives on the wire.
#[derive(Debug, Clone)]
pub struct RawRule {
    pub rule: String,
    pub operator_code: u32,
    pub input: String,
}

impl RawRule {
    pub fn new(rule: &str, operator_code: u32, input: &str) -> RawRule {
        RawRule {
            rule: rule.to_string(),
            operator_code,
            input: input.to_string(),
        }
    }
}

/// A fully translated search, ready for `Mapper::find_all_advanced`.
#[derive(Debug)]
pub struct SearchSpec {
    pub kind: EntityKind,
    pub conjunction: Conjunction,
    pub rules: Vec<SearchRule>,
}

/// Translate a wire-format search into compiler rules: resolve the search type and
/// any pseudo-type, resolve rule aliases, decode operator codes per bucket, and
/// normalize day-age inputs to absolute timestamps.
pub fn prepare_search(
    search_type: &str,
    conjunction: &str,
    raw_rules: &[RawRule],
) -> Result<SearchSpec> {
    let (kind, synthetic) = parse_search_type(search_type)?;
    let conjunction = Conjunction::parse(conjunction)?;

    let mut rules = Vec::with_capacity(raw_rules.len() + 1);
    for raw in raw_rules {
        let rule = resolve_rule_alias(&raw.rule);
        let bucket = bucket_for_rule(rule);
        let operator = bucket.operator(raw.operator_code, rule)?;
        let input = match bucket {
            OperatorBucket::Day => days_ago_timestamp(rule, &raw.input)?,
            _ => raw.input.clone(),
        };
        rules.push(SearchRule::new(rule, operator, &input));
    }
    rules.extend(synthetic);

    Ok(SearchSpec { kind, conjunction, rules })
}

fn days_ago_timestamp(rule: &str, input: &str) -> Result<String> {
    let days: i64 = input
        .trim()
        .parse()
        .map_err(|_| AriaError::unsupported_operator(rule, input))?;
    let when = Utc::now() - Duration::days(days);
    Ok(when.format(SQL_DATE_FORMAT).to_string())
}
