//! The common module holds the small closed vocabularies shared by the mapper layer and
//! its callers, plus a grab bag of helpers (timestamps, content hashing, logging init).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::{AriaError, Result};

/// Timestamp format used for the `created`/`updated`/`starred`/`last_played` columns.
pub const SQL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current UTC time in the database timestamp format.
pub fn sql_now() -> String {
    Utc::now().format(SQL_DATE_FORMAT).to_string()
}

/// Sort order of a result set. The string forms are part of the caller-facing API and
/// must stay stable; protocol front-ends persist them as request parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortBy {
    None,
    Name,
    Parent,
    Newest,
    PlayCount,
    LastPlayed,
    Rating,
}

impl SortBy {
    pub fn parse(s: &str) -> SortBy {
        match s {
            "name" => SortBy::Name,
            "parent" => SortBy::Parent,
            "newest" => SortBy::Newest,
            "play_count" => SortBy::PlayCount,
            "last_played" => SortBy::LastPlayed,
            "rating" => SortBy::Rating,
            _ => SortBy::Name,
        }
    }
}

/// How `find_all_by_name` interprets its needle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Case-insensitive equality.
    Exact,
    /// Caller supplies the SQL wildcards; the input is passed through unescaped.
    Wildcards,
    /// Quoted input matches one literal phrase; unquoted input is split on whitespace
    /// and the parts must appear in order within the field.
    Substring,
}

/// The single boolean combinator applied across all rules of one advanced search.
/// Flat by design; the upstream search protocol has no nested grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn parse(s: &str) -> Result<Conjunction> {
        match s {
            "and" => Ok(Conjunction::And),
            "or" => Ok(Conjunction::Or),
            _ => Err(AriaError::Generic(format!("bad conjunction '{s}'"))),
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

/// Compile a `MatchMode::Substring` needle into a LIKE pattern.
///
/// A quoted needle (`"exact phrase"`) becomes one contiguous substring; an unquoted one
/// is split on whitespace and rejoined with `%` so `foo bar` matches any value
/// containing "foo" followed eventually by "bar".
pub fn substring_like_pattern(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        format!("%{}%", &trimmed[1..trimmed.len() - 1])
    } else {
        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        format!("%{}%", parts.join("%"))
    }
}

/// Content hash over the identity-defining fields of an entity, used to deduplicate
/// re-scans (e.g. album identity is name + album artist).
pub fn content_hash(parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

/// Initialize tracing output for the process. Safe to call more than once; only the
/// first call takes effect.
pub fn initialize_logging() {
    use tracing_subscriber::EnvFilter;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
}
