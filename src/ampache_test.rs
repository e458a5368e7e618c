use crate::ampache::*;
use crate::common::{Conjunction, SortBy, SQL_DATE_FORMAT};
use crate::errors::AriaError;
use crate::mapper::{Mapper, Paging};
use crate::testing;
use crate::tracks::Track;

#[test]
fn test_text_operator_codes() {
    let expected = [
        "contain", "notcontain", "start", "end", "is", "isnot", "sounds", "notsounds",
        "regexp", "notregexp",
    ];
    for (code, op) in expected.iter().enumerate() {
        assert_eq!(OperatorBucket::Text.operator(code as u32, "title").unwrap(), *op);
    }
    assert!(matches!(
        OperatorBucket::Text.operator(10, "title"),
        Err(AriaError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_numeric_operator_codes() {
    let expected = [">=", "<=", "=", "!=", ">", "<"];
    for (code, op) in expected.iter().enumerate() {
        assert_eq!(OperatorBucket::Numeric.operator(code as u32, "year").unwrap(), *op);
    }
    assert!(OperatorBucket::Numeric.operator(6, "year").is_err());
}

#[test]
fn test_other_buckets() {
    // the limit pseudo-operator ignores the code entirely
    assert_eq!(OperatorBucket::NumericLimit.operator(0, "recent_played").unwrap(), "limit");
    assert_eq!(OperatorBucket::NumericLimit.operator(42, "recent_played").unwrap(), "limit");

    assert_eq!(OperatorBucket::Date.operator(0, "added").unwrap(), "before");
    assert_eq!(OperatorBucket::Date.operator(1, "added").unwrap(), "after");
    assert_eq!(OperatorBucket::Boolean.operator(0, "played").unwrap(), "true");
    assert_eq!(OperatorBucket::Boolean.operator(1, "played").unwrap(), "false");
    assert_eq!(OperatorBucket::BooleanNumeric.operator(0, "playlist").unwrap(), "equal");
    assert_eq!(OperatorBucket::BooleanNumeric.operator(1, "playlist").unwrap(), "ne");
    assert!(OperatorBucket::Boolean.operator(2, "played").is_err());
    assert!(OperatorBucket::Date.operator(2, "added").is_err());
}

#[test]
fn test_rule_buckets() {
    assert_eq!(bucket_for_rule("title"), OperatorBucket::Text);
    assert_eq!(bucket_for_rule("anywhere"), OperatorBucket::Text);
    assert_eq!(bucket_for_rule("year"), OperatorBucket::Numeric);
    assert_eq!(bucket_for_rule("played_times"), OperatorBucket::Numeric);
    assert_eq!(bucket_for_rule("recent_added"), OperatorBucket::NumericLimit);
    assert_eq!(bucket_for_rule("added"), OperatorBucket::Date);
    assert_eq!(bucket_for_rule("last_play"), OperatorBucket::Day);
    assert_eq!(bucket_for_rule("no_genre"), OperatorBucket::Boolean);
    assert_eq!(bucket_for_rule("playlist"), OperatorBucket::BooleanNumeric);
}

#[test]
fn test_rule_aliases() {
    assert_eq!(resolve_rule_alias("name"), "title");
    assert_eq!(resolve_rule_alias("song_title"), "song");
    assert_eq!(resolve_rule_alias("album_title"), "album");
    assert_eq!(resolve_rule_alias("artist_title"), "artist");
    assert_eq!(resolve_rule_alias("tag"), "genre");
    assert_eq!(resolve_rule_alias("song_tag"), "song_genre");
    assert_eq!(resolve_rule_alias("album_tag"), "album_genre");
    assert_eq!(resolve_rule_alias("no_tag"), "no_genre");
    assert_eq!(resolve_rule_alias("podcast_title"), "podcast");
    assert_eq!(resolve_rule_alias("podcast_episode_title"), "podcast_episode");
    assert_eq!(resolve_rule_alias("title"), "title");
}

#[test]
fn test_prepare_search_resolves_aliases_and_codes() {
    let spec = prepare_search("song", "and", &[RawRule::new("name", 0, "foo")]).unwrap();
    assert_eq!(spec.kind, EntityKind::Song);
    assert_eq!(spec.conjunction, Conjunction::And);
    assert_eq!(spec.rules.len(), 1);
    assert_eq!(spec.rules[0].rule, "title");
    assert_eq!(spec.rules[0].operator, "contain");
    assert_eq!(spec.rules[0].input, "foo");
}

#[test]
fn test_prepare_search_pseudo_types() {
    let spec = prepare_search("album_artist", "or", &[RawRule::new("name", 4, "queen")]).unwrap();
    assert_eq!(spec.kind, EntityKind::Artist);
    assert_eq!(spec.conjunction, Conjunction::Or);
    // the synthetic restriction is appended after the wire rules
    assert_eq!(spec.rules.len(), 2);
    assert_eq!(spec.rules[1].rule, "album_count");
    assert_eq!(spec.rules[1].operator, ">");
    assert_eq!(spec.rules[1].input, "0");

    let spec = prepare_search("song_artist", "and", &[]).unwrap();
    assert_eq!(spec.kind, EntityKind::Artist);
    assert_eq!(spec.rules[0].rule, "song_count");
}

#[test]
fn test_prepare_search_day_conversion() {
    let spec = prepare_search("song", "and", &[RawRule::new("last_play", 1, "7")]).unwrap();
    assert_eq!(spec.rules[0].operator, "after");
    // input becomes an absolute timestamp a week in the past
    let ts = &spec.rules[0].input;
    assert_eq!(ts.len(), 23);
    assert!(chrono::NaiveDateTime::parse_from_str(ts, SQL_DATE_FORMAT).is_ok());

    assert!(matches!(
        prepare_search("song", "and", &[RawRule::new("last_play", 1, "recently")]),
        Err(AriaError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_prepare_search_rejects_garbage() {
    assert!(prepare_search("movie", "and", &[]).is_err());
    assert!(prepare_search("song", "nand", &[]).is_err());
    assert!(matches!(
        prepare_search("song", "and", &[RawRule::new("year", 9, "1990")]),
        Err(AriaError::UnsupportedOperator { .. })
    ));
}

#[test]
fn test_prepared_search_runs_end_to_end() {
    let conn = testing::seeded_db();
    let spec = prepare_search("song", "and", &[RawRule::new("name", 0, "foo")]).unwrap();
    assert_eq!(spec.kind, EntityKind::Song);

    let mapper: Mapper<Track> = Mapper::new(&conn);
    let found = mapper
        .find_all_advanced(spec.conjunction, &spec.rules, "alice", SortBy::Name, None, Paging::NONE)
        .unwrap();
    let names: Vec<&str> = found.iter().filter_map(|t| t.title.as_deref()).collect();
    assert_eq!(names, vec!["Barfoo", "Foobar"]);
}
