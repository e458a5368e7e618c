use crate::common::{MatchMode, SortBy};
use crate::errors::AriaError;
use crate::genres::Genre;
use crate::mapper::{Mapper, Paging, TimeRange};
use crate::radio::RadioStation;
use crate::testing;
use crate::tracks::Track;

#[test]
fn test_find_is_scoped_by_user() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let track = mapper.find(1, "alice").unwrap();
    assert_eq!(track.title.as_deref(), Some("Foobar"));
    assert_eq!(track.artist_name.as_deref(), Some("Queen"));
    assert_eq!(track.filename.as_deref(), Some("Foobar.mp3"));

    // the same id does not exist for bob, and bob's rows are invisible to alice
    assert!(matches!(mapper.find(1, "bob"), Err(AriaError::NotFound)));
    assert!(matches!(mapper.find(4, "alice"), Err(AriaError::NotFound)));
}

#[test]
fn test_find_all_per_user() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let alice = mapper
        .find_all("alice", SortBy::Name, Paging::NONE, &TimeRange::NONE, &TimeRange::NONE)
        .unwrap();
    let names: Vec<&str> = alice.iter().filter_map(|t| t.title.as_deref()).collect();
    assert_eq!(names, vec!["Barfoo", "Baz", "Foobar"]);

    let bob = mapper
        .find_all("bob", SortBy::Name, Paging::NONE, &TimeRange::NONE, &TimeRange::NONE)
        .unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].id, 4);
}

#[test]
fn test_find_all_paging() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let page = mapper
        .find_all(
            "alice",
            SortBy::Name,
            Paging::new(Some(2), Some(1)),
            &TimeRange::NONE,
            &TimeRange::NONE,
        )
        .unwrap();
    let names: Vec<&str> = page.iter().filter_map(|t| t.title.as_deref()).collect();
    assert_eq!(names, vec!["Baz", "Foobar"]);
}

#[test]
fn test_find_all_created_range() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let range = TimeRange {
        min: Some("2024-01-02 00:00:00.000".to_string()),
        max: None,
    };
    let recent = mapper
        .find_all("alice", SortBy::Name, Paging::NONE, &range, &TimeRange::NONE)
        .unwrap();
    let ids: Vec<i64> = recent.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_find_by_id_drops_foreign_and_unknown_ids() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let found = mapper.find_by_id(&[3, 1, 4, 999], "alice").unwrap();
    let ids: Vec<i64> = found.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_find_by_id_any_user_crosses_users() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let found = mapper.find_by_id_any_user(&[4, 1, 999]).unwrap();
    let owners: Vec<(i64, &str)> = found.iter().map(|t| (t.id, t.user_id.as_str())).collect();
    assert_eq!(owners, vec![(1, "alice"), (4, "bob")]);
}

#[test]
fn test_insert_round_trip() {
    let conn = testing::seeded_db();
    let mapper: Mapper<RadioStation> = Mapper::new(&conn);

    let mut station = RadioStation {
        user_id: "alice".to_string(),
        name: Some("News 24".to_string()),
        stream_url: "https://example.org/news".to_string(),
        ..RadioStation::default()
    };
    mapper.insert(&mut station).unwrap();
    assert!(station.id > 0);
    assert_eq!(station.created, station.updated);

    let loaded = mapper.find(station.id, "alice").unwrap();
    assert_eq!(loaded.name.as_deref(), Some("News 24"));
    assert_eq!(loaded.created, station.created);
}

#[test]
fn test_insert_conflict() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Genre> = Mapper::new(&conn);

    // "Rock" is already present for alice; lower_name collides case-insensitively
    let mut genre = Genre {
        user_id: "alice".to_string(),
        name: Some("ROCK".to_string()),
        ..Genre::default()
    };
    assert!(matches!(mapper.insert(&mut genre), Err(AriaError::UniqueConflict)));

    // but the same name is free for bob
    let mut genre = Genre {
        user_id: "bob".to_string(),
        name: Some("Rock".to_string()),
        ..Genre::default()
    };
    mapper.insert(&mut genre).unwrap();
    assert!(genre.id > 0);
}

#[test]
fn test_insert_or_update_converges_and_preserves_created() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Genre> = Mapper::new(&conn);

    let mut genre = Genre {
        user_id: "alice".to_string(),
        name: Some("ROCK".to_string()),
        ..Genre::default()
    };
    mapper.insert_or_update(&mut genre).unwrap();
    assert_eq!(genre.id, 1);
    assert_eq!(genre.created, "2024-01-01 00:00:00.000");
    assert_ne!(genre.updated, genre.created);
    assert_eq!(mapper.count("alice").unwrap(), 2);

    // reloaded row carries the new spelling
    let loaded = mapper.find(1, "alice").unwrap();
    assert_eq!(loaded.name.as_deref(), Some("ROCK"));
}

#[test]
fn test_update_or_insert() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Genre> = Mapper::new(&conn);

    let mut genre = Genre {
        user_id: "alice".to_string(),
        name: Some("Jazz".to_string()),
        ..Genre::default()
    };
    mapper.update_or_insert(&mut genre).unwrap();
    let first_id = genre.id;
    assert!(first_id > 0);

    let mut again = Genre {
        user_id: "alice".to_string(),
        name: Some("jazz".to_string()),
        ..Genre::default()
    };
    mapper.update_or_insert(&mut again).unwrap();
    assert_eq!(again.id, first_id);
    assert_eq!(mapper.count("alice").unwrap(), 3);
}

#[test]
fn test_update_missing_row() {
    let conn = testing::seeded_db();
    let mapper: Mapper<RadioStation> = Mapper::new(&conn);

    let mut station = RadioStation {
        id: 999,
        user_id: "alice".to_string(),
        stream_url: "https://example.org/x".to_string(),
        ..RadioStation::default()
    };
    assert!(matches!(mapper.update(&mut station), Err(AriaError::NotFound)));
}

#[test]
fn test_find_all_by_name() {
    let conn = testing::seeded_db();
    let mapper: Mapper<crate::artists::Artist> = Mapper::new(&conn);

    let exact = mapper
        .find_all_by_name("alice", Some("queen"), MatchMode::Exact, Paging::NONE)
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].name.as_deref(), Some("Queen"));

    // unquoted substring parts match in order
    let sub = mapper
        .find_all_by_name("alice", Some("pi fl"), MatchMode::Substring, Paging::NONE)
        .unwrap();
    assert_eq!(sub.len(), 1);
    assert_eq!(sub[0].name.as_deref(), Some("Pink Floyd"));

    // quoted input is one literal phrase
    let quoted = mapper
        .find_all_by_name("alice", Some("\"nk Flo\""), MatchMode::Substring, Paging::NONE)
        .unwrap();
    assert_eq!(quoted.len(), 1);
    let quoted = mapper
        .find_all_by_name("alice", Some("\"pi fl\""), MatchMode::Substring, Paging::NONE)
        .unwrap();
    assert!(quoted.is_empty());

    // wildcards pass through untouched
    let wild = mapper
        .find_all_by_name("alice", Some("%Floyd"), MatchMode::Wildcards, Paging::NONE)
        .unwrap();
    assert_eq!(wild.len(), 1);
}

#[test]
fn test_find_all_by_name_null() {
    let conn = testing::seeded_db();
    conn.execute(
        "INSERT INTO artists (user_id, name, hash, created, updated)
         VALUES ('alice', NULL, 'a9', '2024-02-01 00:00:00.000', '2024-02-01 00:00:00.000')",
        [],
    )
    .unwrap();

    let mapper: Mapper<crate::artists::Artist> = Mapper::new(&conn);
    let unnamed = mapper
        .find_all_by_name("alice", None, MatchMode::Exact, Paging::NONE)
        .unwrap();
    assert_eq!(unnamed.len(), 1);
    assert!(unnamed[0].name.is_none());
}

#[test]
fn test_starred_and_rated_listings() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let starred = mapper.find_all_starred("alice", Paging::NONE).unwrap();
    let ids: Vec<i64> = starred.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1]);

    let rated = mapper.find_all_rated("alice", Paging::NONE).unwrap();
    let ids: Vec<i64> = rated.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![1, 3]); // rating 5, then 2

    assert!(mapper.find_all_starred("bob", Paging::NONE).unwrap().is_empty());
}

#[test]
fn test_set_starred_date() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    let changed = mapper
        .set_starred_date(Some("2024-03-01 00:00:00.000"), &[2, 3, 4], "alice")
        .unwrap();
    assert_eq!(changed, 2); // bob's track 4 is out of reach
    assert_eq!(mapper.find_all_starred("alice", Paging::NONE).unwrap().len(), 3);

    let cleared = mapper.set_starred_date(None, &[1, 2, 3], "alice").unwrap();
    assert_eq!(cleared, 3);
    assert!(mapper.find_all_starred("alice", Paging::NONE).unwrap().is_empty());
}

#[test]
fn test_set_rating_clamps() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    mapper.set_rating(99, &[2], "alice").unwrap();
    assert_eq!(mapper.find(2, "alice").unwrap().rating, 5);
    mapper.set_rating(-1, &[2], "alice").unwrap();
    assert_eq!(mapper.find(2, "alice").unwrap().rating, 0);
}

#[test]
fn test_counts_and_ids() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    assert_eq!(mapper.count("alice").unwrap(), 3);
    assert_eq!(mapper.count("carol").unwrap(), 0);
    assert!(mapper.exists(2, "alice").unwrap());
    assert!(!mapper.exists(2, "bob").unwrap());
    assert_eq!(mapper.max_id("alice").unwrap(), Some(3));
    assert_eq!(mapper.max_id("carol").unwrap(), None);

    assert_eq!(mapper.find_all_ids("alice", None).unwrap(), vec![1, 2, 3]);
    // candidate validation keeps only existing own ids
    assert_eq!(mapper.find_all_ids("alice", Some(&[2, 4, 999])).unwrap(), vec![2]);
}

#[test]
fn test_latest_times() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    assert_eq!(
        mapper.latest_insert_time("alice").unwrap().as_deref(),
        Some("2024-01-03 00:00:00.000")
    );
    assert_eq!(
        mapper.latest_update_time("alice").unwrap().as_deref(),
        Some("2024-01-04 00:00:00.000")
    );
    assert_eq!(mapper.latest_insert_time("carol").unwrap(), None);
}

#[test]
fn test_delete_is_scoped() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Track> = Mapper::new(&conn);

    assert_eq!(mapper.delete_by_id(&[1], "bob").unwrap(), 0);
    assert_eq!(mapper.delete_by_id(&[1], "alice").unwrap(), 1);
    assert_eq!(mapper.delete_all("bob").unwrap(), 1);
    assert_eq!(mapper.count("alice").unwrap(), 2);
}
