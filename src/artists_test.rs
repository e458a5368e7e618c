use crate::artists::Artist;
use crate::common::{Conjunction, SortBy};
use crate::mapper::{Mapper, Paging};
use crate::rules::SearchRule;
use crate::testing;

fn search(conn: &rusqlite::Connection, rules: &[SearchRule]) -> Vec<i64> {
    let mapper: Mapper<Artist> = Mapper::new(conn);
    mapper
        .find_all_advanced(Conjunction::And, rules, "alice", SortBy::Name, None, Paging::NONE)
        .unwrap()
        .iter()
        .map(|a| a.id)
        .collect()
}

#[test]
fn test_relation_rules() {
    let conn = testing::seeded_db();
    assert_eq!(search(&conn, &[SearchRule::new("album", "contain", "wall")]), vec![2]);
    assert_eq!(search(&conn, &[SearchRule::new("song", "contain", "foo")]), vec![2, 1]);
    assert_eq!(search(&conn, &[SearchRule::new("artist", "is", "queen")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("title", "start", "pink")]), vec![2]);
}

#[test]
fn test_count_rules() {
    let conn = testing::seeded_db();
    assert_eq!(search(&conn, &[SearchRule::new("album_count", ">", "0")]), vec![2, 1]);
    assert_eq!(search(&conn, &[SearchRule::new("song_count", ">=", "2")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("time", ">=", "500")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("played_times", ">=", "4")]), vec![1]);
}

#[test]
fn test_genre_rules() {
    let conn = testing::seeded_db();
    assert_eq!(search(&conn, &[SearchRule::new("genre", "is", "rock")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("song_genre", "contain", "roc")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("no_genre", "true", "")]), vec![2, 1]);
}

#[test]
fn test_played_rules() {
    let conn = testing::seeded_db();
    assert_eq!(search(&conn, &[SearchRule::new("played", "true", "")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("myplayed", "false", "")]), vec![2]);
    assert_eq!(search(&conn, &[SearchRule::new("recent_played", "limit", "1")]), vec![1]);
    assert_eq!(
        search(&conn, &[SearchRule::new("last_play", "after", "2024-01-20 00:00:00.000")]),
        vec![1]
    );
}

#[test]
fn test_playlist_and_misc_rules() {
    let conn = testing::seeded_db();
    assert_eq!(search(&conn, &[SearchRule::new("playlist", "equal", "1")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("playlist_name", "contain", "driv")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("mbid_artist", "is", "mb-q")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("has_image", "true", "")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("artistrating", "=", "4")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("favorite", "contain", "que")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("my_flagged", "true", "")]), vec![1]);
}

#[test]
fn test_playlist_ne_matches_partially_included_artists() {
    let conn = testing::seeded_db();
    // drop track 3 from the playlist; artist 1 still performs it
    conn.execute("UPDATE playlists SET track_ids = '|1|' WHERE id = 1", []).unwrap();
    assert_eq!(search(&conn, &[SearchRule::new("playlist", "equal", "1")]), vec![1]);
    assert_eq!(search(&conn, &[SearchRule::new("playlist", "ne", "1")]), vec![2, 1]);
}

#[test]
fn test_find_all_having_albums() {
    let conn = testing::seeded_db();
    let mapper: Mapper<Artist> = Mapper::new(&conn);

    let with_albums = mapper.find_all_having_albums("alice", Paging::NONE).unwrap();
    assert_eq!(with_albums.iter().map(|a| a.id).collect::<Vec<_>>(), vec![2, 1]);

    // a performer with tracks but no albums of their own is excluded
    conn.execute(
        "INSERT INTO artists (user_id, name, hash, created, updated)
         VALUES ('alice', 'Session Player', 'a5', '2024-02-01 00:00:00.000', '2024-02-01 00:00:00.000')",
        [],
    )
    .unwrap();
    let with_albums = mapper.find_all_having_albums("alice", Paging::NONE).unwrap();
    assert_eq!(with_albums.len(), 2);
}
