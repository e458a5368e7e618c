#[cfg(test)]
use rusqlite::Connection;
#[cfg(test)]
use std::sync::Once;

#[cfg(test)]
static INIT: Once = Once::new();

#[cfg(test)]
pub fn init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
            )
            .with_test_writer()
            .try_init();
    });
}

// Creates an in-memory database with the full schema and a small two-user library.
// Alice owns the interesting data; Bob exists to prove that queries never leak
// across users.
#[cfg(test)]
pub fn seeded_db() -> Connection {
    init();
    let conn = crate::db::connect_in_memory().expect("failed to open in-memory database");

    conn.execute_batch(
        r#"
INSERT INTO files
       (id, user_id, name          , size   , parent)
VALUES (1 , 'alice', 'Foobar.mp3'  , 8000000, 100)
     , (2 , 'alice', 'Barfoo.ogg'  , 5000000, 100)
     , (3 , 'alice', 'Baz.flac'    , 20000000, 101)
     , (4 , 'bob'  , 'Foobar.mp3'  , 8000000, 200);

INSERT INTO artists
       (id, user_id, name        , cover_file_id, mbid  , hash, starred                  , rating, created                  , updated)
VALUES (1 , 'alice', 'Queen'     , 1            , 'mb-q', 'a1', '2024-01-05 08:00:00.000', 4     , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000')
     , (2 , 'alice', 'Pink Floyd', null         , null  , 'a2', null                     , 0     , '2024-01-02 00:00:00.000', '2024-01-02 00:00:00.000')
     , (3 , 'bob'  , 'Queen'     , null         , null  , 'a1', null                     , 0     , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000');

INSERT INTO albums
       (id, user_id, name                   , mbid   , cover_file_id, album_artist_id, hash, starred                  , rating, created                  , updated)
VALUES (1 , 'alice', 'A Night at the Opera' , 'mb-o' , 1            , 1              , 'h1', '2024-01-06 09:00:00.000', 5     , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000')
     , (2 , 'alice', 'The Wall'             , null   , null         , 2              , 'h2', null                     , 0     , '2024-01-02 00:00:00.000', '2024-01-02 00:00:00.000')
     , (3 , 'bob'  , 'A Night at the Opera' , null   , null         , 3              , 'h1', null                     , 0     , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000');

INSERT INTO genres
       (id, user_id, name  , lower_name, created                  , updated)
VALUES (1 , 'alice', 'Rock', 'rock'    , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000')
     , (2 , 'alice', ''    , ''        , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000')
     , (3 , 'bob'  , 'Pop' , 'pop'     , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000');

INSERT INTO tracks
       (id, user_id, title   , number, disk, year, artist_id, album_id, length, file_id, bitrate, mbid  , starred                  , rating, genre_id, play_count, last_played              , created                  , updated)
VALUES (1 , 'alice', 'Foobar', 1     , 1   , 1975, 1        , 1       , 355   , 1      , 320    , 'mb-1', '2024-01-07 10:00:00.000', 5     , 1       , 3         , '2024-01-10 10:00:00.000', '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000')
     , (2 , 'alice', 'Barfoo', 2     , 1   , 1979, 2        , 2       , 210   , 2      , 192    , null  , null                     , 0     , 2       , 0         , null                     , '2024-01-02 00:00:00.000', '2024-01-03 00:00:00.000')
     , (3 , 'alice', 'Baz'   , 3     , 2   , 1975, 1        , 1       , 180   , 3      , 900    , null  , null                     , 2     , null    , 1         , '2024-02-01 20:00:00.000', '2024-01-03 00:00:00.000', '2024-01-04 00:00:00.000')
     , (4 , 'bob'  , 'Foobar', 1     , 1   , 1980, 3        , 3       , 300   , 4      , 256    , null  , null                     , 0     , 3       , 9         , '2024-03-01 00:00:00.000', '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000');

INSERT INTO playlists
       (id, user_id, name     , track_ids, comment     , starred, rating, created                  , updated)
VALUES (1 , 'alice', 'Driving', '|1|3|'  , 'road songs', null   , 0     , '2024-01-05 00:00:00.000', '2024-01-05 00:00:00.000')
     , (2 , 'bob'  , 'Evening', '|4|'    , null        , null   , 0     , '2024-01-05 00:00:00.000', '2024-01-05 00:00:00.000');

INSERT INTO podcast_channels
       (id, user_id, rss_url                    , rss_hash, title      , link_url, published                , author, description, image_url, update_checked           , starred, rating, created                  , updated)
VALUES (1 , 'alice', 'https://example.org/feed' , 'p1'    , 'Tech Talk', null    , '2024-01-20 06:00:00.000', 'Ada' , null       , null     , '2024-02-01 00:00:00.000', null   , 0     , '2024-01-20 00:00:00.000', '2024-01-20 00:00:00.000');

INSERT INTO podcast_episodes
       (id, user_id, channel_id, guid_hash, title        , episode, stream_url                 , mimetype    , duration, published                , description, starred, rating, created                  , updated)
VALUES (1 , 'alice', 1         , 'g1'     , 'Episode One', 1      , 'https://example.org/1.mp3', 'audio/mpeg', 1800    , '2024-01-20 06:00:00.000', null       , null   , 0     , '2024-01-20 00:00:00.000', '2024-01-20 00:00:00.000')
     , (2 , 'alice', 1         , 'g2'     , 'Episode Two', 2      , 'https://example.org/2.mp3', 'audio/mpeg', 2400    , '2024-01-27 06:00:00.000', null       , null   , 0     , '2024-01-27 00:00:00.000', '2024-01-27 00:00:00.000');

INSERT INTO bookmarks
       (id, user_id, type, entry_id, position, comment  , created                  , updated)
VALUES (1 , 'alice', 2   , 1       , 120000  , 'halfway', '2024-01-21 00:00:00.000', '2024-01-21 00:00:00.000');

INSERT INTO radio_stations
       (id, user_id, name     , stream_url                      , home_url, created                  , updated)
VALUES (1 , 'alice', 'Jazz FM', 'https://example.org/jazz'      , null    , '2024-01-01 00:00:00.000', '2024-01-01 00:00:00.000');
"#,
    )
    .expect("failed to seed test data");

    conn
}
