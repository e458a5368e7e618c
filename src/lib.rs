//! aria is the entity store of a multi-user media-library server: a generic
//! per-user data-access layer over SQLite plus the advanced-search compiler that
//! turns protocol rule triples into parameterized SQL.
//!
//! Protocol front-ends, the filesystem scanner and the podcast fetcher live in
//! other crates; they talk to the library exclusively through [`mapper::Mapper`]
//! and the entity kinds defined here.

pub mod albums;
pub mod ampache;
pub mod artists;
pub mod bookmarks;
pub mod common;
pub mod config;
pub mod db;
pub mod dialect;
pub mod entity;
pub mod errors;
pub mod genres;
pub mod mapper;
pub mod playlists;
pub mod podcasts;
pub mod radio;
pub mod random;
pub mod rules;
pub mod testing;
pub mod tracks;

pub use errors::{AriaError, Result};
pub use mapper::{Mapper, Paging, TimeRange};

#[cfg(test)]
mod ampache_test;
#[cfg(test)]
mod artists_test;
#[cfg(test)]
mod mapper_test;
