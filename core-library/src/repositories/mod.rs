//! # Repository Pattern Implementation
//!
//! Read/write access to setlists and the songs they contain.
//!
//! - Traits define the interface for each repository
//! - SQLite implementations use sqlx for async database access
//!
//! Repositories never reorder songs; position changes go through
//! [`crate::SetlistPositionManager`].

pub mod setlist;
pub mod setlist_song;

pub use setlist::{SetlistRepository, SqliteSetlistRepository};
pub use setlist_song::{SetlistSongRepository, SqliteSetlistSongRepository};
