//! # Setlist Library Module
//!
//! Owns the setlist database and keeps song positions dense and unique.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite schema and migrations for setlists
//! - Repository patterns for setlists and their songs
//! - [`SetlistPositionManager`], the transactional insert/remove/move
//!   algorithm that keeps every setlist ordered `1..=n`

pub mod db;
pub mod error;
pub mod models;
pub mod positions;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::{Setlist, SetlistSong};
pub use positions::SetlistPositionManager;
