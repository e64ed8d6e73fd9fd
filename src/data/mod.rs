//! Data acquisition and storage
//!
//! Clients for the nflverse and pro-football-reference sources plus the
//! SQLite stores each pipeline writes into.

pub mod nflverse_db;
pub mod pfr_db;
pub mod sources;

pub use nflverse_db::NflverseDb;
pub use pfr_db::PfrDb;
