//! Persistence of the clean table.
//!
//! - raw / clean CSV snapshots (`flatfile`)
//! - drop-and-rebuild SQLite store (`sqlite`)

pub mod flatfile;
pub mod sqlite;

pub use flatfile::*;
pub use sqlite::*;
