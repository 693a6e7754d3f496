//! Database layer (SQLite).

pub mod schema;
pub mod sqlite;

pub use schema::SQLITE_INIT;
pub use sqlite::Database;
