//! Database storage.

pub mod db;

pub use db::{create_pool, get_connection, DbConnection, DbPool};
