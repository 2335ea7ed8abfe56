//! Core database infrastructure
//!
//! - `DatabaseConn`: SQLite connection wrapper with WAL and foreign keys enabled

mod connection;

pub use connection::DatabaseConn;
