//! # saphari-database
//!
//! PostgreSQL connection pool management, embedded migrations, and the
//! repositories implementing the gateway's directory and presence-store
//! seams.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
