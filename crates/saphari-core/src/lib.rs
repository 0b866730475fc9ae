//! # saphari-core
//!
//! Core crate for the Saphari gateway. Contains the seam traits between
//! the broker transport, access resolution, presence tracking, and
//! WebSocket fan-out, plus configuration schemas and the unified error
//! system.
//!
//! This crate has **no** internal dependencies on other Saphari crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;
