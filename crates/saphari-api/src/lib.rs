//! # saphari-api
//!
//! HTTP layer for the Saphari gateway built on Axum.
//!
//! Provides the WebSocket upgrade into the fan-out engine, health
//! endpoints, the device command endpoint, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
