//! Integration tests for the gateway's HTTP and WebSocket surface.
//!
//! These run against an in-process server with fake directory/store
//! collaborators; no database or broker is required.

mod helpers;

mod api_test;
mod ws_test;
