//! # saphari-auth
//!
//! Authentication and authorization for the Saphari gateway:
//!
//! - JWT access token verification for WebSocket handshakes and HTTP calls
//! - Device access resolution (device id → authorized user set) with a
//!   TTL cache, negative caching, and single-flight de-duplication of
//!   concurrent directory lookups

pub mod access;
pub mod jwt;

pub use access::resolver::CachedAccessResolver;
pub use jwt::verifier::JwtVerifier;
