//! WebSocket close codes used by the fan-out server.

/// Sent when the authentication handshake times out or fails.
pub const UNAUTHORIZED: u16 = 4401;

/// Sent when a client frame exceeds the accepted size cap.
pub const MESSAGE_TOO_BIG: u16 = 1009;
