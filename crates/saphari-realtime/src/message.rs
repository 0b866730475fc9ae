//! Handshake message type definitions.
//!
//! Broadcast payloads are not part of this enum — they use the stable
//! `{topic, payload, ts}` shape defined by
//! [`BroadcastEvent`](saphari_core::traits::BroadcastEvent).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Messages accepted from the client before authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// The authentication handshake. Must be the first accepted message.
    Auth {
        /// JWT access token.
        token: String,
    },
}

/// Handshake responses sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Authentication succeeded; the connection has joined its room.
    AuthOk {
        /// The authenticated user.
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
    /// Authentication failed; the connection will be closed.
    AuthError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_message_parses() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"auth","token":"abc"}"#).unwrap();
        let ClientMessage::Auth { token } = msg;
        assert_eq!(token, "abc");
    }

    #[test]
    fn test_non_auth_messages_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"subscribe"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"token":"abc"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("[]").is_err());
    }

    #[test]
    fn test_auth_ok_wire_shape() {
        let user_id = Uuid::new_v4();
        let json = serde_json::to_value(ServerMessage::AuthOk { user_id }).unwrap();
        assert_eq!(json["type"], "auth_ok");
        assert_eq!(json["userId"], user_id.to_string());
    }

    #[test]
    fn test_auth_error_wire_shape() {
        let json = serde_json::to_value(ServerMessage::AuthError).unwrap();
        assert_eq!(json, serde_json::json!({"type": "auth_error"}));
    }
}
