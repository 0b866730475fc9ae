//! Topic layout shared by devices and the gateway.
//!
//! Every device channel lives under a common prefix:
//! `<prefix>/<deviceId>/<channel>`. Commands flow the other way on
//! `<prefix>/<deviceId>/cmd/<command>`.

/// Device-to-gateway channels the client subscribes to.
pub const DEVICE_CHANNELS: [&str; 5] = ["telemetry", "state", "status", "ack", "heartbeat"];

/// The fixed subscription pattern set for a topic prefix.
pub fn subscription_patterns(prefix: &str) -> Vec<String> {
    DEVICE_CHANNELS
        .iter()
        .map(|channel| format!("{prefix}/+/{channel}"))
        .collect()
}

/// Extract the device id (second path segment) from a topic under the
/// given prefix. Returns `None` for topics outside the prefix or with no
/// channel segment.
pub fn device_id_from_topic<'t>(prefix: &str, topic: &'t str) -> Option<&'t str> {
    let rest = topic.strip_prefix(prefix)?.strip_prefix('/')?;
    let mut segments = rest.split('/');
    let device_id = segments.next()?;
    // A bare `<prefix>/<deviceId>` with no channel is malformed.
    segments.next()?;
    if device_id.is_empty() {
        return None;
    }
    Some(device_id)
}

/// The command topic for a device.
pub fn command_topic(prefix: &str, device_id: &str, command: &str) -> String {
    format!("{prefix}/{device_id}/cmd/{command}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_patterns_cover_all_channels() {
        let patterns = subscription_patterns("saphari");
        assert_eq!(patterns.len(), 5);
        assert!(patterns.contains(&"saphari/+/telemetry".to_string()));
        assert!(patterns.contains(&"saphari/+/status".to_string()));
        assert!(patterns.contains(&"saphari/+/heartbeat".to_string()));
    }

    #[test]
    fn test_device_id_extraction() {
        assert_eq!(
            device_id_from_topic("saphari", "saphari/pump-1/status"),
            Some("pump-1")
        );
        assert_eq!(
            device_id_from_topic("saphari", "saphari/valve-2/telemetry/extra"),
            Some("valve-2")
        );
    }

    #[test]
    fn test_malformed_topics_rejected() {
        assert_eq!(device_id_from_topic("saphari", "saphari/pump-1"), None);
        assert_eq!(device_id_from_topic("saphari", "saphari//status"), None);
        assert_eq!(device_id_from_topic("saphari", "other/pump-1/status"), None);
        assert_eq!(device_id_from_topic("saphari", "saphari"), None);
    }

    #[test]
    fn test_command_topic_shape() {
        assert_eq!(
            command_topic("saphari", "pump-1", "gpio"),
            "saphari/pump-1/cmd/gpio"
        );
    }
}
