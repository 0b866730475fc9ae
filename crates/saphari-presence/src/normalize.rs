//! Topic and payload normalization.
//!
//! Devices report status in several wire variants (`"online"`, `"1"`,
//! `"true"`, LWT `"offline"`, …). Downstream consumers get a single
//! canonical topic per device (`<prefix>/<device>/status/online`) and a
//! two-value payload, independent of the raw format.

/// Channel segment that carries explicit status payloads.
const STATUS_CHANNEL: &str = "status";

/// Payload variants interpreted as "online" (case-insensitive, trimmed).
pub fn is_online_payload(payload: &str) -> bool {
    matches!(
        payload.trim().to_ascii_lowercase().as_str(),
        "online" | "1" | "true"
    )
}

/// Whether the topic addresses a device's status channel.
///
/// Matches both the raw `<prefix>/<device>/status` topic and the
/// canonical `<prefix>/<device>/status/online` form.
pub fn is_status_topic(topic: &str) -> bool {
    topic.split('/').nth(2) == Some(STATUS_CHANNEL)
}

/// The canonical status topic for a device.
pub fn canonical_status_topic(prefix: &str, device_id: &str) -> String {
    format!("{prefix}/{device_id}/{STATUS_CHANNEL}/online")
}

/// Normalize a topic/payload pair.
///
/// Status topics collapse to the canonical topic with an
/// `"online"`/`"offline"` payload; all other topics pass through
/// unchanged. Idempotent: applying this twice yields the same result as
/// applying it once.
pub fn normalize_topic_payload(topic: &str, payload: &str) -> (String, String) {
    let mut segments = topic.split('/');
    let (Some(prefix), Some(device_id), Some(channel)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return (topic.to_string(), payload.to_string());
    };

    if channel != STATUS_CHANNEL {
        return (topic.to_string(), payload.to_string());
    }

    let normalized_payload = if is_online_payload(payload) {
        "online"
    } else {
        "offline"
    };

    (
        canonical_status_topic(prefix, device_id),
        normalized_payload.to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_online_payload_variants() {
        assert!(is_online_payload("online"));
        assert!(is_online_payload("ONLINE"));
        assert!(is_online_payload(" 1 "));
        assert!(is_online_payload("True"));
        assert!(!is_online_payload("offline"));
        assert!(!is_online_payload("0"));
        assert!(!is_online_payload(""));
    }

    #[test]
    fn test_status_topic_detection() {
        assert!(is_status_topic("saphari/pump-1/status"));
        assert!(is_status_topic("saphari/pump-1/status/online"));
        assert!(!is_status_topic("saphari/pump-1/telemetry"));
        assert!(!is_status_topic("saphari/pump-1"));
    }

    #[test]
    fn test_status_variants_collapse() {
        assert_eq!(
            normalize_topic_payload("saphari/pump-1/status", "1"),
            (
                "saphari/pump-1/status/online".to_string(),
                "online".to_string()
            )
        );
        assert_eq!(
            normalize_topic_payload("saphari/pump-1/status", "offline"),
            (
                "saphari/pump-1/status/online".to_string(),
                "offline".to_string()
            )
        );
    }

    #[test]
    fn test_non_status_topics_pass_through() {
        let (topic, payload) =
            normalize_topic_payload("saphari/pump-1/telemetry", r#"{"tempC":25.3}"#);
        assert_eq!(topic, "saphari/pump-1/telemetry");
        assert_eq!(payload, r#"{"tempC":25.3}"#);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            ("saphari/pump-1/status", "TRUE"),
            ("saphari/pump-1/status", "offline"),
            ("saphari/pump-1/status/online", "online"),
            ("saphari/pump-1/telemetry", "42"),
            ("garbage", "x"),
        ];
        for (topic, payload) in inputs {
            let once = normalize_topic_payload(topic, payload);
            let twice = normalize_topic_payload(&once.0, &once.1);
            assert_eq!(once, twice, "normalization must be idempotent");
        }
    }
}
