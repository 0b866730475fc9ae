//! MQTT transport client.
//!
//! One connection to the broker for the whole gateway. The event loop
//! re-subscribes on every successful (re)connect; publishing fails fast
//! while the connection is down instead of queuing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use saphari_core::config::broker::BrokerConfig;
use saphari_core::error::{AppError, ErrorKind};
use saphari_core::result::AppResult;

use crate::dispatch::InboundDispatcher;
use crate::topics::{command_topic, subscription_patterns};

/// Cheap-to-clone handle for publishing to the broker.
#[derive(Clone)]
pub struct BrokerClient {
    /// The underlying MQTT client.
    client: AsyncClient,
    /// Whether the connection is currently established.
    connected: Arc<AtomicBool>,
    /// Topic prefix for command topics.
    topic_prefix: String,
}

impl std::fmt::Debug for BrokerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerClient")
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl BrokerClient {
    /// Create the client handle and its event loop.
    ///
    /// Nothing touches the network until the returned [`BrokerEventLoop`]
    /// is run.
    pub fn new(config: &BrokerConfig, dispatcher: InboundDispatcher) -> (Self, BrokerEventLoop) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.host.clone(),
            config.port,
        );
        options.set_keep_alive(Duration::from_secs(config.keep_alive_seconds));
        if let (Some(username), Some(password)) =
            (config.username.as_ref(), config.password.as_ref())
        {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 64);
        let connected = Arc::new(AtomicBool::new(false));

        let handle = Self {
            client: client.clone(),
            connected: connected.clone(),
            topic_prefix: config.topic_prefix.clone(),
        };

        let event_loop = BrokerEventLoop {
            event_loop,
            client,
            connected,
            topic_prefix: config.topic_prefix.clone(),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_seconds),
            dispatcher,
        };

        (handle, event_loop)
    }

    /// Whether the broker connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Publish a payload to a topic.
    ///
    /// Rejects immediately while the connection is down — callers treat
    /// this as a transient failure and retry at their own layer.
    pub async fn publish(&self, topic: &str, payload: &str) -> AppResult<()> {
        if !self.is_connected() {
            return Err(AppError::service_unavailable(
                "Broker connection is currently down",
            ));
        }

        self.client
            .publish(topic, QoS::AtMostOnce, false, payload.as_bytes().to_vec())
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Broker, format!("Failed to publish: {e}"), e)
            })
    }

    /// Publish a command to a device's command channel.
    pub async fn publish_command(
        &self,
        device_id: &str,
        command: &str,
        payload: &str,
    ) -> AppResult<()> {
        let topic = command_topic(&self.topic_prefix, device_id, command);
        self.publish(&topic, payload).await
    }
}

/// Owns the rumqttc event loop and drives the connection.
pub struct BrokerEventLoop {
    /// The polled connection state machine.
    event_loop: EventLoop,
    /// Client handle used for re-subscription.
    client: AsyncClient,
    /// Shared connection flag.
    connected: Arc<AtomicBool>,
    /// Topic prefix for the subscription patterns.
    topic_prefix: String,
    /// Fixed delay before re-dialing after a connection error.
    reconnect_delay: Duration,
    /// Pipeline for inbound messages.
    dispatcher: InboundDispatcher,
}

impl std::fmt::Debug for BrokerEventLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerEventLoop")
            .field("topic_prefix", &self.topic_prefix)
            .finish()
    }
}

impl BrokerEventLoop {
    /// Drive the connection until the shutdown signal flips.
    ///
    /// Connection errors mark the client disconnected, wait the fixed
    /// reconnect delay, and re-enter the poll loop (which re-dials); each
    /// successful connect re-subscribes the full pattern set. Shutdown
    /// exits without reconnecting.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                event = self.event_loop.poll() => match event {
                    Ok(Event::Incoming(Packet::ConnAck(_))) => {
                        self.connected.store(true, Ordering::SeqCst);
                        info!("Connected to broker");
                        self.subscribe_all().await;
                    }
                    Ok(Event::Incoming(Packet::Publish(publish))) => {
                        self.dispatcher.dispatch(&publish.topic, &publish.payload).await;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let was_connected = self.connected.swap(false, Ordering::SeqCst);
                        if was_connected {
                            warn!(error = %e, "Broker connection lost");
                        } else {
                            debug!(error = %e, "Broker connect attempt failed");
                        }
                        tokio::select! {
                            _ = time::sleep(self.reconnect_delay) => {}
                            _ = shutdown.changed() => {
                                if *shutdown.borrow() {
                                    break;
                                }
                            }
                        }
                    }
                },
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        self.connected.store(false, Ordering::SeqCst);
        let _ = self.client.disconnect().await;
        info!("Broker event loop stopped");
    }

    async fn subscribe_all(&mut self) {
        for pattern in subscription_patterns(&self.topic_prefix) {
            if let Err(e) = self.client.subscribe(pattern.clone(), QoS::AtMostOnce).await {
                warn!(pattern = %pattern, error = %e, "Failed to subscribe");
            } else {
                debug!(pattern = %pattern, "Subscribed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use saphari_core::config::presence::PresenceConfig;
    use saphari_core::traits::{
        AccessResolver, BroadcastEvent, DeviceMessageHandler, EventBroadcaster, PresenceStore,
    };
    use saphari_presence::tracker::PresenceTracker;

    #[derive(Debug)]
    struct Null;

    #[async_trait]
    impl PresenceStore for Null {
        async fn append_presence_event(
            &self,
            _d: &str,
            _o: bool,
            _t: DateTime<Utc>,
        ) -> AppResult<()> {
            Ok(())
        }
        async fn upsert_device_presence(
            &self,
            _d: &str,
            _o: bool,
            _t: DateTime<Utc>,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    #[async_trait]
    impl EventBroadcaster for Null {
        async fn broadcast_to_users(&self, _u: &HashSet<Uuid>, _e: &BroadcastEvent) {}
    }

    #[async_trait]
    impl AccessResolver for Null {
        async fn resolve(&self, _d: &str) -> Arc<HashSet<Uuid>> {
            Arc::new(HashSet::new())
        }
        fn invalidate(&self, _d: &str) {}
    }

    #[async_trait]
    impl DeviceMessageHandler for Null {
        async fn handle(
            &self,
            _d: &str,
            _t: &str,
            _p: &str,
            _a: Arc<HashSet<Uuid>>,
        ) -> AppResult<()> {
            Ok(())
        }
    }

    fn make_client() -> BrokerClient {
        let null = Arc::new(Null);
        let presence = Arc::new(PresenceTracker::new(
            null.clone(),
            null.clone(),
            null.clone(),
            "saphari",
            PresenceConfig::default(),
        ));
        let dispatcher = InboundDispatcher::new("saphari", null.clone(), presence, null);
        let (client, _event_loop) = BrokerClient::new(&BrokerConfig::default(), dispatcher);
        client
    }

    #[tokio::test]
    async fn test_publish_rejected_while_disconnected() {
        let client = make_client();
        assert!(!client.is_connected());

        let result = client.publish("saphari/pump-1/cmd/gpio", "{}").await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);
    }

    #[tokio::test]
    async fn test_publish_command_rejected_while_disconnected() {
        let client = make_client();
        let result = client.publish_command("pump-1", "gpio", "{}").await;
        assert!(result.is_err());
    }
}
