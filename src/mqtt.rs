use std::time::Duration;

use anyhow::{Context as _, Result, anyhow, bail};
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::emulator::Publisher;

const EVENT_LOOP_CAPACITY: usize = 64;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub keepalive: Duration,
    pub connect_timeout: Duration,
}

/// Owns the broker connection. Reconnection after mid-run drops happens in a
/// background task with capped exponential backoff; callers only see publish
/// results.
pub struct BrokerClient {
    client: AsyncClient,
}

impl BrokerClient {
    /// Connects and waits for the broker's CONNACK under the configured
    /// timeout, then hands the event loop to a background task.
    pub async fn connect(settings: &BrokerSettings, client_id: &str) -> Result<Self> {
        let mut options = MqttOptions::new(client_id, &settings.host, settings.port);
        options.set_keep_alive(settings.keepalive);
        options.set_clean_session(true);
        if let Some(username) = &settings.username {
            options.set_credentials(username, settings.password.as_deref().unwrap_or(""));
        }

        let (client, mut event_loop) = AsyncClient::new(options, EVENT_LOOP_CAPACITY);

        timeout(settings.connect_timeout, wait_for_connack(&mut event_loop))
            .await
            .map_err(|_| {
                anyhow!(
                    "timed out connecting to mqtt://{}:{} after {:?}",
                    settings.host,
                    settings.port,
                    settings.connect_timeout
                )
            })??;

        info!(
            host = %settings.host,
            port = settings.port,
            "connected to broker"
        );

        tokio::spawn(drive_event_loop(event_loop));

        Ok(Self { client })
    }

    /// Disconnects, giving the broker at most `limit` to acknowledge.
    pub async fn disconnect(&self, limit: Duration) -> Result<()> {
        timeout(limit, self.client.disconnect())
            .await
            .map_err(|_| anyhow!("timed out disconnecting after {limit:?}"))?
            .context("failed to disconnect from broker")
    }
}

impl Publisher for BrokerClient {
    // Non-blocking: while the event loop is backing off through an outage the
    // request queue never drains, and a publish that awaited capacity would
    // stall the tick loop. A full queue fails the publish immediately instead.
    async fn publish(&self, topic: &str, payload: String, retained: bool) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, retained, payload)
            .with_context(|| format!("failed to publish to {topic}"))
    }
}

async fn wait_for_connack(event_loop: &mut EventLoop) -> Result<()> {
    loop {
        match event_loop.poll().await.context("broker connection failed")? {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code == ConnectReturnCode::Success {
                    return Ok(());
                }
                bail!("broker rejected connection: {:?}", ack.code);
            }
            _ => continue,
        }
    }
}

async fn drive_event_loop(mut event_loop: EventLoop) {
    let mut backoff = INITIAL_BACKOFF;
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("reconnected to broker");
                backoff = INITIAL_BACKOFF;
            }
            Ok(_) => {}
            Err(err) => {
                warn!("broker connection error: {err}; retrying in {backoff:?}");
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rumqttc::{AsyncClient, MqttOptions};

    use super::*;

    // A stalled event loop (as during outage backoff) must not turn publish
    // into a blocking call once the request queue fills up.
    #[tokio::test]
    async fn publish_fails_fast_when_request_queue_is_full() {
        let options = MqttOptions::new("test", "127.0.0.1", 1883);
        let (client, _event_loop) = AsyncClient::new(options, 4);
        let broker = BrokerClient { client };

        let mut failed = false;
        for i in 0..64 {
            if broker
                .publish("iot/home1/lab/a/telemetry/bme688", format!("{i}"), false)
                .await
                .is_err()
            {
                failed = true;
                break;
            }
        }
        assert!(failed, "publish kept succeeding with a stalled event loop");
    }
}
