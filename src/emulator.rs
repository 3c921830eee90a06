use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::error;

use crate::{
    payload,
    sensor::{Bme688Reading, DpReading, Sps30Reading},
    topic::DeviceTopics,
};

const FIRMWARE: &str = concat!("emu-", env!("CARGO_PKG_VERSION"));

/// Publish side of the broker client. The emulator only needs this one
/// operation, which also gives tests a seam for a scripted broker.
#[allow(async_fn_in_trait)]
pub trait Publisher {
    async fn publish(&self, topic: &str, payload: String, retained: bool) -> Result<()>;
}

/// One sensor position on a device: the two fixed sensors plus one slot per
/// configured differential-pressure channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    Bme688,
    Sps30,
    Dp(u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SensorState {
    Bme688(Bme688Reading),
    Sps30(Sps30Reading),
    Dp(DpReading),
}

#[derive(Debug)]
struct Device {
    name: String,
    topics: DeviceTopics,
}

/// Holds all simulated state and fans one tick out across every device and
/// slot. State is keyed by (device, slot) so each signal evolves from its own
/// previous reading and nothing else.
#[derive(Debug)]
pub struct Emulator<R: Rng> {
    devices: Vec<Device>,
    channels: Vec<u32>,
    states: HashMap<(usize, Slot), SensorState>,
    rng: R,
}

impl<R: Rng> Emulator<R> {
    pub fn new(site: &str, room: &str, device_names: &[String], channels: &[u32], rng: R) -> Self {
        let devices = device_names
            .iter()
            .map(|name| Device {
                name: name.clone(),
                topics: DeviceTopics::new(site, room, name),
            })
            .collect();

        Self {
            devices,
            channels: channels.to_vec(),
            states: HashMap::new(),
            rng,
        }
    }

    /// Publishes the retained online statuses, then drives ticks until `stop`
    /// completes, finishing with retained offline statuses. `stop` is only
    /// observed between ticks, so a tick in flight always runs to completion
    /// and nothing is published after the offline statuses.
    pub async fn run<P: Publisher>(
        &mut self,
        publisher: &P,
        interval: Duration,
        status_refresh: Duration,
        stop: impl Future<Output = ()>,
        now: impl Fn() -> String,
    ) {
        self.publish_status(publisher, true, &now()).await;

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last_status = Instant::now();
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let ts = now();
                    self.tick(publisher, &ts).await;

                    if last_status.elapsed() >= status_refresh {
                        self.publish_status(publisher, true, &ts).await;
                        last_status = Instant::now();
                    }
                }
                _ = &mut stop => break,
            }
        }

        self.publish_status(publisher, false, &now()).await;
    }

    /// Generates and publishes one reading per device per slot. A failed
    /// publish is logged and skipped; the rest of the tick proceeds, and the
    /// simulated state advances either way.
    pub async fn tick<P: Publisher>(&mut self, publisher: &P, ts: &str) {
        let slots: Vec<Slot> = [Slot::Bme688, Slot::Sps30]
            .into_iter()
            .chain(self.channels.iter().map(|&ch| Slot::Dp(ch)))
            .collect();

        for device_index in 0..self.devices.len() {
            for &slot in &slots {
                let state = self.advance(device_index, slot);
                let device = &self.devices[device_index];

                let topic = match slot {
                    Slot::Bme688 => device.topics.bme688(),
                    Slot::Sps30 => device.topics.sps30(),
                    Slot::Dp(channel) => device.topics.dp(channel),
                };

                let encoded = match encode(&state, ts) {
                    Ok(p) => p,
                    Err(err) => {
                        error!(device = %device.name, topic = %topic, "{err:#}");
                        continue;
                    }
                };

                if let Err(err) = publisher.publish(&topic, encoded, false).await {
                    error!(device = %device.name, topic = %topic, "{err:#}");
                }
            }
        }
    }

    /// Publishes the retained liveness message for every device.
    pub async fn publish_status<P: Publisher>(&mut self, publisher: &P, online: bool, ts: &str) {
        for device in &self.devices {
            let rssi_dbm = self.rng.gen_range(-70..=-45);
            let encoded = match payload::status(online, FIRMWARE, rssi_dbm, ts) {
                Ok(p) => p,
                Err(err) => {
                    error!(device = %device.name, "{err:#}");
                    continue;
                }
            };

            let topic = device.topics.status();
            if let Err(err) = publisher.publish(&topic, encoded, true).await {
                error!(device = %device.name, topic = %topic, "{err:#}");
            }
        }
    }

    fn advance(&mut self, device_index: usize, slot: Slot) -> SensorState {
        let prev = self.states.get(&(device_index, slot)).copied();
        let next = match (slot, prev) {
            (Slot::Bme688, Some(SensorState::Bme688(r))) => {
                SensorState::Bme688(r.next(&mut self.rng))
            }
            (Slot::Bme688, _) => SensorState::Bme688(Bme688Reading::initial(&mut self.rng)),
            (Slot::Sps30, Some(SensorState::Sps30(r))) => SensorState::Sps30(r.next(&mut self.rng)),
            (Slot::Sps30, _) => SensorState::Sps30(Sps30Reading::initial(&mut self.rng)),
            (Slot::Dp(ch), Some(SensorState::Dp(r))) => SensorState::Dp(r.next(ch, &mut self.rng)),
            (Slot::Dp(ch), _) => SensorState::Dp(DpReading::initial(ch, &mut self.rng)),
        };
        self.states.insert((device_index, slot), next);
        next
    }
}

fn encode(state: &SensorState, ts: &str) -> Result<String> {
    match state {
        SensorState::Bme688(r) => payload::bme688(r, ts),
        SensorState::Sps30(r) => payload::sps30(r, ts),
        SensorState::Dp(r) => payload::dp(r, ts),
    }
}
