use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use iot_emulator::mqtt::BrokerSettings;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Parser)]
#[command(about = "Publishes synthetic multi-sensor telemetry to an MQTT broker")]
pub struct Args {
    #[arg(long, env = "MQTT_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub port: u16,

    #[arg(long, env = "MQTT_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "MQTT_PASSWORD")]
    pub password: Option<String>,

    #[arg(long, default_value = "home1")]
    pub site: String,

    #[arg(long, default_value = "lab")]
    pub room: String,

    /// Comma-separated device identifiers.
    #[arg(long, default_value = "pico2w-01", value_delimiter = ',')]
    pub devices: Vec<String>,

    /// Comma-separated differential-pressure channel numbers.
    #[arg(long, default_value = "1,2", value_delimiter = ',')]
    pub dp_channels: Vec<u32>,

    /// Publish interval in seconds.
    #[arg(long, default_value_t = 5.0, allow_negative_numbers = true)]
    pub interval: f64,

    /// MQTT keepalive in seconds.
    #[arg(long, default_value_t = 30)]
    pub keepalive: u64,
}

#[derive(Debug)]
pub struct Config {
    pub broker: BrokerSettings,
    pub site: String,
    pub room: String,
    pub devices: Vec<String>,
    pub dp_channels: Vec<u32>,
    pub interval: Duration,
}

impl Args {
    pub fn into_config(self) -> Result<Config> {
        let devices: Vec<String> = self
            .devices
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
            .collect();
        if devices.is_empty() {
            bail!("device list is empty");
        }

        if let Some(ch) = self.dp_channels.iter().find(|&&ch| ch == 0) {
            bail!("dp channel must be a positive integer, got {ch}");
        }

        if !self.interval.is_finite() || self.interval <= 0.0 {
            bail!("interval must be a positive number of seconds, got {}", self.interval);
        }

        Ok(Config {
            broker: BrokerSettings {
                host: self.host,
                port: self.port,
                username: self.username,
                password: self.password,
                keepalive: Duration::from_secs(self.keepalive),
                connect_timeout: CONNECT_TIMEOUT,
            },
            site: self.site,
            room: self.room,
            devices,
            dp_channels: self.dp_channels,
            interval: Duration::from_secs_f64(self.interval),
        })
    }
}
