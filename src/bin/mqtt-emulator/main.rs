mod args;

use std::future::Future;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context as _, Result};
use args::Args;
use chrono::{SecondsFormat, Utc};
use clap::Parser as _;
use iot_emulator::{emulator::Emulator, mqtt::BrokerClient};
use rand::{SeedableRng as _, rngs::StdRng};
use tracing::{info, warn};
use uuid::Uuid;

const STATUS_REFRESH: Duration = Duration::from_secs(60);
const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    if let Err(e) = run().await {
        eprintln!("{e:#}");
        return ExitCode::from(1);
    }

    ExitCode::from(0)
}

async fn run() -> Result<()> {
    let config = Args::parse()
        .into_config()
        .context("invalid configuration")?;

    let client_id = format!("emulator-{}", Uuid::new_v4().simple());
    let client = BrokerClient::connect(&config.broker, &client_id)
        .await
        .context("failed to connect to MQTT broker")?;

    let mut emulator = Emulator::new(
        &config.site,
        &config.room,
        &config.devices,
        &config.dp_channels,
        StdRng::from_entropy(),
    );

    info!(
        interval = ?config.interval,
        devices = config.devices.len(),
        dp_channels = ?config.dp_channels,
        "emulator started"
    );

    let stop = shutdown_signal()?;
    emulator
        .run(&client, config.interval, STATUS_REFRESH, stop, now_rfc3339)
        .await;

    info!("stop signal received, shutting down");
    if let Err(e) = client.disconnect(DISCONNECT_TIMEOUT).await {
        warn!("{e:#}");
    }

    Ok(())
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(unix)]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    use tokio::signal::{
        ctrl_c,
        unix::{SignalKind, signal},
    };

    let mut term = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    Ok(async move {
        tokio::select! {
            result = ctrl_c() => {
                if let Err(e) = result {
                    warn!("failed to listen for ctrl-c: {e}");
                }
            }
            _ = term.recv() => {}
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl Future<Output = ()>> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {e}");
        }
    })
}
