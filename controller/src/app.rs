use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};

use pistat_common::{HvacController, RuntimeConfig};

use crate::control;
use crate::relays::SysfsRelayBank;
use crate::sensor::W1Sensor;
use crate::server;
use crate::state::AppState;

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = load_config();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let state = AppState::new(config.range.target_range(), shutdown_rx);

    // a controller without working relays must not run at all; the
    // command server stays up so the device remains inspectable
    let control_task = match SysfsRelayBank::open(&config.pins) {
        Ok(bank) => {
            let controller = HvacController::new(bank, config.control.clone());
            let sensor = W1Sensor::new(&config.sensor.w1_devices_dir);
            Some(tokio::spawn(control::run(
                state.clone(),
                controller,
                sensor,
                config.control.clone(),
            )))
        }
        Err(err) => {
            error!("relay initialization failed, control loop disabled: {err}");
            None
        }
    };

    let listener = server::bind(&config.server).await?;
    info!("control server listening on {}", listener.local_addr()?);
    let server_task = tokio::spawn(server::serve(listener, state.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutdown requested");
    let _ = shutdown_tx.send(true);

    // stop the control loop first so the relays land in the safe state,
    // then stop serving sessions
    if let Some(task) = control_task {
        task.await.context("control loop panicked")?;
    }
    server_task.await.context("server task panicked")?;

    Ok(())
}

fn load_config() -> RuntimeConfig {
    let mut config = match std::env::var("PISTAT_CONFIG") {
        Ok(path) => match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|err| {
                warn!("failed to parse config at {path}: {err}");
                RuntimeConfig::default()
            }),
            Err(err) => {
                warn!("failed to read config at {path}: {err}");
                RuntimeConfig::default()
            }
        },
        Err(_) => RuntimeConfig::default(),
    };

    if let Ok(port) = std::env::var("PISTAT_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("ignoring invalid PISTAT_PORT value: {port}"),
        }
    }

    config.sanitize();
    config
}
