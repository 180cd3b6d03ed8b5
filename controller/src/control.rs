use std::time::Duration;

use tracing::{info, warn};

use pistat_common::{ControlConfig, HvacController, RelayBank, TemperatureSource};

use crate::state::AppState;

/// Poll-decide-actuate loop. Stop latency is bounded by the poll
/// interval; the relays are forced off before the loop returns.
pub async fn run<B, S>(
    state: AppState,
    mut controller: HvacController<B>,
    mut sensor: S,
    config: ControlConfig,
) where
    B: RelayBank,
    S: TemperatureSource,
{
    let mut interval = tokio::time::interval(Duration::from_secs(config.poll_interval_secs));
    let mut shutdown = state.shutdown.clone();

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = shutdown.changed() => break,
        }

        cycle(&state, &mut controller, &mut sensor).await;
    }

    controller.shutdown();
    info!("control loop stopped");
}

async fn cycle<B, S>(state: &AppState, controller: &mut HvacController<B>, sensor: &mut S)
where
    B: RelayBank,
    S: TemperatureSource,
{
    let range = { state.shared.lock().await.range };

    let temp = match sensor.read() {
        Ok(temp) => temp,
        Err(err) => {
            // no reading, no decision; next cycle may do better
            warn!("sensor read failed: {err}");
            return;
        }
    };

    let previous = controller.mode();
    if let Err(err) = controller.update_for_reading(temp, range) {
        warn!("relay update failed: {err}");
    }

    {
        let mut shared = state.shared.lock().await;
        shared.last_temp = Some(temp);
        shared.mode = controller.mode();
        shared.same_mode = controller.same_mode();
    }

    if controller.mode() != previous {
        // no subscriber connected is the normal case
        let _ = state.notify.send(format!("mode {}", controller.mode()));
    }
}
