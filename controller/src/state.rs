use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};

use pistat_common::{Mode, StatusSnapshot, TargetRange, TempC1000};

/// Observable state shared between the control loop and protocol
/// sessions. The control loop publishes the last reading and a mode
/// snapshot; sessions read everything and replace the target range.
pub struct Shared {
    pub last_temp: Option<TempC1000>,
    pub range: TargetRange,
    pub mode: Mode,
    pub same_mode: u32,
}

impl Shared {
    pub fn new(range: TargetRange) -> Self {
        Self {
            last_temp: None,
            range,
            mode: Mode::Off,
            same_mode: 0,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            last_temp: self.last_temp,
            range: self.range,
            mode: self.mode,
            same_mode: self.same_mode,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<Mutex<Shared>>,
    /// Mode-change fan-out to every connected session.
    pub notify: broadcast::Sender<String>,
    pub shutdown: watch::Receiver<bool>,
}

impl AppState {
    pub fn new(range: TargetRange, shutdown: watch::Receiver<bool>) -> Self {
        let (notify, _) = broadcast::channel(16);
        Self {
            shared: Arc::new(Mutex::new(Shared::new(range))),
            notify,
            shutdown,
        }
    }
}
