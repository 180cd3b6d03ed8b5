pub mod config;
pub mod engine;
pub mod hardware;
pub mod protocol;
pub mod types;

pub use config::{ControlConfig, RangeConfig, RelayPinConfig, RuntimeConfig, SensorConfig, ServerConfig};
pub use engine::HvacController;
pub use hardware::{RelayBank, RelayError, SensorError, TemperatureSource};
pub use protocol::{Command, CommandError, StatusSnapshot};
pub use types::{fmt_degf, temp_from_degf, Mode, RelayLine, RelayVector, TargetRange, TempC1000};
