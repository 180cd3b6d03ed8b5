use thiserror::Error;

use crate::types::{RelayLine, TempC1000};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to drive {line} relay: {source}")]
    Write {
        line: &'static str,
        source: std::io::Error,
    },
    #[error("relay bank setup failed: {0}")]
    Setup(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("no temperature sensor found")]
    NoDevice,
    #[error("bad result from temperature sensor: {0}")]
    CrcFailed(String),
    #[error("temperature not found in: {0}")]
    MissingReading(String),
    #[error("can't read temperature value: {0}")]
    BadValue(String),
    #[error("sensor read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Actuator boundary: four named relay lines, each settable to a logical
/// on/off state. Implementations own the electrical polarity.
pub trait RelayBank {
    fn set_line(&mut self, line: RelayLine, on: bool) -> Result<(), RelayError>;
}

/// Sensor boundary: produces the current temperature or a typed failure.
pub trait TemperatureSource {
    fn read(&mut self) -> Result<TempC1000, SensorError>;
}
