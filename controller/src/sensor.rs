use std::fs;
use std::path::PathBuf;

use tracing::debug;

use pistat_common::{SensorError, TempC1000, TemperatureSource};

/// Reads a DS18B20-family sensor through the kernel w1 driver's file
/// interface. The device path is cached after the first successful
/// discovery and dropped again on I/O failure so a re-probed bus
/// recovers without a restart.
pub struct W1Sensor {
    devices_dir: PathBuf,
    device: Option<PathBuf>,
}

impl W1Sensor {
    pub fn new(devices_dir: impl Into<PathBuf>) -> Self {
        Self {
            devices_dir: devices_dir.into(),
            device: None,
        }
    }

    fn discover(&mut self) -> Result<PathBuf, SensorError> {
        if let Some(path) = &self.device {
            return Ok(path.clone());
        }

        // 0x28 is the DS18B20 family code prefix
        for entry in fs::read_dir(&self.devices_dir)?.flatten() {
            if entry.file_name().to_string_lossy().starts_with("28") {
                let path = entry.path().join("w1_slave");
                debug!("temperature sensor at {}", path.display());
                self.device = Some(path.clone());
                return Ok(path);
            }
        }

        Err(SensorError::NoDevice)
    }
}

impl TemperatureSource for W1Sensor {
    fn read(&mut self) -> Result<TempC1000, SensorError> {
        let path = self.discover()?;
        let payload = match fs::read_to_string(&path) {
            Ok(payload) => payload,
            Err(err) => {
                self.device = None;
                return Err(err.into());
            }
        };
        parse_w1_payload(&payload)
    }
}

/// A w1_slave readout is two lines: a scratchpad dump ending in the CRC
/// verdict, then the same dump with `t=<millidegrees C>` appended.
pub fn parse_w1_payload(payload: &str) -> Result<TempC1000, SensorError> {
    let mut lines = payload.lines();

    let crc_line = lines.next().unwrap_or_default();
    if !crc_line.contains("YES") {
        return Err(SensorError::CrcFailed(crc_line.to_string()));
    }

    let data_line = lines.next().unwrap_or_default();
    let Some(index) = data_line.find("t=") else {
        return Err(SensorError::MissingReading(data_line.to_string()));
    };

    data_line[index + 2..]
        .trim_end()
        .parse()
        .map_err(|_| SensorError::BadValue(data_line.to_string()))
}
