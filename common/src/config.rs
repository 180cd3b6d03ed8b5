use serde::{Deserialize, Serialize};

use crate::types::{temp_from_degf, TargetRange};

/// Decision tuning and loop cadence. Thresholds are in the 1000x-Celsius
/// scale: 200 is the 0.2C dead-band, 500 the large-deviation cutoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    pub deadband_c1000: i32,
    pub large_delta_c1000: i32,
    pub stall_cycles: u32,
    pub poll_interval_secs: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            deadband_c1000: 200,
            large_delta_c1000: 500,
            stall_cycles: 20,
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 10_000,
        }
    }
}

/// BCM pin numbers for the relay board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayPinConfig {
    pub heat_select: u32,
    pub compressor: u32,
    pub second_stage: u32,
    pub fan: u32,
}

impl Default for RelayPinConfig {
    fn default() -> Self {
        Self {
            heat_select: 17,
            compressor: 27,
            second_stage: 22,
            fan: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub w1_devices_dir: String,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            w1_devices_dir: "/sys/bus/w1/devices".to_string(),
        }
    }
}

/// Target range at startup, in whole degrees Fahrenheit. The running
/// range is only changed through the command protocol and is not
/// persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeConfig {
    pub min_degf: i32,
    pub max_degf: i32,
}

impl Default for RangeConfig {
    fn default() -> Self {
        Self {
            min_degf: 70,
            max_degf: 75,
        }
    }
}

impl RangeConfig {
    pub fn target_range(&self) -> TargetRange {
        TargetRange {
            min: temp_from_degf(self.min_degf),
            max: temp_from_degf(self.max_degf),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pins: RelayPinConfig,
    #[serde(default)]
    pub sensor: SensorConfig,
    #[serde(default)]
    pub range: RangeConfig,
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.control.deadband_c1000 = self.control.deadband_c1000.clamp(0, 5_000);
        self.control.large_delta_c1000 = self
            .control
            .large_delta_c1000
            .clamp(self.control.deadband_c1000, 20_000);
        self.control.stall_cycles = self.control.stall_cycles.max(1);
        self.control.poll_interval_secs = self.control.poll_interval_secs.clamp(1, 3_600);

        if self.range.min_degf > self.range.max_degf {
            std::mem::swap(&mut self.range.min_degf, &mut self.range.max_degf);
        }
    }
}
