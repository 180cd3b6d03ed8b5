use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use pistat_common::{Mode, RelayBank, RelayError, RelayLine, RelayPinConfig, RelayVector};

/// Drives the relay board through the kernel's sysfs GPIO interface.
///
/// The relays are normally-closed and active-low: a line energizes when
/// its pin goes low. The changeover line is the exception; its pin
/// carries the logical heat-select value directly (open = heat), which
/// is also its safe resting level.
pub struct SysfsRelayBank {
    base: PathBuf,
    pins: RelayPinConfig,
}

impl SysfsRelayBank {
    pub fn open(pins: &RelayPinConfig) -> Result<Self, RelayError> {
        Self::open_at(Path::new("/sys/class/gpio"), pins)
    }

    pub fn open_at(base: &Path, pins: &RelayPinConfig) -> Result<Self, RelayError> {
        let mut bank = Self {
            base: base.to_path_buf(),
            pins: pins.clone(),
        };

        // every line must reach the de-energized pattern before the
        // controller is allowed to exist
        for (line, on) in RelayVector::for_mode(Mode::Off).lines() {
            bank.export(line)?;
            fs::write(bank.pin_dir(line).join("direction"), "out")?;
            bank.set_line(line, on)?;
        }

        info!("relay bank ready, all lines de-energized");
        Ok(bank)
    }

    fn pin(&self, line: RelayLine) -> u32 {
        match line {
            RelayLine::HeatSelect => self.pins.heat_select,
            RelayLine::Compressor => self.pins.compressor,
            RelayLine::SecondStage => self.pins.second_stage,
            RelayLine::Fan => self.pins.fan,
        }
    }

    fn pin_dir(&self, line: RelayLine) -> PathBuf {
        self.base.join(format!("gpio{}", self.pin(line)))
    }

    fn export(&self, line: RelayLine) -> Result<(), RelayError> {
        if self.pin_dir(line).is_dir() {
            return Ok(());
        }
        fs::write(self.base.join("export"), self.pin(line).to_string())?;
        Ok(())
    }
}

impl RelayBank for SysfsRelayBank {
    fn set_line(&mut self, line: RelayLine, on: bool) -> Result<(), RelayError> {
        let level = if line == RelayLine::HeatSelect { on } else { !on };
        fs::write(
            self.pin_dir(line).join("value"),
            if level { "1" } else { "0" },
        )
        .map_err(|source| RelayError::Write {
            line: line.as_str(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_gpio_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for pin in [17, 27, 22, 10] {
            fs::create_dir(dir.path().join(format!("gpio{pin}"))).unwrap();
        }
        dir
    }

    fn read_value(dir: &Path, pin: u32) -> String {
        fs::read_to_string(dir.join(format!("gpio{pin}/value"))).unwrap()
    }

    #[test]
    fn open_leaves_every_line_de_energized() {
        let tree = fake_gpio_tree();
        SysfsRelayBank::open_at(tree.path(), &RelayPinConfig::default()).unwrap();

        // all pins high: relays open, changeover resting on heat
        for pin in [17, 27, 22, 10] {
            assert_eq!(read_value(tree.path(), pin), "1");
            assert_eq!(
                fs::read_to_string(tree.path().join(format!("gpio{pin}/direction"))).unwrap(),
                "out"
            );
        }
    }

    #[test]
    fn energizing_inverts_for_active_low_lines() {
        let tree = fake_gpio_tree();
        let mut bank = SysfsRelayBank::open_at(tree.path(), &RelayPinConfig::default()).unwrap();

        bank.set_line(RelayLine::Compressor, true).unwrap();
        bank.set_line(RelayLine::Fan, true).unwrap();
        assert_eq!(read_value(tree.path(), 27), "0");
        assert_eq!(read_value(tree.path(), 10), "0");

        // the changeover pin carries the logical value un-inverted
        bank.set_line(RelayLine::HeatSelect, false).unwrap();
        assert_eq!(read_value(tree.path(), 17), "0");
        bank.set_line(RelayLine::HeatSelect, true).unwrap();
        assert_eq!(read_value(tree.path(), 17), "1");
    }

    #[test]
    fn missing_gpio_tree_fails_setup() {
        let dir = tempfile::tempdir().unwrap();
        let result = SysfsRelayBank::open_at(&dir.path().join("nope"), &RelayPinConfig::default());

        assert!(matches!(result, Err(RelayError::Setup(_))));
    }
}
