use tracing::debug;

use crate::config::ControlConfig;
use crate::hardware::{RelayBank, RelayError};
use crate::types::{fmt_degf, Mode, RelayVector, TargetRange, TempC1000};

/// Owns the operating mode and drives the relay bank from temperature
/// readings. Mode selection is hysteretic: a small dead-band stops
/// chatter near a bound, a large deviation (or a stalled single-stage
/// burn) escalates to second-stage heat.
pub struct HvacController<B: RelayBank> {
    relays: B,
    config: ControlConfig,
    mode: Mode,
    same_mode: u32,
    temp_prev: Option<TempC1000>,
}

impl<B: RelayBank> HvacController<B> {
    pub fn new(relays: B, config: ControlConfig) -> Self {
        Self {
            relays,
            config,
            mode: Mode::Off,
            same_mode: 0,
            temp_prev: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Consecutive decision cycles that reaffirmed the current mode.
    pub fn same_mode(&self) -> u32 {
        self.same_mode
    }

    /// One evaluation against a single bound. For heating calls a
    /// positive delta means "too cold"; cooling inverts the comparison.
    fn next_mode(&self, temp: TempC1000, wanted: TempC1000, want_heat: bool) -> Mode {
        let delta = wanted - temp;
        let mut mode = self.mode;

        // never run heat and cool at the same time
        let mismatched = if want_heat {
            mode == Mode::Cool
        } else {
            mode.is_heating()
        };
        if mismatched {
            mode = Mode::Off;
        }

        if mode != Mode::Off {
            // demand satisfied past the dead-band?
            let satisfied = if want_heat {
                delta <= -self.config.deadband_c1000
            } else {
                delta >= self.config.deadband_c1000
            };
            if satisfied {
                mode = Mode::Off;
            }
            // crank the heat when we fall out of small-adjustment range
            // or single-stage has been trying too long
            if want_heat
                && mode == Mode::Heat
                && (delta > self.config.large_delta_c1000
                    || self.same_mode > self.config.stall_cycles)
            {
                mode = Mode::Heat2;
            }
        } else if want_heat {
            if delta > self.config.large_delta_c1000 {
                mode = Mode::Heat2;
            } else if delta > self.config.deadband_c1000 {
                mode = Mode::Heat;
            }
        } else if delta < -self.config.deadband_c1000 {
            mode = Mode::Cool;
        }

        mode
    }

    /// Full decision for one reading: heating rules against the range
    /// minimum first, cooling rules against the maximum only when the
    /// heating side is satisfied.
    pub fn decide(&self, temp: TempC1000, range: TargetRange) -> Mode {
        let mode = self.next_mode(temp, range.min, true);
        if mode == Mode::Off {
            return self.next_mode(temp, range.max, false);
        }
        mode
    }

    /// Re-affirming the current mode only bumps the counter. A change
    /// writes the whole relay vector; nothing is committed unless every
    /// line write succeeds.
    pub fn apply_mode(&mut self, mode: Mode) -> Result<(), RelayError> {
        if mode == self.mode {
            self.same_mode = self.same_mode.saturating_add(1);
            return Ok(());
        }

        debug!(
            "setting mode to {mode} (was {} {}x)",
            self.mode, self.same_mode
        );
        for (line, on) in RelayVector::for_mode(mode).lines() {
            self.relays.set_line(line, on)?;
        }

        self.same_mode = 0;
        self.mode = mode;
        Ok(())
    }

    pub fn update_for_reading(
        &mut self,
        temp: TempC1000,
        range: TargetRange,
    ) -> Result<(), RelayError> {
        let mode = self.decide(temp, range);
        self.apply_mode(mode)?;

        if self.same_mode == 0 || self.temp_prev != Some(temp) {
            debug!(
                "current temperature {} -> [{}, {}]",
                fmt_degf(temp),
                fmt_degf(range.min),
                fmt_degf(range.max)
            );
        }

        self.temp_prev = Some(temp);
        Ok(())
    }

    /// Force everything off; the relays must never stay energized past
    /// the controller's lifetime.
    pub fn shutdown(&mut self) {
        if let Err(err) = self.apply_mode(Mode::Off) {
            tracing::error!("failed to de-energize relays on shutdown: {err}");
        }
    }
}
