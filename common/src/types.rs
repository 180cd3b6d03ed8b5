use std::fmt;

/// Temperature as 1000x degrees centigrade, the scale the w1 kernel
/// driver reports natively.
pub type TempC1000 = i32;

pub const fn temp_from_degf(degf: i32) -> TempC1000 {
    (degf - 32) * 5000 / 9
}

/// Render as degrees Fahrenheit with one decimal, the display unit of the
/// wire protocol. Rounds to the nearest tenth.
pub fn fmt_degf(temp: TempC1000) -> String {
    // widen before scaling so arbitrary set-command inputs cannot overflow
    let tenths = (i64::from(temp) * 9 / 5 + 32_050) / 100;
    let sign = if tenths < 0 { "-" } else { "" };
    let tenths = tenths.abs();
    format!("{sign}{}.{}", tenths / 10, tenths % 10)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Off,
    Cool,
    Heat,
    /// Emergency / second-stage heat.
    Heat2,
    /// Manual fan-only; never selected by the automatic decision path.
    Fan,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Cool => "cool",
            Self::Heat => "heat",
            Self::Heat2 => "heat2",
            Self::Fan => "fan",
        }
    }

    pub fn is_heating(self) -> bool {
        matches!(self, Self::Heat | Self::Heat2)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetRange {
    pub min: TempC1000,
    pub max: TempC1000,
}

/// The four relay lines of a conventional single-zone air handler, by
/// their thermostat wire labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayLine {
    /// "O/B" changeover: selects heating vs cooling direction.
    HeatSelect,
    /// "Y": compressor / first-stage call.
    Compressor,
    /// "W2"/"E": second-stage heat strips.
    SecondStage,
    /// "G": blower fan.
    Fan,
}

impl RelayLine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeatSelect => "heat-select",
            Self::Compressor => "compressor",
            Self::SecondStage => "second-stage",
            Self::Fan => "fan",
        }
    }
}

impl fmt::Display for RelayLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical output pattern that realizes a mode. When stage-2 heat runs,
/// so does the compressor; whenever heat or cool runs, so does the fan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayVector {
    pub heat_select: bool,
    pub compressor: bool,
    pub second_stage: bool,
    pub fan: bool,
}

impl RelayVector {
    pub fn for_mode(mode: Mode) -> Self {
        let mut vector = Self {
            heat_select: true,
            compressor: false,
            second_stage: false,
            fan: true,
        };

        match mode {
            Mode::Off => vector.fan = false,
            Mode::Cool => {
                vector.heat_select = false;
                vector.compressor = true;
            }
            Mode::Heat => vector.compressor = true,
            Mode::Heat2 => {
                vector.compressor = true;
                vector.second_stage = true;
            }
            Mode::Fan => {}
        }

        vector
    }

    pub fn lines(self) -> [(RelayLine, bool); 4] {
        [
            (RelayLine::HeatSelect, self.heat_select),
            (RelayLine::Compressor, self.compressor),
            (RelayLine::SecondStage, self.second_stage),
            (RelayLine::Fan, self.fan),
        ]
    }
}
