use std::str::FromStr;

use strum_macros::EnumIter;
use thiserror::Error;

pub const MIN_TEMPERATURE: u8 = 16;
pub const MAX_TEMPERATURE: u8 = 30;

/// Operating mode. `Off` is a mode rather than a separate power flag: the
/// power bit of the command frame is derived from it.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, EnumIter)]
pub enum Mode {
    Off,
    Heat,
    Cool,
    Dry,
    FanOnly,
    Auto,
}

impl Mode {
    /// Protocol code carried in byte 3. `Off` shares the heat code; the
    /// cleared power bit is what actually powers the unit down.
    pub fn code(self) -> u8 {
        match self {
            Mode::Off => 0x00,
            Mode::Heat => 0x00,
            Mode::Cool => 0x02,
            Mode::Dry => 0x03,
            Mode::FanOnly => 0x04,
            Mode::Auto => 0x05,
        }
    }

    pub fn is_off(self) -> bool {
        matches!(self, Mode::Off)
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Off
    }
}

#[derive(Error, Debug)]
#[error("Invalid AC mode")]
pub struct InvalidMode;

impl FromStr for Mode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(Mode::Off),
            "heat" => Ok(Mode::Heat),
            "cool" => Ok(Mode::Cool),
            "dry" => Ok(Mode::Dry),
            "fan_only" | "fan" => Ok(Mode::FanOnly),
            "auto" => Ok(Mode::Auto),
            _ => Err(InvalidMode),
        }
    }
}

/// Fan speed, two bits in byte 4.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, EnumIter)]
pub enum FanSpeed {
    Auto,
    Max,
    Med,
    Min,
}

impl FanSpeed {
    pub fn bits(self) -> u8 {
        match self {
            FanSpeed::Auto => 0b00,
            FanSpeed::Max => 0b01,
            FanSpeed::Med => 0b10,
            FanSpeed::Min => 0b11,
        }
    }
}

impl Default for FanSpeed {
    fn default() -> Self {
        FanSpeed::Auto
    }
}

#[derive(Error, Debug)]
#[error("Invalid fan speed")]
pub struct InvalidFanSpeed;

impl FromStr for FanSpeed {
    type Err = InvalidFanSpeed;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(FanSpeed::Auto),
            "max" => Ok(FanSpeed::Max),
            "med" => Ok(FanSpeed::Med),
            "min" => Ok(FanSpeed::Min),
            _ => Err(InvalidFanSpeed),
        }
    }
}

/// Louver swing position. Vertical and horizontal are independent flags in
/// the low nibble of byte 4.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, EnumIter)]
pub enum SwingState {
    Off,
    Vertical,
    Horizontal,
    Both,
}

impl SwingState {
    pub fn flags(self) -> u8 {
        match self {
            SwingState::Off => 0b00,
            SwingState::Vertical => 0b01,
            SwingState::Horizontal => 0b10,
            SwingState::Both => 0b11,
        }
    }
}

impl Default for SwingState {
    fn default() -> Self {
        SwingState::Off
    }
}

#[derive(Error, Debug)]
#[error("Invalid swing position")]
pub struct InvalidSwingState;

impl FromStr for SwingState {
    type Err = InvalidSwingState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" => Ok(SwingState::Off),
            "vertical" => Ok(SwingState::Vertical),
            "horizontal" => Ok(SwingState::Horizontal),
            "both" => Ok(SwingState::Both),
            _ => Err(InvalidSwingState),
        }
    }
}

/// Target temperature in whole degrees celsius, always within the unit's
/// accepted range. Out-of-range input is clamped, not rejected.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Celsius(u8);

impl Celsius {
    pub fn clamped(value: f64) -> Celsius {
        if !value.is_finite() {
            return Celsius::default();
        }
        Celsius(value.clamp(f64::from(MIN_TEMPERATURE), f64::from(MAX_TEMPERATURE)) as u8)
    }

    /// Frame encoding, 0 through 14. Re-clamps as a last line of defense.
    pub fn bits(self) -> u8 {
        self.0.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE) - MIN_TEMPERATURE
    }
}

impl Default for Celsius {
    fn default() -> Self {
        Celsius(24)
    }
}

impl From<Celsius> for u8 {
    fn from(temperature: Celsius) -> Self {
        temperature.0
    }
}

#[derive(Error, Debug)]
#[error("Invalid temperature")]
pub struct InvalidCelsius;

impl FromStr for Celsius {
    type Err = InvalidCelsius;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<f64>()
            .map_err(|_| InvalidCelsius)
            .map(Celsius::clamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_codes() {
        assert_eq!(Mode::Off.code(), 0x00);
        assert_eq!(Mode::Heat.code(), 0x00);
        assert_eq!(Mode::Cool.code(), 0x02);
        assert_eq!(Mode::Dry.code(), 0x03);
        assert_eq!(Mode::FanOnly.code(), 0x04);
        assert_eq!(Mode::Auto.code(), 0x05);
    }

    #[test]
    fn mode_tokens() {
        assert_eq!("cool".parse::<Mode>().unwrap(), Mode::Cool);
        assert_eq!("Fan_Only".parse::<Mode>().unwrap(), Mode::FanOnly);
        assert!("warm".parse::<Mode>().is_err());
    }

    #[test]
    fn fan_tokens() {
        assert_eq!("MAX".parse::<FanSpeed>().unwrap(), FanSpeed::Max);
        assert!("turbo".parse::<FanSpeed>().is_err());
    }

    #[test]
    fn swing_flags() {
        assert_eq!(SwingState::Off.flags(), 0b00);
        assert_eq!(SwingState::Vertical.flags(), 0b01);
        assert_eq!(SwingState::Horizontal.flags(), 0b10);
        assert_eq!(SwingState::Both.flags(), 0b11);
    }

    #[test]
    fn temperature_clamps() {
        assert_eq!(u8::from(Celsius::clamped(15.0)), 16);
        assert_eq!(u8::from(Celsius::clamped(99.0)), 30);
        assert_eq!(u8::from(Celsius::clamped(24.7)), 24);
        assert_eq!(u8::from(Celsius::clamped(f64::NAN)), 24);
        assert_eq!(Celsius::clamped(16.0).bits(), 0);
        assert_eq!(Celsius::clamped(30.0).bits(), 14);
    }
}
