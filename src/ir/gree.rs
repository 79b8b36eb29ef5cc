pub mod types;

use cached::proc_macro::cached;
use itertools::Itertools;

use crate::ir::format::broadlink;
use crate::ir::gree::types::{Celsius, FanSpeed, Mode, SwingState};
use crate::ir::types::IrPacket;

pub const FRAME_LENGTH: usize = 8;

// vendor-required configuration byte, not user controllable
const CONFIG_BYTE: u8 = 0x50;

/// Desired state of one Gree/Daitsu unit, exactly what a command frame
/// encodes. The unit has no feedback channel, so this is intent only.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Gree {
    pub mode: Mode,
    pub temperature: Celsius,
    pub fan: FanSpeed,
    /// `None` when the unit was configured without swing support.
    pub swing: Option<SwingState>,
}

impl Gree {
    pub fn new(swing_capable: bool) -> Gree {
        Gree {
            swing: swing_capable.then(SwingState::default),
            ..Gree::default()
        }
    }

    pub fn powered(&self) -> bool {
        !self.mode.is_off()
    }

    /// Builds the 8 byte command frame for this state.
    pub fn frame(&self) -> GreeFrame {
        GreeFrame::from(self)
    }
}

impl Default for Gree {
    fn default() -> Self {
        Gree {
            mode: Mode::default(),
            temperature: Celsius::default(),
            fan: FanSpeed::default(),
            swing: None,
        }
    }
}

/// The 8 byte command frame understood by Gree-protocol receivers.
///
/// Byte 0: power bit plus temperature bits shifted left by two.
/// Byte 1: timer, not modeled.
/// Byte 2: fixed configuration byte.
/// Byte 3: mode code, zero when powered off.
/// Byte 4: fan bits in the high nibble, swing flags in the low one.
/// Bytes 5-6: display and reserved, fixed zero.
/// Byte 7: additive checksum over the first seven bytes.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct GreeFrame([u8; FRAME_LENGTH]);

impl GreeFrame {
    pub fn into_inner(self) -> [u8; FRAME_LENGTH] {
        self.0
    }
}

impl AsRef<[u8]> for GreeFrame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ToString for GreeFrame {
    fn to_string(&self) -> String {
        self.0.iter().map(|b| format!("{:02X}", b)).join(" ")
    }
}

impl From<&Gree> for GreeFrame {
    fn from(state: &Gree) -> Self {
        let power = u8::from(state.powered());
        let mode_code = if state.mode.is_off() {
            0x00
        } else {
            state.mode.code()
        };
        let swing_flags = state.swing.map_or(0, SwingState::flags);
        let mut bytes = [
            power | state.temperature.bits() << 2,
            0x00,
            CONFIG_BYTE,
            mode_code,
            state.fan.bits() << 4 | swing_flags,
            0x00,
            0x00,
            0x00,
        ];
        bytes[FRAME_LENGTH - 1] = checksum(&bytes[..FRAME_LENGTH - 1]);
        GreeFrame(bytes)
    }
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, b| sum.wrapping_add(*b))
}

/// Transmitter packet for a frame. States repeat often over the life of a
/// device, so the derivation is cached per frame.
#[cached]
pub fn gree_packet(frame: GreeFrame) -> IrPacket {
    broadlink::encapsulate(frame)
}
