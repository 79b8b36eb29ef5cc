//! Broadlink raw-format encapsulation.
//!
//! Wraps a logical command frame into the packet a Broadlink-style blaster
//! replays: `0x26 0x00`, a little-endian payload length, the raw mark/space
//! timing data for every bit, and the `0x0D 0x05` end markers.

use crate::ir::types::IrPacket;

// Timing values in Broadlink raw units (not microseconds), captured from a
// working Daitsu/Gree remote.
const HDR_MARK: u16 = 0x011F; // ~8740us
const HDR_SPACE: u8 = 0x90; // ~4385us
const BIT_MARK: u8 = 20; // ~609us
const ZERO_SPACE: u8 = 18; // ~548us
const ONE_SPACE: u8 = 54; // ~1644us
const FOOTER: u8 = 19; // ~578us

const PACKET_TYPE_IR: u8 = 0x26;
const NO_REPEAT: u8 = 0x00;
const END_MARKERS: [u8; 2] = [0x0D, 0x05];

/// Encapsulates frame bytes into a full transmitter packet. Bits go out
/// LSB-first within each byte.
pub fn encapsulate<T: AsRef<[u8]>>(bytes: T) -> IrPacket {
    let bytes = bytes.as_ref();
    let mut timing = Vec::with_capacity(5 + bytes.len() * 16);

    // a zero byte marks an extended 16 bit big-endian timing value
    timing.extend([0x00, (HDR_MARK >> 8) as u8, HDR_MARK as u8, HDR_SPACE]);
    for byte in bytes {
        for bit in 0..8 {
            timing.push(BIT_MARK);
            timing.push(if byte >> bit & 1 == 1 {
                ONE_SPACE
            } else {
                ZERO_SPACE
            });
        }
    }
    timing.push(FOOTER);

    // the length field counts the timing data plus the end markers
    let total_len = timing.len() + END_MARKERS.len();
    let mut packet = Vec::with_capacity(4 + total_len);
    packet.push(PACKET_TYPE_IR);
    packet.push(NO_REPEAT);
    packet.push(total_len as u8);
    packet.push((total_len >> 8) as u8);
    packet.extend(timing);
    packet.extend(END_MARKERS);
    IrPacket(packet)
}
