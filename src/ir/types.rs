use itertools::Itertools;

/// An encapsulated infrared payload, ready to hand to a transmitter.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct IrPacket(pub Vec<u8>);

impl IrPacket {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contiguous lowercase hex, the form remote-entity services accept.
    pub fn as_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).join("")
    }
}

impl AsRef<[u8]> for IrPacket {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ToString for IrPacket {
    fn to_string(&self) -> String {
        self.0.iter().map(|b| format!("0x{:02X}", b)).join(", ")
    }
}
