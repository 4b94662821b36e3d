/// CCCD bit: server may send notifications.
pub const CCCD_NOTIFY: u16 = 0x0001;
/// CCCD bit: server may send indications.
pub const CCCD_INDICATE: u16 = 0x0002;

/// Decoded Client Characteristic Configuration value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cccd {
    pub notifications: bool,
    pub indications: bool,
}

impl Cccd {
    /// Decode a CCCD write payload (little-endian u16).
    ///
    /// Missing bytes read as zero, so a short payload can only ever
    /// disable flags.
    pub fn decode(data: &[u8]) -> Self {
        let lo = data.first().copied().unwrap_or(0);
        let hi = data.get(1).copied().unwrap_or(0);
        let bits = u16::from_le_bytes([lo, hi]);
        Self {
            notifications: bits & CCCD_NOTIFY != 0,
            indications: bits & CCCD_INDICATE != 0,
        }
    }
}
