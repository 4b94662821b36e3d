use embedded_hal::i2c::I2c;
use heapless::Vec;

/// Highest 7-bit address probed by [`scan`].
pub const MAX_ADDRESS: u8 = 0x7F;

/// Maximum number of addresses recorded by one scan.
pub const MAX_DEVICES: usize = 8;

/// Result of a bus scan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanResult {
    /// Responding addresses, lowest first, capped at `MAX_DEVICES`.
    pub addresses: Vec<u8, MAX_DEVICES>,
    /// Total number of responding devices, including ones that did not fit.
    pub found: u8,
}

/// Probe every address in `0x01..=0x7F` with a 1-byte read.
///
/// A device counts as present when the read is acknowledged.
pub fn scan<I2C: I2c>(i2c: &mut I2C) -> ScanResult {
    let mut result = ScanResult::default();
    let mut sample = [0u8; 1];

    for address in 0x01..=MAX_ADDRESS {
        if i2c.read(address, &mut sample).is_ok() {
            result.found += 1;
            let _ = result.addresses.push(address);
        }
    }

    result
}
