//! LTC2497 16-channel, 16-bit delta-sigma ADC over I²C.
//!
//! Each transaction is a single transmit-or-fail attempt; retrying is
//! left to the caller.  Writing a select byte starts a conversion on the
//! chosen input, and the next read returns the finished result.

use crate::error::AdcError;
use embedded_hal::i2c::I2c;

/// I²C address with CA2/CA1/CA0 = LOW/LOW/LOW.
pub const ADDRESS_ONE: u8 = 0x14;
/// I²C address with CA2/CA1/CA0 = HIGH/HIGH/HIGH.
pub const ADDRESS_TWO: u8 = 0x56;

/// Highest single-ended channel.
pub const MAX_SINGLE_CHANNEL: u8 = 15;
/// Highest differential channel pair.
pub const MAX_DIFF_CHANNEL: u8 = 7;

const SELECT_PREAMBLE: u8 = 0b10 << 6;
const SELECT_ENABLE: u8 = 1 << 5;
const SELECT_SINGLE: u8 = 1 << 4;
const SETUP_ENABLE: u8 = 1 << 7;

/// Input polarity of a differential channel pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Polarity {
    Positive = 0 << 3,
    Negative = 1 << 3,
}

/// Line-frequency rejection of the digital filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Rejection {
    Hz50And60 = 0 << 4,
    Hz50 = 1 << 4,
    Hz60 = 2 << 4,
}

/// Conversion speed (2x halves the conversion time, disables offset
/// auto-calibration).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Speed {
    X1 = 0 << 3,
    X2 = 1 << 3,
}

/// Route the internal temperature sensor to the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TempOutput {
    Off = 0 << 6,
    On = 1 << 6,
}

/// Contents of the setup byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Setup {
    pub rejection: Rejection,
    pub speed: Speed,
    pub temp: TempOutput,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            rejection: Rejection::Hz50And60,
            speed: Speed::X1,
            temp: TempOutput::Off,
        }
    }
}

impl Setup {
    fn to_byte(self) -> u8 {
        SETUP_ENABLE | self.rejection as u8 | self.speed as u8 | self.temp as u8
    }
}

/// Raw 4-byte conversion result as read from the chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading(pub [u8; 4]);

/// Decoded conversion word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Code {
    /// Input at or above +FS (SIG=1, MSB=1).
    OverRange,
    /// Input below -FS (SIG=0, MSB=0).
    UnderRange,
    /// In-range result in units of FS / 65536.
    Value(i32),
}

impl Reading {
    /// Raw bytes exactly as they go over BLE.
    pub fn bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Decode the 24-bit output word (first three bytes): bit 23 is SIG,
    /// bits 22..6 the 17-bit two's-complement result, the rest sub-LSBs.
    pub fn code(&self) -> Code {
        let word = u32::from_be_bytes([0, self.0[0], self.0[1], self.0[2]]);
        let sig = word & (1 << 23) != 0;
        let raw = (word >> 6) & 0x1_FFFF;
        let msb = raw & 0x1_0000 != 0;

        match (sig, msb) {
            (true, true) => Code::OverRange,
            (false, false) => Code::UnderRange,
            (true, false) => Code::Value(raw as i32),
            (false, true) => Code::Value(raw as i32 - 0x2_0000),
        }
    }
}

/// LTC2497 driver bound to one I²C address.
pub struct Ltc2497<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Ltc2497<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Write the setup byte (filter, speed, temperature sensor).
    pub fn setup(&mut self, setup: Setup) -> Result<(), AdcError> {
        self.write(&[SELECT_PREAMBLE | SELECT_ENABLE, setup.to_byte()])
    }

    /// Select single-ended input `channel` (0..=15) and start a conversion.
    pub fn select_single(&mut self, channel: u8) -> Result<(), AdcError> {
        if channel > MAX_SINGLE_CHANNEL {
            return Err(AdcError::InvalidChannel(channel));
        }
        self.write(&[SELECT_PREAMBLE | SELECT_ENABLE | SELECT_SINGLE | channel, 0x00])
    }

    /// Select differential pair `channel` (0..=7) and start a conversion.
    pub fn select_differential(&mut self, channel: u8, polarity: Polarity) -> Result<(), AdcError> {
        if channel > MAX_DIFF_CHANNEL {
            return Err(AdcError::InvalidChannel(channel));
        }
        self.write(&[
            SELECT_PREAMBLE | SELECT_ENABLE | polarity as u8 | channel,
            0x00,
        ])
    }

    /// Read the result of the conversion on the previously selected input.
    pub fn read(&mut self) -> Result<Reading, AdcError> {
        let mut buf = [0u8; 4];
        self.i2c
            .read(self.address, &mut buf)
            .map_err(AdcError::from_i2c)?;
        Ok(Reading(buf))
    }

    fn write(&mut self, payload: &[u8; 2]) -> Result<(), AdcError> {
        self.i2c
            .write(self.address, payload)
            .map_err(AdcError::from_i2c)
    }
}
