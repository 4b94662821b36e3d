//! Unified error type for adc2ble.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // BLE
    /// The SoftDevice rejected a GATT/GAP call (value set, notify, ...).
    Ble(BleError),

    /// Registration of the measurement service aborted.
    Register(RegisterError),

    /// Value was stored, but no central is connected to receive it.
    NotConnected,

    /// Value was stored, but the peer has not enabled notifications on the
    /// channel (only reported under `DeliveryPolicy::SubscribedOnly`).
    NotSubscribed,

    /// Channel index outside `0..CHANNEL_COUNT`.
    InvalidChannel(u8),

    // ADC / I²C
    /// The ADC driver or the TWI bus failed.
    Adc(AdcError),
}

impl Error {
    /// `true` for the "stored but nobody is listening" outcomes, which the
    /// sampling loop treats as routine rather than as failures.
    pub fn is_undelivered(&self) -> bool {
        matches!(
            self,
            Error::NotConnected | Error::NotSubscribed | Error::Ble(BleError::NotDelivered(_))
        )
    }
}

/// SoftDevice: the CCCD does not allow the notification.
pub const NRF_ERROR_INVALID_STATE: u32 = 0x0008;
/// SoftDevice: the connection handle no longer refers to a live link.
pub const BLE_ERROR_INVALID_CONN_HANDLE: u32 = 0x3002;
/// SoftDevice: system attributes (CCCDs) not yet set for this link.
pub const BLE_ERROR_GATTS_SYS_ATTR_MISSING: u32 = 0x3401;

/// Subset of BLE errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleError {
    /// GAP / GATT raw error code from the SoftDevice.
    Raw(u32),
    /// Notification refused because the peer is not listening: CCCD off,
    /// or the link is already gone.
    NotDelivered(u32),
}

impl BleError {
    /// Classify the SoftDevice result code of a notification.
    pub fn from_notify(code: u32) -> Self {
        match code {
            NRF_ERROR_INVALID_STATE
            | BLE_ERROR_INVALID_CONN_HANDLE
            | BLE_ERROR_GATTS_SYS_ATTR_MISSING => BleError::NotDelivered(code),
            _ => BleError::Raw(code),
        }
    }
}

/// Which registration step failed, with the SoftDevice error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterError {
    /// The vendor-specific 128-bit UUID base could not be added.
    UuidBase(BleError),
    /// The primary service could not be added.
    Service(BleError),
    /// Adding or zero-filling channel `channel` failed.
    Characteristic { channel: u8, error: BleError },
}

/// LTC2497 / TWI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdcError {
    /// Channel outside the range of the requested input mode.
    InvalidChannel(u8),
    /// Address or data byte was not acknowledged.
    Nack,
    /// Lost arbitration on a shared bus.
    ArbitrationLoss,
    /// Any other bus-level failure.
    Bus,
}

impl AdcError {
    /// Map a HAL I²C error onto our fixed-size variants.
    pub fn from_i2c<E: embedded_hal::i2c::Error>(e: E) -> Self {
        use embedded_hal::i2c::ErrorKind;

        match e.kind() {
            ErrorKind::NoAcknowledge(_) => AdcError::Nack,
            ErrorKind::ArbitrationLoss => AdcError::ArbitrationLoss,
            _ => AdcError::Bus,
        }
    }
}

// Convenience conversions

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Error::Ble(e)
    }
}

impl From<RegisterError> for Error {
    fn from(e: RegisterError) -> Self {
        Error::Register(e)
    }
}

impl From<AdcError> for Error {
    fn from(e: AdcError) -> Self {
        Error::Adc(e)
    }
}
