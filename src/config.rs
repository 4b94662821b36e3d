//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::meas::{DeliveryPolicy, ServiceConfig, SubscriptionPolicy};

// BLE

/// Vendor-specific 128-bit UUID base (SoftDevice little-endian byte order).
///
/// Bytes 12 and 13 are replaced by the 16-bit service / characteristic
/// values below to form the full UUIDs.
pub const MEAS_UUID_BASE: [u8; 16] = [
    0x25, 0x81, 0xE8, 0x8C, 0x72, 0x2E, 0x8F, 0x97, 0xEA, 0x11, 0x45, 0x29, 0x08, 0x91, 0xD3, 0x5B,
];

/// Measurement service UUID (16-bit alias within `MEAS_UUID_BASE`).
pub const MEAS_SERVICE_UUID: u16 = 0x1400;

/// Characteristic UUID for ADC channel 1. Channels 2..16 follow in order,
/// up to `0x1410`.
pub const MEAS_CH01_CHAR_UUID: u16 = 0x1401;

/// Bytes per channel value (one raw LTC2497 read).
pub const MEAS_VALUE_LEN: u16 = 4;

/// Initial attribute length at registration.
pub const MEAS_VALUE_INIT_LEN: u16 = 1;

/// Advertised device name.
pub const BLE_DEVICE_NAME: &str = "ADC2BLE";

/// Subscription flags are cleared when the link drops, so a new central
/// never inherits the previous peer's CCCD state.
pub const SUBSCRIPTION_POLICY: SubscriptionPolicy = SubscriptionPolicy::ResetOnDisconnect;

/// Notifications are always attempted while connected; the SoftDevice
/// refuses delivery for channels whose CCCD is not enabled.
pub const DELIVERY_POLICY: DeliveryPolicy = DeliveryPolicy::Always;

/// Service configuration used by the firmware binary.
pub const SERVICE_CONFIG: ServiceConfig = ServiceConfig {
    subscription: SUBSCRIPTION_POLICY,
    delivery: DELIVERY_POLICY,
};

// ADC / TWI
//
//   TWI SDA → P0.25
//   TWI SCL → P0.26
//
// These are logical names; the actual `embassy_nrf::peripherals::*` pins
// are picked in `main.rs`.  Adjust for your custom PCB.

/// I²C address of the LTC2497 on the board (CA0/CA1/CA2 strapping).
pub const ADC_ADDRESS: u8 = crate::adc::ltc2497::ADDRESS_ONE;

/// Time the LTC2497 needs to finish a conversion after a channel select
/// (1x speed, 50/60 Hz rejection: ~149 ms typical).
pub const ADC_CONVERSION_TIME_MS: u64 = 160;

/// Pause between two full 16-channel sweeps.
pub const SAMPLE_PERIOD_MS: u64 = 1000;
