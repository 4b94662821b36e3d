//! Host-testable library interface for adc2ble.
//!
//! This crate holds the pure logic that can be tested on the host (no
//! embedded hardware required):
//!
//! - `meas` - BLE Measurement Service (registration, event dispatch,
//!   update / notify path) against the `GattServer` trait.
//! - `adc` - LTC2497 driver and TWI bus scan against `embedded_hal::i2c`.
//!
//! Usage: `cargo test --lib` or `cargo test`
//!
//! Note: The embedded binary (main.rs, `--features embedded`) adds the
//! SoftDevice adapter and the Embassy tasks on top of this library.

#![cfg_attr(not(test), no_std)]

pub mod adc;
pub mod config;
pub mod error;
pub mod meas;

pub use error::Error;
