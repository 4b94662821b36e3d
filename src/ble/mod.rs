//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **SoftDevice adapter** - implements the library's `GattServer`
//!    trait on top of the raw `sd_ble_gatts_*` calls.
//! 2. **Peripheral** - advertises, accepts one connection at a time and
//!    feeds GAP/GATT events into the Measurement Service.
//!
//! The service instance itself lives in [`MEAS`], shared between the
//! peripheral loop (event path) and the sampling task (update path).

pub mod peripheral;
pub mod softdevice;

use core::cell::RefCell;

use adc2ble::meas::{BleEvent, MeasEvent, MeasEventHandler, MeasurementService, ServiceState};
use defmt::info;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

pub use softdevice::SoftdeviceGatt;

/// Application handler: reports service transitions over RTT.
pub struct LogHandler;

impl MeasEventHandler for LogHandler {
    fn on_meas_event(&mut self, state: &ServiceState, event: &MeasEvent<'_>) {
        match event {
            MeasEvent::Connected => info!("MEAS: connected ({})", state.connection()),
            MeasEvent::Disconnected => info!("MEAS: disconnected"),
            MeasEvent::NotificationEnabled { channel, .. } => {
                info!("MEAS: notifications on for channel {}", channel + 1)
            }
            MeasEvent::NotificationDisabled { channel, .. } => {
                info!("MEAS: notifications off for channel {}", channel + 1)
            }
        }
    }
}

pub type Service = MeasurementService<LogHandler>;

/// The registered Measurement Service; `None` until registration succeeds.
pub static MEAS: Mutex<CriticalSectionRawMutex, RefCell<Option<Service>>> =
    Mutex::new(RefCell::new(None));

/// Install the registered service into [`MEAS`].
pub fn install(service: Service) {
    MEAS.lock(|cell| *cell.borrow_mut() = Some(service));
}

/// Run `f` on the service inside the critical section.
///
/// Returns `None` while no service is registered.
pub fn with_service<R>(f: impl FnOnce(&mut Service) -> R) -> Option<R> {
    MEAS.lock(|cell| cell.borrow_mut().as_mut().map(f))
}

/// Feed one stack event to the service. Dropped if none is registered.
pub fn dispatch(event: &BleEvent<'_>) {
    if with_service(|service| service.on_ble_evt(event)).is_none() {
        defmt::debug!("MEAS: event before registration, dropped");
    }
}
