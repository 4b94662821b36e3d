//! BLE peripheral loop - advertise, serve one central, repeat.
//!
//! GAP connect/disconnect and GATT writes are turned into library
//! `BleEvent`s and fed to the shared Measurement Service through
//! [`super::dispatch`].

use adc2ble::config::{BLE_DEVICE_NAME, MEAS_SERVICE_UUID, MEAS_UUID_BASE};
use adc2ble::meas::gatt::{AttrHandle, ConnHandle, Uuid};
use adc2ble::meas::{BleEvent, WriteEvent};
use defmt::{info, warn};
use embassy_time::{Duration, Timer};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList,
};
use nrf_softdevice::ble::gatt_server::{self, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection};
use nrf_softdevice::Softdevice;

use super::dispatch;

/// Back-off after a failed advertising attempt.
const ADVERTISE_RETRY: Duration = Duration::from_millis(500);

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .full_name(BLE_DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .services_128(
        ServiceList::Complete,
        &[Uuid::expand(&MEAS_UUID_BASE, MEAS_SERVICE_UUID)],
    )
    .build();

/// GATT server glue for the Measurement Service.
///
/// The attribute table is built by `MeasurementService::init`, so this
/// server owns nothing; it only forwards stack callbacks.
pub struct MeasServer;

impl gatt_server::Server for MeasServer {
    type Event = ();

    fn on_write(
        &self,
        conn: &Connection,
        handle: u16,
        _op: WriteOp,
        offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        let conn = ConnHandle(conn.handle()?);
        dispatch(&BleEvent::Write(WriteEvent {
            conn,
            handle: AttrHandle(handle),
            offset: offset as u16,
            data,
        }));
        None
    }

    fn on_notify_tx_complete(&self, conn: &Connection, count: u8) -> Option<Self::Event> {
        let conn = ConnHandle(conn.handle()?);
        dispatch(&BleEvent::NotifyTxComplete { conn, count });
        None
    }
}

/// Advertise and serve centrals forever, one connection at a time.
pub async fn run(sd: &'static Softdevice) -> ! {
    let server = MeasServer;
    let config = peripheral::Config::default();

    loop {
        let adv = peripheral::ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        let conn = match peripheral::advertise_connectable(sd, adv, &config).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("BLE advertising failed: {:?}", e);
                Timer::after(ADVERTISE_RETRY).await;
                continue;
            }
        };

        let Some(handle) = conn.handle() else {
            warn!("BLE link dropped before it could be served");
            continue;
        };
        let handle = ConnHandle(handle);

        info!("BLE central connected (handle {})", handle.0);
        dispatch(&BleEvent::Connected { conn: handle });

        let reason = gatt_server::run(&conn, &server, |_| {}).await;
        info!("BLE central disconnected: {:?}", reason);

        dispatch(&BleEvent::Disconnected { conn: handle });
    }
}
