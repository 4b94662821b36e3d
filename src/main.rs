//! adc2ble firmware entry point.
//!
//! Boot order:
//! 1. Embassy HAL with interrupt priorities compatible with the SoftDevice.
//! 2. TWI bus + LTC2497 driver (bus scan logged over RTT).
//! 3. SoftDevice S140 enable, Measurement Service registration.
//! 4. Tasks: SoftDevice event pump, ADC sampler, BLE peripheral loop.

#![no_std]
#![no_main]

mod ble;
mod sampler;

use core::mem;

use adc2ble::config;
use adc2ble::meas::gatt::AttrPermissions;
use adc2ble::meas::MeasurementService;
use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use nrf_softdevice::{raw, Softdevice};
use {defmt_rtt as _, panic_probe as _};

use crate::ble::{LogHandler, SoftdeviceGatt};

/// Attribute table size; 16 vendor characteristics outgrow the default.
const ATTR_TAB_SIZE: u32 = 2048;

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

#[embassy_executor::task]
async fn sampler_task(sd: &'static Softdevice, adc: sampler::Adc) -> ! {
    sampler::run(sd, adc).await
}

fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: ATTR_TAB_SIZE,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: config::BLE_DEVICE_NAME.as_ptr() as _,
            current_len: config::BLE_DEVICE_NAME.len() as u16,
            max_len: config::BLE_DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("adc2ble starting");

    // The SoftDevice reserves priorities 0, 1 and 4.
    let mut hal_config = embassy_nrf::config::Config::default();
    hal_config.gpiote_interrupt_priority = Priority::P2;
    hal_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(hal_config);

    let adc = sampler::init(p.TWISPI0, p.P0_25, p.P0_26);

    let sd = Softdevice::enable(&softdevice_config());

    let mut gatt = SoftdeviceGatt::new(sd);
    let service = match MeasurementService::init(
        &mut gatt,
        LogHandler,
        AttrPermissions::OPEN,
        config::SERVICE_CONFIG,
    ) {
        Ok(service) => service,
        // A partial attribute table is unusable; do not advertise it.
        Err(e) => defmt::panic!("MEAS registration failed: {:?}", e),
    };
    info!(
        "MEAS registered (service handle {})",
        service.state().service_handle().0
    );
    ble::install(service);

    unwrap!(spawner.spawn(softdevice_task(sd)));
    unwrap!(spawner.spawn(sampler_task(sd, adc)));

    ble::peripheral::run(sd).await
}
