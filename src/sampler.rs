//! ADC sampling loop.
//!
//! Sweeps the 16 single-ended LTC2497 inputs and pushes each raw reading
//! into the Measurement Service.  A conversion starts on channel select,
//! so the task waits out the conversion time before reading back.

use adc2ble::adc::{bus, Ltc2497, Setup};
use adc2ble::config::{ADC_ADDRESS, ADC_CONVERSION_TIME_MS, SAMPLE_PERIOD_MS};
use adc2ble::meas::CHANNEL_COUNT;
use defmt::{debug, info, warn};
use embassy_nrf::bind_interrupts;
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::peripherals::{self, TWISPI0};
use embassy_nrf::twim::{self, Twim};
use embassy_time::{Duration, Timer};
use nrf_softdevice::Softdevice;

use crate::ble::{self, SoftdeviceGatt};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

pub type Adc = Ltc2497<Twim<'static, TWISPI0>>;

/// Bring up the TWI master (SDA P0.25, SCL P0.26, 400 kHz), log what
/// answers on the bus and hand back the ADC driver.
pub fn init(twim: TWISPI0, sda: peripherals::P0_25, scl: peripherals::P0_26) -> Adc {
    let mut config = twim::Config::default();
    config.frequency = twim::Frequency::K400;
    // Must stay below the SoftDevice's reserved priorities.
    interrupt::TWISPI0.set_priority(interrupt::Priority::P3);
    let mut i2c = Twim::new(twim, Irqs, sda, scl, config);

    let found = bus::scan(&mut i2c);
    info!("TWI scan: {} device(s) at {:x}", found.found, found.addresses.as_slice());
    if !found.addresses.contains(&ADC_ADDRESS) {
        warn!("LTC2497 not found at {=u8:#x}", ADC_ADDRESS);
    }

    Ltc2497::new(i2c, ADC_ADDRESS)
}

/// Sample all channels forever.
pub async fn run(sd: &'static Softdevice, mut adc: Adc) -> ! {
    if let Err(e) = adc.setup(Setup::default()) {
        warn!("ADC setup failed: {:?}", e);
    }

    let mut gatt = SoftdeviceGatt::new(sd);

    loop {
        for channel in 0..CHANNEL_COUNT {
            if let Err(e) = adc.select_single(channel as u8) {
                warn!("ADC select ch{} failed: {:?}", channel + 1, e);
                continue;
            }

            Timer::after(Duration::from_millis(ADC_CONVERSION_TIME_MS)).await;

            let reading = match adc.read() {
                Ok(reading) => reading,
                Err(e) => {
                    warn!("ADC read ch{} failed: {:?}", channel + 1, e);
                    continue;
                }
            };
            debug!("ch{}: {:?}", channel + 1, reading.code());

            let result = ble::with_service(|service| {
                service.update(&mut gatt, channel, reading.bytes())
            });
            match result {
                None | Some(Ok(())) => {}
                // Stored; nobody connected or subscribed to hear it.
                Some(Err(e)) if e.is_undelivered() => {}
                Some(Err(e)) => warn!("MEAS update ch{} failed: {:?}", channel + 1, e),
            }
        }

        Timer::after(Duration::from_millis(SAMPLE_PERIOD_MS)).await;
    }
}
