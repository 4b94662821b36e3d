//! Integration tests for adc2ble host-testable logic.

use adc2ble::adc::{Ltc2497, Setup};
use adc2ble::error::BleError;
use adc2ble::meas::gatt::{
    AttrHandle, AttrPermissions, CharHandles, CharacteristicDef, ConnHandle, GattServer,
    ServiceHandle, Uuid,
};
use adc2ble::meas::{
    BleEvent, MeasEvent, MeasEventHandler, MeasurementService, ServiceConfig, ServiceState,
    WriteEvent,
};
use adc2ble::Error;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

/// Minimal attribute table: values by handle plus a notification log.
#[derive(Default)]
struct Table {
    next: u16,
    values: Vec<(AttrHandle, Vec<u8>)>,
    notified: Vec<(ConnHandle, AttrHandle, Vec<u8>)>,
}

impl Table {
    fn value(&self, handle: AttrHandle) -> &[u8] {
        self.values
            .iter()
            .find(|(h, _)| *h == handle)
            .map(|(_, v)| v.as_slice())
            .expect("unknown handle")
    }
}

impl GattServer for Table {
    fn register_uuid_base(&mut self, _base: &[u8; 16]) -> Result<u8, BleError> {
        Ok(2)
    }

    fn add_service(&mut self, _uuid: Uuid) -> Result<ServiceHandle, BleError> {
        self.next = 0x10;
        Ok(ServiceHandle(self.next))
    }

    fn add_characteristic(
        &mut self,
        _service: ServiceHandle,
        def: &CharacteristicDef,
    ) -> Result<CharHandles, BleError> {
        let value = AttrHandle(self.next + 2);
        let cccd = AttrHandle(self.next + 3);
        self.next += 3;
        self.values.push((value, vec![0; def.init_len as usize]));
        Ok(CharHandles { value, cccd })
    }

    fn set_value(&mut self, handle: AttrHandle, offset: u16, data: &[u8]) -> Result<(), BleError> {
        let (_, stored) = self
            .values
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .ok_or(BleError::Raw(0x3001))?;
        let end = offset as usize + data.len();
        if stored.len() < end {
            stored.resize(end, 0);
        }
        stored[offset as usize..end].copy_from_slice(data);
        Ok(())
    }

    fn get_value(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, BleError> {
        let stored = self.value(handle);
        let n = stored.len().min(buf.len());
        buf[..n].copy_from_slice(&stored[..n]);
        Ok(n)
    }

    fn notify(&mut self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), BleError> {
        self.notified.push((conn, handle, data.to_vec()));
        Ok(())
    }
}

/// I²C bus that answers every read with a fixed conversion word.
struct FixedAdc([u8; 4]);

impl ErrorType for FixedAdc {
    type Error = ErrorKind;
}

impl I2c for FixedAdc {
    fn transaction(&mut self, _address: u8, ops: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        for op in ops {
            if let Operation::Read(buf) = op {
                buf.copy_from_slice(&self.0[..buf.len()]);
            }
        }
        Ok(())
    }
}

/// Handler that keeps a textual trace of every callback.
#[derive(Default)]
struct Trace(Vec<String>);

impl MeasEventHandler for Trace {
    fn on_meas_event(&mut self, state: &ServiceState, event: &MeasEvent<'_>) {
        let line = match event {
            MeasEvent::Connected => format!("connected {:?}", state.connection()),
            MeasEvent::Disconnected => "disconnected".to_string(),
            MeasEvent::NotificationEnabled { channel, .. } => format!("enabled {channel}"),
            MeasEvent::NotificationDisabled { channel, .. } => format!("disabled {channel}"),
        };
        self.0.push(line);
    }
}

fn register(table: &mut Table) -> MeasurementService<Trace> {
    MeasurementService::init(
        table,
        Trace::default(),
        AttrPermissions::OPEN,
        ServiceConfig::default(),
    )
    .expect("registration succeeds")
}

const CONN: ConnHandle = ConnHandle(0x0001);

fn enable_notifications(service: &mut MeasurementService<Trace>, channel: usize) {
    let cccd = service.state().channels()[channel].cccd_handle();
    service.on_ble_evt(&BleEvent::Write(WriteEvent {
        conn: CONN,
        handle: cccd,
        offset: 0,
        data: &[0x01, 0x00],
    }));
}

#[test]
fn subscribed_channel_receives_notification() {
    let mut table = Table::default();
    let mut service = register(&mut table);

    service.on_ble_evt(&BleEvent::Connected { conn: CONN });
    enable_notifications(&mut service, 3);
    assert!(service.state().notifications_enabled(3));

    let result = service.update(&mut table, 3, &[1, 2, 3, 4]);

    assert_eq!(result, Ok(()));
    let value_handle = service.state().channels()[3].value_handle();
    assert_eq!(table.notified, vec![(CONN, value_handle, vec![1, 2, 3, 4])]);
    assert_eq!(
        service.handler().0,
        vec!["connected Active(ConnHandle(1))".to_string(), "enabled 3".to_string()]
    );
}

#[test]
fn update_without_connection_stores_value() {
    let mut table = Table::default();
    let mut service = register(&mut table);

    let result = service.update(&mut table, 5, &[9, 8, 7, 6]);

    assert_eq!(result, Err(Error::NotConnected));
    assert!(table.notified.is_empty());

    let mut buf = [0u8; 4];
    assert_eq!(service.read(&mut table, 5, &mut buf), Ok(4));
    assert_eq!(buf, [9, 8, 7, 6]);
    assert_eq!(service.state().channels()[5].value(), &[9, 8, 7, 6]);
}

#[test]
fn reconnecting_central_must_resubscribe() {
    let mut table = Table::default();
    let mut service = register(&mut table);

    service.on_ble_evt(&BleEvent::Connected { conn: CONN });
    enable_notifications(&mut service, 0);
    service.on_ble_evt(&BleEvent::Disconnected { conn: CONN });
    service.on_ble_evt(&BleEvent::Connected { conn: ConnHandle(2) });

    assert!(!service.state().channels()[0].is_subscribed());
    assert_eq!(
        service.handler().0.last().map(String::as_str),
        Some("connected Active(ConnHandle(2))")
    );
}

#[test]
fn adc_reading_flows_into_characteristic() {
    let mut table = Table::default();
    let mut service = register(&mut table);
    let mut adc = Ltc2497::new(FixedAdc([0x80, 0x12, 0x34, 0x00]), 0x14);

    service.on_ble_evt(&BleEvent::Connected { conn: CONN });
    enable_notifications(&mut service, 7);

    adc.setup(Setup::default()).unwrap();
    adc.select_single(7).unwrap();
    let reading = adc.read().unwrap();

    service.update(&mut table, 7, reading.bytes()).unwrap();

    let value_handle = service.state().channels()[7].value_handle();
    assert_eq!(table.value(value_handle), &[0x80, 0x12, 0x34, 0x00]);
    assert_eq!(table.notified.len(), 1);
    assert_eq!(table.notified[0].1, value_handle);
}

#[test]
fn all_sixteen_channels_are_independent() {
    let mut table = Table::default();
    let mut service = register(&mut table);

    for channel in 0..16u8 {
        let _ = service.update(&mut table, channel as usize, &[channel; 4]);
    }

    for (channel, slot) in service.state().channels().iter().enumerate() {
        assert_eq!(slot.value(), &[channel as u8; 4]);
        assert_eq!(table.value(slot.value_handle()), &[channel as u8; 4]);
    }
}
