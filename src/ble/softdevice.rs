//! `GattServer` over the SoftDevice S140 attribute table.
//!
//! Table construction and offset writes go through the raw `sd_ble_*`
//! SVCs, since the crate's safe API builds tables from `#[gatt_server]`
//! structs only. Reads and notifications use `gatt_server` directly.

use core::{mem, ptr};

use adc2ble::error::{BleError, BLE_ERROR_INVALID_CONN_HANDLE};
use adc2ble::meas::gatt::{
    AttrHandle, CharHandles, CharacteristicDef, ConnHandle, GattServer, SecurityMode,
    ServiceHandle, Uuid,
};
use nrf_softdevice::ble::gatt_server::{self, GetValueError, NotifyValueError};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::{raw, RawError, Softdevice};

/// Attribute-table access for the enabled SoftDevice.
///
/// Holding the `Softdevice` reference guarantees the stack is enabled
/// before any SVC is issued.
pub struct SoftdeviceGatt<'d> {
    sd: &'d Softdevice,
}

impl<'d> SoftdeviceGatt<'d> {
    pub fn new(sd: &'d Softdevice) -> Self {
        Self { sd }
    }
}

fn check(ret: u32) -> Result<(), BleError> {
    RawError::convert(ret).map_err(|e| BleError::Raw(e as u32))
}

fn raw_uuid(uuid: Uuid) -> raw::ble_uuid_t {
    raw::ble_uuid_t {
        uuid: uuid.value,
        type_: uuid.ty,
    }
}

fn sec_mode(mode: SecurityMode) -> raw::ble_gap_conn_sec_mode_t {
    let (sm, lv) = match mode {
        SecurityMode::NoAccess => (0, 0),
        SecurityMode::Open => (1, 1),
        SecurityMode::Encrypted => (1, 2),
        SecurityMode::EncryptedMitm => (1, 3),
    };
    raw::ble_gap_conn_sec_mode_t {
        _bitfield_1: raw::ble_gap_conn_sec_mode_t::new_bitfield_1(sm, lv),
    }
}

impl GattServer for SoftdeviceGatt<'_> {
    fn register_uuid_base(&mut self, base: &[u8; 16]) -> Result<u8, BleError> {
        let uuid128 = raw::ble_uuid128_t { uuid128: *base };
        let mut uuid_type: u8 = 0;
        check(unsafe { raw::sd_ble_uuid_vs_add(&uuid128, &mut uuid_type) })?;
        Ok(uuid_type)
    }

    fn add_service(&mut self, uuid: Uuid) -> Result<ServiceHandle, BleError> {
        let ble_uuid = raw_uuid(uuid);
        let mut handle: u16 = 0;
        check(unsafe {
            raw::sd_ble_gatts_service_add(
                raw::BLE_GATTS_SRVC_TYPE_PRIMARY as u8,
                &ble_uuid,
                &mut handle,
            )
        })?;
        Ok(ServiceHandle(handle))
    }

    fn add_characteristic(
        &mut self,
        service: ServiceHandle,
        def: &CharacteristicDef,
    ) -> Result<CharHandles, BleError> {
        let ble_uuid = raw_uuid(def.uuid);

        let mut char_md: raw::ble_gatts_char_md_t = unsafe { mem::zeroed() };
        char_md.char_props.set_read(def.props.read as u8);
        char_md.char_props.set_write(def.props.write as u8);
        char_md.char_props.set_notify(def.props.notify as u8);

        let mut attr_md: raw::ble_gatts_attr_md_t = unsafe { mem::zeroed() };
        attr_md.read_perm = sec_mode(def.permissions.read);
        attr_md.write_perm = sec_mode(def.permissions.write);
        attr_md.set_vloc(raw::BLE_GATTS_VLOC_STACK as u8);
        // Variable length: the value grows from `init_len` to `max_len`.
        attr_md.set_vlen(1);

        let attr = raw::ble_gatts_attr_t {
            p_uuid: &ble_uuid,
            p_attr_md: &attr_md,
            init_len: def.init_len,
            init_offs: 0,
            max_len: def.max_len,
            p_value: ptr::null_mut(),
        };

        let mut handles: raw::ble_gatts_char_handles_t = unsafe { mem::zeroed() };
        check(unsafe {
            raw::sd_ble_gatts_characteristic_add(service.0, &char_md, &attr, &mut handles)
        })?;

        Ok(CharHandles {
            value: AttrHandle(handles.value_handle),
            cccd: AttrHandle(handles.cccd_handle),
        })
    }

    fn set_value(&mut self, handle: AttrHandle, offset: u16, data: &[u8]) -> Result<(), BleError> {
        let mut value = raw::ble_gatts_value_t {
            len: data.len() as u16,
            offset,
            p_value: data.as_ptr() as *mut u8,
        };
        check(unsafe {
            raw::sd_ble_gatts_value_set(raw::BLE_CONN_HANDLE_INVALID as u16, handle.0, &mut value)
        })
    }

    fn get_value(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, BleError> {
        gatt_server::get_value(self.sd, handle.0, buf).map_err(|e| match e {
            GetValueError::Truncated => BleError::Raw(raw::NRF_ERROR_DATA_SIZE),
            GetValueError::Raw(e) => BleError::Raw(e as u32),
        })
    }

    fn notify(
        &mut self,
        conn: ConnHandle,
        handle: AttrHandle,
        data: &[u8],
    ) -> Result<(), BleError> {
        // The link may drop between the last dispatched event and this call.
        let Some(conn) = Connection::from_handle(conn.0) else {
            return Err(BleError::NotDelivered(BLE_ERROR_INVALID_CONN_HANDLE));
        };
        gatt_server::notify_value(&conn, handle.0, data).map_err(|e| match e {
            NotifyValueError::Disconnected => {
                BleError::NotDelivered(BLE_ERROR_INVALID_CONN_HANDLE)
            }
            NotifyValueError::Raw(e) => BleError::from_notify(e as u32),
        })
    }
}
