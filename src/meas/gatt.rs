//! GATT server capability surface.
//!
//! The measurement service only needs a handful of attribute-table
//! operations from the BLE stack.  They are collected in the
//! [`GattServer`] trait so the service logic can run against the
//! SoftDevice on target and against an in-memory table in host tests.

use crate::error::BleError;

/// Handle of a registered primary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceHandle(pub u16);

/// Handle of a single attribute (characteristic value or descriptor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttrHandle(pub u16);

/// Handle of an established link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

/// A 16-bit UUID qualified by the stack's UUID type (Bluetooth SIG base or
/// a registered vendor base).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Uuid {
    pub ty: u8,
    pub value: u16,
}

impl Uuid {
    /// Expand a 16-bit alias into the full 128-bit UUID of `base`
    /// (little-endian byte order, alias in bytes 12..14).
    pub const fn expand(base: &[u8; 16], value: u16) -> [u8; 16] {
        let mut full = *base;
        let le = value.to_le_bytes();
        full[12] = le[0];
        full[13] = le[1];
        full
    }
}

/// Characteristic properties advertised in the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

/// Link security required to access an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityMode {
    /// Never accessible.
    NoAccess,
    /// No encryption required.
    Open,
    /// Encrypted link, no MITM protection required.
    Encrypted,
    /// Encrypted link with MITM protection.
    EncryptedMitm,
}

/// Read / write security policy for a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AttrPermissions {
    pub read: SecurityMode,
    pub write: SecurityMode,
}

impl AttrPermissions {
    pub const OPEN: Self = Self {
        read: SecurityMode::Open,
        write: SecurityMode::Open,
    };
}

/// Everything the stack needs to add one characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicDef {
    pub uuid: Uuid,
    pub props: Properties,
    pub init_len: u16,
    pub max_len: u16,
    pub permissions: AttrPermissions,
}

/// Handles returned for a characteristic with a CCCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharHandles {
    /// Value attribute - read / written / notified.
    pub value: AttrHandle,
    /// Client Characteristic Configuration Descriptor.
    pub cccd: AttrHandle,
}

/// Attribute-table operations required by the measurement service.
///
/// Every call is synchronous and returns the stack's acceptance status
/// immediately; none of them waits for the peer.
pub trait GattServer {
    /// Register a vendor-specific 128-bit UUID base, returning the UUID type
    /// to pair with 16-bit aliases.
    fn register_uuid_base(&mut self, base: &[u8; 16]) -> Result<u8, BleError>;

    /// Add a primary service.
    fn add_service(&mut self, uuid: Uuid) -> Result<ServiceHandle, BleError>;

    /// Add a characteristic (value + CCCD) to `service`.
    fn add_characteristic(
        &mut self,
        service: ServiceHandle,
        def: &CharacteristicDef,
    ) -> Result<CharHandles, BleError>;

    /// Overwrite `data.len()` bytes of the stored value at `offset`.
    fn set_value(&mut self, handle: AttrHandle, offset: u16, data: &[u8]) -> Result<(), BleError>;

    /// Copy the stored value into `buf`, returning the number of bytes copied.
    fn get_value(&mut self, handle: AttrHandle, buf: &mut [u8]) -> Result<usize, BleError>;

    /// Queue a notification of `data` on `handle` to the peer on `conn`.
    fn notify(&mut self, conn: ConnHandle, handle: AttrHandle, data: &[u8])
        -> Result<(), BleError>;
}
