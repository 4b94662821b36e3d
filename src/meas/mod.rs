//! BLE Measurement Service.
//!
//! Exposes the 16 LTC2497 channels as GATT characteristics in one
//! vendor-specific primary service:
//!
//! 1. **Registration** - adds the service and one read/write/notify
//!    characteristic per channel, zero-filled.
//! 2. **Event dispatch** - tracks the active connection and each
//!    channel's CCCD from SoftDevice connect / disconnect / write events,
//!    reporting them to an application handler.
//! 3. **Update / notify** - stores a fresh 4-byte sample and pushes it
//!    to the connected central.
//!
//! The service talks to the stack only through [`gatt::GattServer`].

pub mod cccd;
pub mod gatt;
pub mod service;


use gatt::{AttrHandle, CharHandles, ConnHandle};

pub use service::MeasurementService;

/// Number of ADC channels exposed by the service.
pub const CHANNEL_COUNT: usize = 16;

/// Width of a channel value in bytes.
pub const VALUE_LEN: usize = crate::config::MEAS_VALUE_LEN as usize;

/// One channel value as stored in the attribute table.
pub type ChannelValue = [u8; VALUE_LEN];

/// Link state of the (single) peripheral connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    NoConnection,
    Active(ConnHandle),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Active(_))
    }
}

/// What happens to the CCCD flags when the link drops.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscriptionPolicy {
    /// Clear every channel's flag on disconnect.
    ResetOnDisconnect,
    /// Keep flags untouched; a new central inherits them until it writes
    /// its own CCCDs.
    Retain,
}

/// Whether the update path notifies channels the peer has not subscribed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeliveryPolicy {
    /// Always call the stack's notify; it refuses unsubscribed channels.
    Always,
    /// Skip the notify call and report `Error::NotSubscribed`.
    SubscribedOnly,
}

/// Behavioural knobs of a [`MeasurementService`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceConfig {
    pub subscription: SubscriptionPolicy,
    pub delivery: DeliveryPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            subscription: SubscriptionPolicy::ResetOnDisconnect,
            delivery: DeliveryPolicy::Always,
        }
    }
}

/// Per-channel state: attribute handles, last stored value and CCCD flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSlot {
    handles: CharHandles,
    value: ChannelValue,
    subscribed: bool,
}

impl ChannelSlot {
    pub(crate) const fn new(handles: CharHandles) -> Self {
        Self {
            handles,
            value: [0; VALUE_LEN],
            subscribed: false,
        }
    }

    /// Handle of the value attribute.
    pub fn value_handle(&self) -> AttrHandle {
        self.handles.value
    }

    /// Handle of the CCCD.
    pub fn cccd_handle(&self) -> AttrHandle {
        self.handles.cccd
    }

    /// Last value successfully stored by the update path.
    pub fn value(&self) -> &ChannelValue {
        &self.value
    }

    /// Raw CCCD flag as last written by a peer.
    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

/// Stack events consumed by the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BleEvent<'a> {
    /// GAP link established.
    Connected { conn: ConnHandle },
    /// GAP link lost or closed.
    Disconnected { conn: ConnHandle },
    /// A peer wrote an attribute.
    Write(WriteEvent<'a>),
    /// The stack finished transmitting `count` queued notifications.
    NotifyTxComplete { conn: ConnHandle, count: u8 },
}

/// Attribute write as reported by the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteEvent<'a> {
    pub conn: ConnHandle,
    pub handle: AttrHandle,
    pub offset: u16,
    pub data: &'a [u8],
}

/// Events reported to the application handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasEvent<'a> {
    Connected,
    Disconnected,
    NotificationEnabled {
        channel: usize,
        write: &'a WriteEvent<'a>,
    },
    NotificationDisabled {
        channel: usize,
        write: &'a WriteEvent<'a>,
    },
}

/// Application callback for [`MeasEvent`]s.
///
/// Called synchronously from the dispatcher, never re-entrantly, with a
/// read-only view of the service state after the transition was applied.
pub trait MeasEventHandler {
    fn on_meas_event(&mut self, state: &ServiceState, event: &MeasEvent<'_>);
}

impl<F> MeasEventHandler for F
where
    F: FnMut(&ServiceState, &MeasEvent<'_>),
{
    fn on_meas_event(&mut self, state: &ServiceState, event: &MeasEvent<'_>) {
        self(state, event)
    }
}

/// Service state shared between the dispatcher and the update path.
///
/// The dispatcher owns `connection` and the CCCD flags, the update path
/// owns the channel values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceState {
    pub(crate) service_handle: gatt::ServiceHandle,
    pub(crate) uuid_type: u8,
    pub(crate) connection: ConnectionState,
    pub(crate) channels: [ChannelSlot; CHANNEL_COUNT],
    pub(crate) config: ServiceConfig,
}

impl ServiceState {
    pub fn service_handle(&self) -> gatt::ServiceHandle {
        self.service_handle
    }

    /// Vendor UUID type assigned to `MEAS_UUID_BASE`.
    pub fn uuid_type(&self) -> u8 {
        self.uuid_type
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn channels(&self) -> &[ChannelSlot; CHANNEL_COUNT] {
        &self.channels
    }

    pub fn channel(&self, channel: usize) -> Option<&ChannelSlot> {
        self.channels.get(channel)
    }

    /// `true` when a central is connected and has enabled notifications on
    /// `channel`.
    pub fn notifications_enabled(&self, channel: usize) -> bool {
        self.connection.is_connected()
            && self.channels.get(channel).is_some_and(|c| c.subscribed)
    }

    /// Channel whose CCCD lives at `handle`.
    pub fn channel_for_cccd(&self, handle: AttrHandle) -> Option<usize> {
        self.channels.iter().position(|c| c.handles.cccd == handle)
    }
}
