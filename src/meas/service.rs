//! Measurement service instance: registration, event dispatch and the
//! update / notify path.

use super::cccd::Cccd;
use super::gatt::{
    AttrHandle, AttrPermissions, CharHandles, CharacteristicDef, GattServer, Properties,
    ServiceHandle, Uuid,
};
use super::{
    BleEvent, ChannelSlot, ChannelValue, ConnectionState, DeliveryPolicy, MeasEvent,
    MeasEventHandler, ServiceConfig, ServiceState, SubscriptionPolicy, WriteEvent, CHANNEL_COUNT,
};
use crate::config::{
    MEAS_CH01_CHAR_UUID, MEAS_SERVICE_UUID, MEAS_UUID_BASE, MEAS_VALUE_INIT_LEN, MEAS_VALUE_LEN,
};
use crate::error::{Error, RegisterError};

/// The registered measurement service plus its application handler.
pub struct MeasurementService<H> {
    state: ServiceState,
    handler: H,
}

impl<H: MeasEventHandler> MeasurementService<H> {
    /// Register the service and its 16 channel characteristics.
    ///
    /// Registration stops at the first failure and returns it; whatever
    /// was already added to the attribute table stays there, so the caller
    /// must treat the service as unusable.
    pub fn init<G: GattServer>(
        gatt: &mut G,
        handler: H,
        permissions: AttrPermissions,
        config: ServiceConfig,
    ) -> Result<Self, Error> {
        let uuid_type = gatt
            .register_uuid_base(&MEAS_UUID_BASE)
            .map_err(RegisterError::UuidBase)?;

        let service_handle = gatt
            .add_service(Uuid {
                ty: uuid_type,
                value: MEAS_SERVICE_UUID,
            })
            .map_err(RegisterError::Service)?;

        let unassigned = ChannelSlot::new(CharHandles {
            value: AttrHandle(0),
            cccd: AttrHandle(0),
        });
        let mut channels = [unassigned; CHANNEL_COUNT];
        for (index, slot) in channels.iter_mut().enumerate() {
            let handles = register_channel(gatt, service_handle, uuid_type, index, permissions)?;
            *slot = ChannelSlot::new(handles);
        }

        Ok(Self {
            state: ServiceState {
                service_handle,
                uuid_type,
                connection: ConnectionState::NoConnection,
                channels,
                config,
            },
            handler,
        })
    }

    pub fn state(&self) -> &ServiceState {
        &self.state
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Feed one stack event into the service.
    pub fn on_ble_evt(&mut self, event: &BleEvent<'_>) {
        match event {
            BleEvent::Connected { conn } => {
                self.state.connection = ConnectionState::Active(*conn);
                self.emit(&MeasEvent::Connected);
            }
            BleEvent::Disconnected { .. } => {
                self.state.connection = ConnectionState::NoConnection;
                if self.state.config.subscription == SubscriptionPolicy::ResetOnDisconnect {
                    for slot in self.state.channels.iter_mut() {
                        slot.subscribed = false;
                    }
                }
                self.emit(&MeasEvent::Disconnected);
            }
            BleEvent::Write(write) => self.on_write(write),
            BleEvent::NotifyTxComplete { .. } => {}
        }
    }

    fn on_write(&mut self, write: &WriteEvent<'_>) {
        // Writes to anything but one of our CCCDs are not ours to handle.
        let Some(channel) = self.state.channel_for_cccd(write.handle) else {
            return;
        };

        let enabled = Cccd::decode(write.data).notifications;
        self.state.channels[channel].subscribed = enabled;

        let event = if enabled {
            MeasEvent::NotificationEnabled { channel, write }
        } else {
            MeasEvent::NotificationDisabled { channel, write }
        };
        self.emit(&event);
    }

    fn emit(&mut self, event: &MeasEvent<'_>) {
        self.handler.on_meas_event(&self.state, event);
    }

    /// Store a fresh sample for `channel` and push it to the connected
    /// central.
    ///
    /// The value is written to the attribute table first.  If that
    /// succeeds but nobody is connected, `Error::NotConnected` is returned
    /// and the value stays readable.
    pub fn update<G: GattServer>(
        &mut self,
        gatt: &mut G,
        channel: usize,
        value: &ChannelValue,
    ) -> Result<(), Error> {
        let config = self.state.config;
        let connection = self.state.connection;
        let slot = self
            .state
            .channels
            .get_mut(channel)
            .ok_or(Error::InvalidChannel(channel_id(channel)))?;

        gatt.set_value(slot.handles.value, 0, value)?;
        slot.value = *value;

        let ConnectionState::Active(conn) = connection else {
            return Err(Error::NotConnected);
        };

        if config.delivery == DeliveryPolicy::SubscribedOnly && !slot.subscribed {
            return Err(Error::NotSubscribed);
        }

        gatt.notify(conn, slot.handles.value, value)?;
        Ok(())
    }

    /// Read the value currently held by the attribute table for `channel`.
    pub fn read<G: GattServer>(
        &self,
        gatt: &mut G,
        channel: usize,
        buf: &mut ChannelValue,
    ) -> Result<usize, Error> {
        let slot = self
            .state
            .channel(channel)
            .ok_or(Error::InvalidChannel(channel_id(channel)))?;
        Ok(gatt.get_value(slot.handles.value, buf)?)
    }
}

fn register_channel<G: GattServer>(
    gatt: &mut G,
    service: ServiceHandle,
    uuid_type: u8,
    index: usize,
    permissions: AttrPermissions,
) -> Result<CharHandles, RegisterError> {
    let channel = channel_id(index);
    let def = CharacteristicDef {
        uuid: Uuid {
            ty: uuid_type,
            value: MEAS_CH01_CHAR_UUID + u16::from(channel),
        },
        props: Properties {
            read: true,
            write: true,
            notify: true,
        },
        init_len: MEAS_VALUE_INIT_LEN,
        max_len: MEAS_VALUE_LEN,
        permissions,
    };

    let handles = gatt
        .add_characteristic(service, &def)
        .map_err(|error| RegisterError::Characteristic { channel, error })?;

    // Zero-fill byte by byte so centrals never read stale RAM.
    for offset in 0..def.max_len {
        gatt.set_value(handles.value, offset, &[0])
            .map_err(|error| RegisterError::Characteristic { channel, error })?;
    }

    Ok(handles)
}

fn channel_id(channel: usize) -> u8 {
    u8::try_from(channel).unwrap_or(u8::MAX)
}
