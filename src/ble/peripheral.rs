//! BLE peripheral (GATT server) module.

use crate::ble::{format_address, AddressText, AuthStatus};
use crate::config::{BLE_PERIPHERAL_OVERFLOW, BLE_PERIPHERAL_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, Payload};

pub const NAME: &str = "ble_peripheral";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeripheralEvent {
    Connect { address: AddressText },
    Disconnect,
    /// A central wrote the bridged characteristic.
    Write { data: OwnedBytes },
    /// Show this passkey to the user.
    PasskeyDisplay { passkey: u32 },
    AuthComplete(AuthStatus),
}

impl Event for PeripheralEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::Disconnect => "disconnect",
            Self::Write { .. } => "write",
            Self::PasskeyDisplay { .. } => "passkey_display",
            Self::AuthComplete(_) => "auth_complete",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Connect { address } => {
                Some(Payload::new().with("address", Field::Text(address)))
            }
            Self::Disconnect => None,
            Self::Write { data } => Some(Payload::new().with("data", Field::Bytes(data))),
            Self::PasskeyDisplay { passkey } => {
                Some(Payload::new().with("passkey", Field::Uint(*passkey)))
            }
            Self::AuthComplete(status) => Some(status.payload()),
        }
    }
}

/// Called from the host stack's server callbacks.
#[derive(Clone)]
pub struct PeripheralProducer {
    producer: Producer<PeripheralEvent, BLE_PERIPHERAL_QUEUE_DEPTH>,
}

impl PeripheralProducer {
    pub fn new(producer: Producer<PeripheralEvent, BLE_PERIPHERAL_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_connect(&self, address: &[u8; 6]) -> Emit {
        self.producer.emit_with(|| {
            Some(PeripheralEvent::Connect {
                address: format_address(address),
            })
        })
    }

    pub fn on_disconnect(&self) -> Emit {
        self.producer.emit(PeripheralEvent::Disconnect)
    }

    /// `value` is the stack's buffer; it is copied before returning.
    pub fn on_write(&self, value: &[u8]) -> Emit {
        self.producer.emit_with(|| {
            OwnedBytes::try_copy(value).map(|data| PeripheralEvent::Write { data })
        })
    }

    pub fn on_passkey_display(&self, passkey: u32) -> Emit {
        self.producer
            .emit(PeripheralEvent::PasskeyDisplay { passkey })
    }

    pub fn on_auth_complete(&self, status: AuthStatus) -> Emit {
        self.producer.emit(PeripheralEvent::AuthComplete(status))
    }
}

pub type PeripheralModule<E, S> = Module<E, S, BLE_PERIPHERAL_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> PeripheralModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<BLE_PERIPHERAL_QUEUE_DEPTH, Event = PeripheralEvent>,
{
    Module::new(NAME, source, BLE_PERIPHERAL_OVERFLOW)
}
