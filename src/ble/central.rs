//! BLE central module: GATT client role with pairing support.

use crate::ble::{format_address, AddressText, AuthStatus};
use crate::config::{BLE_CENTRAL_OVERFLOW, BLE_CENTRAL_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, OwnedText, Payload};

pub const NAME: &str = "ble_central";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CentralEvent {
    Connect {
        address: AddressText,
    },
    ConnectFailed,
    Disconnect,
    Notify {
        /// Characteristic UUID as printed by the host stack.
        characteristic: OwnedText,
        data: OwnedBytes,
    },
    /// The peer asks for a passkey.
    PasskeyEntry,
    AuthComplete(AuthStatus),
}

impl Event for CentralEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::ConnectFailed => "connect_failed",
            Self::Disconnect => "disconnect",
            Self::Notify { .. } => "notify",
            Self::PasskeyEntry => "passkey_entry",
            Self::AuthComplete(_) => "auth_complete",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Connect { address } => {
                Some(Payload::new().with("address", Field::Text(address)))
            }
            Self::ConnectFailed | Self::Disconnect | Self::PasskeyEntry => None,
            Self::Notify {
                characteristic,
                data,
            } => Some(
                Payload::new()
                    .with("characteristic", Field::Text(characteristic))
                    .with("data", Field::Bytes(data)),
            ),
            Self::AuthComplete(status) => Some(status.payload()),
        }
    }
}

/// Called from the host stack's client callbacks.
#[derive(Clone)]
pub struct CentralProducer {
    producer: Producer<CentralEvent, BLE_CENTRAL_QUEUE_DEPTH>,
}

impl CentralProducer {
    pub fn new(producer: Producer<CentralEvent, BLE_CENTRAL_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_connect(&self, address: &[u8; 6]) -> Emit {
        self.producer.emit_with(|| {
            Some(CentralEvent::Connect {
                address: format_address(address),
            })
        })
    }

    pub fn on_connect_failed(&self) -> Emit {
        self.producer.emit(CentralEvent::ConnectFailed)
    }

    pub fn on_disconnect(&self) -> Emit {
        self.producer.emit(CentralEvent::Disconnect)
    }

    /// Both buffers belong to the stack and are copied.
    pub fn on_notify(&self, characteristic: &str, data: &[u8]) -> Emit {
        self.producer.emit_with(|| {
            Some(CentralEvent::Notify {
                characteristic: OwnedText::try_copy(characteristic)?,
                data: OwnedBytes::try_copy(data)?,
            })
        })
    }

    pub fn on_passkey_entry(&self) -> Emit {
        self.producer.emit(CentralEvent::PasskeyEntry)
    }

    pub fn on_auth_complete(&self, status: AuthStatus) -> Emit {
        self.producer.emit(CentralEvent::AuthComplete(status))
    }
}

pub type CentralModule<E, S> = Module<E, S, BLE_CENTRAL_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> CentralModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<BLE_CENTRAL_QUEUE_DEPTH, Event = CentralEvent>,
{
    Module::new(NAME, source, BLE_CENTRAL_OVERFLOW)
}
