//! ESP-NOW module: send confirmations and received frames.

use crate::config::{ESPNOW_OVERFLOW, ESPNOW_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, Payload};

pub const NAME: &str = "espnow";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EspNowEvent {
    /// Delivery report for a frame sent from script. `status` is the
    /// driver's code, 0 on success.
    Send { mac: [u8; 6], status: i32 },
    Recv { mac: [u8; 6], data: OwnedBytes },
}

impl Event for EspNowEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Send { .. } => "send",
            Self::Recv { .. } => "recv",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Send { mac, status } => Some(
                Payload::new()
                    .with("macaddress", Field::Bytes(mac))
                    .with("status", Field::Int(*status)),
            ),
            Self::Recv { mac, data } => Some(
                Payload::new()
                    .with("macaddress", Field::Bytes(mac))
                    .with("data", Field::text_or_bytes(data)),
            ),
        }
    }
}

/// Called from the Wi-Fi task's send and receive callbacks.
#[derive(Clone)]
pub struct EspNowProducer {
    producer: Producer<EspNowEvent, ESPNOW_QUEUE_DEPTH>,
}

impl EspNowProducer {
    pub fn new(producer: Producer<EspNowEvent, ESPNOW_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_send(&self, mac: &[u8; 6], status: i32) -> Emit {
        self.producer.emit(EspNowEvent::Send { mac: *mac, status })
    }

    pub fn on_recv(&self, mac: &[u8; 6], data: &[u8]) -> Emit {
        self.producer.emit_with(|| {
            Some(EspNowEvent::Recv {
                mac: *mac,
                data: OwnedBytes::try_copy(data)?,
            })
        })
    }
}

pub type EspNowModule<E, S> = Module<E, S, ESPNOW_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> EspNowModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<ESPNOW_QUEUE_DEPTH, Event = EspNowEvent>,
{
    Module::new(NAME, source, ESPNOW_OVERFLOW)
}
