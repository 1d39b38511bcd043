//! WebSocket client module: connection state and text messages from the
//! server the script connected to.
//!
//! Binary messages are not bridged.

use crate::config::{WEBSOCKET_CLIENT_OVERFLOW, WEBSOCKET_CLIENT_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{DropReason, Emit, Producer};
use crate::record::{Event, Field, OwnedText, Payload};

pub const NAME: &str = "websocket_client";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    /// Delivered with the message itself as the payload.
    Text(OwnedText),
}

impl Event for ClientEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Text(_) => "text",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Connected | Self::Disconnected => None,
            Self::Text(text) => Some(Payload::scalar(Field::Text(text))),
        }
    }
}

#[derive(Clone)]
pub struct ClientProducer {
    producer: Producer<ClientEvent, WEBSOCKET_CLIENT_QUEUE_DEPTH>,
}

impl ClientProducer {
    pub fn new(producer: Producer<ClientEvent, WEBSOCKET_CLIENT_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_connected(&self) -> Emit {
        self.producer.emit(ClientEvent::Connected)
    }

    pub fn on_disconnected(&self) -> Emit {
        self.producer.emit(ClientEvent::Disconnected)
    }

    /// Message callback. Only text messages that are valid UTF-8 are
    /// queued.
    pub fn on_message(&self, data: &[u8], is_text: bool) -> Emit {
        if !is_text {
            return Emit::Dropped(DropReason::Ignored);
        }
        let Ok(text) = core::str::from_utf8(data) else {
            return Emit::Dropped(DropReason::Ignored);
        };
        self.producer
            .emit_with(|| OwnedText::try_copy(text).map(ClientEvent::Text))
    }
}

pub type ClientModule<E, S> = Module<E, S, WEBSOCKET_CLIENT_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> ClientModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<WEBSOCKET_CLIENT_QUEUE_DEPTH, Event = ClientEvent>,
{
    Module::new(NAME, source, WEBSOCKET_CLIENT_OVERFLOW)
}
