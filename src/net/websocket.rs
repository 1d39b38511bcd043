//! WebSocket server module: client connections and text messages.
//!
//! The server library reports a text message as one or more frames, each
//! with its offset into the whole message. The producer reassembles one
//! message at a time; a new first frame discards whatever was in flight.

use alloc::vec::Vec;

use crate::config::{WEBSOCKET_OVERFLOW, WEBSOCKET_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{DropReason, Emit, Producer};
use crate::record::{Event, Field, OwnedText, Payload};

pub const NAME: &str = "websocket";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSocketEvent {
    Connected { client_id: u32 },
    Disconnected { client_id: u32 },
    Received { client_id: u32, payload: OwnedText },
}

impl Event for WebSocketEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Disconnected { .. } => "disconnected",
            Self::Received { .. } => "received",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        match self {
            Self::Connected { client_id } | Self::Disconnected { client_id } => {
                Some(Payload::new().with("client_id", Field::Uint(*client_id)))
            }
            Self::Received { client_id, payload } => Some(
                Payload::new()
                    .with("client_id", Field::Uint(*client_id))
                    .with("payload", Field::Text(payload)),
            ),
        }
    }
}

/// One frame of a text message.
#[derive(Debug, Clone, Copy)]
pub struct TextFrame<'a> {
    pub client_id: u32,
    /// Offset of `data` within the message.
    pub index: usize,
    /// Length of the whole message.
    pub total: usize,
    pub data: &'a [u8],
    pub is_final: bool,
}

struct Assembly {
    client_id: u32,
    buf: Vec<u8>,
}

/// Owned by the server's event handler; not shared between contexts.
pub struct WebSocketProducer {
    producer: Producer<WebSocketEvent, WEBSOCKET_QUEUE_DEPTH>,
    assembly: Option<Assembly>,
}

impl WebSocketProducer {
    pub fn new(producer: Producer<WebSocketEvent, WEBSOCKET_QUEUE_DEPTH>) -> Self {
        Self {
            producer,
            assembly: None,
        }
    }

    pub fn on_connect(&mut self, client_id: u32) -> Emit {
        self.producer.emit(WebSocketEvent::Connected { client_id })
    }

    pub fn on_disconnect(&mut self, client_id: u32) -> Emit {
        if self.assembly.as_ref().is_some_and(|a| a.client_id == client_id) {
            self.assembly = None;
        }
        self.producer
            .emit(WebSocketEvent::Disconnected { client_id })
    }

    /// Feed one text frame. Returns `None` while the message is still
    /// incomplete.
    pub fn on_text_frame(&mut self, frame: &TextFrame<'_>) -> Option<Emit> {
        if frame.index == 0 {
            self.assembly = None;
            if !self.producer.is_observed() {
                return Some(Emit::Dropped(DropReason::Unobserved));
            }
            let mut buf = Vec::new();
            if buf.try_reserve_exact(frame.total).is_err() {
                // Counted as an allocation failure on the channel.
                return Some(self.producer.emit_with(|| None));
            }
            buf.resize(frame.total, 0);
            self.assembly = Some(Assembly {
                client_id: frame.client_id,
                buf,
            });
        }

        let Some(assembly) = self.assembly.as_mut() else {
            return Some(Emit::Dropped(DropReason::Ignored));
        };
        if assembly.client_id != frame.client_id {
            return Some(Emit::Dropped(DropReason::Ignored));
        }
        let end = frame.index.saturating_add(frame.data.len());
        let Some(dest) = assembly.buf.get_mut(frame.index..end) else {
            warn!("websocket: fragment out of range - dropped");
            return Some(Emit::Dropped(DropReason::Ignored));
        };
        dest.copy_from_slice(frame.data);

        if !frame.is_final {
            return None;
        }

        let Assembly { client_id, buf } = self.assembly.take()?;
        let Some(payload) = OwnedText::from_utf8(buf) else {
            warn!("websocket: message is not valid UTF-8 - dropped");
            return Some(Emit::Dropped(DropReason::Ignored));
        };
        Some(
            self.producer
                .emit(WebSocketEvent::Received { client_id, payload }),
        )
    }
}

pub type WebSocketModule<E, S> = Module<E, S, WEBSOCKET_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> WebSocketModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<WEBSOCKET_QUEUE_DEPTH, Event = WebSocketEvent>,
{
    Module::new(NAME, source, WEBSOCKET_OVERFLOW)
}
