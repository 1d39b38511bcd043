//! CoAP client module: responses to requests issued from script.
//!
//! Requests are sent with a 2-byte token, so responses carrying any other
//! token length are not ours and are ignored in the callback.

use heapless::String;

use crate::config::{COAP_OVERFLOW, COAP_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::net::format_ipv4;
use crate::queue::{DropReason, Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, Payload};

pub const NAME: &str = "coap";

/// Option number of Content-Format (RFC 7252 §5.10).
pub const OPTION_CONTENT_FORMAT: u16 = 12;

const TOKEN_LEN: usize = 2;

/// One option of a received packet.
#[derive(Debug, Clone, Copy)]
pub struct CoapOption<'a> {
    pub number: u16,
    pub value: &'a [u8],
}

/// Borrowed view of a packet as the CoAP library hands it to the callback.
#[derive(Debug, Clone, Copy)]
pub struct CoapPacket<'a> {
    pub msg_type: u8,
    /// Response code as `class * 10 + detail` (e.g. 25 for 2.05).
    pub code: u8,
    pub message_id: u16,
    pub token: &'a [u8],
    pub options: &'a [CoapOption<'a>],
    pub payload: &'a [u8],
}

/// `class * 10 + detail` to the RFC 7252 code byte `c.dd`.
pub fn rfc_code(code: u8) -> u8 {
    let class = (code / 10) % 10;
    let detail = code % 10;
    (class << 5) | detail
}

/// Content-Format of the first such option, big-endian, up to 4 bytes.
pub fn content_format(options: &[CoapOption<'_>]) -> Option<u32> {
    options
        .iter()
        .find(|o| o.number == OPTION_CONTENT_FORMAT)
        .map(|o| {
            o.value
                .iter()
                .take(4)
                .fold(0u32, |acc, b| (acc << 8) | u32::from(*b))
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoapResponse {
    pub msg_type: u8,
    /// RFC 7252 code byte.
    pub code: u8,
    pub message_id: u16,
    pub token: u16,
    pub payload: Option<OwnedBytes>,
    pub content_format: Option<u32>,
    pub remote_ip: String<15>,
    pub remote_port: u16,
}

impl Event for CoapResponse {
    fn name(&self) -> &'static str {
        "response"
    }

    fn payload(&self) -> Option<Payload<'_>> {
        Some(
            Payload::new()
                .with("type", Field::Uint(self.msg_type.into()))
                .with("code", Field::Uint(self.code.into()))
                .with("message_id", Field::Uint(self.message_id.into()))
                .with("token", Field::Uint(self.token.into()))
                .with_opt(
                    "payload",
                    self.payload.as_deref().map(Field::text_or_bytes),
                )
                .with_opt("content_format", self.content_format.map(Field::Uint))
                .with("remote_ip", Field::Text(&self.remote_ip))
                .with("remote_port", Field::Int(self.remote_port.into())),
        )
    }
}

#[derive(Clone)]
pub struct CoapProducer {
    producer: Producer<CoapResponse, COAP_QUEUE_DEPTH>,
}

impl CoapProducer {
    pub fn new(producer: Producer<CoapResponse, COAP_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_response(&self, packet: &CoapPacket<'_>, remote_ip: [u8; 4], remote_port: u16) -> Emit {
        if packet.token.len() != TOKEN_LEN {
            return Emit::Dropped(DropReason::Ignored);
        }
        self.producer.emit_with(|| {
            let payload = match packet.payload {
                [] => None,
                bytes => Some(OwnedBytes::try_copy(bytes)?),
            };
            Some(CoapResponse {
                msg_type: packet.msg_type,
                code: rfc_code(packet.code),
                message_id: packet.message_id,
                token: u16::from_be_bytes([packet.token[0], packet.token[1]]),
                payload,
                content_format: content_format(packet.options),
                remote_ip: format_ipv4(remote_ip),
                remote_port,
            })
        })
    }
}

pub type CoapModule<E, S> = Module<E, S, COAP_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> CoapModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<COAP_QUEUE_DEPTH, Event = CoapResponse>,
{
    Module::new(NAME, source, COAP_OVERFLOW)
}
