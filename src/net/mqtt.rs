//! MQTT client module: messages on subscribed topics.
//!
//! Queue overflow evicts the oldest message, so a script that falls
//! behind sees the most recent state of its topics.

use crate::config::{MQTT_OVERFLOW, MQTT_QUEUE_DEPTH};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{Emit, Producer};
use crate::record::{Event, Field, OwnedBytes, OwnedText, Payload};

pub const NAME: &str = "mqtt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttMessage {
    pub topic: OwnedText,
    pub payload: OwnedBytes,
}

impl Event for MqttMessage {
    fn name(&self) -> &'static str {
        "message"
    }

    fn payload(&self) -> Option<Payload<'_>> {
        Some(
            Payload::new()
                .with("topic", Field::Text(&self.topic))
                .with("payload", Field::text_or_bytes(&self.payload)),
        )
    }
}

#[derive(Clone)]
pub struct MqttProducer {
    producer: Producer<MqttMessage, MQTT_QUEUE_DEPTH>,
}

impl MqttProducer {
    pub fn new(producer: Producer<MqttMessage, MQTT_QUEUE_DEPTH>) -> Self {
        Self { producer }
    }

    pub fn on_message(&self, topic: &str, payload: &[u8]) -> Emit {
        self.producer.emit_with(|| {
            Some(MqttMessage {
                topic: OwnedText::try_copy(topic)?,
                payload: OwnedBytes::try_copy(payload)?,
            })
        })
    }
}

pub type MqttModule<E, S> = Module<E, S, MQTT_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> MqttModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<MQTT_QUEUE_DEPTH, Event = MqttMessage>,
{
    Module::new(NAME, source, MQTT_OVERFLOW)
}
