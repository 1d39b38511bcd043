//! Button input module.
//!
//! Buttons are active-low with internal pull-ups. The GPIO edge interrupt
//! calls [`InputProducer::on_edge`] with the new level and a millisecond
//! timestamp; edges closer than `BUTTON_DEBOUNCE_MS` to the last accepted
//! edge on the same button are contact bounce and are ignored.

use crate::config::{BUTTON_DEBOUNCE_MS, INPUT_OVERFLOW, INPUT_QUEUE_DEPTH, MAX_BUTTONS};
use crate::engine::ScriptEngine;
use crate::module::{EventSource, Module};
use crate::queue::{DropReason, Emit, Producer};
use crate::record::{Event, Field, Payload};

pub const NAME: &str = "input";

/// Button edge after debouncing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InputEvent {
    Pressed { button: u8 },
    Released { button: u8 },
}

impl Event for InputEvent {
    fn name(&self) -> &'static str {
        match self {
            Self::Pressed { .. } => "pressed",
            Self::Released { .. } => "released",
        }
    }

    fn payload(&self) -> Option<Payload<'_>> {
        let (Self::Pressed { button } | Self::Released { button }) = self;
        Some(Payload::new().with("button", Field::Uint((*button).into())))
    }
}

#[derive(Clone, Copy, Default)]
struct ButtonState {
    pressed: bool,
    last_edge_ms: Option<u64>,
}

/// Owned by the GPIO interrupt handler.
pub struct InputProducer {
    producer: Producer<InputEvent, INPUT_QUEUE_DEPTH>,
    buttons: [ButtonState; MAX_BUTTONS],
}

impl InputProducer {
    pub fn new(producer: Producer<InputEvent, INPUT_QUEUE_DEPTH>) -> Self {
        Self {
            producer,
            buttons: [ButtonState::default(); MAX_BUTTONS],
        }
    }

    /// Report a level change on `button`. Debounce state is tracked even
    /// while no callback is registered.
    pub fn on_edge(&mut self, button: u8, pressed: bool, now_ms: u64) -> Emit {
        let Some(state) = self.buttons.get_mut(button as usize) else {
            return Emit::Dropped(DropReason::Ignored);
        };
        if state.pressed == pressed {
            return Emit::Dropped(DropReason::Ignored);
        }
        if let Some(last) = state.last_edge_ms {
            if now_ms.saturating_sub(last) < BUTTON_DEBOUNCE_MS {
                return Emit::Dropped(DropReason::Ignored);
            }
        }
        state.pressed = pressed;
        state.last_edge_ms = Some(now_ms);

        let event = if pressed {
            InputEvent::Pressed { button }
        } else {
            InputEvent::Released { button }
        };
        self.producer.emit(event)
    }

    /// [`on_edge`](Self::on_edge) stamped with the embassy clock.
    #[cfg(feature = "embassy")]
    pub fn on_edge_now(&mut self, button: u8, pressed: bool) -> Emit {
        self.on_edge(button, pressed, embassy_time::Instant::now().as_millis())
    }

    pub fn is_pressed(&self, button: u8) -> bool {
        self.buttons
            .get(button as usize)
            .is_some_and(|state| state.pressed)
    }
}

pub type InputModule<E, S> = Module<E, S, INPUT_QUEUE_DEPTH>;

pub fn module<E, S>(source: S) -> InputModule<E, S>
where
    E: ScriptEngine,
    S: EventSource<INPUT_QUEUE_DEPTH, Event = InputEvent>,
{
    Module::new(NAME, source, INPUT_OVERFLOW)
}
