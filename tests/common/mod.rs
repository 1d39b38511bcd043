//! Fakes shared by the integration tests: a recording script engine, a
//! drop-journaling callback reference and a scriptable native source.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use evbridge::{
    ConversionError, Emit, Event, EventSource, Field, NativeError, OwnedBytes, Payload,
    PendingWork, Producer, ScriptEngine, ScriptError,
};

/// Ordered log of teardown-relevant happenings across contexts.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// ─── Script engine ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Bool(bool),
    Int(i32),
    Uint(u32),
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(props) => props.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Script function reference. Dropping it is the release.
pub struct Callback {
    pub id: u32,
    releases: Arc<AtomicU32>,
    journal: Option<Journal>,
}

impl Callback {
    pub fn new(id: u32) -> (Self, Arc<AtomicU32>) {
        let releases = Arc::new(AtomicU32::new(0));
        (
            Self {
                id,
                releases: releases.clone(),
                journal: None,
            },
            releases,
        )
    }

    pub fn journaled(id: u32, journal: &Journal) -> (Self, Arc<AtomicU32>) {
        let (mut cb, releases) = Self::new(id);
        cb.journal = Some(journal.clone());
        (cb, releases)
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if let Some(j) = &self.journal {
            j.note(format!("release {}", self.id));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callback: u32,
    pub event: String,
    pub payload: Option<Value>,
}

#[derive(Default)]
pub struct FakeEngine {
    pub calls: Vec<Call>,
    /// Every call raises when set.
    pub fail_calls: bool,
    /// Run inside every call, before it is recorded.
    pub on_call: Option<Box<dyn FnMut()>>,
    /// `run_pending` returns `false` once this reaches zero.
    pub ticks_left: u32,
    alloc_budget: Option<usize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_allocations_after(&mut self, n: usize) {
        self.alloc_budget = Some(n);
    }

    pub fn allow_allocations(&mut self) {
        self.alloc_budget = None;
    }

    pub fn event_names(&self) -> Vec<&str> {
        self.calls.iter().map(|c| c.event.as_str()).collect()
    }

    fn alloc(&mut self) -> Result<(), ConversionError> {
        match self.alloc_budget.as_mut() {
            Some(0) => Err(ConversionError::OutOfMemory),
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl ScriptEngine for FakeEngine {
    type Value = Value;
    type Function = Callback;

    fn string(&mut self, s: &str) -> Result<Value, ConversionError> {
        self.alloc()?;
        Ok(Value::Str(s.into()))
    }

    fn bytes(&mut self, data: &[u8]) -> Result<Value, ConversionError> {
        self.alloc()?;
        Ok(Value::Bytes(data.to_vec()))
    }

    fn boolean(&mut self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn int(&mut self, value: i32) -> Value {
        Value::Int(value)
    }

    fn uint(&mut self, value: u32) -> Value {
        Value::Uint(value)
    }

    fn object(&mut self) -> Result<Value, ConversionError> {
        self.alloc()?;
        Ok(Value::Object(Vec::new()))
    }

    fn set_property(
        &mut self,
        object: &mut Value,
        key: &str,
        value: Value,
    ) -> Result<(), ConversionError> {
        if let Value::Object(props) = object {
            props.push((key.into(), value));
        }
        Ok(())
    }

    fn call(
        &mut self,
        callback: &Callback,
        event: Value,
        payload: Option<Value>,
    ) -> Result<(), ScriptError> {
        if let Some(hook) = self.on_call.as_mut() {
            hook();
        }
        if self.fail_calls {
            return Err(ScriptError);
        }
        let Value::Str(event) = event else {
            return Err(ScriptError);
        };
        self.calls.push(Call {
            callback: callback.id,
            event,
            payload,
        });
        Ok(())
    }
}

impl PendingWork for FakeEngine {
    fn run_pending(&mut self) -> bool {
        if self.ticks_left == 0 {
            return false;
        }
        self.ticks_left -= 1;
        true
    }
}

// ─── Records ──────────────────────────────────────────────────────────────

/// Test record that journals when it is freed.
#[derive(Debug)]
pub struct Tick {
    pub seq: u32,
    pub data: OwnedBytes,
    journal: Option<Journal>,
}

impl Tick {
    pub fn new(seq: u32) -> Self {
        Self {
            seq,
            data: OwnedBytes::try_copy(&seq.to_le_bytes()).unwrap(),
            journal: None,
        }
    }

    pub fn journaled(seq: u32, journal: &Journal) -> Self {
        let mut tick = Self::new(seq);
        tick.journal = Some(journal.clone());
        tick
    }
}

impl Drop for Tick {
    fn drop(&mut self) {
        if let Some(j) = &self.journal {
            j.note(format!("free {}", self.seq));
        }
    }
}

impl Event for Tick {
    fn name(&self) -> &'static str {
        "tick"
    }

    fn payload(&self) -> Option<Payload<'_>> {
        Some(
            Payload::new()
                .with("seq", Field::Uint(self.seq))
                .with("data", Field::Bytes(&self.data)),
        )
    }
}

pub fn seq_of(call: &Call) -> u32 {
    match call.payload.as_ref().and_then(|p| p.get("seq")) {
        Some(Value::Uint(seq)) => *seq,
        other => panic!("no seq in {:?}", other),
    }
}

// ─── Native source ────────────────────────────────────────────────────────

type InFlight<T, const N: usize> = Box<dyn FnMut(&Producer<T, N>) -> Emit>;

/// Stand-in for a native peripheral API's callback registration.
pub struct FakeSource<T, const N: usize> {
    label: &'static str,
    registered: Arc<Mutex<Option<Producer<T, N>>>>,
    journal: Journal,
    /// Detach calls that fail before one succeeds.
    pub detach_failures: u32,
    /// Next attach fails with this code.
    pub attach_error: Option<i32>,
    /// Runs once inside `detach`, as a native callback already in flight.
    pub in_flight: Option<InFlight<T, N>>,
    pub in_flight_outcome: Option<Emit>,
    next_handle: u32,
}

impl<T, const N: usize> FakeSource<T, N> {
    pub fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            registered: Arc::new(Mutex::new(None)),
            journal: journal.clone(),
            detach_failures: 0,
            attach_error: None,
            in_flight: None,
            in_flight_outcome: None,
            next_handle: 1,
        }
    }

    /// The producer the native side currently holds.
    pub fn producer(&self) -> Option<Producer<T, N>> {
        self.registered.lock().unwrap().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.registered.lock().unwrap().is_some()
    }
}

impl<T: Event, const N: usize> EventSource<N> for FakeSource<T, N> {
    type Event = T;
    type Handle = u32;

    fn attach(&mut self, producer: Producer<T, N>) -> Result<u32, NativeError> {
        if let Some(code) = self.attach_error.take() {
            return Err(NativeError(code));
        }
        *self.registered.lock().unwrap() = Some(producer);
        self.journal.note(format!("attach {}", self.label));
        let handle = self.next_handle;
        self.next_handle += 1;
        Ok(handle)
    }

    fn detach(&mut self, _handle: &u32) -> Result<(), NativeError> {
        self.journal.note(format!("detach {}", self.label));
        if let Some(mut callback) = self.in_flight.take() {
            if let Some(p) = self.producer() {
                self.in_flight_outcome = Some(callback(&p));
            }
        }
        if self.detach_failures > 0 {
            self.detach_failures -= 1;
            return Err(NativeError(-1));
        }
        self.registered.lock().unwrap().take();
        Ok(())
    }
}
