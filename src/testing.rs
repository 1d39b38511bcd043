//! In-crate fakes for unit tests: a recording script engine and a
//! drop-counting callback reference.

use std::cell::Cell;
use std::rc::Rc;

use crate::engine::{ConversionError, PendingWork, ScriptEngine, ScriptError};

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

/// Script function reference that counts its releases.
pub struct Callback {
    pub id: u32,
    releases: Rc<Cell<u32>>,
}

impl Callback {
    pub fn new(id: u32) -> (Self, Rc<Cell<u32>>) {
        let releases = Rc::new(Cell::new(0));
        (
            Self {
                id,
                releases: releases.clone(),
            },
            releases,
        )
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        self.releases.set(self.releases.get() + 1);
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
    /// Runs inside every call, as the script body would.
    pub on_call: Option<Box<dyn FnMut()>>,
    /// `run_pending` returns `false` once this reaches zero.
    pub ticks_left: u32,
    /// Runs inside every `run_pending` that returns `true`.
    pub on_pending: Option<Box<dyn FnMut()>>,
    alloc_budget: Option<usize>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let `n` more allocating constructors succeed, then fail.
    pub fn fail_allocations_after(&mut self, n: usize) {
        self.alloc_budget = Some(n);
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
        if let Some(hook) = self.on_pending.as_mut() {
            hook();
        }
        true
    }
}
