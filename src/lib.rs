//! Event bridge between peripheral callback contexts and a
//! single-threaded script loop.
//!
//! Native libraries (BLE host stack, network clients, GPIO interrupts)
//! report events from their own contexts. Each bridged channel owns a
//! bounded queue: producers copy the native data into an owned record and
//! append it, and the cooperative loop drains every queue once per tick,
//! handing each record to the script callback registered for it.
//!
//! ```text
//!  ISR / RTOS task                      cooperative loop
//!  ───────────────                      ────────────────
//!  native callback ──► Producer ──► EventChannel ──► Module::drain ──► callback(event, payload)
//! ```
//!
//! Host tests: `cargo test`. On-target logging: `--features defmt`.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// Must come first so the macros are visible to every module below.
#[macro_use]
mod fmt;

// ═══════════════════════════════════════════════════════════════════════════
// Core
// ═══════════════════════════════════════════════════════════════════════════

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod module;
pub mod queue;
pub mod record;
pub mod registry;
pub mod slot;

#[cfg(feature = "embassy")]
pub mod runner;

// ═══════════════════════════════════════════════════════════════════════════
// Bridged peripherals
// ═══════════════════════════════════════════════════════════════════════════

pub mod ble;
pub mod input;
pub mod net;

#[cfg(test)]
mod testing;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use engine::{ConversionError, PendingWork, ScriptEngine, ScriptError};
pub use error::{Error, NativeError};
pub use module::{DrainReport, EventSource, Module, Phase, StopReport};
pub use queue::{ChannelStats, DropReason, Emit, EventChannel, Overflow, Producer};
pub use record::{Event, Field, OwnedBytes, OwnedText, Payload};
pub use registry::{ModuleId, ModuleRegistry, ScriptModule};
pub use slot::CallbackSlot;
