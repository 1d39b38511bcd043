//! Module State and its Lifecycle Coordinator.
//!
//! ```text
//!   Uninitialized ──start──► Running ──stop──► Stopping ──► Uninitialized
//!                                                 │  ▲
//!                                                 └──┘ detach failed; stop retries
//! ```
//!
//! Teardown order is fixed: close the queue, detach the native callback,
//! free whatever is still queued (no script calls), release the callback
//! reference, discard the state. The final drain is the last thing that
//! touches the queue, so a producer that was already running when
//! teardown began can at worst add one record that is then freed here.

use alloc::sync::Arc;

use crate::config::DETACH_ATTEMPTS;
use crate::convert;
use crate::engine::ScriptEngine;
use crate::error::{Error, NativeError};
use crate::queue::{ChannelStats, EventChannel, Overflow, Producer};
use crate::record::Event;
use crate::slot::CallbackSlot;

/// Registration surface of a native peripheral API.
///
/// `attach` hands the producer to the library's callback mechanism;
/// `detach` must guarantee that no producer invocation is in flight or
/// can start once it returns `Ok`. Calling `detach` again after an error
/// must be harmless.
pub trait EventSource<const N: usize> {
    type Event: Event;
    type Handle;

    fn attach(&mut self, producer: Producer<Self::Event, N>) -> Result<Self::Handle, NativeError>;

    fn detach(&mut self, handle: &Self::Handle) -> Result<(), NativeError>;
}

/// Lifecycle phase of a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Uninitialized,
    Running,
    Stopping,
}

/// Result of one Drain Step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrainReport {
    /// Records handed to the callback.
    pub delivered: usize,
    /// Records whose script values could not be built.
    pub conversion_failed: usize,
    /// Records whose callback raised.
    pub call_failed: usize,
    /// Records freed because no callback was registered any more.
    pub discarded: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.delivered + self.conversion_failed + self.call_failed + self.discarded
    }

    pub fn merge(&mut self, other: DrainReport) {
        self.delivered += other.delivered;
        self.conversion_failed += other.conversion_failed;
        self.call_failed += other.call_failed;
        self.discarded += other.discarded;
    }
}

/// Result of a completed teardown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StopReport {
    /// Records freed without delivery.
    pub freed: usize,
    /// Whether a callback reference was released.
    pub callback_released: bool,
}

struct State<T, H, F, const N: usize> {
    channel: Arc<EventChannel<T, N>>,
    slot: CallbackSlot<F>,
    /// `None` once detach has been confirmed.
    handle: Option<H>,
    phase: Phase,
}

/// One bridged peripheral channel: native source, queue, callback slot.
pub struct Module<E, S, const N: usize>
where
    E: ScriptEngine,
    S: EventSource<N>,
{
    name: &'static str,
    source: S,
    overflow: Overflow,
    state: Option<State<S::Event, S::Handle, E::Function, N>>,
}

impl<E, S, const N: usize> Module<E, S, N>
where
    E: ScriptEngine,
    S: EventSource<N>,
{
    pub fn new(name: &'static str, source: S, overflow: Overflow) -> Self {
        Self {
            name,
            source,
            overflow,
            state: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn phase(&self) -> Phase {
        self.state
            .as_ref()
            .map_or(Phase::Uninitialized, |state| state.phase)
    }

    /// Records currently queued.
    pub fn pending(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.channel.len())
    }

    pub fn stats(&self) -> Option<ChannelStats> {
        self.state.as_ref().map(|state| state.channel.stats())
    }

    pub fn has_callback(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.slot.is_set())
    }

    /// Build fresh state and attach the producer to the native library.
    pub fn start(&mut self) -> Result<(), Error> {
        if self.state.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let channel = Arc::new(EventChannel::new(self.overflow));
        let handle = self
            .source
            .attach(Producer::new(channel.clone()))
            .map_err(|e| {
                error!("{}: attach failed ({})", self.name, e.0);
                Error::Attach(e)
            })?;

        self.state = Some(State {
            channel,
            slot: CallbackSlot::new(),
            handle: Some(handle),
            phase: Phase::Running,
        });
        info!("{}: running (queue depth {})", self.name, N);
        Ok(())
    }

    /// Tear down. A module that was never started stops trivially.
    pub fn stop(&mut self) -> Result<StopReport, Error> {
        let Some(state) = self.state.as_mut() else {
            return Ok(StopReport::default());
        };

        if state.phase == Phase::Running {
            info!("{}: stopping", self.name);
            state.phase = Phase::Stopping;
            state.channel.set_observed(false);
            state.channel.close();
        }

        if let Some(handle) = state.handle.as_ref() {
            let mut last = NativeError(0);
            let mut detached = false;
            for attempt in 1..=DETACH_ATTEMPTS {
                match self.source.detach(handle) {
                    Ok(()) => {
                        detached = true;
                        break;
                    }
                    Err(e) => {
                        warn!(
                            "{}: detach attempt {} failed ({})",
                            self.name, attempt, e.0
                        );
                        last = e;
                    }
                }
            }
            if !detached {
                error!("{}: detach not confirmed - state kept", self.name);
                return Err(Error::Detach(last));
            }
            state.handle = None;
        }

        let freed = state.channel.drain_all();
        let callback_released = state.slot.clear();
        self.state = None;

        info!("{}: stopped ({} queued events freed)", self.name, freed);
        Ok(StopReport {
            freed,
            callback_released,
        })
    }

    /// Populate the Callback Slot, releasing any previous reference.
    ///
    /// Takes `&self` so a script callback running inside [`Module::drain`]
    /// can replace or clear its own registration.
    pub fn set_callback(&self, func: E::Function) -> Result<(), Error> {
        let state = self.running_state()?;
        state.slot.set(func);
        state.channel.set_observed(true);
        Ok(())
    }

    /// Release the callback. Producers stop allocating from now on.
    pub fn clear_callback(&self) -> Result<(), Error> {
        let state = self.running_state()?;
        state.channel.set_observed(false);
        state.slot.clear();
        Ok(())
    }

    /// Drain Step: deliver what was queued when the step started, in
    /// FIFO order. Every popped record is freed before the next one is
    /// popped, delivered or not. The slot is read again for every record,
    /// so a callback cleared mid-drain receives nothing further.
    pub fn drain(&self, engine: &mut E) -> DrainReport {
        let mut report = DrainReport::default();
        let Some(state) = self.state.as_ref() else {
            return report;
        };
        if state.phase != Phase::Running {
            return report;
        }

        let pending = state.channel.len();
        for _ in 0..pending {
            let Some(record) = state.channel.pop() else {
                break;
            };

            let Some(callback) = state.slot.get() else {
                report.discarded += 1;
                continue;
            };

            match convert::event_args(engine, &record) {
                Ok((event, payload)) => match engine.call(&callback, event, payload) {
                    Ok(()) => report.delivered += 1,
                    Err(_) => {
                        warn!("{}: callback raised on {}", self.name, record.name());
                        report.call_failed += 1;
                    }
                },
                Err(_) => {
                    warn!(
                        "{}: out of memory converting {} - event dropped",
                        self.name,
                        record.name()
                    );
                    report.conversion_failed += 1;
                }
            }
        }

        if report.discarded > 0 {
            debug!(
                "{}: {} events discarded with no callback",
                self.name, report.discarded
            );
        }
        report
    }

    fn running_state(&self) -> Result<&State<S::Event, S::Handle, E::Function, N>, Error> {
        match self.state.as_ref() {
            Some(state) if state.phase == Phase::Running => Ok(state),
            _ => Err(Error::NotRunning),
        }
    }
}

impl<E, S, const N: usize> Drop for Module<E, S, N>
where
    E: ScriptEngine,
    S: EventSource<N>,
{
    fn drop(&mut self) {
        if self.state.is_some() {
            if let Err(e) = self.stop() {
                error!("{}: dropped without clean teardown ({})", self.name, e);
            }
        }
    }
}
