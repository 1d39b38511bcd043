//! Script engine seam.
//!
//! The bridge never names a concrete interpreter. Whatever embeds the
//! scripting runtime implements [`ScriptEngine`] for its context handle;
//! every method is only ever called from the cooperative loop thread.

/// Script value construction failed (the engine could not allocate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionError {
    OutOfMemory,
}

/// The callback raised an exception. The engine has already reported it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScriptError;

/// Minimal value-building and calling surface of a scripting runtime.
///
/// `Function` is an owned, counted reference to a script function:
/// dropping it releases the reference. `Value` is an owned script value
/// with the same rule.
pub trait ScriptEngine {
    type Value;
    type Function;

    fn string(&mut self, s: &str) -> Result<Self::Value, ConversionError>;

    /// Binary array (`Uint8Array`-like) holding a copy of `data`.
    fn bytes(&mut self, data: &[u8]) -> Result<Self::Value, ConversionError>;

    fn boolean(&mut self, value: bool) -> Self::Value;

    fn int(&mut self, value: i32) -> Self::Value;

    fn uint(&mut self, value: u32) -> Self::Value;

    /// New empty object.
    fn object(&mut self) -> Result<Self::Value, ConversionError>;

    fn set_property(
        &mut self,
        object: &mut Self::Value,
        key: &str,
        value: Self::Value,
    ) -> Result<(), ConversionError>;

    /// Invoke `callback(event, payload)`. An absent payload is passed as
    /// the runtime's "undefined".
    fn call(
        &mut self,
        callback: &Self::Function,
        event: Self::Value,
        payload: Option<Self::Value>,
    ) -> Result<(), ScriptError>;
}

/// The runtime's own "process pending work" hook (promise jobs, timers).
pub trait PendingWork {
    /// Run queued script jobs. Returns `false` once the script has ended.
    fn run_pending(&mut self) -> bool;
}
