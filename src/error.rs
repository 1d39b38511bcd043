//! Unified error type for evbridge.
//!
//! Variants carry only fixed-size data so the enum stays `Copy` and can
//! be returned from teardown paths without allocating.

use core::fmt;

/// Error code reported by a native peripheral API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NativeError(pub i32);

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native error {}", self.0)
    }
}

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Lifecycle
    /// The module has not been started (or has been torn down).
    NotRunning,

    /// `start` was called on a module that is running or still stopping.
    AlreadyRunning,

    /// The native library refused to register our callback.
    Attach(NativeError),

    /// The native library did not confirm callback removal. The module
    /// stays in `Stopping`; calling `stop` again retries.
    Detach(NativeError),

    // Registry
    /// No module is registered under the given id or name.
    UnknownModule,

    /// A module with the same name is already registered.
    DuplicateModule,

    /// The registry is at `MAX_MODULES`.
    RegistryFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NotRunning => f.write_str("module is not running"),
            Error::AlreadyRunning => f.write_str("module is already running"),
            Error::Attach(e) => write!(f, "attach failed: {}", e),
            Error::Detach(e) => write!(f, "detach failed: {}", e),
            Error::UnknownModule => f.write_str("unknown module"),
            Error::DuplicateModule => f.write_str("duplicate module name"),
            Error::RegistryFull => f.write_str("module registry full"),
        }
    }
}
