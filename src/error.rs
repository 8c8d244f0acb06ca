//! Unified error types for the rover firmware.
//!
//! A single `Error` enum that every fallible subsystem converts into,
//! keeping the binary's error handling uniform. The set is deliberately
//! small: a measurement timeout is *not* an error (it surfaces as an
//! out-of-range reading and the drive loop handles it like a close
//! obstacle), so the only fatal class is GPIO initialization failure.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The GPIO subsystem could not be brought up.
    Init(InitError),
    /// Configuration failed range/consistency validation.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// GPIO initialization errors
// ---------------------------------------------------------------------------

/// Errors during one-shot GPIO bring-up. Fatal: the process exits with
/// code 1, since no safe autonomous operation is possible without
/// working outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// The GPIO character device could not be opened (permissions,
    /// not a Pi, or the chip is already claimed exclusively).
    ChipUnavailable,
    /// A required pin could not be claimed or configured.
    PinClaimFailed(u8),
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipUnavailable => write!(f, "GPIO chip unavailable"),
            Self::PinClaimFailed(pin) => write!(f, "failed to claim GPIO {pin}"),
        }
    }
}

impl std::error::Error for InitError {}

impl From<InitError> for Error {
    fn from(e: InitError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
