//! Process exit statuses, after sysexits(3).

use apate_replay::{SessionError, TraceError, TransmitError};

/// Success
pub const OK: u8 = 0;
/// Bad arguments or configuration
pub const USAGE: u8 = 64;
/// Malformed trace, or a broken fragment group under the abort policy
pub const DATAERR: u8 = 65;
/// The transmitter could not be reached
pub const UNAVAILABLE: u8 = 69;
/// The trace file does not exist
pub const OSFILE: u8 = 72;
/// Reading the trace or writing a frame failed
pub const IOERR: u8 = 74;
/// Stopped by the operator
pub const INTERRUPTED: u8 = 130;

/// Exit status for an error that ended the session
#[must_use]
pub fn code_for(err: &SessionError) -> u8 {
    match err {
        SessionError::Config(_) => USAGE,
        SessionError::Trace(TraceError::NotFound { .. }) => OSFILE,
        SessionError::Trace(TraceError::Io(_)) => IOERR,
        SessionError::Trace(TraceError::Format { .. }) => DATAERR,
        SessionError::Reassembly(_) => DATAERR,
        SessionError::Transmit(TransmitError::Connect { .. }) => UNAVAILABLE,
        SessionError::Transmit(_) => IOERR,
    }
}
