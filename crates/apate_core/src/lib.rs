//! apate core types
//!
//! Pure types shared by the trace replay crates: trace offsets, replay
//! configuration and value-level errors. No I/O happens here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod sentence;
pub mod time;

// Re-exports
pub use config::{GroupPolicy, ReplayConfig, DEFAULT_ENDPOINT, DEFAULT_TRANSMIT_COUNT};
pub use error::{CoreError, CoreResult};
pub use sentence::RawSentence;
pub use time::TraceTime;
