//! apate replay engine
//!
//! Loads a recorded AIS trace, reassembles fragment groups into whole
//! messages and replays them against a downstream transmitter with the
//! original relative timing.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod plan;
pub mod reassemble;
pub mod scheduler;
pub mod session;
pub mod trace;
pub mod transmit;

#[cfg(test)]
mod testing;

pub use plan::{PlannedBatch, ReplayPlan};
pub use reassemble::{LogicalMessage, Reassembled, Reassembler, ReassemblyError};
pub use scheduler::{Pacer, Scheduler};
pub use session::{load_plan, ReplayReport, ReplaySession, SessionError};
pub use trace::{ReplayEntry, Trace, TraceError, TraceReader};
pub use transmit::{Dispatcher, TransmitError, Transmitter, WsTransmitter};
