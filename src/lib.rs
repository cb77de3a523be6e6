#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate election_test;

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod shared;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use model::{Election, ElectionPhase, ElectionResults, Operation, ParticipantId};
pub use shared::SharedElection;
