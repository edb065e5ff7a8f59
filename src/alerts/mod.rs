//! Alert decision and notification-suppression engine.
//!
//! Gateway for the alerting core (EMBP): the clock abstraction, the persisted
//! [`AlertState`] and its store, and the engine that evaluates a decision
//! against that state.

mod clock;
mod engine;
mod state;

pub use clock::{Clock, SystemClock};
pub use engine::{AlertCategory, AlertEngine};
pub use state::{AlertState, JsonFileStore, StateStore};

#[cfg(test)]
pub(crate) use clock::testing::ManualClock;
#[cfg(test)]
pub(crate) use state::testing::MemoryStore;
