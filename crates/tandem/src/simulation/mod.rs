//! # Simulation Context
//!
//! The side of the protocol that owns the solver.
//!
//! The solver itself is external: anything implementing
//! [`SimulationEngine`] can be driven by a [`SimulationWorker`].
//! [`BallisticEngine`] is a small reference engine for tests and demos.

mod ballistic;
mod engine;
mod worker;

pub use ballistic::BallisticEngine;
pub use engine::{BodyState, SimulationEngine};
pub use worker::{SimulationWorker, WorkerStats};
