//! Simulation Harness.
//!
//! Builds a simulated system and its bus masters from a `Config` and runs
//! the sweep against them.

/// Harness and master wiring.
pub mod harness;

pub use harness::{build_masters, Harness};
