//! Cross-Memory Boundary Sweep Engine.
//!
//! This crate exhaustively exercises data movement across every pair of
//! memory regions, at every boundary-crossing offset, under every
//! combination of bus-fabric buffering and cache configuration, using every
//! available bus master. Moved data is verified to be bit-exact.
//!
//! # Architecture
//!
//! * **Catalog**: the static description of the memory regions under test.
//! * **Fabric**: generators for the buffering and cache configuration space.
//! * **Masters**: one transfer backend per bus master (core copy, blitter,
//!   link peripherals, CRC engine, capture samplers).
//! * **Verify**: reference fingerprints and comparisons.
//! * **Sweep**: the driver that walks config × region pair × boundary ×
//!   offset × master and records every result.
//! * **SoC**: a simulated platform implementing every hardware trait so the
//!   sweep runs on a host.
//!
//! # Modules
//!
//! * `catalog`: Memory region catalog and boundary enumeration.
//! * `common`: Shared types, constants, and error handling.
//! * `config`: Configuration loading and parsing.
//! * `fabric`: Buffering and cache configuration space.
//! * `masters`: Bus master transfer backends.
//! * `report`: Console sinks and the running reporter.
//! * `sim`: Harness wiring a simulated platform to the sweep.
//! * `soc`: Simulated System-on-Chip components.
//! * `stats`: Sweep summary collection and reporting.
//! * `sweep`: The boundary sweep driver.
//! * `verify`: Integrity verification.

/// Memory region catalog and boundary enumeration.
///
/// Describes the regions under test and derives the boundary addresses the
/// sweep crosses in each of them.
pub mod catalog;

/// Shared types, constants, and error handling.
///
/// Provides the error enums and access-width types used throughout the crate.
pub mod common;

/// Configuration system for the sweep, payloads, timeouts, and simulation.
///
/// Loads and parses TOML configuration files to customise a sweep run.
pub mod config;

/// Buffering and cache configuration space.
///
/// Value objects for every fabric setting, their register encodings, and the
/// generators that enumerate them.
pub mod fabric;

/// Bus master transfer backends.
///
/// One backend per bus master, each exposing move, verify-only, or
/// capture-only capabilities behind a common trait.
pub mod masters;

/// Console sinks and the running pass/fail reporter.
pub mod report;

/// Simulation harness.
///
/// Builds a simulated platform and its masters from a configuration and runs
/// the sweep against it.
pub mod sim;

/// System-on-Chip components including the bus, memories, and engine models.
///
/// Implements every hardware trait the sweep consumes so it can run off-target.
pub mod soc;

/// Sweep summary collection and reporting.
///
/// Tracks per-master tallies, failures, and configuration coverage.
pub mod stats;

/// The boundary sweep driver.
pub mod sweep;

/// Integrity verification: checksums, CRC, and stream comparison.
pub mod verify;
