//! Test module organization.
//!
//! This module organizes all integration tests for the sweep engine.

/// Region catalog and boundary enumeration tests.
mod catalog_tests;

/// Configuration loading and validation tests.
mod config_tests;


/// Bus master backend tests.
mod master_tests;



/// Checksum, CRC, and integrity verifier tests.
mod verify_tests;
