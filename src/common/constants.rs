//! Shared constants.

/// Largest offset, in bytes, subtracted from a boundary address.
///
/// Offsets run from 0 to this value inclusive on both the source and the
/// destination side, so 17 start addresses are tried per boundary.
pub const MAX_BOUNDARY_OFFSET: u64 = 16;

/// Bytes planted on each side of a capture destination.
pub const GUARD_BAND_BYTES: u64 = 16;

/// Byte value written into guard bands.
pub const GUARD_PATTERN: u8 = 0xA5;

/// Word-aligned scratch area inside TCM that never straddles a block boundary.
pub const DEFAULT_SCRATCH_ADDR: u64 = 0x1005_4000;

/// Mapped window of the memory-mapped link used as its staging area.
pub const DEFAULT_MSPI_STAGING_ADDR: u64 = 0x1400_0000;

/// Interval between completion polls.
pub const POLL_INTERVAL_MS: u32 = 1;

/// Page granularity of the simulated sparse memories.
pub const PAGE_SIZE: u64 = 4096;

/// Seed used when the configuration does not supply one.
pub const DEFAULT_SEED: u64 = 0x5EED_C0DE;

/// Failed cases kept in full in the report; later failures are only counted.
pub const MAX_FAILURE_RECORDS: usize = 256;
