//! Integrity Verification.
//!
//! A case is verified by comparing a fingerprint of the data that should
//! have arrived with a fingerprint of what did. The reference payload is
//! pseudo-random, written to the source and to a scratch buffer at the same
//! time, so the reference fingerprint never depends on the memory under
//! test. Sources that cannot be written are copied into scratch instead.

/// Folded 16-bit checksum.
pub mod checksum;

/// Software CRC-32.
pub mod crc;

/// Guard bands for capture-only masters.
pub mod guard;

pub use checksum::{checksum16, checksum_words};
pub use crc::{crc32, Crc32};
pub use guard::{GuardBands, GuardCheck};

use crate::common::BusFault;
use crate::soc::traits::MemoryPort;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fmt;

/// A checksum or CRC used as a proxy for equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Fingerprint {
    /// Folded 16-bit checksum.
    Checksum(u16),
    /// CRC-32 computed by the CRC engine.
    Crc(u32),
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fingerprint::Checksum(v) => write!(f, "0x{:04X}", v),
            Fingerprint::Crc(v) => write!(f, "0x{:08X}", v),
        }
    }
}

/// Outcome of verifying one case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    /// Fingerprints matched and no transfer error occurred.
    pub passed: bool,
    /// Fingerprint of the expected data.
    pub reference: Fingerprint,
    /// Fingerprint of the data found.
    pub observed: Fingerprint,
    /// Human-readable case description.
    pub description: String,
}

/// Exact fingerprint equality.
pub fn compare(reference: Fingerprint, observed: Fingerprint) -> bool {
    reference == observed
}

/// Fingerprints taken right after the source was filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceImage {
    /// Checksum of the scratch copy.
    pub reference: u16,
    /// Checksum of the source as read back.
    pub source: u16,
}

impl SourceImage {
    /// The source holds what was written to it.
    pub fn faithful(&self) -> bool {
        self.reference == self.source
    }
}

/// Generates payloads and computes fingerprints.
pub struct IntegrityVerifier {
    rng: ChaCha8Rng,
    scratch: u64,
}

impl IntegrityVerifier {
    /// Creates a verifier.
    ///
    /// # Arguments
    ///
    /// * `seed` - Payload generator seed; equal seeds give equal payloads
    /// * `scratch` - Address of a scratch buffer outside every swept span
    pub fn new(seed: u64, scratch: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scratch,
        }
    }

    /// Address of the scratch buffer.
    pub fn scratch(&self) -> u64 {
        self.scratch
    }

    /// Fills the source with a fresh random payload and returns its fingerprints.
    ///
    /// Each random word is stored at the (possibly unaligned) source address
    /// and at the scratch buffer. A non-writable source keeps its contents,
    /// which are copied into scratch.
    ///
    /// # Arguments
    ///
    /// * `memory` - Bus to access
    /// * `src` - Source start address
    /// * `len` - Payload length in bytes
    /// * `writable` - Whether the source accepts stores
    pub fn fill_reference_and_source(
        &mut self,
        memory: &mut dyn MemoryPort,
        src: u64,
        len: usize,
        writable: bool,
    ) -> Result<SourceImage, BusFault> {
        if writable {
            let mut at = 0usize;
            while at < len {
                let word = self.rng.next_u32();
                let n = (len - at).min(4);
                if n == 4 {
                    memory.write_u32(src + at as u64, word)?;
                    memory.write_u32(self.scratch + at as u64, word)?;
                } else {
                    let bytes = word.to_le_bytes();
                    memory.write_bytes(src + at as u64, &bytes[..n])?;
                    memory.write_bytes(self.scratch + at as u64, &bytes[..n])?;
                }
                at += n;
            }
        } else {
            let mut existing = vec![0u8; len];
            memory.read_bytes(src, &mut existing)?;
            memory.write_bytes(self.scratch, &existing)?;
        }
        Ok(SourceImage {
            reference: fingerprint(memory, self.scratch, len)?,
            source: fingerprint(memory, src, len)?,
        })
    }

    /// Words of the current reference payload.
    pub fn reference_words(
        &self,
        memory: &mut dyn MemoryPort,
        len: usize,
    ) -> Result<Vec<u32>, BusFault> {
        read_words(memory, self.scratch, len)
    }
}

/// Checksum of `len` bytes at `addr`.
pub fn fingerprint(memory: &mut dyn MemoryPort, addr: u64, len: usize) -> Result<u16, BusFault> {
    let mut buf = vec![0u8; len];
    memory.read_bytes(addr, &mut buf)?;
    Ok(checksum16(&buf))
}

/// Reads `len` bytes at `addr` as little-endian words.
pub fn read_words(memory: &mut dyn MemoryPort, addr: u64, len: usize) -> Result<Vec<u32>, BusFault> {
    let mut buf = vec![0u8; len];
    memory.read_bytes(addr, &mut buf)?;
    Ok(buf
        .chunks(4)
        .map(|chunk| {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            u32::from_le_bytes(word)
        })
        .collect())
}

/// Compares a received stream that may lag the transmitted one.
///
/// Locates the first transmitted word in the received stream and compares
/// from there; words pushed past the end by the lag are not checked.
pub fn aligned_stream_matches(reference: &[u32], received: &[u32]) -> bool {
    let Some(&first) = reference.first() else {
        return true;
    };
    let Some(lag) = received.iter().position(|&w| w == first) else {
        return false;
    };
    let overlap = reference.len().min(received.len() - lag);
    received[lag..lag + overlap] == reference[..overlap]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lagging_stream_matches() {
        let tx = [10, 20, 30, 40];
        assert!(aligned_stream_matches(&tx, &[0, 0, 10, 20]));
        assert!(!aligned_stream_matches(&tx, &[0, 10, 21, 30]));
        assert!(!aligned_stream_matches(&tx, &[0, 0, 0, 0]));
    }
}
