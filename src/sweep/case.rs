//! Transfer Cases.
//!
//! Planning expands one master and one payload size into the ordered list of
//! cases to run, and `run_case` executes a single case end to end: fill the
//! source, clear the destination, run the master, and compare fingerprints.

use crate::catalog::Catalog;
use crate::common::{BusFault, CopyWidth, MAX_BOUNDARY_OFFSET};
use crate::masters::{
    BusMaster, Comparison, FaultPolicy, MasterKind, MasterRole, TransferOutcome,
};
use crate::soc::traits::{MemoryPort, Platform};
use crate::stats::SkipTally;
use crate::verify::{
    aligned_stream_matches, compare, fingerprint, read_words, Fingerprint, GuardBands,
    IntegrityVerifier, VerificationResult,
};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

/// One side of a case: a boundary in a region and how far before it the
/// transfer starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CasePoint {
    /// Index of the region in the catalog.
    pub region: usize,
    /// Boundary address.
    pub boundary: u64,
    /// Bytes subtracted from the boundary, `0..=16`.
    pub offset: u64,
    /// Resolved start address.
    pub addr: u64,
}

impl CasePoint {
    fn at(region: usize, boundary: u64, offset: u64) -> Option<Self> {
        Some(Self {
            region,
            boundary,
            offset,
            addr: boundary.checked_sub(offset)?,
        })
    }
}

/// A single transfer to run and verify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TransferCase {
    /// Master running the case.
    pub master: MasterKind,
    /// Source side; absent for capture-only masters.
    pub source: Option<CasePoint>,
    /// Destination side; absent for verify-only masters.
    pub dest: Option<CasePoint>,
    /// Payload size in bytes.
    pub len: usize,
    /// Copy sub-strategy.
    pub width: CopyWidth,
}

impl TransferCase {
    /// Source start address.
    pub fn src_addr(&self) -> Option<u64> {
        self.source.map(|p| p.addr)
    }

    /// Destination start address.
    pub fn dst_addr(&self) -> Option<u64> {
        self.dest.map(|p| p.addr)
    }
}

impl fmt::Display for TransferCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.master)?;
        if self.width != CopyWidth::Native {
            write!(f, " ({})", self.width)?;
        }
        match (self.src_addr(), self.dst_addr()) {
            (Some(s), Some(d)) => write!(f, " 0x{:08X} -> 0x{:08X}", s, d)?,
            (Some(s), None) => write!(f, " src 0x{:08X}", s)?,
            (None, Some(d)) => write!(f, " dst 0x{:08X}", d)?,
            (None, None) => {}
        }
        write!(f, " {} bytes", self.len)
    }
}

/// Why a case failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The source did not hold the payload right after it was written.
    SourceMismatch,
    /// Destination checksum differs from the reference.
    ChecksumMismatch,
    /// The two hardware CRCs differ.
    CrcMismatch,
    /// Completion was not signalled in time.
    Timeout,
    /// The master raised its hardware error flag.
    HardwareError,
    /// A capture wrote outside its destination.
    GuardCorruption,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::SourceMismatch => "source mismatch",
            FailureKind::ChecksumMismatch => "checksum mismatch",
            FailureKind::CrcMismatch => "CRC mismatch",
            FailureKind::Timeout => "timeout",
            FailureKind::HardwareError => "hardware error",
            FailureKind::GuardCorruption => "guard corruption",
        };
        f.write_str(label)
    }
}

/// Outcome of one case.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CaseReport {
    /// The case that ran.
    pub case: TransferCase,
    /// Fingerprint comparison.
    pub result: VerificationResult,
    /// Failure kind; `None` when the case passed.
    pub failure: Option<FailureKind>,
    /// The failure stops the sweep.
    pub halt: bool,
}

impl CaseReport {
    fn pass(case: &TransferCase, reference: Fingerprint, observed: Fingerprint) -> Self {
        Self::build(case, reference, observed, None, false)
    }

    fn fail(
        case: &TransferCase,
        reference: Fingerprint,
        observed: Fingerprint,
        kind: FailureKind,
    ) -> Self {
        Self::build(case, reference, observed, Some(kind), false)
    }

    fn build(
        case: &TransferCase,
        reference: Fingerprint,
        observed: Fingerprint,
        failure: Option<FailureKind>,
        halt: bool,
    ) -> Self {
        Self {
            case: *case,
            result: VerificationResult {
                passed: failure.is_none(),
                reference,
                observed,
                description: case.to_string(),
            },
            failure,
            halt,
        }
    }

    /// Whether the case passed.
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

/// Cases planned for one master and payload size.
#[derive(Clone, Debug, Default)]
pub struct CasePlan {
    /// Cases in run order.
    pub cases: Vec<TransferCase>,
    /// Combinations that were not turned into cases.
    pub skipped: SkipTally,
}

/// Every boundary/offset point of the regions accepted by `accepts`.
fn points<F>(catalog: &Catalog, accepts: F) -> Vec<CasePoint>
where
    F: Fn(usize) -> bool,
{
    let mut out = Vec::new();
    for (idx, region) in catalog.regions().iter().enumerate() {
        if !accepts(idx) {
            continue;
        }
        for boundary in region.boundaries() {
            for offset in 0..=MAX_BOUNDARY_OFFSET {
                if let Some(point) = CasePoint::at(idx, boundary, offset) {
                    out.push(point);
                }
            }
        }
    }
    out
}

fn spans_overlap(a: u64, b: u64, len: usize) -> bool {
    let len = len as u64;
    a < b + len && b < a + len
}

/// Every byte of the span lies in a writable catalog region.
fn writable_span(catalog: &Catalog, addr: u64, len: usize) -> bool {
    let last = addr + len.saturating_sub(1) as u64;
    [addr, last]
        .iter()
        .all(|&a| catalog.region_of(a).is_some_and(|r| r.writable))
}

struct Planner<'a> {
    catalog: &'a Catalog,
    memory: &'a dyn MemoryPort,
    scratch: u64,
    len: usize,
    skipped: SkipTally,
}

impl Planner<'_> {
    /// Checks a source span.
    fn source_ok(&mut self, addr: u64) -> bool {
        self.span_ok(addr, false)
    }

    /// Checks a destination span.
    fn dest_ok(&mut self, addr: u64) -> bool {
        self.span_ok(addr, true)
    }

    fn span_ok(&mut self, addr: u64, written: bool) -> bool {
        if !self.memory.is_mapped(addr, self.len as u64)
            || (written && !writable_span(self.catalog, addr, self.len))
        {
            self.skipped.unmapped += 1;
            return false;
        }
        if spans_overlap(addr, self.scratch, self.len) {
            self.skipped.scratch_overlap += 1;
            return false;
        }
        true
    }
}

/// Plans every case `master` runs with a `len`-byte payload.
///
/// Movers iterate source region, destination region, source boundary,
/// source offset, destination boundary, destination offset, then copy width.
/// Equal source and destination boundaries are skipped. So are spans that
/// are not fully mapped, that touch the scratch buffer, or whose source and
/// destination overlap.
///
/// # Arguments
///
/// * `master` - Master to plan for
/// * `catalog` - Regions under test
/// * `memory` - Bus used to check that spans are mapped
/// * `scratch` - Scratch buffer address
/// * `len` - Payload size in bytes
pub fn plan_cases(
    master: &mut dyn BusMaster,
    catalog: &Catalog,
    memory: &dyn MemoryPort,
    scratch: u64,
    len: usize,
) -> CasePlan {
    let kind = master.kind();
    let regions = catalog.regions();
    let sources = points(catalog, |i| master.supports_source(&regions[i]));
    let dests = points(catalog, |i| master.supports_dest(&regions[i]));
    let mut planner = Planner {
        catalog,
        memory,
        scratch,
        len,
        skipped: SkipTally::default(),
    };
    let mut cases = Vec::new();
    let case = |source, dest, width| TransferCase {
        master: kind,
        source,
        dest,
        len,
        width,
    };

    match kind.role() {
        MasterRole::Verifier => {
            for src in &sources {
                if planner.source_ok(src.addr) {
                    cases.push(case(Some(*src), None, CopyWidth::Native));
                }
            }
        }
        MasterRole::Capturer => {
            for dst in &dests {
                if planner.dest_ok(dst.addr) {
                    cases.push(case(None, Some(*dst), CopyWidth::Native));
                }
            }
        }
        MasterRole::Mover => {
            let widths = master
                .as_mover()
                .map(|m| m.copy_widths().to_vec())
                .unwrap_or_default();
            let region_count = regions.len();
            for src_region in 0..region_count {
                for dst_region in 0..region_count {
                    let src_points = sources.iter().filter(|p| p.region == src_region);
                    for src in src_points {
                        let dst_points = dests.iter().filter(|p| p.region == dst_region);
                        for dst in dst_points {
                            if src.boundary == dst.boundary {
                                if src.offset == 0 && dst.offset == 0 {
                                    planner.skipped.same_boundary += 1;
                                    debug!(
                                        "Skipped copy between the same boundary {:#010x}",
                                        src.boundary
                                    );
                                }
                                continue;
                            }
                            if !planner.source_ok(src.addr) || !planner.dest_ok(dst.addr) {
                                continue;
                            }
                            if spans_overlap(src.addr, dst.addr, len) {
                                planner.skipped.overlapping_spans += 1;
                                continue;
                            }
                            for &width in &widths {
                                cases.push(case(Some(*src), Some(*dst), width));
                            }
                        }
                    }
                }
            }
        }
    }

    CasePlan {
        cases,
        skipped: planner.skipped,
    }
}

/// Runs one case and verifies it.
///
/// Never panics and never aborts: every problem becomes a failed
/// `CaseReport`. `halt` is set only when the master raised its hardware
/// error flag and its policy stops the sweep.
///
/// # Arguments
///
/// * `master` - Master named by the case
/// * `case` - Case to run
/// * `verifier` - Payload generator and scratch owner
/// * `catalog` - Regions under test
/// * `hw` - Platform
pub fn run_case(
    master: &mut dyn BusMaster,
    case: &TransferCase,
    verifier: &mut IntegrityVerifier,
    catalog: &Catalog,
    hw: &mut Platform<'_>,
) -> CaseReport {
    let policy = master.fault_policy();
    let mut report = match execute(master, case, verifier, catalog, hw) {
        Ok(report) => report,
        Err(fault) => {
            warn!(case = %case, error = %fault, "bus fault outside the transfer");
            let none = Fingerprint::Checksum(0);
            CaseReport::fail(case, none, none, FailureKind::HardwareError)
        }
    };
    report.halt = report.failure == Some(FailureKind::HardwareError)
        && report.halt
        && policy == FaultPolicy::HaltOnHardwareError;
    report
}

/// Maps a non-completed outcome to a failure.
fn outcome_failure(outcome: TransferOutcome) -> Option<FailureKind> {
    if outcome.hw_error {
        Some(FailureKind::HardwareError)
    } else if outcome.timed_out || !outcome.completed {
        Some(FailureKind::Timeout)
    } else {
        None
    }
}

/// Builds the report for an outcome that did not complete.
///
/// Only these reports can halt: the error was raised by the master itself.
fn incomplete(
    case: &TransferCase,
    reference: Fingerprint,
    observed: Fingerprint,
    kind: FailureKind,
) -> CaseReport {
    CaseReport::build(
        case,
        reference,
        observed,
        Some(kind),
        kind == FailureKind::HardwareError,
    )
}

fn execute(
    master: &mut dyn BusMaster,
    case: &TransferCase,
    verifier: &mut IntegrityVerifier,
    catalog: &Catalog,
    hw: &mut Platform<'_>,
) -> Result<CaseReport, BusFault> {
    let len = case.len;

    if let (Some(src), Some(dst)) = (case.source, case.dest) {
        let Some(mover) = master.as_mover() else {
            return Ok(missing_role(case));
        };
        let writable = catalog.get(src.region).is_some_and(|r| r.writable);
        let image = verifier.fill_reference_and_source(&mut *hw.memory, src.addr, len, writable)?;
        let reference = Fingerprint::Checksum(image.reference);
        if !image.faithful() {
            let observed = Fingerprint::Checksum(image.source);
            return Ok(CaseReport::fail(case, reference, observed, FailureKind::SourceMismatch));
        }
        hw.memory.fill(dst.addr, len, 0)?;

        let outcome = mover.transfer(hw, src.addr, dst.addr, len, case.width);
        let observed = Fingerprint::Checksum(fingerprint(&mut *hw.memory, dst.addr, len)?);
        if let Some(kind) = outcome_failure(outcome) {
            return Ok(incomplete(case, reference, observed, kind));
        }

        let matched = match mover.comparison() {
            Comparison::Checksum => compare(reference, observed),
            Comparison::AlignedStream => {
                let sent = verifier.reference_words(&mut *hw.memory, len)?;
                let received = read_words(&mut *hw.memory, dst.addr, len)?;
                aligned_stream_matches(&sent, &received)
            }
        };
        return Ok(if matched {
            CaseReport::pass(case, reference, observed)
        } else {
            CaseReport::fail(case, reference, observed, FailureKind::ChecksumMismatch)
        });
    }

    if let Some(src) = case.source {
        let Some(crc) = master.as_verifier() else {
            return Ok(missing_role(case));
        };
        let writable = catalog.get(src.region).is_some_and(|r| r.writable);
        let image = verifier.fill_reference_and_source(&mut *hw.memory, src.addr, len, writable)?;
        if !image.faithful() {
            return Ok(CaseReport::fail(
                case,
                Fingerprint::Checksum(image.reference),
                Fingerprint::Checksum(image.source),
                FailureKind::SourceMismatch,
            ));
        }

        let expected = crc.verify(hw, verifier.scratch(), len);
        let reference = Fingerprint::Crc(expected.value);
        if let Some(kind) = outcome_failure(expected.outcome) {
            return Ok(incomplete(case, reference, reference, kind));
        }
        let actual = crc.verify(hw, src.addr, len);
        let observed = Fingerprint::Crc(actual.value);
        if let Some(kind) = outcome_failure(actual.outcome) {
            return Ok(incomplete(case, reference, observed, kind));
        }
        return Ok(if compare(reference, observed) {
            CaseReport::pass(case, reference, observed)
        } else {
            CaseReport::fail(case, reference, observed, FailureKind::CrcMismatch)
        });
    }

    if let Some(dst) = case.dest {
        let Some(capturer) = master.as_capturer() else {
            return Ok(missing_role(case));
        };
        let guards = GuardBands::plant(&mut *hw.memory, dst.addr, len);
        let outcome = capturer.capture(hw, dst.addr, len);
        let check = guards.check(&mut *hw.memory)?;
        let reference = Fingerprint::Checksum(check.expected);
        let observed = Fingerprint::Checksum(check.observed);
        if let Some(kind) = outcome_failure(outcome) {
            return Ok(incomplete(case, reference, observed, kind));
        }
        return Ok(if check.intact {
            CaseReport::pass(case, reference, observed)
        } else {
            CaseReport::fail(case, reference, observed, FailureKind::GuardCorruption)
        });
    }

    Ok(missing_role(case))
}

/// A case whose shape does not match the master's role.
fn missing_role(case: &TransferCase) -> CaseReport {
    warn!(case = %case, "case does not match the master's role");
    let none = Fingerprint::Checksum(0);
    CaseReport::fail(case, none, none, FailureKind::HardwareError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_point_below_zero_is_dropped() {
        assert!(CasePoint::at(0, 0, 1).is_none());
        assert_eq!(CasePoint::at(0, 0x100, 4).map(|p| p.addr), Some(0xFC));
    }

    #[test]
    fn overlap_is_symmetric() {
        assert!(spans_overlap(0x100, 0x110, 32));
        assert!(spans_overlap(0x110, 0x100, 32));
        assert!(!spans_overlap(0x100, 0x120, 32));
    }

    #[test]
    fn outcome_mapping() {
        assert_eq!(outcome_failure(TransferOutcome::done()), None);
        assert_eq!(
            outcome_failure(TransferOutcome::timeout()),
            Some(FailureKind::Timeout)
        );
        assert_eq!(
            outcome_failure(TransferOutcome::error()),
            Some(FailureKind::HardwareError)
        );
    }
}
