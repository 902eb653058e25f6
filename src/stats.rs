//! Sweep statistics collection and reporting.
//!
//! Tracks pass/fail tallies per master and per failure kind, the cases that
//! failed, how much of the configuration space was covered, and why the
//! sweep stopped if it stopped early.

use crate::common::constants::MAX_FAILURE_RECORDS;
use crate::common::{CopyWidth, PerformanceMode};
use crate::fabric::FabricSnapshot;
use crate::masters::MasterKind;
use crate::sweep::{CaseReport, FailureKind};
use crate::verify::Fingerprint;
use serde::Serialize;
use std::collections::BTreeMap;

/// Passed and failed case counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: u64,
    pub failed: u64,
}

impl Tally {
    /// Counts one case.
    pub fn record(&mut self, passed: bool) {
        if passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Cases counted.
    pub fn total(&self) -> u64 {
        self.passed + self.failed
    }
}

/// Combinations the planner did not turn into cases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SkipTally {
    /// Source and destination boundaries were the same address.
    pub same_boundary: u64,
    /// A span was not fully mapped, or a destination was not writable.
    pub unmapped: u64,
    /// A span touched the scratch buffer.
    pub scratch_overlap: u64,
    /// Source and destination spans overlapped.
    pub overlapping_spans: u64,
}

impl SkipTally {
    /// Adds another tally into this one.
    pub fn add(&mut self, other: &SkipTally) {
        self.same_boundary += other.same_boundary;
        self.unmapped += other.unmapped;
        self.scratch_overlap += other.scratch_overlap;
        self.overlapping_spans += other.overlapping_spans;
    }

    /// Total skipped combinations.
    pub fn total(&self) -> u64 {
        self.same_boundary + self.unmapped + self.scratch_overlap + self.overlapping_spans
    }
}

/// Fabric and power state a case ran under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PassContext {
    /// Position in the cache sequence.
    pub cache_index: usize,
    /// Position in the buffering sequence.
    pub buffering_index: usize,
    /// Register images read back after applying the configuration.
    pub fabric: FabricSnapshot,
    /// Performance mode, when modes are swept.
    pub mode: Option<PerformanceMode>,
}

/// A failed case kept for the summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub master: MasterKind,
    pub src: Option<u64>,
    pub dst: Option<u64>,
    pub len: usize,
    pub width: CopyWidth,
    pub kind: FailureKind,
    pub reference: Fingerprint,
    pub observed: Fingerprint,
    pub context: PassContext,
}

/// Why the sweep stopped before exhausting the space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HaltRecord {
    /// Master whose error stopped the sweep.
    pub master: MasterKind,
    /// Case that raised it.
    pub case: String,
}

/// Everything a sweep produced.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SweepReport {
    /// Payload generator seed.
    pub seed: u64,
    /// All cases.
    pub totals: Tally,
    /// Cases per master.
    pub per_master: BTreeMap<MasterKind, Tally>,
    /// Failed cases per failure kind.
    pub failures_by_kind: BTreeMap<FailureKind, u64>,
    /// The first failed cases, in run order.
    pub failures: Vec<FailureRecord>,
    /// Combinations not run.
    pub skipped: SkipTally,
    /// Fabric configurations applied.
    pub configs_applied: u64,
    /// Fabric configurations rejected by the adapter.
    pub configs_skipped: u64,
    /// Performance modes that could not be selected.
    pub modes_skipped: u64,
    /// Masters that failed to power up.
    pub unavailable: Vec<MasterKind>,
    /// Set when a fatal link error stopped the sweep.
    pub halt: Option<HaltRecord>,
    /// Bus cycles charged by the timing model.
    pub bus_cycles: u64,
    /// Virtual milliseconds spent.
    pub virtual_ms: u64,
}

impl SweepReport {
    /// Creates an empty report.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Records one case.
    pub fn record(&mut self, report: &CaseReport, context: PassContext) {
        let passed = report.passed();
        self.totals.record(passed);
        self.per_master
            .entry(report.case.master)
            .or_default()
            .record(passed);

        let Some(kind) = report.failure else {
            return;
        };
        *self.failures_by_kind.entry(kind).or_default() += 1;
        if self.failures.len() < MAX_FAILURE_RECORDS {
            self.failures.push(FailureRecord {
                master: report.case.master,
                src: report.case.src_addr(),
                dst: report.case.dst_addr(),
                len: report.case.len,
                width: report.case.width,
                kind,
                reference: report.result.reference,
                observed: report.result.observed,
                context,
            });
        }
    }

    /// Every case passed and nothing halted.
    pub fn all_passed(&self) -> bool {
        self.totals.failed == 0 && self.halt.is_none()
    }

    /// Process exit code: 0 all passed, 1 failures, 2 halted.
    pub fn exit_code(&self) -> i32 {
        if self.halt.is_some() {
            2
        } else if self.totals.failed > 0 {
            1
        } else {
            0
        }
    }

    /// Prints a formatted summary of the sweep.
    pub fn print(&self) {
        let total = self.totals.total().max(1) as f64;

        println!("\n==========================================================");
        println!("CROSS-MEMORY BOUNDARY SWEEP SUMMARY");
        println!("==========================================================");
        println!("seed                     0x{:X}", self.seed);
        println!("cases                    {}", self.totals.total());
        println!(
            "cases.passed             {} ({:.2}%)",
            self.totals.passed,
            (self.totals.passed as f64 / total) * 100.0
        );
        println!(
            "cases.failed             {} ({:.2}%)",
            self.totals.failed,
            (self.totals.failed as f64 / total) * 100.0
        );
        println!("configs.applied          {}", self.configs_applied);
        println!("configs.skipped          {}", self.configs_skipped);
        if self.modes_skipped > 0 {
            println!("modes.skipped            {}", self.modes_skipped);
        }
        println!("bus_cycles               {}", self.bus_cycles);
        println!("virtual_ms               {}", self.virtual_ms);
        println!("----------------------------------------------------------");
        println!("PER MASTER");
        for (master, tally) in &self.per_master {
            println!(
                "  {:<10} cases: {:<10} | passed: {:<10} | failed: {}",
                master.name(),
                tally.total(),
                tally.passed,
                tally.failed
            );
        }
        for master in &self.unavailable {
            println!("  {:<10} unavailable (power-up failed)", master.name());
        }
        println!("----------------------------------------------------------");
        println!("SKIPPED COMBINATIONS");
        println!("  skip.same_boundary     {}", self.skipped.same_boundary);
        println!("  skip.unmapped          {}", self.skipped.unmapped);
        println!("  skip.scratch           {}", self.skipped.scratch_overlap);
        println!("  skip.overlap           {}", self.skipped.overlapping_spans);
        if !self.failures_by_kind.is_empty() {
            println!("----------------------------------------------------------");
            println!("FAILURES");
            for (kind, count) in &self.failures_by_kind {
                println!("  {:<22} {}", kind.to_string(), count);
            }
        }
        if let Some(halt) = &self.halt {
            println!("----------------------------------------------------------");
            println!("HALTED by {} at {}", halt.master, halt.case);
        }
        println!("==========================================================");
    }
}
