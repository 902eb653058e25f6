//! Result Reporter.
//!
//! Line-oriented progress and failure output plus the running tally. The
//! reporter never aborts: a failed case is one line on the console and one
//! entry in the `SweepReport`.

use crate::catalog::Catalog;
use crate::common::{FabricError, HalError, PerformanceMode};
use crate::fabric::FabricSnapshot;
use crate::masters::MasterKind;
use crate::stats::{HaltRecord, PassContext, SkipTally, SweepReport};
use crate::sweep::CaseReport;

/// Line-oriented text sink.
pub trait Console {
    /// Writes one line.
    fn line(&mut self, text: &str);
}

/// Console writing to standard output.
#[derive(Debug, Default)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Console that discards every line.
#[derive(Debug, Default)]
pub struct NullConsole;

impl Console for NullConsole {
    fn line(&mut self, _text: &str) {}
}

/// Console that keeps every line, for tests.
#[derive(Debug, Default)]
pub struct MemoryConsole {
    lines: Vec<String>,
}

impl MemoryConsole {
    /// Creates an empty console.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines written so far.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Console for MemoryConsole {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }
}

/// Running tally plus console output.
pub struct Reporter<'a> {
    console: &'a mut dyn Console,
    report: SweepReport,
    context: PassContext,
}

impl<'a> Reporter<'a> {
    /// Creates a reporter writing to `console`.
    pub fn new(console: &'a mut dyn Console, seed: u64) -> Self {
        Self {
            console,
            report: SweepReport::new(seed),
            context: PassContext::default(),
        }
    }

    /// Prints the run banner.
    pub fn banner(&mut self, catalog: &Catalog, masters: &[MasterKind]) {
        self.console.line("Cross-memory boundary sweep");
        self.console
            .line(&format!("Payload seed 0x{:X}", self.report.seed));
        for region in catalog.regions() {
            self.console.line(&format!(
                "  {:<8} 0x{:08X} size 0x{:X} block 0x{:X}{}",
                region.name,
                region.base,
                region.total_size,
                region.block_size,
                if region.adjacent_region_follows {
                    " (adjacent follows)"
                } else {
                    ""
                }
            ));
        }
        let names: Vec<&str> = masters.iter().map(|m| m.name()).collect();
        self.console.line(&format!("Masters: {}", names.join(", ")));
    }

    /// A master that could not be powered up.
    pub fn unavailable(&mut self, master: MasterKind, error: &HalError) {
        self.console
            .line(&format!("{} unavailable: {}", master, error));
        self.report.unavailable.push(master);
    }

    /// A fabric configuration was applied.
    pub fn config_applied(&mut self, cache_index: usize, buffering_index: usize, fabric: FabricSnapshot) {
        self.report.configs_applied += 1;
        self.context = PassContext {
            cache_index,
            buffering_index,
            fabric,
            mode: None,
        };
        self.console
            .line(&format!("Loop {} - {}", cache_index, buffering_index));
        self.console.line(&format!(
            "Current cache setting is 0x{:08X}, buffering setting is 0x{:08X}",
            fabric.cache, fabric.buffering
        ));
    }

    /// A fabric configuration was rejected.
    pub fn config_skipped(&mut self, cache_index: usize, buffering_index: usize, error: &FabricError) {
        self.report.configs_skipped += 1;
        self.console.line(&format!(
            "Skipping configuration Loop {} - {}: {}",
            cache_index, buffering_index, error
        ));
    }

    /// A performance mode was entered.
    pub fn mode_entered(&mut self, mode: PerformanceMode) {
        self.context.mode = Some(mode);
        self.console.line(&format!("Performance mode {}", mode));
    }

    /// A performance mode could not be selected.
    pub fn mode_skipped(&mut self, mode: PerformanceMode, error: &HalError) {
        self.report.modes_skipped += 1;
        self.console
            .line(&format!("Skipping performance mode {}: {}", mode, error));
    }

    /// Adds planner skips.
    pub fn skipped(&mut self, skipped: &SkipTally) {
        self.report.skipped.add(skipped);
    }

    /// Records one case.
    pub fn record(&mut self, case: &CaseReport) {
        self.report.record(case, self.context);
        match case.failure {
            Some(kind) => self.console.line(&format!(
                "FAIL {}: {} (expected {}, got {})",
                case.result.description, kind, case.result.reference, case.result.observed
            )),
            None => {
                if cfg!(feature = "trace-cases") {
                    self.console
                        .line(&format!("PASS {}", case.result.description));
                }
            }
        }
        if case.halt {
            self.console.line(&format!(
                "Fatal {} error, halting sweep",
                case.case.master
            ));
            self.report.halt = Some(HaltRecord {
                master: case.case.master,
                case: case.result.description.clone(),
            });
        }
    }

    /// Prints the closing line and returns the report.
    pub fn finish(mut self, virtual_ms: u64) -> SweepReport {
        self.report.virtual_ms = virtual_ms;
        let t = self.report.totals;
        self.console.line(&format!(
            "Sweep finished: {} passed, {} failed",
            t.passed, t.failed
        ));
        self.report
    }
}
