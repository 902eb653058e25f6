//! Boundary Sweep Driver.
//!
//! The driver walks the whole configuration space:
//!
//! 1. **Configuration**: every cache setting (outer) and every buffering
//!    setting (inner) is applied through the fabric adapter. A rejected
//!    setting is reported and skipped.
//! 2. **Performance mode**: each pass is repeated per configured mode.
//! 3. **Masters**: every powered master runs every payload size it is
//!    configured for, over every planned case.
//!
//! It never retries and never aborts on a failed case. The only early exit
//! is a hardware error from a master whose fault policy halts the sweep.

/// Case planning and execution.
pub mod case;

pub use case::{plan_cases, run_case, CasePlan, CasePoint, CaseReport, FailureKind, TransferCase};

use crate::catalog::Catalog;
use crate::common::PerformanceMode;
use crate::fabric::{
    apply_buffering, apply_cache, generate_buffering_configs, generate_cache_configs,
    BufferingConfig, CacheConfig,
};
use crate::masters::{BusMaster, MasterKind};
use crate::report::{Console, Reporter};
use crate::soc::traits::Platform;
use crate::stats::SweepReport;
use crate::verify::IntegrityVerifier;
use std::collections::BTreeMap;
use std::ops::ControlFlow;
use tracing::{info, warn};

/// Default payload size for a master, in bytes.
pub fn default_payload_size(master: MasterKind) -> usize {
    match master {
        MasterKind::CoreCopy => 32,
        MasterKind::Sdio => 512,
        MasterKind::Uart => 1024,
        _ => 4096,
    }
}

/// What the driver sweeps.
#[derive(Clone, Debug)]
pub struct SweepSettings {
    /// Walk every cache setting; otherwise leave the cache as it is.
    pub sweep_cache: bool,
    /// Walk every buffering setting; otherwise leave buffering as it is.
    pub sweep_buffering: bool,
    /// First cache setting to run.
    pub resume_cache: usize,
    /// First buffering setting to run, within the first cache setting only.
    pub resume_buffering: usize,
    /// Modes each pass is repeated under; empty runs one pass as-is.
    pub performance_modes: Vec<PerformanceMode>,
    /// Payload sizes per master; a master without an entry uses its default.
    pub payload_sizes: BTreeMap<MasterKind, Vec<usize>>,
    /// Masters to run; empty runs every master supplied.
    pub masters: Vec<MasterKind>,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            sweep_cache: true,
            sweep_buffering: true,
            resume_cache: 0,
            resume_buffering: 0,
            performance_modes: Vec::new(),
            payload_sizes: BTreeMap::new(),
            masters: Vec::new(),
        }
    }
}

impl SweepSettings {
    /// Payload sizes a master runs, in order.
    pub fn payload_sizes_for(&self, master: MasterKind) -> Vec<usize> {
        match self.payload_sizes.get(&master) {
            Some(sizes) if !sizes.is_empty() => sizes.clone(),
            _ => vec![default_payload_size(master)],
        }
    }

    /// Whether `master` is selected.
    pub fn selects(&self, master: MasterKind) -> bool {
        self.masters.is_empty() || self.masters.contains(&master)
    }

    /// Cache settings to walk, with their positions; `None` leaves the fabric alone.
    fn cache_passes(&self) -> Vec<(usize, Option<CacheConfig>)> {
        if self.sweep_cache {
            generate_cache_configs()
                .into_iter()
                .map(Some)
                .enumerate()
                .skip(self.resume_cache)
                .collect()
        } else {
            vec![(0, None)]
        }
    }

    fn buffering_passes(&self) -> Vec<(usize, Option<BufferingConfig>)> {
        if self.sweep_buffering {
            generate_buffering_configs()
                .into_iter()
                .map(Some)
                .enumerate()
                .collect()
        } else {
            vec![(0, None)]
        }
    }
}

/// Orchestrates the sweep.
pub struct SweepDriver<'c> {
    catalog: &'c Catalog,
    settings: SweepSettings,
    verifier: IntegrityVerifier,
    masters: Vec<Box<dyn BusMaster>>,
}

impl<'c> SweepDriver<'c> {
    /// Creates a driver.
    ///
    /// # Arguments
    ///
    /// * `catalog` - Regions under test
    /// * `settings` - What to sweep
    /// * `verifier` - Payload generator owning the scratch buffer
    /// * `masters` - Masters available on the platform
    pub fn new(
        catalog: &'c Catalog,
        settings: SweepSettings,
        verifier: IntegrityVerifier,
        masters: Vec<Box<dyn BusMaster>>,
    ) -> Self {
        Self {
            catalog,
            settings,
            verifier,
            masters,
        }
    }

    /// Runs the whole sweep.
    ///
    /// # Arguments
    ///
    /// * `hw` - Platform to run on
    /// * `console` - Sink for progress and failure lines
    /// * `seed` - Payload seed, echoed in the banner and the report
    ///
    /// # Returns
    ///
    /// The final report; `halt` is set if a fatal error stopped the sweep.
    pub fn run(&mut self, hw: &mut Platform<'_>, console: &mut dyn Console, seed: u64) -> SweepReport {
        let started = hw.clock.now_ms();
        let mut reporter = Reporter::new(console, seed);

        self.masters.retain(|m| self.settings.selects(m.kind()));
        let kinds: Vec<MasterKind> = self.masters.iter().map(|m| m.kind()).collect();
        reporter.banner(self.catalog, &kinds);

        let mut active = Vec::new();
        for (idx, master) in self.masters.iter_mut().enumerate() {
            match master.init(&mut *hw.power) {
                Ok(()) => active.push(idx),
                Err(e) => {
                    warn!(master = %master.kind(), error = %e, "power-up failed");
                    reporter.unavailable(master.kind(), &e);
                }
            }
        }

        let cache_passes = self.settings.cache_passes();
        let buffering_passes = self.settings.buffering_passes();
        let first_cache = cache_passes.first().map(|(j, _)| *j);

        'configs: for (j, cache) in &cache_passes {
            let resume = if Some(*j) == first_cache && self.settings.sweep_buffering {
                self.settings.resume_buffering
            } else {
                0
            };
            for (i, buffering) in buffering_passes.iter().skip(resume) {
                let applied = cache
                    .as_ref()
                    .map_or(Ok(()), |c| apply_cache(&mut *hw.fabric, c))
                    .and_then(|()| {
                        buffering
                            .as_ref()
                            .map_or(Ok(()), |b| apply_buffering(&mut *hw.fabric, b))
                    });
                if let Err(e) = applied {
                    warn!(cache = j, buffering = i, error = %e, "configuration rejected");
                    reporter.config_skipped(*j, *i, &e);
                    continue;
                }
                reporter.config_applied(*j, *i, hw.fabric.snapshot());

                if self.run_modes(hw, &mut reporter, &active).is_break() {
                    break 'configs;
                }
            }
        }

        let elapsed = hw.clock.now_ms() - started;
        let report = reporter.finish(elapsed);
        info!(
            passed = report.totals.passed,
            failed = report.totals.failed,
            "sweep finished"
        );
        report
    }

    fn run_modes(
        &mut self,
        hw: &mut Platform<'_>,
        reporter: &mut Reporter<'_>,
        active: &[usize],
    ) -> ControlFlow<()> {
        if self.settings.performance_modes.is_empty() {
            return self.run_masters(hw, reporter, active);
        }
        for mode in self.settings.performance_modes.clone() {
            if let Err(e) = hw.power.select_mode(mode) {
                warn!(%mode, error = %e, "mode selection failed");
                reporter.mode_skipped(mode, &e);
                continue;
            }
            reporter.mode_entered(mode);
            self.run_masters(hw, reporter, active)?;
        }
        ControlFlow::Continue(())
    }

    fn run_masters(
        &mut self,
        hw: &mut Platform<'_>,
        reporter: &mut Reporter<'_>,
        active: &[usize],
    ) -> ControlFlow<()> {
        let scratch = self.verifier.scratch();
        for &idx in active {
            let master = self.masters[idx].as_mut();
            for len in self.settings.payload_sizes_for(master.kind()) {
                let plan = plan_cases(master, self.catalog, &*hw.memory, scratch, len);
                reporter.skipped(&plan.skipped);
                for case in &plan.cases {
                    let outcome = run_case(master, case, &mut self.verifier, self.catalog, hw);
                    reporter.record(&outcome);
                    if outcome.halt {
                        return ControlFlow::Break(());
                    }
                }
            }
        }
        ControlFlow::Continue(())
    }
}
