//! Simulated Power Controller.
//!
//! Tracks which peripherals are powered and the current performance mode,
//! and can be told to fail the power-up of chosen masters.

use crate::common::{HalError, PerformanceMode};
use crate::masters::MasterKind;
use crate::soc::traits::PowerControl;
use tracing::debug;

/// Simulated power controller.
///
/// Masters listed as failing refuse to power up, which lets the sweep's
/// handling of unavailable masters be exercised.
#[derive(Debug, Default)]
pub struct SimPower {
    failing: Vec<MasterKind>,
    powered: Vec<MasterKind>,
    mode: Option<PerformanceMode>,
    mode_switches: u64,
}

impl SimPower {
    /// Creates a controller where every master in `failing` refuses power.
    pub fn new(failing: Vec<MasterKind>) -> Self {
        Self {
            failing,
            ..Self::default()
        }
    }

    /// Masters successfully powered, in power-up order.
    pub fn powered(&self) -> &[MasterKind] {
        &self.powered
    }

    /// Current performance mode, if one was selected.
    pub fn mode(&self) -> Option<PerformanceMode> {
        self.mode
    }

    /// Number of mode changes.
    pub fn mode_switches(&self) -> u64 {
        self.mode_switches
    }
}

impl PowerControl for SimPower {
    fn power_up(&mut self, master: MasterKind) -> Result<(), HalError> {
        if self.failing.contains(&master) {
            return Err(HalError::PowerUp { master });
        }
        if !self.powered.contains(&master) {
            self.powered.push(master);
        }
        Ok(())
    }

    fn select_mode(&mut self, mode: PerformanceMode) -> Result<(), HalError> {
        debug!(%mode, "performance mode selected");
        self.mode = Some(mode);
        self.mode_switches += 1;
        Ok(())
    }
}
