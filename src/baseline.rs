//! Baseline initialization.
//!
//! Before live monitoring starts, each line runs a warm-up window with the
//! in-control variability dial. The limits estimated from that window are
//! frozen for the rest of the run.

use crate::error::{Result, SpcError};
use crate::generator::{validate_sigma, SampleGenerator, ShiftCalendar, DEFAULT_SIGMA};
use crate::limits::ControlLimits;
use crate::line::ProductionLine;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default warm-up length in ticks (hours).
pub const DEFAULT_WARMUP_TICKS: usize = 50;

/// Warm-up configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineConfig {
    /// Number of simulated hours used to estimate limits.
    pub warmup_ticks: usize,
    /// Variability dial for the warm-up. Independent of the live dial.
    pub sigma: f64,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            warmup_ticks: DEFAULT_WARMUP_TICKS,
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl BaselineConfig {
    /// Check the warm-up settings.
    pub fn validate(&self) -> Result<()> {
        if self.warmup_ticks == 0 {
            return Err(SpcError::InvalidConfig(
                "warmup_ticks must be at least 1".to_string(),
            ));
        }
        validate_sigma("baseline sigma", self.sigma)
    }
}

/// Frozen baseline of one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Limits estimated from the warm-up window.
    pub limits: ControlLimits,
    /// Number of warm-up samples behind the limits.
    pub samples: usize,
}

impl Baseline {
    /// Run the warm-up window for a line and freeze its limits.
    pub fn initialize<R: Rng + ?Sized>(
        line: &ProductionLine,
        calendar: ShiftCalendar,
        config: &BaselineConfig,
        rng: &mut R,
    ) -> Result<Self> {
        config.validate()?;
        let generator = SampleGenerator::new(calendar, config.sigma)?;

        let mut rates = Vec::with_capacity(config.warmup_ticks);
        let mut production_counts = Vec::with_capacity(config.warmup_ticks);

        for _ in 0..config.warmup_ticks {
            let sample = generator.sample(line, rng)?;
            rates.push(sample.defect_rate);
            production_counts.push(sample.production_count);
        }

        let limits = ControlLimits::estimate(&rates, &production_counts)?;

        debug!(
            line = %line.name,
            cl = limits.center_line,
            ucl = limits.upper_limit,
            lcl = limits.lower_limit,
            "Baseline frozen after {} warm-up hours",
            config.warmup_ticks
        );

        Ok(Self {
            limits,
            samples: config.warmup_ticks,
        })
    }
}
