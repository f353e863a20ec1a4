//! p-chart control limits.
//!
//! The center line is the mean observed proportion defective; the limits
//! sit [`SIGMA_MULTIPLIER`] binomial standard deviations either side of it,
//! using the mean production count as the representative subgroup size.

use crate::error::{Result, SpcError};
use serde::{Deserialize, Serialize};

/// Width of the control band in standard deviations.
pub const SIGMA_MULTIPLIER: f64 = 3.0;

/// Frozen control limits for one line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlLimits {
    /// CL
    pub center_line: f64,
    /// UCL
    pub upper_limit: f64,
    /// LCL, never negative
    pub lower_limit: f64,
}

impl ControlLimits {
    /// Build limits from known values, checking `0 <= LCL <= CL <= UCL`.
    pub fn new(center_line: f64, upper_limit: f64, lower_limit: f64) -> Result<Self> {
        let finite = center_line.is_finite() && upper_limit.is_finite() && lower_limit.is_finite();
        if !finite
            || lower_limit < 0.0
            || lower_limit > center_line
            || center_line > upper_limit
        {
            return Err(SpcError::InvalidInput(format!(
                "limits must satisfy 0 <= LCL <= CL <= UCL (LCL={}, CL={}, UCL={})",
                lower_limit, center_line, upper_limit
            )));
        }
        Ok(Self {
            center_line,
            upper_limit,
            lower_limit,
        })
    }

    /// Estimate p-chart limits from parallel rate and production series.
    pub fn estimate(rates: &[f64], production_counts: &[u64]) -> Result<Self> {
        if rates.is_empty() {
            return Err(SpcError::InvalidInput(
                "cannot estimate control limits from an empty series".to_string(),
            ));
        }
        if rates.len() != production_counts.len() {
            return Err(SpcError::InvalidInput(format!(
                "rate series has {} points but production series has {}",
                rates.len(),
                production_counts.len()
            )));
        }

        let center_line = rates.iter().sum::<f64>() / rates.len() as f64;
        let avg_n =
            production_counts.iter().map(|&n| n as f64).sum::<f64>() / production_counts.len() as f64;

        if avg_n <= 0.0 {
            return Err(SpcError::InvalidInput(
                "mean production count is zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&center_line) {
            return Err(SpcError::InvalidInput(format!(
                "mean defect rate {} is not a proportion",
                center_line
            )));
        }

        let std_dev = (center_line * (1.0 - center_line) / avg_n).sqrt();
        let upper_limit = center_line + SIGMA_MULTIPLIER * std_dev;
        let lower_limit = (center_line - SIGMA_MULTIPLIER * std_dev).max(0.0);

        Ok(Self {
            center_line,
            upper_limit,
            lower_limit,
        })
    }

    /// Two-thirds point between CL and UCL.
    pub fn upper_two_thirds(&self) -> f64 {
        self.center_line + (self.upper_limit - self.center_line) * 2.0 / 3.0
    }

    /// Whether a rate lies within `[LCL, UCL]`.
    pub fn contains(&self, rate: f64) -> bool {
        rate >= self.lower_limit && rate <= self.upper_limit
    }

    /// One binomial standard deviation implied by the band.
    pub fn sigma(&self) -> f64 {
        (self.upper_limit - self.center_line) / SIGMA_MULTIPLIER
    }
}
