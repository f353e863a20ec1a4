//! Hourly sample generation.
//!
//! Converts a line's monthly aggregates into one simulated hour of
//! production. The hourly production count is drawn from a normal
//! distribution centred on the average hourly output, and the defect count
//! from a Poisson distribution whose mean is the line's long-run defect
//! proportion applied to that production.

use crate::error::{Result, SpcError};
use crate::line::ProductionLine;
use rand::Rng;
use rand_distr::{Distribution, Normal, Poisson};
use serde::{Deserialize, Serialize};

/// Default variability dial (tight, in-control process).
pub const DEFAULT_SIGMA: f64 = 0.03;

/// Working calendar used to spread monthly figures over hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftCalendar {
    /// Working days per month.
    pub days: u32,
    /// Shifts per day.
    pub shifts: u32,
    /// Hours per shift.
    pub hours_per_shift: u32,
}

impl Default for ShiftCalendar {
    fn default() -> Self {
        Self {
            days: 26,
            shifts: 2,
            hours_per_shift: 8,
        }
    }
}

impl ShiftCalendar {
    /// Create a calendar.
    pub fn new(days: u32, shifts: u32, hours_per_shift: u32) -> Self {
        Self {
            days,
            shifts,
            hours_per_shift,
        }
    }

    /// Working hours per month (416 for the default calendar).
    pub fn total_hours(&self) -> u64 {
        self.days as u64 * self.shifts as u64 * self.hours_per_shift as u64
    }

    /// Reject calendars with a zero field.
    pub fn validate(&self) -> Result<()> {
        if self.total_hours() == 0 {
            return Err(SpcError::InvalidConfig(format!(
                "calendar must have at least one working hour (days={}, shifts={}, hours_per_shift={})",
                self.days, self.shifts, self.hours_per_shift
            )));
        }
        Ok(())
    }
}

/// One simulated hour of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Units produced during the hour.
    pub production_count: u64,
    /// Defective units during the hour.
    pub defect_count: u64,
    /// `defect_count / production_count`, 0 when nothing was produced.
    pub defect_rate: f64,
}

impl HourlySample {
    /// Build a sample, deriving the rate.
    pub fn new(production_count: u64, defect_count: u64) -> Self {
        let defect_rate = if production_count > 0 {
            defect_count as f64 / production_count as f64
        } else {
            0.0
        };
        Self {
            production_count,
            defect_count,
            defect_rate,
        }
    }
}

/// Stateless hourly sample generator.
///
/// Each call is independent; the only state touched is the caller's RNG.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleGenerator {
    calendar: ShiftCalendar,
    sigma: f64,
}

impl SampleGenerator {
    /// Create a generator with the given calendar and variability.
    pub fn new(calendar: ShiftCalendar, sigma: f64) -> Result<Self> {
        calendar.validate()?;
        validate_sigma("sigma", sigma)?;
        Ok(Self { calendar, sigma })
    }

    /// Calendar in use.
    pub fn calendar(&self) -> ShiftCalendar {
        self.calendar
    }

    /// Variability dial in use.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Draw one hour for a line.
    pub fn sample<R: Rng + ?Sized>(&self, line: &ProductionLine, rng: &mut R) -> Result<HourlySample> {
        self.sample_raw(line.monthly_production, line.monthly_defects, rng)
    }

    /// Draw one hour from raw monthly figures.
    pub fn sample_raw<R: Rng + ?Sized>(
        &self,
        monthly_production: u64,
        monthly_defects: u64,
        rng: &mut R,
    ) -> Result<HourlySample> {
        if monthly_production == 0 {
            return Err(SpcError::InvalidInput(
                "monthly_production must be positive".to_string(),
            ));
        }

        let mean_hourly = monthly_production as f64 / self.calendar.total_hours() as f64;
        let normal = Normal::new(mean_hourly, mean_hourly * self.sigma)
            .map_err(|e| SpcError::Distribution(format!("normal({}): {}", mean_hourly, e)))?;

        let draw = normal.sample(rng).round();
        // A non-positive draw is a dead hour, not an error.
        let production_count = if draw > 0.0 { draw as u64 } else { 0 };

        let base_rate = monthly_defects as f64 / monthly_production as f64;
        let expected_defects = base_rate * production_count as f64;

        let defect_count = if expected_defects > 0.0 {
            let poisson = Poisson::new(expected_defects).map_err(|e| {
                SpcError::Distribution(format!("poisson({}): {}", expected_defects, e))
            })?;
            let draw: f64 = poisson.sample(rng);
            (draw as u64).min(production_count)
        } else {
            0
        };

        Ok(HourlySample::new(production_count, defect_count))
    }
}

impl Default for SampleGenerator {
    fn default() -> Self {
        Self {
            calendar: ShiftCalendar::default(),
            sigma: DEFAULT_SIGMA,
        }
    }
}

/// Check a variability dial.
pub(crate) fn validate_sigma(what: &str, sigma: f64) -> Result<()> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(SpcError::InvalidConfig(format!(
            "{} must be a positive finite number, got {}",
            what, sigma
        )));
    }
    Ok(())
}
