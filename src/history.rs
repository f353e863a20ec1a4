//! Per-line running history.

use crate::generator::HourlySample;
use serde::{Deserialize, Serialize};

/// One recorded tick of a line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Tick index (1-based).
    pub tick: u64,
    /// Defect rate observed at this tick.
    pub defect_rate: f64,
    /// Production count behind the rate.
    pub production_count: u64,
}

/// Append-only record of a line's rates.
///
/// Nothing is evicted; the inspector only ever looks at the tail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineHistory {
    points: Vec<HistoryPoint>,
    rates: Vec<f64>,
}

impl LineHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sample for the given tick.
    pub fn push(&mut self, tick: u64, sample: &HourlySample) {
        self.points.push(HistoryPoint {
            tick,
            defect_rate: sample.defect_rate,
            production_count: sample.production_count,
        });
        self.rates.push(sample.defect_rate);
    }

    /// Rate series, oldest first.
    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    /// Production series, oldest first.
    pub fn production_counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.production_count).collect()
    }

    /// All recorded points, oldest first.
    pub fn points(&self) -> &[HistoryPoint] {
        &self.points
    }

    /// Most recent point.
    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.last()
    }

    /// Last `n` rates (fewer if the history is shorter).
    pub fn tail(&self, n: usize) -> &[f64] {
        let start = self.rates.len().saturating_sub(n);
        &self.rates[start..]
    }

    /// Number of recorded ticks.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
