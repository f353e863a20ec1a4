// Linewatch CLI - Prometheus metrics definitions
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Prometheus metrics for a monitoring run.
//!
//! Gauges hold the frozen limits and the latest sample of every line;
//! counters accumulate rule violations and ticks. The registry is rendered
//! to text exposition format at the end of the run.

use crate::error::Result;
use lazy_static::lazy_static;
use linewatch::{ControlLimits, LineReport, TickObserver};
use prometheus::{
    register_counter, register_counter_vec, register_gauge_vec, Counter, CounterVec, Encoder,
    GaugeVec, TextEncoder,
};

lazy_static! {
    // ============================================================
    // Frozen limits (set once per line)
    // ============================================================

    /// Center line of each line's p-chart.
    pub static ref CENTER_LINE: GaugeVec = register_gauge_vec!(
        "linewatch_center_line",
        "Frozen p-chart center line (mean defect rate)",
        &["line"]
    ).expect("register linewatch_center_line");

    /// Upper control limit of each line's p-chart.
    pub static ref UPPER_LIMIT: GaugeVec = register_gauge_vec!(
        "linewatch_upper_limit",
        "Frozen p-chart upper control limit",
        &["line"]
    ).expect("register linewatch_upper_limit");

    /// Lower control limit of each line's p-chart.
    pub static ref LOWER_LIMIT: GaugeVec = register_gauge_vec!(
        "linewatch_lower_limit",
        "Frozen p-chart lower control limit",
        &["line"]
    ).expect("register linewatch_lower_limit");

    // ============================================================
    // Live samples (updated every tick)
    // ============================================================

    /// Defect rate of the latest sample.
    pub static ref DEFECT_RATE: GaugeVec = register_gauge_vec!(
        "linewatch_defect_rate",
        "Defect rate of the latest hourly sample",
        &["line"]
    ).expect("register linewatch_defect_rate");

    /// Production count of the latest sample.
    pub static ref PRODUCTION_COUNT: GaugeVec = register_gauge_vec!(
        "linewatch_production_count",
        "Production count of the latest hourly sample",
        &["line"]
    ).expect("register linewatch_production_count");

    // ============================================================
    // Counters
    // ============================================================

    /// Rule violations by line and rule.
    pub static ref RULE_VIOLATIONS: CounterVec = register_counter_vec!(
        "linewatch_rule_violations_total",
        "Rule violations detected, by line and rule",
        &["line", "rule"]
    ).expect("register linewatch_rule_violations_total");

    /// Ticks executed.
    pub static ref TICKS: Counter = register_counter!(
        "linewatch_ticks_total",
        "Monitoring ticks executed"
    ).expect("register linewatch_ticks_total");
}

/// Publish the frozen limits of one line.
pub fn update_limits(line: &str, limits: &ControlLimits) {
    CENTER_LINE.with_label_values(&[line]).set(limits.center_line);
    UPPER_LIMIT.with_label_values(&[line]).set(limits.upper_limit);
    LOWER_LIMIT.with_label_values(&[line]).set(limits.lower_limit);
}

/// Publish one line report: latest sample plus any violations.
pub fn record_report(report: &LineReport) {
    DEFECT_RATE
        .with_label_values(&[&report.line])
        .set(report.sample.defect_rate);
    PRODUCTION_COUNT
        .with_label_values(&[&report.line])
        .set(report.sample.production_count as f64);

    for violation in report.result.violations() {
        RULE_VIOLATIONS
            .with_label_values(&[&report.line, violation.rule().as_str()])
            .inc();
    }
}

/// Count one completed tick.
pub fn increment_ticks() {
    TICKS.inc();
}

/// Encode all registered metrics in Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Observer that mirrors monitor output into the metrics registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsRecorder;

impl TickObserver for MetricsRecorder {
    fn on_limits(&mut self, line: &linewatch::ProductionLine, limits: &ControlLimits) {
        update_limits(&line.name, limits);
    }

    fn on_report(&mut self, report: &LineReport) {
        record_report(report);
    }

    fn on_tick_complete(&mut self, _tick: u64) {
        increment_ticks();
    }
}
