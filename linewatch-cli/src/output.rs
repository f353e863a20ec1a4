// Linewatch CLI - Console driver for the Linewatch SPC engine
//
// Licensed under AGPL-3.0.
// See LICENSE file for details.

//! Console rendering and history export.

use crate::error::{CliError, Result};
use chrono::{DateTime, Local};
use clap::ValueEnum;
use linewatch::{ControlLimits, LineMonitor, LineReport, ProductionLine, RunSummary, TickObserver};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Per-tick output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable text.
    Text,
    /// One JSON object per line.
    Json,
}

/// JSON line events.
#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Event<'a> {
    Limits {
        line: &'a str,
        limits: &'a ControlLimits,
    },
    Report(&'a LineReport),
    Summary {
        finished_at: String,
        ticks: u64,
        alarms: u64,
        alarms_by_line: &'a BTreeMap<String, u64>,
    },
}

/// Writes monitor output to a console stream.
///
/// Write failures do not abort the run; the first one is kept and returned
/// by [`ConsoleReporter::finish`].
pub struct ConsoleReporter<W: Write> {
    out: W,
    format: OutputFormat,
    limits_header: bool,
    current_tick: u64,
    error: Option<CliError>,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            limits_header: false,
            current_tick: 0,
            error: None,
        }
    }

    /// Print the end-of-run summary.
    pub fn summary(&mut self, summary: &RunSummary, finished_at: DateTime<Local>) {
        let result = match self.format {
            OutputFormat::Text => write_summary_text(&mut self.out, summary, finished_at),
            OutputFormat::Json => self.write_event(&Event::Summary {
                finished_at: finished_at.to_rfc3339(),
                ticks: summary.ticks,
                alarms: summary.alarms,
                alarms_by_line: &summary.alarms_by_line,
            }),
        };
        self.keep(result);
    }

    /// Flush and hand back the stream, or the first write error.
    pub fn finish(mut self) -> Result<W> {
        let flushed = self.out.flush();
        if let Some(e) = self.error {
            return Err(e);
        }
        flushed?;
        Ok(self.out)
    }

    fn keep(&mut self, result: Result<()>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }

    fn write_event(&mut self, event: &Event<'_>) -> Result<()> {
        serde_json::to_writer(&mut self.out, event)?;
        writeln!(self.out)?;
        Ok(())
    }

    fn write_limits_text(&mut self, line: &ProductionLine, limits: &ControlLimits) -> Result<()> {
        if !self.limits_header {
            self.limits_header = true;
            writeln!(self.out, "\nControl limits (frozen after warm-up)")?;
            writeln!(self.out, "{}", "-".repeat(72))?;
        }
        writeln!(
            self.out,
            "{:<20} | CL: {:.5} | UCL: {:.5} | LCL: {:.5}",
            line.name, limits.center_line, limits.upper_limit, limits.lower_limit
        )?;
        Ok(())
    }

    fn write_report_text(&mut self, report: &LineReport) -> Result<()> {
        if report.tick != self.current_tick {
            self.current_tick = report.tick;
            writeln!(self.out, "\n========== HOUR {} ==========", report.tick)?;
        }
        writeln!(
            self.out,
            "{:<20} | production: {:>7} | defects: {:>5} | rate: {:.5}",
            report.line,
            group_thousands(report.sample.production_count),
            group_thousands(report.sample.defect_count),
            report.sample.defect_rate
        )?;
        for message in report.result.messages() {
            writeln!(self.out, "    {}", message)?;
        }
        Ok(())
    }
}

impl<W: Write> TickObserver for ConsoleReporter<W> {
    fn on_limits(&mut self, line: &ProductionLine, limits: &ControlLimits) {
        let result = match self.format {
            OutputFormat::Text => self.write_limits_text(line, limits),
            OutputFormat::Json => self.write_event(&Event::Limits {
                line: &line.name,
                limits,
            }),
        };
        self.keep(result);
    }

    fn on_report(&mut self, report: &LineReport) {
        let result = match self.format {
            OutputFormat::Text => self.write_report_text(report),
            OutputFormat::Json => self.write_event(&Event::Report(report)),
        };
        self.keep(result);
    }

    fn on_tick_complete(&mut self, _tick: u64) {
        let result = self.out.flush().map_err(CliError::from);
        self.keep(result);
    }
}

fn write_summary_text<W: Write>(
    out: &mut W,
    summary: &RunSummary,
    finished_at: DateTime<Local>,
) -> Result<()> {
    writeln!(
        out,
        "\nSimulation stopped. Total {} hours simulated.",
        summary.ticks
    )?;
    writeln!(
        out,
        "Out-of-control line-hours: {} (finished {})",
        summary.alarms,
        finished_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    for (line, alarms) in summary.alarms_by_line.iter().filter(|(_, a)| **a > 0) {
        writeln!(out, "  {:<20} {}", line, alarms)?;
    }
    Ok(())
}

/// Two observers driven as one.
pub struct Fanout<A, B>(pub A, pub B);

impl<A: TickObserver, B: TickObserver> TickObserver for Fanout<A, B> {
    fn on_limits(&mut self, line: &ProductionLine, limits: &ControlLimits) {
        self.0.on_limits(line, limits);
        self.1.on_limits(line, limits);
    }

    fn on_report(&mut self, report: &LineReport) {
        self.0.on_report(report);
        self.1.on_report(report);
    }

    fn on_tick_complete(&mut self, tick: u64) {
        self.0.on_tick_complete(tick);
        self.1.on_tick_complete(tick);
    }
}

/// Format an integer with comma thousands separators.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

/// One row of the history export.
#[derive(Debug, Serialize)]
struct HistoryRow<'a> {
    line: &'a str,
    tick: u64,
    defect_rate: f64,
    production_count: u64,
    center_line: f64,
    upper_limit: f64,
    lower_limit: f64,
}

/// Write every line's rate history with its frozen limits as CSV.
///
/// Returns the number of data rows written.
pub fn write_history_csv(path: impl AsRef<Path>, lines: &[LineMonitor]) -> Result<usize> {
    let mut writer = csv::Writer::from_path(path)?;
    let mut rows = 0;

    for monitor in lines {
        let limits = monitor.limits();
        for point in monitor.history().points() {
            writer.serialize(HistoryRow {
                line: &monitor.line().name,
                tick: point.tick,
                defect_rate: point.defect_rate,
                production_count: point.production_count,
                center_line: limits.center_line,
                upper_limit: limits.upper_limit,
                lower_limit: limits.lower_limit,
            })?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use linewatch::{HourlySample, InspectionResult, Monitor, SpcConfig, TickBudget, Violation};

    fn report(tick: u64, result: InspectionResult) -> LineReport {
        LineReport {
            tick,
            line: "Second Exterior".to_string(),
            sample: HourlySample::new(1923, 25),
            result,
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1923), "1,923");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_text_report() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Text);
        let limits = ControlLimits::new(0.01375, 0.0217, 0.0058).unwrap();
        let line = ProductionLine::new("Second Exterior", 800_000, 11_000);

        reporter.on_limits(&line, &limits);
        reporter.on_report(&report(1, InspectionResult::InControl));
        reporter.on_report(&report(
            2,
            InspectionResult::OutOfControl(vec![Violation::UpperZoneCluster]),
        ));

        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert!(text.contains("Second Exterior      | CL: 0.01375 | UCL: 0.02170 | LCL: 0.00580"));
        assert!(text.contains("HOUR 1"));
        assert!(text.contains("HOUR 2"));
        assert!(text.contains("1,923"));
        assert!(text.contains("rate: 0.01300"));
        assert!(text.contains("Process in control"));
        assert!(text.contains("RULE 4"));
    }

    #[test]
    fn test_json_report_lines() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Json);
        reporter.on_report(&report(1, InspectionResult::InControl));
        reporter.summary(&RunSummary::default(), Local::now());

        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        let events: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["event"], "report");
        assert_eq!(events[0]["tick"], 1);
        assert_eq!(events[1]["event"], "summary");
        assert_eq!(events[1]["ticks"], 0);
    }

    #[test]
    fn test_summary_text() {
        let mut reporter = ConsoleReporter::new(Vec::new(), OutputFormat::Text);
        let mut summary = RunSummary {
            ticks: 12,
            alarms: 3,
            ..Default::default()
        };
        summary.alarms_by_line.insert("Mouthwash".to_string(), 3);
        summary.alarms_by_line.insert("Body Spray".to_string(), 0);
        reporter.summary(&summary, Local::now());

        let text = String::from_utf8(reporter.finish().unwrap()).unwrap();
        assert!(text.contains("Simulation stopped. Total 12 hours simulated."));
        assert!(text.contains("Mouthwash"));
        assert!(!text.contains("Body Spray"));
    }

    #[test]
    fn test_write_history_csv() {
        let mut monitor = Monitor::from_config(&SpcConfig::default().with_seed(8)).unwrap();
        monitor.run(TickBudget(4), ()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let rows = write_history_csv(&path, monitor.lines()).unwrap();
        assert_eq!(rows, 4 * monitor.lines().len());

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            "line,tick,defect_rate,production_count,center_line,upper_limit,lower_limit"
        );
        assert_eq!(lines.count(), rows);
    }
}
