//! Monitoring loop.
//!
//! A [`Monitor`] freezes limits for every registered line, then advances in
//! discrete ticks. Each tick draws one hourly sample per line with the live
//! variability dial, appends it to that line's history and inspects the
//! history against the line's frozen limits. Reports go to a
//! [`TickObserver`]; a [`ControlSignal`] decides after every tick whether to
//! continue.

use crate::baseline::{Baseline, BaselineConfig};
use crate::config::SpcConfig;
use crate::error::{Result, SpcError};
use crate::generator::{validate_sigma, HourlySample, SampleGenerator, ShiftCalendar, DEFAULT_SIGMA};
use crate::history::LineHistory;
use crate::inspector::{InspectionResult, Inspector};
use crate::limits::ControlLimits;
use crate::line::{LineRegistry, ProductionLine};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Live monitoring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Variability dial for live ticks (0.03 in control, larger simulates drift).
    pub sigma: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
        }
    }
}

impl MonitorConfig {
    /// Check the live settings.
    pub fn validate(&self) -> Result<()> {
        validate_sigma("live sigma", self.sigma)
    }
}

/// Decision taken at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Stop,
}

/// Source of continue/stop decisions.
///
/// Consulted once after every completed tick, with the number of ticks run
/// so far.
pub trait ControlSignal {
    fn next_decision(&mut self, ticks_completed: u64) -> Decision;
}

impl<F> ControlSignal for F
where
    F: FnMut(u64) -> Decision,
{
    fn next_decision(&mut self, ticks_completed: u64) -> Decision {
        self(ticks_completed)
    }
}

/// Continue until a fixed number of ticks has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickBudget(pub u64);

impl ControlSignal for TickBudget {
    fn next_decision(&mut self, ticks_completed: u64) -> Decision {
        if ticks_completed >= self.0 {
            Decision::Stop
        } else {
            Decision::Continue
        }
    }
}

/// Output of one line for one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineReport {
    /// Tick index (1-based).
    pub tick: u64,
    /// Line name.
    pub line: String,
    /// Sample drawn for this tick.
    pub sample: HourlySample,
    /// Inspection of the history including this sample.
    pub result: InspectionResult,
}

/// Receiver for monitor output (display, plotting, metrics).
///
/// All methods default to no-ops.
pub trait TickObserver {
    /// Called once per line before the first tick.
    fn on_limits(&mut self, _line: &ProductionLine, _limits: &ControlLimits) {}

    /// Called for every line on every tick.
    fn on_report(&mut self, _report: &LineReport) {}

    /// Called after every line has been processed for a tick.
    fn on_tick_complete(&mut self, _tick: u64) {}
}

impl TickObserver for () {}

impl<T: TickObserver + ?Sized> TickObserver for &mut T {
    fn on_limits(&mut self, line: &ProductionLine, limits: &ControlLimits) {
        (**self).on_limits(line, limits)
    }

    fn on_report(&mut self, report: &LineReport) {
        (**self).on_report(report)
    }

    fn on_tick_complete(&mut self, tick: u64) {
        (**self).on_tick_complete(tick)
    }
}

/// End-of-run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Line-ticks that were out of control.
    pub alarms: u64,
    /// Out-of-control line-ticks per line.
    pub alarms_by_line: BTreeMap<String, u64>,
}

/// State owned by one monitored line.
#[derive(Debug, Clone)]
pub struct LineMonitor {
    line: ProductionLine,
    limits: ControlLimits,
    history: LineHistory,
    alarms: u64,
}

impl LineMonitor {
    pub fn line(&self) -> &ProductionLine {
        &self.line
    }

    pub fn limits(&self) -> &ControlLimits {
        &self.limits
    }

    pub fn history(&self) -> &LineHistory {
        &self.history
    }

    /// Ticks on which this line was out of control.
    pub fn alarms(&self) -> u64 {
        self.alarms
    }
}

/// Multi-line SPC monitor.
pub struct Monitor<R: Rng = StdRng> {
    lines: Vec<LineMonitor>,
    generator: SampleGenerator,
    inspector: Inspector,
    rng: R,
    ticks: u64,
}

impl Monitor<StdRng> {
    /// Build a monitor from a validated configuration.
    ///
    /// Uses the configured seed when present, otherwise OS entropy.
    pub fn from_config(config: &SpcConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Monitor::new(
            &config.registry()?,
            config.calendar,
            &config.baseline,
            &config.monitor,
            Inspector::new(config.rules),
            rng,
        )
    }
}

impl<R: Rng> Monitor<R> {
    /// Freeze baseline limits for every line and prepare for live ticks.
    pub fn new(
        registry: &LineRegistry,
        calendar: ShiftCalendar,
        baseline: &BaselineConfig,
        monitor: &MonitorConfig,
        inspector: Inspector,
        mut rng: R,
    ) -> Result<Self> {
        monitor.validate()?;
        let generator = SampleGenerator::new(calendar, monitor.sigma)?;

        let mut lines = Vec::with_capacity(registry.len());
        for line in registry {
            let frozen = Baseline::initialize(line, calendar, baseline, &mut rng)?;
            lines.push(LineMonitor {
                line: line.clone(),
                limits: frozen.limits,
                history: LineHistory::new(),
                alarms: 0,
            });
        }

        info!(
            lines = lines.len(),
            warmup_ticks = baseline.warmup_ticks,
            baseline_sigma = baseline.sigma,
            live_sigma = monitor.sigma,
            "Control limits frozen"
        );

        Ok(Self {
            lines,
            generator,
            inspector,
            rng,
            ticks: 0,
        })
    }

    /// Run one tick across every line, in registration order.
    pub fn tick(&mut self) -> Result<Vec<LineReport>> {
        let tick = self.ticks + 1;
        let mut reports = Vec::with_capacity(self.lines.len());

        for state in &mut self.lines {
            let sample = self.generator.sample(&state.line, &mut self.rng)?;
            state.history.push(tick, &sample);

            let result = self.inspector.inspect(state.history.rates(), &state.limits);

            debug!(
                tick,
                line = %state.line.name,
                production = sample.production_count,
                defects = sample.defect_count,
                rate = sample.defect_rate,
                "Sample recorded"
            );

            if result.is_alarm() {
                state.alarms += 1;
                warn!(
                    tick,
                    line = %state.line.name,
                    rate = sample.defect_rate,
                    "Out of control: {}",
                    result.messages().join("; ")
                );
            }

            reports.push(LineReport {
                tick,
                line: state.line.name.clone(),
                sample,
                result,
            });
        }

        self.ticks = tick;
        Ok(reports)
    }

    /// Drive ticks until the control signal says stop.
    ///
    /// The first tick runs unconditionally; the signal is consulted after
    /// each completed tick.
    pub fn run<S, O>(&mut self, mut signal: S, mut observer: O) -> Result<RunSummary>
    where
        S: ControlSignal,
        O: TickObserver,
    {
        for state in &self.lines {
            observer.on_limits(&state.line, &state.limits);
        }

        info!(lines = self.lines.len(), "Monitoring started");

        loop {
            let reports = self.tick()?;
            for report in &reports {
                observer.on_report(report);
            }
            observer.on_tick_complete(self.ticks);

            if signal.next_decision(self.ticks) == Decision::Stop {
                break;
            }
        }

        let summary = self.summary();
        info!(
            ticks = summary.ticks,
            alarms = summary.alarms,
            "Monitoring stopped"
        );
        Ok(summary)
    }

    /// Summary of everything run so far.
    pub fn summary(&self) -> RunSummary {
        let alarms_by_line: BTreeMap<String, u64> = self
            .lines
            .iter()
            .map(|l| (l.line.name.clone(), l.alarms))
            .collect();
        RunSummary {
            ticks: self.ticks,
            alarms: alarms_by_line.values().sum(),
            alarms_by_line,
        }
    }

    /// Ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Per-line state in registration order.
    pub fn lines(&self) -> &[LineMonitor] {
        &self.lines
    }

    /// Frozen limits of a line.
    pub fn limits(&self, name: &str) -> Result<&ControlLimits> {
        self.line(name).map(|l| &l.limits)
    }

    /// History of a line.
    pub fn history(&self, name: &str) -> Result<&LineHistory> {
        self.line(name).map(|l| &l.history)
    }

    /// Re-run the inspector on a line's current history.
    pub fn inspect(&self, name: &str) -> Result<InspectionResult> {
        let state = self.line(name)?;
        Ok(self.inspector.inspect(state.history.rates(), &state.limits))
    }

    /// Live variability dial.
    pub fn live_sigma(&self) -> f64 {
        self.generator.sigma()
    }

    fn line(&self, name: &str) -> Result<&LineMonitor> {
        self.lines
            .iter()
            .find(|l| l.line.name == name)
            .ok_or_else(|| SpcError::UnknownLine(name.to_string()))
    }
}
