//! # Linewatch - Statistical process control for packaging lines
//!
//! Simulates hourly production and defect counts for parallel production
//! lines, freezes p-chart control limits from a healthy warm-up window, and
//! flags lines that drift out of statistical control.
//!
//! ## Key Features
//!
//! - **Hourly simulation**: Normal production draws, Poisson defect draws
//! - **p-chart limits**: CL and ±3σ binomial limits, LCL clamped at zero
//! - **Rule inspection**: Limit breaches, shifts, trends and upper-zone clustering
//! - **Driven loop**: Explicit continue/stop signal, injectable RNG
//!
//! ## Quick Start
//!
//! ```rust
//! use linewatch::{Monitor, SpcConfig, TickBudget};
//!
//! let config = SpcConfig::default().with_seed(42);
//! let mut monitor = Monitor::from_config(&config).unwrap();
//!
//! for line in monitor.lines() {
//!     let limits = line.limits();
//!     assert!(limits.lower_limit <= limits.center_line);
//!     assert!(limits.center_line <= limits.upper_limit);
//! }
//!
//! let summary = monitor.run(TickBudget(10), ()).unwrap();
//! assert_eq!(summary.ticks, 10);
//! ```
//!
//! ## Modules
//!
//! - [`line`]: Production line catalog
//! - [`generator`]: Hourly sample generation
//! - [`limits`]: p-chart control limit estimation
//! - [`baseline`]: Warm-up window and frozen limits
//! - [`history`]: Per-line rate history
//! - [`inspector`]: Out-of-control rules
//! - [`monitor`]: Tick loop, control signal and observers
//! - [`config`]: JSON run configuration

// Modules
pub mod baseline;
pub mod config;
pub mod error;
pub mod generator;
pub mod history;
pub mod inspector;
pub mod limits;
pub mod line;
pub mod monitor;

// Re-exports for convenient access
pub use baseline::{Baseline, BaselineConfig};
pub use config::SpcConfig;
pub use error::{Result, SpcError};
pub use generator::{HourlySample, SampleGenerator, ShiftCalendar};
pub use history::{HistoryPoint, LineHistory};
pub use inspector::{Direction, InspectionResult, Inspector, RuleId, RuleSet, Side, Violation};
pub use limits::ControlLimits;
pub use line::{LineRegistry, ProductionLine};
pub use monitor::{
    ControlSignal, Decision, LineMonitor, LineReport, Monitor, MonitorConfig, RunSummary,
    TickBudget, TickObserver,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_run() {
        let config = SpcConfig::default().with_seed(1);
        let mut monitor = Monitor::from_config(&config).unwrap();
        let summary = monitor.run(TickBudget(3), ()).unwrap();

        assert_eq!(summary.ticks, 3);
        for line in monitor.lines() {
            assert_eq!(line.history().len(), 3);
        }
    }
}
