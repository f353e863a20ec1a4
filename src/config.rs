//! Run configuration.
//!
//! [`SpcConfig`] gathers everything a monitor needs: the line catalog, the
//! working calendar, the warm-up and live variability settings, rule toggles
//! and an optional RNG seed. Every section falls back to its default when
//! omitted from JSON.

use crate::baseline::BaselineConfig;
use crate::error::Result;
use crate::generator::ShiftCalendar;
use crate::inspector::RuleSet;
use crate::line::{default_lines, LineRegistry, ProductionLine};
use crate::monitor::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Master configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpcConfig {
    /// Lines to monitor, in display order.
    pub lines: Vec<ProductionLine>,

    /// Working calendar for hourly conversion.
    pub calendar: ShiftCalendar,

    /// Warm-up window used to freeze limits.
    pub baseline: BaselineConfig,

    /// Live monitoring settings.
    pub monitor: MonitorConfig,

    /// Enabled inspection rules.
    pub rules: RuleSet,

    /// RNG seed for reproducible runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for SpcConfig {
    fn default() -> Self {
        Self {
            lines: default_lines(),
            calendar: ShiftCalendar::default(),
            baseline: BaselineConfig::default(),
            monitor: MonitorConfig::default(),
            rules: RuleSet::default(),
            seed: None,
        }
    }
}

impl SpcConfig {
    /// Default configuration (reference catalog, in-control dials).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the live variability dial.
    pub fn with_live_sigma(mut self, sigma: f64) -> Self {
        self.monitor.sigma = sigma;
        self
    }

    /// Set the warm-up length.
    pub fn with_warmup_ticks(mut self, ticks: usize) -> Self {
        self.baseline.warmup_ticks = ticks;
        self
    }

    /// Replace the line catalog.
    pub fn with_lines(mut self, lines: Vec<ProductionLine>) -> Self {
        self.lines = lines;
        self
    }

    /// Validated line registry.
    pub fn registry(&self) -> Result<LineRegistry> {
        LineRegistry::new(self.lines.clone())
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.registry()?;
        self.calendar.validate()?;
        self.baseline.validate()?;
        self.monitor.validate()?;
        Ok(())
    }

    /// Parse and validate JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SpcConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpcError;

    #[test]
    fn test_default_config() {
        let config = SpcConfig::default();
        assert_eq!(config.lines.len(), 8);
        assert_eq!(config.calendar.total_hours(), 416);
        assert_eq!(config.baseline.warmup_ticks, 50);
        assert!((config.monitor.sigma - 0.03).abs() < 1e-12);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{
            "lines": [
                { "name": "Line A", "monthly_production": 500000, "monthly_defects": 5000 }
            ],
            "monitor": { "sigma": 0.2 },
            "seed": 42
        }"#;

        let config = SpcConfig::from_json(json).unwrap();
        assert_eq!(config.lines.len(), 1);
        assert!((config.monitor.sigma - 0.2).abs() < 1e-12);
        assert!((config.baseline.sigma - 0.03).abs() < 1e-12);
        assert_eq!(config.calendar, ShiftCalendar::default());
        assert_eq!(config.seed, Some(42));
        assert!(config.rules.trend);
    }

    #[test]
    fn test_json_roundtrip_keeps_order() {
        let config = SpcConfig::default().with_seed(7).with_live_sigma(0.1);
        let json = config.to_json().unwrap();
        let restored = SpcConfig::from_json(&json).unwrap();
        assert_eq!(restored, config);
        assert_eq!(restored.lines[3].name, "Second Interior");
    }

    #[test]
    fn test_invalid_line_rejected() {
        let json = r#"{ "lines": [ { "name": "Bad", "monthly_production": 10, "monthly_defects": 11 } ] }"#;
        assert!(matches!(
            SpcConfig::from_json(json),
            Err(SpcError::InvalidLine { .. })
        ));
    }

    #[test]
    fn test_invalid_sigma_rejected() {
        let config = SpcConfig::default().with_live_sigma(-1.0);
        assert!(matches!(config.validate(), Err(SpcError::InvalidConfig(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SpcConfig::from_json("{ not json"),
            Err(SpcError::Json(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.json");
        let config = SpcConfig::default().with_warmup_ticks(20);
        fs::write(&path, config.to_json().unwrap()).unwrap();

        let loaded = SpcConfig::from_file(&path).unwrap();
        assert_eq!(loaded.baseline.warmup_ticks, 20);

        assert!(matches!(
            SpcConfig::from_file(dir.path().join("missing.json")),
            Err(SpcError::Io(_))
        ));
    }
}
