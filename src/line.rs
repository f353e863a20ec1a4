//! Production line catalog.
//!
//! A [`ProductionLine`] carries the monthly aggregates the sample generator
//! works from. The [`LineRegistry`] is the immutable, ordered set of lines a
//! monitor runs over.

use crate::error::{Result, SpcError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A production line and its monthly aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLine {
    /// Unique line name.
    pub name: String,
    /// Units produced per month.
    pub monthly_production: u64,
    /// Defective units per month.
    pub monthly_defects: u64,
}

impl ProductionLine {
    /// Create a new line definition.
    pub fn new(name: impl Into<String>, monthly_production: u64, monthly_defects: u64) -> Self {
        Self {
            name: name.into(),
            monthly_production,
            monthly_defects,
        }
    }

    /// Long-run proportion defective (`monthly_defects / monthly_production`).
    pub fn baseline_rate(&self) -> f64 {
        if self.monthly_production == 0 {
            return 0.0;
        }
        self.monthly_defects as f64 / self.monthly_production as f64
    }

    /// Check the line definition.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SpcError::invalid_line(&self.name, "name must not be empty"));
        }
        if self.monthly_production == 0 {
            return Err(SpcError::invalid_line(
                &self.name,
                "monthly_production must be positive",
            ));
        }
        if self.monthly_defects > self.monthly_production {
            return Err(SpcError::invalid_line(
                &self.name,
                format!(
                    "monthly_defects ({}) exceeds monthly_production ({})",
                    self.monthly_defects, self.monthly_production
                ),
            ));
        }
        Ok(())
    }
}

/// Ordered, validated set of production lines.
///
/// Lines keep the order they were registered in; every per-tick pass over the
/// registry visits them in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineRegistry {
    lines: Vec<ProductionLine>,
}

impl LineRegistry {
    /// Build a registry, rejecting invalid or duplicate lines.
    pub fn new(lines: Vec<ProductionLine>) -> Result<Self> {
        if lines.is_empty() {
            return Err(SpcError::InvalidConfig(
                "at least one production line is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for line in &lines {
            line.validate()?;
            if !seen.insert(line.name.as_str()) {
                return Err(SpcError::DuplicateLine(line.name.clone()));
            }
        }

        Ok(Self { lines })
    }

    /// The eight packaging lines of the reference plant.
    pub fn default_catalog() -> Self {
        Self {
            lines: default_lines(),
        }
    }

    /// Look up a line by name.
    pub fn get(&self, name: &str) -> Option<&ProductionLine> {
        self.lines.iter().find(|l| l.name == name)
    }

    /// Iterate lines in registration order.
    pub fn iter(&self) -> std::slice::Iter<'_, ProductionLine> {
        self.lines.iter()
    }

    /// Line names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.name.as_str()).collect()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the registry holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Borrow the underlying lines.
    pub fn as_slice(&self) -> &[ProductionLine] {
        &self.lines
    }
}

impl Default for LineRegistry {
    fn default() -> Self {
        Self::default_catalog()
    }
}

impl<'a> IntoIterator for &'a LineRegistry {
    type Item = &'a ProductionLine;
    type IntoIter = std::slice::Iter<'a, ProductionLine>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

/// Default line definitions (exterior/interior lines of four packaging halls).
pub fn default_lines() -> Vec<ProductionLine> {
    vec![
        ProductionLine::new("First Exterior", 800_000, 11_000),
        ProductionLine::new("First Interior", 950_000, 10_000),
        ProductionLine::new("Second Exterior", 800_000, 11_000),
        ProductionLine::new("Second Interior", 1_045_000, 10_000),
        ProductionLine::new("Third Exterior", 825_000, 11_000),
        ProductionLine::new("Third Interior", 2_440_000, 10_000),
        ProductionLine::new("Fourth Exterior", 908_000, 10_000),
        ProductionLine::new("Fourth Interior", 798_000, 11_000),
    ]
}
