//! Rule-based out-of-control inspection.
//!
//! Four Nelson-style rules are evaluated against the tail of a line's rate
//! series, relative to its frozen limits:
//!
//! | Rule | Window | Fires when |
//! |------|--------|------------|
//! | 1 | last point | point above UCL or below LCL |
//! | 2 | last 7 | all strictly above CL, or all strictly below |
//! | 3 | last 6 | strictly increasing, or strictly decreasing |
//! | 4 | last 4 | all strictly inside (CL, UCL) and above the two-thirds point |
//!
//! Rules are independent; every rule that fires is reported.

use crate::limits::ControlLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Points needed for the systematic shift rule.
pub const SHIFT_WINDOW: usize = 7;
/// Points needed for the trend rule.
pub const TREND_WINDOW: usize = 6;
/// Points needed for the upper-zone clustering rule.
pub const ZONE_WINDOW: usize = 4;

/// Message reported when no rule fires.
pub const IN_CONTROL_MESSAGE: &str = "Process in control";

/// Rule identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RuleId {
    /// Rule 1: point beyond the control limits.
    OutOfLimits,
    /// Rule 2: run on one side of the center line.
    Shift,
    /// Rule 3: monotone run.
    Trend,
    /// Rule 4: clustering in the upper zone.
    UpperZoneCluster,
}

impl RuleId {
    /// All rules in evaluation order.
    pub const ALL: [RuleId; 4] = [
        RuleId::OutOfLimits,
        RuleId::Shift,
        RuleId::Trend,
        RuleId::UpperZoneCluster,
    ];

    /// Rule number (1-4).
    pub fn number(&self) -> u8 {
        match self {
            RuleId::OutOfLimits => 1,
            RuleId::Shift => 2,
            RuleId::Trend => 3,
            RuleId::UpperZoneCluster => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleId::OutOfLimits => "OUT_OF_LIMITS",
            RuleId::Shift => "SHIFT",
            RuleId::Trend => "TREND",
            RuleId::UpperZoneCluster => "UPPER_ZONE_CLUSTER",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RULE {}", self.number())
    }
}

/// Side of a reference line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Above,
    Below,
}

/// Direction of a monotone run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Increasing,
    Decreasing,
}

/// A triggered rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Violation {
    /// Latest point is outside `[LCL, UCL]`.
    OutOfLimits { value: f64, side: Side },
    /// Last seven points on one side of CL.
    Shift { side: Side },
    /// Last six points strictly monotone.
    Trend { direction: Direction },
    /// Last four points packed into the top third of the upper band.
    UpperZoneCluster,
}

impl Violation {
    /// Rule that produced this violation.
    pub fn rule(&self) -> RuleId {
        match self {
            Violation::OutOfLimits { .. } => RuleId::OutOfLimits,
            Violation::Shift { .. } => RuleId::Shift,
            Violation::Trend { .. } => RuleId::Trend,
            Violation::UpperZoneCluster => RuleId::UpperZoneCluster,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = self.rule();
        match self {
            Violation::OutOfLimits { side, .. } => {
                let limit = match side {
                    Side::Above => "above UCL",
                    Side::Below => "below LCL",
                };
                write!(f, "{}: Out-of-control point detected ({})", rule, limit)
            }
            Violation::Shift { side } => {
                let side = match side {
                    Side::Above => "above",
                    Side::Below => "below",
                };
                write!(
                    f,
                    "{}: Systematic shift detected ({} consecutive points {} CL)",
                    rule, SHIFT_WINDOW, side
                )
            }
            Violation::Trend { direction } => {
                let (label, adjective) = match direction {
                    Direction::Increasing => ("Increasing", "increasing"),
                    Direction::Decreasing => ("Decreasing", "decreasing"),
                };
                write!(
                    f,
                    "{}: {} trend detected ({} consecutive {} points)",
                    rule, label, TREND_WINDOW, adjective
                )
            }
            Violation::UpperZoneCluster => write!(
                f,
                "{}: Possible variance increase ({} points clustered near UCL)",
                rule, ZONE_WINDOW
            ),
        }
    }
}

/// Outcome of one inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum InspectionResult {
    /// No data yet; no claim either way.
    Empty,
    /// At least one point and no rule fired.
    InControl,
    /// One or more rules fired, in rule order.
    OutOfControl(Vec<Violation>),
}

impl InspectionResult {
    /// Whether any rule fired.
    pub fn is_alarm(&self) -> bool {
        matches!(self, InspectionResult::OutOfControl(_))
    }

    /// Triggered violations (empty unless out of control).
    pub fn violations(&self) -> &[Violation] {
        match self {
            InspectionResult::OutOfControl(v) => v,
            _ => &[],
        }
    }

    /// Whether the given rule fired.
    pub fn has_rule(&self, rule: RuleId) -> bool {
        self.violations().iter().any(|v| v.rule() == rule)
    }

    /// Human-readable lines for display.
    pub fn messages(&self) -> Vec<String> {
        match self {
            InspectionResult::Empty => Vec::new(),
            InspectionResult::InControl => vec![IN_CONTROL_MESSAGE.to_string()],
            InspectionResult::OutOfControl(v) => v.iter().map(|v| v.to_string()).collect(),
        }
    }
}

/// Rule toggles. All rules are enabled by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleSet {
    pub out_of_limits: bool,
    pub shift: bool,
    pub trend: bool,
    pub upper_zone_cluster: bool,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            out_of_limits: true,
            shift: true,
            trend: true,
            upper_zone_cluster: true,
        }
    }
}

impl RuleSet {
    /// Whether a rule is enabled.
    pub fn is_enabled(&self, rule: RuleId) -> bool {
        match rule {
            RuleId::OutOfLimits => self.out_of_limits,
            RuleId::Shift => self.shift,
            RuleId::Trend => self.trend,
            RuleId::UpperZoneCluster => self.upper_zone_cluster,
        }
    }

    /// Copy with one rule switched on or off.
    pub fn with(mut self, rule: RuleId, enabled: bool) -> Self {
        match rule {
            RuleId::OutOfLimits => self.out_of_limits = enabled,
            RuleId::Shift => self.shift = enabled,
            RuleId::Trend => self.trend = enabled,
            RuleId::UpperZoneCluster => self.upper_zone_cluster = enabled,
        }
        self
    }
}

/// Stateless rule evaluator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Inspector {
    rules: RuleSet,
}

impl Inspector {
    /// Inspector with the given rule toggles.
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Active rule toggles.
    pub fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Evaluate the rate series (oldest first) against frozen limits.
    pub fn inspect(&self, rates: &[f64], limits: &ControlLimits) -> InspectionResult {
        let Some(&last) = rates.last() else {
            return InspectionResult::Empty;
        };

        let mut violations = Vec::new();

        if self.rules.out_of_limits {
            if let Some(v) = check_out_of_limits(last, limits) {
                violations.push(v);
            }
        }
        if self.rules.shift {
            if let Some(v) = check_shift(rates, limits) {
                violations.push(v);
            }
        }
        if self.rules.trend {
            if let Some(v) = check_trend(rates) {
                violations.push(v);
            }
        }
        if self.rules.upper_zone_cluster {
            if let Some(v) = check_upper_zone(rates, limits) {
                violations.push(v);
            }
        }

        if violations.is_empty() {
            InspectionResult::InControl
        } else {
            InspectionResult::OutOfControl(violations)
        }
    }
}

fn check_out_of_limits(value: f64, limits: &ControlLimits) -> Option<Violation> {
    if value > limits.upper_limit {
        Some(Violation::OutOfLimits {
            value,
            side: Side::Above,
        })
    } else if value < limits.lower_limit {
        Some(Violation::OutOfLimits {
            value,
            side: Side::Below,
        })
    } else {
        None
    }
}

fn check_shift(rates: &[f64], limits: &ControlLimits) -> Option<Violation> {
    let window = tail(rates, SHIFT_WINDOW)?;
    let cl = limits.center_line;

    if window.iter().all(|&x| x > cl) {
        Some(Violation::Shift { side: Side::Above })
    } else if window.iter().all(|&x| x < cl) {
        Some(Violation::Shift { side: Side::Below })
    } else {
        None
    }
}

fn check_trend(rates: &[f64]) -> Option<Violation> {
    let window = tail(rates, TREND_WINDOW)?;

    if window.windows(2).all(|w| w[0] < w[1]) {
        Some(Violation::Trend {
            direction: Direction::Increasing,
        })
    } else if window.windows(2).all(|w| w[0] > w[1]) {
        Some(Violation::Trend {
            direction: Direction::Decreasing,
        })
    } else {
        None
    }
}

fn check_upper_zone(rates: &[f64], limits: &ControlLimits) -> Option<Violation> {
    let window = tail(rates, ZONE_WINDOW)?;
    let cl = limits.center_line;
    let ucl = limits.upper_limit;
    let two_thirds = limits.upper_two_thirds();

    // Both conditions are kept: they differ at the boundaries.
    let inside_upper_band = window.iter().all(|&x| x > cl && x < ucl);
    let above_two_thirds = window.iter().all(|&x| x > two_thirds);

    if inside_upper_band && above_two_thirds {
        Some(Violation::UpperZoneCluster)
    } else {
        None
    }
}

/// Last `n` points, or `None` when fewer are available.
fn tail(rates: &[f64], n: usize) -> Option<&[f64]> {
    if rates.len() < n {
        return None;
    }
    Some(&rates[rates.len() - n..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> ControlLimits {
        ControlLimits::new(0.010, 0.016, 0.004).unwrap()
    }

    fn inspect(rates: &[f64]) -> InspectionResult {
        Inspector::default().inspect(rates, &limits())
    }

    #[test]
    fn test_empty_history() {
        assert_eq!(inspect(&[]), InspectionResult::Empty);
        assert!(inspect(&[]).messages().is_empty());
    }

    #[test]
    fn test_single_point_in_control() {
        let result = inspect(&[0.011]);
        assert_eq!(result, InspectionResult::InControl);
        assert_eq!(result.messages(), vec![IN_CONTROL_MESSAGE.to_string()]);
    }

    #[test]
    fn test_rule1_above_ucl() {
        let result = inspect(&[0.016 + 0.001]);
        assert!(result.has_rule(RuleId::OutOfLimits));
        assert!(matches!(
            result.violations()[0],
            Violation::OutOfLimits { side: Side::Above, .. }
        ));
    }

    #[test]
    fn test_rule1_boundaries_do_not_fire() {
        assert_eq!(inspect(&[0.016]), InspectionResult::InControl);
        assert_eq!(inspect(&[0.004]), InspectionResult::InControl);
    }

    #[test]
    fn test_rule1_below_lcl() {
        let result = inspect(&[0.003]);
        assert_eq!(
            result.violations(),
            &[Violation::OutOfLimits {
                value: 0.003,
                side: Side::Below
            }]
        );
    }

    #[test]
    fn test_rule2_seven_above() {
        let rates = [0.011, 0.012, 0.011, 0.013, 0.011, 0.012, 0.011];
        let result = inspect(&rates);
        assert!(result.has_rule(RuleId::Shift));
        assert_eq!(
            result.violations(),
            &[Violation::Shift { side: Side::Above }]
        );
    }

    #[test]
    fn test_rule2_broken_by_last_point() {
        let rates = [0.011, 0.012, 0.011, 0.013, 0.011, 0.012, 0.009];
        assert!(!inspect(&rates).has_rule(RuleId::Shift));
    }

    #[test]
    fn test_rule2_point_on_center_line_breaks_run() {
        let rates = [0.009, 0.008, 0.009, 0.010, 0.009, 0.008, 0.009];
        assert!(!inspect(&rates).has_rule(RuleId::Shift));
    }

    #[test]
    fn test_rule2_needs_seven_points() {
        let rates = [0.009, 0.008, 0.009, 0.007, 0.009, 0.008];
        assert!(!inspect(&rates).has_rule(RuleId::Shift));
    }

    #[test]
    fn test_rule3_increasing() {
        let rates = [0.005, 0.006, 0.007, 0.008, 0.009, 0.0095];
        let result = inspect(&rates);
        assert!(result.violations().contains(&Violation::Trend {
            direction: Direction::Increasing
        }));
    }

    #[test]
    fn test_rule3_decreasing() {
        let rates = [0.015, 0.014, 0.013, 0.012, 0.011, 0.0105];
        let result = inspect(&rates);
        assert!(result.violations().contains(&Violation::Trend {
            direction: Direction::Decreasing
        }));
    }

    #[test]
    fn test_rule3_tie_breaks_trend() {
        let rates = [0.005, 0.006, 0.007, 0.007, 0.009, 0.0095];
        assert!(!inspect(&rates).has_rule(RuleId::Trend));
    }

    #[test]
    fn test_rule3_only_tail_counts() {
        // Older points are ignored once the last six are monotone.
        let rates = [0.015, 0.005, 0.006, 0.007, 0.008, 0.009, 0.0095];
        assert!(inspect(&rates).has_rule(RuleId::Trend));
    }

    #[test]
    fn test_rule4_upper_cluster() {
        // two-thirds point is 0.014
        let rates = [0.0145, 0.0150, 0.0155, 0.0148];
        let result = inspect(&rates);
        assert_eq!(result.violations(), &[Violation::UpperZoneCluster]);
    }

    #[test]
    fn test_rule4_last_point_on_center_line() {
        let rates = [0.0145, 0.0150, 0.0155, 0.010];
        assert!(!inspect(&rates).has_rule(RuleId::UpperZoneCluster));
    }

    #[test]
    fn test_rule4_point_at_ucl_excluded() {
        let rates = [0.0145, 0.0150, 0.0155, 0.016];
        let result = inspect(&rates);
        assert!(!result.has_rule(RuleId::UpperZoneCluster));
        assert_eq!(result, InspectionResult::InControl);
    }

    #[test]
    fn test_rule4_below_two_thirds() {
        let rates = [0.0145, 0.0150, 0.0130, 0.0148];
        assert!(!inspect(&rates).has_rule(RuleId::UpperZoneCluster));
    }

    #[test]
    fn test_multiple_rules_fire_in_order() {
        // 7 above CL, last 6 increasing, last point above UCL.
        let rates = [0.011, 0.0105, 0.011, 0.012, 0.013, 0.014, 0.017];
        let result = inspect(&rates);
        let rules: Vec<RuleId> = result.violations().iter().map(|v| v.rule()).collect();
        assert_eq!(
            rules,
            vec![RuleId::OutOfLimits, RuleId::Shift, RuleId::Trend]
        );
        assert_eq!(result.messages().len(), 3);
    }

    #[test]
    fn test_disabled_rules_never_fire() {
        let rates = [0.011, 0.0105, 0.011, 0.012, 0.013, 0.014, 0.017];
        let rules = RuleSet::default()
            .with(RuleId::OutOfLimits, false)
            .with(RuleId::Trend, false);
        let result = Inspector::new(rules).inspect(&rates, &limits());
        assert_eq!(result.violations(), &[Violation::Shift { side: Side::Above }]);
    }

    #[test]
    fn test_zero_limits_flag_any_defect() {
        let limits = ControlLimits::new(0.0, 0.0, 0.0).unwrap();
        let result = Inspector::default().inspect(&[0.0001], &limits);
        assert!(result.has_rule(RuleId::OutOfLimits));
        assert_eq!(
            Inspector::default().inspect(&[0.0], &limits),
            InspectionResult::InControl
        );
    }

    #[test]
    fn test_messages() {
        let v = Violation::Trend {
            direction: Direction::Decreasing,
        };
        assert_eq!(
            v.to_string(),
            "RULE 3: Decreasing trend detected (6 consecutive decreasing points)"
        );
        let v = Violation::Shift { side: Side::Below };
        assert!(v.to_string().starts_with("RULE 2"));
        assert!(v.to_string().contains("below CL"));
    }

    #[test]
    fn test_inspection_does_not_touch_history() {
        let rates = vec![0.011, 0.012, 0.013];
        let copy = rates.clone();
        let _ = inspect(&rates);
        assert_eq!(rates, copy);
    }
}
