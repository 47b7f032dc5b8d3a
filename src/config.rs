//! Roster rules, objective weights, solver limits and server settings.
//!
//! Every numeric threshold of the constraint model lives here so that the
//! optimizer, the audit and the workload analyzer all read the same values.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::domain::NightRule;
use crate::error::{Result, RosterError};

/// Default solving time: 30 seconds.
const DEFAULT_TIME_LIMIT_SECS: u64 = 30;

/// Relative MIP gap at which the solver stops and reports its incumbent.
const DEFAULT_MIP_REL_GAP: f64 = 1e-4;

/// Which Saturday/Sunday shifts make a weekend count as worked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeekendCounting {
    /// Any shift starting on Saturday or Sunday.
    #[default]
    AnyShift,
    /// Only night shifts starting on Saturday or Sunday.
    NightOnly,
}

/// Strength of the Friday/Saturday/Sunday night bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BundleMode {
    /// Working Friday night forces Saturday and Sunday nights.
    #[default]
    Implication,
    /// Friday, Saturday and Sunday nights are worked together or not at all.
    Equality,
}

/// Hard-rule thresholds of the roster model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleConfig {
    pub rest_hours_required: f64,
    pub night_rule: NightRule,
    pub weekend_counting: WeekendCounting,
    pub bundle_mode: BundleMode,
    pub min_weekends_per_month: u32,
    pub max_weekends_per_month: u32,
    pub max_weekday_nights_per_week: u32,
    pub max_consecutive_nights: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rest_hours_required: 11.0,
            night_rule: NightRule::default(),
            weekend_counting: WeekendCounting::AnyShift,
            bundle_mode: BundleMode::Implication,
            min_weekends_per_month: 1,
            max_weekends_per_month: 3,
            max_weekday_nights_per_week: 2,
            max_consecutive_nights: 3,
        }
    }
}

/// Fairness formulation minimized by the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectiveStrategy {
    /// Penalize per-doctor deviation from contract hours and fleet-average
    /// night and weekend targets.
    DeviationFromTarget,
    /// Penalize the max-min spread of shift and night counts.
    #[default]
    SpreadMinimization,
}

impl std::str::FromStr for ObjectiveStrategy {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "deviation" | "deviationfromtarget" => Ok(ObjectiveStrategy::DeviationFromTarget),
            "spread" | "spreadminimization" => Ok(ObjectiveStrategy::SpreadMinimization),
            other => Err(RosterError::invalid(format!(
                "unknown objective strategy '{}'",
                other
            ))),
        }
    }
}

/// Objective strategy and its weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectiveConfig {
    pub strategy: ObjectiveStrategy,
    /// Weight on |assigned hours - contract hours|.
    pub hours_weight: f64,
    /// Weight on |night shifts - fleet night target|.
    pub night_weight: f64,
    /// Weight on |weekend shifts - fleet weekend target|.
    pub weekend_weight: f64,
    /// Weight on max-min total shift count.
    pub shift_spread_weight: f64,
    /// Weight on max-min night shift count.
    pub night_spread_weight: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        Self {
            strategy: ObjectiveStrategy::default(),
            hours_weight: 1.0,
            night_weight: 5.0,
            weekend_weight: 3.0,
            shift_spread_weight: 10.0,
            night_spread_weight: 5.0,
        }
    }
}

/// Solver termination.
///
/// Both limits are handed to the MILP back end. When the time limit is hit
/// the best feasible roster found so far is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    pub time_limit_secs: u64,
    pub mip_rel_gap: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_secs: DEFAULT_TIME_LIMIT_SECS,
            mip_rel_gap: DEFAULT_MIP_REL_GAP,
        }
    }
}

impl SolverConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }
}

/// Normalization caps and label thresholds for the burnout score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BurnoutConfig {
    /// Night shifts per month that saturate the night factor.
    pub night_shift_cap: u32,
    /// Weekend shifts per month that saturate the weekend factor.
    pub weekend_shift_cap: u32,
    /// Hours/contract ratio that saturates the hours factor.
    pub overtime_ratio_cap: f64,
    /// Hours/fleet-average ratio that saturates the fairness factor.
    pub fairness_ratio_cap: f64,
    /// Rest violations that saturate the rest factor.
    pub rest_violation_cap: u32,
    pub medium_threshold: f64,
    pub high_threshold: f64,
}

impl Default for BurnoutConfig {
    fn default() -> Self {
        Self {
            night_shift_cap: 8,
            weekend_shift_cap: 8,
            overtime_ratio_cap: 1.2,
            fairness_ratio_cap: 1.5,
            rest_violation_cap: 4,
            medium_threshold: 40.0,
            high_threshold: 70.0,
        }
    }
}

/// Complete configuration of one roster run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RosterConfig {
    pub rules: RuleConfig,
    pub objective: ObjectiveConfig,
    pub solver: SolverConfig,
    pub burnout: BurnoutConfig,
}

impl RosterConfig {
    /// Loads configuration from the environment.
    ///
    /// Reads `.env` if present, then the JSON file named by `ROSTER_CONFIG`,
    /// then the `ROSTER_REST_HOURS`, `ROSTER_TIME_LIMIT_SECS` and
    /// `ROSTER_OBJECTIVE` overrides.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = match env::var("ROSTER_CONFIG") {
            Ok(path) => Self::from_json_file(path)?,
            Err(_) => Self::default(),
        };

        if let Ok(rest) = env::var("ROSTER_REST_HOURS") {
            config.rules.rest_hours_required = rest.parse().map_err(|_| {
                RosterError::invalid(format!("ROSTER_REST_HOURS '{}' is not a number", rest))
            })?;
        }
        if let Ok(secs) = env::var("ROSTER_TIME_LIMIT_SECS") {
            config.solver.time_limit_secs = secs.parse().map_err(|_| {
                RosterError::invalid(format!("ROSTER_TIME_LIMIT_SECS '{}' is not an integer", secs))
            })?;
        }
        if let Ok(strategy) = env::var("ROSTER_OBJECTIVE") {
            config.objective.strategy = strategy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RosterError::invalid(format!("cannot read config {}: {}", path.display(), e))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| RosterError::invalid(format!("malformed roster config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Same configuration with a different rest requirement.
    pub fn with_rest_hours(mut self, rest_hours_required: f64) -> Self {
        self.rules.rest_hours_required = rest_hours_required;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let rules = &self.rules;
        if !rules.rest_hours_required.is_finite() || rules.rest_hours_required < 0.0 {
            return Err(RosterError::invalid(format!(
                "rest_hours_required must be a non-negative number, got {}",
                rules.rest_hours_required
            )));
        }
        if rules.night_rule.start_hour > 23 {
            return Err(RosterError::invalid(format!(
                "night start hour {} is not a valid hour",
                rules.night_rule.start_hour
            )));
        }
        if rules.min_weekends_per_month > rules.max_weekends_per_month {
            return Err(RosterError::invalid(format!(
                "min_weekends_per_month {} > max_weekends_per_month {}",
                rules.min_weekends_per_month, rules.max_weekends_per_month
            )));
        }
        if self.solver.time_limit_secs == 0 {
            return Err(RosterError::invalid("solver time limit must be positive"));
        }
        if !self.solver.mip_rel_gap.is_finite() || self.solver.mip_rel_gap < 0.0 {
            return Err(RosterError::invalid(format!(
                "mip_rel_gap must be a non-negative number, got {}",
                self.solver.mip_rel_gap
            )));
        }
        if self.burnout.medium_threshold > self.burnout.high_threshold {
            return Err(RosterError::invalid(
                "burnout medium threshold exceeds high threshold",
            ));
        }
        Ok(())
    }
}

/// HTTP server bind settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(7860),
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
