//! Bounded 0–100 burnout score.
//!
//! Seven factors, each clamped to [0, 100] before weighting:
//!
//! | factor              | weight | saturates at                          |
//! |---------------------|--------|---------------------------------------|
//! | hours vs contract   | 25%    | `overtime_ratio_cap` × contract hours |
//! | night shifts        | 20%    | `night_shift_cap`                     |
//! | weekend shifts      | 15%    | `weekend_shift_cap`                   |
//! | consecutive days    | 15%    | 6 days (step: 3→25, 4→50, 5→75)       |
//! | consecutive nights  | 10%    | 3 nights (step: 1→25, 2→60)           |
//! | rest violations     | 10%    | `rest_violation_cap`                  |
//! | hours vs fleet mean | 5%     | `fairness_ratio_cap` × mean hours     |
//!
//! Weights sum to 1, so the score is bounded by construction. Every factor is
//! non-decreasing in its input.

use serde::Serialize;

use crate::config::BurnoutConfig;

const HOURS_WEIGHT: f64 = 0.25;
const NIGHTS_WEIGHT: f64 = 0.20;
const WEEKENDS_WEIGHT: f64 = 0.15;
const CONSECUTIVE_DAYS_WEIGHT: f64 = 0.15;
const CONSECUTIVE_NIGHTS_WEIGHT: f64 = 0.10;
const REST_WEIGHT: f64 = 0.10;
const FAIRNESS_WEIGHT: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BurnoutLevel {
    Low,
    Medium,
    High,
}

impl BurnoutLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            BurnoutLevel::Low => "low",
            BurnoutLevel::Medium => "medium",
            BurnoutLevel::High => "high",
        }
    }
}

/// Workload figures the score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BurnoutInputs {
    pub total_hours: f64,
    pub contract_hours: f64,
    pub night_shifts: u32,
    pub weekend_shifts: u32,
    pub consecutive_days: u32,
    pub consecutive_nights: u32,
    pub rest_violations: u32,
    pub fleet_average_hours: f64,
}

/// Per-factor values on the 0–100 scale, before weighting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnoutFactors {
    pub hours: f64,
    pub nights: f64,
    pub weekends: f64,
    pub consecutive_days: f64,
    pub consecutive_nights: f64,
    pub rest: f64,
    pub fairness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnoutScore {
    pub score: f64,
    pub level: BurnoutLevel,
    pub factors: BurnoutFactors,
}

/// Scores workloads under one set of caps and thresholds.
#[derive(Debug, Clone, Default)]
pub struct BurnoutModel {
    config: BurnoutConfig,
}

fn percent(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 {
        return if value > 0.0 { 100.0 } else { 0.0 };
    }
    (value / cap * 100.0).clamp(0.0, 100.0)
}

fn consecutive_days_step(days: u32) -> f64 {
    match days {
        0..=2 => 0.0,
        3 => 25.0,
        4 => 50.0,
        5 => 75.0,
        _ => 100.0,
    }
}

fn consecutive_nights_step(nights: u32) -> f64 {
    match nights {
        0 => 0.0,
        1 => 25.0,
        2 => 60.0,
        _ => 100.0,
    }
}

impl BurnoutModel {
    pub fn new(config: BurnoutConfig) -> Self {
        Self { config }
    }

    /// Computes the score and its level.
    ///
    /// # Examples
    ///
    /// ```
    /// use ed_rostering::burnout::{BurnoutInputs, BurnoutLevel, BurnoutModel};
    ///
    /// let model = BurnoutModel::default();
    /// let rested = model.score(&BurnoutInputs {
    ///     total_hours: 88.0,
    ///     contract_hours: 175.0,
    ///     fleet_average_hours: 88.0,
    ///     ..Default::default()
    /// });
    /// assert_eq!(rested.level, BurnoutLevel::Low);
    ///
    /// let stretched = model.score(&BurnoutInputs {
    ///     total_hours: 220.0,
    ///     contract_hours: 175.0,
    ///     night_shifts: 9,
    ///     weekend_shifts: 8,
    ///     consecutive_days: 7,
    ///     consecutive_nights: 4,
    ///     rest_violations: 2,
    ///     fleet_average_hours: 150.0,
    /// });
    /// assert_eq!(stretched.level, BurnoutLevel::High);
    /// assert!(stretched.score <= 100.0);
    /// ```
    pub fn score(&self, inputs: &BurnoutInputs) -> BurnoutScore {
        let c = &self.config;

        let hours = if inputs.contract_hours > 0.0 {
            percent(inputs.total_hours / inputs.contract_hours, c.overtime_ratio_cap)
        } else {
            percent(inputs.total_hours, 0.0)
        };
        let fairness = if inputs.fleet_average_hours > 0.0 {
            let excess = inputs.total_hours / inputs.fleet_average_hours - 1.0;
            percent(excess, c.fairness_ratio_cap - 1.0)
        } else {
            0.0
        };

        let factors = BurnoutFactors {
            hours,
            nights: percent(f64::from(inputs.night_shifts), f64::from(c.night_shift_cap)),
            weekends: percent(f64::from(inputs.weekend_shifts), f64::from(c.weekend_shift_cap)),
            consecutive_days: consecutive_days_step(inputs.consecutive_days),
            consecutive_nights: consecutive_nights_step(inputs.consecutive_nights),
            rest: percent(f64::from(inputs.rest_violations), f64::from(c.rest_violation_cap)),
            fairness,
        };

        let score = (HOURS_WEIGHT * factors.hours
            + NIGHTS_WEIGHT * factors.nights
            + WEEKENDS_WEIGHT * factors.weekends
            + CONSECUTIVE_DAYS_WEIGHT * factors.consecutive_days
            + CONSECUTIVE_NIGHTS_WEIGHT * factors.consecutive_nights
            + REST_WEIGHT * factors.rest
            + FAIRNESS_WEIGHT * factors.fairness)
            .clamp(0.0, 100.0);

        BurnoutScore {
            score,
            level: self.level_for(score),
            factors,
        }
    }

    pub fn level_for(&self, score: f64) -> BurnoutLevel {
        if score < self.config.medium_threshold {
            BurnoutLevel::Low
        } else if score < self.config.high_threshold {
            BurnoutLevel::Medium
        } else {
            BurnoutLevel::High
        }
    }
}
