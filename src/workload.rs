//! Per-doctor workload statistics for a finished roster.
//!
//! Statistics are computed from each doctor's assigned shifts in start order.
//! Streaks are counted over calendar dates (the date a shift starts on), so a
//! 22:00–09:00 shift counts once, for the day it starts.

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::burnout::{BurnoutInputs, BurnoutLevel, BurnoutModel, BurnoutScore};
use crate::config::RosterConfig;
use crate::domain::{hours_between, Assignment, Doctor, Roster, Shift};

/// Aggregate statistics and burnout score for one doctor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadStats {
    pub doctor_id: String,
    pub total_shifts: u32,
    pub total_hours: f64,
    pub night_shifts: u32,
    pub weekend_shifts: u32,
    /// Sum of the intensity of every assigned shift.
    pub intensity_sum: u32,
    /// Longest run of consecutive dates with at least one shift.
    pub consecutive_days: u32,
    /// Longest run of consecutive dates with a night shift.
    pub consecutive_nights: u32,
    /// Adjacent shift pairs with less rest than required.
    pub rest_violations: u32,
    pub contract_hours: f64,
    pub burnout: BurnoutScore,
    /// Human-readable alerts.
    pub flags: Vec<String>,
}

/// Assigned hours against contract hours for one doctor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoursSummary {
    pub doctor_id: String,
    pub name: String,
    pub contract_hours: f64,
    pub assigned_hours: f64,
    /// `assigned_hours - contract_hours`.
    pub difference: f64,
    pub shifts: u32,
    pub nights: u32,
    pub weekends: u32,
}

/// Computes workload statistics under one configuration.
#[derive(Debug, Clone)]
pub struct WorkloadAnalyzer {
    rest_hours_required: f64,
    burnout: BurnoutModel,
}

impl Default for WorkloadAnalyzer {
    fn default() -> Self {
        Self::new(&RosterConfig::default())
    }
}

/// Length of the longest run of consecutive dates.
fn longest_run(dates: &BTreeSet<NaiveDate>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;
    for &date in dates {
        current = match previous {
            Some(prev) if date - prev == Duration::days(1) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(date);
    }
    longest
}

impl WorkloadAnalyzer {
    pub fn new(config: &RosterConfig) -> Self {
        Self {
            rest_hours_required: config.rules.rest_hours_required,
            burnout: BurnoutModel::new(config.burnout.clone()),
        }
    }

    /// Statistics for every doctor in `doctors`, keyed by doctor id.
    ///
    /// Assignments referencing unknown doctors or shifts are ignored.
    pub fn analyze(
        &self,
        doctors: &[Doctor],
        shifts: &[Shift],
        assignments: &[Assignment],
    ) -> BTreeMap<String, WorkloadStats> {
        let shift_map: HashMap<&str, &Shift> = shifts.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut by_doctor: HashMap<&str, Vec<&Shift>> =
            doctors.iter().map(|d| (d.id.as_str(), Vec::new())).collect();
        for a in assignments {
            if let (Some(list), Some(shift)) = (
                by_doctor.get_mut(a.doctor_id.as_str()),
                shift_map.get(a.shift_id.as_str()),
            ) {
                list.push(shift);
            }
        }

        let fleet_average_hours = if doctors.is_empty() {
            0.0
        } else {
            let total: f64 = by_doctor
                .values()
                .flat_map(|list| list.iter().map(|s| s.duration_hours))
                .sum();
            total / doctors.len() as f64
        };

        doctors
            .iter()
            .map(|doctor| {
                let mut assigned = by_doctor.remove(doctor.id.as_str()).unwrap_or_default();
                assigned.sort_by_key(|s| s.start);
                let stats = self.doctor_stats(doctor, &assigned, fleet_average_hours);
                (doctor.id.clone(), stats)
            })
            .collect()
    }

    pub fn analyze_roster(&self, roster: &Roster) -> BTreeMap<String, WorkloadStats> {
        self.analyze(&roster.doctors, &roster.shifts, &roster.assignments)
    }

    fn doctor_stats(&self, doctor: &Doctor, assigned: &[&Shift], fleet_average_hours: f64) -> WorkloadStats {
        let total_hours: f64 = assigned.iter().map(|s| s.duration_hours).sum();
        let night_shifts = assigned.iter().filter(|s| s.is_night).count() as u32;
        let weekend_shifts = assigned.iter().filter(|s| s.is_weekend).count() as u32;
        let intensity_sum = assigned.iter().map(|s| u32::from(s.intensity)).sum();

        let work_dates: BTreeSet<NaiveDate> = assigned.iter().map(|s| s.date()).collect();
        let night_dates: BTreeSet<NaiveDate> =
            assigned.iter().filter(|s| s.is_night).map(|s| s.date()).collect();

        let rest_violations = assigned
            .windows(2)
            .filter(|pair| hours_between(pair[0].end, pair[1].start) < self.rest_hours_required)
            .count() as u32;

        let consecutive_days = longest_run(&work_dates);
        let consecutive_nights = longest_run(&night_dates);
        let burnout = self.burnout.score(&BurnoutInputs {
            total_hours,
            contract_hours: doctor.contract_hours_per_month,
            night_shifts,
            weekend_shifts,
            consecutive_days,
            consecutive_nights,
            rest_violations,
            fleet_average_hours,
        });

        let mut stats = WorkloadStats {
            doctor_id: doctor.id.clone(),
            total_shifts: assigned.len() as u32,
            total_hours,
            night_shifts,
            weekend_shifts,
            intensity_sum,
            consecutive_days,
            consecutive_nights,
            rest_violations,
            contract_hours: doctor.contract_hours_per_month,
            burnout,
            flags: Vec::new(),
        };
        stats.flags = alert_flags(&stats);
        stats
    }
}

fn alert_flags(stats: &WorkloadStats) -> Vec<String> {
    let mut flags = Vec::new();
    if stats.burnout.level == BurnoutLevel::High {
        flags.push(format!("High burnout risk ({:.0})", stats.burnout.score));
    }
    if stats.consecutive_nights >= 2 {
        flags.push(format!("{} consecutive nights", stats.consecutive_nights));
    }
    if stats.consecutive_days >= 5 {
        flags.push(format!("{} consecutive days", stats.consecutive_days));
    }
    if stats.rest_violations > 0 {
        flags.push(format!("{} rest violation(s)", stats.rest_violations));
    }
    let over = stats.total_hours - stats.contract_hours;
    if over > 0.0 {
        flags.push(format!("{:.1}h over contract", over));
    }
    flags
}

/// Workload statistics with the default configuration.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ed_rostering::domain::{Assignment, Doctor, Shift};
/// use ed_rostering::workload::analyze_workload;
///
/// let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
/// let shift = Shift::new(
///     "S1",
///     "Day",
///     day.and_hms_opt(7, 0, 0).unwrap(),
///     day.and_hms_opt(18, 0, 0).unwrap(),
///     1,
///     1,
/// )
/// .unwrap();
/// let doctors = vec![Doctor::new("D01", "Amy")];
/// let stats = analyze_workload(&doctors, &[shift], &[Assignment::new("D01", "S1")]);
///
/// assert_eq!(stats["D01"].total_shifts, 1);
/// assert_eq!(stats["D01"].total_hours, 11.0);
/// ```
pub fn analyze_workload(
    doctors: &[Doctor],
    shifts: &[Shift],
    assignments: &[Assignment],
) -> BTreeMap<String, WorkloadStats> {
    WorkloadAnalyzer::default().analyze(doctors, shifts, assignments)
}

/// Assigned hours against contract hours, in doctor order.
pub fn hours_summary(
    doctors: &[Doctor],
    stats: &BTreeMap<String, WorkloadStats>,
) -> Vec<HoursSummary> {
    doctors
        .iter()
        .filter_map(|doctor| {
            let s = stats.get(&doctor.id)?;
            Some(HoursSummary {
                doctor_id: doctor.id.clone(),
                name: doctor.name.clone(),
                contract_hours: doctor.contract_hours_per_month,
                assigned_hours: s.total_hours,
                difference: s.total_hours - doctor.contract_hours_per_month,
                shifts: s.total_shifts,
                nights: s.night_shifts,
                weekends: s.weekend_shifts,
            })
        })
        .collect()
}
