//! Pre-solve sanity checks: aggregate supply against demand and per-shift
//! coverage after leave.
//!
//! The report is advisory. A `feasible` verdict does not guarantee that the
//! optimizer finds a roster; an infeasible one explains why it will not.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{Doctor, LeaveCalendar, LeaveInterval, Shift};

/// A shift that cannot reach its minimum staffing because of leave.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftCoverageGap {
    pub shift_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub min_doctors: u32,
    pub available: u32,
}

impl ShiftCoverageGap {
    pub fn shortfall(&self) -> u32 {
        self.min_doctors.saturating_sub(self.available)
    }
}

/// Aggregate demand, capacity and warnings for one problem instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibilityReport {
    pub feasible: bool,
    pub num_doctors: usize,
    pub total_min_demand: u32,
    pub total_max_demand: u32,
    pub total_min_capacity: u32,
    pub total_max_capacity: u32,
    pub night_shift_demand: u32,
    pub weekend_shift_demand: u32,
    pub warnings: Vec<String>,
    pub coverage_gaps: Vec<ShiftCoverageGap>,
}

/// Checks supply against demand before solving.
///
/// Only active doctors count towards capacity.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ed_rostering::domain::{Doctor, Shift};
/// use ed_rostering::feasibility::analyze_feasibility;
///
/// let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
/// let shift = Shift::new(
///     "S1",
///     "Night",
///     day.and_hms_opt(22, 0, 0).unwrap(),
///     day.and_hms_opt(23, 59, 0).unwrap(),
///     3,
///     3,
/// )
/// .unwrap();
/// let doctors = vec![Doctor::new("D01", "Amy").with_shift_bounds(0, 1)];
///
/// let report = analyze_feasibility(&doctors, &[shift], &[]);
/// assert!(!report.feasible);
/// assert_eq!(report.night_shift_demand, 3);
/// assert_eq!(report.coverage_gaps[0].shortfall(), 2);
/// ```
pub fn analyze_feasibility(
    doctors: &[Doctor],
    shifts: &[Shift],
    leave: &[LeaveInterval],
) -> FeasibilityReport {
    let doctors: Vec<&Doctor> = doctors.iter().filter(|d| d.active).collect();
    let mut report = FeasibilityReport {
        num_doctors: doctors.len(),
        ..FeasibilityReport::default()
    };

    if doctors.is_empty() || shifts.is_empty() {
        report.feasible = false;
        report.warnings.push("No doctors or no shifts defined.".to_string());
        return report;
    }

    report.total_min_demand = shifts.iter().map(|s| s.min_doctors).sum();
    report.total_max_demand = shifts.iter().map(|s| s.max_doctors).sum();
    report.total_min_capacity = doctors.iter().map(|d| d.min_shifts_per_month).sum();
    report.total_max_capacity = doctors.iter().map(|d| d.max_shifts_per_month).sum();
    report.night_shift_demand = shifts.iter().filter(|s| s.is_night).map(|s| s.min_doctors).sum();
    report.weekend_shift_demand = shifts
        .iter()
        .filter(|s| s.is_weekend)
        .map(|s| s.min_doctors)
        .sum();

    if report.total_min_demand > report.total_max_capacity {
        report.warnings.push(format!(
            "Total minimum staffing requirement ({}) exceeds doctors' maximum capacity ({}).",
            report.total_min_demand, report.total_max_capacity
        ));
    }
    if report.total_max_demand < report.total_min_capacity {
        report.warnings.push(format!(
            "Doctors' minimum shifts ({}) exceed the demand's upper bound ({}). \
             Some doctors cannot reach their min_shifts.",
            report.total_min_capacity, report.total_max_demand
        ));
    }

    let calendar = LeaveCalendar::new(leave);
    for shift in shifts {
        let available = doctors
            .iter()
            .filter(|d| !calendar.is_on_leave(&d.id, shift.date()))
            .count() as u32;
        if available < shift.min_doctors {
            report.coverage_gaps.push(ShiftCoverageGap {
                shift_id: shift.id.clone(),
                start: shift.start,
                end: shift.end,
                min_doctors: shift.min_doctors,
                available,
            });
        }
    }

    if !report.coverage_gaps.is_empty() {
        report
            .warnings
            .push("Leave-related coverage issues detected:".to_string());
        for gap in &report.coverage_gaps {
            report.warnings.push(format!(
                "{} {}-{}: needs {} doctors, only {} available (due to leave).",
                gap.start.date(),
                gap.start.format("%H:%M"),
                gap.end.format("%H:%M"),
                gap.min_doctors,
                gap.available
            ));
        }
    }

    report.feasible =
        report.total_min_demand <= report.total_max_capacity && report.coverage_gaps.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LeaveType;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn day_shift(id: &str, d: u32, min: u32, max: u32) -> Shift {
        Shift::new(
            id,
            "Day",
            date(d).and_hms_opt(7, 0, 0).unwrap(),
            date(d).and_hms_opt(18, 0, 0).unwrap(),
            min,
            max,
        )
        .unwrap()
    }

    #[test]
    fn test_empty_inputs_are_not_feasible() {
        let report = analyze_feasibility(&[], &[day_shift("S1", 2, 1, 1)], &[]);
        assert!(!report.feasible);
        assert_eq!(report.warnings, vec!["No doctors or no shifts defined.".to_string()]);
    }

    #[test]
    fn test_aggregate_totals() {
        let doctors = vec![
            Doctor::new("D01", "Amy").with_shift_bounds(1, 2),
            Doctor::new("D02", "Beth").with_shift_bounds(1, 3),
        ];
        // 2026-02-07 is a Saturday
        let shifts = vec![day_shift("S1", 6, 1, 2), day_shift("S2", 7, 2, 2)];

        let report = analyze_feasibility(&doctors, &shifts, &[]);

        assert!(report.feasible);
        assert_eq!(report.num_doctors, 2);
        assert_eq!(report.total_min_demand, 3);
        assert_eq!(report.total_max_demand, 4);
        assert_eq!(report.total_min_capacity, 2);
        assert_eq!(report.total_max_capacity, 5);
        assert_eq!(report.weekend_shift_demand, 2);
        assert_eq!(report.night_shift_demand, 0);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_demand_above_capacity() {
        let doctors = vec![Doctor::new("D01", "Amy").with_shift_bounds(0, 1)];
        let shifts = vec![day_shift("S1", 2, 1, 1), day_shift("S2", 3, 1, 1)];

        let report = analyze_feasibility(&doctors, &shifts, &[]);

        assert!(!report.feasible);
        assert_eq!(
            report.warnings[0],
            "Total minimum staffing requirement (2) exceeds doctors' maximum capacity (1)."
        );
    }

    #[test]
    fn test_leave_shortfall() {
        let doctors = vec![
            Doctor::new("D01", "Amy").with_shift_bounds(0, 5),
            Doctor::new("D02", "Beth").with_shift_bounds(0, 5),
        ];
        let shifts = vec![day_shift("S1", 2, 2, 2), day_shift("S2", 3, 2, 2)];
        let leave = vec![LeaveInterval::new("D02", date(3), date(3), LeaveType::Sick).unwrap()];

        let report = analyze_feasibility(&doctors, &shifts, &leave);

        assert!(!report.feasible);
        assert_eq!(report.coverage_gaps.len(), 1);
        assert_eq!(report.coverage_gaps[0].shift_id, "S2");
        assert_eq!(report.coverage_gaps[0].available, 1);
        assert_eq!(
            report.warnings,
            vec![
                "Leave-related coverage issues detected:".to_string(),
                "2026-02-03 07:00-18:00: needs 2 doctors, only 1 available (due to leave).".to_string(),
            ]
        );
    }

    #[test]
    fn test_inactive_doctors_add_no_capacity() {
        let mut gone = Doctor::new("D02", "Beth").with_shift_bounds(0, 10);
        gone.active = false;
        let doctors = vec![Doctor::new("D01", "Amy").with_shift_bounds(0, 1), gone];

        let report = analyze_feasibility(&doctors, &[day_shift("S1", 2, 1, 1)], &[]);

        assert_eq!(report.num_doctors, 1);
        assert_eq!(report.total_max_capacity, 1);
    }
}
