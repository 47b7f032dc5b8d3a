//! Re-checks a finished roster against every hard rule.
//!
//! An optimized roster audits clean by construction. The audit exists to
//! explain what a naive or hand-edited roster breaks.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

use crate::config::{BundleMode, RuleConfig};
use crate::conflicts::{conflict_pairs, ShiftCalendar};
use crate::domain::{LeaveCalendar, LeaveInterval, Roster, Shift};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RuleKind {
    UnknownReference,
    Coverage,
    MonthlyLoad,
    Conflict,
    Leave,
    WeekendBundle,
    WeekendLoad,
    WeekdayNights,
    ConsecutiveNights,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule: RuleKind,
    pub doctor_id: Option<String>,
    pub shift_id: Option<String>,
    pub message: String,
}

impl RuleViolation {
    fn new(rule: RuleKind, message: String) -> Self {
        Self {
            rule,
            doctor_id: None,
            shift_id: None,
            message,
        }
    }

    fn doctor(mut self, id: &str) -> Self {
        self.doctor_id = Some(id.to_string());
        self
    }

    fn shift(mut self, id: &str) -> Self {
        self.shift_id = Some(id.to_string());
        self
    }
}

/// Lists every hard-rule violation in `roster`.
pub fn audit_roster(
    roster: &Roster,
    leave: &[LeaveInterval],
    rules: &RuleConfig,
) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    let shift_index: HashMap<&str, usize> = roster
        .shifts
        .iter()
        .enumerate()
        .map(|(i, s)| (s.id.as_str(), i))
        .collect();

    // Per doctor, the indices of assigned shifts
    let mut assigned: HashMap<&str, BTreeSet<usize>> = roster
        .doctors
        .iter()
        .map(|d| (d.id.as_str(), BTreeSet::new()))
        .collect();
    for a in &roster.assignments {
        match (assigned.get_mut(a.doctor_id.as_str()), shift_index.get(a.shift_id.as_str())) {
            (Some(set), Some(&s)) => {
                set.insert(s);
            }
            _ => violations.push(
                RuleViolation::new(
                    RuleKind::UnknownReference,
                    format!("assignment {} -> {} references an unknown record", a.doctor_id, a.shift_id),
                )
                .doctor(&a.doctor_id)
                .shift(&a.shift_id),
            ),
        }
    }

    for shift in &roster.shifts {
        let covered = roster.coverage(&shift.id) as u32;
        if covered < shift.min_doctors || covered > shift.max_doctors {
            violations.push(
                RuleViolation::new(
                    RuleKind::Coverage,
                    format!(
                        "shift {} has {} doctors, needs {}..{}",
                        shift.id, covered, shift.min_doctors, shift.max_doctors
                    ),
                )
                .shift(&shift.id),
            );
        }
    }

    let pairs = conflict_pairs(&roster.shifts, rules.rest_hours_required);
    let calendar = ShiftCalendar::build(&roster.shifts);
    let weekend_groups = calendar.weekend_groups(&roster.shifts, rules.weekend_counting);
    let windows = calendar.night_windows(rules.max_consecutive_nights + 1);
    let leave_calendar = LeaveCalendar::new(leave);

    for doctor in &roster.doctors {
        let Some(mine) = assigned.get(doctor.id.as_str()) else {
            continue;
        };
        let id = doctor.id.as_str();
        let worked = |indices: &[usize]| indices.iter().filter(|&&i| mine.contains(&i)).count();

        let total = mine.len() as u32;
        if total < doctor.min_shifts_per_month || total > doctor.max_shifts_per_month {
            violations.push(
                RuleViolation::new(
                    RuleKind::MonthlyLoad,
                    format!(
                        "doctor {} has {} shifts, bounds {}..{}",
                        id, total, doctor.min_shifts_per_month, doctor.max_shifts_per_month
                    ),
                )
                .doctor(id),
            );
        }

        for &(i, j) in &pairs {
            if mine.contains(&i) && mine.contains(&j) {
                violations.push(
                    RuleViolation::new(
                        RuleKind::Conflict,
                        conflict_message(&roster.shifts[i], &roster.shifts[j], rules.rest_hours_required),
                    )
                    .doctor(id)
                    .shift(&roster.shifts[j].id),
                );
            }
        }

        for &s in mine {
            let shift = &roster.shifts[s];
            if leave_calendar.is_on_leave(id, shift.date()) {
                violations.push(
                    RuleViolation::new(
                        RuleKind::Leave,
                        format!("doctor {} is on leave on {}", id, shift.date()),
                    )
                    .doctor(id)
                    .shift(&shift.id),
                );
            }
        }

        for bundle in &calendar.bundles {
            let (fri, sat, sun) = (worked(&bundle.friday), worked(&bundle.saturday), worked(&bundle.sunday));
            let broken = match rules.bundle_mode {
                BundleMode::Implication => fri > 0 && (sat == 0 || sun == 0),
                BundleMode::Equality => !(fri == sat && sat == sun),
            };
            if broken {
                violations.push(
                    RuleViolation::new(
                        RuleKind::WeekendBundle,
                        format!(
                            "doctor {} works {}/{}/{} Fri/Sat/Sun nights in {}",
                            id, fri, sat, sun, bundle.week
                        ),
                    )
                    .doctor(id),
                );
            }
        }

        let available_weekends = weekend_groups
            .values()
            .filter(|indices| {
                indices
                    .iter()
                    .any(|&i| !leave_calendar.is_on_leave(id, roster.shifts[i].date()))
            })
            .count() as u32;
        let weekends_worked = weekend_groups
            .values()
            .filter(|indices| worked(indices) > 0)
            .count() as u32;
        let min_weekends = rules
            .min_weekends_per_month
            .min(available_weekends)
            .min(doctor.max_shifts_per_month);
        if weekends_worked < min_weekends || weekends_worked > rules.max_weekends_per_month {
            violations.push(
                RuleViolation::new(
                    RuleKind::WeekendLoad,
                    format!(
                        "doctor {} works {} weekends, bounds {}..{}",
                        id, weekends_worked, min_weekends, rules.max_weekends_per_month
                    ),
                )
                .doctor(id),
            );
        }

        for (week, indices) in &calendar.weekday_nights_by_week {
            let nights = worked(indices) as u32;
            if nights > rules.max_weekday_nights_per_week {
                violations.push(
                    RuleViolation::new(
                        RuleKind::WeekdayNights,
                        format!("doctor {} works {} Mon–Thu nights in {}", id, nights, week),
                    )
                    .doctor(id),
                );
            }
        }

        for window in &windows {
            let nights = worked(window) as u32;
            if nights > rules.max_consecutive_nights {
                let first = &roster.shifts[window[0]];
                violations.push(
                    RuleViolation::new(
                        RuleKind::ConsecutiveNights,
                        format!(
                            "doctor {} works {} nights within {} days from {}",
                            id,
                            nights,
                            rules.max_consecutive_nights + 1,
                            first.date()
                        ),
                    )
                    .doctor(id),
                );
            }
        }
    }

    violations
}

fn conflict_message(a: &Shift, b: &Shift, rest: f64) -> String {
    match a.rest_gap_hours(b) {
        None => format!("shifts {} and {} overlap", a.id, b.id),
        Some(gap) => format!(
            "only {:.1}h rest between {} and {} (needs {:.1}h)",
            gap, a.id, b.id, rest
        ),
    }
}
