//! Roster optimizer: builds the 0/1 assignment model and solves it with HiGHS
//! under the configured time limit.
//!
//! Hard rules:
//! - coverage per shift within `[min_doctors, max_doctors]`
//! - monthly load per doctor within `[min_shifts_per_month, max_shifts_per_month]`
//! - no overlapping or rest-violating pair for one doctor
//! - no shift on a leave date
//! - Friday/Saturday/Sunday night bundling
//! - weekends worked between the configured bounds
//! - Mon–Thu night cap per ISO week
//! - consecutive-night cap over sliding calendar windows
//!
//! The soft objective comes from [`objective::FairnessObjective`].

pub mod model;
pub mod objective;

use std::time::Instant;

use tracing::{info, warn};

use crate::config::RosterConfig;
use crate::domain::{Doctor, LeaveInterval, Roster, RosterOrigin, Shift};
use crate::error::{InfeasibilityCause, Result, RosterError};
use crate::validation::{into_roster_error, validate_inputs};

pub use model::{ModelSolution, ModelStats, RosterModel};
pub use objective::{objective_for, FairnessObjective};

/// Solves rosters under one configuration.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ed_rostering::config::RosterConfig;
/// use ed_rostering::domain::{Doctor, Shift};
/// use ed_rostering::optimizer::RosterOptimizer;
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
/// let doctor = Doctor::new("D01", "Amy Cole").with_shift_bounds(0, 30);
///
/// let roster = RosterOptimizer::new(RosterConfig::default())
///     .solve(&[doctor], &[shift], &[])
///     .unwrap();
///
/// assert!(roster.is_validated());
/// assert_eq!(roster.assignments.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RosterOptimizer {
    config: RosterConfig,
}

impl RosterOptimizer {
    pub fn new(config: RosterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Produces a roster satisfying every hard rule, or an explicit
    /// [`RosterError::Infeasible`].
    ///
    /// Inactive doctors are dropped before solving. With no active doctors or
    /// no shifts the result is an empty roster and the solver is not invoked.
    pub fn solve(
        &self,
        doctors: &[Doctor],
        shifts: &[Shift],
        leave: &[LeaveInterval],
    ) -> Result<Roster> {
        self.config.validate()?;
        validate_inputs(doctors, shifts, leave).map_err(into_roster_error)?;

        let doctors: Vec<Doctor> = doctors.iter().filter(|d| d.active).cloned().collect();
        let night_rule = self.config.rules.night_rule;
        let shifts: Vec<Shift> = shifts
            .iter()
            .cloned()
            .map(|s| s.classified_by(night_rule))
            .collect();

        if doctors.is_empty() || shifts.is_empty() {
            info!(
                doctors = doctors.len(),
                shifts = shifts.len(),
                "Nothing to optimize, returning empty roster"
            );
            return Ok(Roster::empty(doctors, shifts));
        }

        let limit = self.config.solver.time_limit();
        info!(
            doctors = doctors.len(),
            shifts = shifts.len(),
            leave = leave.len(),
            rest_hours = self.config.rules.rest_hours_required,
            objective = ?self.config.objective.strategy,
            time_limit_secs = limit.as_secs_f64(),
            "Starting roster optimization"
        );

        let started = Instant::now();
        let outcome = RosterModel::build(&doctors, &shifts, leave, &self.config)
            .and_then(|model| model.solve(&self.config.solver));

        match outcome {
            Ok(solution) => {
                if !solution.optimal {
                    warn!(
                        time_limit_secs = limit.as_secs_f64(),
                        objective = solution.objective,
                        "Time limit reached, keeping best roster found"
                    );
                }
                info!(
                    assignments = solution.assignments.len(),
                    objective = solution.objective,
                    optimal = solution.optimal,
                    duration_secs = started.elapsed().as_secs_f64(),
                    "Roster optimization complete"
                );
                Ok(Roster {
                    doctors,
                    shifts,
                    assignments: solution.assignments,
                    origin: RosterOrigin::Optimized {
                        objective: solution.objective,
                        strategy: self.config.objective.strategy,
                    },
                })
            }
            Err(RosterError::Infeasible {
                cause: InfeasibilityCause::TimedOut { limit },
            }) => {
                warn!(
                    time_limit_secs = limit.as_secs_f64(),
                    "Time limit reached before a feasible roster was found"
                );
                Err(RosterError::Infeasible {
                    cause: InfeasibilityCause::TimedOut { limit },
                })
            }
            Err(err @ RosterError::Infeasible { .. }) => {
                warn!(
                    duration_secs = started.elapsed().as_secs_f64(),
                    "Hard constraints proven infeasible"
                );
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

/// Entry point with the default configuration and an explicit rest requirement.
pub fn solve_roster(
    doctors: &[Doctor],
    shifts: &[Shift],
    leave: &[LeaveInterval],
    rest_hours_required: f64,
) -> Result<Roster> {
    RosterOptimizer::new(RosterConfig::default().with_rest_hours(rest_hours_required))
        .solve(doctors, shifts, leave)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::audit_roster;
    use crate::config::{BundleMode, ObjectiveStrategy};
    use crate::demo_data::{self, DemoData};
    use crate::domain::LeaveType;
    use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn shift(id: &str, start: NaiveDateTime, end: NaiveDateTime, min: u32, max: u32) -> Shift {
        Shift::new(id, id, start, end, min, max).unwrap()
    }

    fn night(id: &str, d: u32) -> Shift {
        shift(id, at(d, 22), at(d + 1, 8), 1, 1)
    }

    fn doctor(id: &str, min: u32, max: u32) -> Doctor {
        Doctor::new(id, id).with_shift_bounds(min, max)
    }

    fn assert_clean(roster: &Roster, leave: &[LeaveInterval], config: &RosterConfig) {
        let violations = audit_roster(roster, leave, &config.rules);
        assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    fn count_for(roster: &Roster, doctor_id: &str) -> usize {
        roster.assignments.iter().filter(|a| a.doctor_id == doctor_id).count()
    }

    #[test]
    fn test_single_doctor_single_shift() {
        let doctors = vec![doctor("D01", 0, 30)];
        let shifts = vec![shift("S1", at(2, 7), at(2, 18), 1, 1)];

        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();

        assert!(roster.is_validated());
        assert_eq!(roster.assignments.len(), 1);
        assert_eq!(roster.assignments[0].doctor_id, "D01");
    }

    #[test]
    fn test_overlapping_shifts_go_to_different_doctors() {
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let shifts = vec![
            shift("S1", at(2, 7), at(2, 18), 1, 1),
            shift("S2", at(2, 14), at(3, 1), 1, 1),
        ];

        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();

        assert_eq!(roster.assignments.len(), 2);
        assert_eq!(roster.coverage("S1"), 1);
        assert_eq!(roster.coverage("S2"), 1);
        assert_ne!(roster.assignments[0].doctor_id, roster.assignments[1].doctor_id);
        assert_clean(&roster, &[], &RosterConfig::default());
    }

    #[test]
    fn test_only_doctor_on_leave_is_infeasible() {
        let doctors = vec![doctor("D01", 1, 30)];
        let shifts: Vec<Shift> = (2..=27)
            .map(|d| shift(&format!("S{}", d), at(d, 7), at(d, 18), 1, 1))
            .collect();
        let leave = vec![LeaveInterval::new(
            "D01",
            NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap(),
            LeaveType::Annual,
        )
        .unwrap()];

        let err = solve_roster(&doctors, &shifts, &leave, 11.0).unwrap_err();
        assert!(err.is_infeasible());
    }

    #[test]
    fn test_leave_dates_are_never_assigned() {
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let shifts: Vec<Shift> = (2..=5)
            .map(|d| shift(&format!("S{}", d), at(d, 7), at(d, 18), 1, 1))
            .collect();
        let leave = vec![LeaveInterval::new(
            "D01",
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            NaiveDate::from_ymd_opt(2026, 2, 4).unwrap(),
            LeaveType::Sick,
        )
        .unwrap()];

        let roster = solve_roster(&doctors, &shifts, &leave, 11.0).unwrap();

        for a in &roster.assignments {
            if a.shift_id == "S3" || a.shift_id == "S4" {
                assert_eq!(a.doctor_id, "D02");
            }
        }
        assert_clean(&roster, &leave, &RosterConfig::default());
    }

    #[test]
    fn test_four_consecutive_nights() {
        // Sat 7th to Tue 10th
        let shifts: Vec<Shift> = (7..=10).map(|d| night(&format!("N{}", d), d)).collect();

        let err = solve_roster(&[doctor("D01", 0, 30)], &shifts, &[], 11.0).unwrap_err();
        assert!(err.is_infeasible());

        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();
        assert_eq!(roster.assignments.len(), 4);
        assert!(count_for(&roster, "D01") <= 3);
        assert!(count_for(&roster, "D02") <= 3);
        assert_clean(&roster, &[], &RosterConfig::default());
    }

    #[test]
    fn test_friday_night_brings_saturday_and_sunday() {
        let shifts = vec![
            night("FRI", 6),
            shift("SAT-N", at(7, 21), at(8, 9), 1, 1),
            shift("SAT-D", at(7, 7), at(7, 19), 1, 1),
            shift("SUN-N", at(8, 21), at(9, 9), 1, 1),
        ];
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];

        for mode in [BundleMode::Implication, BundleMode::Equality] {
            let mut config = RosterConfig::default();
            config.rules.bundle_mode = mode;
            let roster = RosterOptimizer::new(config.clone())
                .solve(&doctors, &shifts, &[])
                .unwrap();

            let friday = roster
                .assignments
                .iter()
                .find(|a| a.shift_id == "FRI")
                .map(|a| a.doctor_id.clone())
                .unwrap();
            let nights: Vec<&str> = roster
                .assignments
                .iter()
                .filter(|a| a.doctor_id == friday)
                .map(|a| a.shift_id.as_str())
                .collect();
            assert!(nights.contains(&"SAT-N"), "{:?}", mode);
            assert!(nights.contains(&"SUN-N"), "{:?}", mode);
            assert_clean(&roster, &[], &config);
        }
    }

    #[test]
    fn test_more_than_three_weekends_is_infeasible() {
        // Four Saturdays: 7th, 14th, 21st, 28th
        let saturdays = [7, 14, 21, 28];
        let shifts: Vec<Shift> = saturdays
            .iter()
            .map(|&d| shift(&format!("SAT{}", d), at(d, 7), at(d, 19), 1, 1))
            .collect();
        assert!(shifts.iter().all(|s| s.start.weekday() == Weekday::Sat));

        let err = solve_roster(&[doctor("D01", 0, 30)], &shifts, &[], 11.0).unwrap_err();
        assert!(err.is_infeasible());

        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();
        assert_eq!(roster.assignments.len(), 4);
        assert_clean(&roster, &[], &RosterConfig::default());
    }

    #[test]
    fn test_every_available_doctor_works_a_weekend() {
        let shifts = vec![
            shift("SAT", at(7, 7), at(7, 19), 1, 1),
            shift("SUN", at(8, 7), at(8, 19), 1, 1),
        ];
        // D03 cannot take any shift, so its weekend minimum is lifted
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30), doctor("D03", 0, 0)];

        let mut config = RosterConfig::default();
        config.objective.strategy = ObjectiveStrategy::DeviationFromTarget;
        config.objective.weekend_weight = 0.0;
        let roster = RosterOptimizer::new(config.clone())
            .solve(&doctors, &shifts, &[])
            .unwrap();

        assert_eq!(count_for(&roster, "D01"), 1);
        assert_eq!(count_for(&roster, "D02"), 1);
        assert_eq!(count_for(&roster, "D03"), 0);
        assert_clean(&roster, &[], &config);
    }

    #[test]
    fn test_weekday_night_cap() {
        // Mon, Wed and Thu nights of one ISO week
        let shifts = vec![night("MON", 2), night("WED", 4), night("THU", 5)];

        let err = solve_roster(&[doctor("D01", 0, 30)], &shifts, &[], 11.0).unwrap_err();
        assert!(err.is_infeasible());

        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();
        assert!(count_for(&roster, "D01") <= 2);
        assert!(count_for(&roster, "D02") <= 2);
    }

    #[test]
    fn test_objective_is_deterministic() {
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30), doctor("D03", 0, 30)];
        let shifts: Vec<Shift> = (2..=6)
            .flat_map(|d| {
                vec![
                    shift(&format!("D{}", d), at(d, 7), at(d, 18), 1, 1),
                    night(&format!("N{}", d), d),
                ]
            })
            .collect();

        let first = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();
        let second = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();

        let objective = |r: &Roster| match r.origin {
            RosterOrigin::Optimized { objective, .. } => objective,
            _ => panic!("not optimized"),
        };
        assert!((objective(&first) - objective(&second)).abs() < 1e-6);
        assert_clean(&first, &[], &RosterConfig::default());
    }

    #[test]
    fn test_spread_balances_shift_counts() {
        let doctors = vec![doctor("D01", 0, 30), doctor("D02", 0, 30)];
        let shifts: Vec<Shift> = (2..=5)
            .map(|d| shift(&format!("S{}", d), at(d, 7), at(d, 18), 1, 1))
            .collect();

        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();

        assert_eq!(count_for(&roster, "D01"), 2);
        assert_eq!(count_for(&roster, "D02"), 2);
        match roster.origin {
            RosterOrigin::Optimized { objective, strategy } => {
                assert!(objective.abs() < 1e-6);
                assert_eq!(strategy, ObjectiveStrategy::SpreadMinimization);
            }
            _ => panic!("expected optimized roster"),
        }
    }

    #[test]
    fn test_deviation_tracks_contract_hours() {
        let doctors = vec![
            doctor("D01", 0, 30).with_contract_hours(22.0),
            doctor("D02", 0, 30).with_contract_hours(11.0),
        ];
        let shifts: Vec<Shift> = (2..=4)
            .map(|d| shift(&format!("S{}", d), at(d, 7), at(d, 18), 1, 1))
            .collect();
        let mut config = RosterConfig::default();
        config.objective.strategy = ObjectiveStrategy::DeviationFromTarget;

        let roster = RosterOptimizer::new(config).solve(&doctors, &shifts, &[]).unwrap();

        assert_eq!(count_for(&roster, "D01"), 2);
        assert_eq!(count_for(&roster, "D02"), 1);
    }

    #[test]
    fn test_inactive_doctors_are_not_rostered() {
        let mut retired = doctor("D02", 5, 10);
        retired.active = false;
        let doctors = vec![doctor("D01", 0, 30), retired];
        let shifts = vec![shift("S1", at(2, 7), at(2, 18), 1, 1)];

        let roster = solve_roster(&doctors, &shifts, &[], 11.0).unwrap();

        assert_eq!(roster.doctors.len(), 1);
        assert_eq!(count_for(&roster, "D02"), 0);
    }

    #[test]
    fn test_empty_inputs_give_empty_roster() {
        let roster = solve_roster(&[], &[shift("S1", at(2, 7), at(2, 18), 1, 1)], &[], 11.0).unwrap();
        assert_eq!(roster.origin, RosterOrigin::Empty);
        assert!(roster.assignments.is_empty());

        let roster = solve_roster(&[doctor("D01", 0, 30)], &[], &[], 11.0).unwrap();
        assert_eq!(roster.origin, RosterOrigin::Empty);
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let shifts = vec![
            shift("S1", at(2, 7), at(2, 18), 1, 1),
            shift("S1", at(3, 7), at(3, 18), 1, 1),
        ];
        let err = solve_roster(&[doctor("D01", 0, 30)], &shifts, &[], 11.0).unwrap_err();
        assert!(matches!(err, RosterError::InvalidInput(_)));
    }

    fn solve_demo(demo: DemoData, config: RosterConfig) -> Roster {
        let data = demo_data::generate(demo, config.rules.night_rule).unwrap();
        let roster = RosterOptimizer::new(config.clone())
            .solve(&data.doctors, &data.shifts, &data.leave)
            .unwrap_or_else(|e| panic!("{} demo month not solved: {}", demo.as_str(), e));

        assert!(roster.is_validated());
        assert_clean(&roster, &data.leave, &config);
        for shift in &data.shifts {
            let covered = roster.coverage(&shift.id) as u32;
            assert!(covered >= shift.min_doctors && covered <= shift.max_doctors, "{}", shift.id);
        }
        for doctor in &data.doctors {
            let load = count_for(&roster, &doctor.id) as u32;
            assert!(load >= doctor.min_shifts_per_month, "{} under minimum", doctor.id);
            assert!(load <= doctor.max_shifts_per_month, "{} over maximum", doctor.id);
        }
        roster
    }

    #[test]
    fn test_small_demo_month_solves_within_default_limit() {
        let started = Instant::now();
        let roster = solve_demo(DemoData::Small, RosterConfig::default());

        assert!(started.elapsed() < RosterConfig::default().solver.time_limit() * 2);
        assert!(roster.assignments.len() >= 252);
    }

    #[test]
    fn test_large_demo_month_solves_with_deviation_objective() {
        let mut config = RosterConfig::default();
        config.objective.strategy = ObjectiveStrategy::DeviationFromTarget;

        let roster = solve_demo(DemoData::Large, config);

        assert_eq!(roster.doctors.len(), 22);
    }

    #[test]
    fn test_one_week_of_demo_shifts_solves() {
        let data = demo_data::generate(DemoData::Small, Default::default()).unwrap();
        let week: Vec<Shift> = data
            .shifts
            .iter()
            .filter(|s| s.start.day() <= 7)
            .cloned()
            .collect();
        let doctors: Vec<Doctor> = data
            .doctors
            .iter()
            .cloned()
            .map(|d| d.with_shift_bounds(0, 18))
            .collect();
        let mut config = RosterConfig::default();
        config.rules.min_weekends_per_month = 0;

        let roster = RosterOptimizer::new(config.clone())
            .solve(&doctors, &week, &[])
            .unwrap();

        assert_clean(&roster, &[], &config);
    }
}
