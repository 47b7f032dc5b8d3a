//! The 0/1 assignment model: variables, hard constraints and solve.

use std::time::Duration;

use good_lp::{
    constraint, highs, variable, Constraint, Expression, ProblemVariables, ResolutionError,
    Solution, SolutionStatus, SolverModel, Variable,
};
use tracing::debug;

use super::objective::{objective_for, ObjectiveContext};
use crate::config::{BundleMode, RosterConfig, SolverConfig};
use crate::conflicts::{conflict_pairs, ShiftCalendar};
use crate::domain::{Assignment, Doctor, LeaveCalendar, LeaveInterval, Shift};
use crate::error::{InfeasibilityCause, Result, RosterError};

/// Assignments and objective value read back from a solved model.
#[derive(Debug, Clone)]
pub struct ModelSolution {
    pub assignments: Vec<Assignment>,
    pub objective: f64,
    /// False when the solver stopped on its time limit with an incumbent.
    pub optimal: bool,
}

/// Size of a built model, for logging.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelStats {
    pub assignment_vars: usize,
    pub conflict_pairs: usize,
    pub constraints: usize,
}

/// A built roster model, owned so it can be moved to a solver thread.
pub struct RosterModel {
    doctor_ids: Vec<String>,
    shift_ids: Vec<String>,
    vars: ProblemVariables,
    x: Vec<Vec<Option<Variable>>>,
    constraints: Vec<Constraint>,
    objective: Expression,
    stats: ModelStats,
}

fn proven_infeasible(reason: String) -> RosterError {
    debug!(reason = %reason, "Model rejected before solving");
    RosterError::Infeasible {
        cause: InfeasibilityCause::Proven,
    }
}

impl RosterModel {
    /// Builds variables, hard constraints and the configured objective.
    ///
    /// `doctors` must already be restricted to active doctors and `shifts`
    /// classified under the configured night rule. Bounds that cannot be met
    /// even before solving (a shift with too few doctors off leave, a doctor
    /// with too few workable shifts) are reported as proven infeasible.
    pub fn build(
        doctors: &[Doctor],
        shifts: &[Shift],
        leave: &[LeaveInterval],
        config: &RosterConfig,
    ) -> Result<Self> {
        let rules = &config.rules;
        let leave_calendar = LeaveCalendar::new(leave);
        let mut vars = ProblemVariables::new();

        // x[d][s]; leave days get no variable at all
        let x: Vec<Vec<Option<Variable>>> = doctors
            .iter()
            .map(|doctor| {
                shifts
                    .iter()
                    .map(|shift| {
                        if leave_calendar.is_on_leave(&doctor.id, shift.date()) {
                            None
                        } else {
                            Some(vars.add(variable().binary()))
                        }
                    })
                    .collect()
            })
            .collect();

        let mut constraints = Vec::new();
        let mut stats = ModelStats {
            assignment_vars: x.iter().flatten().flatten().count(),
            ..ModelStats::default()
        };

        // 1. Coverage
        for (s, shift) in shifts.iter().enumerate() {
            let available: Vec<Variable> = x.iter().filter_map(|row| row[s]).collect();
            if (available.len() as u32) < shift.min_doctors {
                return Err(proven_infeasible(format!(
                    "shift {} needs {} doctors but only {} are available",
                    shift.id,
                    shift.min_doctors,
                    available.len()
                )));
            }
            if available.is_empty() {
                continue;
            }
            let coverage: Expression = available.into_iter().sum();
            let min = f64::from(shift.min_doctors);
            let max = f64::from(shift.max_doctors);
            constraints.push(constraint!(coverage.clone() >= min));
            constraints.push(constraint!(coverage <= max));
        }

        // 2. Monthly load
        for (d, doctor) in doctors.iter().enumerate() {
            let workable: Vec<Variable> = x[d].iter().flatten().copied().collect();
            if (workable.len() as u32) < doctor.min_shifts_per_month {
                return Err(proven_infeasible(format!(
                    "doctor {} needs {} shifts but can work only {}",
                    doctor.id,
                    doctor.min_shifts_per_month,
                    workable.len()
                )));
            }
            if workable.is_empty() {
                continue;
            }
            let load: Expression = workable.into_iter().sum();
            let min = f64::from(doctor.min_shifts_per_month);
            let max = f64::from(doctor.max_shifts_per_month);
            constraints.push(constraint!(load.clone() >= min));
            constraints.push(constraint!(load <= max));
        }

        // 3. Overlap and rest conflicts
        let pairs = conflict_pairs(shifts, rules.rest_hours_required);
        stats.conflict_pairs = pairs.len();
        for row in &x {
            for &(i, j) in &pairs {
                if let (Some(a), Some(b)) = (row[i], row[j]) {
                    constraints.push(constraint!(a + b <= 1));
                }
            }
        }

        let calendar = ShiftCalendar::build(shifts);
        let sum_of = |row: &[Option<Variable>], indices: &[usize]| -> Vec<Variable> {
            indices.iter().filter_map(|&i| row[i]).collect()
        };

        // 4. Friday/Saturday/Sunday night bundles
        for row in &x {
            for bundle in &calendar.bundles {
                let fri = sum_of(row, &bundle.friday);
                let sat = sum_of(row, &bundle.saturday);
                let sun = sum_of(row, &bundle.sunday);
                match rules.bundle_mode {
                    BundleMode::Implication => {
                        for &f in &fri {
                            let sat_sum: Expression = sat.iter().copied().sum();
                            let sun_sum: Expression = sun.iter().copied().sum();
                            constraints.push(constraint!(f - sat_sum <= 0));
                            constraints.push(constraint!(f - sun_sum <= 0));
                        }
                    }
                    BundleMode::Equality => {
                        for (a, b) in [(&fri, &sat), (&sat, &sun)] {
                            if a.is_empty() && b.is_empty() {
                                continue;
                            }
                            let lhs: Expression = a.iter().copied().sum();
                            let rhs: Expression = b.iter().copied().sum();
                            constraints.push(constraint!(lhs - rhs == 0));
                        }
                    }
                }
            }
        }

        // 5. Weekends worked, through one indicator per (doctor, weekend)
        let weekend_groups = calendar.weekend_groups(shifts, rules.weekend_counting);
        for (d, doctor) in doctors.iter().enumerate() {
            let mut indicators = Vec::new();
            for indices in weekend_groups.values() {
                let worked = sum_of(&x[d], indices);
                if worked.is_empty() {
                    continue;
                }
                let big_m = worked.len() as f64;
                let y = vars.add(variable().binary());
                let total: Expression = worked.into_iter().sum();
                constraints.push(constraint!(y - total.clone() <= 0));
                constraints.push(constraint!(total - big_m * y <= 0));
                indicators.push(y);
            }
            if indicators.is_empty() {
                continue;
            }

            let min_weekends = rules
                .min_weekends_per_month
                .min(indicators.len() as u32)
                .min(doctor.max_shifts_per_month);
            let max_weekends = f64::from(rules.max_weekends_per_month);
            let weekends: Expression = indicators.iter().copied().sum();
            if min_weekends > 0 {
                let min = f64::from(min_weekends);
                constraints.push(constraint!(weekends.clone() >= min));
            }
            if indicators.len() as u32 > rules.max_weekends_per_month {
                constraints.push(constraint!(weekends <= max_weekends));
            }
        }

        // 6. Mon–Thu nights per ISO week
        let weekday_cap = f64::from(rules.max_weekday_nights_per_week);
        for row in &x {
            for indices in calendar.weekday_nights_by_week.values() {
                let nights = sum_of(row, indices);
                if nights.len() as u32 > rules.max_weekday_nights_per_week {
                    let total: Expression = nights.into_iter().sum();
                    constraints.push(constraint!(total <= weekday_cap));
                }
            }
        }

        // 7. Consecutive nights over sliding calendar windows
        let night_cap = f64::from(rules.max_consecutive_nights);
        let windows = calendar.night_windows(rules.max_consecutive_nights + 1);
        for row in &x {
            for window in &windows {
                let nights = sum_of(row, window);
                if nights.len() as u32 > rules.max_consecutive_nights {
                    let total: Expression = nights.into_iter().sum();
                    constraints.push(constraint!(total <= night_cap));
                }
            }
        }

        let strategy = objective_for(config.objective.strategy);
        let ctx = ObjectiveContext {
            doctors,
            shifts,
            x: &x,
            weights: &config.objective,
            weekend_counting: rules.weekend_counting,
        };
        let objective = strategy.build(&ctx, &mut vars, &mut constraints);
        stats.constraints = constraints.len();

        debug!(
            objective = strategy.name(),
            assignment_vars = stats.assignment_vars,
            conflict_pairs = stats.conflict_pairs,
            constraints = stats.constraints,
            "Roster model built"
        );

        Ok(Self {
            doctor_ids: doctors.iter().map(|d| d.id.clone()).collect(),
            shift_ids: shifts.iter().map(|s| s.id.clone()).collect(),
            vars,
            x,
            constraints,
            objective,
            stats,
        })
    }

    pub fn stats(&self) -> ModelStats {
        self.stats
    }

    /// Solves the model under the configured time limit and MIP gap.
    ///
    /// Indicators above 0.5 become assignments. Reaching the time limit with a
    /// feasible incumbent returns that incumbent; reaching it without one is
    /// reported as [`InfeasibilityCause::TimedOut`].
    pub fn solve(self, solver: &SolverConfig) -> Result<ModelSolution> {
        let RosterModel {
            doctor_ids,
            shift_ids,
            vars,
            x,
            constraints,
            objective,
            ..
        } = self;

        let limit = solver.time_limit();
        let objective_expr = objective.clone();
        let mut problem = vars
            .minimise(objective)
            .using(highs)
            .set_time_limit(limit.as_secs_f64())
            .set_mip_rel_gap(solver.mip_rel_gap as f32)
            .map_err(|e| RosterError::Solver(e.to_string()))?;
        for c in constraints {
            problem.add_constraint(c);
        }

        let solution = problem
            .solve()
            .map_err(|e| resolution_error(e, limit))?;
        let optimal = !matches!(solution.status(), SolutionStatus::TimeLimit);

        let mut assignments = Vec::new();
        for (d, row) in x.iter().enumerate() {
            for (s, var) in row.iter().enumerate() {
                if let Some(var) = var {
                    if solution.value(*var) > 0.5 {
                        assignments.push(Assignment::new(doctor_ids[d].clone(), shift_ids[s].clone()));
                    }
                }
            }
        }
        assignments.sort();

        Ok(ModelSolution {
            assignments,
            objective: solution.eval(objective_expr),
            optimal,
        })
    }
}

/// HiGHS reports a limit reached without any incumbent as `NoSolutionFound`.
fn resolution_error(err: ResolutionError, limit: Duration) -> RosterError {
    match err {
        ResolutionError::Infeasible => RosterError::Infeasible {
            cause: InfeasibilityCause::Proven,
        },
        ResolutionError::Other("NoSolutionFound") => RosterError::Infeasible {
            cause: InfeasibilityCause::TimedOut { limit },
        },
        other => RosterError::Solver(other.to_string()),
    }
}
