//! Fairness objectives for the roster model.
//!
//! A [`FairnessObjective`] adds whatever auxiliary variables and linking
//! constraints it needs and returns the expression to minimize. Two
//! formulations are provided, selected through [`ObjectiveStrategy`].

use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};

use crate::config::{ObjectiveConfig, ObjectiveStrategy, WeekendCounting};
use crate::domain::{Doctor, Shift};

/// Read-only view of the assignment variables handed to an objective.
pub struct ObjectiveContext<'a> {
    pub doctors: &'a [Doctor],
    pub shifts: &'a [Shift],
    /// `x[d][s]`; `None` where the doctor can never work the shift.
    pub x: &'a [Vec<Option<Variable>>],
    pub weights: &'a ObjectiveConfig,
    pub weekend_counting: WeekendCounting,
}

impl ObjectiveContext<'_> {
    /// Σ x[d, s] over the shifts matching `pred`.
    pub fn count(&self, d: usize, pred: impl Fn(&Shift) -> bool) -> Expression {
        self.x[d]
            .iter()
            .zip(self.shifts)
            .filter(|(_, shift)| pred(shift))
            .filter_map(|(var, _)| *var)
            .sum()
    }

    /// Σ duration(s) · x[d, s].
    pub fn hours(&self, d: usize) -> Expression {
        self.x[d]
            .iter()
            .zip(self.shifts)
            .filter_map(|(var, shift)| var.map(|v| shift.duration_hours * v))
            .sum()
    }

    pub fn counts_as_weekend(&self, shift: &Shift) -> bool {
        shift.is_weekend
            && match self.weekend_counting {
                WeekendCounting::AnyShift => true,
                WeekendCounting::NightOnly => shift.is_night,
            }
    }
}

/// A soft objective over the roster model.
pub trait FairnessObjective: Send + Sync {
    fn name(&self) -> &'static str;

    /// Adds auxiliary variables and constraints, returning the expression
    /// to minimize.
    fn build(
        &self,
        ctx: &ObjectiveContext<'_>,
        vars: &mut ProblemVariables,
        constraints: &mut Vec<Constraint>,
    ) -> Expression;
}

/// Creates the objective implementation for a strategy.
pub fn objective_for(strategy: ObjectiveStrategy) -> Box<dyn FairnessObjective> {
    match strategy {
        ObjectiveStrategy::DeviationFromTarget => Box::new(DeviationFromTarget),
        ObjectiveStrategy::SpreadMinimization => Box::new(SpreadMinimization),
    }
}

// ============================================================================
// Deviation from target
// ============================================================================

/// Per doctor, `actual - target = pos - neg` for hours against contract,
/// nights against the fleet night target and weekend shifts against the
/// fleet weekend target. Minimizes the weighted sum of `pos + neg`.
pub struct DeviationFromTarget;

impl DeviationFromTarget {
    fn deviation(
        actual: Expression,
        target: f64,
        vars: &mut ProblemVariables,
        constraints: &mut Vec<Constraint>,
    ) -> Expression {
        let pos = vars.add(variable().min(0.0));
        let neg = vars.add(variable().min(0.0));
        constraints.push(constraint!(actual - pos + neg == target));
        pos + neg
    }
}

impl FairnessObjective for DeviationFromTarget {
    fn name(&self) -> &'static str {
        "deviation-from-target"
    }

    fn build(
        &self,
        ctx: &ObjectiveContext<'_>,
        vars: &mut ProblemVariables,
        constraints: &mut Vec<Constraint>,
    ) -> Expression {
        let n = ctx.doctors.len().max(1) as f64;
        let night_demand: u32 = ctx
            .shifts
            .iter()
            .filter(|s| s.is_night)
            .map(|s| s.min_doctors)
            .sum();
        let weekend_demand: u32 = ctx
            .shifts
            .iter()
            .filter(|s| ctx.counts_as_weekend(s))
            .map(|s| s.min_doctors)
            .sum();
        let night_target = f64::from(night_demand) / n;
        let weekend_target = f64::from(weekend_demand) / n;

        let w = ctx.weights;
        let mut terms = Vec::with_capacity(ctx.doctors.len() * 3);
        for (d, doctor) in ctx.doctors.iter().enumerate() {
            let hours = Self::deviation(ctx.hours(d), doctor.contract_hours_per_month, vars, constraints);
            let nights = Self::deviation(ctx.count(d, |s| s.is_night), night_target, vars, constraints);
            let weekends = Self::deviation(
                ctx.count(d, |s| ctx.counts_as_weekend(s)),
                weekend_target,
                vars,
                constraints,
            );
            terms.push(w.hours_weight * hours);
            terms.push(w.night_weight * nights);
            terms.push(w.weekend_weight * weekends);
        }
        terms.into_iter().sum()
    }
}

// ============================================================================
// Spread minimization
// ============================================================================

/// Minimizes the weighted max-min spread of total shifts and of night shifts
/// across doctors.
pub struct SpreadMinimization;

impl SpreadMinimization {
    /// Bounds every per-doctor count between two continuous variables and
    /// returns `max - min`.
    fn spread(
        counts: Vec<Expression>,
        vars: &mut ProblemVariables,
        constraints: &mut Vec<Constraint>,
    ) -> Expression {
        let max = vars.add(variable().min(0.0));
        let min = vars.add(variable().min(0.0));
        for count in counts {
            constraints.push(constraint!(max - count.clone() >= 0));
            constraints.push(constraint!(count - min >= 0));
        }
        max - min
    }
}

impl FairnessObjective for SpreadMinimization {
    fn name(&self) -> &'static str {
        "spread-minimization"
    }

    fn build(
        &self,
        ctx: &ObjectiveContext<'_>,
        vars: &mut ProblemVariables,
        constraints: &mut Vec<Constraint>,
    ) -> Expression {
        let doctors = 0..ctx.doctors.len();
        let totals: Vec<Expression> = doctors.clone().map(|d| ctx.count(d, |_| true)).collect();
        let w = ctx.weights;
        let mut objective = w.shift_spread_weight * Self::spread(totals, vars, constraints);

        if ctx.shifts.iter().any(|s| s.is_night) {
            let nights: Vec<Expression> = doctors.map(|d| ctx.count(d, |s| s.is_night)).collect();
            objective += w.night_spread_weight * Self::spread(nights, vars, constraints);
        }
        objective
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_objective_for_strategy() {
        assert_eq!(
            objective_for(ObjectiveStrategy::DeviationFromTarget).name(),
            "deviation-from-target"
        );
        assert_eq!(
            objective_for(ObjectiveStrategy::SpreadMinimization).name(),
            "spread-minimization"
        );
    }
}
