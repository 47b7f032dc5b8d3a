//! Error taxonomy for roster construction and optimization.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the rostering core.
///
/// Degenerate inputs (no doctors or no shifts) are not errors: the optimizer
/// returns an empty roster for them.
#[derive(Error, Debug)]
pub enum RosterError {
    /// Malformed shift, doctor bounds, or leave interval.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// No roster satisfies every hard constraint under the current inputs.
    #[error("No valid roster exists: {cause}")]
    Infeasible { cause: InfeasibilityCause },

    /// The solver back end failed for a reason other than infeasibility.
    #[error("Solver error: {0}")]
    Solver(String),
}

impl RosterError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RosterError::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        RosterError::NotFound(message.into())
    }

    /// True for both proven infeasibility and a timeout without an incumbent.
    pub fn is_infeasible(&self) -> bool {
        matches!(self, RosterError::Infeasible { .. })
    }
}

/// Why the optimizer could not produce a roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibilityCause {
    /// The solver proved that the constraint system has no solution.
    Proven,
    /// The time budget ran out before any feasible roster was found.
    TimedOut { limit: Duration },
}

impl fmt::Display for InfeasibilityCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibilityCause::Proven => write!(f, "constraints admit no solution"),
            InfeasibilityCause::TimedOut { limit } => write!(
                f,
                "time limit of {:.1}s reached without a feasible roster",
                limit.as_secs_f64()
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, RosterError>;
