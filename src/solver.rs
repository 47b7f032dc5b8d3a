//! Roster job service.
//!
//! Each job owns a snapshot of the records it was started from, so edits
//! made while it runs never leak into its roster. Optimization runs on the
//! blocking pool; naive rosters are produced inline.

use chrono::{NaiveDateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

#[cfg(feature = "console")]
use crate::console::{self, SolveTimer};
use crate::config::RosterConfig;
use crate::domain::Roster;
use crate::error::RosterError;
use crate::feasibility::{analyze_feasibility, FeasibilityReport};
use crate::naive::generate_naive_roster;
use crate::optimizer::RosterOptimizer;
use crate::store::Snapshot;

/// Status of a roster job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolverStatus {
    /// Finished, or not started yet.
    NotSolving,
    /// Actively solving.
    Solving,
    /// Finished without a roster: the hard rules cannot all be met.
    Infeasible,
    /// Finished without a roster for any other reason.
    Failed,
}

impl SolverStatus {
    /// Returns the status as a SCREAMING_SNAKE_CASE string for API responses.
    ///
    /// ```
    /// use ed_rostering::solver::SolverStatus;
    ///
    /// assert_eq!(SolverStatus::NotSolving.as_str(), "NOT_SOLVING");
    /// assert_eq!(SolverStatus::Solving.as_str(), "SOLVING");
    /// assert_eq!(SolverStatus::Infeasible.as_str(), "INFEASIBLE");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::NotSolving => "NOT_SOLVING",
            SolverStatus::Solving => "SOLVING",
            SolverStatus::Infeasible => "INFEASIBLE",
            SolverStatus::Failed => "FAILED",
        }
    }
}

/// A roster job with its current state.
pub struct RosterJob {
    /// Unique job identifier.
    pub id: String,
    pub status: SolverStatus,
    pub created_at: NaiveDateTime,
    /// Records the job was started from.
    pub input: Snapshot,
    /// Pre-solve feasibility of `input`.
    pub feasibility: FeasibilityReport,
    /// Set once the job finishes with a roster.
    pub roster: Option<Roster>,
    /// Set once the job finishes without one.
    pub error: Option<String>,
}

impl RosterJob {
    pub fn new(id: String, input: Snapshot) -> Self {
        let feasibility = analyze_feasibility(&input.doctors, &input.shifts, &input.leave);
        Self {
            id,
            status: SolverStatus::NotSolving,
            created_at: Utc::now().naive_utc(),
            input,
            feasibility,
            roster: None,
            error: None,
        }
    }
}

/// Manages roster jobs.
///
/// # Examples
///
/// ```
/// use ed_rostering::config::RosterConfig;
/// use ed_rostering::solver::{RosterService, SolverStatus};
/// use ed_rostering::store::Snapshot;
///
/// let service = RosterService::new(RosterConfig::default());
///
/// // Create a job (doesn't start solving yet)
/// let job = service.create_job("test-1".to_string(), Snapshot::default());
/// assert_eq!(job.read().status, SolverStatus::NotSolving);
/// assert!(!job.read().feasibility.feasible);
/// ```
pub struct RosterService {
    config: RosterConfig,
    jobs: RwLock<HashMap<String, Arc<RwLock<RosterJob>>>>,
}

impl RosterService {
    pub fn new(config: RosterConfig) -> Self {
        Self {
            config,
            jobs: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Creates a new job for the given records.
    pub fn create_job(&self, id: String, input: Snapshot) -> Arc<RwLock<RosterJob>> {
        let job = Arc::new(RwLock::new(RosterJob::new(id.clone(), input)));
        self.jobs.write().insert(id, job.clone());
        job
    }

    /// Gets a job by ID.
    pub fn get_job(&self, id: &str) -> Option<Arc<RwLock<RosterJob>>> {
        self.jobs.read().get(id).cloned()
    }

    /// Lists all job IDs, oldest first.
    pub fn list_jobs(&self) -> Vec<String> {
        let jobs = self.jobs.read();
        let mut ids: Vec<(NaiveDateTime, String)> = jobs
            .iter()
            .map(|(id, job)| (job.read().created_at, id.clone()))
            .collect();
        ids.sort();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Removes a job by ID. A running solve finishes into the detached job.
    pub fn remove_job(&self, id: &str) -> Option<Arc<RwLock<RosterJob>>> {
        self.jobs.write().remove(id)
    }

    /// Starts optimizing a job in the background.
    pub fn start_solving(&self, job: Arc<RwLock<RosterJob>>) {
        job.write().status = SolverStatus::Solving;
        let optimizer = RosterOptimizer::new(self.config.clone());

        tokio::task::spawn_blocking(move || {
            solve_blocking(job, optimizer);
        });
    }

    /// Fills a job with a round-robin roster, without solving.
    pub fn run_naive(&self, job: &Arc<RwLock<RosterJob>>) {
        let mut guard = job.write();
        let roster = generate_naive_roster(&guard.input.doctors, &guard.input.shifts);
        info!(
            job_id = %guard.id,
            assignments = roster.assignments.len(),
            "Naive roster ready"
        );
        guard.roster = Some(roster);
        guard.status = SolverStatus::NotSolving;
    }
}

impl Default for RosterService {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}

/// Runs the optimizer in a blocking context and records the outcome.
pub fn solve_blocking(job: Arc<RwLock<RosterJob>>, optimizer: RosterOptimizer) {
    let (job_id, input) = {
        let guard = job.read();
        (guard.id.clone(), guard.input.clone())
    };
    let solve_start = Instant::now();

    #[cfg(feature = "console")]
    console::print_problem(input.doctors.len(), input.shifts.len(), input.leave.len());

    info!(
        job_id = %job_id,
        doctors = input.doctors.len(),
        shifts = input.shifts.len(),
        "Starting roster solver"
    );

    #[cfg(feature = "console")]
    let timer = SolveTimer::start();

    let outcome = optimizer.solve(&input.doctors, &input.shifts, &input.leave);

    #[cfg(feature = "console")]
    timer.finish(match &outcome {
        Ok(_) => "solved",
        Err(e) if e.is_infeasible() => "infeasible",
        Err(_) => "failed",
    });

    let total_duration = solve_start.elapsed();
    let mut guard = job.write();
    match outcome {
        Ok(roster) => {
            info!(
                job_id = %job_id,
                duration_secs = total_duration.as_secs_f64(),
                assignments = roster.assignments.len(),
                origin = roster.origin.label(),
                "Solving complete"
            );

            #[cfg(feature = "console")]
            console::print_roster_summary(&roster, total_duration);

            guard.roster = Some(roster);
            guard.status = SolverStatus::NotSolving;
        }
        Err(err) => {
            let infeasible = err.is_infeasible();
            warn!(job_id = %job_id, error = %err, "Solving failed");

            #[cfg(feature = "console")]
            console::print_run_failed(total_duration, &err.to_string());

            guard.error = Some(failure_message(&err, &guard.feasibility));
            guard.status = if infeasible {
                SolverStatus::Infeasible
            } else {
                SolverStatus::Failed
            };
        }
    }
}

/// The user-facing failure notice. Infeasibility carries the pre-solve
/// feasibility warnings.
fn failure_message(err: &RosterError, feasibility: &FeasibilityReport) -> String {
    if !err.is_infeasible() || feasibility.warnings.is_empty() {
        return err.to_string();
    }
    format!("{}. Feasibility warnings: {}", err, feasibility.warnings.join(" "))
}
