//! DTOs for REST API requests/responses.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::audit::{audit_roster, RuleViolation};
use crate::config::RuleConfig;
use crate::domain::{Doctor, LeaveType, Roster, RosterOrigin, Shift};
use crate::feasibility::FeasibilityReport;
use crate::solver::{RosterJob, SolverStatus};
use crate::workload::{HoursSummary, WorkloadStats};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorsQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoundsRequest {
    pub contract_hours_per_month: f64,
    pub min_shifts_per_month: u32,
    pub max_shifts_per_month: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateShiftsRequest {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateShiftsResponse {
    pub year: i32,
    pub month: u32,
    pub created: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveRequest {
    pub doctor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub leave_type: LeaveType,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One assignment with the doctor and shift it joins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDto {
    pub doctor_id: String,
    pub doctor_name: String,
    pub shift_id: String,
    pub shift_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_night: bool,
    pub is_weekend: bool,
}

impl AssignmentDto {
    pub fn new(doctor: &Doctor, shift: &Shift) -> Self {
        Self {
            doctor_id: doctor.id.clone(),
            doctor_name: doctor.name.clone(),
            shift_id: shift.id.clone(),
            shift_name: shift.name.clone(),
            start: shift.start,
            end: shift.end,
            is_night: shift.is_night,
            is_weekend: shift.is_weekend,
        }
    }

    fn from_roster(roster: &Roster) -> Vec<Self> {
        let mut out: Vec<Self> = roster
            .assignments
            .iter()
            .filter_map(|a| {
                let doctor = roster.doctor(&a.doctor_id)?;
                Some(Self::new(doctor, roster.shift(&a.shift_id)?))
            })
            .collect();
        out.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.doctor_id.cmp(&b.doctor_id)));
        out
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OnDutyQuery {
    pub at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingQuery {
    pub from: NaiveDate,
    #[serde(default = "default_upcoming_days")]
    pub days: i64,
}

fn default_upcoming_days() -> i64 {
    7
}

/// A roster job as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterDto {
    pub id: String,
    pub solver_status: SolverStatus,
    pub created_at: NaiveDateTime,
    pub origin: Option<RosterOrigin>,
    /// `optimized`, `naive/unvalidated` or `empty`.
    pub label: Option<&'static str>,
    pub assignments: Vec<AssignmentDto>,
    /// Hard-rule breaches; only a naive roster can have any.
    pub violations: Vec<RuleViolation>,
    pub feasibility: FeasibilityReport,
    pub error: Option<String>,
}

impl RosterDto {
    pub fn from_job(job: &RosterJob, rules: &RuleConfig) -> Self {
        let (assignments, violations) = match &job.roster {
            Some(roster) => (
                AssignmentDto::from_roster(roster),
                audit_roster(roster, &job.input.leave, rules),
            ),
            None => (Vec::new(), Vec::new()),
        };
        Self {
            id: job.id.clone(),
            solver_status: job.status,
            created_at: job.created_at,
            origin: job.roster.as_ref().map(|r| r.origin.clone()),
            label: job.roster.as_ref().map(|r| r.origin.label()),
            assignments,
            violations,
            feasibility: job.feasibility.clone(),
            error: job.error.clone(),
        }
    }
}

/// Response for roster status only.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub solver_status: String,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadResponse {
    pub roster_id: String,
    pub doctors: Vec<WorkloadStats>,
    pub hours: Vec<HoursSummary>,
}
