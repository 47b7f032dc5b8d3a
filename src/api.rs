//! REST API handlers for ED rostering.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::config::RosterConfig;
use crate::demo_data::{self, DemoData};
use crate::domain::{Doctor, LeaveInterval, Roster, Shift};
use crate::dto::{
    AssignmentDto, CreateLeaveRequest, DoctorsQuery, GenerateShiftsRequest, GenerateShiftsResponse,
    OnDutyQuery, RosterDto, StatusResponse, UpcomingQuery, UpdateBoundsRequest, WorkloadResponse,
};
use crate::error::RosterError;
use crate::feasibility::{analyze_feasibility, FeasibilityReport};
use crate::generator::{MonthTemplates, ShiftGenerator};
use crate::solver::{RosterJob, RosterService};
use crate::store::{DoctorSource, LeaveSource, MemoryStore, NewDoctor, ShiftSource, Snapshot};
use crate::workload::{hours_summary, WorkloadAnalyzer};

/// Application state shared across handlers.
pub struct AppState {
    pub store: MemoryStore,
    pub service: RosterService,
}

impl AppState {
    pub fn new(config: RosterConfig) -> Self {
        Self {
            store: MemoryStore::new(),
            service: RosterService::new(config),
        }
    }

    fn config(&self) -> &RosterConfig {
        self.service.config()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(RosterConfig::default())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status = match &self {
            RosterError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RosterError::NotFound(_) => StatusCode::NOT_FOUND,
            RosterError::Infeasible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            RosterError::Solver(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

type ApiResult<T> = Result<T, RosterError>;

// ============================================================================
// Router and Handlers
// ============================================================================

/// Creates the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data).post(load_demo_data))
        // Records
        .route("/doctors", get(list_doctors).post(create_doctor))
        .route("/doctors/{id}/bounds", put(update_doctor_bounds))
        .route("/doctors/{id}", delete(deactivate_doctor))
        .route("/shifts", get(list_shifts))
        .route("/shifts/generate", post(generate_shifts))
        .route("/leave", get(list_leave).post(create_leave))
        .route("/leave/{id}", delete(delete_leave))
        .route("/feasibility", get(feasibility))
        // Rosters
        .route("/rosters", post(create_roster).get(list_rosters))
        .route("/rosters/naive", post(create_naive_roster))
        .route("/rosters/{id}", get(get_roster).delete(delete_roster))
        .route("/rosters/{id}/status", get(get_roster_status))
        .route("/rosters/{id}/workload", get(get_roster_workload))
        .route("/rosters/{id}/on-duty", get(get_on_duty))
        .route("/rosters/{id}/doctors/{doctor_id}/upcoming", get(get_upcoming_shifts))
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub solver_engine: &'static str,
    pub config: RosterConfig,
}

/// GET /info - Application info endpoint.
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "ED Rostering",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: "good_lp/highs",
        config: state.config().clone(),
    })
}

// ============================================================================
// Demo Data
// ============================================================================

/// GET /demo-data - List available demo data sets.
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

fn demo_snapshot(state: &AppState, id: &str) -> ApiResult<Snapshot> {
    let demo = id
        .parse::<DemoData>()
        .map_err(|_| RosterError::not_found(format!("demo data set {}", id)))?;
    demo_data::generate(demo, state.config().rules.night_rule)
}

/// GET /demo-data/{id} - Get a specific demo data set.
async fn get_demo_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Snapshot>> {
    Ok(Json(demo_snapshot(&state, &id)?))
}

/// POST /demo-data/{id} - Replace every record with a demo data set.
async fn load_demo_data(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Snapshot>> {
    let snapshot = demo_snapshot(&state, &id)?;
    state.store.load(snapshot);
    info!(demo = %id, "Demo data loaded");
    Ok(Json(state.store.snapshot()))
}

// ============================================================================
// Doctors, Shifts & Leave
// ============================================================================

/// GET /doctors?activeOnly= - List doctors.
async fn list_doctors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DoctorsQuery>,
) -> Json<Vec<Doctor>> {
    Json(state.store.list_doctors(query.active_only))
}

/// POST /doctors - Create a doctor with defaults for omitted fields.
async fn create_doctor(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<NewDoctor>,
) -> ApiResult<(StatusCode, Json<Doctor>)> {
    let doctor = state.store.create_doctor(fields)?;
    Ok((StatusCode::CREATED, Json(doctor)))
}

/// PUT /doctors/{id}/bounds - Update contract hours and monthly shift bounds.
async fn update_doctor_bounds(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBoundsRequest>,
) -> ApiResult<Json<Doctor>> {
    let doctor = state.store.update_doctor_bounds(
        &id,
        request.contract_hours_per_month,
        request.min_shifts_per_month,
        request.max_shifts_per_month,
    )?;
    Ok(Json(doctor))
}

/// DELETE /doctors/{id} - Deactivate a doctor.
async fn deactivate_doctor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.deactivate_doctor(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /shifts - List shifts in start order.
async fn list_shifts(State(state): State<Arc<AppState>>) -> Json<Vec<Shift>> {
    Json(state.store.list_shifts())
}

/// POST /shifts/generate - Replace stored shifts with one generated month.
async fn generate_shifts(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateShiftsRequest>,
) -> ApiResult<Json<GenerateShiftsResponse>> {
    let generator = ShiftGenerator::new(MonthTemplates::default(), state.config().rules.night_rule);
    let shifts = generator.generate_month(request.year, request.month)?;
    let created = state.store.replace_month_shifts(shifts)?;
    info!(year = request.year, month = request.month, created, "Shifts generated");
    Ok(Json(GenerateShiftsResponse {
        year: request.year,
        month: request.month,
        created,
    }))
}

/// GET /leave - List leave intervals.
async fn list_leave(State(state): State<Arc<AppState>>) -> Json<Vec<LeaveInterval>> {
    Json(state.store.list_leave())
}

/// POST /leave - Record a leave interval.
async fn create_leave(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateLeaveRequest>,
) -> ApiResult<(StatusCode, Json<LeaveInterval>)> {
    let leave = state.store.create_leave(
        &request.doctor_id,
        request.start_date,
        request.end_date,
        request.leave_type,
        request.reason,
    )?;
    Ok((StatusCode::CREATED, Json(leave)))
}

/// DELETE /leave/{id} - Remove a leave interval.
async fn delete_leave(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> ApiResult<StatusCode> {
    state.store.delete_leave(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /feasibility - Pre-solve feasibility of the stored records.
async fn feasibility(State(state): State<Arc<AppState>>) -> Json<FeasibilityReport> {
    let snapshot = state.store.snapshot();
    Json(analyze_feasibility(
        &snapshot.doctors,
        &snapshot.shifts,
        &snapshot.leave,
    ))
}

// ============================================================================
// Rosters
// ============================================================================

/// POST /rosters - Start optimizing the stored records.
/// Returns the job ID as plain text.
async fn create_roster(State(state): State<Arc<AppState>>) -> String {
    let id = Uuid::new_v4().to_string();
    let job = state.service.create_job(id.clone(), state.store.snapshot());
    state.service.start_solving(job);
    id
}

/// POST /rosters/naive - Build a round-robin roster from the stored records.
async fn create_naive_roster(State(state): State<Arc<AppState>>) -> Json<RosterDto> {
    let id = Uuid::new_v4().to_string();
    let job = state.service.create_job(id, state.store.snapshot());
    state.service.run_naive(&job);
    let guard = job.read();
    Json(RosterDto::from_job(&guard, &state.config().rules))
}

/// GET /rosters - List all roster job IDs.
async fn list_rosters(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.service.list_jobs())
}

fn find_job(state: &AppState, id: &str) -> ApiResult<Arc<RwLock<RosterJob>>> {
    state
        .service
        .get_job(id)
        .ok_or_else(|| RosterError::not_found(format!("roster {}", id)))
}

fn finished(job: &RosterJob) -> ApiResult<&Roster> {
    job.roster
        .as_ref()
        .ok_or_else(|| RosterError::not_found(format!("no finished roster for job {}", job.id)))
}

/// GET /rosters/{id} - Get a roster job's current state.
async fn get_roster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<RosterDto>> {
    let job = find_job(&state, &id)?;
    let guard = job.read();
    Ok(Json(RosterDto::from_job(&guard, &state.config().rules)))
}

/// GET /rosters/{id}/status - Get a roster job's status.
async fn get_roster_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let job = find_job(&state, &id)?;
    let guard = job.read();
    Ok(Json(StatusResponse {
        solver_status: guard.status.as_str().to_string(),
        error: guard.error.clone(),
    }))
}

/// GET /rosters/{id}/workload - Workload, burnout and hours of a finished roster.
async fn get_roster_workload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<WorkloadResponse>> {
    let job = find_job(&state, &id)?;
    let guard = job.read();
    let roster = finished(&guard)?;

    let stats = WorkloadAnalyzer::new(state.config()).analyze_roster(roster);
    let hours = hours_summary(&roster.doctors, &stats);
    Ok(Json(WorkloadResponse {
        roster_id: id,
        doctors: stats.into_values().collect(),
        hours,
    }))
}

/// GET /rosters/{id}/on-duty?at= - Doctors working at an instant.
async fn get_on_duty(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OnDutyQuery>,
) -> ApiResult<Json<Vec<AssignmentDto>>> {
    let job = find_job(&state, &id)?;
    let guard = job.read();
    let roster = finished(&guard)?;
    let on_duty = roster
        .on_duty_at(query.at)
        .into_iter()
        .map(|(doctor, shift)| AssignmentDto::new(doctor, shift))
        .collect();
    Ok(Json(on_duty))
}

/// GET /rosters/{id}/doctors/{doctor_id}/upcoming?from=&days= - A doctor's next shifts.
async fn get_upcoming_shifts(
    State(state): State<Arc<AppState>>,
    Path((id, doctor_id)): Path<(String, String)>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Json<Vec<Shift>>> {
    let job = find_job(&state, &id)?;
    let guard = job.read();
    let roster = finished(&guard)?;
    if roster.doctor(&doctor_id).is_none() {
        return Err(RosterError::not_found(format!("doctor {} in roster {}", doctor_id, id)));
    }
    let shifts = roster
        .upcoming_shifts(&doctor_id, query.from, query.days)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(shifts))
}

/// DELETE /rosters/{id} - Remove a roster job.
async fn delete_roster(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> StatusCode {
    match state.service.remove_job(&id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}
