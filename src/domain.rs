//! Domain model for emergency department rostering.
//!
//! # Overview
//!
//! - [`Doctor`]: a rosterable clinician with contract hours and monthly shift bounds
//! - [`Shift`]: a staffing slot with derived duration, weekend and night flags
//! - [`LeaveInterval`]: an inclusive date range during which a doctor cannot work
//! - [`Assignment`]: one (doctor, shift) pairing
//! - [`Roster`]: the doctors, shifts and assignments of one run
//!
//! # Conventions
//!
//! A shift belongs to the calendar date it starts on. An overnight shift from
//! Friday 22:00 to Saturday 09:00 is a Friday shift for weekend, streak and
//! leave purposes. Night classification is decided once, when the shift is
//! built, and read through [`Shift::is_night`] everywhere else.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::config::ObjectiveStrategy;
use crate::error::{Result, RosterError};

/// Default monthly contract hours for a new doctor.
pub const DEFAULT_CONTRACT_HOURS: f64 = 175.0;
pub const DEFAULT_MIN_SHIFTS: u32 = 16;
pub const DEFAULT_MAX_SHIFTS: u32 = 18;
/// Default shift intensity on the 1–5 scale.
pub const DEFAULT_INTENSITY: u8 = 3;

/// Elapsed hours from `from` to `to` (negative when `to` is earlier).
pub fn hours_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    (to - from).num_seconds() as f64 / 3600.0
}

// ============================================================================
// Doctor
// ============================================================================

/// Clinical grade. Carried for reporting; the optimizer ignores it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoctorLevel {
    Junior,
    #[default]
    MedicalOfficer,
    Registrar,
    Consultant,
    CommunityService,
}

impl DoctorLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorLevel::Junior => "junior",
            DoctorLevel::MedicalOfficer => "medical_officer",
            DoctorLevel::Registrar => "registrar",
            DoctorLevel::Consultant => "consultant",
            DoctorLevel::CommunityService => "community_service",
        }
    }
}

impl FromStr for DoctorLevel {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "junior" | "intern" => Ok(DoctorLevel::Junior),
            "mo" | "medical_officer" => Ok(DoctorLevel::MedicalOfficer),
            "registrar" | "reg" => Ok(DoctorLevel::Registrar),
            "consultant" => Ok(DoctorLevel::Consultant),
            "cso" | "community_service" => Ok(DoctorLevel::CommunityService),
            other => Err(RosterError::invalid(format!("unknown doctor level '{}'", other))),
        }
    }
}

/// A doctor who can be assigned to shifts.
///
/// # Examples
///
/// ```
/// use ed_rostering::domain::{Doctor, DoctorLevel};
///
/// let doctor = Doctor::new("D01", "Amy Cole")
///     .with_level(DoctorLevel::Registrar)
///     .with_contract_hours(160.0)
///     .with_shift_bounds(12, 16);
///
/// assert!(doctor.validate().is_ok());
/// assert!(doctor.active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    /// Stable external identifier (e.g. `D07`).
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub level: DoctorLevel,
    /// Team grouping. Unused by the optimizer.
    #[serde(default)]
    pub firm: Option<u32>,
    pub contract_hours_per_month: f64,
    pub min_shifts_per_month: u32,
    pub max_shifts_per_month: u32,
    /// Soft-delete flag. Inactive doctors are never rostered.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Doctor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level: DoctorLevel::default(),
            firm: None,
            contract_hours_per_month: DEFAULT_CONTRACT_HOURS,
            min_shifts_per_month: DEFAULT_MIN_SHIFTS,
            max_shifts_per_month: DEFAULT_MAX_SHIFTS,
            active: true,
        }
    }

    pub fn with_level(mut self, level: DoctorLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_firm(mut self, firm: u32) -> Self {
        self.firm = Some(firm);
        self
    }

    pub fn with_contract_hours(mut self, hours: f64) -> Self {
        self.contract_hours_per_month = hours;
        self
    }

    pub fn with_shift_bounds(mut self, min: u32, max: u32) -> Self {
        self.min_shifts_per_month = min;
        self.max_shifts_per_month = max;
        self
    }

    /// Checks identifier, contract hours and shift bounds.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(RosterError::invalid(format!(
                "doctor '{}' has an empty id",
                self.name
            )));
        }
        if !self.contract_hours_per_month.is_finite() || self.contract_hours_per_month < 0.0 {
            return Err(RosterError::invalid(format!(
                "doctor {} has invalid contract hours {}",
                self.id, self.contract_hours_per_month
            )));
        }
        if self.min_shifts_per_month > self.max_shifts_per_month {
            return Err(RosterError::invalid(format!(
                "doctor {} has min_shifts_per_month {} > max_shifts_per_month {}",
                self.id, self.min_shifts_per_month, self.max_shifts_per_month
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Shift
// ============================================================================

/// The canonical night predicate: a shift is a night shift when it starts at
/// or after `start_hour`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightRule {
    pub start_hour: u32,
}

impl Default for NightRule {
    fn default() -> Self {
        Self { start_hour: 21 }
    }
}

impl NightRule {
    pub fn is_night(&self, start: NaiveDateTime) -> bool {
        start.hour() >= self.start_hour
    }
}

/// ISO-8601 (year, week) pair used to group weekends and weekday nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct IsoWeekKey {
    pub year: i32,
    pub week: u32,
}

impl IsoWeekKey {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for IsoWeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// A staffing slot that needs between `min_doctors` and `max_doctors` doctors.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, NaiveTime};
/// use ed_rostering::domain::Shift;
///
/// // Friday night, rolling over into Saturday morning
/// let date = NaiveDate::from_ymd_opt(2026, 2, 6).unwrap();
/// let shift = Shift::on_date(
///     "2026-02-06-04",
///     "Night 22-09",
///     date,
///     NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     3,
///     3,
/// )
/// .unwrap();
///
/// assert_eq!(shift.duration_hours, 11.0);
/// assert!(shift.is_night);
/// assert!(!shift.is_weekend); // belongs to Friday, its start date
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: String,
    pub name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub duration_hours: f64,
    pub is_weekend: bool,
    pub is_night: bool,
    /// Ordinal workload intensity, 1 (light) to 5 (heavy).
    pub intensity: u8,
    pub min_doctors: u32,
    pub max_doctors: u32,
}

impl Shift {
    /// Creates a shift, classifying it with the default [`NightRule`].
    ///
    /// Fails when `end <= start` or `min_doctors > max_doctors`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        min_doctors: u32,
        max_doctors: u32,
    ) -> Result<Self> {
        let id = id.into();
        if end <= start {
            return Err(RosterError::invalid(format!(
                "shift {} ends at {} which is not after its start {}",
                id, end, start
            )));
        }
        if min_doctors > max_doctors {
            return Err(RosterError::invalid(format!(
                "shift {} has min_doctors {} > max_doctors {}",
                id, min_doctors, max_doctors
            )));
        }

        let rule = NightRule::default();
        Ok(Self {
            id,
            name: name.into(),
            start,
            end,
            duration_hours: hours_between(start, end),
            is_weekend: matches!(start.weekday(), Weekday::Sat | Weekday::Sun),
            is_night: rule.is_night(start),
            intensity: DEFAULT_INTENSITY,
            min_doctors,
            max_doctors,
        })
    }

    /// Creates a shift from wall-clock times on `date`. An end time at or
    /// before the start time rolls over to the next day.
    pub fn on_date(
        id: impl Into<String>,
        name: impl Into<String>,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        min_doctors: u32,
        max_doctors: u32,
    ) -> Result<Self> {
        let start = NaiveDateTime::new(date, start_time);
        let mut end = NaiveDateTime::new(date, end_time);
        if end <= start {
            end += Duration::days(1);
        }
        Self::new(id, name, start, end, min_doctors, max_doctors)
    }

    /// Sets the intensity, clamped to 1–5.
    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity.clamp(1, 5);
        self
    }

    /// Re-derives `is_night` under a non-default rule.
    pub fn classified_by(mut self, rule: NightRule) -> Self {
        self.is_night = rule.is_night(self.start);
        self
    }

    /// The calendar date the shift belongs to (its start date).
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn weekday(&self) -> Weekday {
        self.start.weekday()
    }

    pub fn iso_week(&self) -> IsoWeekKey {
        IsoWeekKey::of(self.date())
    }

    pub fn overlaps(&self, other: &Shift) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Hours between the earlier shift's end and the later shift's start.
    /// `None` when the two overlap.
    pub fn rest_gap_hours(&self, other: &Shift) -> Option<f64> {
        if self.end <= other.start {
            Some(hours_between(self.end, other.start))
        } else if other.end <= self.start {
            Some(hours_between(other.end, self.start))
        } else {
            None
        }
    }
}

// ============================================================================
// Leave
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    #[default]
    Annual,
    Sick,
    Study,
    Other,
}

impl FromStr for LeaveType {
    type Err = RosterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "annual" => Ok(LeaveType::Annual),
            "sick" => Ok(LeaveType::Sick),
            "study" => Ok(LeaveType::Study),
            "other" => Ok(LeaveType::Other),
            other => Err(RosterError::invalid(format!("unknown leave type '{}'", other))),
        }
    }
}

/// An inclusive date range during which a doctor is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveInterval {
    /// Store-issued identifier; `None` until persisted.
    #[serde(default)]
    pub id: Option<u64>,
    pub doctor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub leave_type: LeaveType,
    #[serde(default)]
    pub reason: Option<String>,
}

impl LeaveInterval {
    pub fn new(
        doctor_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        leave_type: LeaveType,
    ) -> Result<Self> {
        let leave = Self {
            id: None,
            doctor_id: doctor_id.into(),
            start_date,
            end_date,
            leave_type,
            reason: None,
        };
        leave.validate()?;
        Ok(leave)
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        self.reason = if reason.trim().is_empty() { None } else { Some(reason) };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.end_date < self.start_date {
            return Err(RosterError::invalid(format!(
                "leave for doctor {} ends {} before it starts {}",
                self.doctor_id, self.end_date, self.start_date
            )));
        }
        Ok(())
    }

    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Per-doctor index of leave ranges.
pub struct LeaveCalendar<'a> {
    by_doctor: HashMap<&'a str, Vec<&'a LeaveInterval>>,
}

impl<'a> LeaveCalendar<'a> {
    pub fn new(leave: &'a [LeaveInterval]) -> Self {
        let mut by_doctor: HashMap<&'a str, Vec<&'a LeaveInterval>> = HashMap::new();
        for interval in leave {
            by_doctor
                .entry(interval.doctor_id.as_str())
                .or_default()
                .push(interval);
        }
        Self { by_doctor }
    }

    pub fn is_on_leave(&self, doctor_id: &str, date: NaiveDate) -> bool {
        self.by_doctor
            .get(doctor_id)
            .is_some_and(|periods| periods.iter().any(|p| p.covers(date)))
    }
}

// ============================================================================
// Assignment & Roster
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub doctor_id: String,
    pub shift_id: String,
}

impl Assignment {
    pub fn new(doctor_id: impl Into<String>, shift_id: impl Into<String>) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            shift_id: shift_id.into(),
        }
    }
}

/// How a roster was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RosterOrigin {
    /// Solved against every hard constraint.
    Optimized {
        objective: f64,
        strategy: ObjectiveStrategy,
    },
    /// Round-robin fallback. Hard constraints were not checked.
    Naive,
    /// No doctors or no shifts; nothing to assign.
    Empty,
}

impl RosterOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            RosterOrigin::Optimized { .. } => "optimized",
            RosterOrigin::Naive => "naive/unvalidated",
            RosterOrigin::Empty => "empty",
        }
    }
}

/// The doctors, shifts and assignments of one roster run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roster {
    pub doctors: Vec<Doctor>,
    pub shifts: Vec<Shift>,
    pub assignments: Vec<Assignment>,
    pub origin: RosterOrigin,
}

impl Roster {
    pub fn empty(doctors: Vec<Doctor>, shifts: Vec<Shift>) -> Self {
        Self {
            doctors,
            shifts,
            assignments: Vec::new(),
            origin: RosterOrigin::Empty,
        }
    }

    /// True only for rosters produced by the optimizer.
    pub fn is_validated(&self) -> bool {
        matches!(self.origin, RosterOrigin::Optimized { .. })
    }

    pub fn doctor(&self, id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn shift(&self, id: &str) -> Option<&Shift> {
        self.shifts.iter().find(|s| s.id == id)
    }

    /// Number of doctors assigned to `shift_id`.
    pub fn coverage(&self, shift_id: &str) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.shift_id == shift_id)
            .count()
    }

    /// A doctor's assigned shifts in start order.
    pub fn shifts_for_doctor(&self, doctor_id: &str) -> Vec<&Shift> {
        let by_id: HashMap<&str, &Shift> =
            self.shifts.iter().map(|s| (s.id.as_str(), s)).collect();
        let mut assigned: Vec<&Shift> = self
            .assignments
            .iter()
            .filter(|a| a.doctor_id == doctor_id)
            .filter_map(|a| by_id.get(a.shift_id.as_str()).copied())
            .collect();
        assigned.sort_by_key(|s| s.start);
        assigned
    }

    /// Doctors working at `instant`, with the shift they are on.
    pub fn on_duty_at(&self, instant: NaiveDateTime) -> Vec<(&Doctor, &Shift)> {
        let mut on_duty = Vec::new();
        for assignment in &self.assignments {
            let Some(shift) = self.shift(&assignment.shift_id) else {
                continue;
            };
            if shift.start <= instant && instant < shift.end {
                if let Some(doctor) = self.doctor(&assignment.doctor_id) {
                    on_duty.push((doctor, shift));
                }
            }
        }
        on_duty.sort_by(|a, b| a.1.start.cmp(&b.1.start).then(a.0.id.cmp(&b.0.id)));
        on_duty
    }

    /// A doctor's shifts starting within `days` days from `from` (inclusive).
    pub fn upcoming_shifts(&self, doctor_id: &str, from: NaiveDate, days: i64) -> Vec<&Shift> {
        let until = from + Duration::days(days);
        self.shifts_for_doctor(doctor_id)
            .into_iter()
            .filter(|s| from <= s.date() && s.date() <= until)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_shift_derives_flags() {
        // 2026-02-07 is a Saturday
        let day = Shift::new("S1", "Day", dt(2026, 2, 7, 7), dt(2026, 2, 7, 19), 2, 2).unwrap();
        assert!(day.is_weekend);
        assert!(!day.is_night);
        assert_eq!(day.duration_hours, 12.0);

        let night = Shift::new("S2", "Night", dt(2026, 2, 7, 21), dt(2026, 2, 8, 9), 3, 3).unwrap();
        assert!(night.is_night);
        assert!(night.is_weekend);
        assert_eq!(night.date(), NaiveDate::from_ymd_opt(2026, 2, 7).unwrap());
    }

    #[test]
    fn test_shift_rejects_bad_times_and_bounds() {
        assert!(Shift::new("S1", "Bad", dt(2026, 2, 7, 9), dt(2026, 2, 7, 9), 1, 1).is_err());
        assert!(Shift::new("S2", "Bad", dt(2026, 2, 7, 9), dt(2026, 2, 7, 17), 2, 1).is_err());
    }

    #[test]
    fn test_on_date_rolls_overnight_end() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
        let shift = Shift::on_date(
            "S1",
            "Late",
            date,
            NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(1, 0, 0).unwrap(),
            3,
            4,
        )
        .unwrap();
        assert_eq!(shift.end, dt(2026, 2, 3, 1));
        assert_eq!(shift.duration_hours, 11.0);
        // Starts at 14:00, so not a night shift under the start-hour rule
        assert!(!shift.is_night);
    }

    #[test]
    fn test_custom_night_rule() {
        let shift = Shift::new("S1", "Evening", dt(2026, 2, 2, 20), dt(2026, 2, 3, 6), 1, 1)
            .unwrap()
            .classified_by(NightRule { start_hour: 20 });
        assert!(shift.is_night);
    }

    #[test]
    fn test_rest_gap_and_overlap() {
        let a = Shift::new("A", "A", dt(2026, 2, 2, 7), dt(2026, 2, 2, 18), 1, 1).unwrap();
        let b = Shift::new("B", "B", dt(2026, 2, 3, 7), dt(2026, 2, 3, 18), 1, 1).unwrap();
        let c = Shift::new("C", "C", dt(2026, 2, 2, 14), dt(2026, 2, 3, 1), 1, 1).unwrap();

        assert_eq!(a.rest_gap_hours(&b), Some(13.0));
        assert_eq!(b.rest_gap_hours(&a), Some(13.0));
        assert!(a.overlaps(&c));
        assert_eq!(a.rest_gap_hours(&c), None);
    }

    #[test]
    fn test_doctor_validation() {
        assert!(Doctor::new("D01", "Amy").validate().is_ok());
        assert!(Doctor::new("D01", "Amy").with_shift_bounds(5, 4).validate().is_err());
        assert!(Doctor::new("", "Amy").validate().is_err());
        assert!(Doctor::new("D01", "Amy").with_contract_hours(-1.0).validate().is_err());
    }

    #[test]
    fn test_leave_validation_and_coverage() {
        let start = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
        assert!(LeaveInterval::new("D01", end, start, LeaveType::Sick).is_err());

        let leave = [LeaveInterval::new("D01", start, end, LeaveType::Annual).unwrap()];
        let calendar = LeaveCalendar::new(&leave);
        assert!(calendar.is_on_leave("D01", start));
        assert!(calendar.is_on_leave("D01", end));
        assert!(!calendar.is_on_leave("D01", end.succ_opt().unwrap()));
        assert!(!calendar.is_on_leave("D02", start));
    }

    #[test]
    fn test_level_and_leave_type_parsing() {
        assert_eq!("MO".parse::<DoctorLevel>().unwrap(), DoctorLevel::MedicalOfficer);
        assert_eq!(
            "community-service".parse::<DoctorLevel>().unwrap(),
            DoctorLevel::CommunityService
        );
        assert!("surgeon".parse::<DoctorLevel>().is_err());
        assert_eq!("Study".parse::<LeaveType>().unwrap(), LeaveType::Study);
    }

    #[test]
    fn test_roster_duty_lookups() {
        let doctors = vec![Doctor::new("D01", "Amy"), Doctor::new("D02", "Beth")];
        let shifts = vec![
            Shift::new("S1", "Day", dt(2026, 2, 2, 7), dt(2026, 2, 2, 18), 1, 1).unwrap(),
            Shift::new("S2", "Night", dt(2026, 2, 2, 22), dt(2026, 2, 3, 9), 1, 1).unwrap(),
            Shift::new("S3", "Day", dt(2026, 2, 12, 7), dt(2026, 2, 12, 18), 1, 1).unwrap(),
        ];
        let roster = Roster {
            doctors,
            shifts,
            assignments: vec![
                Assignment::new("D01", "S1"),
                Assignment::new("D02", "S2"),
                Assignment::new("D01", "S3"),
            ],
            origin: RosterOrigin::Naive,
        };

        let on_duty = roster.on_duty_at(dt(2026, 2, 3, 2));
        assert_eq!(on_duty.len(), 1);
        assert_eq!(on_duty[0].0.id, "D02");

        let upcoming = roster.upcoming_shifts("D01", NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(), 7);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, "S1");

        assert_eq!(roster.coverage("S2"), 1);
        assert!(!roster.is_validated());
        assert_eq!(roster.origin.label(), "naive/unvalidated");
    }
}
