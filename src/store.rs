//! Record sources for doctors, shifts and leave, with an in-memory store.
//!
//! The optimizer never reads the store directly. Callers take a
//! [`Snapshot`] and hand its vectors to the core, so a solve sees one
//! consistent view even while records are edited.

use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Doctor, DoctorLevel, LeaveInterval, LeaveType, Shift, DEFAULT_CONTRACT_HOURS, DEFAULT_MAX_SHIFTS,
    DEFAULT_MIN_SHIFTS,
};
use crate::error::{Result, RosterError};

/// Fields of a doctor to be created. The store issues the id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    #[serde(default)]
    pub level: DoctorLevel,
    #[serde(default)]
    pub firm: Option<u32>,
    #[serde(default = "default_contract_hours")]
    pub contract_hours_per_month: f64,
    #[serde(default = "default_min_shifts")]
    pub min_shifts_per_month: u32,
    #[serde(default = "default_max_shifts")]
    pub max_shifts_per_month: u32,
}

fn default_contract_hours() -> f64 {
    DEFAULT_CONTRACT_HOURS
}

fn default_min_shifts() -> u32 {
    DEFAULT_MIN_SHIFTS
}

fn default_max_shifts() -> u32 {
    DEFAULT_MAX_SHIFTS
}

impl NewDoctor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: DoctorLevel::default(),
            firm: None,
            contract_hours_per_month: DEFAULT_CONTRACT_HOURS,
            min_shifts_per_month: DEFAULT_MIN_SHIFTS,
            max_shifts_per_month: DEFAULT_MAX_SHIFTS,
        }
    }
}

pub trait DoctorSource {
    fn list_doctors(&self, active_only: bool) -> Vec<Doctor>;
    fn create_doctor(&self, fields: NewDoctor) -> Result<Doctor>;
    fn update_doctor_bounds(
        &self,
        id: &str,
        contract_hours: f64,
        min_shifts: u32,
        max_shifts: u32,
    ) -> Result<Doctor>;
    /// Soft delete: the doctor stays listed but is never rostered.
    fn deactivate_doctor(&self, id: &str) -> Result<()>;
}

pub trait ShiftSource {
    /// Deletes every stored shift and inserts `shifts`.
    fn replace_month_shifts(&self, shifts: Vec<Shift>) -> Result<usize>;
    /// Shifts ordered by start.
    fn list_shifts(&self) -> Vec<Shift>;
}

pub trait LeaveSource {
    fn list_leave(&self) -> Vec<LeaveInterval>;
    fn create_leave(
        &self,
        doctor_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        leave_type: LeaveType,
        reason: Option<String>,
    ) -> Result<LeaveInterval>;
    fn delete_leave(&self, id: u64) -> Result<()>;
}

/// One consistent view of every record.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub doctors: Vec<Doctor>,
    pub shifts: Vec<Shift>,
    pub leave: Vec<LeaveInterval>,
}

#[derive(Debug, Default)]
struct StoreState {
    doctors: Vec<Doctor>,
    shifts: Vec<Shift>,
    leave: Vec<LeaveInterval>,
    next_doctor: u32,
    next_leave: u64,
}

/// Thread-safe in-memory record store. Each write holds the lock for the
/// whole logical operation.
///
/// # Examples
///
/// ```
/// use ed_rostering::store::{DoctorSource, MemoryStore, NewDoctor};
///
/// let store = MemoryStore::new();
/// let amy = store.create_doctor(NewDoctor::named("Amy Cole")).unwrap();
/// let beth = store.create_doctor(NewDoctor::named("Beth Ray")).unwrap();
/// assert_eq!((amy.id.as_str(), beth.id.as_str()), ("D01", "D02"));
///
/// store.deactivate_doctor("D01").unwrap();
/// assert_eq!(store.list_doctors(true).len(), 1);
/// assert_eq!(store.list_doctors(false).len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every record, e.g. with a demo dataset. Doctor ids continue
    /// after the highest `D<n>` id loaded.
    pub fn load(&self, snapshot: Snapshot) {
        let mut state = self.state.write();
        state.next_doctor = snapshot
            .doctors
            .iter()
            .filter_map(|d| d.id.strip_prefix('D').and_then(|n| n.parse::<u32>().ok()))
            .max()
            .unwrap_or(0);
        let mut leave = snapshot.leave;
        let mut next_leave = leave.iter().filter_map(|l| l.id).max().unwrap_or(0);
        for interval in &mut leave {
            if interval.id.is_none() {
                next_leave += 1;
                interval.id = Some(next_leave);
            }
        }
        state.next_leave = next_leave;
        state.doctors = snapshot.doctors;
        state.shifts = sorted(snapshot.shifts);
        state.leave = leave;
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.read();
        Snapshot {
            doctors: state.doctors.clone(),
            shifts: state.shifts.clone(),
            leave: state.leave.clone(),
        }
    }
}

fn sorted(mut shifts: Vec<Shift>) -> Vec<Shift> {
    shifts.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    shifts
}

impl DoctorSource for MemoryStore {
    fn list_doctors(&self, active_only: bool) -> Vec<Doctor> {
        self.state
            .read()
            .doctors
            .iter()
            .filter(|d| !active_only || d.active)
            .cloned()
            .collect()
    }

    fn create_doctor(&self, fields: NewDoctor) -> Result<Doctor> {
        if fields.name.trim().is_empty() {
            return Err(RosterError::invalid("doctor name must not be empty"));
        }
        let mut state = self.state.write();
        let id = format!("D{:02}", state.next_doctor + 1);
        let mut doctor = Doctor::new(id, fields.name.trim())
            .with_level(fields.level)
            .with_contract_hours(fields.contract_hours_per_month)
            .with_shift_bounds(fields.min_shifts_per_month, fields.max_shifts_per_month);
        doctor.firm = fields.firm;
        doctor.validate()?;

        state.next_doctor += 1;
        state.doctors.push(doctor.clone());
        Ok(doctor)
    }

    fn update_doctor_bounds(
        &self,
        id: &str,
        contract_hours: f64,
        min_shifts: u32,
        max_shifts: u32,
    ) -> Result<Doctor> {
        let mut state = self.state.write();
        let doctor = state
            .doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RosterError::not_found(format!("doctor {}", id)))?;

        let updated = doctor
            .clone()
            .with_contract_hours(contract_hours)
            .with_shift_bounds(min_shifts, max_shifts);
        updated.validate()?;
        *doctor = updated.clone();
        Ok(updated)
    }

    fn deactivate_doctor(&self, id: &str) -> Result<()> {
        let mut state = self.state.write();
        let doctor = state
            .doctors
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RosterError::not_found(format!("doctor {}", id)))?;
        doctor.active = false;
        Ok(())
    }
}

impl ShiftSource for MemoryStore {
    fn replace_month_shifts(&self, shifts: Vec<Shift>) -> Result<usize> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = shifts.iter().find(|s| !seen.insert(s.id.as_str())) {
            return Err(RosterError::invalid(format!("duplicate shift id {}", dup.id)));
        }
        let count = shifts.len();
        self.state.write().shifts = sorted(shifts);
        Ok(count)
    }

    fn list_shifts(&self) -> Vec<Shift> {
        self.state.read().shifts.clone()
    }
}

impl LeaveSource for MemoryStore {
    fn list_leave(&self) -> Vec<LeaveInterval> {
        self.state.read().leave.clone()
    }

    fn create_leave(
        &self,
        doctor_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        leave_type: LeaveType,
        reason: Option<String>,
    ) -> Result<LeaveInterval> {
        let mut interval = LeaveInterval::new(doctor_id, start_date, end_date, leave_type)?;
        if let Some(reason) = reason {
            interval = interval.with_reason(reason);
        }

        let mut state = self.state.write();
        if !state.doctors.iter().any(|d| d.id == doctor_id) {
            return Err(RosterError::invalid(format!(
                "leave references unknown doctor '{}'",
                doctor_id
            )));
        }
        state.next_leave += 1;
        interval.id = Some(state.next_leave);
        state.leave.push(interval.clone());
        Ok(interval)
    }

    fn delete_leave(&self, id: u64) -> Result<()> {
        let mut state = self.state.write();
        let before = state.leave.len();
        state.leave.retain(|l| l.id != Some(id));
        if state.leave.len() == before {
            return Err(RosterError::not_found(format!("leave {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, d).unwrap()
    }

    fn at(d: u32, h: u32) -> NaiveDateTime {
        date(d).and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn test_create_uses_defaults_and_sequential_ids() {
        let store = MemoryStore::new();
        let amy = store.create_doctor(NewDoctor::named("  Amy  ")).unwrap();

        assert_eq!(amy.id, "D01");
        assert_eq!(amy.name, "Amy");
        assert_eq!(amy.contract_hours_per_month, 175.0);
        assert_eq!((amy.min_shifts_per_month, amy.max_shifts_per_month), (16, 18));
        assert_eq!(amy.level, DoctorLevel::MedicalOfficer);

        assert!(store.create_doctor(NewDoctor::named(" ")).is_err());
        let mut bad = NewDoctor::named("Beth");
        bad.min_shifts_per_month = 20;
        assert!(store.create_doctor(bad).is_err());
        // Failed creations do not consume ids
        assert_eq!(store.create_doctor(NewDoctor::named("Cara")).unwrap().id, "D02");
    }

    #[test]
    fn test_update_bounds() {
        let store = MemoryStore::new();
        store.create_doctor(NewDoctor::named("Amy")).unwrap();

        let updated = store.update_doctor_bounds("D01", 150.0, 10, 14).unwrap();
        assert_eq!(updated.contract_hours_per_month, 150.0);
        assert_eq!(store.list_doctors(false)[0].max_shifts_per_month, 14);

        assert!(matches!(
            store.update_doctor_bounds("D01", 150.0, 15, 14),
            Err(RosterError::InvalidInput(_))
        ));
        assert_eq!(store.list_doctors(false)[0].min_shifts_per_month, 10);
        assert!(matches!(
            store.update_doctor_bounds("D99", 150.0, 1, 2),
            Err(RosterError::NotFound(_))
        ));
    }

    #[test]
    fn test_replace_shifts_wipes_and_sorts() {
        let store = MemoryStore::new();
        let first = vec![Shift::new("A", "A", at(2, 7), at(2, 18), 1, 1).unwrap()];
        store.replace_month_shifts(first).unwrap();

        let second = vec![
            Shift::new("C", "C", at(4, 7), at(4, 18), 1, 1).unwrap(),
            Shift::new("B", "B", at(3, 7), at(3, 18), 1, 1).unwrap(),
        ];
        assert_eq!(store.replace_month_shifts(second).unwrap(), 2);

        let ids: Vec<String> = store.list_shifts().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["B", "C"]);
    }

    #[test]
    fn test_leave_lifecycle() {
        let store = MemoryStore::new();
        store.create_doctor(NewDoctor::named("Amy")).unwrap();

        let leave = store
            .create_leave("D01", date(3), date(5), LeaveType::Study, Some("Course".to_string()))
            .unwrap();
        assert_eq!(leave.id, Some(1));
        assert_eq!(leave.reason.as_deref(), Some("Course"));

        assert!(store
            .create_leave("D07", date(3), date(5), LeaveType::Annual, None)
            .is_err());
        assert!(store
            .create_leave("D01", date(5), date(3), LeaveType::Annual, None)
            .is_err());

        store.delete_leave(1).unwrap();
        assert!(store.list_leave().is_empty());
        assert!(matches!(store.delete_leave(1), Err(RosterError::NotFound(_))));
    }

    #[test]
    fn test_load_continues_ids() {
        let store = MemoryStore::new();
        store.load(Snapshot {
            doctors: vec![Doctor::new("D01", "Amy"), Doctor::new("D07", "Beth")],
            shifts: Vec::new(),
            leave: vec![LeaveInterval::new("D01", date(3), date(3), LeaveType::Sick).unwrap()],
        });

        assert_eq!(store.create_doctor(NewDoctor::named("Cara")).unwrap().id, "D08");
        assert_eq!(store.list_leave()[0].id, Some(1));
        let next = store
            .create_leave("D07", date(9), date(9), LeaveType::Other, None)
            .unwrap();
        assert_eq!(next.id, Some(2));
    }
}
