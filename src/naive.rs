//! Round-robin fallback allocator.
//!
//! Fills each shift's minimum staffing by cycling through doctors. Rest,
//! overlap, leave and weekend rules are not checked; the roster is labelled
//! naive/unvalidated and can be inspected with [`crate::audit::audit_roster`].

use tracing::{info, warn};

use crate::domain::{Assignment, Doctor, Roster, RosterOrigin, Shift};

/// Assigns `min_doctors` doctors to every shift, round-robin over active
/// doctors, skipping doctors who reached `max_shifts_per_month`.
///
/// When every doctor is at their maximum the shift is left understaffed.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ed_rostering::domain::{Doctor, Shift};
/// use ed_rostering::naive::generate_naive_roster;
///
/// let day = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();
/// let shift = Shift::new(
///     "S1",
///     "Day",
///     day.and_hms_opt(7, 0, 0).unwrap(),
///     day.and_hms_opt(18, 0, 0).unwrap(),
///     2,
///     2,
/// )
/// .unwrap();
/// let doctors = vec![Doctor::new("D01", "Amy"), Doctor::new("D02", "Beth")];
///
/// let roster = generate_naive_roster(&doctors, &[shift]);
/// assert_eq!(roster.assignments.len(), 2);
/// assert!(!roster.is_validated());
/// ```
pub fn generate_naive_roster(doctors: &[Doctor], shifts: &[Shift]) -> Roster {
    let doctors: Vec<Doctor> = doctors.iter().filter(|d| d.active).cloned().collect();
    let n = doctors.len();
    if n == 0 {
        return Roster {
            doctors,
            shifts: shifts.to_vec(),
            assignments: Vec::new(),
            origin: RosterOrigin::Naive,
        };
    }

    let mut loads = vec![0u32; n];
    let mut cursor = 0usize;
    let mut assignments = Vec::new();
    let mut understaffed = 0usize;

    for shift in shifts {
        let mut on_shift: Vec<usize> = Vec::with_capacity(shift.min_doctors as usize);
        for _ in 0..shift.min_doctors {
            // One full lap looking for a doctor with spare capacity
            let pick = (0..n)
                .map(|offset| (cursor + offset) % n)
                .find(|&d| loads[d] < doctors[d].max_shifts_per_month && !on_shift.contains(&d));
            let Some(d) = pick else {
                understaffed += 1;
                break;
            };
            loads[d] += 1;
            on_shift.push(d);
            assignments.push(Assignment::new(doctors[d].id.clone(), shift.id.clone()));
            cursor = (d + 1) % n;
        }
    }

    if understaffed > 0 {
        warn!(
            understaffed,
            "Naive allocator ran out of doctor capacity; some shifts are below minimum"
        );
    }
    info!(
        doctors = n,
        shifts = shifts.len(),
        assignments = assignments.len(),
        "Naive roster generated"
    );

    Roster {
        doctors,
        shifts: shifts.to_vec(),
        assignments,
        origin: RosterOrigin::Naive,
    }
}
