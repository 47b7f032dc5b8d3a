//! Demo data generators for ED rostering.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Doctor, DoctorLevel, LeaveInterval, LeaveType, NightRule};
use crate::error::Result;
use crate::generator::{MonthTemplates, ShiftGenerator};
use crate::store::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                year: 2026,
                month: 2,
                full_time_count: 16,
                part_time_count: 0,
                leave_count: 3,
                leave_length_distribution: vec![(1, 3.0), (2, 2.0), (3, 1.0)],
            },
            DemoData::Large => DemoDataParameters {
                year: 2026,
                month: 3,
                full_time_count: 18,
                part_time_count: 4,
                leave_count: 6,
                leave_length_distribution: vec![(1, 4.0), (2, 3.0), (3, 2.0), (5, 1.0)],
            },
        }
    }
}

struct DemoDataParameters {
    year: i32,
    month: u32,
    full_time_count: usize,
    part_time_count: usize,
    leave_count: usize,
    leave_length_distribution: Vec<(i64, f64)>,
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates doctors, one month of shifts and some leave for the given size.
///
/// Shifts are classified under `night_rule`, the same rule the service uses
/// when it generates a month.
pub fn generate(demo: DemoData, night_rule: NightRule) -> Result<Snapshot> {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let shifts = ShiftGenerator::new(MonthTemplates::default(), night_rule)
        .generate_month(params.year, params.month)?;

    // Generate doctor names (FIRST × LAST)
    let name_permutations = generate_name_permutations(&mut rng);
    let levels = [
        (DoctorLevel::MedicalOfficer, 4.0),
        (DoctorLevel::Registrar, 3.0),
        (DoctorLevel::Junior, 2.0),
        (DoctorLevel::Consultant, 1.0),
        (DoctorLevel::CommunityService, 1.0),
    ];

    let mut doctors = Vec::new();
    for i in 0..params.full_time_count + params.part_time_count {
        let name = name_permutations[i % name_permutations.len()].clone();
        let level = pick_weighted(&mut rng, &levels).unwrap_or_default();
        let mut doctor = Doctor::new(format!("D{:02}", i + 1), name)
            .with_level(level)
            .with_firm(i as u32 % 4 + 1);
        if i >= params.full_time_count {
            doctor = doctor.with_contract_hours(88.0).with_shift_bounds(8, 10);
        }
        doctors.push(doctor);
    }

    // Leave starts anywhere in the month and may run past its end
    let first = NaiveDate::from_ymd_opt(params.year, params.month, 1).unwrap_or_default();
    let days_in_month = first
        .iter_days()
        .take_while(|d| d.month() == params.month)
        .count() as i64;
    let leave_types = [
        (LeaveType::Annual, 5.0),
        (LeaveType::Study, 2.0),
        (LeaveType::Sick, 2.0),
        (LeaveType::Other, 1.0),
    ];

    let mut leave = Vec::new();
    let on_leave: Vec<&Doctor> = doctors.choose_multiple(&mut rng, params.leave_count).collect();
    for (idx, doctor) in on_leave.into_iter().enumerate() {
        let start = first + Duration::days(rng.gen_range(0..days_in_month));
        let length = pick_weighted(&mut rng, &params.leave_length_distribution).unwrap_or(1);
        let leave_type = pick_weighted(&mut rng, &leave_types).unwrap_or_default();
        let mut interval =
            LeaveInterval::new(doctor.id.clone(), start, start + Duration::days(length - 1), leave_type)?;
        interval.id = Some(idx as u64 + 1);
        leave.push(interval);
    }

    Ok(Snapshot {
        doctors,
        shifts,
        leave,
    })
}

/// Pick an item based on a weighted distribution.
fn pick_weighted<T: Copy>(rng: &mut StdRng, distribution: &[(T, f64)]) -> Option<T> {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (item, weight) in distribution {
        if choice < *weight {
            return Some(*item);
        }
        choice -= weight;
    }
    distribution.last().map(|(item, _)| *item)
}

const FIRST_NAMES: &[&str] = &[
    "Aisha", "Ben", "Chloe", "Deepak", "Emma", "Farid", "Grace", "Hamish", "Ines", "Jonah",
];
const LAST_NAMES: &[&str] = &[
    "Okafor", "Nguyen", "Patel", "Murray", "Walsh", "Chen", "Kowalski", "Reid", "Haddad", "Byrne",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("Dr {} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}
