//! Pairwise shift conflicts and calendar groupings for the roster model.
//!
//! Two shifts conflict for a single doctor when their time ranges overlap or
//! when the gap from the earlier end to the later start is strictly below the
//! required rest. The groupings in [`ShiftCalendar`] feed the weekend, bundle
//! and night-pattern rules.

use chrono::{Duration, NaiveDate, Weekday};
use std::collections::BTreeMap;

use crate::config::WeekendCounting;
use crate::domain::{IsoWeekKey, Shift};

/// Returns every unordered pair `(i, j)`, `i < j`, of shift indices that one
/// doctor may not work together.
///
/// Shifts are scanned in start order; once a later shift starts at or after
/// `end_i + rest`, no later-starting shift can conflict with `i`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use ed_rostering::conflicts::conflict_pairs;
/// use ed_rostering::domain::Shift;
///
/// let at = |d: u32, h: u32| NaiveDate::from_ymd_opt(2026, 2, d).unwrap().and_hms_opt(h, 0, 0).unwrap();
/// let shifts = vec![
///     Shift::new("day", "Day", at(2, 7), at(2, 18), 1, 1).unwrap(),
///     Shift::new("late", "Late", at(2, 14), at(3, 1), 1, 1).unwrap(),
///     Shift::new("next-day", "Day", at(3, 7), at(3, 18), 1, 1).unwrap(),
/// ];
///
/// // day/late overlap; late ends 01:00 and next-day starts 07:00 (6h < 11h)
/// assert_eq!(conflict_pairs(&shifts, 11.0), vec![(0, 1), (1, 2)]);
/// ```
pub fn conflict_pairs(shifts: &[Shift], rest_hours_required: f64) -> Vec<(usize, usize)> {
    let rest = Duration::seconds((rest_hours_required * 3600.0).round() as i64);

    let mut order: Vec<usize> = (0..shifts.len()).collect();
    order.sort_by_key(|&i| (shifts[i].start, i));

    let mut pairs = Vec::new();
    for (pos, &i) in order.iter().enumerate() {
        let horizon = shifts[i].end + rest;
        for &j in &order[pos + 1..] {
            if shifts[j].start >= horizon {
                break;
            }
            pairs.push((i.min(j), i.max(j)));
        }
    }

    pairs.sort_unstable();
    pairs
}

/// Friday, Saturday and Sunday night shifts of one ISO week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekendBundle {
    pub week: IsoWeekKey,
    pub friday: Vec<usize>,
    pub saturday: Vec<usize>,
    pub sunday: Vec<usize>,
}

impl WeekendBundle {
    /// True when all three nights exist; incomplete triplets are not bundled.
    pub fn is_complete(&self) -> bool {
        !self.friday.is_empty() && !self.saturday.is_empty() && !self.sunday.is_empty()
    }
}

/// Calendar groupings of a shift set, by shift index.
#[derive(Debug, Clone, Default)]
pub struct ShiftCalendar {
    pub night_shifts: Vec<usize>,
    /// Night shifts keyed by their start date.
    pub nights_by_date: BTreeMap<NaiveDate, Vec<usize>>,
    /// Mon–Thu night shifts per ISO week.
    pub weekday_nights_by_week: BTreeMap<IsoWeekKey, Vec<usize>>,
    /// Saturday and Sunday shifts per ISO week.
    pub weekend_shifts_by_week: BTreeMap<IsoWeekKey, Vec<usize>>,
    pub bundles: Vec<WeekendBundle>,
}

impl ShiftCalendar {
    pub fn build(shifts: &[Shift]) -> Self {
        let mut calendar = ShiftCalendar::default();
        let mut bundles: BTreeMap<IsoWeekKey, WeekendBundle> = BTreeMap::new();

        for (idx, shift) in shifts.iter().enumerate() {
            let week = shift.iso_week();
            let weekday = shift.weekday();

            if matches!(weekday, Weekday::Sat | Weekday::Sun) {
                calendar
                    .weekend_shifts_by_week
                    .entry(week)
                    .or_default()
                    .push(idx);
            }

            if !shift.is_night {
                continue;
            }

            calendar.night_shifts.push(idx);
            calendar
                .nights_by_date
                .entry(shift.date())
                .or_default()
                .push(idx);

            match weekday {
                Weekday::Mon | Weekday::Tue | Weekday::Wed | Weekday::Thu => {
                    calendar
                        .weekday_nights_by_week
                        .entry(week)
                        .or_default()
                        .push(idx);
                }
                Weekday::Fri | Weekday::Sat | Weekday::Sun => {
                    let bundle = bundles.entry(week).or_insert_with(|| WeekendBundle {
                        week,
                        friday: Vec::new(),
                        saturday: Vec::new(),
                        sunday: Vec::new(),
                    });
                    match weekday {
                        Weekday::Fri => bundle.friday.push(idx),
                        Weekday::Sat => bundle.saturday.push(idx),
                        _ => bundle.sunday.push(idx),
                    }
                }
            }
        }

        calendar.bundles = bundles.into_values().filter(WeekendBundle::is_complete).collect();
        calendar
    }

    /// Weekend shifts per ISO week under the given counting rule. Weeks left
    /// without any qualifying shift are dropped.
    pub fn weekend_groups(
        &self,
        shifts: &[Shift],
        counting: WeekendCounting,
    ) -> BTreeMap<IsoWeekKey, Vec<usize>> {
        self.weekend_shifts_by_week
            .iter()
            .map(|(week, indices)| {
                let kept: Vec<usize> = indices
                    .iter()
                    .copied()
                    .filter(|&i| match counting {
                        WeekendCounting::AnyShift => true,
                        WeekendCounting::NightOnly => shifts[i].is_night,
                    })
                    .collect();
                (*week, kept)
            })
            .filter(|(_, kept)| !kept.is_empty())
            .collect()
    }

    /// Night shifts falling in each run of `window_days` consecutive calendar
    /// dates, one window per date that has a night shift.
    pub fn night_windows(&self, window_days: u32) -> Vec<Vec<usize>> {
        if window_days == 0 {
            return Vec::new();
        }
        let span = Duration::days(i64::from(window_days) - 1);
        self.nights_by_date
            .keys()
            .map(|&first| {
                self.nights_by_date
                    .range(first..=first + span)
                    .flat_map(|(_, indices)| indices.iter().copied())
                    .collect::<Vec<usize>>()
            })
            .collect()
    }
}
