//! Expands a calendar month into concrete shifts from weekday and weekend
//! templates.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{NightRule, Shift, DEFAULT_INTENSITY};
use crate::error::{Result, RosterError};

/// One daily shift pattern. An end time at or before the start rolls over to
/// the next day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftTemplate {
    pub name: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub min_doctors: u32,
    pub max_doctors: u32,
    #[serde(default = "default_intensity")]
    pub intensity: u8,
}

fn default_intensity() -> u8 {
    DEFAULT_INTENSITY
}

impl ShiftTemplate {
    pub fn new(name: &str, start_hour: u32, end_hour: u32, min_doctors: u32, max_doctors: u32) -> Self {
        Self {
            name: name.to_string(),
            start: NaiveTime::from_hms_opt(start_hour % 24, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end_hour % 24, 0, 0).unwrap_or(NaiveTime::MIN),
            min_doctors,
            max_doctors,
            intensity: DEFAULT_INTENSITY,
        }
    }

    pub fn with_intensity(mut self, intensity: u8) -> Self {
        self.intensity = intensity;
        self
    }
}

/// Templates applied on weekdays (Mon–Fri) and weekends (Sat–Sun).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTemplates {
    pub weekday: Vec<ShiftTemplate>,
    pub weekend: Vec<ShiftTemplate>,
}

impl Default for MonthTemplates {
    /// The emergency department's standing pattern.
    fn default() -> Self {
        Self {
            weekday: vec![
                ShiftTemplate::new("Day 07-18", 7, 18, 2, 2),
                ShiftTemplate::new("Mid 09-20", 9, 20, 1, 1),
                ShiftTemplate::new("Mid 11-22", 11, 22, 0, 1).with_intensity(2),
                ShiftTemplate::new("Late 14-01", 14, 1, 3, 4).with_intensity(4),
                ShiftTemplate::new("Night 22-09", 22, 9, 3, 3).with_intensity(5),
            ],
            weekend: vec![
                ShiftTemplate::new("Day 07-19", 7, 19, 2, 2),
                ShiftTemplate::new("Mid 09-21", 9, 21, 1, 1),
                ShiftTemplate::new("Mid 11-23", 11, 23, 1, 1),
                ShiftTemplate::new("Late 13-01", 13, 1, 2, 2).with_intensity(4),
                ShiftTemplate::new("Night 21-09", 21, 9, 3, 3).with_intensity(5),
            ],
        }
    }
}

/// Builds the shifts of a month.
#[derive(Debug, Clone, Default)]
pub struct ShiftGenerator {
    templates: MonthTemplates,
    night_rule: NightRule,
}

impl ShiftGenerator {
    pub fn new(templates: MonthTemplates, night_rule: NightRule) -> Self {
        Self {
            templates,
            night_rule,
        }
    }

    pub fn templates(&self) -> &MonthTemplates {
        &self.templates
    }

    /// Every shift of `year`-`month` in start order.
    ///
    /// Ids are `YYYY-MM-DD-NN`, the date followed by the template position,
    /// so regenerating a month yields the same ids.
    ///
    /// # Examples
    ///
    /// ```
    /// use ed_rostering::generator::ShiftGenerator;
    ///
    /// let shifts = ShiftGenerator::default().generate_month(2026, 2).unwrap();
    /// // 20 weekdays × 5 templates + 8 weekend days × 5 templates
    /// assert_eq!(shifts.len(), 140);
    /// assert_eq!(shifts[0].id, "2026-02-01-00");
    /// ```
    pub fn generate_month(&self, year: i32, month: u32) -> Result<Vec<Shift>> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| RosterError::invalid(format!("invalid month {}-{:02}", year, month)))?;

        let mut shifts = Vec::new();
        for date in first.iter_days().take_while(|d| d.month() == month) {
            let templates = match date.weekday() {
                Weekday::Sat | Weekday::Sun => &self.templates.weekend,
                _ => &self.templates.weekday,
            };
            for (idx, template) in templates.iter().enumerate() {
                let shift = Shift::on_date(
                    format!("{}-{:02}", date, idx),
                    template.name.clone(),
                    date,
                    template.start,
                    template.end,
                    template.min_doctors,
                    template.max_doctors,
                )?
                .with_intensity(template.intensity)
                .classified_by(self.night_rule);
                shifts.push(shift);
            }
        }

        shifts.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(shifts)
    }
}
