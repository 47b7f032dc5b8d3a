//! Boundary validation for roster inputs.
//!
//! Checks structural integrity of doctors, shifts and leave before anything
//! reaches the optimizer. Detects:
//! - Duplicate doctor or shift IDs
//! - Doctor bounds that cannot hold (min > max, negative contract hours)
//! - Shifts that end before they start or whose coverage bounds are inverted
//! - Leave that ends before it starts or names an unknown doctor
//!
//! Every problem is collected; the caller sees the full list at once.

use std::collections::HashSet;

use crate::domain::{Doctor, LeaveInterval, Shift};
use crate::error::RosterError;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two doctors or two shifts share an ID.
    DuplicateId,
    /// Doctor bounds or contract hours are malformed.
    InvalidDoctor,
    /// Shift times or coverage bounds are malformed.
    InvalidShift,
    /// Leave ends before it starts.
    InvalidLeave,
    /// Leave references a doctor that is not in the doctor set.
    UnknownDoctor,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates doctors, shifts and leave as one problem instance.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_inputs(
    doctors: &[Doctor],
    shifts: &[Shift],
    leave: &[LeaveInterval],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut doctor_ids = HashSet::new();
    for doctor in doctors {
        if !doctor_ids.insert(doctor.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate doctor ID: {}", doctor.id),
            ));
        }
        if let Err(e) = doctor.validate() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidDoctor,
                detail(e),
            ));
        }
    }

    let mut shift_ids = HashSet::new();
    for shift in shifts {
        if !shift_ids.insert(shift.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate shift ID: {}", shift.id),
            ));
        }
        // Shift::new enforces these, but shifts can also arrive deserialized
        if shift.end <= shift.start || shift.duration_hours <= 0.0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidShift,
                format!("Shift '{}' does not end after it starts", shift.id),
            ));
        }
        if shift.min_doctors > shift.max_doctors {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidShift,
                format!(
                    "Shift '{}' has min_doctors {} > max_doctors {}",
                    shift.id, shift.min_doctors, shift.max_doctors
                ),
            ));
        }
    }

    for interval in leave {
        if let Err(e) = interval.validate() {
            errors.push(ValidationError::new(ValidationErrorKind::InvalidLeave, detail(e)));
        }
        if !doctor_ids.contains(interval.doctor_id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownDoctor,
                format!("Leave references unknown doctor '{}'", interval.doctor_id),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Folds a list of validation errors into one [`RosterError::InvalidInput`].
pub fn into_roster_error(errors: Vec<ValidationError>) -> RosterError {
    let joined = errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ");
    RosterError::invalid(joined)
}

fn detail(err: RosterError) -> String {
    match err {
        RosterError::InvalidInput(message) => message,
        other => other.to_string(),
    }
}
