//! Input validation for single-machine instances.
//!
//! Checks structural integrity of an instance before any model is built.
//! Detects:
//! - Empty instances
//! - Non-positive processing times (the bucket length would be undefined)
//! - Negative due dates
//! - Negative tardiness costs
//! - Mismatched column lengths when assembling an instance from arrays
//!
//! All issues are collected; validation does not stop at the first one.

use crate::models::Instance;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The instance has no jobs.
    EmptyInstance,
    /// A job has processing time ≤ 0.
    NonPositiveProcessingTime,
    /// A job has a due date < 0.
    NegativeDueDate,
    /// A job has a tardiness cost < 0.
    NegativeCost,
    /// Processing-time, due-date, and cost columns differ in length.
    LengthMismatch,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates an instance.
///
/// Checks:
/// 1. At least one job
/// 2. Every processing time is strictly positive
/// 3. Every due date is non-negative
/// 4. Every tardiness cost is non-negative
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(instance: &Instance) -> ValidationResult {
    let mut errors = Vec::new();

    if instance.jobs.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyInstance,
            "Instance has no jobs",
        ));
    }

    for (j, job) in instance.jobs.iter().enumerate() {
        if job.processing_time <= 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NonPositiveProcessingTime,
                format!(
                    "Job {j} has non-positive processing time {}",
                    job.processing_time
                ),
            ));
        }
        if job.due_date < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeDueDate,
                format!("Job {j} has negative due date {}", job.due_date),
            ));
        }
        if job.cost < 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NegativeCost,
                format!("Job {j} has negative tardiness cost {}", job.cost),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks that the three instance columns have equal length.
pub(crate) fn validate_columns(
    processing_times: &[i64],
    due_dates: &[i64],
    costs: &[i64],
) -> ValidationResult {
    let n = processing_times.len();
    if due_dates.len() == n && costs.len() == n {
        return Ok(());
    }
    Err(vec![ValidationError::new(
        ValidationErrorKind::LengthMismatch,
        format!(
            "Column lengths differ: {n} processing times, {} due dates, {} costs",
            due_dates.len(),
            costs.len()
        ),
    )])
}
