//! Error type shared by instance construction, model building, and
//! schedule extraction.

use std::fmt;

use crate::solver::SolveStatus;
use crate::validation::ValidationError;

/// Errors raised while building or reading a formulation.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulationError {
    /// The instance failed validation. Carries every detected issue.
    InvalidInstance(Vec<ValidationError>),
    /// The formulation configuration is inconsistent.
    InvalidConfig(String),
    /// A job sequence is not a permutation of the instance's jobs.
    InvalidSequence(String),
    /// A lookup referenced an index outside the enumerated set.
    UnknownIndex(String),
    /// A solution was requested before an optimal solve.
    ///
    /// Carries the last solve status, or `None` if `optimize` never ran.
    UnsolvedModel(Option<SolveStatus>),
    /// A reconstructed start time is farther from an integer than the
    /// configured tolerance allows.
    NonIntegralValue {
        /// Job whose start time was reconstructed.
        job: usize,
        /// The raw reconstructed value.
        value: f64,
    },
}

impl fmt::Display for FormulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInstance(errors) => {
                write!(f, "invalid instance: ")?;
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e.message)?;
                }
                Ok(())
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::InvalidSequence(msg) => write!(f, "invalid job sequence: {msg}"),
            Self::UnknownIndex(index) => write!(f, "index {index} is not in the enumerated set"),
            Self::UnsolvedModel(Some(status)) => {
                write!(f, "model has no optimal solution (last status: {status:?})")
            }
            Self::UnsolvedModel(None) => write!(f, "model has not been optimized"),
            Self::NonIntegralValue { job, value } => {
                write!(f, "start time of job {job} is not integral: {value}")
            }
        }
    }
}

impl std::error::Error for FormulationError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationErrorKind;

    #[test]
    fn test_display_joins_validation_messages() {
        let err = FormulationError::InvalidInstance(vec![
            ValidationError::new(ValidationErrorKind::EmptyInstance, "no jobs"),
            ValidationError::new(ValidationErrorKind::NegativeCost, "job 0 has negative cost"),
        ]);
        assert_eq!(
            err.to_string(),
            "invalid instance: no jobs; job 0 has negative cost"
        );
    }

    #[test]
    fn test_display_unsolved() {
        assert_eq!(
            FormulationError::UnsolvedModel(None).to_string(),
            "model has not been optimized"
        );
        let err = FormulationError::UnsolvedModel(Some(SolveStatus::Infeasible));
        assert!(err.to_string().contains("Infeasible"));
    }
}
