//! Formulation configuration.

/// Coefficient scaling of the bucket-indexed model.
///
/// Both scalings describe the same polytope. `Reference` writes the
/// bucket-unit coefficients (`π`, `δ`, `1/Δ`), which are fractional;
/// `Slim` multiplies the affected rows by `Δ` so that every coefficient is
/// an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalingMode {
    /// Coefficients in bucket units.
    Reference,
    /// Coefficients multiplied by `Δ`.
    #[default]
    Slim,
}

/// Which model to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulationKind {
    /// Bucket-indexed model (Boland, Clement & Waterer 2016).
    BucketIndexed {
        /// Coefficient scaling.
        scaling: ScalingMode,
    },
    /// Time-indexed model with one binary per (job, start time).
    ///
    /// Exact but grows with `Σp`. Intended for small instances.
    TimeIndexed,
}

impl Default for FormulationKind {
    fn default() -> Self {
        FormulationKind::BucketIndexed {
            scaling: ScalingMode::default(),
        }
    }
}

/// Configuration for building a formulation.
///
/// # Examples
///
/// ```
/// use u_smsp::formulation::{FormulationConfig, ScalingMode};
///
/// let config = FormulationConfig::bucket_indexed(ScalingMode::Reference)
///     .with_name("smsp_bi")
///     .with_integrality_tolerance(1e-6);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FormulationConfig {
    /// Model kind and scaling.
    pub kind: FormulationKind,

    /// Model name handed to the solver adapter.
    pub name: String,

    /// Maximum distance from an integer a reconstructed start time may
    /// have. `None` rounds unconditionally.
    pub integrality_tolerance: Option<f64>,
}

impl Default for FormulationConfig {
    fn default() -> Self {
        Self {
            kind: FormulationKind::default(),
            name: "smsp".into(),
            integrality_tolerance: None,
        }
    }
}

impl FormulationConfig {
    /// Bucket-indexed model with the given scaling.
    pub fn bucket_indexed(scaling: ScalingMode) -> Self {
        Self::default().with_kind(FormulationKind::BucketIndexed { scaling })
    }

    /// Time-indexed model.
    pub fn time_indexed() -> Self {
        Self::default().with_kind(FormulationKind::TimeIndexed)
    }

    pub fn with_kind(mut self, kind: FormulationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_integrality_tolerance(mut self, tolerance: f64) -> Self {
        self.integrality_tolerance = Some(tolerance);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        if let Some(tol) = self.integrality_tolerance {
            if !tol.is_finite() || tol < 0.0 {
                return Err(format!(
                    "integrality_tolerance must be finite and non-negative, got {tol}"
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormulationConfig::default();
        assert_eq!(
            config.kind,
            FormulationKind::BucketIndexed {
                scaling: ScalingMode::Slim
            }
        );
        assert_eq!(config.name, "smsp");
        assert!(config.integrality_tolerance.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_constructors() {
        assert_eq!(
            FormulationConfig::time_indexed().kind,
            FormulationKind::TimeIndexed
        );
        assert_eq!(
            FormulationConfig::bucket_indexed(ScalingMode::Reference).kind,
            FormulationKind::BucketIndexed {
                scaling: ScalingMode::Reference
            }
        );
    }

    #[test]
    fn test_validate_bad_tolerance() {
        let config = FormulationConfig::default().with_integrality_tolerance(-0.1);
        assert!(config.validate().is_err());
        let config = FormulationConfig::default().with_integrality_tolerance(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_name() {
        let config = FormulationConfig::default().with_name("  ");
        assert!(config.validate().is_err());
    }
}
