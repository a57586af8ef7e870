//! Time-bucket grid for the bucket-indexed formulation.
//!
//! The horizon is cut into buckets of length `Δ = min p_j`. Bucket `b`
//! (1-based) covers `[Δ(b-1), Δb)`. Every job spans at least two buckets
//! in the model: `P_j = ⌊p_j/Δ⌋ + 1`.
//!
//! The grid has `B = ⌊Σp/Δ⌋ + 1` buckets, the bucket holding the time
//! point `Σp`. This is `⌈Σp/Δ⌉` unless `Δ` divides `Σp`; in that case the
//! extra bucket lets a job that is not split finish exactly at `Σp`.
//!
//! Fractional quantities are kept twice: as `f64` in bucket units
//! (`π`, `δ`) and as exact integers in time units (`Δπ`, `Δδ`). Boundary
//! decisions and slim-scaled coefficients use the integers.
//!
//! # Reference
//! Boland, Clement & Waterer (2016), Section 3

use crate::error::FormulationError;
use crate::models::Instance;
use crate::validation::{ValidationError, ValidationErrorKind};

const NO_SPLIT: &[u8] = &[0];
const WITH_SPLIT: &[u8] = &[0, 1];

/// Discretization parameters derived from an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    delta: i64,
    horizon: i64,
    buckets: i64,
    spans: Vec<i64>,
    scaled_slack: Vec<i64>,
    split: Vec<bool>,
    due_buckets: Vec<i64>,
    scaled_due_offset: Vec<i64>,
}

impl Discretization {
    /// Computes `Δ, B, P, π, K, D, δ` for an instance.
    ///
    /// Fails with `InvalidInstance` if the instance is empty or any
    /// processing time is not strictly positive.
    pub fn new(instance: &Instance) -> Result<Self, FormulationError> {
        let mut errors = Vec::new();
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
        }
        if !errors.is_empty() {
            return Err(FormulationError::InvalidInstance(errors));
        }

        let delta = instance
            .jobs
            .iter()
            .map(|j| j.processing_time)
            .min()
            .ok_or_else(|| {
                FormulationError::InvalidInstance(vec![ValidationError::new(
                    ValidationErrorKind::EmptyInstance,
                    "Instance has no jobs",
                )])
            })?;

        let horizon = instance.total_processing_time();
        let buckets = horizon / delta + 1;

        let n = instance.job_count();
        let mut spans = Vec::with_capacity(n);
        let mut scaled_slack = Vec::with_capacity(n);
        let mut split = Vec::with_capacity(n);
        let mut due_buckets = Vec::with_capacity(n);
        let mut scaled_due_offset = Vec::with_capacity(n);

        for job in &instance.jobs {
            let p = job.processing_time;
            let span = p / delta + 1;
            spans.push(span);
            scaled_slack.push(delta * span - p);
            split.push(p % delta != 0);

            let due_bucket = job.due_date.div_euclid(delta) + 1;
            due_buckets.push(due_bucket);
            scaled_due_offset.push(delta * due_bucket - job.due_date);
        }

        Ok(Self {
            delta,
            horizon,
            buckets,
            spans,
            scaled_slack,
            split,
            due_buckets,
            scaled_due_offset,
        })
    }

    /// Bucket length `Δ`.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Total processing time `Σ p_j`.
    pub fn horizon(&self) -> i64 {
        self.horizon
    }

    /// Number of buckets `B = ⌊Σp / Δ⌋ + 1`.
    pub fn bucket_count(&self) -> i64 {
        self.buckets
    }

    pub fn job_count(&self) -> usize {
        self.spans.len()
    }

    /// `P_j = ⌊p_j/Δ⌋ + 1`, always ≥ 2.
    pub fn span(&self, job: usize) -> i64 {
        self.spans[job]
    }

    /// `π_j = P_j - p_j/Δ`, in `(0, 1]`; exactly 1 when `Δ | p_j`.
    pub fn slack(&self, job: usize) -> f64 {
        self.scaled_slack[job] as f64 / self.delta as f64
    }

    /// `Δπ_j = ΔP_j - p_j`, in `[1, Δ]`.
    pub fn scaled_slack(&self, job: usize) -> i64 {
        self.scaled_slack[job]
    }

    /// Whether `p_j` is not a multiple of `Δ`, i.e. `K_j = {0, 1}`.
    pub fn has_split(&self, job: usize) -> bool {
        self.split[job]
    }

    /// Fraction flags `K_j`.
    pub fn flags(&self, job: usize) -> &'static [u8] {
        if self.split[job] {
            WITH_SPLIT
        } else {
            NO_SPLIT
        }
    }

    /// Due bucket `D_j = ⌊d_j/Δ⌋ + 1`.
    pub fn due_bucket(&self, job: usize) -> i64 {
        self.due_buckets[job]
    }

    /// `δ_j = D_j - d_j/Δ`, in `(0, 1]`; exactly 1 when `Δ | d_j`.
    pub fn due_offset(&self, job: usize) -> f64 {
        self.scaled_due_offset[job] as f64 / self.delta as f64
    }

    /// `Δδ_j = ΔD_j - d_j`, in `[1, Δ]`.
    pub fn scaled_due_offset(&self, job: usize) -> i64 {
        self.scaled_due_offset[job]
    }

    /// Last bucket a job may start in so that its span fits: `B - P_j + 1`.
    ///
    /// At least 1 for every job of a valid instance.
    pub fn last_start_bucket(&self, job: usize) -> i64 {
        self.buckets - self.spans[job] + 1
    }
}
