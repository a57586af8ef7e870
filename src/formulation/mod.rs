//! MILP formulations of `1 || Σ w_j T_j`.
//!
//! Two models share one pipeline:
//!
//! ```text
//! Instance → Discretization → index set → variables → constraints
//!          → SolverAdapter::solve → ScheduleExtractor → Schedule
//! ```
//!
//! - **Bucket-indexed (BI)**: time is cut into buckets of length
//!   `Δ = min p_j`; a job picks a start bucket and a fraction flag, and
//!   continuous occupancy variables recover the exact start inside the
//!   bucket. Two coefficient scalings ([`ScalingMode`]) describe the same
//!   model.
//! - **Time-indexed (TI)**: one binary per job and unit start time.
//!
//! Both measure tardiness from the start time: `max(0, S_j - d_j)`.
//!
//! # Example
//!
//! ```
//! use u_smsp::formulation::{Formulation, FormulationConfig};
//! use u_smsp::models::Instance;
//! use u_smsp::solver::{MicroLpSolver, SolveStatus};
//!
//! let instance = Instance::from_columns(&[3, 2], &[0, 0], &[1, 3]).unwrap();
//! let mut model =
//!     Formulation::build(&instance, MicroLpSolver::new(), FormulationConfig::time_indexed())
//!         .unwrap();
//! assert_eq!(model.optimize(), SolveStatus::Optimal);
//! assert_eq!(model.schedule().unwrap().start_times, vec![2, 0]);
//! ```
//!
//! # Reference
//! - Boland, Clement & Waterer (2016), "A Bucket Indexed Formulation for
//!   Nonpreemptive Single Machine Scheduling Problems"
//! - Sousa & Wolsey (1992), "A time indexed formulation of non-preemptive
//!   single machine scheduling problems"

mod bucket;
mod builder;
mod config;
mod discretize;
mod extract;
mod index;
mod registry;
mod time;

pub use builder::{Formulation, FormulationBuilder};
pub use config::{FormulationConfig, FormulationKind, ScalingMode};
pub use discretize::Discretization;
pub use extract::ScheduleExtractor;
pub use index::{BucketIndex, BucketIndexSet, TimeIndex, TimeIndexSet};
pub use registry::{BucketVariables, TimeVariables, VarRegistry};
