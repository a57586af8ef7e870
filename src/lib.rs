//! MILP formulations for single-machine total weighted tardiness.
//!
//! Builds the variables, objective, and constraints of two exact MILP
//! models for `1 || Σ w_j T_j` and hands them to a pluggable solver
//! backend. Solving itself is delegated; this crate owns the model.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Job`, `Instance`, `Schedule`
//! - **`validation`**: Input integrity checks (positive processing times,
//!   non-negative due dates and costs)
//! - **`formulation`**: Discretization, index sets, variable registries,
//!   constraint generation for the bucket-indexed (BI) and time-indexed (TI)
//!   models, and schedule extraction
//! - **`solver`**: The `SolverAdapter` seam plus two adapters: an LP-file
//!   recorder and an in-process `microlp` backend
//!
//! # Example
//!
//! ```
//! use u_smsp::formulation::{Formulation, FormulationConfig, ScalingMode};
//! use u_smsp::models::Instance;
//! use u_smsp::solver::{MicroLpSolver, SolveStatus};
//!
//! let instance = Instance::from_columns(&[2, 3, 2], &[1, 4, 2], &[3, 1, 2]).unwrap();
//! let config = FormulationConfig::bucket_indexed(ScalingMode::Slim);
//! let mut model = Formulation::build(&instance, MicroLpSolver::new(), config).unwrap();
//!
//! assert_eq!(model.optimize(), SolveStatus::Optimal);
//! let schedule = model.schedule().unwrap();
//! assert!(schedule.is_feasible());
//! ```
//!
//! # References
//!
//! - Boland, Clement & Waterer (2016), "A Bucket Indexed Formulation for
//!   Nonpreemptive Single Machine Scheduling Problems"
//! - Sousa & Wolsey (1992), "A time indexed formulation of non-preemptive
//!   single machine scheduling problems"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

pub mod error;
pub mod formulation;
pub mod models;
pub mod solver;
pub mod validation;

pub use error::FormulationError;
