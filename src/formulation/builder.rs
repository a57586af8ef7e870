//! Formulation builder and solved-model accessors.

use crate::error::FormulationError;
use crate::models::{Instance, Schedule};
use crate::solver::{ObjectiveSense, SolveStatus, SolverAdapter};
use crate::validation::validate_instance;

use super::bucket::BucketGenerator;
use super::config::{FormulationConfig, FormulationKind};
use super::discretize::Discretization;
use super::extract::ScheduleExtractor;
use super::index::BucketIndex;
use super::registry::{BucketVariables, TimeVariables};
use super::time::TimeGenerator;

/// z values above this count as "assigned".
const ASSIGNED: f64 = 0.5;

#[derive(Debug, Clone)]
enum ModelVariables<V> {
    Bucket {
        disc: Discretization,
        vars: BucketVariables<V>,
    },
    Time(TimeVariables<V>),
}

/// Builds formulations from a configuration.
///
/// # Example
/// ```
/// use u_smsp::formulation::{FormulationBuilder, FormulationConfig};
/// use u_smsp::models::Instance;
/// use u_smsp::solver::ModelRecorder;
///
/// let instance = Instance::from_columns(&[4, 6], &[3, 2], &[1, 2]).unwrap();
/// let builder = FormulationBuilder::new(FormulationConfig::time_indexed().with_name("ti"));
/// let model = builder.build(&instance, ModelRecorder::new()).unwrap();
///
/// let lp = model.solver().model();
/// assert_eq!(lp.name, "ti");
/// assert_eq!(lp.binary_count(), 7 + 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FormulationBuilder {
    config: FormulationConfig,
}

impl FormulationBuilder {
    pub fn new(config: FormulationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FormulationConfig {
        &self.config
    }

    /// Validates the inputs and emits the whole model into `solver`.
    ///
    /// Fails with `InvalidConfig` or `InvalidInstance` before anything is
    /// declared on the solver.
    pub fn build<S: SolverAdapter>(
        &self,
        instance: &Instance,
        mut solver: S,
    ) -> Result<Formulation<S>, FormulationError> {
        self.config
            .validate()
            .map_err(FormulationError::InvalidConfig)?;
        validate_instance(instance).map_err(FormulationError::InvalidInstance)?;

        let instance = instance.clone();
        solver.set_model_name(&self.config.name);
        solver.set_objective_sense(ObjectiveSense::Minimize);

        let variables = match self.config.kind {
            FormulationKind::BucketIndexed { scaling } => {
                let disc = Discretization::new(&instance)?;
                tracing::debug!(
                    delta = disc.delta(),
                    buckets = disc.bucket_count(),
                    horizon = disc.horizon(),
                    ?scaling,
                    "discretized"
                );
                let vars = BucketGenerator::new(&instance, &disc, scaling, &mut solver).generate()?;
                ModelVariables::Bucket { disc, vars }
            }
            FormulationKind::TimeIndexed => {
                let vars = TimeGenerator::new(&instance, &mut solver).generate()?;
                ModelVariables::Time(vars)
            }
        };

        Ok(Formulation {
            instance,
            config: self.config.clone(),
            solver,
            variables,
            status: None,
        })
    }
}

/// A built formulation bound to its solver.
///
/// Owns a private copy of the instance and the solver adapter the model
/// was emitted into.
#[derive(Debug, Clone)]
pub struct Formulation<S: SolverAdapter> {
    instance: Instance,
    config: FormulationConfig,
    solver: S,
    variables: ModelVariables<S::Var>,
    status: Option<SolveStatus>,
}

impl<S: SolverAdapter> Formulation<S> {
    /// Shorthand for `FormulationBuilder::new(config).build(instance, solver)`.
    pub fn build(
        instance: &Instance,
        solver: S,
        config: FormulationConfig,
    ) -> Result<Self, FormulationError> {
        FormulationBuilder::new(config).build(instance, solver)
    }

    /// Runs the solver and records the outcome.
    pub fn optimize(&mut self) -> SolveStatus {
        let status = self.solver.solve();
        if status == SolveStatus::Optimal {
            tracing::info!(model = %self.config.name, "optimal solution found");
        } else {
            tracing::warn!(
                model = %self.config.name,
                ?status,
                "solve did not reach optimality"
            );
        }
        self.status = Some(status);
        status
    }

    /// Status of the last solve, `None` before [`optimize`](Self::optimize).
    pub fn status(&self) -> Option<SolveStatus> {
        self.status
    }

    fn require_optimal(&self) -> Result<(), FormulationError> {
        match self.status {
            Some(SolveStatus::Optimal) => Ok(()),
            other => Err(FormulationError::UnsolvedModel(other)),
        }
    }

    /// Start and end time of every job in the solved model.
    ///
    /// # Errors
    /// - `UnsolvedModel` unless the last solve was optimal
    /// - `NonIntegralValue` if an integrality tolerance is configured and
    ///   exceeded
    pub fn schedule(&self) -> Result<Schedule, FormulationError> {
        self.require_optimal()?;
        let extractor = ScheduleExtractor::new(self.config.integrality_tolerance);
        match &self.variables {
            ModelVariables::Bucket { disc, vars } => {
                extractor.from_buckets(&self.instance, disc, vars, &self.solver)
            }
            ModelVariables::Time(vars) => extractor.from_slots(&self.instance, vars, &self.solver),
        }
    }

    /// Objective value of the solved model, evaluated from its own
    /// objective terms.
    pub fn objective_value(&self) -> Result<f64, FormulationError> {
        self.require_optimal()?;
        let missing = || FormulationError::UnsolvedModel(self.status);
        let mut total = 0.0;
        match &self.variables {
            ModelVariables::Bucket { disc, vars } => {
                let delta = disc.delta() as f64;
                for (pos, t) in vars.t.iter() {
                    let idx = vars
                        .index_set()
                        .index_at(pos)
                        .ok_or_else(|| FormulationError::UnknownIndex(format!("T@{pos}")))?;
                    let cost = self.instance.jobs[idx.job].cost as f64;
                    total += cost * delta * self.solver.value(t).ok_or_else(missing)?;
                }
            }
            ModelVariables::Time(vars) => {
                for (pos, x) in vars.x.iter() {
                    let idx = vars
                        .index_set()
                        .index_at(pos)
                        .ok_or_else(|| FormulationError::UnknownIndex(format!("x@{pos}")))?;
                    let weight = self.instance.jobs[idx.job].weighted_tardiness(idx.slot - 1);
                    total += weight as f64 * self.solver.value(x).ok_or_else(missing)?;
                }
            }
        }
        Ok(total)
    }

    /// Chosen `(b, k)` of every job in a solved bucket-indexed model.
    ///
    /// `None` for time-indexed models, before an optimal solve, or if some
    /// job has no assignment above one half.
    pub fn bucket_assignments(&self) -> Option<Vec<BucketIndex>> {
        if self.status != Some(SolveStatus::Optimal) {
            return None;
        }
        let ModelVariables::Bucket { vars, .. } = &self.variables else {
            return None;
        };
        let mut chosen: Vec<Option<BucketIndex>> = vec![None; self.instance.job_count()];
        for (pos, z) in vars.z.iter() {
            if self.solver.value(z)? > ASSIGNED {
                let idx = vars.index_set().index_at(pos)?;
                chosen[idx.job] = Some(idx);
            }
        }
        chosen.into_iter().collect()
    }

    /// Discretization of a bucket-indexed model.
    pub fn discretization(&self) -> Option<&Discretization> {
        match &self.variables {
            ModelVariables::Bucket { disc, .. } => Some(disc),
            ModelVariables::Time(_) => None,
        }
    }

    /// Variables of a bucket-indexed model.
    pub fn bucket_variables(&self) -> Option<&BucketVariables<S::Var>> {
        match &self.variables {
            ModelVariables::Bucket { vars, .. } => Some(vars),
            ModelVariables::Time(_) => None,
        }
    }

    /// Variables of a time-indexed model.
    pub fn time_variables(&self) -> Option<&TimeVariables<S::Var>> {
        match &self.variables {
            ModelVariables::Time(vars) => Some(vars),
            ModelVariables::Bucket { .. } => None,
        }
    }

    pub fn kind(&self) -> FormulationKind {
        self.config.kind
    }

    pub fn config(&self) -> &FormulationConfig {
        &self.config
    }

    /// The builder's private copy of the instance.
    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn into_solver(self) -> S {
        self.solver
    }
}
