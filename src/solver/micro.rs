//! In-process MILP backend built on `microlp`.
//!
//! Declarations are recorded into a [`LinearModel`]; `solve` translates
//! the whole model into a `microlp::Problem` and runs its
//! branch-and-bound. Suitable for small and medium models.

use microlp::{ComparisonOp, OptimizationDirection, Problem};

use super::model::{LinearModel, ModelRecorder, VarId, VarKind};
use super::{LinearExpr, ObjectiveSense, Relation, SolveStatus, SolverAdapter};

/// Slack allowed when checking constraints that lost all their terms.
const EMPTY_ROW_EPS: f64 = 1e-9;

/// Solver adapter backed by the pure-Rust `microlp` solver.
///
/// # Example
/// ```
/// use u_smsp::solver::{LinearExpr, MicroLpSolver, Relation, SolveStatus, SolverAdapter};
///
/// let mut solver = MicroLpSolver::new();
/// let x = solver.declare_binary("x");
/// let y = solver.declare_binary("y");
/// solver.set_objective_term(x, 2.0);
/// solver.set_objective_term(y, 3.0);
/// solver.add_linear_constraint(
///     LinearExpr::new().with(x, 1.0).with(y, 1.0),
///     Relation::GreaterEq,
///     1.0,
///     "cover",
/// );
///
/// assert_eq!(solver.solve(), SolveStatus::Optimal);
/// assert!((solver.value(x).unwrap() - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MicroLpSolver {
    recorder: ModelRecorder,
    values: Option<Vec<f64>>,
    objective: Option<f64>,
}

impl MicroLpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solver whose model carries `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            recorder: ModelRecorder::named(name),
            ..Self::default()
        }
    }

    /// The recorded model.
    pub fn model(&self) -> &LinearModel {
        self.recorder.model()
    }

    /// Objective value reported by the backend after an optimal solve.
    pub fn objective_value(&self) -> Option<f64> {
        self.objective
    }

    fn build_problem(&self) -> Result<(Problem, Vec<microlp::Variable>), SolveStatus> {
        let model = self.recorder.model();
        let direction = match model.sense {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };

        let mut problem = Problem::new(direction);
        let handles: Vec<microlp::Variable> = model
            .vars
            .iter()
            .map(|v| match v.kind {
                VarKind::Binary => problem.add_binary_var(v.objective),
                VarKind::Continuous => problem.add_var(v.objective, (v.lower, v.upper)),
            })
            .collect();

        for c in &model.constraints {
            let terms = c.merged_terms();
            if terms.is_empty() {
                if c.relation.holds(0.0, c.rhs, EMPTY_ROW_EPS) {
                    continue;
                }
                tracing::debug!(label = %c.label, "empty constraint is unsatisfiable");
                return Err(SolveStatus::Infeasible);
            }
            let op = match c.relation {
                Relation::LessEq => ComparisonOp::Le,
                Relation::Eq => ComparisonOp::Eq,
                Relation::GreaterEq => ComparisonOp::Ge,
            };
            let expr: microlp::LinearExpr = terms
                .iter()
                .map(|&(var, coeff)| (handles[var.idx()], coeff))
                .collect();
            problem.add_constraint(expr, op, c.rhs);
        }

        Ok((problem, handles))
    }
}

impl SolverAdapter for MicroLpSolver {
    type Var = VarId;

    fn declare_binary(&mut self, name: &str) -> VarId {
        self.recorder.declare_binary(name)
    }

    fn declare_continuous(&mut self, name: &str, lower: f64, upper: f64) -> VarId {
        self.recorder.declare_continuous(name, lower, upper)
    }

    fn add_linear_constraint(
        &mut self,
        expr: LinearExpr<VarId>,
        relation: Relation,
        rhs: f64,
        label: &str,
    ) {
        self.recorder
            .add_linear_constraint(expr, relation, rhs, label);
    }

    fn set_objective_term(&mut self, var: VarId, coefficient: f64) {
        self.recorder.set_objective_term(var, coefficient);
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.recorder.model_mut().sense = sense;
    }

    fn set_model_name(&mut self, name: &str) {
        self.recorder.set_model_name(name);
    }

    fn solve(&mut self) -> SolveStatus {
        self.values = None;
        self.objective = None;

        let (problem, handles) = match self.build_problem() {
            Ok(built) => built,
            Err(status) => return status,
        };

        let model = self.recorder.model();
        tracing::debug!(
            model = %model.name,
            vars = model.var_count(),
            binaries = model.binary_count(),
            constraints = model.constraint_count(),
            "solving with microlp"
        );

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|&h| *solution.var_value(h)).collect();
                self.values = Some(values);
                self.objective = Some(solution.objective());
                SolveStatus::Optimal
            }
            Err(microlp::Error::Infeasible) => SolveStatus::Infeasible,
            Err(err) => {
                tracing::warn!(model = %model.name, error = %err, "microlp failed");
                SolveStatus::Error
            }
        }
    }

    fn value(&self, var: VarId) -> Option<f64> {
        self.values.as_ref()?.get(var.idx()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_small_lp() {
        // max x + 2y s.t. x + y <= 4, 2x + y >= 2, 0 <= y <= 3
        let mut solver = MicroLpSolver::named("lp");
        let x = solver.declare_continuous("x", 0.0, f64::INFINITY);
        let y = solver.declare_continuous("y", 0.0, 3.0);
        solver.set_objective_sense(ObjectiveSense::Maximize);
        solver.set_objective_term(x, 1.0);
        solver.set_objective_term(y, 2.0);
        solver.add_linear_constraint(
            LinearExpr::new().with(x, 1.0).with(y, 1.0),
            Relation::LessEq,
            4.0,
            "cap",
        );
        solver.add_linear_constraint(
            LinearExpr::new().with(x, 2.0).with(y, 1.0),
            Relation::GreaterEq,
            2.0,
            "floor",
        );

        assert_eq!(solver.solve(), SolveStatus::Optimal);
        assert!((solver.objective_value().unwrap() - 7.0).abs() < 1e-6);
        assert!((solver.value(x).unwrap() - 1.0).abs() < 1e-6);
        assert!((solver.value(y).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_solve_binary_choice() {
        // pick exactly one of three items at minimum cost
        let mut solver = MicroLpSolver::new();
        let vars: Vec<VarId> = (0..3)
            .map(|i| solver.declare_binary(&format!("pick[{i}]")))
            .collect();
        for (&v, cost) in vars.iter().zip([5.0, 2.0, 4.0]) {
            solver.set_objective_term(v, cost);
        }
        solver.add_linear_constraint(
            vars.iter().map(|&v| (v, 1.0)).collect(),
            Relation::Eq,
            1.0,
            "one",
        );

        assert_eq!(solver.solve(), SolveStatus::Optimal);
        let picked: Vec<f64> = vars.iter().map(|&v| solver.value(v).unwrap().round()).collect();
        assert_eq!(picked, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_duplicate_terms_are_merged() {
        let mut solver = MicroLpSolver::new();
        let x = solver.declare_continuous("x", 0.0, 10.0);
        solver.set_objective_sense(ObjectiveSense::Maximize);
        solver.set_objective_term(x, 1.0);
        // x + x <= 6  →  x <= 3
        solver.add_linear_constraint(
            LinearExpr::new().with(x, 1.0).with(x, 1.0),
            Relation::LessEq,
            6.0,
            "dup",
        );
        assert_eq!(solver.solve(), SolveStatus::Optimal);
        assert!((solver.value(x).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut solver = MicroLpSolver::new();
        let x = solver.declare_binary("x");
        solver.add_linear_constraint(LinearExpr::new().with(x, 1.0), Relation::GreaterEq, 2.0, "c");
        assert_eq!(solver.solve(), SolveStatus::Infeasible);
        assert_eq!(solver.value(x), None);
    }

    #[test]
    fn test_empty_rows() {
        let mut solver = MicroLpSolver::new();
        let x = solver.declare_binary("x");
        solver.set_objective_term(x, 1.0);
        solver.add_linear_constraint(LinearExpr::new().with(x, 1.0), Relation::LessEq, 1.0, "ub");
        solver.add_linear_constraint(LinearExpr::new(), Relation::LessEq, 1.0, "trivial");
        assert_eq!(solver.solve(), SolveStatus::Optimal);

        solver.add_linear_constraint(LinearExpr::new(), Relation::GreaterEq, 1.0, "impossible");
        assert_eq!(solver.solve(), SolveStatus::Infeasible);
    }

    #[test]
    fn test_value_before_solve() {
        let mut solver = MicroLpSolver::new();
        let x = solver.declare_binary("x");
        assert_eq!(solver.value(x), None);
        assert_eq!(solver.objective_value(), None);
    }
}
