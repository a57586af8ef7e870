//! Solver abstraction.
//!
//! Formulations talk to a MILP backend only through [`SolverAdapter`]:
//! declare variables, add linear constraints, set objective terms,
//! solve, and read values back. The backend's algorithm (branch-and-bound,
//! cuts, presolve) is entirely its own business.
//!
//! # Adapters
//!
//! - [`ModelRecorder`]: records the model into a [`LinearModel`] for
//!   inspection or export in CPLEX LP format. Cannot solve.
//! - [`MicroLpSolver`]: records the same way and solves in-process with
//!   the pure-Rust `microlp` branch-and-bound solver.

mod micro;
mod model;

pub use micro::MicroLpSolver;
pub use model::{ConstraintDef, LinearModel, ModelRecorder, VarDef, VarId, VarKind};

use std::fmt::Debug;
use std::hash::Hash;

/// Relation between the left- and right-hand side of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    /// `expr <= rhs`
    LessEq,
    /// `expr == rhs`
    Eq,
    /// `expr >= rhs`
    GreaterEq,
}

impl Relation {
    /// Whether `lhs relation rhs` holds within `eps`.
    pub fn holds(self, lhs: f64, rhs: f64, eps: f64) -> bool {
        match self {
            Relation::LessEq => lhs <= rhs + eps,
            Relation::Eq => (lhs - rhs).abs() <= eps,
            Relation::GreaterEq => lhs >= rhs - eps,
        }
    }
}

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveSense {
    #[default]
    Minimize,
    Maximize,
}

/// Outcome of a solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// Proven optimal solution found; values may be read.
    Optimal,
    /// No feasible solution exists.
    Infeasible,
    /// The backend failed, found the model unbounded, or has no solver.
    Error,
}

/// A linear expression `Σ coeff · var`.
///
/// Terms are kept in insertion order. A variable may appear more than once;
/// adapters merge duplicates before handing the expression to a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearExpr<V> {
    terms: Vec<(V, f64)>,
}

impl<V: Copy> LinearExpr<V> {
    /// Creates an empty expression.
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Adds `coeff · var`.
    pub fn add(&mut self, var: V, coeff: f64) {
        self.terms.push((var, coeff));
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, var: V, coeff: f64) -> Self {
        self.add(var, coeff);
        self
    }

    /// Terms in insertion order.
    pub fn terms(&self) -> &[(V, f64)] {
        &self.terms
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the expression has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression given a value lookup.
    pub fn evaluate(&self, mut value: impl FnMut(V) -> f64) -> f64 {
        self.terms.iter().map(|&(v, c)| c * value(v)).sum()
    }
}

impl<V: Copy> Default for LinearExpr<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Copy> FromIterator<(V, f64)> for LinearExpr<V> {
    fn from_iter<I: IntoIterator<Item = (V, f64)>>(iter: I) -> Self {
        Self {
            terms: iter.into_iter().collect(),
        }
    }
}

impl<V: Copy> Extend<(V, f64)> for LinearExpr<V> {
    fn extend<I: IntoIterator<Item = (V, f64)>>(&mut self, iter: I) {
        self.terms.extend(iter);
    }
}

/// Capability interface a MILP backend exposes to the formulations.
///
/// Implementors wrap a concrete solver library. Handles returned by the
/// `declare_*` methods are opaque and only meaningful to the adapter that
/// produced them.
pub trait SolverAdapter {
    /// Variable handle.
    type Var: Copy + Eq + Hash + Debug;

    /// Declares a binary (0/1) variable.
    fn declare_binary(&mut self, name: &str) -> Self::Var;

    /// Declares a continuous variable bounded by `[lower, upper]`.
    ///
    /// Use `f64::INFINITY` for an absent upper bound.
    fn declare_continuous(&mut self, name: &str, lower: f64, upper: f64) -> Self::Var;

    /// Adds `expr relation rhs` under a human-readable label.
    fn add_linear_constraint(
        &mut self,
        expr: LinearExpr<Self::Var>,
        relation: Relation,
        rhs: f64,
        label: &str,
    );

    /// Sets the objective coefficient of `var`, replacing any previous one.
    fn set_objective_term(&mut self, var: Self::Var, coefficient: f64);

    /// Sets the optimization direction.
    fn set_objective_sense(&mut self, sense: ObjectiveSense);

    /// Names the model. Backends without a notion of model name ignore it.
    fn set_model_name(&mut self, _name: &str) {}

    /// Solves the model. Blocks until the backend returns.
    fn solve(&mut self) -> SolveStatus;

    /// Value of `var` in the last optimal solution, if any.
    fn value(&self, var: Self::Var) -> Option<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_expr_builder() {
        let expr = LinearExpr::new().with(0usize, 1.0).with(2, -3.5);
        assert_eq!(expr.len(), 2);
        assert_eq!(expr.terms()[1], (2, -3.5));
        assert!(!expr.is_empty());
    }

    #[test]
    fn test_linear_expr_collect_and_evaluate() {
        let mut expr: LinearExpr<usize> = (0..3).map(|i| (i, 2.0)).collect();
        expr.extend([(5, 1.0)]);
        let values = [1.0, 0.5, 0.0, 0.0, 0.0, 4.0];
        assert!((expr.evaluate(|v| values[v]) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_relation_holds() {
        assert!(Relation::LessEq.holds(1.0, 1.0, 0.0));
        assert!(Relation::LessEq.holds(1.0 + 1e-9, 1.0, 1e-6));
        assert!(!Relation::LessEq.holds(1.1, 1.0, 1e-6));
        assert!(Relation::Eq.holds(2.0, 2.0 - 1e-9, 1e-6));
        assert!(!Relation::Eq.holds(2.0, 2.5, 1e-6));
        assert!(Relation::GreaterEq.holds(0.0, 0.0, 0.0));
        assert!(!Relation::GreaterEq.holds(-1.0, 0.0, 1e-6));
    }

    #[test]
    fn test_default_sense_is_minimize() {
        assert_eq!(ObjectiveSense::default(), ObjectiveSense::Minimize);
    }
}
