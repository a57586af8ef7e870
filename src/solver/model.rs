//! In-memory linear model and the recording adapter.
//!
//! `LinearModel` stores exactly what a formulation declared: variables
//! with bounds and objective coefficients, and labelled constraints in
//! the order they were added. It can be exported in CPLEX LP format for
//! an external MILP solver.

use std::fmt::{self, Write};

use super::{LinearExpr, ObjectiveSense, Relation, SolveStatus, SolverAdapter};

/// Handle of a variable in a [`LinearModel`]: its declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Declaration position of the variable.
    pub fn idx(&self) -> usize {
        self.0
    }
}

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Binary,
    Continuous,
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
    pub lower: f64,
    pub upper: f64,
    /// Objective coefficient (0 if the variable is not in the objective).
    pub objective: f64,
}

/// A labelled linear constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub label: String,
    pub expr: LinearExpr<VarId>,
    pub relation: Relation,
    pub rhs: f64,
}

impl ConstraintDef {
    /// Coefficient of `var`, summed over duplicate terms; 0 if absent.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.expr
            .terms()
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }

    /// Terms with duplicates merged and zero coefficients dropped,
    /// ordered by variable.
    pub fn merged_terms(&self) -> Vec<(VarId, f64)> {
        let mut terms = self.expr.terms().to_vec();
        terms.sort_by_key(|(v, _)| *v);

        let mut merged: Vec<(VarId, f64)> = Vec::with_capacity(terms.len());
        for (var, coeff) in terms {
            match merged.last_mut() {
                Some((last, acc)) if *last == var => *acc += coeff,
                _ => merged.push((var, coeff)),
            }
        }
        merged.retain(|(_, c)| *c != 0.0);
        merged
    }
}

/// A recorded linear (mixed-integer) model.
#[derive(Debug, Clone, Default)]
pub struct LinearModel {
    /// Model name.
    pub name: String,
    /// Optimization direction.
    pub sense: ObjectiveSense,
    /// Variables in declaration order.
    pub vars: Vec<VarDef>,
    /// Constraints in insertion order.
    pub constraints: Vec<ConstraintDef>,
}

impl LinearModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    pub fn binary_count(&self) -> usize {
        self.vars
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Variable definition for a handle.
    pub fn var(&self, id: VarId) -> Option<&VarDef> {
        self.vars.get(id.0)
    }

    /// Looks up a variable by name.
    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    /// Looks up a constraint by its exact label.
    pub fn constraint(&self, label: &str) -> Option<&ConstraintDef> {
        self.constraints.iter().find(|c| c.label == label)
    }

    /// Constraints whose label starts with `prefix`.
    pub fn constraints_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a ConstraintDef> + 'a {
        self.constraints
            .iter()
            .filter(move |c| c.label.starts_with(prefix))
    }

    /// Variables with a non-zero objective coefficient.
    pub fn objective_terms(&self) -> impl Iterator<Item = (VarId, f64)> + '_ {
        self.vars
            .iter()
            .enumerate()
            .filter(|(_, v)| v.objective != 0.0)
            .map(|(i, v)| (VarId(i), v.objective))
    }

    /// Objective value for a full assignment of variable values.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective_terms()
            .map(|(id, c)| c * values.get(id.0).copied().unwrap_or(0.0))
            .sum()
    }

    /// Labels of constraints violated by `values` beyond `eps`.
    pub fn violated_constraints(&self, values: &[f64], eps: f64) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| {
                let lhs = c
                    .expr
                    .evaluate(|v| values.get(v.0).copied().unwrap_or(0.0));
                !c.relation.holds(lhs, c.rhs, eps)
            })
            .map(|c| c.label.as_str())
            .collect()
    }

    pub(crate) fn push_var(&mut self, def: VarDef) -> VarId {
        self.vars.push(def);
        VarId(self.vars.len() - 1)
    }

    /// Writes the model in CPLEX LP format.
    ///
    /// Names are sanitized to the LP identifier alphabet.
    pub fn write_lp<W: Write>(&self, out: &mut W) -> fmt::Result {
        writeln!(out, "\\ {}", self.name)?;
        match self.sense {
            ObjectiveSense::Minimize => writeln!(out, "Minimize")?,
            ObjectiveSense::Maximize => writeln!(out, "Maximize")?,
        }

        write!(out, " obj:")?;
        let objective: Vec<(VarId, f64)> = self.objective_terms().collect();
        if objective.is_empty() {
            match self.vars.first() {
                Some(v) => write!(out, " 0 {}", lp_name(&v.name))?,
                None => write!(out, " 0")?,
            }
        } else {
            self.write_terms(out, &objective)?;
        }
        writeln!(out)?;

        writeln!(out, "Subject To")?;
        for c in &self.constraints {
            write!(out, " {}:", lp_name(&c.label))?;
            let terms = c.merged_terms();
            if terms.is_empty() {
                match self.vars.first() {
                    Some(v) => write!(out, " 0 {}", lp_name(&v.name))?,
                    None => continue,
                }
            } else {
                self.write_terms(out, &terms)?;
            }
            let op = match c.relation {
                Relation::LessEq => "<=",
                Relation::Eq => "=",
                Relation::GreaterEq => ">=",
            };
            writeln!(out, " {op} {}", c.rhs)?;
        }

        writeln!(out, "Bounds")?;
        for v in self.vars.iter().filter(|v| v.kind == VarKind::Continuous) {
            let name = lp_name(&v.name);
            if v.upper.is_finite() {
                writeln!(out, " {} <= {name} <= {}", v.lower, v.upper)?;
            } else {
                writeln!(out, " {name} >= {}", v.lower)?;
            }
        }

        if self.binary_count() > 0 {
            writeln!(out, "Binaries")?;
            for v in self.vars.iter().filter(|v| v.kind == VarKind::Binary) {
                writeln!(out, " {}", lp_name(&v.name))?;
            }
        }

        writeln!(out, "End")
    }

    /// The model in CPLEX LP format.
    pub fn to_lp_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_lp(&mut out);
        out
    }

    fn write_terms<W: Write>(&self, out: &mut W, terms: &[(VarId, f64)]) -> fmt::Result {
        for (i, &(var, coeff)) in terms.iter().enumerate() {
            let name = self
                .vars
                .get(var.0)
                .map(|v| lp_name(&v.name))
                .unwrap_or_else(|| format!("v{}", var.0));
            let sign = if coeff < 0.0 { '-' } else { '+' };
            if i == 0 && coeff >= 0.0 {
                write!(out, " {} {name}", coeff.abs())?;
            } else {
                write!(out, " {sign} {} {name}", coeff.abs())?;
            }
        }
        Ok(())
    }
}

fn lp_name(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Adapter that only records the model.
///
/// Useful for inspecting generated formulations and for exporting them to
/// an external solver. `solve` always reports [`SolveStatus::Error`].
#[derive(Debug, Clone, Default)]
pub struct ModelRecorder {
    model: LinearModel,
}

impl ModelRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a recorder whose model carries `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            model: LinearModel::new(name),
        }
    }

    /// The recorded model.
    pub fn model(&self) -> &LinearModel {
        &self.model
    }

    /// Consumes the recorder, returning the model.
    pub fn into_model(self) -> LinearModel {
        self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut LinearModel {
        &mut self.model
    }
}

impl SolverAdapter for ModelRecorder {
    type Var = VarId;

    fn declare_binary(&mut self, name: &str) -> VarId {
        self.model.push_var(VarDef {
            name: name.to_string(),
            kind: VarKind::Binary,
            lower: 0.0,
            upper: 1.0,
            objective: 0.0,
        })
    }

    fn declare_continuous(&mut self, name: &str, lower: f64, upper: f64) -> VarId {
        self.model.push_var(VarDef {
            name: name.to_string(),
            kind: VarKind::Continuous,
            lower,
            upper,
            objective: 0.0,
        })
    }

    fn add_linear_constraint(
        &mut self,
        expr: LinearExpr<VarId>,
        relation: Relation,
        rhs: f64,
        label: &str,
    ) {
        self.model.constraints.push(ConstraintDef {
            label: label.to_string(),
            expr,
            relation,
            rhs,
        });
    }

    fn set_objective_term(&mut self, var: VarId, coefficient: f64) {
        if let Some(def) = self.model.vars.get_mut(var.0) {
            def.objective = coefficient;
        }
    }

    fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.model.sense = sense;
    }

    fn set_model_name(&mut self, name: &str) {
        self.model.name = name.to_string();
    }

    fn solve(&mut self) -> SolveStatus {
        tracing::warn!(model = %self.model.name, "recorder has no solver backend");
        SolveStatus::Error
    }

    fn value(&self, _var: VarId) -> Option<f64> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> ModelRecorder {
        let mut rec = ModelRecorder::named("demo");
        let x = rec.declare_binary("x[0]");
        let y = rec.declare_continuous("y", 0.0, 1.0);
        let t = rec.declare_continuous("t", 0.0, f64::INFINITY);
        rec.set_objective_sense(ObjectiveSense::Minimize);
        rec.set_objective_term(t, 3.0);
        rec.add_linear_constraint(
            LinearExpr::new().with(x, 1.0).with(y, -2.0),
            Relation::LessEq,
            0.0,
            "link[0]",
        );
        rec.add_linear_constraint(
            LinearExpr::new().with(t, 1.0).with(x, -1.5).with(y, 1.0),
            Relation::Eq,
            0.0,
            "tardy",
        );
        rec
    }

    #[test]
    fn test_recorder_counts() {
        let rec = small_model();
        let model = rec.model();
        assert_eq!(model.var_count(), 3);
        assert_eq!(model.binary_count(), 1);
        assert_eq!(model.constraint_count(), 2);
        assert_eq!(model.var_by_name("y"), Some(VarId(1)));
        assert_eq!(model.constraints_with_prefix("link").count(), 1);
    }

    #[test]
    fn test_recorder_cannot_solve() {
        let mut rec = small_model();
        assert_eq!(rec.solve(), SolveStatus::Error);
        assert_eq!(rec.value(VarId(0)), None);
    }

    #[test]
    fn test_objective_terms() {
        let rec = small_model();
        let terms: Vec<_> = rec.model().objective_terms().collect();
        assert_eq!(terms, vec![(VarId(2), 3.0)]);
        assert!((rec.model().objective_value(&[1.0, 0.5, 2.0]) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_merged_terms() {
        let c = ConstraintDef {
            label: "c".into(),
            expr: LinearExpr::new()
                .with(VarId(2), 1.0)
                .with(VarId(0), 2.0)
                .with(VarId(2), 0.5)
                .with(VarId(1), 1.0)
                .with(VarId(1), -1.0),
            relation: Relation::LessEq,
            rhs: 1.0,
        };
        assert_eq!(c.merged_terms(), vec![(VarId(0), 2.0), (VarId(2), 1.5)]);
        assert!((c.coefficient(VarId(2)) - 1.5).abs() < 1e-12);
        assert_eq!(c.coefficient(VarId(7)), 0.0);
    }

    #[test]
    fn test_violated_constraints() {
        let rec = small_model();
        // x=1, y=0.5, t=1: link holds (0 <= 0), tardy fails (1 - 1.5 + 0.5 = 0 holds)
        assert!(rec.model().violated_constraints(&[1.0, 0.5, 1.0], 1e-9).is_empty());
        // x=1, y=0.2: link violated (1 - 0.4 > 0)
        let violated = rec.model().violated_constraints(&[1.0, 0.2, 1.3], 1e-9);
        assert_eq!(violated, vec!["link[0]"]);
    }

    #[test]
    fn test_lp_export() {
        let lp = small_model().model().to_lp_string();
        assert!(lp.starts_with("\\ demo\nMinimize\n obj: 3 t\n"));
        assert!(lp.contains(" link_0_: 1 x_0_ - 2 y <= 0\n"));
        assert!(lp.contains(" tardy: - 1.5 x_0_ + 1 y + 1 t = 0\n"));
        assert!(lp.contains("Bounds\n 0 <= y <= 1\n t >= 0\n"));
        assert!(lp.contains("Binaries\n x_0_\n"));
        assert!(lp.ends_with("End\n"));
    }
}
