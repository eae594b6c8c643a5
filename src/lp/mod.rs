//! Linear model capability.
//!
//! Constraint generation talks to the solver only through the
//! [`LinearModel`] trait: add variables, add linear constraints, set a
//! linear objective, solve with an optional time budget, read back a
//! status and variable values. Any integer-programming engine that can
//! do this is a drop-in backend.
//!
//! Variables are dense [`VarId`]s handed out in creation order, so a
//! backend can keep them in a `Vec`.
//!
//! # Backends
//! - [`GoodLpModel`]: `good_lp` with the pure-Rust `microlp` solver.

mod good_lp_backend;

pub use good_lp_backend::GoodLpModel;

use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Dense variable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarId(pub usize);

impl VarId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VarKind {
    /// 0 or 1.
    Binary,
    /// Integer in `[min, max]`; `max = None` is unbounded above.
    Integer { min: f64, max: Option<f64> },
}

/// Declared variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    pub name: String,
    pub kind: VarKind,
}

/// Affine expression `Σ coef·var + constant`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    /// The zero expression.
    pub fn new() -> Self {
        Self::default()
    }

    /// A constant expression.
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of variables with unit coefficients.
    pub fn sum(vars: impl IntoIterator<Item = VarId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    /// Adds `coef·var`.
    pub fn add_term(&mut self, var: VarId, coef: f64) {
        self.terms.push((var, coef));
    }

    /// Builder form of [`add_term`](Self::add_term).
    pub fn with_term(mut self, var: VarId, coef: f64) -> Self {
        self.add_term(var, coef);
        self
    }

    /// Multiplies every coefficient and the constant by `factor`.
    pub fn scale(mut self, factor: f64) -> Self {
        for (_, c) in &mut self.terms {
            *c *= factor;
        }
        self.constant *= factor;
        self
    }

    /// Evaluates the expression under `values[var.index()]`.
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(v, c)| c * values[v.index()])
            .sum::<f64>()
            + self.constant
    }

    /// `self == rhs`.
    pub fn equals(self, rhs: impl Into<LinearExpr>) -> LinearConstraint {
        LinearConstraint::new(self, Comparison::Eq, rhs)
    }

    /// `self <= rhs`.
    pub fn leq(self, rhs: impl Into<LinearExpr>) -> LinearConstraint {
        LinearConstraint::new(self, Comparison::Leq, rhs)
    }

    /// `self >= rhs`.
    pub fn geq(self, rhs: impl Into<LinearExpr>) -> LinearConstraint {
        LinearConstraint::new(self, Comparison::Geq, rhs)
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self::new().with_term(var, 1.0)
    }
}

impl From<f64> for LinearExpr {
    fn from(value: f64) -> Self {
        Self::constant(value)
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + rhs.scale(-1.0)
    }
}

impl Mul<LinearExpr> for f64 {
    type Output = LinearExpr;

    fn mul(self, rhs: LinearExpr) -> LinearExpr {
        rhs.scale(self)
    }
}

/// Relation between the two sides of a constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Eq,
    Leq,
    Geq,
}

/// Linear constraint, normalized to `expr ∘ 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// `lhs - rhs`.
    pub expr: LinearExpr,
    pub comparison: Comparison,
}

impl LinearConstraint {
    /// Builds `lhs ∘ rhs`.
    pub fn new(
        lhs: impl Into<LinearExpr>,
        comparison: Comparison,
        rhs: impl Into<LinearExpr>,
    ) -> Self {
        Self {
            expr: lhs.into() - rhs.into(),
            comparison,
        }
    }

    /// Whether `values` satisfy the constraint within `tolerance`.
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let v = self.expr.evaluate(values);
        match self.comparison {
            Comparison::Eq => v.abs() <= tolerance,
            Comparison::Leq => v <= tolerance,
            Comparison::Geq => v >= -tolerance,
        }
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Sense {
    #[default]
    Minimize,
    Maximize,
}

/// Terminal status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A proven optimum was found.
    Optimal,
    /// No assignment satisfies the constraints.
    Infeasible,
    /// The objective can be improved without limit.
    Unbounded,
    /// The solver stopped (time budget, backend failure) without a result.
    NotSolved,
}

impl SolveStatus {
    /// Whether variable values are meaningful.
    pub fn has_solution(self) -> bool {
        matches!(self, Self::Optimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Optimal => "Optimal",
            Self::Infeasible => "Infeasible",
            Self::Unbounded => "Unbounded",
            Self::NotSolved => "Not Solved",
        };
        f.write_str(s)
    }
}

/// Status and, when available, variable values of a solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveOutcome {
    pub status: SolveStatus,
    /// Indexed by [`VarId`]; empty unless `status.has_solution()`.
    pub values: Vec<f64>,
    pub objective: Option<f64>,
}

impl SolveOutcome {
    /// An outcome without values.
    pub fn without_solution(status: SolveStatus) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective: None,
        }
    }

    /// Value of a variable, if the solve produced values.
    pub fn value(&self, var: VarId) -> Option<f64> {
        self.values.get(var.index()).copied()
    }
}

/// Integer-programming capability required by the constraint model.
pub trait LinearModel {
    /// Declares a variable and returns its handle.
    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId;

    /// Declares a 0/1 variable.
    fn add_binary(&mut self, name: String) -> VarId {
        self.add_variable(name, VarKind::Binary)
    }

    /// Declares an integer variable in `[min, max]`.
    fn add_integer(&mut self, name: String, min: f64, max: Option<f64>) -> VarId {
        self.add_variable(name, VarKind::Integer { min, max })
    }

    /// Adds a constraint.
    fn add_constraint(&mut self, constraint: LinearConstraint);

    /// Sets the objective, replacing any previous one.
    fn set_objective(&mut self, sense: Sense, objective: LinearExpr);

    /// Solves the model.
    ///
    /// With `timeout`, a solve that has not finished in time returns
    /// `SolveStatus::NotSolved`. A backend may keep working on an expired
    /// solve in the background; see [`GoodLpModel`].
    fn solve(&mut self, timeout: Option<Duration>) -> Result<SolveOutcome>;

    /// Number of declared variables.
    fn variable_count(&self) -> usize;

    /// Number of added constraints.
    fn constraint_count(&self) -> usize;
}
