//! `good_lp` backend.
//!
//! Variables and constraints are recorded as plain data and only turned
//! into a `good_lp` problem inside [`LinearModel::solve`]. That keeps the
//! model `Send`, so a time-limited solve can run on a worker thread while
//! the caller waits on a channel with a deadline. A worker that misses
//! the deadline is detached and keeps its CPU until the solver returns;
//! its late result is dropped. Short budgets on large models can
//! therefore leave several workers running at once.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use tracing::{debug, warn};

use super::{
    Comparison, LinearConstraint, LinearExpr, LinearModel, Sense, SolveOutcome, SolveStatus,
    VarId, VarKind, VarSpec,
};
use crate::error::{Result, SlotterError};

/// A [`LinearModel`] solved with `good_lp`'s default solver.
#[derive(Debug, Clone, Default)]
pub struct GoodLpModel {
    variables: Vec<VarSpec>,
    constraints: Vec<LinearConstraint>,
    sense: Sense,
    objective: LinearExpr,
}

impl GoodLpModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declared variables in id order.
    pub fn variables(&self) -> &[VarSpec] {
        &self.variables
    }

    /// Added constraints in insertion order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Current objective.
    pub fn objective(&self) -> (Sense, &LinearExpr) {
        (self.sense, &self.objective)
    }
}

impl LinearModel for GoodLpModel {
    fn add_variable(&mut self, name: String, kind: VarKind) -> VarId {
        let id = VarId(self.variables.len());
        self.variables.push(VarSpec { name, kind });
        id
    }

    fn add_constraint(&mut self, constraint: LinearConstraint) {
        self.constraints.push(constraint);
    }

    fn set_objective(&mut self, sense: Sense, objective: LinearExpr) {
        self.sense = sense;
        self.objective = objective;
    }

    fn solve(&mut self, timeout: Option<Duration>) -> Result<SolveOutcome> {
        debug!(
            variables = self.variables.len(),
            constraints = self.constraints.len(),
            ?timeout,
            "handing model to good_lp"
        );
        let started = Instant::now();
        let outcome = match timeout {
            None => run(self),
            Some(limit) => run_with_deadline(self.clone(), limit)?,
        };
        debug!(status = %outcome.status, elapsed = ?started.elapsed(), "good_lp finished");
        Ok(outcome)
    }

    fn variable_count(&self) -> usize {
        self.variables.len()
    }

    fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

fn run_with_deadline(model: GoodLpModel, limit: Duration) -> Result<SolveOutcome> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("lp-worker".into())
        .spawn(move || {
            let outcome = run(&model);
            // The receiver is gone if the caller already timed out.
            if tx.send(outcome).is_err() {
                debug!("discarded solver result that arrived after the deadline");
            }
        })
        .map_err(|e| SlotterError::Backend(format!("failed to spawn solver thread: {e}")))?;

    match rx.recv_timeout(limit) {
        Ok(outcome) => Ok(outcome),
        Err(RecvTimeoutError::Timeout) => {
            warn!(?limit, "solver exceeded its time budget");
            Ok(SolveOutcome::without_solution(SolveStatus::NotSolved))
        }
        Err(RecvTimeoutError::Disconnected) => Err(SlotterError::Backend(
            "solver thread terminated without a result".into(),
        )),
    }
}

fn run(model: &GoodLpModel) -> SolveOutcome {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables
        .iter()
        .map(|spec| {
            let definition = match spec.kind {
                VarKind::Binary => variable().binary(),
                VarKind::Integer { min, max } => {
                    let d = variable().integer().min(min);
                    match max {
                        Some(max) => d.max(max),
                        None => d,
                    }
                }
            };
            vars.add(definition.name(spec.name.clone()))
        })
        .collect();

    let objective = to_expression(&model.objective, &handles);
    let unsolved = match model.sense {
        Sense::Minimize => vars.minimise(objective),
        Sense::Maximize => vars.maximise(objective),
    };
    let mut problem = unsolved.using(default_solver);

    for c in &model.constraints {
        let lhs = to_expression(&c.expr, &handles);
        let constraint = match c.comparison {
            Comparison::Eq => constraint!(lhs == 0.0),
            Comparison::Leq => constraint!(lhs <= 0.0),
            Comparison::Geq => constraint!(lhs >= 0.0),
        };
        problem.add_constraint(constraint);
    }

    match problem.solve() {
        Ok(solution) => {
            let values: Vec<f64> = handles.iter().map(|v| solution.value(*v)).collect();
            let objective = model.objective.evaluate(&values);
            SolveOutcome {
                status: SolveStatus::Optimal,
                values,
                objective: Some(objective),
            }
        }
        Err(ResolutionError::Infeasible) => SolveOutcome::without_solution(SolveStatus::Infeasible),
        Err(ResolutionError::Unbounded) => SolveOutcome::without_solution(SolveStatus::Unbounded),
        Err(e) => {
            warn!(error = %e, "solver stopped without a solution");
            SolveOutcome::without_solution(SolveStatus::NotSolved)
        }
    }
}

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    expr.terms
        .iter()
        .fold(Expression::from(expr.constant), |acc, &(var, coef)| {
            acc + coef * handles[var.index()]
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_variables_and_constraints() {
        let mut m = GoodLpModel::new();
        let x = m.add_binary("x".into());
        let y = m.add_integer("y".into(), 0.0, Some(3.0));
        m.add_constraint(LinearExpr::sum([x, y]).leq(2.0));

        assert_eq!(m.variable_count(), 2);
        assert_eq!(m.constraint_count(), 1);
        assert_eq!(y, VarId(1));
        assert_eq!(
            m.variables()[1].kind,
            VarKind::Integer {
                min: 0.0,
                max: Some(3.0)
            }
        );
    }

    #[test]
    fn test_solve_small_ilp() {
        // maximize x + 2y  s.t.  x + y <= 1, binaries → y = 1
        let mut m = GoodLpModel::new();
        let x = m.add_binary("x".into());
        let y = m.add_binary("y".into());
        m.add_constraint(LinearExpr::sum([x, y]).leq(1.0));
        m.set_objective(
            Sense::Maximize,
            LinearExpr::from(x) + 2.0 * LinearExpr::from(y),
        );

        let outcome = m.solve(None).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!(outcome.value(x).unwrap() < 0.5);
        assert!(outcome.value(y).unwrap() > 0.5);
        assert!((outcome.objective.unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_integer_bounds() {
        // minimize -z with z integer in [0, 4] and 2z <= 7 → z = 3
        let mut m = GoodLpModel::new();
        let z = m.add_integer("z".into(), 0.0, Some(4.0));
        m.add_constraint((2.0 * LinearExpr::from(z)).leq(7.0));
        m.set_objective(Sense::Minimize, -1.0 * LinearExpr::from(z));

        let outcome = m.solve(None).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!((outcome.value(z).unwrap() - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_infeasible() {
        let mut m = GoodLpModel::new();
        let x = m.add_binary("x".into());
        let y = m.add_binary("y".into());
        m.add_constraint(LinearExpr::sum([x, y]).equals(3.0));
        m.set_objective(Sense::Minimize, LinearExpr::from(x));

        let outcome = m.solve(None).unwrap();
        assert_eq!(outcome.status, SolveStatus::Infeasible);
        assert!(outcome.values.is_empty());
    }

    #[test]
    fn test_objective_accessor() {
        let mut m = GoodLpModel::new();
        let x = m.add_binary("x".into());
        m.set_objective(Sense::Maximize, 3.0 * LinearExpr::from(x));

        let (sense, objective) = m.objective();
        assert_eq!(sense, Sense::Maximize);
        assert_eq!(objective.terms, vec![(x, 3.0)]);
    }

    #[test]
    fn test_expired_budget_is_not_solved() {
        // 60-item binary knapsack; no solve finishes within a microsecond
        let mut m = GoodLpModel::new();
        let items: Vec<VarId> = (0..60).map(|i| m.add_binary(format!("item_{i}"))).collect();
        let mut weight = LinearExpr::new();
        let mut value = LinearExpr::new();
        for (i, &item) in items.iter().enumerate() {
            weight.add_term(item, (i % 7 + 3) as f64);
            value.add_term(item, (i % 11 + 1) as f64);
        }
        m.add_constraint(weight.leq(97.0));
        m.set_objective(Sense::Maximize, value);

        let outcome = m.solve(Some(Duration::from_micros(1))).unwrap();
        assert_eq!(outcome.status, SolveStatus::NotSolved);
        assert!(outcome.values.is_empty());
        assert_eq!(outcome.objective, None);
    }

    #[test]
    fn test_solve_with_generous_timeout() {
        let mut m = GoodLpModel::new();
        let x = m.add_binary("x".into());
        m.add_constraint(LinearExpr::from(x).geq(1.0));
        m.set_objective(Sense::Minimize, LinearExpr::from(x));

        let outcome = m.solve(Some(Duration::from_secs(30))).unwrap();
        assert_eq!(outcome.status, SolveStatus::Optimal);
        assert!(outcome.value(x).unwrap() > 0.5);
    }
}
