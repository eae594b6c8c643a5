//! Integer model of the weekly lab assignment.
//!
//! # Variables
//!
//! | Variable | Domain | Meaning |
//! |----------|--------|---------|
//! | `session_open[t]` | {0,1} | a session runs in slot `t` |
//! | `student_at[t][s]` | {0,1} | student `s` attends slot `t` |
//! | `assistant_at[t][a]` | {0,1} | assistant `a` staffs slot `t` |
//! | `assistant_deviation` | 0..=max | bound on pairwise workload gap |
//! | `student_penalty[s]` | 0.. | weighted part-time conflict of `s` |
//!
//! # Constraints
//! 1. `Σ_t open[t] = required_session_count`
//! 2. `Σ_t student_at[t][s] = 1` for every student
//! 3. `Σ_s student_at[t][s] ≤ lab_capacity · open[t]` for every slot
//! 4. `open[a] + open[b] ≤ 1` for every overlapping pair
//! 5. `student_at[t][s] = 0` where the student's strict view is blocked
//! 6. `student_penalty[s] = altruism[s] · Σ_{t relaxed-blocked} student_at[t][s]`
//! 7. `assistant_at[t][a] = 0` where either assistant view is blocked
//! 8. `Σ_a assistant_at[t][a] = assistants_per_session · open[t]`
//! 9. `Σ_t (assistant_at[t][p] − assistant_at[t][q]) ≤ assistant_deviation`
//!    for every ordered pair `p ≠ q`
//!
//! Objective: minimize `deviation_weight · assistant_deviation + Σ_s student_penalty[s]`.
//!
//! # Lifecycle
//! ```text
//! Built ──add_constraints──▶ ConstraintsAssigned ──solve──▶ Solved(status)
//!                                                              │ extract
//!                                                  Extracted ◀─┴─▶ Failed
//! ```
//! Every transition is one-way. A new run needs a new model.

use std::time::Duration;

use tracing::{debug, info, warn};

use super::extract::ResultExtractor;
use super::{Failure, ScheduleOutcome};
use crate::config::LabSettings;
use crate::error::{Result, SlotterError};
use crate::lp::{LinearExpr, LinearModel, Sense, SolveOutcome, SolveStatus, VarId};
use crate::models::{SlotRoster, WeekGeometry};
use crate::validation::check_schedule;

/// Lifecycle state of a [`ConstraintModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    /// Variables and objective exist; no constraints yet.
    Built,
    /// All constraints added; ready to solve.
    ConstraintsAssigned,
    /// Solver returned with the given status.
    Solved(SolveStatus),
    /// A schedule was extracted.
    Extracted,
    /// Extraction produced a failure, or the backend errored.
    Failed,
}

/// Handles of all decision variables, indexed densely.
#[derive(Debug, Clone)]
pub struct DecisionVariables {
    /// `[slot]`
    pub session_open: Vec<VarId>,
    /// `[slot][student]`
    pub student_at: Vec<Vec<VarId>>,
    /// `[slot][assistant]`
    pub assistant_at: Vec<Vec<VarId>>,
    pub assistant_deviation: VarId,
    /// `[student]`
    pub student_penalty: Vec<VarId>,
}

/// The lab assignment model over a [`LinearModel`] backend.
pub struct ConstraintModel<'a, M: LinearModel> {
    week: &'a WeekGeometry,
    lab: &'a LabSettings,
    students: &'a SlotRoster,
    assistants: &'a SlotRoster,
    backend: M,
    vars: DecisionVariables,
    state: ModelState,
    solution: Option<SolveOutcome>,
}

impl<'a, M: LinearModel> ConstraintModel<'a, M> {
    /// Declares all decision variables and the objective on `backend`.
    pub fn new(
        week: &'a WeekGeometry,
        lab: &'a LabSettings,
        students: &'a SlotRoster,
        assistants: &'a SlotRoster,
        mut backend: M,
    ) -> Self {
        info!(
            slots = week.slot_count(),
            students = students.len(),
            assistants = assistants.len(),
            "building lab scheduling model"
        );

        let slots = week.slot_count();
        let session_open: Vec<VarId> = (0..slots)
            .map(|t| backend.add_binary(format!("session_{t}")))
            .collect();
        let student_at: Vec<Vec<VarId>> = (0..slots)
            .map(|t| {
                (0..students.len())
                    .map(|s| backend.add_binary(format!("student_{t}_{s}")))
                    .collect()
            })
            .collect();
        let assistant_at: Vec<Vec<VarId>> = (0..slots)
            .map(|t| {
                (0..assistants.len())
                    .map(|a| backend.add_binary(format!("assistant_{t}_{a}")))
                    .collect()
            })
            .collect();
        let assistant_deviation = backend.add_integer(
            "assistant_deviation".into(),
            0.0,
            Some(f64::from(lab.max_assistant_deviation)),
        );
        let student_penalty: Vec<VarId> = (0..students.len())
            .map(|s| backend.add_integer(format!("penalty_{s}"), 0.0, None))
            .collect();

        let objective = (lab.deviation_weight * LinearExpr::from(assistant_deviation))
            + LinearExpr::sum(student_penalty.iter().copied());
        backend.set_objective(Sense::Minimize, objective);

        Self {
            week,
            lab,
            students,
            assistants,
            backend,
            vars: DecisionVariables {
                session_open,
                student_at,
                assistant_at,
                assistant_deviation,
                student_penalty,
            },
            state: ModelState::Built,
            solution: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Decision variable handles.
    pub fn variables(&self) -> &DecisionVariables {
        &self.vars
    }

    /// The backend, e.g. to inspect recorded constraints.
    pub fn backend(&self) -> &M {
        &self.backend
    }

    /// Raw solver outcome, once solved.
    pub fn solution(&self) -> Option<&SolveOutcome> {
        self.solution.as_ref()
    }

    /// Adds every constraint family to the backend.
    ///
    /// Calling this again after success is a no-op.
    ///
    /// # Errors
    /// `SlotterError::InvalidState` once the model has been solved.
    pub fn add_constraints(&mut self) -> Result<()> {
        match self.state {
            ModelState::Built => {}
            ModelState::ConstraintsAssigned => {
                debug!("constraints already assigned");
                return Ok(());
            }
            other => {
                return Err(SlotterError::InvalidState(format!(
                    "cannot add constraints in state {other:?}"
                )))
            }
        }

        let before = self.backend.constraint_count();
        self.add_session_count();
        self.add_single_assignment();
        self.add_capacity_linkage();
        self.add_non_overlap();
        self.add_student_eligibility();
        self.add_part_time_penalty();
        self.add_assistant_eligibility();
        self.add_staffing();
        self.add_workload_balance();

        info!(
            constraints = self.backend.constraint_count() - before,
            variables = self.backend.variable_count(),
            "constraints assigned"
        );
        self.state = ModelState::ConstraintsAssigned;
        Ok(())
    }

    fn add_session_count(&mut self) {
        let total = LinearExpr::sum(self.vars.session_open.iter().copied());
        self.backend
            .add_constraint(total.equals(self.lab.required_session_count as f64));
    }

    fn add_single_assignment(&mut self) {
        for s in 0..self.students.len() {
            let attended = LinearExpr::sum(self.vars.student_at.iter().map(|row| row[s]));
            self.backend.add_constraint(attended.equals(1.0));
        }
        debug!(count = self.students.len(), "single-assignment constraints");
    }

    fn add_capacity_linkage(&mut self) {
        let capacity = self.lab.lab_capacity as f64;
        for (t, row) in self.vars.student_at.iter().enumerate() {
            let seated = LinearExpr::sum(row.iter().copied());
            let seats = capacity * LinearExpr::from(self.vars.session_open[t]);
            self.backend.add_constraint(seated.leq(seats));
        }
    }

    fn add_non_overlap(&mut self) {
        let pairs = self.week.overlapping_pairs();
        for &(a, b) in &pairs {
            let both = LinearExpr::sum([self.vars.session_open[a], self.vars.session_open[b]]);
            self.backend.add_constraint(both.leq(1.0));
        }
        debug!(
            count = pairs.len(),
            buffer_hours = self.week.buffer_hours(),
            "non-overlap constraints"
        );
    }

    fn add_student_eligibility(&mut self) {
        let mut count = 0;
        for (s, _, slots) in self.students.iter() {
            for t in slots.strict_blocked() {
                self.backend
                    .add_constraint(LinearExpr::from(self.vars.student_at[t][s]).equals(0.0));
                count += 1;
            }
        }
        debug!(count, "student eligibility constraints");
    }

    fn add_part_time_penalty(&mut self) {
        for (s, _, slots) in self.students.iter() {
            let weight = slots.altruism_parameter as f64;
            let conflicted =
                LinearExpr::sum(slots.relaxed_blocked().map(|t| self.vars.student_at[t][s]));
            let penalty = LinearExpr::from(self.vars.student_penalty[s]);
            self.backend.add_constraint(penalty.equals(weight * conflicted));
        }
    }

    fn add_assistant_eligibility(&mut self) {
        let mut count = 0;
        for (a, _, slots) in self.assistants.iter() {
            for t in 0..self.week.slot_count() {
                if !(slots.strict[t] && slots.relaxed[t]) {
                    self.backend
                        .add_constraint(LinearExpr::from(self.vars.assistant_at[t][a]).equals(0.0));
                    count += 1;
                }
            }
        }
        debug!(count, "assistant eligibility constraints");
    }

    fn add_staffing(&mut self) {
        let per_session = self.lab.assistants_per_session as f64;
        for (t, row) in self.vars.assistant_at.iter().enumerate() {
            let staffed = LinearExpr::sum(row.iter().copied());
            let needed = per_session * LinearExpr::from(self.vars.session_open[t]);
            self.backend.add_constraint(staffed.equals(needed));
        }
    }

    fn add_workload_balance(&mut self) {
        let n = self.assistants.len();
        for p in 0..n {
            for q in (0..n).filter(|&q| q != p) {
                let mut gap = LinearExpr::new();
                for row in &self.vars.assistant_at {
                    gap.add_term(row[p], 1.0);
                    gap.add_term(row[q], -1.0);
                }
                self.backend
                    .add_constraint(gap.leq(self.vars.assistant_deviation));
            }
        }
        debug!(count = n * n.saturating_sub(1), "workload balance constraints");
    }

    /// Runs the backend solver once.
    ///
    /// # Errors
    /// `SlotterError::InvalidState` unless constraints are assigned and
    /// the model has not been solved yet; backend errors are passed on.
    pub fn solve(&mut self, timeout: Option<Duration>) -> Result<SolveStatus> {
        match self.state {
            ModelState::ConstraintsAssigned => {}
            ModelState::Built => {
                return Err(SlotterError::InvalidState(
                    "solve() called before add_constraints()".into(),
                ))
            }
            other => {
                return Err(SlotterError::InvalidState(format!(
                    "solve() may only be called once (state {other:?})"
                )))
            }
        }

        info!(?timeout, "solving");
        let outcome = match self.backend.solve(timeout) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = ModelState::Failed;
                return Err(e);
            }
        };

        let status = outcome.status;
        info!(%status, objective = ?outcome.objective, "solver returned");
        self.state = ModelState::Solved(status);
        self.solution = Some(outcome);
        Ok(status)
    }

    /// Converts the solved model into a schedule or a failure.
    ///
    /// # Errors
    /// `SlotterError::InvalidState` unless the model has just been solved.
    pub fn extract(&mut self) -> Result<ScheduleOutcome> {
        let status = match self.state {
            ModelState::Solved(status) => status,
            other => {
                return Err(SlotterError::InvalidState(format!(
                    "extract() requires a solved model (state {other:?})"
                )))
            }
        };
        let Some(outcome) = self.solution.as_ref().filter(|_| status.has_solution()) else {
            self.state = ModelState::Failed;
            return Ok(ScheduleOutcome::Failed(Failure::from_status(status)));
        };

        let extractor = ResultExtractor::new(self.week, self.students, self.assistants);
        let schedule = extractor.extract(&self.vars, outcome);

        let violations = check_schedule(
            &schedule,
            self.week,
            self.lab,
            self.students,
            self.assistants,
        );
        for v in &violations {
            warn!(kind = ?v.violation_type, entity = %v.entity_id, "{}", v.message);
        }

        self.state = ModelState::Extracted;
        Ok(ScheduleOutcome::Solved(schedule))
    }
}
