//! Lab session assignment.
//!
//! Turns two slot rosters and the lab settings into a [`LabSchedule`]:
//! which slots open, which assistants staff them, and which students
//! attend each one.
//!
//! # Pipeline
//! 1. Derive slot availability from hour grids (with the impossible mask)
//! 2. [`validate_input`]: report structural problems up front
//! 3. [`ConstraintModel`]: declare variables, add constraints, solve
//! 4. [`ResultExtractor`]: read the optimum back into sessions
//!
//! [`LabScheduler`] runs the whole pipeline from configuration.
//!
//! # Outcomes
//! An optimal model yields [`ScheduleOutcome::Solved`]. Infeasible,
//! unbounded, or timed-out models yield [`ScheduleOutcome::Failed`] with
//! the status; only misuse and backend faults are errors.

mod extract;
mod kpi;
mod model;

pub use extract::ResultExtractor;
pub use kpi::WorkloadKpi;
pub use model::{ConstraintModel, DecisionVariables, ModelState};

use std::fmt;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::SlotterConfig;
use crate::error::{Result, SlotterError};
use crate::lp::{GoodLpModel, LinearModel, SolveStatus};
use crate::models::{AvailabilityGrid, LabSchedule, RosterTable, SlotRoster, WeekGeometry};
use crate::validation::validate_input;

/// Why no schedule was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// Terminal solver status.
    pub status: SolveStatus,
    /// Human-readable reason.
    pub reason: String,
}

impl Failure {
    pub(crate) fn from_status(status: SolveStatus) -> Self {
        let reason = match status {
            SolveStatus::Infeasible => "no assignment satisfies every constraint",
            SolveStatus::Unbounded => "objective is unbounded",
            SolveStatus::NotSolved => "solver stopped before finding a solution",
            SolveStatus::Optimal => "solver returned no values",
        };
        Self {
            status,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.reason)
    }
}

/// Result of a scheduling run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Solved(LabSchedule),
    Failed(Failure),
}

impl ScheduleOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }

    /// The schedule, if solved.
    pub fn schedule(&self) -> Option<&LabSchedule> {
        match self {
            Self::Solved(s) => Some(s),
            Self::Failed(_) => None,
        }
    }

    /// Consumes the outcome, returning the schedule if solved.
    pub fn into_schedule(self) -> Option<LabSchedule> {
        match self {
            Self::Solved(s) => Some(s),
            Self::Failed(_) => None,
        }
    }

    /// The failure, if not solved.
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Solved(_) => None,
            Self::Failed(f) => Some(f),
        }
    }
}

/// Runs scheduling end to end from a [`SlotterConfig`].
///
/// # Example
/// ```no_run
/// use lab_slotter::{LabScheduler, RosterReader, SlotterConfig};
///
/// let scheduler = LabScheduler::new(SlotterConfig::default()).unwrap();
/// let week = scheduler.week().unwrap();
/// let reader = RosterReader::new(&week);
/// let students = reader.read_file("students.csv").unwrap();
/// let assistants = reader.read_file("assistants.csv").unwrap();
///
/// let outcome = scheduler.schedule(&students, &assistants, None).unwrap();
/// if let Some(schedule) = outcome.schedule() {
///     print!("{schedule}");
/// }
/// ```
#[derive(Debug, Clone)]
pub struct LabScheduler {
    config: SlotterConfig,
}

impl LabScheduler {
    /// Creates a scheduler after validating `config`.
    pub fn new(config: SlotterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SlotterConfig {
        &self.config
    }

    /// Week geometry described by the configuration.
    pub fn week(&self) -> Result<WeekGeometry> {
        self.config.week_geometry()
    }

    /// Schedules two ingested roster tables.
    ///
    /// The impossible masks of both tables and `mask`, when given, are
    /// combined into one global mask applied to every person.
    pub fn schedule(
        &self,
        students: &RosterTable,
        assistants: &RosterTable,
        mask: Option<&AvailabilityGrid>,
    ) -> Result<ScheduleOutcome> {
        let week = self.week()?;
        let (students, assistants) = self.derive_rosters(&week, students, assistants, mask)?;
        self.schedule_slots(&week, &students, &assistants)
    }

    /// Derives the slot rosters [`schedule`](Self::schedule) works on.
    ///
    /// # Errors
    /// `SlotterError::InputFormat` if any grid does not fit `week`.
    pub fn derive_rosters(
        &self,
        week: &WeekGeometry,
        students: &RosterTable,
        assistants: &RosterTable,
        mask: Option<&AvailabilityGrid>,
    ) -> Result<(SlotRoster, SlotRoster)> {
        let masks: Vec<&AvailabilityGrid> = students
            .impossible
            .iter()
            .chain(&assistants.impossible)
            .chain(mask)
            .collect();
        if masks.iter().any(|m| !m.fits(week)) {
            return Err(SlotterError::input_format(
                "impossible mask",
                "mask does not match the week",
            ));
        }
        let global = masks
            .split_first()
            .map(|(first, rest)| rest.iter().fold((*first).clone(), |acc, m| acc.intersect(m)));

        Ok((
            derive_roster(week, students, global.as_ref(), "student roster")?,
            derive_roster(week, assistants, global.as_ref(), "assistant roster")?,
        ))
    }

    /// Schedules precomputed slot rosters with the `good_lp` backend.
    pub fn schedule_slots(
        &self,
        week: &WeekGeometry,
        students: &SlotRoster,
        assistants: &SlotRoster,
    ) -> Result<ScheduleOutcome> {
        self.schedule_with(week, students, assistants, GoodLpModel::new())
    }

    /// Schedules precomputed slot rosters on an arbitrary backend.
    ///
    /// An expired `[solver] timeout_secs` ends the run as
    /// [`ScheduleOutcome::Failed`] with `SolveStatus::NotSolved`. With
    /// [`GoodLpModel`] the abandoned solve keeps running on its worker
    /// thread until the solver returns.
    pub fn schedule_with<M: LinearModel>(
        &self,
        week: &WeekGeometry,
        students: &SlotRoster,
        assistants: &SlotRoster,
        backend: M,
    ) -> Result<ScheduleOutcome> {
        if let Err(errors) = validate_input(week, &self.config.lab, students, assistants) {
            for e in &errors {
                warn!(kind = ?e.kind, "{}", e.message);
            }
        }

        let mut model = ConstraintModel::new(week, &self.config.lab, students, assistants, backend);
        model.add_constraints()?;
        let status = model.solve(self.config.solver.timeout())?;
        let outcome = model.extract()?;

        match &outcome {
            ScheduleOutcome::Solved(s) => info!(
                sessions = s.session_count(),
                deviation = s.assistant_deviation,
                "schedule found"
            ),
            ScheduleOutcome::Failed(f) => warn!(%status, "{}", f.reason),
        }
        Ok(outcome)
    }
}

fn derive_roster(
    week: &WeekGeometry,
    table: &RosterTable,
    mask: Option<&AvailabilityGrid>,
    what: &str,
) -> Result<SlotRoster> {
    if let Some(p) = table.people.iter().find(|p| !p.grid.fits(week)) {
        return Err(SlotterError::input_format(
            what,
            format!("'{}' does not match the week", p.id),
        ));
    }
    Ok(SlotRoster::derive(week, &table.people, mask))
}
