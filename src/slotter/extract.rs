//! Converts solver values into a [`LabSchedule`].

use tracing::debug;

use super::model::DecisionVariables;
use crate::lp::{SolveOutcome, VarId};
use crate::models::{LabSchedule, Session, SlotRoster, WeekGeometry};

/// Reads an optimal solution back into sessions.
///
/// A binary is treated as set when its value exceeds 0.5, which absorbs
/// floating-point noise from the solver. Ids are listed in roster order.
#[derive(Debug, Clone, Copy)]
pub struct ResultExtractor<'a> {
    week: &'a WeekGeometry,
    students: &'a SlotRoster,
    assistants: &'a SlotRoster,
}

impl<'a> ResultExtractor<'a> {
    pub fn new(week: &'a WeekGeometry, students: &'a SlotRoster, assistants: &'a SlotRoster) -> Self {
        Self {
            week,
            students,
            assistants,
        }
    }

    /// Builds the schedule from `outcome`.
    ///
    /// An outcome without values yields an empty schedule.
    pub fn extract(&self, vars: &DecisionVariables, outcome: &SolveOutcome) -> LabSchedule {
        let is_set = |var: VarId| outcome.value(var).is_some_and(|v| v > 0.5);

        let mut schedule = LabSchedule::new();
        for (slot, &open) in vars.session_open.iter().enumerate() {
            if !is_set(open) {
                continue;
            }
            let mut session = Session::new(slot, self.week.label(slot));
            for (a, id) in self.assistants.ids().iter().enumerate() {
                if is_set(vars.assistant_at[slot][a]) {
                    session = session.with_assistant(id.as_str());
                }
            }
            for (s, id) in self.students.ids().iter().enumerate() {
                if is_set(vars.student_at[slot][s]) {
                    session = session.with_student(id.as_str());
                }
            }
            debug!(
                label = %session.label,
                assistants = session.assistants.len(),
                students = session.student_count(),
                "extracted session"
            );
            schedule.add_session(session);
        }

        schedule.assistant_deviation = outcome
            .value(vars.assistant_deviation)
            .map_or(0, |v| v.round().max(0.0) as u32);
        schedule.objective = outcome.objective;
        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lp::SolveStatus;
    use crate::models::SlotAvailability;

    fn free(n: usize) -> SlotAvailability {
        SlotAvailability {
            strict: vec![true; n],
            relaxed: vec![true; n],
            altruism_parameter: n,
        }
    }

    #[test]
    fn test_extract_from_values() {
        // 1 day, 3 hours, 1-hour slots: slots 0..3
        let week = WeekGeometry::new(1, 3, 1).unwrap();
        let students = SlotRoster::default()
            .with_person("S0", free(3))
            .with_person("S1", free(3));
        let assistants = SlotRoster::default().with_person("A0", free(3));

        // Ids laid out by hand: open 0..3, students 3..9, assistants 9..12,
        // deviation 12, penalties 13..15
        let vars = DecisionVariables {
            session_open: (0..3).map(VarId).collect(),
            student_at: (0..3)
                .map(|t| vec![VarId(3 + 2 * t), VarId(4 + 2 * t)])
                .collect(),
            assistant_at: (0..3).map(|t| vec![VarId(9 + t)]).collect(),
            assistant_deviation: VarId(12),
            student_penalty: vec![VarId(13), VarId(14)],
        };
        let mut values = vec![0.0; 15];
        values[2] = 0.9999; // slot 2 open
        values[7] = 1.0; // S0 at slot 2
        values[8] = 1.0; // S1 at slot 2
        values[11] = 1.0; // A0 at slot 2
        values[12] = 0.0000001;
        let outcome = SolveOutcome {
            status: SolveStatus::Optimal,
            values,
            objective: Some(0.0),
        };

        let schedule = ResultExtractor::new(&week, &students, &assistants).extract(&vars, &outcome);
        assert_eq!(schedule.session_count(), 1);
        let session = schedule.session_at(2).unwrap();
        assert_eq!(session.label, "MON-10:40");
        assert_eq!(session.students, vec!["S0", "S1"]);
        assert_eq!(session.assistants, vec!["A0"]);
        assert_eq!(schedule.assistant_deviation, 0);
        assert_eq!(schedule.objective, Some(0.0));
    }

    #[test]
    fn test_extract_without_values() {
        let week = WeekGeometry::new(1, 2, 1).unwrap();
        let roster = SlotRoster::default();
        let vars = DecisionVariables {
            session_open: vec![VarId(0), VarId(1)],
            student_at: vec![vec![], vec![]],
            assistant_at: vec![vec![], vec![]],
            assistant_deviation: VarId(2),
            student_penalty: vec![],
        };
        let outcome = SolveOutcome::without_solution(SolveStatus::NotSolved);
        let schedule = ResultExtractor::new(&week, &roster, &roster).extract(&vars, &outcome);
        assert_eq!(schedule.session_count(), 0);
        assert_eq!(schedule.objective, None);
    }
}
