//! Schedule quality metrics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Sessions per assistant | Count of sessions each assistant staffs |
//! | Max deviation | Largest pairwise difference in sessions per assistant |
//! | Students per session | Attendance of every open session |
//! | Avg fill rate | Mean of attendance / lab capacity |
//! | Penalized students | Students seated in a slot that clashes with part-time work |

use std::collections::HashMap;

use serde::Serialize;

use crate::config::LabSettings;
use crate::models::{LabSchedule, SlotRoster};

/// Workload and fairness indicators of a schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadKpi {
    /// Sessions staffed per assistant, including idle ones.
    pub sessions_by_assistant: HashMap<String, usize>,
    /// `max − min` of `sessions_by_assistant`.
    pub max_deviation: usize,
    /// Attendance per session label.
    pub students_by_session: HashMap<String, usize>,
    /// Mean fill rate over open sessions (0.0..1.0).
    pub avg_fill_rate: f64,
    /// Students attending a part-time-blocked slot.
    pub penalized_students: usize,
    /// Sum of altruism weights over penalized students.
    pub total_penalty: usize,
}

impl WorkloadKpi {
    /// Computes KPIs for `schedule` against the rosters it was built from.
    pub fn calculate(
        schedule: &LabSchedule,
        lab: &LabSettings,
        students: &SlotRoster,
        assistants: &SlotRoster,
    ) -> Self {
        let mut sessions_by_assistant: HashMap<String, usize> =
            assistants.ids().iter().map(|id| (id.clone(), 0)).collect();
        for (id, load) in schedule.assistant_loads() {
            *sessions_by_assistant.entry(id).or_insert(0) += load;
        }
        let max_deviation = match (
            sessions_by_assistant.values().max(),
            sessions_by_assistant.values().min(),
        ) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        };

        let students_by_session: HashMap<String, usize> = schedule
            .sessions
            .iter()
            .map(|s| (s.label.clone(), s.student_count()))
            .collect();

        let avg_fill_rate = if schedule.sessions.is_empty() || lab.lab_capacity == 0 {
            0.0
        } else {
            let sum: f64 = schedule
                .sessions
                .iter()
                .map(|s| s.student_count() as f64 / lab.lab_capacity as f64)
                .sum();
            sum / schedule.sessions.len() as f64
        };

        let mut penalized_students = 0;
        let mut total_penalty = 0;
        for session in &schedule.sessions {
            for id in &session.students {
                let Some(i) = students.index_of(id) else {
                    continue;
                };
                let slots = students.slots(i);
                if !slots.relaxed[session.slot] {
                    penalized_students += 1;
                    total_penalty += slots.altruism_parameter;
                }
            }
        }

        Self {
            sessions_by_assistant,
            max_deviation,
            students_by_session,
            avg_fill_rate,
            penalized_students,
            total_penalty,
        }
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_deviation: usize, min_fill_rate: f64) -> bool {
        self.max_deviation <= max_deviation && self.avg_fill_rate >= min_fill_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, SlotAvailability};

    fn slots(relaxed: [bool; 3], altruism: usize) -> SlotAvailability {
        SlotAvailability {
            strict: vec![true; 3],
            relaxed: relaxed.to_vec(),
            altruism_parameter: altruism,
        }
    }

    fn lab() -> LabSettings {
        LabSettings {
            lab_capacity: 4,
            ..LabSettings::default()
        }
    }

    #[test]
    fn test_kpi_basic() {
        let students = SlotRoster::default()
            .with_person("S0", slots([true; 3], 3))
            .with_person("S1", slots([false, true, true], 2))
            .with_person("S2", slots([true; 3], 3));
        let assistants = SlotRoster::default()
            .with_person("A0", slots([true; 3], 3))
            .with_person("A1", slots([true; 3], 3))
            .with_person("A2", slots([true; 3], 3));

        let mut schedule = LabSchedule::new();
        schedule.add_session(
            Session::new(0, "MON-08:40")
                .with_assistant("A0")
                .with_assistant("A1")
                .with_student("S0")
                .with_student("S1"),
        );
        schedule.add_session(
            Session::new(2, "MON-10:40")
                .with_assistant("A0")
                .with_student("S2"),
        );

        let kpi = WorkloadKpi::calculate(&schedule, &lab(), &students, &assistants);

        assert_eq!(kpi.sessions_by_assistant["A0"], 2);
        assert_eq!(kpi.sessions_by_assistant["A2"], 0);
        // A0=2, A2=0
        assert_eq!(kpi.max_deviation, 2);
        assert_eq!(kpi.students_by_session["MON-08:40"], 2);
        // (2/4 + 1/4) / 2
        assert!((kpi.avg_fill_rate - 0.375).abs() < 1e-10);
        assert_eq!(kpi.penalized_students, 1);
        assert_eq!(kpi.total_penalty, 2);
    }

    #[test]
    fn test_kpi_empty_schedule() {
        let kpi = WorkloadKpi::calculate(
            &LabSchedule::new(),
            &lab(),
            &SlotRoster::default(),
            &SlotRoster::default(),
        );
        assert_eq!(kpi.max_deviation, 0);
        assert_eq!(kpi.avg_fill_rate, 0.0);
        assert_eq!(kpi.penalized_students, 0);
    }

    #[test]
    fn test_meets_thresholds() {
        let kpi = WorkloadKpi {
            sessions_by_assistant: HashMap::new(),
            max_deviation: 1,
            students_by_session: HashMap::new(),
            avg_fill_rate: 0.8,
            penalized_students: 0,
            total_penalty: 0,
        };
        assert!(kpi.meets_thresholds(1, 0.5));
        assert!(!kpi.meets_thresholds(0, 0.5));
        assert!(!kpi.meets_thresholds(2, 0.9));
    }
}
