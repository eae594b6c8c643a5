//! Lab schedule (solution) model.
//!
//! A lab schedule lists the open sessions of the week in slot order.
//! Each session names its slot, the assistants staffing it, and the
//! students attending it. Closed slots do not appear.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One open lab session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Flat slot index.
    pub slot: usize,
    /// Human-readable slot label (e.g. `"MON-08:40"`).
    pub label: String,
    /// Assistant ids in roster order.
    pub assistants: Vec<String>,
    /// Student ids in roster order.
    pub students: Vec<String>,
}

impl Session {
    /// Creates an empty session.
    pub fn new(slot: usize, label: impl Into<String>) -> Self {
        Self {
            slot,
            label: label.into(),
            assistants: Vec::new(),
            students: Vec::new(),
        }
    }

    /// Adds an assistant.
    pub fn with_assistant(mut self, id: impl Into<String>) -> Self {
        self.assistants.push(id.into());
        self
    }

    /// Adds a student.
    pub fn with_student(mut self, id: impl Into<String>) -> Self {
        self.students.push(id.into());
        self
    }

    /// Number of attending students.
    #[inline]
    pub fn student_count(&self) -> usize {
        self.students.len()
    }
}

/// A complete weekly lab schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabSchedule {
    /// Open sessions, ascending by slot.
    pub sessions: Vec<Session>,
    /// Solved value of the assistant deviation variable.
    pub assistant_deviation: u32,
    /// Objective value reported by the solver, if any.
    pub objective: Option<f64>,
}

impl LabSchedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a session, keeping slot order.
    pub fn add_session(&mut self, session: Session) {
        let pos = self
            .sessions
            .partition_point(|existing| existing.slot < session.slot);
        self.sessions.insert(pos, session);
    }

    /// Number of open sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Session held in the slot with the given label.
    pub fn get(&self, label: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.label == label)
    }

    /// Session held in the given slot.
    pub fn session_at(&self, slot: usize) -> Option<&Session> {
        self.sessions.iter().find(|s| s.slot == slot)
    }

    /// Open slot indices in ascending order.
    pub fn open_slots(&self) -> Vec<usize> {
        self.sessions.iter().map(|s| s.slot).collect()
    }

    /// The session a student attends.
    pub fn session_for_student(&self, student_id: &str) -> Option<&Session> {
        self.sessions
            .iter()
            .find(|s| s.students.iter().any(|id| id == student_id))
    }

    /// Sessions staffed by an assistant.
    pub fn sessions_for_assistant(&self, assistant_id: &str) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.assistants.iter().any(|id| id == assistant_id))
            .collect()
    }

    /// Number of sessions per assistant that staffs at least one session.
    pub fn assistant_loads(&self) -> HashMap<String, usize> {
        let mut loads: HashMap<String, usize> = HashMap::new();
        for s in &self.sessions {
            for a in &s.assistants {
                *loads.entry(a.clone()).or_insert(0) += 1;
            }
        }
        loads
    }

    /// Total number of assigned students.
    pub fn student_count(&self) -> usize {
        self.sessions.iter().map(Session::student_count).sum()
    }

    /// Label → (assistants, students) in slot order.
    pub fn to_mapping(&self) -> Vec<(String, (Vec<String>, Vec<String>))> {
        self.sessions
            .iter()
            .map(|s| (s.label.clone(), (s.assistants.clone(), s.students.clone())))
            .collect()
    }
}

impl fmt::Display for LabSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.sessions {
            writeln!(
                f,
                "{}: assistants=[{}] students=[{}]",
                s.label,
                s.assistants.join(", "),
                s.students.join(", ")
            )?;
        }
        Ok(())
    }
}

/// A rule broken by a schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (student, assistant, or slot label).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Student attends no session.
    StudentUnassigned,
    /// Student attends more than one session.
    StudentDoubleBooked,
    /// Session holds more students than the lab seats.
    CapacityExceeded,
    /// Session has the wrong number of assistants.
    StaffingMismatch,
    /// Two open sessions overlap in time (including buffer).
    SessionOverlap,
    /// A person was placed in a slot they cannot attend.
    Ineligible,
    /// Assistant workloads differ by more than allowed.
    WorkloadImbalance,
    /// Number of open sessions differs from the requirement.
    SessionCountMismatch,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> LabSchedule {
        let mut s = LabSchedule::new();
        s.add_session(
            Session::new(9, "TUE-09:40")
                .with_assistant("A1")
                .with_assistant("A3")
                .with_student("S3"),
        );
        s.add_session(
            Session::new(2, "MON-10:40")
                .with_assistant("A1")
                .with_assistant("A2")
                .with_student("S1")
                .with_student("S2"),
        );
        s
    }

    #[test]
    fn test_sessions_kept_in_slot_order() {
        let s = sample_schedule();
        assert_eq!(s.open_slots(), vec![2, 9]);
        assert_eq!(s.sessions[0].label, "MON-10:40");
    }

    #[test]
    fn test_lookup() {
        let s = sample_schedule();
        assert_eq!(s.get("TUE-09:40").unwrap().slot, 9);
        assert!(s.get("WED-08:40").is_none());
        assert_eq!(s.session_at(2).unwrap().student_count(), 2);
        assert_eq!(s.session_for_student("S3").unwrap().slot, 9);
        assert!(s.session_for_student("S9").is_none());
    }

    #[test]
    fn test_assistant_loads() {
        let s = sample_schedule();
        let loads = s.assistant_loads();
        assert_eq!(loads["A1"], 2);
        assert_eq!(loads["A2"], 1);
        assert_eq!(s.sessions_for_assistant("A3").len(), 1);
        assert_eq!(s.student_count(), 3);
    }

    #[test]
    fn test_display() {
        let s = sample_schedule();
        let text = s.to_string();
        assert_eq!(
            text,
            "MON-10:40: assistants=[A1, A2] students=[S1, S2]\n\
             TUE-09:40: assistants=[A1, A3] students=[S3]\n"
        );
    }

    #[test]
    fn test_to_mapping() {
        let s = sample_schedule();
        let mapping = s.to_mapping();
        assert_eq!(mapping[1].0, "TUE-09:40");
        assert_eq!(mapping[1].1 .1, vec!["S3".to_string()]);
    }

    #[test]
    fn test_json_roundtrip() {
        let s = sample_schedule();
        let json = serde_json::to_string(&s).unwrap();
        let back: LabSchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
