//! Input validation and schedule verification.
//!
//! [`validate_input`] runs before a model is built and reports every
//! structural problem it can detect cheaply:
//! - Duplicate IDs within a roster
//! - Empty student roster
//! - People with no eligible slot
//! - Demand above total seat capacity
//! - Fewer assistants than one session needs
//! - Fewer non-overlapping slots than required sessions
//!
//! Most of these make the model infeasible; the solver would discover
//! that too, but only after building and searching the whole model.
//!
//! [`check_schedule`] re-verifies a finished schedule against the same
//! rules the model encodes.

use std::collections::{HashMap, HashSet};

use crate::config::LabSettings;
use crate::models::{LabSchedule, SlotRoster, Violation, ViolationType, WeekGeometry};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two people in one roster share an ID.
    DuplicateId,
    /// There are no students to schedule.
    EmptyRoster,
    /// A person cannot attend any slot.
    NoEligibleSlot,
    /// Required sessions cannot seat every student.
    InsufficientCapacity,
    /// Not enough assistants to staff a single session.
    InsufficientStaff,
    /// The week cannot hold the required number of non-overlapping sessions.
    TooFewSlots,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the inputs of a scheduling run.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    week: &WeekGeometry,
    lab: &LabSettings,
    students: &SlotRoster,
    assistants: &SlotRoster,
) -> ValidationResult {
    let mut errors = Vec::new();

    for (label, roster) in [("student", students), ("assistant", assistants)] {
        let mut ids = HashSet::new();
        for id in roster.ids() {
            if !ids.insert(id.as_str()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateId,
                    format!("Duplicate {label} ID: {id}"),
                ));
            }
        }
    }

    if students.is_empty() {
        errors.push(ValidationError::new(
            ValidationErrorKind::EmptyRoster,
            "Student roster is empty",
        ));
    }

    for (_, id, slots) in students.iter() {
        if slots.strict_count() == 0 {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoEligibleSlot,
                format!("Student '{id}' has no available slot"),
            ));
        }
    }
    for (_, id, slots) in assistants.iter() {
        if slots.fully_available().next().is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::NoEligibleSlot,
                format!("Assistant '{id}' has no available slot"),
            ));
        }
    }

    let seats = lab.required_session_count * lab.lab_capacity;
    if students.len() > seats {
        errors.push(ValidationError::new(
            ValidationErrorKind::InsufficientCapacity,
            format!(
                "{} students exceed {} seats ({} sessions x {})",
                students.len(),
                seats,
                lab.required_session_count,
                lab.lab_capacity
            ),
        ));
    }

    if lab.required_session_count > 0 && assistants.len() < lab.assistants_per_session {
        errors.push(ValidationError::new(
            ValidationErrorKind::InsufficientStaff,
            format!(
                "{} assistants cannot staff sessions needing {}",
                assistants.len(),
                lab.assistants_per_session
            ),
        ));
    }

    let capacity = max_disjoint_sessions(week);
    if lab.required_session_count > capacity {
        errors.push(ValidationError::new(
            ValidationErrorKind::TooFewSlots,
            format!(
                "{} sessions required but at most {} fit without overlap",
                lab.required_session_count, capacity
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Most sessions the week can hold with no two overlapping.
///
/// Within a day, starts must be `hours_in_slot + buffer_hours` apart,
/// so greedily packing from the first start is optimal.
pub fn max_disjoint_sessions(week: &WeekGeometry) -> usize {
    let reach = week.hours_in_slot() + week.buffer_hours();
    let per_day = week.slots_in_day().div_ceil(reach.max(1));
    per_day * week.days_in_week()
}

/// Verifies a schedule against week geometry, lab settings, and rosters.
///
/// Returns every violation found; an empty list means the schedule
/// honours all hard rules. Workload balance is checked against
/// `lab.max_assistant_deviation`.
pub fn check_schedule(
    schedule: &LabSchedule,
    week: &WeekGeometry,
    lab: &LabSettings,
    students: &SlotRoster,
    assistants: &SlotRoster,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    if schedule.session_count() != lab.required_session_count {
        violations.push(Violation::new(
            ViolationType::SessionCountMismatch,
            "schedule",
            format!(
                "{} sessions open, {} required",
                schedule.session_count(),
                lab.required_session_count
            ),
        ));
    }

    // Student attendance
    let mut attendance: HashMap<&str, usize> = HashMap::new();
    for session in &schedule.sessions {
        for id in &session.students {
            *attendance.entry(id.as_str()).or_insert(0) += 1;
            let eligible = students
                .index_of(id)
                .is_some_and(|i| students.slots(i).strict[session.slot]);
            if !eligible {
                violations.push(Violation::new(
                    ViolationType::Ineligible,
                    id.clone(),
                    format!("Student '{id}' cannot attend {}", session.label),
                ));
            }
        }
    }
    for id in students.ids() {
        match attendance.get(id.as_str()).copied().unwrap_or(0) {
            0 => violations.push(Violation::new(
                ViolationType::StudentUnassigned,
                id.clone(),
                format!("Student '{id}' attends no session"),
            )),
            1 => {}
            n => violations.push(Violation::new(
                ViolationType::StudentDoubleBooked,
                id.clone(),
                format!("Student '{id}' attends {n} sessions"),
            )),
        }
    }

    // Capacity and staffing
    for session in &schedule.sessions {
        if session.student_count() > lab.lab_capacity {
            violations.push(Violation::new(
                ViolationType::CapacityExceeded,
                session.label.clone(),
                format!(
                    "{} students in a lab of {}",
                    session.student_count(),
                    lab.lab_capacity
                ),
            ));
        }
        if session.assistants.len() != lab.assistants_per_session {
            violations.push(Violation::new(
                ViolationType::StaffingMismatch,
                session.label.clone(),
                format!(
                    "{} assistants, {} required",
                    session.assistants.len(),
                    lab.assistants_per_session
                ),
            ));
        }
        for id in &session.assistants {
            let eligible = assistants.index_of(id).is_some_and(|i| {
                let slots = assistants.slots(i);
                slots.strict[session.slot] && slots.relaxed[session.slot]
            });
            if !eligible {
                violations.push(Violation::new(
                    ViolationType::Ineligible,
                    id.clone(),
                    format!("Assistant '{id}' cannot staff {}", session.label),
                ));
            }
        }
    }

    // Overlap
    let open: HashSet<usize> = schedule.open_slots().into_iter().collect();
    for (a, b) in week.overlapping_pairs() {
        if open.contains(&a) && open.contains(&b) {
            violations.push(Violation::new(
                ViolationType::SessionOverlap,
                week.label(a),
                format!("{} overlaps {}", week.label(a), week.label(b)),
            ));
        }
    }

    // Workload balance across the whole assistant roster
    let loads = schedule.assistant_loads();
    let counts: Vec<usize> = assistants
        .ids()
        .iter()
        .map(|id| loads.get(id).copied().unwrap_or(0))
        .collect();
    if let (Some(max), Some(min)) = (counts.iter().max(), counts.iter().min()) {
        let spread = max - min;
        if spread > lab.max_assistant_deviation as usize {
            violations.push(Violation::new(
                ViolationType::WorkloadImbalance,
                "assistants",
                format!(
                    "workloads differ by {spread}, at most {} allowed",
                    lab.max_assistant_deviation
                ),
            ));
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Session, SlotAvailability};

    fn week() -> WeekGeometry {
        // 1 day, 4 hours, 2-hour slots → 3 slots; (0,1) and (1,2) overlap
        WeekGeometry::new(1, 4, 2).unwrap()
    }

    fn free(n: usize) -> SlotAvailability {
        SlotAvailability {
            strict: vec![true; n],
            relaxed: vec![true; n],
            altruism_parameter: n,
        }
    }

    fn lab(capacity: usize, sessions: usize) -> LabSettings {
        LabSettings {
            lab_capacity: capacity,
            assistants_per_session: 1,
            max_assistant_deviation: 1,
            deviation_weight: 1.0,
            required_session_count: sessions,
        }
    }

    fn roster(prefix: &str, n: usize) -> SlotRoster {
        (0..n).fold(SlotRoster::default(), |r, i| {
            r.with_person(format!("{prefix}{i}"), free(3))
        })
    }

    #[test]
    fn test_valid_input() {
        let result = validate_input(&week(), &lab(2, 2), &roster("S", 3), &roster("A", 2));
        assert!(result.is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let students = roster("S", 1).with_person("S0", free(3));
        let errors = validate_input(&week(), &lab(2, 1), &students, &roster("A", 1)).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_empty_and_ineligible() {
        let blocked = SlotAvailability {
            strict: vec![false; 3],
            relaxed: vec![true; 3],
            altruism_parameter: 3,
        };
        let students = SlotRoster::default();
        let assistants = SlotRoster::default().with_person("A0", blocked.clone());
        let errors = validate_input(&week(), &lab(2, 1), &students, &assistants).unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::EmptyRoster));
        assert!(kinds.contains(&ValidationErrorKind::NoEligibleSlot));

        let students = SlotRoster::default().with_person("S0", blocked);
        let errors = validate_input(&week(), &lab(2, 1), &students, &roster("A", 1)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("S0"));
    }

    #[test]
    fn test_capacity_staff_and_slots() {
        let errors = validate_input(&week(), &lab(1, 3), &roster("S", 4), &roster("A", 0))
            .unwrap_err();
        let kinds: Vec<_> = errors.iter().map(|e| e.kind.clone()).collect();
        assert!(kinds.contains(&ValidationErrorKind::InsufficientCapacity));
        assert!(kinds.contains(&ValidationErrorKind::InsufficientStaff));
        // Only slots 0 and 2 can both be open
        assert!(kinds.contains(&ValidationErrorKind::TooFewSlots));
    }

    #[test]
    fn test_max_disjoint_sessions() {
        assert_eq!(max_disjoint_sessions(&week()), 2);
        let standard = WeekGeometry::new(5, 9, 2).unwrap();
        assert_eq!(max_disjoint_sessions(&standard), 20);
        assert_eq!(max_disjoint_sessions(&standard.with_buffer_hours(1)), 15);
    }

    #[test]
    fn test_check_valid_schedule() {
        let mut s = LabSchedule::new();
        s.add_session(Session::new(0, "MON-08:40").with_assistant("A0").with_student("S0"));
        s.add_session(
            Session::new(2, "MON-10:40")
                .with_assistant("A1")
                .with_student("S1")
                .with_student("S2"),
        );
        let v = check_schedule(&s, &week(), &lab(2, 2), &roster("S", 3), &roster("A", 2));
        assert!(v.is_empty(), "unexpected violations: {v:?}");
    }

    #[test]
    fn test_check_detects_violations() {
        let mut s = LabSchedule::new();
        s.add_session(
            Session::new(0, "MON-08:40")
                .with_student("S0")
                .with_student("S1")
                .with_student("S2"),
        );
        s.add_session(
            Session::new(1, "MON-09:40")
                .with_assistant("A0")
                .with_assistant("A0")
                .with_student("S0"),
        );
        let v = check_schedule(&s, &week(), &lab(2, 2), &roster("S", 4), &roster("A", 2));
        let kinds: Vec<_> = v.iter().map(|x| x.violation_type.clone()).collect();

        assert!(kinds.contains(&ViolationType::StudentDoubleBooked)); // S0
        assert!(kinds.contains(&ViolationType::StudentUnassigned)); // S3
        assert!(kinds.contains(&ViolationType::CapacityExceeded)); // slot 0
        assert!(kinds.contains(&ViolationType::StaffingMismatch)); // both slots
        assert!(kinds.contains(&ViolationType::SessionOverlap)); // 0 and 1
        assert!(kinds.contains(&ViolationType::WorkloadImbalance)); // A0=2, A1=0
    }

    #[test]
    fn test_check_ineligible() {
        let students = SlotRoster::default().with_person(
            "S0",
            SlotAvailability {
                strict: vec![false, true, true],
                relaxed: vec![true; 3],
                altruism_parameter: 3,
            },
        );
        let mut s = LabSchedule::new();
        s.add_session(Session::new(0, "MON-08:40").with_assistant("A0").with_student("S0"));
        let v = check_schedule(&s, &week(), &lab(2, 1), &students, &roster("A", 1));
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].violation_type, ViolationType::Ineligible);
    }
}
