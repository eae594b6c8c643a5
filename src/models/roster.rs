//! Rosters of people and their availability.
//!
//! A roster is stored as an arena: people are addressed by their dense
//! index (input order), and the model's decision variables use the same
//! index. Identifiers are only consulted when results are rendered.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{AvailabilityGrid, SlotAvailability, WeekGeometry};

/// A person's identifier and raw availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonAvailability {
    /// Unique identifier (student number, staff id).
    pub id: String,
    /// Hour-level availability.
    pub grid: AvailabilityGrid,
}

impl PersonAvailability {
    /// Creates a new entry.
    pub fn new(id: impl Into<String>, grid: AvailabilityGrid) -> Self {
        Self {
            id: id.into(),
            grid,
        }
    }
}

/// An ingested roster table.
///
/// The global impossible mask arrives through its own field, never as a
/// member of `people`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterTable {
    /// Real people, in input order.
    pub people: Vec<PersonAvailability>,
    /// Hours when no session may run, if the table supplied them.
    pub impossible: Option<AvailabilityGrid>,
}

impl RosterTable {
    /// Creates a table without an impossible mask.
    pub fn new(people: Vec<PersonAvailability>) -> Self {
        Self {
            people,
            impossible: None,
        }
    }

    /// Sets the impossible mask.
    pub fn with_impossible(mut self, mask: AvailabilityGrid) -> Self {
        self.impossible = Some(mask);
        self
    }

    /// Number of people.
    pub fn len(&self) -> usize {
        self.people.len()
    }

    /// Whether the table holds no people.
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

/// Slot-level availability for every member of a roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRoster {
    ids: Vec<String>,
    slots: Vec<SlotAvailability>,
}

impl SlotRoster {
    /// Derives slot availability for each person.
    ///
    /// A missing `mask` means every hour is allowed.
    pub fn derive(
        week: &WeekGeometry,
        people: &[PersonAvailability],
        mask: Option<&AvailabilityGrid>,
    ) -> Self {
        let free;
        let mask = match mask {
            Some(m) => m,
            None => {
                free = AvailabilityGrid::free(week);
                &free
            }
        };

        let mut roster = Self::default();
        for person in people {
            let slots = person.grid.to_slots(week, mask);
            trace!(
                person = %person.id,
                strict = slots.strict_count(),
                altruism = slots.altruism_parameter,
                "derived slot availability"
            );
            roster.push(person.id.clone(), slots);
        }
        roster
    }

    /// Appends a person with precomputed slot availability.
    pub fn push(&mut self, id: impl Into<String>, slots: SlotAvailability) {
        self.ids.push(id.into());
        self.slots.push(slots);
    }

    /// Adds a person (builder form of [`push`](Self::push)).
    pub fn with_person(mut self, id: impl Into<String>, slots: SlotAvailability) -> Self {
        self.push(id, slots);
        self
    }

    /// Number of people.
    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the roster is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Identifier of person `index`.
    #[inline]
    pub fn id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// All identifiers in roster order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Slot availability of person `index`.
    #[inline]
    pub fn slots(&self, index: usize) -> &SlotAvailability {
        &self.slots[index]
    }

    /// Index of the person with the given identifier.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|i| i == id)
    }

    /// Iterates `(index, id, availability)` in roster order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, &SlotAvailability)> {
        self.ids
            .iter()
            .zip(&self.slots)
            .enumerate()
            .map(|(i, (id, slots))| (i, id.as_str(), slots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;

    #[test]
    fn test_derive_without_mask() {
        let week = WeekGeometry::new(1, 3, 2).unwrap();
        let busy_first = AvailabilityGrid::from_cells(
            &week,
            &[Availability::Busy, Availability::Free, Availability::Free],
        )
        .unwrap();
        let people = vec![
            PersonAvailability::new("S1", AvailabilityGrid::free(&week)),
            PersonAvailability::new("S2", busy_first),
        ];

        let roster = SlotRoster::derive(&week, &people, None);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.id(1), "S2");
        assert_eq!(roster.slots(0).strict, vec![true, true]);
        assert_eq!(roster.slots(1).strict, vec![false, true]);
        assert_eq!(roster.index_of("S2"), Some(1));
        assert_eq!(roster.index_of("S3"), None);
    }

    #[test]
    fn test_derive_with_mask() {
        let week = WeekGeometry::new(1, 3, 2).unwrap();
        let mask = AvailabilityGrid::from_cells(
            &week,
            &[Availability::Free, Availability::Free, Availability::Busy],
        )
        .unwrap();
        let people = vec![PersonAvailability::new("A1", AvailabilityGrid::free(&week))];

        let roster = SlotRoster::derive(&week, &people, Some(&mask));
        assert_eq!(roster.slots(0).strict, vec![true, false]);
    }

    #[test]
    fn test_iter_order() {
        let week = WeekGeometry::new(1, 2, 1).unwrap();
        let people: Vec<_> = ["b", "a", "c"]
            .iter()
            .map(|id| PersonAvailability::new(*id, AvailabilityGrid::free(&week)))
            .collect();
        let roster = SlotRoster::derive(&week, &people, None);
        let ids: Vec<&str> = roster.iter().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
