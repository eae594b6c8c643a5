//! Hour-level and slot-level availability.
//!
//! Every person fills one cell per teaching hour of the week:
//!
//! | Cell | Meaning | Academic view | Part-time view |
//! |------|---------|---------------|----------------|
//! | `0` / blank | Free | available | available |
//! | `1` | Academic commitment (lecture, exam) | busy | available |
//! | `2` | Part-time / extra duty | available | busy |
//!
//! An [`AvailabilityGrid`] keeps both views per hour. [`AvailabilityGrid::to_slots`]
//! reduces each view to slot granularity: a slot is available iff every
//! hour it covers is available in that view *and* in the global
//! impossible mask.

use serde::{Deserialize, Serialize};

use super::WeekGeometry;
use crate::error::{Result, SlotterError};

/// Raw value of one availability cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Availability {
    /// No commitment.
    #[default]
    Free,
    /// Hard academic commitment.
    Busy,
    /// Extra duty (part-time job, assistantship duty).
    Extra,
}

impl Availability {
    /// Parses a table cell. Blank cells are `Free`.
    pub fn from_cell(cell: &str) -> Option<Self> {
        match cell.trim() {
            "" | "0" => Some(Self::Free),
            "1" => Some(Self::Busy),
            "2" => Some(Self::Extra),
            _ => None,
        }
    }

    /// Table cell encoding.
    pub fn as_cell(self) -> &'static str {
        match self {
            Self::Free => "0",
            Self::Busy => "1",
            Self::Extra => "2",
        }
    }
}

/// One person's weekly hour-level availability.
///
/// Both views are stored day-major, `days_in_week * hours_in_day` long.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityGrid {
    days_in_week: usize,
    hours_in_day: usize,
    /// `true` where the hour is not an academic commitment.
    academic: Vec<bool>,
    /// `true` where the hour is not a part-time commitment.
    part_time: Vec<bool>,
}

impl AvailabilityGrid {
    /// Builds a grid from raw cells in day-major order.
    ///
    /// # Errors
    /// Returns `SlotterError::InputFormat` if the cell count does not
    /// match the week.
    pub fn from_cells(week: &WeekGeometry, cells: &[Availability]) -> Result<Self> {
        if cells.len() != week.hours_in_week() {
            return Err(SlotterError::input_format(
                "availability grid",
                format!(
                    "expected {} cells ({} days x {} hours), got {}",
                    week.hours_in_week(),
                    week.days_in_week(),
                    week.hours_in_day(),
                    cells.len()
                ),
            ));
        }

        Ok(Self {
            days_in_week: week.days_in_week(),
            hours_in_day: week.hours_in_day(),
            academic: cells.iter().map(|c| *c != Availability::Busy).collect(),
            part_time: cells.iter().map(|c| *c != Availability::Extra).collect(),
        })
    }

    /// A grid with every hour free in both views.
    pub fn free(week: &WeekGeometry) -> Self {
        let n = week.hours_in_week();
        Self {
            days_in_week: week.days_in_week(),
            hours_in_day: week.hours_in_day(),
            academic: vec![true; n],
            part_time: vec![true; n],
        }
    }

    #[inline]
    fn index(&self, day: usize, hour: usize) -> usize {
        debug_assert!(day < self.days_in_week && hour < self.hours_in_day);
        day * self.hours_in_day + hour
    }

    /// Whether `(day, hour)` is free of academic commitments.
    pub fn academic_free(&self, day: usize, hour: usize) -> bool {
        self.academic[self.index(day, hour)]
    }

    /// Whether `(day, hour)` is free of part-time commitments.
    pub fn part_time_free(&self, day: usize, hour: usize) -> bool {
        self.part_time[self.index(day, hour)]
    }

    /// Whether this grid has the shape of `week`.
    pub fn fits(&self, week: &WeekGeometry) -> bool {
        self.days_in_week == week.days_in_week() && self.hours_in_day == week.hours_in_day()
    }

    /// Hour-wise AND of two grids.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub fn intersect(&self, other: &AvailabilityGrid) -> AvailabilityGrid {
        assert!(
            self.days_in_week == other.days_in_week && self.hours_in_day == other.hours_in_day,
            "grid shapes differ"
        );
        let and = |a: &[bool], b: &[bool]| -> Vec<bool> {
            a.iter().zip(b).map(|(x, y)| *x && *y).collect()
        };
        AvailabilityGrid {
            days_in_week: self.days_in_week,
            hours_in_day: self.hours_in_day,
            academic: and(&self.academic, &other.academic),
            part_time: and(&self.part_time, &other.part_time),
        }
    }

    /// Reduces hour-level availability to slot-level availability.
    ///
    /// Each view is first intersected with `mask` hour by hour, then a
    /// window of `hours_in_slot` hours slides along each day. A slot is
    /// available iff the window holds `hours_in_slot` available hours.
    ///
    /// # Panics
    /// Panics if either grid does not fit `week`.
    pub fn to_slots(&self, week: &WeekGeometry, mask: &AvailabilityGrid) -> SlotAvailability {
        assert!(self.fits(week) && mask.fits(week), "grid shape does not match week");

        let strict = slide(week, &self.academic, &mask.academic);
        let relaxed = slide(week, &self.part_time, &mask.part_time);
        let restricted = relaxed.iter().filter(|free| !**free).count();
        let altruism_parameter = week.slot_count() - restricted;

        SlotAvailability {
            strict,
            relaxed,
            altruism_parameter,
        }
    }
}

/// Sliding-window AND over each day, counting available hours in view.
fn slide(week: &WeekGeometry, hours: &[bool], mask: &[bool]) -> Vec<bool> {
    let width = week.hours_in_slot();
    let mut slots = Vec::with_capacity(week.slot_count());

    for day in 0..week.days_in_week() {
        let start = day * week.hours_in_day();
        let day_hours: Vec<bool> = (start..start + week.hours_in_day())
            .map(|h| hours[h] && mask[h])
            .collect();

        let mut window = day_hours[..width].iter().filter(|free| **free).count();
        slots.push(window == width);
        for offset in 1..week.slots_in_day() {
            window -= usize::from(day_hours[offset - 1]);
            window += usize::from(day_hours[offset + width - 1]);
            slots.push(window == width);
        }
    }

    slots
}

/// One person's slot-level availability, derived from an [`AvailabilityGrid`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotAvailability {
    /// Slot is clear of academic commitments and the global mask.
    pub strict: Vec<bool>,
    /// Slot is clear of part-time commitments and the global mask.
    pub relaxed: Vec<bool>,
    /// `slot_count - (slots blocked in the relaxed view)`.
    pub altruism_parameter: usize,
}

impl SlotAvailability {
    /// Slots blocked in the strict view.
    pub fn strict_blocked(&self) -> impl Iterator<Item = usize> + '_ {
        blocked(&self.strict)
    }

    /// Slots blocked in the relaxed view.
    pub fn relaxed_blocked(&self) -> impl Iterator<Item = usize> + '_ {
        blocked(&self.relaxed)
    }

    /// Slots open in both views.
    pub fn fully_available(&self) -> impl Iterator<Item = usize> + '_ {
        self.strict
            .iter()
            .zip(&self.relaxed)
            .enumerate()
            .filter_map(|(slot, (s, r))| (*s && *r).then_some(slot))
    }

    /// Number of slots open in the strict view.
    pub fn strict_count(&self) -> usize {
        self.strict.iter().filter(|free| **free).count()
    }
}

fn blocked(view: &[bool]) -> impl Iterator<Item = usize> + '_ {
    view.iter()
        .enumerate()
        .filter_map(|(slot, free)| (!free).then_some(slot))
}
