//! Weekly slot grid.
//!
//! A week is `days_in_week` days of `hours_in_day` teaching hours each.
//! A slot is a run of `hours_in_slot` consecutive hours inside one day,
//! identified by its start hour. Slots are numbered densely, day-major:
//!
//! ```text
//! slot = day * slots_in_day + offset      offset ∈ [0, slots_in_day)
//! slots_in_day = hours_in_day - hours_in_slot + 1
//! ```
//!
//! # Overlap Model
//! Two slots on the same day conflict when their start hours are less than
//! `hours_in_slot + buffer_hours` apart. Slots on different days never
//! conflict.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotterError};

/// Day abbreviations used in slot labels, Monday first.
pub const DAY_NAMES: [&str; 7] = ["MON", "TUE", "WED", "THU", "FRI", "SAT", "SUN"];

/// Wall-clock time of the first teaching hour.
///
/// Serialized as `"HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime {
    /// Hour of day (0-23).
    pub hour: u32,
    /// Minute of hour (0-59).
    pub minute: u32,
}

impl ClockTime {
    /// Creates a clock time, rejecting out-of-range components.
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(SlotterError::Config(format!(
                "clock time {hour}:{minute} is out of range"
            )));
        }
        Ok(Self { hour, minute })
    }
}

impl Default for ClockTime {
    fn default() -> Self {
        Self {
            hour: 8,
            minute: 40,
        }
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for ClockTime {
    type Err = SlotterError;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| SlotterError::Config(format!("expected HH:MM, got '{s}'")))?;
        let hour = h
            .parse()
            .map_err(|_| SlotterError::Config(format!("invalid hour in '{s}'")))?;
        let minute = m
            .parse()
            .map_err(|_| SlotterError::Config(format!("invalid minute in '{s}'")))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = SlotterError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

/// Immutable geometry of the weekly slot grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekGeometry {
    days_in_week: usize,
    hours_in_day: usize,
    hours_in_slot: usize,
    buffer_hours: usize,
    first_hour: ClockTime,
    slots_in_day: usize,
}

impl WeekGeometry {
    /// Creates a week with no buffer and the default label origin (08:40).
    ///
    /// # Errors
    /// Returns `SlotterError::Config` if `days_in_week` is not in `1..=7`,
    /// `hours_in_slot` is zero, or a slot is longer than a day.
    pub fn new(days_in_week: usize, hours_in_day: usize, hours_in_slot: usize) -> Result<Self> {
        if days_in_week == 0 || days_in_week > DAY_NAMES.len() {
            return Err(SlotterError::Config(format!(
                "days_in_week must be in 1..={}, got {days_in_week}",
                DAY_NAMES.len()
            )));
        }
        if hours_in_slot == 0 {
            return Err(SlotterError::Config("hours_in_slot must be positive".into()));
        }
        if hours_in_slot > hours_in_day {
            return Err(SlotterError::Config(format!(
                "hours_in_slot ({hours_in_slot}) exceeds hours_in_day ({hours_in_day})"
            )));
        }

        Ok(Self {
            days_in_week,
            hours_in_day,
            hours_in_slot,
            buffer_hours: 0,
            first_hour: ClockTime::default(),
            slots_in_day: hours_in_day - hours_in_slot + 1,
        })
    }

    /// Sets the mandatory gap (hours) between two sessions on the same day.
    pub fn with_buffer_hours(mut self, buffer_hours: usize) -> Self {
        self.buffer_hours = buffer_hours;
        self
    }

    /// Sets the wall-clock time of the first hour (label origin).
    pub fn with_first_hour(mut self, first_hour: ClockTime) -> Self {
        self.first_hour = first_hour;
        self
    }

    #[inline]
    pub fn days_in_week(&self) -> usize {
        self.days_in_week
    }

    #[inline]
    pub fn hours_in_day(&self) -> usize {
        self.hours_in_day
    }

    #[inline]
    pub fn hours_in_slot(&self) -> usize {
        self.hours_in_slot
    }

    #[inline]
    pub fn buffer_hours(&self) -> usize {
        self.buffer_hours
    }

    #[inline]
    pub fn first_hour(&self) -> ClockTime {
        self.first_hour
    }

    /// Number of valid slot start hours per day.
    #[inline]
    pub fn slots_in_day(&self) -> usize {
        self.slots_in_day
    }

    /// Total number of hour cells in one week.
    #[inline]
    pub fn hours_in_week(&self) -> usize {
        self.days_in_week * self.hours_in_day
    }

    /// Total number of slots in one week.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.days_in_week * self.slots_in_day
    }

    /// Flat index of the slot starting `offset` hours into `day`.
    ///
    /// Returns `None` if either coordinate is out of range.
    pub fn slot_of(&self, day: usize, offset: usize) -> Option<usize> {
        (day < self.days_in_week && offset < self.slots_in_day)
            .then(|| day * self.slots_in_day + offset)
    }

    /// Decomposes a slot into `(day, offset)`.
    pub fn day_and_offset(&self, slot: usize) -> (usize, usize) {
        (slot / self.slots_in_day, slot % self.slots_in_day)
    }

    /// Hour indices (within the flattened week) covered by a slot.
    pub fn slot_hours(&self, slot: usize) -> std::ops::Range<usize> {
        let (day, offset) = self.day_and_offset(slot);
        let start = day * self.hours_in_day + offset;
        start..start + self.hours_in_slot
    }

    /// Conflicting slot pairs under the configured buffer.
    pub fn overlapping_pairs(&self) -> Vec<(usize, usize)> {
        self.overlapping_pairs_with(self.buffer_hours)
    }

    /// Conflicting slot pairs `(a, b)` with `a < b` for an explicit buffer.
    ///
    /// For every start `s` of every day this emits `(s, s + h)` for
    /// `h ∈ 1..hours_in_slot + buffer_hours`, stopping at the end of
    /// the day. Pairs never span two days.
    pub fn overlapping_pairs_with(&self, buffer_hours: usize) -> Vec<(usize, usize)> {
        let reach = self.hours_in_slot + buffer_hours;
        let mut pairs = Vec::new();

        for day in 0..self.days_in_week {
            let base = day * self.slots_in_day;
            for start in 0..self.slots_in_day {
                for step in 1..reach {
                    if start + step >= self.slots_in_day {
                        break;
                    }
                    pairs.push((base + start, base + start + step));
                }
            }
        }

        pairs
    }

    /// Human-readable slot label, e.g. `"MON-08:40"`.
    ///
    /// The hour is `first_hour.hour + offset` and is not wrapped past 23;
    /// `SlotterConfig::validate` rejects weeks whose slots would.
    ///
    /// # Panics
    /// Panics if `slot >= slot_count()`.
    pub fn label(&self, slot: usize) -> String {
        assert!(
            slot < self.slot_count(),
            "slot {slot} out of range (slot_count = {})",
            self.slot_count()
        );
        let (day, offset) = self.day_and_offset(slot);
        format!(
            "{}-{:02}:{:02}",
            DAY_NAMES[day],
            self.first_hour.hour as usize + offset,
            self.first_hour.minute
        )
    }

    /// Inverse of [`label`](Self::label) for labels within the clock.
    ///
    /// Returns `None` for an unknown day, a mismatching minute, or an
    /// hour outside the day's slot range.
    pub fn parse_label(&self, label: &str) -> Option<usize> {
        let (day_name, time) = label.split_once('-')?;
        let day = DAY_NAMES[..self.days_in_week]
            .iter()
            .position(|d| *d == day_name)?;
        let time: ClockTime = time.parse().ok()?;
        if time.minute != self.first_hour.minute || time.hour < self.first_hour.hour {
            return None;
        }
        self.slot_of(day, (time.hour - self.first_hour.hour) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard_week() -> WeekGeometry {
        WeekGeometry::new(5, 9, 2).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let w = standard_week();
        assert_eq!(w.slots_in_day(), 8);
        assert_eq!(w.slot_count(), 40);
        assert_eq!(w.hours_in_week(), 45);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(WeekGeometry::new(5, 2, 3).is_err()); // slot longer than day
        assert!(WeekGeometry::new(0, 9, 2).is_err());
        assert!(WeekGeometry::new(8, 9, 2).is_err());
        assert!(WeekGeometry::new(5, 9, 0).is_err());
    }

    #[test]
    fn test_slot_equal_to_day() {
        let w = WeekGeometry::new(3, 4, 4).unwrap();
        assert_eq!(w.slots_in_day(), 1);
        assert_eq!(w.slot_count(), 3);
        assert!(w.overlapping_pairs().is_empty());
    }

    #[test]
    fn test_overlapping_pairs_no_buffer() {
        let w = standard_week();
        let pairs = w.overlapping_pairs();
        // 2-hour slots: only adjacent starts conflict, 7 pairs per day
        assert_eq!(pairs.len(), 5 * 7);
        assert!(pairs.contains(&(0, 1)));
        assert!(pairs.contains(&(6, 7)));
        assert!(!pairs.contains(&(0, 2)));
        // Never across days: last MON slot (7) vs first TUE slot (8)
        assert!(!pairs.contains(&(7, 8)));
        assert!(pairs.iter().all(|&(a, b)| a < b));
    }

    #[test]
    fn test_overlapping_pairs_with_buffer() {
        let w = standard_week().with_buffer_hours(1);
        let pairs = w.overlapping_pairs();
        // Back-to-back sessions now conflict too
        assert!(pairs.contains(&(0, 2)));
        assert!(!pairs.contains(&(0, 3)));
        // Per day: 7 neighbours at distance 1 + 6 at distance 2
        assert_eq!(pairs.len(), 5 * 13);
    }

    #[test]
    fn test_overlapping_pairs_stay_within_day() {
        let w = WeekGeometry::new(2, 5, 3).unwrap().with_buffer_hours(2);
        for (a, b) in w.overlapping_pairs() {
            assert_eq!(w.day_and_offset(a).0, w.day_and_offset(b).0);
        }
    }

    #[test]
    fn test_labels() {
        let w = standard_week();
        assert_eq!(w.label(0), "MON-08:40");
        assert_eq!(w.label(1), "MON-09:40");
        assert_eq!(w.label(8), "TUE-08:40");
        assert_eq!(w.label(39), "FRI-15:40");

        let w2 = standard_week().with_first_hour(ClockTime::new(9, 0).unwrap());
        assert_eq!(w2.label(10), "TUE-11:00");
    }

    #[test]
    fn test_parse_label_roundtrip() {
        let w = standard_week();
        for slot in [0, 5, 17, 39] {
            assert_eq!(w.parse_label(&w.label(slot)), Some(slot));
        }
        assert_eq!(w.parse_label("SAT-08:40"), None); // 5-day week
        assert_eq!(w.parse_label("MON-08:00"), None); // wrong minute
        assert_eq!(w.parse_label("MON-16:40"), None); // past last start
    }

    #[test]
    fn test_slot_hours() {
        let w = standard_week();
        assert_eq!(w.slot_hours(0), 0..2);
        assert_eq!(w.slot_hours(9), 10..12); // TUE offset 1
    }

    #[test]
    fn test_clock_time_parse() {
        let t: ClockTime = "08:40".parse().unwrap();
        assert_eq!(t, ClockTime { hour: 8, minute: 40 });
        assert_eq!(t.to_string(), "08:40");
        assert!("25:00".parse::<ClockTime>().is_err());
        assert!("0840".parse::<ClockTime>().is_err());
    }
}
