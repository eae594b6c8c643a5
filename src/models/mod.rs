//! Lab scheduling domain models.
//!
//! Provides the data types that flow through a scheduling run, from raw
//! hour-level availability to the final session list.
//!
//! # Data Flow
//!
//! | Stage | Type | Granularity |
//! |-------|------|-------------|
//! | Input | [`RosterTable`] / [`AvailabilityGrid`] | hour |
//! | Derived | [`SlotRoster`] / [`SlotAvailability`] | slot |
//! | Output | [`LabSchedule`] / [`Session`] | open slot |
//!
//! [`WeekGeometry`] ties hours to slots and defines which slots overlap.

mod availability;
mod roster;
mod schedule;
mod week;

pub use availability::{Availability, AvailabilityGrid, SlotAvailability};
pub use roster::{PersonAvailability, RosterTable, SlotRoster};
pub use schedule::{LabSchedule, Session, Violation, ViolationType};
pub use week::{ClockTime, WeekGeometry, DAY_NAMES};
