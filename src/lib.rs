//! Weekly lab session scheduling.
//!
//! Chooses which time slots of a week open as lab sessions, which
//! assistants staff each session, and which students attend it, by
//! solving an integer program over everyone's declared availability.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WeekGeometry`, `AvailabilityGrid`,
//!   `SlotRoster`, `LabSchedule`, `Session`
//! - **`ingest`**: Delimited roster tables → `RosterTable`
//! - **`lp`**: Solver-neutral `LinearModel` trait and the `good_lp` backend
//! - **`slotter`**: Constraint model, result extraction, KPIs, and the
//!   `LabScheduler` pipeline
//! - **`validation`**: Input checks and post-solve schedule verification
//! - **`config`**: TOML run configuration
//! - **`generator`**: Random rosters for demos and load tests
//!
//! # Modelling
//!
//! Each person's hours are read twice: an academic view where only
//! lectures block, and a part-time view where only part-time work blocks.
//! Academic clashes are hard constraints. Part-time clashes are allowed
//! for students but penalized, and weighted more for students who are
//! free more often. Assistants must be free in both views.

pub mod config;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod lp;
pub mod models;
pub mod slotter;
pub mod validation;

pub use config::SlotterConfig;
pub use error::{Result, SlotterError};
pub use ingest::RosterReader;
pub use lp::{GoodLpModel, LinearModel, SolveStatus};
pub use models::{LabSchedule, RosterTable, Session, SlotRoster, WeekGeometry};
pub use slotter::{ConstraintModel, Failure, LabScheduler, ScheduleOutcome, WorkloadKpi};
