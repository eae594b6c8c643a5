//! Run configuration.
//!
//! Loaded from TOML. Every key is optional; missing keys take the
//! defaults below.
//!
//! ```toml
//! [week]
//! days_in_week = 5
//! hours_in_day = 9
//! hours_in_slot = 2
//! first_hour = "08:40"
//! buffer_hours_between_sessions = 0
//!
//! [lab]
//! lab_capacity = 16
//! assistants_per_session = 2
//! max_assistant_deviation = 3
//! deviation_weight = 1.0
//! required_session_count = 2
//!
//! [solver]
//! timeout_secs = 300
//!
//! [input]
//! id_column = "ID number"
//! impossible_id = "IMPOSSIBLE"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SlotterError};
use crate::models::{ClockTime, WeekGeometry};

/// Complete configuration of a scheduling run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotterConfig {
    pub week: WeekSettings,
    pub lab: LabSettings,
    pub solver: SolverSettings,
    pub input: InputSettings,
}

/// Slot grid settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeekSettings {
    pub days_in_week: usize,
    pub hours_in_day: usize,
    pub hours_in_slot: usize,
    /// Wall-clock time of the first hour, used for labels.
    pub first_hour: ClockTime,
    /// Hours that must separate two sessions on the same day.
    pub buffer_hours_between_sessions: usize,
}

impl Default for WeekSettings {
    fn default() -> Self {
        Self {
            days_in_week: 5,
            hours_in_day: 9,
            hours_in_slot: 2,
            first_hour: ClockTime::default(),
            buffer_hours_between_sessions: 0,
        }
    }
}

/// Session and staffing requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabSettings {
    /// Seats per session.
    pub lab_capacity: usize,
    /// Assistants staffing every open session.
    pub assistants_per_session: usize,
    /// Upper bound on the pairwise assistant workload difference.
    pub max_assistant_deviation: u32,
    /// Objective weight of the workload deviation.
    pub deviation_weight: f64,
    /// Exact number of sessions to open.
    pub required_session_count: usize,
}

impl Default for LabSettings {
    fn default() -> Self {
        Self {
            lab_capacity: 16,
            assistants_per_session: 2,
            max_assistant_deviation: 3,
            deviation_weight: 1.0,
            required_session_count: 2,
        }
    }
}

/// Solver invocation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Time budget in seconds. `None` waits for the solver to finish.
    pub timeout_secs: Option<u64>,
}

impl SolverSettings {
    /// Time budget as a `Duration`.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Roster table conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Header of the identifier column.
    pub id_column: String,
    /// Identifier of the row holding the global impossible mask.
    pub impossible_id: String,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            id_column: "ID number".into(),
            impossible_id: "IMPOSSIBLE".into(),
        }
    }
}

impl SlotterConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// I/O and parse failures, and any invariant rejected by
    /// [`validate`](Self::validate).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.lab.lab_capacity == 0 {
            return Err(SlotterError::Config("lab_capacity must be positive".into()));
        }
        if self.lab.assistants_per_session == 0 {
            return Err(SlotterError::Config(
                "assistants_per_session must be positive".into(),
            ));
        }
        if !self.lab.deviation_weight.is_finite() || self.lab.deviation_weight < 0.0 {
            return Err(SlotterError::Config(format!(
                "deviation_weight must be a non-negative number, got {}",
                self.lab.deviation_weight
            )));
        }
        if self.input.id_column.trim().is_empty() {
            return Err(SlotterError::Config("id_column must not be empty".into()));
        }
        let week = self.week_geometry()?;
        let last_hour = week.first_hour().hour as usize + week.slots_in_day() - 1;
        if last_hour > 23 {
            return Err(SlotterError::Config(format!(
                "last slot would start at hour {last_hour}; move first_hour earlier"
            )));
        }
        Ok(())
    }

    /// Builds the week geometry described by `[week]`.
    pub fn week_geometry(&self) -> Result<WeekGeometry> {
        let w = &self.week;
        Ok(WeekGeometry::new(w.days_in_week, w.hours_in_day, w.hours_in_slot)?
            .with_buffer_hours(w.buffer_hours_between_sessions)
            .with_first_hour(w.first_hour))
    }
}
