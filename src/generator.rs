//! Random roster generation.
//!
//! Produces synthetic availability tables in the ingest format, for demos
//! and solver load tests. Each hour is independently `Busy` with
//! `busy_probability`, else `Extra` with `extra_probability`, else free.
//! Every generated person keeps at least one fully free slot, so a
//! generated roster never makes the model trivially infeasible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::ingest::render_table;
use crate::models::{Availability, WeekGeometry};

/// Rows of a generated table: id and day-major cells.
pub type GeneratedRows = Vec<(String, Vec<Availability>)>;

/// Generates random availability tables.
#[derive(Debug, Clone)]
pub struct RosterGenerator {
    week: WeekGeometry,
    busy_probability: f64,
    extra_probability: f64,
    rng: StdRng,
}

impl RosterGenerator {
    /// Creates a generator seeded from the OS.
    pub fn new(week: WeekGeometry) -> Self {
        Self::with_rng(week, StdRng::from_os_rng())
    }

    /// Creates a reproducible generator.
    pub fn seeded(week: WeekGeometry, seed: u64) -> Self {
        Self::with_rng(week, StdRng::seed_from_u64(seed))
    }

    fn with_rng(week: WeekGeometry, rng: StdRng) -> Self {
        Self {
            week,
            busy_probability: 0.3,
            extra_probability: 0.1,
            rng,
        }
    }

    /// Sets the per-hour probability of an academic commitment.
    pub fn with_busy_probability(mut self, p: f64) -> Self {
        self.busy_probability = probability(p);
        self
    }

    /// Sets the per-hour probability of a part-time commitment.
    pub fn with_extra_probability(mut self, p: f64) -> Self {
        self.extra_probability = probability(p);
        self
    }

    pub fn week(&self) -> &WeekGeometry {
        &self.week
    }

    /// Generates `count` people with ids `<prefix>0001`, `<prefix>0002`, ...
    pub fn generate(&mut self, prefix: &str, count: usize) -> GeneratedRows {
        (1..=count)
            .map(|n| (format!("{prefix}{n:04}"), self.person()))
            .collect()
    }

    /// Generates `count` people and renders them as a table.
    pub fn generate_table(&mut self, prefix: &str, count: usize, id_column: &str) -> String {
        let rows = self.generate(prefix, count);
        render_table(&self.week, &rows, id_column)
    }

    fn person(&mut self) -> Vec<Availability> {
        let mut cells: Vec<Availability> = (0..self.week.hours_in_week())
            .map(|_| {
                if self.rng.random_bool(self.busy_probability) {
                    Availability::Busy
                } else if self.rng.random_bool(self.extra_probability) {
                    Availability::Extra
                } else {
                    Availability::Free
                }
            })
            .collect();

        let slot = self.rng.random_range(0..self.week.slot_count());
        for cell in &mut cells[self.week.slot_hours(slot)] {
            *cell = Availability::Free;
        }
        cells
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}
