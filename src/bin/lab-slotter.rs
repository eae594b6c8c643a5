//! Command-line front end.
//!
//! ```text
//! lab-slotter solve --students s.csv --assistants a.csv [--impossible m.csv]
//!                   [--config c.toml] [--timeout SECS] [--json]
//! lab-slotter generate --students 40 --assistants 6 --out DIR [--seed N]
//! ```
//!
//! Logs go to stderr and honor `RUST_LOG`. Exit status is 0 for a
//! schedule, 2 when the solver found none, 1 on any error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lab_slotter::generator::RosterGenerator;
use lab_slotter::{
    LabScheduler, Result, RosterReader, ScheduleOutcome, SlotterConfig, WorkloadKpi,
};

#[derive(Debug, Parser)]
#[command(
    name = "lab-slotter",
    version,
    about = "Assign students and assistants to weekly lab sessions"
)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve a scheduling instance.
    Solve {
        /// Student availability table.
        #[arg(long)]
        students: PathBuf,
        /// Assistant availability table.
        #[arg(long)]
        assistants: PathBuf,
        /// Table holding a global impossible mask.
        #[arg(long)]
        impossible: Option<PathBuf>,
        /// Solver time budget in seconds; overrides the configuration.
        #[arg(long)]
        timeout: Option<u64>,
        /// Print the outcome and KPIs as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Write random student and assistant tables.
    Generate {
        #[arg(long, default_value_t = 40)]
        students: usize,
        #[arg(long, default_value_t = 6)]
        assistants: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Per-hour probability of an academic commitment.
        #[arg(long, default_value_t = 0.3)]
        busy: f64,
        /// Per-hour probability of a part-time commitment.
        #[arg(long, default_value_t = 0.1)]
        extra: f64,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let mut config = match &cli.config {
        Some(path) => SlotterConfig::load(path)?,
        None => SlotterConfig::default(),
    };

    match cli.command {
        Command::Solve {
            students,
            assistants,
            impossible,
            timeout,
            json,
        } => {
            if timeout.is_some() {
                config.solver.timeout_secs = timeout;
            }
            solve(config, &students, &assistants, impossible.as_deref(), json)
        }
        Command::Generate {
            students,
            assistants,
            seed,
            busy,
            extra,
            out,
        } => {
            let week = config.week_geometry()?;
            let generator = match seed {
                Some(seed) => RosterGenerator::seeded(week, seed),
                None => RosterGenerator::new(week),
            };
            let mut generator = generator
                .with_busy_probability(busy)
                .with_extra_probability(extra);

            fs::create_dir_all(&out)?;
            let id_column = &config.input.id_column;
            for (file, prefix, count) in [
                ("students.csv", "S", students),
                ("assistants.csv", "A", assistants),
            ] {
                let path = out.join(file);
                fs::write(&path, generator.generate_table(prefix, count, id_column))?;
                info!(path = %path.display(), count, "wrote roster");
            }
            Ok(true)
        }
    }
}

fn solve(
    config: SlotterConfig,
    students: &Path,
    assistants: &Path,
    impossible: Option<&Path>,
    json: bool,
) -> Result<bool> {
    let scheduler = LabScheduler::new(config)?;
    let week = scheduler.week()?;
    let reader = RosterReader::with_settings(&week, &scheduler.config().input);

    let student_table = reader.read_file(students)?;
    let assistant_table = reader.read_file(assistants)?;
    let mask = impossible.map(|p| reader.read_mask_file(p)).transpose()?;

    let (student_roster, assistant_roster) =
        scheduler.derive_rosters(&week, &student_table, &assistant_table, mask.as_ref())?;
    let outcome = scheduler.schedule_slots(&week, &student_roster, &assistant_roster)?;
    let kpi = outcome.schedule().map(|schedule| {
        WorkloadKpi::calculate(
            schedule,
            &scheduler.config().lab,
            &student_roster,
            &assistant_roster,
        )
    });

    if json {
        let doc = json!({ "outcome": outcome, "kpi": kpi });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        match &outcome {
            ScheduleOutcome::Solved(schedule) => {
                print!("{schedule}");
                if let Some(kpi) = &kpi {
                    println!(
                        "deviation={} avg_fill={:.2} penalized={}",
                        kpi.max_deviation, kpi.avg_fill_rate, kpi.penalized_students
                    );
                }
            }
            ScheduleOutcome::Failed(failure) => println!("{failure}"),
        }
    }
    Ok(outcome.is_solved())
}
