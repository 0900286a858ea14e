use crate::error::{WorkoutError, WorkoutResult};
use crate::types::WorkoutKind;
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_STORE: &str = "workouts.json";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts at map coordinates"
)]
pub struct Cli {
    /// Snapshot location. `.db`/`.sqlite` selects SQLite, anything else a JSON file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_STORE, global = true)]
    pub store: PathBuf,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Cmd {
    /// Print every workout (the default).
    List,

    /// Record a new workout.
    Add {
        /// `running` or `cycling`.
        #[arg(value_name = "TYPE")]
        kind: String,

        /// Latitude; the fallback position is used when omitted.
        #[arg(long, allow_negative_numbers = true, requires = "lng")]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true, requires = "lat")]
        lng: Option<f64>,

        /// Kilometers.
        #[arg(long)]
        distance: f64,

        /// Minutes.
        #[arg(long)]
        duration: f64,

        /// Steps per minute; running only.
        #[arg(
            long,
            allow_negative_numbers = true,
            required_unless_present = "elev_gain",
            conflicts_with = "elev_gain"
        )]
        cadence: Option<f64>,

        /// Meters climbed; cycling only.
        #[arg(long = "elev-gain", allow_negative_numbers = true)]
        elev_gain: Option<f64>,

        /// RFC 3339 timestamp; defaults to now.
        #[arg(long)]
        date: Option<DateTime<Utc>>,
    },

    /// Change distance, duration and cadence/elevation of a workout.
    Edit {
        id: String,

        #[arg(long)]
        distance: f64,

        #[arg(long)]
        duration: f64,

        #[arg(
            long,
            allow_negative_numbers = true,
            required_unless_present = "elev_gain",
            conflicts_with = "elev_gain"
        )]
        cadence: Option<f64>,

        #[arg(long = "elev-gain", allow_negative_numbers = true)]
        elev_gain: Option<f64>,
    },

    /// Delete one workout.
    Delete { id: String },

    /// Delete every workout and the stored snapshot.
    Reset,

    /// Center the map on one workout.
    Focus { id: String },

    /// Print the region containing every workout.
    Bounds,
}

/// Pick the flag that belongs to `kind`. `--cadence` on a cycling workout
/// (or `--elev-gain` on a running one) is refused rather than reinterpreted.
pub fn variant_value(
    kind: WorkoutKind,
    cadence: Option<f64>,
    elev_gain: Option<f64>,
) -> WorkoutResult<f64> {
    match (kind, cadence, elev_gain) {
        (WorkoutKind::Running, Some(v), None) | (WorkoutKind::Cycling, None, Some(v)) => Ok(v),
        (WorkoutKind::Running, _, _) => Err(WorkoutError::invalid(
            "cadence",
            "running workouts take --cadence, not --elev-gain",
        )),
        (WorkoutKind::Cycling, _, _) => Err(WorkoutError::invalid(
            "elevation gain",
            "cycling workouts take --elev-gain, not --cadence",
        )),
    }
}
