#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

use anyhow::Result;
use clap::Parser;
use mapty::app::{App, CreateRequest, EditRequest};
use mapty::config::MapConfig;
use mapty::error::WorkoutError;
use mapty::markers::{MapSurface, TracingMap};
use mapty::render::ListEntry;
use mapty::storage::SnapshotStorage;
use mapty::types::{Workout, WorkoutKind};
use mapty::{cli, storage, utils};

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let config = MapConfig::default();
    let storage = storage::open_storage(&cli.store)?;
    let (mut app, rejected) = App::load(storage, TracingMap::new(), config);
    for r in &rejected {
        tracing::warn!(index = r.index, err = %r.error, "snapshot record was not restored");
    }

    match cli.cmd.unwrap_or(cli::Cmd::List) {
        cli::Cmd::List => {
            dlog!("mode=list store={}", cli.store.display());
            if app.workouts().is_empty() {
                println!("No workouts yet.");
            }
            for w in app.workouts() {
                println!("{}", ListEntry::for_workout(w));
            }
        }
        cli::Cmd::Add {
            kind,
            lat,
            lng,
            distance,
            duration,
            cadence,
            elev_gain,
            date,
        } => {
            let variant_field = cli::variant_value(kind.parse()?, cadence, elev_gain)?;
            let (lat, lng) = config.position_or_fallback(lat, lng);
            let w = app.create(CreateRequest {
                kind,
                coords: [lat, lng],
                distance,
                duration,
                variant_field,
                date,
            })?;
            println!("{}", ListEntry::for_workout(&w));
        }
        cli::Cmd::Edit {
            id,
            distance,
            duration,
            cadence,
            elev_gain,
        } => {
            let variant_field = cli::variant_value(stored_kind(&app, &id)?, cadence, elev_gain)?;
            let w = app.edit(EditRequest {
                id,
                distance,
                duration,
                variant_field,
            })?;
            println!("{}", ListEntry::for_workout(&w));
        }
        cli::Cmd::Delete { id } => {
            let w = app.delete(&id)?;
            println!("deleted {}\t{}", w.id(), w.description());
        }
        cli::Cmd::Reset => {
            let n = app.workouts().len();
            app.reset()?;
            println!("deleted {n} workouts");
        }
        cli::Cmd::Focus { id } => {
            let w = app.focus(&id)?;
            println!("{}\t{}", w.description(), w.coords());
        }
        cli::Cmd::Bounds => {
            let line = app.fit_all().map_or_else(
                || "No workouts yet.".to_string(),
                |b| format!("south={} west={} north={} east={}", b.south, b.west, b.north, b.east),
            );
            println!("{line}");
        }
    }

    Ok(())
}

fn stored_kind<S: SnapshotStorage, M: MapSurface>(
    app: &App<S, M>,
    id: &str,
) -> Result<WorkoutKind, WorkoutError> {
    app.find(id)
        .map(Workout::kind)
        .ok_or_else(|| WorkoutError::NotFound(id.to_string()))
}
