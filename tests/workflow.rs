//! End-to-end runs through `App` with real snapshot files.

use chrono::{TimeZone, Utc};
use mapty::app::{App, CreateRequest, EditRequest};
use mapty::codec;
use mapty::config::MapConfig;
use mapty::error::{AppError, WorkoutError};
use mapty::markers::{Bounds, MapSurface};
use mapty::render::Popup;
use mapty::storage::{JsonFileStorage, SnapshotStorage, SqliteStorage};
use mapty::types::{Coords, WorkoutKind};
use serde_json::{Value, json};
use std::fs;

#[derive(Default)]
struct RecordingMap {
    next: usize,
    popups: Vec<(usize, String)>,
    removed: Vec<usize>,
    fitted: Option<Bounds>,
}

impl MapSurface for RecordingMap {
    type Handle = usize;

    fn add_marker(&mut self, _coords: Coords, popup: &Popup) -> usize {
        self.next += 1;
        self.popups.push((self.next, popup.content.clone()));
        self.next
    }

    fn remove_marker(&mut self, handle: usize) {
        self.removed.push(handle);
    }

    fn fly_to(&mut self, _coords: Coords, _zoom: u8) {}

    fn fly_to_bounds(&mut self, bounds: Bounds, _padding: u32) {
        self.fitted = Some(bounds);
    }
}

fn request(kind: &str, coords: [f64; 2], distance: f64, duration: f64, field: f64) -> CreateRequest {
    CreateRequest {
        kind: kind.to_string(),
        coords,
        distance,
        duration,
        variant_field: field,
        date: Some(Utc.with_ymd_and_hms(2024, 1, 10, 12, 0, 0).unwrap()),
    }
}

fn open<S: SnapshotStorage>(storage: S) -> App<S, RecordingMap> {
    let (app, rejected) = App::load(storage, RecordingMap::default(), MapConfig::default());
    assert!(rejected.is_empty());
    app
}

#[test]
fn workouts_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");

    let (run, ride) = {
        let mut app = open(JsonFileStorage::new(&path));
        let run = app.create(request("running", [40.7, -74.0], 5.0, 30.0, 150.0)).unwrap();
        let ride = app.create(request("cycling", [40.8, -73.9], 20.0, 60.0, 300.0)).unwrap();
        (run, ride)
    };

    let mut app = open(JsonFileStorage::new(&path));
    assert_eq!(app.workouts(), &[run.clone(), ride.clone()]);
    assert_eq!(app.find(run.id()).unwrap().pace(), Some(6.0));
    assert_eq!(app.find(ride.id()).unwrap().speed(), Some(20.0));
    assert_eq!(app.find(run.id()).unwrap().description(), "Running on January 10");
    assert_eq!(app.markers().len(), 2);
    assert_eq!(
        app.markers().surface().popups[0].1,
        "🏃‍♂️ Running on January 10"
    );

    // New ids keep counting past the restored ones.
    let next = app.create(request("running", [1.0, 1.0], 1.0, 5.0, 160.0)).unwrap();
    assert!(next.id().parse::<i64>().unwrap() > ride.id().parse::<i64>().unwrap());
}

#[test]
fn snapshot_file_has_the_documented_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    let mut app = open(JsonFileStorage::new(&path));
    let w = app.create(request("cycling", [40.7, -74.0], 20.0, 60.0, 300.0)).unwrap();

    let v: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        v,
        json!([{
            "type": "cycling",
            "coords": [40.7, -74.0],
            "distance": 20.0,
            "duration": 60.0,
            "date": "2024-01-10T12:00:00Z",
            "id": w.id(),
            "elevGain": 300.0,
            "speed": 20.0,
            "description": "Cycling on January 10"
        }])
    );
}

#[test]
fn unknown_record_type_is_skipped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    {
        let mut app = open(JsonFileStorage::new(&path));
        app.create(request("running", [40.7, -74.0], 5.0, 30.0, 150.0)).unwrap();
        app.create(request("cycling", [40.7, -74.1], 20.0, 60.0, 300.0)).unwrap();
    }

    let mut v: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    v[0]["type"] = json!("hiking");
    fs::write(&path, v.to_string()).unwrap();

    let (app, rejected) =
        App::load(JsonFileStorage::new(&path), RecordingMap::default(), MapConfig::default());

    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].index, 0);
    assert_eq!(
        rejected[0].error,
        WorkoutError::UnknownWorkoutType("hiking".to_string())
    );
    assert_eq!(app.workouts().len(), 1);
    assert_eq!(app.workouts()[0].kind(), WorkoutKind::Cycling);
}

#[test]
fn corrupt_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    fs::write(&path, "not json at all").unwrap();

    let mut app = open(JsonFileStorage::new(&path));
    assert!(app.workouts().is_empty());

    app.create(request("running", [0.5, 0.5], 3.0, 18.0, 170.0)).unwrap();
    let reloaded = codec::deserialize(Some(&fs::read_to_string(&path).unwrap()));
    assert_eq!(reloaded.store.len(), 1);
}

#[test]
fn full_lifecycle_on_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("workouts.db");

    let mut app = open(SqliteStorage::open(&db).unwrap());
    let a = app.create(request("running", [10.0, 10.0], 5.0, 30.0, 150.0)).unwrap();
    let b = app.create(request("cycling", [12.0, 8.0], 40.0, 90.0, 450.0)).unwrap();

    let edited = app
        .edit(EditRequest {
            id: b.id().to_string(),
            distance: 45.0,
            duration: 90.0,
            variant_field: 500.0,
        })
        .unwrap();
    assert_eq!(edited.speed(), Some(30.0));
    assert_eq!(edited.date(), b.date());

    let bounds = app.fit_all().unwrap();
    assert_eq!(app.markers().surface().fitted, Some(bounds));
    assert!(bounds.contains(a.coords()) && bounds.contains(b.coords()));

    app.delete(a.id()).unwrap();
    assert_eq!(app.markers().surface().removed, vec![1]);
    drop(app);

    let mut app = open(SqliteStorage::open(&db).unwrap());
    assert_eq!(app.workouts(), &[edited]);

    app.reset().unwrap();
    drop(app);

    let app = open(SqliteStorage::open(&db).unwrap());
    assert!(app.workouts().is_empty());
}

#[test]
fn edit_with_invalid_values_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let mut app = open(JsonFileStorage::new(dir.path().join("w.json")));
    let w = app.create(request("running", [1.0, 2.0], 5.0, 30.0, 150.0)).unwrap();

    let err = app
        .edit(EditRequest {
            id: w.id().to_string(),
            distance: 5.0,
            duration: 0.0,
            variant_field: 150.0,
        })
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Workout(WorkoutError::InvalidInput { field: "duration", .. })
    ));
    assert_eq!(app.find(w.id()), Some(&w));
}

#[test]
fn serialize_is_stable_across_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    let mut app = open(JsonFileStorage::new(&path));
    for (i, kind) in ["running", "cycling", "running", "cycling"].iter().enumerate() {
        let f = i as f64;
        app.create(request(kind, [f * 1.1, -f * 2.3], 1.7 + f, 13.3 * (f + 1.0), 90.0 + f))
            .unwrap();
    }

    let first = codec::serialize(app.workouts()).unwrap();
    let again = codec::serialize(&codec::deserialize(Some(&first)).store).unwrap();
    assert_eq!(first, again);
}

#[test]
fn non_utf8_snapshot_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("workouts.json");
    fs::write(&path, [0xff, 0xfe, b'[', b']']).unwrap();

    let mut app = open(JsonFileStorage::new(&path));
    assert!(app.workouts().is_empty());

    app.create(request("cycling", [2.0, 3.0], 10.0, 30.0, 50.0)).unwrap();
    let app = open(JsonFileStorage::new(&path));
    assert_eq!(app.workouts().len(), 1);
}

#[test]
fn garbage_database_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("workouts.db");
    fs::write(&db, b"this is not an sqlite database, just some text padding it out").unwrap();

    let storage = mapty::storage::open_storage(&db).unwrap();
    let mut app = open(storage);
    assert!(app.workouts().is_empty());
    app.create(request("running", [2.0, 3.0], 5.0, 30.0, 150.0)).unwrap();

    let app = open(SqliteStorage::open(&db).unwrap());
    assert_eq!(app.workouts().len(), 1);
    assert!(dir.path().join("workouts.db.corrupt").is_file());
}
