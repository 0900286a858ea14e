//! Snapshot codec: workouts to a JSON string and back.
//!
//! A snapshot is a JSON array of flat records, one per workout, in store
//! order. Loading dispatches on each record's `type` and rebuilds the
//! concrete variant; a record that cannot be rebuilt is skipped and reported
//! while the rest of the snapshot still loads.

use crate::dlog;
use crate::error::WorkoutError;
use crate::store::WorkoutStore;
use crate::types::{Coords, VariantField, Workout, WorkoutKind};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Relative difference above which a stored metric is reported as stale.
const METRIC_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkoutRecord {
    #[serde(rename = "type")]
    kind: WorkoutKind,
    coords: Coords,
    distance: f64,
    duration: f64,
    date: DateTime<Utc>,
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cadence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    elev_gain: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pace: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
    description: String,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let (cadence, elev_gain) = match w.variant_field() {
            VariantField::Cadence(v) => (Some(v), None),
            VariantField::ElevGain(v) => (None, Some(v)),
        };
        Self {
            kind: w.kind(),
            coords: w.coords(),
            distance: w.distance(),
            duration: w.duration(),
            date: w.date(),
            id: w.id().to_string(),
            cadence,
            elev_gain,
            pace: w.pace(),
            speed: w.speed(),
            description: w.description().to_string(),
        }
    }
}

impl WorkoutRecord {
    fn into_workout(self) -> Result<Workout, WorkoutError> {
        let field = match (self.kind, self.cadence, self.elev_gain) {
            (WorkoutKind::Running, Some(cadence), None) => VariantField::Cadence(cadence),
            (WorkoutKind::Cycling, None, Some(elev_gain)) => VariantField::ElevGain(elev_gain),
            (kind, cadence, elev_gain) => {
                return Err(WorkoutError::MalformedRecord(format!(
                    "{kind} record {} has cadence={cadence:?} elevGain={elev_gain:?}",
                    self.id
                )));
            }
        };
        let stored_metric = match self.kind {
            WorkoutKind::Running => self.pace,
            WorkoutKind::Cycling => self.speed,
        };

        let workout = Workout::restore(
            self.id,
            self.coords,
            self.distance,
            self.duration,
            field,
            self.date,
            self.description,
        )?;

        if let Some(stored) = stored_metric
            && !metrics_agree(stored, workout.metric())
        {
            tracing::warn!(
                id = workout.id(),
                stored,
                recomputed = workout.metric(),
                "stored metric disagrees with distance/duration; using recomputed value"
            );
        }

        Ok(workout)
    }
}

fn metrics_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= METRIC_TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Encode workouts as a snapshot string, preserving their order.
pub fn serialize<'a>(workouts: impl IntoIterator<Item = &'a Workout>) -> Result<String> {
    let records: Vec<WorkoutRecord> = workouts.into_iter().map(WorkoutRecord::from).collect();
    serde_json::to_string(&records).context("encoding workout snapshot")
}

/// A snapshot record that was left out of the loaded store.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    /// Position of the record in the snapshot array.
    pub index: usize,
    pub error: WorkoutError,
}

/// Result of loading a snapshot.
#[derive(Debug, Default)]
pub struct Loaded {
    pub store: WorkoutStore,
    pub rejected: Vec<Rejected>,
}

/// Rebuild a store from a snapshot.
///
/// A missing or unparsable snapshot gives an empty store. Records that fail
/// to decode are skipped and listed in [`Loaded::rejected`].
pub fn deserialize(snapshot: Option<&str>) -> Loaded {
    let Some(raw) = snapshot.filter(|s| !s.trim().is_empty()) else {
        dlog!("no snapshot; starting with an empty store");
        return Loaded::default();
    };

    let records = match serde_json::from_str::<JsonValue>(raw) {
        Ok(JsonValue::Array(records)) => records,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "snapshot is not an array; ignoring it");
            return Loaded::default();
        }
        Err(e) => {
            tracing::warn!(err = %e, "snapshot is not valid JSON; ignoring it");
            return Loaded::default();
        }
    };

    let mut loaded = Loaded::default();
    for (index, value) in records.into_iter().enumerate() {
        let outcome = decode_record(value).and_then(|w| loaded.store.add(w));
        if let Err(error) = outcome {
            tracing::warn!(index, err = %error, "skipping snapshot record");
            loaded.rejected.push(Rejected { index, error });
        }
    }

    dlog!(
        "snapshot loaded workouts={} rejected={}",
        loaded.store.len(),
        loaded.rejected.len()
    );
    loaded
}

/// Decode one record, choosing the variant from its `type` tag.
pub fn decode_record(value: JsonValue) -> Result<Workout, WorkoutError> {
    let tag = value
        .get("type")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| WorkoutError::MalformedRecord("missing string field \"type\"".into()))?;

    match tag {
        "running" | "cycling" => {}
        other => return Err(WorkoutError::UnknownWorkoutType(other.to_string())),
    }

    serde_json::from_value::<WorkoutRecord>(value)
        .map_err(|e| WorkoutError::MalformedRecord(e.to_string()))?
        .into_workout()
}

const fn json_kind(v: &JsonValue) -> &'static str {
    match v {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
