use crate::error::{WorkoutError, WorkoutResult};
use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Variant discriminator, serialized as `"running"` / `"cycling"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized name used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    const fn metric(self) -> fn(f64, f64) -> f64 {
        match self {
            Self::Running => pace,
            Self::Cycling => speed,
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutKind {
    type Err = WorkoutError;

    /// `"workout"` names the shared base record, which has no metric of its own.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            "" | "workout" => Err(WorkoutError::InvalidConstruction),
            _ => Err(WorkoutError::UnknownWorkoutType(s.to_string())),
        }
    }
}

/// min/km
fn pace(distance: f64, duration: f64) -> f64 {
    duration / distance
}

/// km/h
fn speed(distance: f64, duration: f64) -> f64 {
    distance / (duration / 60.0)
}

/// Latitude/longitude pair, stored on the wire as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub fn new(lat: f64, lng: f64) -> WorkoutResult<Self> {
        let coords = Self { lat, lng };
        coords.validate()?;
        Ok(coords)
    }

    pub(crate) fn validate(&self) -> WorkoutResult<()> {
        check_finite("latitude", self.lat)?;
        check_finite("longitude", self.lng)
    }

    /// Index key, `"lat,lng"` with shortest float rendering (`[40.7, -74.0]` -> `"40.7,-74"`).
    pub fn key(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// The type-specific input: cadence (steps/min) or elevation gain (m).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariantField {
    Cadence(f64),
    ElevGain(f64),
}

impl VariantField {
    pub const fn for_kind(kind: WorkoutKind, value: f64) -> Self {
        match kind {
            WorkoutKind::Running => Self::Cadence(value),
            WorkoutKind::Cycling => Self::ElevGain(value),
        }
    }

    pub const fn kind(self) -> WorkoutKind {
        match self {
            Self::Cadence(_) => WorkoutKind::Running,
            Self::ElevGain(_) => WorkoutKind::Cycling,
        }
    }

    pub const fn value(self) -> f64 {
        match self {
            Self::Cadence(v) | Self::ElevGain(v) => v,
        }
    }

    fn validate(self) -> WorkoutResult<()> {
        match self {
            Self::Cadence(v) => check_positive("cadence", v),
            // Descents are allowed.
            Self::ElevGain(v) => check_finite("elevation gain", v),
        }
    }
}

/// Variant-specific state. The variant field and its derived metric travel together,
/// so a running record can never carry an elevation gain.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Running { cadence: f64, pace: f64 },
    Cycling { elev_gain: f64, speed: f64 },
}

impl Variant {
    fn compute(field: VariantField, distance: f64, duration: f64) -> Self {
        let metric = field.kind().metric()(distance, duration);
        match field {
            VariantField::Cadence(cadence) => Self::Running {
                cadence,
                pace: metric,
            },
            VariantField::ElevGain(elev_gain) => Self::Cycling {
                elev_gain,
                speed: metric,
            },
        }
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running { .. } => WorkoutKind::Running,
            Self::Cycling { .. } => WorkoutKind::Cycling,
        }
    }
}

/// One recorded exercise session.
#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: String,
    coords: Coords,
    distance: f64,
    duration: f64,
    date: DateTime<Utc>,
    description: String,
    variant: Variant,
}

impl Workout {
    /// Build a new workout, drawing its id from `ids`.
    ///
    /// Every numeric input is validated here regardless of what the caller
    /// already checked.
    pub fn create(
        ids: &mut IdGenerator,
        coords: Coords,
        distance: f64,
        duration: f64,
        field: VariantField,
        date: DateTime<Utc>,
    ) -> WorkoutResult<Self> {
        coords.validate()?;
        validate_measurements(distance, duration, field)?;

        let kind = field.kind();
        Ok(Self {
            id: ids.next_id(date),
            coords,
            distance,
            duration,
            date,
            description: describe(kind, date, &Local),
            variant: Variant::compute(field, distance, duration),
        })
    }

    /// Rebuild a workout from persisted fields. The metric is recomputed, never trusted.
    pub(crate) fn restore(
        id: String,
        coords: Coords,
        distance: f64,
        duration: f64,
        field: VariantField,
        date: DateTime<Utc>,
        description: String,
    ) -> WorkoutResult<Self> {
        if id.trim().is_empty() {
            return Err(WorkoutError::MalformedRecord("empty id".to_string()));
        }
        coords.validate()?;
        validate_measurements(distance, duration, field)?;

        Ok(Self {
            id,
            coords,
            distance,
            duration,
            date,
            description,
            variant: Variant::compute(field, distance, duration),
        })
    }

    /// Replace distance, duration and the variant field, then recompute the metric.
    ///
    /// Id, coords, date and description are left as they were. Nothing is
    /// mutated when validation fails.
    pub fn edit(&mut self, distance: f64, duration: f64, field: VariantField) -> WorkoutResult<()> {
        if field.kind() != self.kind() {
            return Err(WorkoutError::invalid(
                "variant field",
                format!(
                    "a {} value does not apply to a {} workout",
                    field.kind(),
                    self.kind()
                ),
            ));
        }
        validate_measurements(distance, duration, field)?;

        self.distance = distance;
        self.duration = duration;
        self.variant = Variant::compute(field, distance, duration);
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub const fn kind(&self) -> WorkoutKind {
        self.variant.kind()
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance(&self) -> f64 {
        self.distance
    }

    pub const fn duration(&self) -> f64 {
        self.duration
    }

    pub const fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn variant(&self) -> &Variant {
        &self.variant
    }

    pub const fn variant_field(&self) -> VariantField {
        match self.variant {
            Variant::Running { cadence, .. } => VariantField::Cadence(cadence),
            Variant::Cycling { elev_gain, .. } => VariantField::ElevGain(elev_gain),
        }
    }

    /// Pace for running, speed for cycling.
    pub const fn metric(&self) -> f64 {
        match self.variant {
            Variant::Running { pace, .. } => pace,
            Variant::Cycling { speed, .. } => speed,
        }
    }

    pub const fn pace(&self) -> Option<f64> {
        match self.variant {
            Variant::Running { pace, .. } => Some(pace),
            Variant::Cycling { .. } => None,
        }
    }

    pub const fn speed(&self) -> Option<f64> {
        match self.variant {
            Variant::Cycling { speed, .. } => Some(speed),
            Variant::Running { .. } => None,
        }
    }
}

/// `"Running on January 10"`, with month and day as seen in `tz`.
pub fn describe<Tz: TimeZone>(kind: WorkoutKind, date: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: fmt::Display,
{
    format!("{} on {}", kind.label(), date.with_timezone(tz).format("%B %-d"))
}

fn validate_measurements(distance: f64, duration: f64, field: VariantField) -> WorkoutResult<()> {
    check_positive("distance", distance)?;
    check_positive("duration", duration)?;
    field.validate()
}

fn check_finite(field: &'static str, v: f64) -> WorkoutResult<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(WorkoutError::invalid(field, format!("must be a finite number, got {v}")))
    }
}

fn check_positive(field: &'static str, v: f64) -> WorkoutResult<()> {
    check_finite(field, v)?;
    if v > 0.0 {
        Ok(())
    } else {
        Err(WorkoutError::invalid(field, format!("must be positive, got {v}")))
    }
}

/// Issues time-derived ids: the creation time in milliseconds, bumped past the
/// last issued value so two workouts in the same millisecond never share an id.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    pub fn next_id(&mut self, date: DateTime<Utc>) -> String {
        let id = date.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id.to_string()
    }

    /// Make sure future ids sort after `floor` (the largest id already in use).
    pub fn seed_past(&mut self, floor: i64) {
        self.last = self.last.max(floor);
    }
}
