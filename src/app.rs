//! Application context: the one place requests enter.
//!
//! Every mutating request computes the new snapshot first and writes it.
//! Store and markers change only after that write succeeded, so a failed
//! write leaves all three views of the data as they were.

use crate::codec::{self, Rejected};
use crate::config::MapConfig;
use crate::error::{AppError, WorkoutError};
use crate::markers::{Bounds, MapSurface, MarkerSync};
use crate::storage::SnapshotStorage;
use crate::store::WorkoutStore;
use crate::types::{Coords, IdGenerator, VariantField, Workout, WorkoutKind};
use chrono::{DateTime, Utc};
use std::iter;

/// New workout as submitted by a front-end. Nothing in it is trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRequest {
    /// `"running"` or `"cycling"`.
    pub kind: String,
    pub coords: [f64; 2],
    pub distance: f64,
    pub duration: f64,
    /// Cadence for running, elevation gain for cycling.
    pub variant_field: f64,
    /// Defaults to now.
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    pub id: String,
    pub distance: f64,
    pub duration: f64,
    /// Interpreted according to the stored workout's type.
    pub variant_field: f64,
}

pub struct App<S: SnapshotStorage, M: MapSurface> {
    store: WorkoutStore,
    markers: MarkerSync<M>,
    storage: S,
    ids: IdGenerator,
}

impl<S: SnapshotStorage, M: MapSurface> App<S, M> {
    /// Restore the persisted snapshot and draw a marker for every workout.
    ///
    /// Records that could not be restored are returned alongside the app. A
    /// slot that cannot be read at all is treated like an empty one.
    pub fn load(storage: S, surface: M, config: MapConfig) -> (Self, Vec<Rejected>) {
        let snapshot = storage.load().unwrap_or_else(|e| {
            tracing::warn!(err = %format!("{e:#}"), "snapshot could not be read; starting empty");
            None
        });
        let codec::Loaded { store, rejected } = codec::deserialize(snapshot.as_deref());

        let mut ids = IdGenerator::new();
        if let Some(max) = store.max_numeric_id() {
            ids.seed_past(max);
        }

        let mut markers = MarkerSync::new(surface, config);
        for w in &store {
            markers.render_marker(w);
        }

        tracing::info!(workouts = store.len(), rejected = rejected.len(), "workouts restored");
        (
            Self {
                store,
                markers,
                storage,
                ids,
            },
            rejected,
        )
    }

    pub fn create(&mut self, req: CreateRequest) -> Result<Workout, AppError> {
        let kind: WorkoutKind = req.kind.parse()?;
        let [lat, lng] = req.coords;
        let coords = Coords::new(lat, lng)?;
        let date = req.date.unwrap_or_else(Utc::now);

        let workout = Workout::create(
            &mut self.ids,
            coords,
            req.distance,
            req.duration,
            VariantField::for_kind(kind, req.variant_field),
            date,
        )?;
        if self.store.find_by_id(workout.id()).is_some() {
            return Err(WorkoutError::DuplicateId(workout.id().to_string()).into());
        }

        let snapshot = codec::serialize(self.store.list().iter().chain(iter::once(&workout)))?;
        self.storage.save(&snapshot)?;

        self.markers.render_marker(&workout);
        self.store.add(workout.clone())?;

        tracing::info!(id = workout.id(), kind = %kind, "workout created");
        Ok(workout)
    }

    pub fn edit(&mut self, req: EditRequest) -> Result<Workout, AppError> {
        let mut edited = self
            .store
            .find_by_id(&req.id)
            .ok_or_else(|| WorkoutError::NotFound(req.id.clone()))?
            .clone();
        let field = VariantField::for_kind(edited.kind(), req.variant_field);
        edited.edit(req.distance, req.duration, field)?;

        let replacement = &edited;
        let snapshot = codec::serialize(self.store.list().iter().map(move |w| {
            if w.id() == replacement.id() {
                replacement
            } else {
                w
            }
        }))?;
        self.storage.save(&snapshot)?;

        let slot = self
            .store
            .find_by_id_mut(&req.id)
            .ok_or_else(|| WorkoutError::NotFound(req.id.clone()))?;
        *slot = edited.clone();

        tracing::info!(id = edited.id(), "workout edited");
        Ok(edited)
    }

    /// Delete a workout together with its marker and its persisted record.
    pub fn delete(&mut self, id: &str) -> Result<Workout, AppError> {
        if self.store.find_by_id(id).is_none() {
            return Err(WorkoutError::NotFound(id.to_string()).into());
        }

        let snapshot = codec::serialize(self.store.list().iter().filter(|w| w.id() != id))?;
        self.storage.save(&snapshot)?;

        let removed = self
            .store
            .remove_by_id(id)
            .ok_or_else(|| WorkoutError::NotFound(id.to_string()))?;
        self.markers.remove_marker(&removed);

        tracing::info!(id, remaining = self.store.len(), "workout deleted");
        Ok(removed)
    }

    /// Forget every workout, its marker, and the persisted snapshot.
    pub fn reset(&mut self) -> Result<(), AppError> {
        self.storage.clear()?;
        let dropped = self.store.len();
        self.store.clear();
        self.markers.clear();
        tracing::info!(dropped, "all workouts reset");
        Ok(())
    }

    /// Move the map to a workout.
    pub fn focus(&mut self, id: &str) -> Result<&Workout, AppError> {
        let workout = self
            .store
            .find_by_id(id)
            .ok_or_else(|| WorkoutError::NotFound(id.to_string()))?;
        self.markers.focus(workout.coords());
        Ok(workout)
    }

    pub fn fit_all(&mut self) -> Option<Bounds> {
        self.markers.fit_all()
    }

    pub fn workouts(&self) -> &[Workout] {
        self.store.list()
    }

    pub fn find(&self, id: &str) -> Option<&Workout> {
        self.store.find_by_id(id)
    }

    pub const fn markers(&self) -> &MarkerSync<M> {
        &self.markers
    }

    pub const fn storage(&self) -> &S {
        &self.storage
    }
}
