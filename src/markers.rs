//! Map markers kept in step with the workout store.
//!
//! Markers are indexed by their coordinate key (`"lat,lng"`). Two workouts
//! at exactly the same coordinates share a key: the later render replaces
//! the earlier handle in the index, and the earlier marker can no longer be
//! removed through it.

use crate::config::MapConfig;
use crate::dlog;
use crate::render::Popup;
use crate::types::{Coords, Workout};
use std::collections::HashMap;

/// Smallest lat/lng box containing a set of points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    pub const fn from_point(c: Coords) -> Self {
        Self {
            south: c.lat,
            west: c.lng,
            north: c.lat,
            east: c.lng,
        }
    }

    pub fn extend(self, c: Coords) -> Self {
        Self {
            south: self.south.min(c.lat),
            west: self.west.min(c.lng),
            north: self.north.max(c.lat),
            east: self.east.max(c.lng),
        }
    }

    pub fn contains(&self, c: Coords) -> bool {
        (self.south..=self.north).contains(&c.lat) && (self.west..=self.east).contains(&c.lng)
    }

    pub fn around<I: IntoIterator<Item = Coords>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = Self::from_point(it.next()?);
        Some(it.fold(first, Self::extend))
    }
}

/// The visual map the markers are drawn on.
pub trait MapSurface {
    type Handle;

    fn add_marker(&mut self, coords: Coords, popup: &Popup) -> Self::Handle;
    fn remove_marker(&mut self, handle: Self::Handle);
    fn fly_to(&mut self, coords: Coords, zoom: u8);
    fn fly_to_bounds(&mut self, bounds: Bounds, padding: u32);
}

struct IndexedMarker<H> {
    coords: Coords,
    handle: H,
}

/// Coordinate-keyed index of marker handles over a [`MapSurface`].
pub struct MarkerSync<M: MapSurface> {
    surface: M,
    index: HashMap<String, IndexedMarker<M::Handle>>,
    config: MapConfig,
}

impl<M: MapSurface> MarkerSync<M> {
    pub fn new(surface: M, config: MapConfig) -> Self {
        Self {
            surface,
            index: HashMap::new(),
            config,
        }
    }

    /// Draw a marker for `w`, index it under its coordinate key and fly to it.
    pub fn render_marker(&mut self, w: &Workout) {
        let coords = w.coords();
        let key = coords.key();
        let handle = self.surface.add_marker(coords, &Popup::for_workout(w));

        if self
            .index
            .insert(key.clone(), IndexedMarker { coords, handle })
            .is_some()
        {
            tracing::warn!(key = %key, id = w.id(), "marker key collision; earlier marker is no longer indexed");
        }

        self.surface.fly_to(coords, self.config.zoom);
        dlog!("marker rendered key={key} id={}", w.id());
    }

    /// Remove the marker indexed under `w`'s coordinates. Returns false when none was.
    pub fn remove_marker(&mut self, w: &Workout) -> bool {
        let key = w.coords().key();
        let Some(entry) = self.index.remove(&key) else {
            dlog!("no marker indexed key={key}");
            return false;
        };
        self.surface.remove_marker(entry.handle);
        dlog!("marker removed key={key} id={}", w.id());
        true
    }

    /// Fly to the region containing every indexed marker. `None` when nothing is indexed.
    pub fn fit_all(&mut self) -> Option<Bounds> {
        let bounds = Bounds::around(self.index.values().map(|m| m.coords))?;
        self.surface.fly_to_bounds(bounds, self.config.fit_padding);
        Some(bounds)
    }

    pub fn focus(&mut self, coords: Coords) {
        self.surface.fly_to(coords, self.config.zoom);
    }

    /// Remove every indexed marker from the surface.
    pub fn clear(&mut self) {
        for (_, entry) in self.index.drain() {
            self.surface.remove_marker(entry.handle);
        }
    }

    pub fn contains(&self, coords: Coords) -> bool {
        self.index.contains_key(&coords.key())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub const fn surface(&self) -> &M {
        &self.surface
    }
}

/// Surface without a display: hands out numeric handles and logs every call.
#[derive(Debug, Default)]
pub struct TracingMap {
    next_handle: u64,
    live: usize,
}

impl TracingMap {
    pub const fn new() -> Self {
        Self {
            next_handle: 0,
            live: 0,
        }
    }

    /// Markers currently on the surface, indexed or not.
    pub const fn live_markers(&self) -> usize {
        self.live
    }
}

impl MapSurface for TracingMap {
    type Handle = u64;

    fn add_marker(&mut self, coords: Coords, popup: &Popup) -> u64 {
        self.next_handle += 1;
        self.live += 1;
        tracing::debug!(
            handle = self.next_handle,
            lat = coords.lat,
            lng = coords.lng,
            popup = %popup.content,
            class = %popup.class_name,
            "add marker"
        );
        self.next_handle
    }

    fn remove_marker(&mut self, handle: u64) {
        self.live = self.live.saturating_sub(1);
        tracing::debug!(handle, "remove marker");
    }

    fn fly_to(&mut self, coords: Coords, zoom: u8) {
        tracing::debug!(lat = coords.lat, lng = coords.lng, zoom, "fly to");
    }

    fn fly_to_bounds(&mut self, bounds: Bounds, padding: u32) {
        tracing::debug!(?bounds, padding, "fly to bounds");
    }
}
