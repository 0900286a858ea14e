//! Log running and cycling workouts at map coordinates.
//!
//! The crate keeps three views of the same data consistent: the in-memory
//! [`store::WorkoutStore`], the map markers in [`markers::MarkerSync`], and
//! the persisted snapshot written through [`storage::SnapshotStorage`].
//! [`app::App`] is the entry point that ties them together.

pub mod app;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod markers;
pub mod render;
pub mod storage;
pub mod store;
pub mod types;
pub mod utils;
