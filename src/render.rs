//! Text shown for a workout: the map popup and the list entry.

use crate::types::{Workout, WorkoutKind};
use std::fmt;

/// Popup attached to a workout's marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub content: String,
    /// `"running-popup"` / `"cycling-popup"`.
    pub class_name: String,
}

impl Popup {
    pub fn for_workout(w: &Workout) -> Self {
        Self {
            content: format!("{} {}", kind_icon(w.kind()), w.description()),
            class_name: format!("{}-popup", w.kind()),
        }
    }
}

pub const fn kind_icon(kind: WorkoutKind) -> &'static str {
    match kind {
        WorkoutKind::Running => "🏃‍♂️",
        WorkoutKind::Cycling => "🚴‍♀️",
    }
}

/// One `icon value unit` cell of a list entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Detail {
    pub icon: &'static str,
    pub value: String,
    pub unit: &'static str,
}

/// Row shown in the workout list.
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub id: String,
    pub kind: WorkoutKind,
    pub title: String,
    pub details: [Detail; 4],
}

impl ListEntry {
    /// Distance and duration as entered, metric rounded to one decimal.
    pub fn for_workout(w: &Workout) -> Self {
        let (field_icon, metric_unit, field_unit) = match w.kind() {
            WorkoutKind::Running => ("🦶🏼", "min/km", "spm"),
            WorkoutKind::Cycling => ("⛰", "km/h", "m"),
        };

        Self {
            id: w.id().to_string(),
            kind: w.kind(),
            title: w.description().to_string(),
            details: [
                Detail {
                    icon: kind_icon(w.kind()),
                    value: w.distance().to_string(),
                    unit: "km",
                },
                Detail {
                    icon: "⏱",
                    value: w.duration().to_string(),
                    unit: "min",
                },
                Detail {
                    icon: "⚡️",
                    value: format!("{:.1}", w.metric()),
                    unit: metric_unit,
                },
                Detail {
                    icon: field_icon,
                    value: w.variant_field().value().to_string(),
                    unit: field_unit,
                },
            ],
        }
    }
}

impl fmt::Display for ListEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.id, self.title)?;
        for d in &self.details {
            write!(f, "\t{} {} {}", d.icon, d.value, d.unit)?;
        }
        Ok(())
    }
}
