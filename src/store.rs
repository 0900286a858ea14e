use crate::error::{WorkoutError, WorkoutResult};
use crate::types::Workout;

/// Ordered collection of workouts, kept in insertion order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkoutStore {
    workouts: Vec<Workout>,
}

impl WorkoutStore {
    pub const fn new() -> Self {
        Self {
            workouts: Vec::new(),
        }
    }

    /// Append a workout. Its id was assigned by the model; a repeat is refused.
    pub fn add(&mut self, workout: Workout) -> WorkoutResult<()> {
        if self.position(workout.id()).is_some() {
            return Err(WorkoutError::DuplicateId(workout.id().to_string()));
        }
        self.workouts.push(workout);
        Ok(())
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Workout> {
        self.workouts.iter_mut().find(|w| w.id() == id)
    }

    /// Remove and return the workout with `id`; `None` when there is none.
    pub fn remove_by_id(&mut self, id: &str) -> Option<Workout> {
        let idx = self.position(id)?;
        Some(self.workouts.remove(idx))
    }

    pub fn list(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn clear(&mut self) {
        self.workouts.clear();
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    /// Largest id that parses as an integer, for seeding the id generator.
    pub fn max_numeric_id(&self) -> Option<i64> {
        self.workouts
            .iter()
            .filter_map(|w| w.id().parse::<i64>().ok())
            .max()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.workouts.iter().position(|w| w.id() == id)
    }
}

impl<'a> IntoIterator for &'a WorkoutStore {
    type Item = &'a Workout;
    type IntoIter = std::slice::Iter<'a, Workout>;

    fn into_iter(self) -> Self::IntoIter {
        self.workouts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Coords, IdGenerator, VariantField};
    use chrono::{TimeZone, Utc};

    fn sample(ids: &mut IdGenerator, n: usize) -> Vec<Workout> {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let coords = Coords::new(10.0 + i as f64, 20.0).unwrap();
                Workout::create(ids, coords, 5.0, 25.0, VariantField::Cadence(160.0), date).unwrap()
            })
            .collect()
    }

    #[test]
    fn keeps_insertion_order() {
        let mut ids = IdGenerator::new();
        let mut store = WorkoutStore::new();
        let ws = sample(&mut ids, 3);
        for w in ws.iter().rev() {
            store.add(w.clone()).unwrap();
        }
        let listed: Vec<&str> = store.list().iter().map(Workout::id).collect();
        let expected: Vec<&str> = ws.iter().rev().map(Workout::id).collect();
        assert_eq!(listed, expected);
    }

    #[test]
    fn remove_shrinks_by_one_only_when_present() {
        let mut ids = IdGenerator::new();
        let mut store = WorkoutStore::new();
        let ws = sample(&mut ids, 3);
        for w in &ws {
            store.add(w.clone()).unwrap();
        }

        let removed = store.remove_by_id(ws[1].id()).unwrap();
        assert_eq!(removed.id(), ws[1].id());
        assert_eq!(store.len(), 2);
        assert!(store.find_by_id(ws[1].id()).is_none());

        assert!(store.remove_by_id("nope").is_none());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let mut ids = IdGenerator::new();
        let mut store = WorkoutStore::new();
        let w = sample(&mut ids, 1).remove(0);
        store.add(w.clone()).unwrap();
        assert_eq!(
            store.add(w.clone()).unwrap_err(),
            WorkoutError::DuplicateId(w.id().to_string())
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn clear_and_max_id() {
        let mut ids = IdGenerator::new();
        let mut store = WorkoutStore::new();
        assert_eq!(store.max_numeric_id(), None);

        let ws = sample(&mut ids, 2);
        for w in &ws {
            store.add(w.clone()).unwrap();
        }
        assert_eq!(store.max_numeric_id(), ws[1].id().parse().ok());

        store.clear();
        assert!(store.is_empty());
    }
}
