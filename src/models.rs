use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{
    Category, Equipment, ExerciseId, Muscle, SessionId, SetId, TemplateId, WorkoutId,
};

/// Catalog entry describing a movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub muscles: Vec<Muscle>,
    pub equipment: Equipment,
}

/// The one in-progress workout.
/// Elapsed time is never stored; it is `now - started_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: SessionId,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub template_id: Option<TemplateId>,
    pub exercises: Vec<SessionExercise>,
    pub total_volume: f64,
    pub template_rest_time: Option<u32>,
    pub customized_exercises: BTreeSet<ExerciseId>,
}

impl ActiveSession {
    pub fn exercise(&self, id: &ExerciseId) -> Option<&SessionExercise> {
        self.exercises.iter().find(|e| &e.id == id)
    }

    pub fn exercise_mut(&mut self, id: &ExerciseId) -> Option<&mut SessionExercise> {
        self.exercises.iter_mut().find(|e| &e.id == id)
    }

    /// Index of the exercise owning `set_id`. Full scan over every set list.
    pub fn position_of_set(&self, set_id: &SetId) -> Option<usize> {
        self.exercises
            .iter()
            .position(|e| e.sets.iter().any(|s| &s.id == set_id))
    }

    pub fn recompute_volume(&mut self) {
        self.total_volume = total_volume(&self.exercises);
    }

    pub fn set_counts(&self) -> (usize, usize) {
        let total = self.exercises.iter().map(|e| e.sets.len()).sum();
        let completed = self
            .exercises
            .iter()
            .flat_map(|e| e.sets.iter())
            .filter(|s| s.completed)
            .count();
        (total, completed)
    }

    /// Rewrites `order_index` to match the current vector order.
    pub fn renumber_exercises(&mut self) {
        for (i, ex) in self.exercises.iter_mut().enumerate() {
            ex.order_index = i as u32;
        }
    }
}

/// Sum of weight × reps over completed sets. A completed set with no weight
/// or no reps contributes nothing.
pub fn total_volume(exercises: &[SessionExercise]) -> f64 {
    exercises
        .iter()
        .flat_map(|e| e.sets.iter())
        .filter(|s| s.completed)
        .filter_map(|s| Some(s.weight? * f64::from(s.reps?)))
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExercise {
    pub id: ExerciseId,
    pub exercise: Exercise,
    pub sets: Vec<SetData>,
    pub order_index: u32,
    pub rest_preset: u32,
}

impl SessionExercise {
    pub fn new(exercise: Exercise, order_index: u32, rest_preset: u32) -> Self {
        Self {
            id: exercise.id.clone(),
            exercise,
            sets: vec![SetData::empty(1)],
            order_index,
            rest_preset,
        }
    }

    pub fn set_mut(&mut self, id: &SetId) -> Option<&mut SetData> {
        self.sets.iter_mut().find(|s| &s.id == id)
    }

    pub fn renumber_sets(&mut self) {
        for (i, set) in self.sets.iter_mut().enumerate() {
            set.set_number = i as u32 + 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetData {
    pub id: SetId,
    pub set_number: u32,
    pub weight: Option<f64>,
    pub reps: Option<u32>,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

impl SetData {
    pub fn empty(set_number: u32) -> Self {
        Self {
            id: SetId::generate(),
            set_number,
            weight: None,
            reps: None,
            completed: false,
            completed_at: None,
        }
    }

    pub fn apply(&mut self, update: &SetUpdate) {
        if let Some(w) = update.weight {
            self.weight = Some(w);
        }
        if let Some(r) = update.reps {
            self.reps = Some(r);
        }
    }
}

/// Partial edit of a set. `None` leaves the field as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SetUpdate {
    pub weight: Option<f64>,
    pub reps: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestTimerState {
    pub is_active: bool,
    pub remaining_time: u32,
    pub total_time: u32,
    pub exercise_id: Option<ExerciseId>,
    /// Wall-clock anchor for the countdown; `None` while paused or idle.
    pub started_at: Option<DateTime<Utc>>,
    pub show_as_modal: bool,
}

impl Default for RestTimerState {
    fn default() -> Self {
        Self {
            is_active: false,
            remaining_time: 0,
            total_time: 0,
            exercise_id: None,
            started_at: None,
            show_as_modal: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TemplateSource {
    User,
    Community { author: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub exercises: Vec<TemplateExercise>,
    pub rest_time: u32,
    #[serde(default)]
    pub last_completed: Option<DateTime<Utc>>,
    pub source: TemplateSource,
}

impl Template {
    pub fn is_community(&self) -> bool {
        matches!(self.source, TemplateSource::Community { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateExercise {
    pub exercise_id: ExerciseId,
    pub sets: u32,
    pub reps: u32,
    pub weight: Option<f64>,
}

/// Summary kept after a session is finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: WorkoutId,
    pub name: String,
    pub template_id: Option<TemplateId>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_seconds: i64,
    pub total_sets: usize,
    pub completed_sets: usize,
    pub total_volume: f64,
    pub exercise_count: usize,
}

/// One completed set as remembered for progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformedSet {
    pub exercise_id: ExerciseId,
    pub set_number: u32,
    pub weight: f64,
    pub reps: u32,
    pub performed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(id: &str) -> Exercise {
        Exercise {
            id: ExerciseId::new(id),
            name: id.to_string(),
            category: Category::Strength,
            muscles: vec![Muscle::Chest],
            equipment: Equipment::Barbell,
        }
    }

    fn set(n: u32, weight: Option<f64>, reps: Option<u32>, completed: bool) -> SetData {
        SetData {
            weight,
            reps,
            completed,
            ..SetData::empty(n)
        }
    }

    #[test]
    fn volume_counts_only_completed_sets_with_data() {
        let mut ex = SessionExercise::new(exercise("bench"), 0, 90);
        ex.sets = vec![
            set(1, Some(100.0), Some(5), true),
            set(2, Some(100.0), Some(5), false),
            set(3, None, Some(10), true),
            set(4, Some(60.0), None, true),
        ];
        let mut other = SessionExercise::new(exercise("row"), 1, 90);
        other.sets = vec![set(1, Some(50.0), Some(10), true)];

        assert_eq!(total_volume(&[ex.clone(), other.clone()]), 1000.0);
        // Recomputing with unchanged data gives the same answer.
        assert_eq!(total_volume(&[ex, other]), 1000.0);
    }

    #[test]
    fn new_session_exercise_has_one_empty_set() {
        let ex = SessionExercise::new(exercise("squat"), 2, 120);
        assert_eq!(ex.id, ExerciseId::new("squat"));
        assert_eq!(ex.sets.len(), 1);
        assert_eq!(ex.sets[0].set_number, 1);
        assert!(!ex.sets[0].completed);
        assert_eq!(ex.rest_preset, 120);
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut s = set(1, Some(80.0), Some(8), false);
        s.apply(&SetUpdate {
            weight: None,
            reps: Some(10),
        });
        assert_eq!(s.weight, Some(80.0));
        assert_eq!(s.reps, Some(10));
    }
}
