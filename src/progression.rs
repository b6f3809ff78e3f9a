use serde::{Deserialize, Serialize};

use crate::models::PerformedSet;
use crate::types::ExerciseId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RepRange {
    pub min: u32,
    pub max: u32,
}

impl Default for RepRange {
    fn default() -> Self {
        Self { min: 8, max: 12 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reasoning {
    DecreaseWeight,
    IncreaseWeight,
    AddReps,
}

impl Reasoning {
    pub fn as_str(self) -> &'static str {
        match self {
            Reasoning::DecreaseWeight => "decrease_weight",
            Reasoning::IncreaseWeight => "increase_weight",
            Reasoning::AddReps => "add_reps",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub weight: f64,
    pub reps: u32,
    pub reasoning: Reasoning,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progression {
    pub range: RepRange,
    pub weight_step: f64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            range: RepRange::default(),
            weight_step: 2.5,
        }
    }
}

impl Progression {
    /// Simple progressive overload over the tracked `(weight, reps)` sets.
    /// The last set is the baseline; `None` when nothing was tracked.
    pub fn suggest(&self, tracked: &[(f64, u32)]) -> Option<Suggestion> {
        let &(weight, reps) = tracked.last()?;
        let RepRange { min, max } = self.range;

        let suggestion = if tracked.iter().any(|&(_, r)| r < min) {
            Suggestion {
                weight: (weight - self.weight_step).max(0.0),
                reps: min,
                reasoning: Reasoning::DecreaseWeight,
            }
        } else if tracked.iter().all(|&(_, r)| r >= max) {
            Suggestion {
                weight: weight + self.weight_step,
                reps: min,
                reasoning: Reasoning::IncreaseWeight,
            }
        } else {
            Suggestion {
                weight,
                reps: reps + 1,
                reasoning: Reasoning::AddReps,
            }
        };

        Some(suggestion)
    }

    /// Suggestion for `set_number` of `exercise_id` from the most recent
    /// time that set was performed.
    pub fn suggest_from_history(
        &self,
        history: &[PerformedSet],
        exercise_id: &ExerciseId,
        set_number: u32,
    ) -> Option<Suggestion> {
        let last = history
            .iter()
            .filter(|p| &p.exercise_id == exercise_id && p.set_number == set_number)
            .max_by_key(|p| p.performed_at)?;

        self.suggest(&[(last.weight, last.reps)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn below_range_drops_weight() {
        let s = Progression::default().suggest(&[(135.0, 6)]).unwrap();
        assert_eq!(
            s,
            Suggestion {
                weight: 132.5,
                reps: 8,
                reasoning: Reasoning::DecreaseWeight
            }
        );
    }

    #[test]
    fn at_range_max_adds_weight() {
        let s = Progression::default().suggest(&[(185.0, 12)]).unwrap();
        assert_eq!(
            s,
            Suggestion {
                weight: 187.5,
                reps: 8,
                reasoning: Reasoning::IncreaseWeight
            }
        );
    }

    #[test]
    fn mid_range_adds_a_rep() {
        let s = Progression::default().suggest(&[(95.0, 10)]).unwrap();
        assert_eq!(
            s,
            Suggestion {
                weight: 95.0,
                reps: 11,
                reasoning: Reasoning::AddReps
            }
        );
    }

    #[test]
    fn one_short_set_outweighs_the_rest() {
        let s = Progression::default()
            .suggest(&[(100.0, 12), (100.0, 7), (100.0, 12)])
            .unwrap();
        assert_eq!(s.reasoning, Reasoning::DecreaseWeight);
        assert_eq!(s.weight, 97.5);
    }

    #[test]
    fn no_history_no_suggestion() {
        assert_eq!(Progression::default().suggest(&[]), None);
        assert_eq!(
            Progression::default().suggest_from_history(&[], &ExerciseId::new("bench"), 1),
            None
        );
    }

    #[test]
    fn history_uses_most_recent_matching_set() {
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let bench = ExerciseId::new("bench");
        let row = |set_number, weight, reps, days| PerformedSet {
            exercise_id: bench.clone(),
            set_number,
            weight,
            reps,
            performed_at: t + Duration::days(days),
        };
        let history = vec![
            row(1, 80.0, 12, 0),
            row(1, 82.5, 9, 3),
            row(2, 82.5, 6, 3),
        ];

        let p = Progression::default();
        let s = p.suggest_from_history(&history, &bench, 1).unwrap();
        assert_eq!((s.weight, s.reps, s.reasoning), (82.5, 10, Reasoning::AddReps));

        let s = p.suggest_from_history(&history, &bench, 2).unwrap();
        assert_eq!(s.reasoning, Reasoning::DecreaseWeight);
        assert!(p.suggest_from_history(&history, &bench, 3).is_none());
    }
}
