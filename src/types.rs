use once_cell::sync::Lazy;
use std::{collections::HashMap, fmt::Display};
use strsim::jaro_winkler;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            /// A fresh random identifier.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_type!(SessionId);
id_type!(
    /// Catalog key of an exercise. Also used as the per-session exercise key.
    ExerciseId
);
id_type!(SetId);
id_type!(TemplateId);
id_type!(WorkoutId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Muscle {
    Biceps,
    Triceps,
    Forearms,
    Chest,
    Shoulders,
    Back,
    Quads,
    Hamstrings,
    Glutes,
    Calves,
    Abs,
}

impl Display for Muscle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Biceps => "biceps",
            Self::Triceps => "triceps",
            Self::Forearms => "forearms",
            Self::Chest => "chest",
            Self::Shoulders => "shoulders",
            Self::Back => "back",
            Self::Quads => "quads",
            Self::Hamstrings => "hamstrings",
            Self::Glutes => "glutes",
            Self::Calves => "calves",
            Self::Abs => "abs",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Strength,
    Cardio,
    Bodyweight,
    Mobility,
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Strength => "strength",
            Self::Cardio => "cardio",
            Self::Bodyweight => "bodyweight",
            Self::Mobility => "mobility",
        };

        write!(f, "{}", s)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Kettlebell,
    Bodyweight,
    Band,
    Other,
}

impl Display for Equipment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Barbell => "barbell",
            Self::Dumbbell => "dumbbell",
            Self::Machine => "machine",
            Self::Cable => "cable",
            Self::Kettlebell => "kettlebell",
            Self::Bodyweight => "bodyweight",
            Self::Band => "band",
            Self::Other => "other",
        };

        write!(f, "{}", s)
    }
}

/// Spellings people actually type, mapped onto the canonical muscle.
static MUSCLE_ALIASES: Lazy<HashMap<&'static str, Muscle>> = Lazy::new(|| {
    HashMap::from([
        ("biceps", Muscle::Biceps),
        ("bicep", Muscle::Biceps),
        ("triceps", Muscle::Triceps),
        ("tricep", Muscle::Triceps),
        ("forearms", Muscle::Forearms),
        ("chest", Muscle::Chest),
        ("pecs", Muscle::Chest),
        ("shoulders", Muscle::Shoulders),
        ("delts", Muscle::Shoulders),
        ("back", Muscle::Back),
        ("lats", Muscle::Back),
        ("quads", Muscle::Quads),
        ("quadriceps", Muscle::Quads),
        ("hamstrings", Muscle::Hamstrings),
        ("glutes", Muscle::Glutes),
        ("calves", Muscle::Calves),
        ("abs", Muscle::Abs),
        ("core", Muscle::Abs),
    ])
});

/// Returns the canonical muscle for `m` or `None` if it is not recognised.
pub fn canonical_muscle<S: AsRef<str>>(m: S) -> Option<Muscle> {
    let m = m.as_ref().trim().to_ascii_lowercase();
    MUSCLE_ALIASES.get(m.as_str()).copied()
}

/// Return the closest candidate for `input` if similarity ≥ 0.80 *and* it is
/// clearly better than the runner-up. Otherwise return `None` (no suggestion
/// shown).
pub fn best_suggestion<'a, I>(input: &str, candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let inp = input.trim().to_ascii_lowercase();
    if inp.is_empty() {
        return None;
    }

    // Collect (candidate, score) pairs.
    let mut scores: Vec<(&'a str, f64)> = candidates
        .into_iter()
        .map(|c| (c, jaro_winkler(&inp, &c.to_ascii_lowercase())))
        .collect();

    // Highest score first.
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    let (best, best_score) = *scores.first()?;
    let second_score = scores.get(1).map(|(_, s)| *s).unwrap_or(0.0);

    const MIN_SCORE: f64 = 0.80;
    const GAP: f64 = 0.02;

    if best_score >= MIN_SCORE && best_score - second_score >= GAP {
        Some(best)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_muscle_accepts_aliases() {
        assert_eq!(canonical_muscle("Quadriceps"), Some(Muscle::Quads));
        assert_eq!(canonical_muscle(" lats "), Some(Muscle::Back));
        assert_eq!(canonical_muscle("neck"), None);
    }

    #[test]
    fn suggestion_picks_clear_winner() {
        let names = ["bench-press", "back-squat", "deadlift"];
        assert_eq!(best_suggestion("bench-pres", names), Some("bench-press"));
        assert_eq!(best_suggestion("zzz", names), None);
        assert_eq!(best_suggestion("", names), None);
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(SetId::generate(), SetId::generate());
        assert_eq!(ExerciseId::new("squat").as_str(), "squat");
    }
}
