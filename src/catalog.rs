use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::models::{Exercise, Template};
use crate::types::{ExerciseId, Muscle, TemplateId, best_suggestion};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.toml");

/// Exercises and starter templates, as read from `[[exercise]]` and
/// `[[template]]` entries of a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default, rename = "exercise")]
    pub exercises: Vec<Exercise>,
    #[serde(default, rename = "template")]
    pub templates: Vec<Template>,
}

impl Catalog {
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CATALOG).context("Built-in catalog is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read catalog: `{}`", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid catalog file: {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let catalog: Catalog =
            toml::from_str(s).context("Failed to parse TOML: expected `[[exercise]]` entries")?;

        for (i, ex) in catalog.exercises.iter().enumerate() {
            if ex.id.as_str().trim().is_empty() {
                bail!("exercise #{} has an empty id", i + 1);
            }
            if catalog.exercises[..i].iter().any(|other| other.id == ex.id) {
                bail!("duplicate exercise id `{}`", ex.id);
            }
        }

        // Dangling references are tolerated; starting such a template simply
        // resolves fewer exercises.
        for t in &catalog.templates {
            for te in &t.exercises {
                if catalog.exercise(&te.exercise_id).is_none() {
                    log::warn!(
                        "template `{}` references unknown exercise `{}`",
                        t.id,
                        te.exercise_id
                    );
                }
            }
        }

        Ok(catalog)
    }

    pub fn exercise(&self, id: &ExerciseId) -> Option<&Exercise> {
        self.exercises.iter().find(|e| &e.id == id)
    }

    pub fn template(&self, id: &TemplateId) -> Option<&Template> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn by_muscle(&self, muscle: Muscle) -> impl Iterator<Item = &Exercise> {
        self.exercises
            .iter()
            .filter(move |e| e.muscles.contains(&muscle))
    }

    /// Look up by id or by (case-insensitive) name. On a miss the error
    /// carries a "did you mean" hint when there is a clear candidate.
    pub fn resolve(&self, input: &str) -> Result<&Exercise> {
        let needle = input.trim();
        if let Some(ex) = self
            .exercises
            .iter()
            .find(|e| e.id.as_str() == needle || e.name.eq_ignore_ascii_case(needle))
        {
            return Ok(ex);
        }

        match best_suggestion(needle, self.exercises.iter().map(|e| e.name.as_str())) {
            Some(sug) => bail!("unknown exercise `{}` -- did you mean: `{}`?", needle, sug),
            None => bail!("unknown exercise `{}`", needle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TemplateSource;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.exercises.len() >= 10);
        let push = catalog.template(&TemplateId::new("push-day")).unwrap();
        assert_eq!(push.rest_time, 120);
        assert_eq!(push.source, TemplateSource::User);
        assert!(push
            .exercises
            .iter()
            .all(|te| catalog.exercise(&te.exercise_id).is_some()));

        let community = catalog
            .template(&TemplateId::new("community-upper"))
            .unwrap();
        assert!(community.is_community());
    }

    #[test]
    fn resolve_by_id_name_and_hint() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(
            catalog.resolve("bench-press").unwrap().name,
            "Bench Press"
        );
        assert_eq!(
            catalog.resolve("back squat").unwrap().id,
            ExerciseId::new("back-squat")
        );

        let err = catalog.resolve("bench pres").unwrap_err().to_string();
        assert!(err.contains("did you mean"), "{err}");
    }

    #[test]
    fn duplicate_ids_rejected() {
        let toml = r#"
            [[exercise]]
            id = "a"
            name = "A"
            category = "strength"
            equipment = "barbell"

            [[exercise]]
            id = "a"
            name = "Another A"
            category = "cardio"
            equipment = "other"
        "#;
        assert!(Catalog::from_toml_str(toml).is_err());
    }

    #[test]
    fn filter_by_muscle() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog
            .by_muscle(Muscle::Calves)
            .any(|e| e.id == ExerciseId::new("calf-raise")));
    }
}
