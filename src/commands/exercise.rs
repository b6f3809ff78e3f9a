use anyhow::{Result, bail};
use clap::ValueEnum;
use colored::Colorize;
use itertools::Itertools;
use serde::Serialize;

use spotta::config::Config;
use spotta::models::Exercise;
use spotta::types::{Muscle, best_suggestion, canonical_muscle};

use crate::cli::ExerciseCmd;

#[derive(Serialize)]
struct ExJson<'a> {
    idx: usize,
    #[serde(flatten)]
    exercise: &'a Exercise,
}

pub async fn handle(cmd: ExerciseCmd, cfg: &Config, json: bool) -> Result<()> {
    let catalog = super::load_catalog(cfg)?;

    match cmd {
        ExerciseCmd::List { muscle } => {
            let filter = match muscle.as_deref() {
                None => None,
                Some(raw) => Some(parse_muscle(raw)?),
            };

            let matching: Box<dyn Iterator<Item = &Exercise> + '_> = match filter {
                Some(m) => Box::new(catalog.by_muscle(m)),
                None => Box::new(catalog.exercises.iter()),
            };
            let rows: Vec<ExJson> = matching
                .sorted_by(|a, b| a.name.cmp(&b.name))
                .enumerate()
                .map(|(i, exercise)| ExJson { idx: i + 1, exercise })
                .collect();

            if json {
                return super::emit(&rows);
            }

            if rows.is_empty() {
                println!("{}", "  (no exercises found)".dimmed());
                return Ok(());
            }

            println!("{}", "Exercises:".cyan().bold());
            let idx_w = rows.len().to_string().len();
            let name_w = rows.iter().map(|r| r.exercise.name.len()).max().unwrap_or(0);
            for r in &rows {
                let idx = format!("{:>width$}", r.idx, width = idx_w).yellow();
                let name = format!("{:<width$}", r.exercise.name, width = name_w);
                println!(
                    " {} • {}  {}",
                    idx,
                    name.bold(),
                    format!("{} · {}", r.exercise.id, muscles(&r.exercise.muscles)).dimmed()
                );
            }
        }

        ExerciseCmd::Show { exercise } => {
            let query = exercise.join(" ");
            if query.trim().is_empty() {
                bail!("no exercise given");
            }
            let ex = catalog.resolve(&query)?;

            if json {
                return super::emit(ex);
            }

            println!("{} {}", ex.name.bold(), format!("({})", ex.id).dimmed());
            println!("  {:<10} {}", "category".dimmed(), ex.category);
            println!("  {:<10} {}", "equipment".dimmed(), ex.equipment);
            println!("  {:<10} {}", "muscles".dimmed(), muscles(&ex.muscles));

            let used_in = catalog
                .templates
                .iter()
                .filter(|t| t.exercises.iter().any(|te| te.exercise_id == ex.id))
                .map(|t| t.name.as_str())
                .join(", ");
            if !used_in.is_empty() {
                println!("  {:<10} {}", "templates".dimmed(), used_in);
            }
        }
    }

    Ok(())
}

fn muscles(list: &[Muscle]) -> String {
    list.iter().join(", ")
}

fn parse_muscle(raw: &str) -> Result<Muscle> {
    if let Some(m) = canonical_muscle(raw) {
        return Ok(m);
    }
    let names: Vec<String> = Muscle::value_variants()
        .iter()
        .map(|m| m.to_string())
        .collect();
    match best_suggestion(raw, names.iter().map(String::as_str)) {
        Some(sug) => bail!("unknown muscle `{}` -- did you mean: `{}`?", raw, sug),
        None => bail!("unknown muscle `{}`", raw),
    }
}
