use anyhow::{Result, anyhow};
use colored::Colorize;

use spotta::config::Config;
use spotta::models::{Template, TemplateSource};
use spotta::service::WorkoutService;
use spotta::types::TemplateId;
use spotta::utils::{format_rest, format_weight};

use crate::cli::TemplateCmd;

pub async fn handle(cmd: TemplateCmd, cfg: &Config, json: bool) -> Result<()> {
    let store = super::build_store(cfg)?;

    match cmd {
        TemplateCmd::List { community } => {
            let templates: Vec<Template> = store
                .load_templates()
                .await
                .into_iter()
                .filter(|t| !community || t.is_community())
                .collect();

            if json {
                return super::emit(&templates);
            }

            if templates.is_empty() {
                println!("{}", "  (no templates found)".dimmed());
                return Ok(());
            }

            println!("{}", "Templates:".cyan().bold());
            let id_w = templates.iter().map(|t| t.id.as_str().len()).max().unwrap_or(0);
            for t in &templates {
                let author = match &t.source {
                    TemplateSource::User => String::new(),
                    TemplateSource::Community { author } => format!(" by {}", author),
                };
                println!(
                    " {} • {}{} {}",
                    format!("{:<width$}", t.id, width = id_w).yellow(),
                    t.name.bold(),
                    author.dimmed(),
                    format!(
                        "– {} exercises, rest {}",
                        t.exercises.len(),
                        format_rest(t.rest_time)
                    )
                    .dimmed()
                );
            }
        }

        TemplateCmd::Show { template } => {
            let t = store
                .service()
                .get_template(&TemplateId::new(template.as_str()))
                .await
                .map_err(|e| anyhow!("{} (`{}`)", e, template))?;

            if json {
                return super::emit(&t);
            }

            println!("{} {}", t.name.bold(), format!("({})", t.id).dimmed());
            if !t.description.is_empty() {
                println!("{}", t.description.dimmed());
            }
            println!("{} {}", "rest:".cyan(), format_rest(t.rest_time));

            let exercises = store
                .service()
                .get_exercises(
                    &t.exercises
                        .iter()
                        .map(|te| te.exercise_id.clone())
                        .collect::<Vec<_>>(),
                )
                .await;

            for (i, te) in t.exercises.iter().enumerate() {
                let name = exercises
                    .iter()
                    .find(|e| e.id == te.exercise_id)
                    .map(|e| e.name.bold().to_string())
                    .unwrap_or_else(|| format!("{} (unknown)", te.exercise_id).red().to_string());
                let weight = te
                    .weight
                    .map(|w| format!(" @ {}kg", format_weight(w)))
                    .unwrap_or_default();
                println!(
                    "{} • {} — {} × {}{}",
                    format!("{}", i + 1).yellow(),
                    name,
                    te.sets,
                    te.reps,
                    weight
                );
            }
        }
    }

    Ok(())
}
