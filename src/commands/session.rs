use std::io::Write;

use anyhow::{Result, bail};
use clap::Parser;
use colored::Colorize;
use sqlx::SqlitePool;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use spotta::catalog::Catalog;
use spotta::config::Config;
use spotta::models::{ActiveSession, SessionExercise, SetData, SetUpdate};
use spotta::rest_timer::RestPhase;
use spotta::service::MockWorkoutService;
use spotta::storage::{DEV_SESSION_COMPLETED, get_flag, set_flag};
use spotta::store::SessionStore;
use spotta::types::{ExerciseId, TemplateId};
use spotta::utils::{format_duration, format_rest, format_weight};

use crate::cli::{ShellCmd, ShellLine};

type Input = Lines<BufReader<Stdin>>;

enum Flow {
    Continue,
    Quit,
}

struct Shell<'a> {
    store: SessionStore<MockWorkoutService>,
    catalog: Catalog,
    pool: &'a SqlitePool,
    json: bool,
}

pub async fn handle(cfg: &Config, pool: &SqlitePool, json: bool) -> Result<()> {
    let shell = Shell {
        store: super::build_store(cfg)?,
        catalog: super::load_catalog(cfg)?,
        pool,
        json,
    };

    shell.store.load_templates().await;
    shell.store.load_recent_workouts().await;
    if shell.store.restore_active_session().await.is_none() && cfg.dev_seed {
        shell.seed().await?;
    }

    println!(
        "{} type {} for commands, {} to leave",
        "spotta".cyan().bold(),
        "help".yellow(),
        "quit".yellow()
    );
    if shell.store.active_session().is_some() {
        shell.show()?;
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        shell.prompt()?;
        let Some(line) = input.next_line().await? else {
            break;
        };
        shell.tick().await;

        let words = match split_line(&line) {
            Ok(w) => w,
            Err(e) => {
                println!("{} {}", "error:".red().bold(), e);
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(p) => p,
            Err(e) => {
                e.print()?;
                continue;
            }
        };

        match shell.run(parsed.cmd, &mut input).await {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => {
                // Store failures carry a friendlier message in the state.
                let msg = shell.store.error().unwrap_or_else(|| e.to_string());
                println!("{} {}", "error:".red().bold(), msg);
            }
        }
        shell.store.clear_error();
    }

    if shell.store.active_session().is_some() {
        println!(
            "{} the active session is not kept after the prompt closes",
            "warning:".yellow().bold()
        );
    }
    Ok(())
}

impl Shell<'_> {
    /// Starts the first template so there is something to poke at, until a
    /// session has been finished on this device.
    async fn seed(&self) -> Result<()> {
        if get_flag(self.pool, DEV_SESSION_COMPLETED).await? {
            return Ok(());
        }
        let Some(template) = self.store.snapshot().templates.into_iter().next() else {
            log::debug!("dev seed skipped: no templates");
            return Ok(());
        };
        log::info!("seeding dev session from template {}", template.id);
        self.store.start_from_template(&template.id).await?;
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        let label = match self.store.active_session() {
            Some(s) => format!("{} › ", s.name).green().to_string(),
            None => "› ".dimmed().to_string(),
        };
        print!("{}", label);
        std::io::stdout().flush()?;
        Ok(())
    }

    async fn tick(&self) {
        if self.store.tick_rest_timer() {
            println!("{} rest is over", "info:".blue().bold());
        }
        if let Err(e) = self.store.flush_pending_presets().await {
            log::debug!("pending rest edits not saved: {e}");
            if let Some(msg) = self.store.error() {
                println!("{} {}", "error:".red().bold(), msg);
                self.store.clear_error();
            }
        }
    }

    async fn run(&self, cmd: ShellCmd, input: &mut Input) -> Result<Flow> {
        match cmd {
            ShellCmd::Start { exercises, name } => {
                if !self.make_room(input).await? {
                    return Ok(Flow::Continue);
                }
                let mut ids: Vec<ExerciseId> = Vec::with_capacity(exercises.len());
                for raw in &exercises {
                    ids.push(self.catalog.resolve(raw)?.id.clone());
                }
                let session = self.store.start_session(&ids, name.as_deref()).await?;
                println!(
                    "{} started `{}` with {} exercises",
                    "ok:".green().bold(),
                    session.name,
                    session.exercises.len()
                );
            }

            ShellCmd::Template { template } => {
                if !self.make_room(input).await? {
                    return Ok(Flow::Continue);
                }
                let session = self
                    .store
                    .start_from_template(&TemplateId::new(template.as_str()))
                    .await?;
                println!(
                    "{} started `{}` with {} exercises",
                    "ok:".green().bold(),
                    session.name,
                    session.exercises.len()
                );
            }

            ShellCmd::Show => self.show()?,

            ShellCmd::Set {
                exercise,
                set,
                weight,
                reps,
            } => {
                if weight.is_none() && reps.is_none() {
                    bail!("nothing to change, pass --weight and/or --reps");
                }
                super::check_weight(weight)?;
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                let target = set_at(ex, set)?;
                self.store
                    .update_set(&ex.id, &target.id, SetUpdate { weight, reps })
                    .await?;
                println!(
                    "{} {} set {} updated",
                    "ok:".green().bold(),
                    ex.exercise.name,
                    target.set_number
                );
            }

            ShellCmd::Done {
                exercise,
                set,
                weight,
                reps,
            } => {
                super::check_weight(weight)?;
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                let target = match set {
                    Some(n) => set_at(ex, n)?,
                    None => match ex.sets.iter().find(|s| !s.completed) {
                        Some(s) => s,
                        None => bail!(
                            "every set of {} is done, use `add-set {}` first",
                            ex.exercise.name,
                            exercise
                        ),
                    },
                };
                let done = SetData {
                    weight: weight.or(target.weight),
                    reps: reps.or(target.reps),
                    ..target.clone()
                };
                self.store.complete_set(&done).await?;
                println!(
                    "{} {} set {} done{}",
                    "ok:".green().bold(),
                    ex.exercise.name,
                    done.set_number,
                    describe_load(&done).dimmed()
                );
                if self.store.rest_phase() == RestPhase::Running {
                    println!(
                        "{} resting {}",
                        "info:".blue().bold(),
                        format_rest(self.store.rest_remaining())
                    );
                }
            }

            ShellCmd::AddSet { exercise } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                let set = self.store.add_set(&ex.id).await?;
                println!(
                    "{} {} now has {} sets",
                    "ok:".green().bold(),
                    ex.exercise.name,
                    set.set_number
                );
            }

            ShellCmd::RmSet { exercise, set } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                let target = set_at(ex, set)?;
                self.store.remove_set(&ex.id, &target.id).await?;
                println!(
                    "{} removed set {} of {}",
                    "ok:".green().bold(),
                    target.set_number,
                    ex.exercise.name
                );
            }

            ShellCmd::AddEx { exercise } => {
                let found = self.catalog.resolve(&exercise)?;
                self.store.add_exercise(&found.id).await?;
                println!("{} added {}", "ok:".green().bold(), found.name);
            }

            ShellCmd::RmEx { exercise } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                self.store.remove_exercise(&ex.id).await?;
                println!("{} removed {}", "ok:".green().bold(), ex.exercise.name);
            }

            ShellCmd::Move { from, to } => {
                let session = self.session()?;
                let len = session.exercises.len();
                for idx in [from, to] {
                    if idx == 0 || idx > len {
                        bail!("no exercise at position {}", idx);
                    }
                }
                self.store.reorder_exercises(from - 1, to - 1).await?;
                println!("{} moved {} → {}", "ok:".green().bold(), from, to);
            }

            ShellCmd::Rest { seconds } => {
                self.store.start_rest_timer(seconds, None);
                self.print_timer();
            }

            ShellCmd::Skip => {
                self.store.skip_rest();
                println!("{} rest skipped", "ok:".green().bold());
            }

            ShellCmd::Adjust { delta } => {
                self.store.adjust_rest_timer(delta);
                self.print_timer();
            }

            ShellCmd::Pause => {
                self.store.pause_rest_timer();
                self.print_timer();
            }

            ShellCmd::Resume => {
                self.store.resume_rest_timer();
                self.print_timer();
            }

            ShellCmd::Timer => {
                if self.json {
                    return super::emit(&self.store.snapshot().rest_timer).map(|_| Flow::Continue);
                }
                self.print_timer();
            }

            ShellCmd::Preset { exercise, seconds } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                self.store.update_exercise_rest_preset(&ex.id, seconds)?;
                println!(
                    "{} {} rests {}",
                    "ok:".green().bold(),
                    ex.exercise.name,
                    format_rest(seconds)
                );
            }

            ShellCmd::PresetAll { seconds, template } => {
                if template {
                    self.store
                        .update_all_exercise_rest_presets_from_template(seconds)
                        .await?;
                } else {
                    self.store.update_all_exercise_rest_presets(seconds).await?;
                }
                println!(
                    "{} rest set to {}{}",
                    "ok:".green().bold(),
                    format_rest(seconds),
                    if template { " for every exercise" } else { "" }
                );
            }

            ShellCmd::ResetPreset { exercise } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                self.store.reset_exercise_to_template_time(&ex.id).await?;
                println!(
                    "{} {} back on the default rest time",
                    "ok:".green().bold(),
                    ex.exercise.name
                );
            }

            ShellCmd::Suggest { exercise, set } => {
                let session = self.session()?;
                let ex = exercise_at(&session, exercise)?;
                match self.store.suggest_progression(&ex.id, set as u32).await {
                    Some(s) if self.json => super::emit(&s)?,
                    Some(s) => super::suggest::print_suggestion(&s),
                    None => println!(
                        "{} no history for {} set {}",
                        "info:".blue().bold(),
                        ex.exercise.name,
                        set
                    ),
                }
            }

            ShellCmd::Finish => match self.store.finish_session().await? {
                Some(summary) => {
                    set_flag(self.pool, DEV_SESSION_COMPLETED, true).await?;
                    if self.json {
                        return super::emit(&summary).map(|_| Flow::Continue);
                    }
                    println!(
                        "{} `{}` finished in {}",
                        "ok:".green().bold(),
                        summary.name,
                        format_duration(chrono::Duration::seconds(summary.duration_seconds))
                    );
                    println!(
                        "  {} {}/{} · {} {}kg · {} {}",
                        "sets".dimmed(),
                        summary.completed_sets,
                        summary.total_sets,
                        "volume".dimmed(),
                        format_weight(summary.total_volume),
                        "exercises".dimmed(),
                        summary.exercise_count
                    );
                }
                None => println!("{} nothing to finish", "info:".blue().bold()),
            },

            ShellCmd::Discard => {
                if self.store.discard_session().await? {
                    println!("{} session discarded", "ok:".green().bold());
                } else {
                    println!("{} nothing to discard", "info:".blue().bold());
                }
            }

            ShellCmd::Recent => {
                let recent = self.store.snapshot().recent_workouts;
                if self.json {
                    return super::emit(&recent).map(|_| Flow::Continue);
                }
                if recent.is_empty() {
                    println!("{}", "  (no finished workouts yet)".dimmed());
                }
                for w in &recent {
                    println!(
                        " {} • {} {}",
                        w.finished_at.format("%Y-%m-%d %H:%M").to_string().yellow(),
                        w.name.bold(),
                        format!(
                            "– {}/{} sets, {}kg",
                            w.completed_sets,
                            w.total_sets,
                            format_weight(w.total_volume)
                        )
                        .dimmed()
                    );
                }
            }

            ShellCmd::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn session(&self) -> Result<ActiveSession> {
        match self.store.active_session() {
            Some(s) => Ok(s),
            None => bail!("no active session, use `start` or `template` first"),
        }
    }

    /// Asks what to do with a running session before another one starts.
    /// Returns false when the user keeps the current one.
    async fn make_room(&self, input: &mut Input) -> Result<bool> {
        let Some(current) = self.store.active_session() else {
            return Ok(true);
        };
        print!(
            "{} `{}` is still running. [r]esume it or [d]iscard it? ",
            "warning:".yellow().bold(),
            current.name
        );
        std::io::stdout().flush()?;

        let answer = input.next_line().await?.unwrap_or_default();
        match answer.trim().to_lowercase().as_str() {
            "d" | "discard" => {
                self.store.discard_session().await?;
                Ok(true)
            }
            _ => {
                println!("{} resuming `{}`", "info:".blue().bold(), current.name);
                Ok(false)
            }
        }
    }

    fn show(&self) -> Result<()> {
        if self.json {
            return super::emit(&self.store.snapshot());
        }
        let session = self.session()?;
        let elapsed = self.store.elapsed().unwrap_or_else(chrono::Duration::zero);
        let (total, done) = session.set_counts();

        println!(
            "{} {}",
            session.name.bold(),
            format!(
                "– {} · {}/{} sets · {}kg",
                format_duration(elapsed),
                done,
                total,
                format_weight(session.total_volume)
            )
            .dimmed()
        );

        for (i, ex) in session.exercises.iter().enumerate() {
            let custom = if session.customized_exercises.contains(&ex.id) {
                "*"
            } else {
                ""
            };
            println!(
                "{} • {} {}",
                format!("{}", i + 1).yellow(),
                ex.exercise.name.bold(),
                format!("(rest {}{})", format_rest(ex.rest_preset), custom).dimmed()
            );
            for s in &ex.sets {
                let mark = if s.completed {
                    "✓".green()
                } else {
                    "·".dimmed()
                };
                println!("    {} {}{}", mark, s.set_number, describe_load(s));
            }
        }

        if self.store.rest_phase() != RestPhase::Idle {
            self.print_timer();
        }
        Ok(())
    }

    fn print_timer(&self) {
        let remaining = format_rest(self.store.rest_remaining());
        match self.store.rest_phase() {
            RestPhase::Idle => println!("{} no rest running", "info:".blue().bold()),
            RestPhase::Running => println!("{} resting {}", "rest:".cyan().bold(), remaining),
            RestPhase::Paused => println!(
                "{} paused at {}",
                "rest:".cyan().bold(),
                remaining.yellow()
            ),
        }
    }
}

fn exercise_at(session: &ActiveSession, idx: usize) -> Result<&SessionExercise> {
    match idx.checked_sub(1).and_then(|i| session.exercises.get(i)) {
        Some(ex) => Ok(ex),
        None => bail!("no exercise at position {}", idx),
    }
}

fn set_at(exercise: &SessionExercise, n: usize) -> Result<&SetData> {
    match n.checked_sub(1).and_then(|i| exercise.sets.get(i)) {
        Some(s) => Ok(s),
        None => bail!("{} has no set {}", exercise.exercise.name, n),
    }
}

fn describe_load(set: &SetData) -> String {
    match (set.weight, set.reps) {
        (Some(w), Some(r)) => format!(" {}kg × {}", format_weight(w), r),
        (Some(w), None) => format!(" {}kg", format_weight(w)),
        (None, Some(r)) => format!(" × {}", r),
        (None, None) => String::new(),
    }
}

/// Splits a prompt line on whitespace, keeping quoted runs together.
fn split_line(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        bail!("unterminated quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_line_honours_quotes() {
        let words = split_line(r#"start bench-press "Barbell Row" -n 'Push A'"#).unwrap();
        assert_eq!(
            words,
            vec!["start", "bench-press", "Barbell Row", "-n", "Push A"]
        );
    }

    #[test]
    fn split_words_parse_as_shell_commands() {
        let words = split_line(r#"start bench-press "Barbell Row" -n 'Push A'"#).unwrap();
        match ShellLine::try_parse_from(&words).unwrap().cmd {
            ShellCmd::Start { exercises, name } => {
                assert_eq!(exercises, vec!["bench-press", "Barbell Row"]);
                assert_eq!(name.as_deref(), Some("Push A"));
            }
            _ => panic!("expected start"),
        }

        let words = split_line("preset-all 120 --template").unwrap();
        assert!(matches!(
            ShellLine::try_parse_from(&words).unwrap().cmd,
            ShellCmd::PresetAll {
                seconds: 120,
                template: true
            }
        ));
        assert!(ShellLine::try_parse_from(["lift"]).is_err());
    }

    #[test]
    fn split_line_keeps_empty_quoted_word() {
        assert_eq!(split_line(r#"add-ex """#).unwrap(), vec!["add-ex", ""]);
        assert!(split_line("   ").unwrap().is_empty());
    }

    #[test]
    fn split_line_rejects_open_quote() {
        assert!(split_line("add-ex \"Barbell").is_err());
    }

    #[test]
    fn describe_load_formats_partial_sets() {
        let mut set = SetData::empty(1);
        assert_eq!(describe_load(&set), "");
        set.reps = Some(8);
        assert_eq!(describe_load(&set), " × 8");
        set.weight = Some(82.5);
        assert_eq!(describe_load(&set), " 82.5kg × 8");
    }
}
