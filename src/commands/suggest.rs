use anyhow::{Result, bail};
use colored::Colorize;

use spotta::config::Config;
use spotta::progression::{Reasoning, Suggestion};
use spotta::utils::format_weight;

pub async fn handle(weight: f64, reps: u32, cfg: &Config, json: bool) -> Result<()> {
    super::check_weight(Some(weight))?;

    let progression = cfg.store_options().progression;
    let Some(suggestion) = progression.suggest(&[(weight, reps)]) else {
        bail!("nothing to base a suggestion on");
    };

    if json {
        return super::emit(&suggestion);
    }
    print_suggestion(&suggestion);
    Ok(())
}

pub fn print_suggestion(s: &Suggestion) {
    let why = match s.reasoning {
        Reasoning::DecreaseWeight => "reps fell short, back off".red(),
        Reasoning::IncreaseWeight => "top of the range, go heavier".green(),
        Reasoning::AddReps => "keep the weight, add a rep".yellow(),
    };
    println!(
        "{} {}kg × {} {}",
        "next:".cyan().bold(),
        format_weight(s.weight),
        s.reps,
        format!("({}: {})", s.reasoning.as_str(), why).dimmed()
    );
}
