use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

use spotta::config::{Config, config_path};
use spotta::db::open;

mod cli;
mod commands;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let cfg = Config::load(&config_path()?)?;
    log::debug!("using database {}", cfg.db_path);

    match cli.cmd {
        Commands::Session => {
            let pool = open(&cfg.db_path).await?;
            commands::session::handle(&cfg, &pool, cli.json).await?
        }
        Commands::Template(cmd) => commands::template::handle(cmd, &cfg, cli.json).await?,
        Commands::Exercise(cmd) => commands::exercise::handle(cmd, &cfg, cli.json).await?,
        Commands::Suggest { weight, reps } => {
            commands::suggest::handle(weight, reps, &cfg, cli.json).await?
        }
        Commands::Config(cmd) => commands::config::handle(cmd, cli.json).await?,
        Commands::Flag(cmd) => {
            let pool = open(&cfg.db_path).await?;
            commands::flag::handle(cmd, &pool, cli.json).await?
        }
    }

    Ok(())
}
