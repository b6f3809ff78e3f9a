use anyhow::Result;
use colored::Colorize;
use spotta::config::{Config, config_path};

use crate::cli::ConfigCmd;

pub async fn handle(cmd: ConfigCmd, json: bool) -> Result<()> {
    let config_path = config_path()?;
    let mut cfg = Config::load(&config_path)?;

    match cmd {
        ConfigCmd::List => {
            let entries = cfg.entries()?;
            if json {
                let map: std::collections::BTreeMap<_, _> = entries.into_iter().collect();
                return super::emit(&map);
            }
            println!("{} {}", "Config:".cyan().bold(), config_path.display().to_string().dimmed());
            for (k, v) in entries {
                println!("  {} = {}", k.green(), v);
            }
        }

        ConfigCmd::Get { key } => match cfg.get(&key)? {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            cfg.set(&key, &val)?;
            cfg.save(&config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.unset(&key)? {
                cfg.save(&config_path)?;
                println!("{} reset `{}` to its default", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
