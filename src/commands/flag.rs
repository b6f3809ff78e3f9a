use std::collections::BTreeMap;

use anyhow::Result;
use colored::Colorize;
use sqlx::SqlitePool;

use spotta::storage::{DEV_SESSION_COMPLETED, clear_flag, get_flag};

use crate::cli::FlagCmd;

pub async fn handle(cmd: FlagCmd, pool: &SqlitePool, json: bool) -> Result<()> {
    match cmd {
        FlagCmd::Show => {
            let value = get_flag(pool, DEV_SESSION_COMPLETED).await?;
            if json {
                return super::emit(&BTreeMap::from([(DEV_SESSION_COMPLETED, value)]));
            }
            println!("{} = {}", DEV_SESSION_COMPLETED.green(), value);
        }

        FlagCmd::Reset => {
            if clear_flag(pool, DEV_SESSION_COMPLETED).await? {
                println!("{} cleared `{}`", "ok:".green().bold(), DEV_SESSION_COMPLETED);
            } else {
                println!("{} `{}` was not set", "info:".blue().bold(), DEV_SESSION_COMPLETED);
            }
        }
    }

    Ok(())
}
