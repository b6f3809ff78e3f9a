//! Durable device flags. The only thing that survives a restart.

use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Set once a session has been finished; stops the demo session being seeded.
pub const DEV_SESSION_COMPLETED: &str = "@spotta/dev_session_completed";

pub async fn get_flag(pool: &SqlitePool, key: &str) -> Result<bool> {
    let value: Option<i64> = sqlx::query_scalar("SELECT value FROM flags WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to read flag `{key}`"))?;

    Ok(value.is_some_and(|v| v != 0))
}

pub async fn set_flag(pool: &SqlitePool, key: &str, value: bool) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO flags (key, value, updated_at)
        VALUES (?1, ?2, datetime('now'))
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(i64::from(value))
    .execute(pool)
    .await
    .with_context(|| format!("Failed to write flag `{key}`"))?;

    log::debug!("flag {key} = {value}");
    Ok(())
}

/// Returns whether a flag was present.
pub async fn clear_flag(pool: &SqlitePool, key: &str) -> Result<bool> {
    let res = sqlx::query("DELETE FROM flags WHERE key = ?")
        .bind(key)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to clear flag `{key}`"))?;

    Ok(res.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[tokio::test]
    async fn flag_defaults_to_false_and_toggles() {
        let pool = open_in_memory().await.unwrap();
        assert!(!get_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());

        set_flag(&pool, DEV_SESSION_COMPLETED, true).await.unwrap();
        assert!(get_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());

        set_flag(&pool, DEV_SESSION_COMPLETED, false).await.unwrap();
        assert!(!get_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());

        assert!(clear_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());
        assert!(!clear_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());
    }

    #[tokio::test]
    async fn flag_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spotta.db");
        let url = format!("sqlite://{}", path.display());

        let pool = crate::db::open(&url).await.unwrap();
        set_flag(&pool, DEV_SESSION_COMPLETED, true).await.unwrap();
        pool.close().await;

        let pool = crate::db::open(&url).await.unwrap();
        assert!(get_flag(&pool, DEV_SESSION_COMPLETED).await.unwrap());
    }
}
