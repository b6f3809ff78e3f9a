use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use serde::Serialize;

use spotta::catalog::Catalog;
use spotta::clock::SystemClock;
use spotta::config::Config;
use spotta::service::MockWorkoutService;
use spotta::store::SessionStore;

pub mod config;
pub mod exercise;
pub mod flag;
pub mod session;
pub mod suggest;
pub mod template;

pub fn load_catalog(cfg: &Config) -> Result<Catalog> {
    match &cfg.catalog_path {
        Some(path) => Catalog::load(path),
        None => Catalog::builtin(),
    }
}

pub fn build_store(cfg: &Config) -> Result<SessionStore<MockWorkoutService>> {
    let service = MockWorkoutService::new(load_catalog(cfg)?)
        .with_latency(Duration::from_millis(u64::from(cfg.service_latency_ms)));
    Ok(SessionStore::new(
        service,
        Arc::new(SystemClock),
        cfg.store_options(),
    ))
}

/// Rejects weights that would poison volume totals.
pub fn check_weight(weight: Option<f64>) -> Result<()> {
    match weight {
        Some(w) if !(w.is_finite() && w >= 0.0) => {
            bail!("weight must be a non-negative number")
        }
        _ => Ok(()),
    }
}

pub fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
