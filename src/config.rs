use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};

use crate::progression::{Progression, RepRange};
use crate::store::StoreOptions;

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV_VAR: &str = "SPOTTA_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: String,
    pub catalog_path: Option<PathBuf>,
    pub default_rest_seconds: u32,
    pub rest_debounce_ms: u32,
    pub service_latency_ms: u32,
    pub rep_range_min: u32,
    pub rep_range_max: u32,
    pub weight_step: f64,
    /// Seed a demo session on startup until one has been finished.
    pub dev_seed: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./spotta.db".to_string(),
            catalog_path: None,
            default_rest_seconds: 90,
            rest_debounce_ms: 300,
            service_latency_ms: 0,
            rep_range_min: 8,
            rep_range_max: 12,
            weight_step: 2.5,
            dev_seed: false,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        return Ok(PathBuf::from(p));
    }
    dirs::config_dir()
        .map(|d| d.join("spotta").join("config.toml"))
        .context("Could not determine config directory")
}

impl Config {
    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to save config to {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.rep_range_min == 0 || self.rep_range_min > self.rep_range_max {
            bail!(
                "rep range {}..{} is invalid",
                self.rep_range_min,
                self.rep_range_max
            );
        }
        if !(self.weight_step.is_finite() && self.weight_step > 0.0) {
            bail!("weight_step must be positive");
        }
        Ok(())
    }

    fn as_table(&self) -> Result<toml::Table> {
        match toml::Value::try_from(self)? {
            toml::Value::Table(t) => Ok(t),
            _ => bail!("config did not serialize to a table"),
        }
    }

    /// Every key with its current value, sorted by key.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .as_table()?
            .into_iter()
            .map(|(k, v)| (k, render(&v)))
            .collect())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.as_table()?.get(key).map(render))
    }

    /// Sets `key` from its textual form. The value must fit the key's type.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<()> {
        let defaults = Config::default().as_table()?;
        let mut table = self.as_table()?;
        let known = defaults.contains_key(key) || key == "catalog_path";
        if !known {
            bail!("unknown config key `{key}`");
        }
        table.insert(key.to_string(), parse_value(raw));

        let updated: Config = toml::Value::Table(table)
            .try_into()
            .map_err(|e| anyhow!("invalid value `{raw}` for `{key}`: {e}"))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Puts `key` back to its default. Returns whether the key was known.
    pub fn unset(&mut self, key: &str) -> Result<bool> {
        let mut table = self.as_table()?;
        let defaults = Config::default().as_table()?;
        match defaults.get(key) {
            Some(v) => {
                table.insert(key.to_string(), v.clone());
            }
            None if key == "catalog_path" => {
                table.remove(key);
            }
            None => return Ok(false),
        }
        *self = toml::Value::Table(table).try_into()?;
        Ok(true)
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            default_rest_seconds: self.default_rest_seconds,
            rest_debounce: chrono::Duration::milliseconds(i64::from(self.rest_debounce_ms)),
            progression: Progression {
                range: RepRange {
                    min: self.rep_range_min,
                    max: self.rep_range_max,
                },
                weight_step: self.weight_step,
            },
        }
    }
}

fn render(v: &toml::Value) -> String {
    match v {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numbers and booleans are taken as such; anything else is a string.
fn parse_value(raw: &str) -> toml::Value {
    if let Ok(b) = raw.parse::<bool>() {
        return toml::Value::Boolean(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return toml::Value::Float(f);
    }
    toml::Value::String(raw.to_string())
}
