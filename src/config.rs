use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{MAX_YEAR, MIN_YEAR};

pub const DEFAULT_HISTORY_FILE: &str = "historial_desglose_jarrones.csv";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// File name of the history table, relative to the data dir.
    #[serde(default = "default_history_file")]
    pub history_file: String,

    /// Year used when `--year` is omitted. Falls back to the current year.
    #[serde(default)]
    pub default_year: Option<i32>,

    pub created_at: DateTime<Utc>,
}

fn default_history_file() -> String {
    DEFAULT_HISTORY_FILE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            default_year: None,
            created_at: now_utc(),
        }
    }
}

impl AppConfig {
    pub fn history_path(&self, paths: &AppPaths) -> PathBuf {
        paths.data_dir.join(&self.history_file)
    }

    pub fn resolve_year(&self, explicit: Option<i32>) -> i32 {
        explicit
            .or(self.default_year)
            .unwrap_or_else(|| now_utc().year().clamp(MIN_YEAR, MAX_YEAR))
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

pub fn app_paths(override_home: Option<PathBuf>) -> Result<AppPaths> {
    if let Some(home) = override_home {
        return Ok(AppPaths {
            config_dir: home.join("config"),
            data_dir: home.join("data"),
        });
    }

    let proj = ProjectDirs::from("com", "jarrones", "jarrones")
        .context("Failed to resolve platform directories")?;

    Ok(AppPaths {
        config_dir: proj.config_dir().to_path_buf(),
        data_dir: proj.data_dir().to_path_buf(),
    })
}

pub fn load_or_init_config(paths: &AppPaths) -> Result<(AppConfig, PathBuf)> {
    fs::create_dir_all(&paths.config_dir)
        .with_context(|| format!("Failed to create config dir {}", paths.config_dir.display()))?;
    fs::create_dir_all(&paths.data_dir)
        .with_context(|| format!("Failed to create data dir {}", paths.data_dir.display()))?;

    let cfg_path = paths.config_dir.join("config.json");
    if !cfg_path.exists() {
        let cfg = AppConfig::default();
        write_config(&cfg_path, &cfg)?;
        tracing::debug!(path = %cfg_path.display(), "created default config");
        return Ok((cfg, cfg_path));
    }

    let raw = fs::read_to_string(&cfg_path)
        .with_context(|| format!("Failed to read {}", cfg_path.display()))?;
    let cfg: AppConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", cfg_path.display()))?;

    Ok((cfg, cfg_path))
}

pub fn write_config(path: &Path, cfg: &AppConfig) -> Result<()> {
    let json = serde_json::to_string_pretty(cfg)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}
