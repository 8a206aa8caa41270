use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use control::Orchestrator;
use serde::Deserialize;
use shared::domain::{MapEntry, TaskEntry};

const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bind_addr: String,
    pub seed_file: Option<PathBuf>,
    pub log_filter: String,
    pub event_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8480".into(),
            seed_file: None,
            log_filter: "info".into(),
            event_capacity: 256,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    bind_addr: Option<String>,
    seed_file: Option<PathBuf>,
    log_filter: Option<String>,
    event_capacity: Option<usize>,
}

pub fn load_settings() -> Settings {
    let raw = fs::read_to_string(SETTINGS_FILE).ok();
    settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file, then the environment.
fn settings_from(file: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Some(file_cfg) = file.and_then(|raw| toml::from_str::<FileSettings>(raw).ok()) {
        if let Some(v) = file_cfg.bind_addr {
            settings.bind_addr = v;
        }
        if let Some(v) = file_cfg.seed_file {
            settings.seed_file = Some(v);
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
        if let Some(v) = file_cfg.event_capacity {
            settings.event_capacity = v;
        }
    }

    if let Some(v) = env("MOWER_BIND") {
        settings.bind_addr = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Some(v) = env("MOWER_SEED_FILE") {
        settings.seed_file = Some(PathBuf::from(v));
    }
    if let Some(v) = env("APP__SEED_FILE") {
        settings.seed_file = Some(PathBuf::from(v));
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if let Some(v) = env("APP__EVENT_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.event_capacity = parsed;
        }
    }

    settings.event_capacity = settings.event_capacity.max(1);
    settings
}

/// Saved maps and tasks fed to the catalogs at startup.
#[derive(Debug, Default, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub maps: Vec<MapEntry>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

impl SeedCatalog {
    pub fn install(self, orchestrator: &mut Orchestrator) {
        for map in self.maps {
            orchestrator.save_map(map);
        }
        for task in self.tasks {
            orchestrator.save_task(task);
        }
    }
}

pub fn load_seed(path: &Path) -> anyhow::Result<SeedCatalog> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed catalog '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse seed catalog '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
