use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::source::{PROC_MEMINFO, PROC_STAT};

pub const ENV_URL: &str = "CPULOADS_INFLUX_URL";
pub const ENV_ORG: &str = "CPULOADS_INFLUX_ORG";
pub const ENV_BUCKET: &str = "CPULOADS_INFLUX_BUCKET";
pub const ENV_PRECISION: &str = "CPULOADS_INFLUX_PRECISION";
pub const ENV_TOKEN: &str = "CPULOADS_INFLUX_TOKEN";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub influx: InfluxConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub cpu_stat_path: PathBuf,
    pub meminfo_path: PathBuf,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            cpu_stat_path: PathBuf::from(PROC_STAT),
            meminfo_path: PathBuf::from(PROC_MEMINFO),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct InfluxConfig {
    pub url: String,
    pub org: String,
    pub bucket: String,
    pub precision: String,
    pub auth_scheme: String,
    pub timeout_ms: u64,
    pub token: Option<String>,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        InfluxConfig {
            url: "http://localhost:8086".to_string(),
            org: "default".to_string(),
            bucket: "cpuloads".to_string(),
            precision: "s".to_string(),
            auth_scheme: "Token".to_string(),
            timeout_ms: 5000,
            token: None,
        }
    }
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("url", &self.url)
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("precision", &self.precision)
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout_ms", &self.timeout_ms)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub cpu_measurement: String,
    pub memory_measurement: String,
    pub include_total: bool,
    pub enable_cpu: bool,
    pub enable_memory: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            cpu_measurement: "cpu".to_string(),
            memory_measurement: "ram".to_string(),
            include_total: false,
            enable_cpu: true,
            enable_memory: true,
        }
    }
}

impl Config {
    /// Override connection settings from `CPULOADS_INFLUX_*` variables.
    ///
    /// Takes a lookup function so callers and tests can supply their own
    /// environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_URL) {
            self.influx.url = url;
        }
        if let Some(org) = non_empty(ENV_ORG) {
            self.influx.org = org;
        }
        if let Some(bucket) = non_empty(ENV_BUCKET) {
            self.influx.bucket = bucket;
        }
        if let Some(precision) = non_empty(ENV_PRECISION) {
            self.influx.precision = precision;
        }
        if let Some(token) = non_empty(ENV_TOKEN) {
            self.influx.token = Some(token);
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cpuloads").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "invalid config, using defaults");
                Config::default()
            }
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "unreadable config, using defaults");
            Config::default()
        }
    }
}
