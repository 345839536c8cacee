//! Configuration management for procstat-check.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat};
use crate::criteria::{parse_searches, Comparator, SearchCriterion};
use crate::error::CheckError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

// Default configuration constants
pub const DEFAULT_PROC_ROOT: &str = "/proc";
pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const VERBOSE_LOG_LEVEL: &str = "debug";

const VALID_LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Configuration file contents and CLI overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // Check behaviour
    #[serde(alias = "suppress-ok-output")]
    pub suppress_ok_output: Option<bool>,
    #[serde(alias = "metrics-only")]
    pub metrics_only: Option<bool>,
    pub verbose: Option<bool>,
    #[serde(alias = "zombie-fail-fast")]
    pub zombie_fail_fast: Option<bool>,

    // Environment
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    /// Overrides the system hostname in the `host.name` label
    #[serde(alias = "host-name")]
    pub host_name: Option<String>,

    // Logging
    pub log_level: Option<String>,

    /// Raw JSON criteria array, as accepted by `--search`
    pub search: Option<String>,

    /// Structured criteria; mutually exclusive with `search`
    pub searches: Option<Vec<SearchCriterion>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            suppress_ok_output: Some(false),
            metrics_only: Some(false),
            verbose: Some(false),
            zombie_fail_fast: Some(false),
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            host_name: None,
            log_level: None,
            search: None,
            searches: None,
        }
    }
}

impl Config {
    /// Log level in effect: explicit setting, else debug when verbose, else warn.
    pub fn effective_log_level(&self) -> &str {
        match self.log_level.as_deref() {
            Some(level) => level,
            None if self.verbose.unwrap_or(false) => VERBOSE_LOG_LEVEL,
            None => DEFAULT_LOG_LEVEL,
        }
    }

    /// Criteria from either the structured list or the raw JSON string.
    pub fn criteria(&self) -> Result<Vec<SearchCriterion>, CheckError> {
        match (&self.searches, &self.search) {
            (Some(_), Some(_)) => Err(CheckError::Configuration(
                "both search and searches are set; use only one".to_string(),
            )),
            (Some(list), None) => Ok(list.clone()),
            (None, Some(raw)) => parse_searches(raw),
            (None, None) => Ok(Vec::new()),
        }
    }
}

/// Validate effective config (used by --check-config)
pub fn validate_effective_config(cfg: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let criteria = cfg.criteria()?;

    for c in &criteria {
        if !c.is_active() {
            continue;
        }
        if Comparator::parse(&c.comparison).is_none() {
            return Err(format!(
                "Invalid comparison '{}' for search '{}', expected one of >=, <=, ==, !=, >, <",
                c.comparison, c.search_string
            )
            .into());
        }
    }

    if let Some(level) = cfg.log_level.as_deref() {
        if !VALID_LOG_LEVELS.contains(&level) {
            return Err(format!(
                "Invalid log_level '{}', expected one of {}",
                level,
                VALID_LOG_LEVELS.join(", ")
            )
            .into());
        }
    }

    if let Some(root) = &cfg.proc_root {
        if root.as_os_str().is_empty() {
            return Err("proc_root must not be empty".into());
        }
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // A search on the command line replaces any criteria from the file.
    if let Some(search) = &args.search {
        config.search = Some(search.clone());
        config.searches = None;
    }

    // Flags only ever switch behaviour on
    if args.suppress_ok_output {
        config.suppress_ok_output = Some(true);
    }
    if args.metrics_only {
        config.metrics_only = Some(true);
    }
    if args.verbose {
        config.verbose = Some(true);
    }
    if args.zombie_fail_fast {
        config.zombie_fail_fast = Some(true);
    }

    if let Some(root) = &args.proc_root {
        config.proc_root = Some(root.clone());
    }
    if let Some(host) = &args.host_name {
        config.host_name = Some(host.clone());
    }
    if let Some(level) = args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }

    Ok(config)
}

/// Default config file locations, in lookup order.
pub const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "/etc/procstat-check/config.yaml",
    "./procstat-check.yaml",
    "./procstat-check.json",
];

/// The file `load_config` reads: the explicit path if given, else the first
/// existing default location.
pub fn config_path(path: Option<&Path>) -> Option<PathBuf> {
    match path {
        Some(p) => Some(p.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
            .map(Path::to_path_buf),
    }
}

/// Configuration loading with multiple format support
pub fn load_config(path: Option<&Path>) -> Result<Config, Box<dyn std::error::Error>> {
    let Some(path) = config_path(path) else {
        return Ok(Config::default());
    };
    if !path.exists() {
        return Err(format!("Config file not found: {}", path.display()).into());
    }

    let content = fs::read_to_string(&path)?;
    let mut config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;

    // Fill settings the file leaves out
    let defaults = Config::default();
    config.suppress_ok_output = config.suppress_ok_output.or(defaults.suppress_ok_output);
    config.metrics_only = config.metrics_only.or(defaults.metrics_only);
    config.verbose = config.verbose.or(defaults.verbose);
    config.zombie_fail_fast = config.zombie_fail_fast.or(defaults.zombie_fail_fast);
    config.proc_root = config.proc_root.or(defaults.proc_root);

    Ok(config)
}

/// Parses file contents by extension; anything but json/toml is read as YAML.
pub fn parse_config(content: &str, extension: Option<&str>) -> Result<Config, Box<dyn std::error::Error>> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

/// Immutable settings for one check run.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOptions {
    pub criteria: Vec<SearchCriterion>,
    pub suppress_ok_output: bool,
    pub metrics_only: bool,
    pub zombie_fail_fast: bool,
    pub proc_root: PathBuf,
    pub host_name: Option<String>,
    /// The checking process itself; never classified.
    pub self_pid: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            criteria: Vec::new(),
            suppress_ok_output: false,
            metrics_only: false,
            zombie_fail_fast: false,
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            host_name: None,
            self_pid: std::process::id(),
        }
    }
}

impl CheckOptions {
    /// Builds run options from a resolved config. A configured `host_name`
    /// is used as is; `system_host` is the fallback.
    pub fn from_config(cfg: &Config, system_host: Option<String>) -> Result<Self, CheckError> {
        Ok(Self {
            criteria: cfg.criteria()?,
            suppress_ok_output: cfg.suppress_ok_output.unwrap_or(false),
            metrics_only: cfg.metrics_only.unwrap_or(false),
            zombie_fail_fast: cfg.zombie_fail_fast.unwrap_or(false),
            proc_root: cfg
                .proc_root
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT)),
            host_name: cfg.host_name.clone().or(system_host),
            self_pid: std::process::id(),
        })
    }
}
