//! CLI arguments and subcommands for procstat-check.
//!
//! Every check flag can also be set through a `PROCESSES_CHECK_*` environment
//! variable; explicit flags and environment values take precedence over the
//! configuration file. Boolean variables accept `1`/`0`, `yes`/`no`, `on`/`off`
//! and `true`/`false`.

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug, Default)]
#[command(
    name = "procstat-check",
    about = "Process presence check with per-process resource metrics",
    long_about = "Process presence check with per-process resource metrics.\n\n\
                  Scans the process table once, counts the processes matching each \
                  configured search, raises WARNING/CRITICAL when a count fails its \
                  threshold and prints per-process and summary gauges in the \
                  Prometheus text format.",
    version = "0.1.0",
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// JSON array of search criteria
    #[arg(short = 's', long, env = "PROCESSES_CHECK_SEARCH")]
    pub search: Option<String>,

    /// Do not print status lines for criteria that passed
    #[arg(
        short = 'S',
        long,
        env = "PROCESSES_CHECK_SUPPRESS_OK_OUTPUT",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub suppress_ok_output: bool,

    /// Only print metrics; skip evaluation and always exit OK
    #[arg(
        short = 'm',
        long,
        env = "PROCESSES_CHECK_METRICS_ONLY",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub metrics_only: bool,

    /// Log probe failures and other diagnostics to stderr
    #[arg(
        short = 'v',
        long,
        env = "PROCESSES_CHECK_VERBOSE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,

    /// Exit CRITICAL as soon as a zombie process is found
    #[arg(
        short = 'z',
        long,
        env = "PROCESSES_CHECK_ZOMBIE_FAIL_FAST",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub zombie_fail_fast: bool,

    /// Root of the proc filesystem
    #[arg(long)]
    pub proc_root: Option<PathBuf>,

    /// Value of the host.name label (default: system hostname)
    #[arg(long)]
    pub host_name: Option<String>,

    /// Log level (default: warn, or debug with --verbose)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
