//! procstat-check - version 0.1.0
//!
//! Entry point: resolves configuration, initializes logging, runs one check
//! and maps the overall severity to the process exit code.

use std::io::Write;
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};

use procstat_check::cli::{Args, Commands};
use procstat_check::commands::command_config;
use procstat_check::config::{config_path, resolve_config, show_config, validate_effective_config, Config};
use procstat_check::process::procfs::looks_like_procfs;
use procstat_check::{run_check, system, CheckOptions, ProcfsProbe, ProcfsSource, Severity};

/// Initializes tracing on stderr; stdout carries only the check output.
fn setup_logging(config: &Config) {
    let level = config.effective_log_level();
    let filter = level.parse::<LevelFilter>().unwrap_or(LevelFilter::WARN);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
        return;
    }

    debug!("Logging initialized with level: {}", filter);
}

/// Reports where the configuration came from once logging is up.
fn log_config_source(args: &Args) {
    if args.no_config {
        debug!("Config file loading disabled");
        return;
    }
    match config_path(args.config.as_deref()) {
        Some(path) => info!("Loaded configuration from: {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
}

/// Runs the check with the resolved configuration.
fn run(config: &Config) -> anyhow::Result<Severity> {
    let opts = CheckOptions::from_config(config, system::host_name())?;
    if opts.host_name.is_none() {
        warn!("Hostname lookup failed, host.name label will be omitted");
    }
    if !looks_like_procfs(&opts.proc_root) {
        warn!("{} does not look like a proc filesystem", opts.proc_root.display());
    }
    info!(
        "Checking {} search criteria under {}",
        opts.criteria.len(),
        opts.proc_root.display()
    );

    let source = ProcfsSource::new(opts.proc_root.clone());
    let probe = ProcfsProbe::new(opts.proc_root.clone());
    let timestamp_ms = chrono::Utc::now().timestamp_millis();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let severity = run_check(&opts, &source, &probe, timestamp_ms, &mut out).context("check failed")?;
    Ok(severity)
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Subcommands and config inspection exit 0/1 like ordinary tools
    if let Some(Commands::Config {
        output,
        format,
        commented,
    }) = &args.command
    {
        return match command_config(output.clone(), *format, *commented) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Failed to generate configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if args.show_config || args.check_config {
        let config = match resolve_config(&args) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Configuration invalid: {}", e);
                return ExitCode::FAILURE;
            }
        };

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("Configuration invalid: {}", e);
                return ExitCode::FAILURE;
            }
            println!("Configuration is valid");
            return ExitCode::SUCCESS;
        }

        return match show_config(&config, args.config_format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Failed to render configuration: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    let result = resolve_config(&args)
        .map_err(|e| anyhow!("invalid configuration: {}", e))
        .and_then(|config| {
            setup_logging(&config);
            log_config_source(&args);
            run(&config)
        });

    match result {
        Ok(severity) => ExitCode::from(severity.exit_code()),
        Err(e) => {
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "# Status - {}: {:#}", Severity::CRITICAL.label(), e);
            ExitCode::from(Severity::CRITICAL.exit_code())
        }
    }
}
