//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};
use crate::criteria::SearchCriterion;

pub const DEFAULT_CONFIG_FILE: &str = "procstat-check.yaml";

/// Default configuration with one example search filled in.
pub fn example_config() -> Config {
    Config {
        searches: Some(vec![SearchCriterion::new("sshd")]),
        ..Config::default()
    }
}

/// Builds the generated file contents.
pub fn generate_config(format: ConfigFormat, commented: bool) -> Result<String, Box<dyn std::error::Error>> {
    let content = render_config(&example_config(), format)?;
    Ok(match format {
        ConfigFormat::Yaml if commented => add_config_comments(content),
        _ => content,
    })
}

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let content = generate_config(format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        eprintln!("Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# procstat-check configuration
# =============================
#
# Check Behaviour
# ---------------
# suppress_ok_output: false    # Only print failing criteria and the overall status
# metrics_only: false          # Skip evaluation, print metrics, always exit 0
# verbose: false               # Debug logging to stderr (probe failures etc.)
# zombie_fail_fast: false      # Exit CRITICAL on the first zombie process
#
# Environment
# -----------
# proc_root: "/proc"           # Root of the proc filesystem
# host_name: null              # host.name label (null = system hostname)
#
# Logging
# -------
# log_level: null              # off, error, warn, info, debug, trace (null = warn)
#
# Search Criteria
# ---------------
# Either a structured list under `searches`, or the same list as a JSON
# string under `search`. Omitted fields take the defaults shown below.
#
# searches:
#   - search_string: "sshd"    # Process name, or command line substring
#     full_cmdline: false      # true = match search_string inside the command line
#     number: 1                # Threshold compared against the match count
#     comparison: ">="         # One of >=, <=, ==, !=, >, <
#     severity: 2              # 1 = WARNING, 2 = CRITICAL when the comparison fails
"#;

    format!("{comments}\n{yaml}")
}
