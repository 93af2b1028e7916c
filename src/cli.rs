// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_SCENARIO_PATH;

/// Command-line arguments for `org-node-e2e`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "org-node-e2e",
    version,
    about = "Run a bootstrap org-node and a replicator against it, and check that the replicator syncs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the scenario file (TOML).
    #[arg(long, value_name = "PATH", default_value = DEFAULT_SCENARIO_PATH)]
    pub scenario: PathBuf,

    /// Path to the org-node binary under test.
    #[arg(long, value_name = "PATH", default_value = "target/debug/radicle-org-node")]
    pub org_node: PathBuf,

    /// Directory with the `bootstrap/` and `replicator/` seeds.
    #[arg(long, value_name = "DIR", default_value = "e2e-tests/input")]
    pub workdir: PathBuf,

    /// Abort the run after this long, e.g. `90s`, `5m`.
    ///
    /// Without it a node that never reaches its milestones hangs the run.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ORG_NODE_E2E_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Don't color the echoed node logs.
    #[arg(long)]
    pub no_color: bool,

    /// Validate the scenario and print both node commands without running them.
    #[arg(long)]
    pub print_commands: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let secs_per_unit = match unit.as_str() {
        "ms" => return Ok(Duration::from_millis(value)),
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        _ => {
            return Err(format!(
                "unsupported duration unit '{}'; expected ms, s, m, or h",
                unit
            ));
        }
    };

    value
        .checked_mul(secs_per_unit)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("duration '{}' is too large", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse_with_units() {
        assert_eq!(parse_duration("250ms"), Ok(Duration::from_millis(250)));
        assert_eq!(parse_duration(" 90s "), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("s").is_err());
        assert!(parse_duration("3d").is_err());
    }

    #[test]
    fn oversized_durations_are_rejected() {
        let max_hours = u64::MAX / 3600;
        assert_eq!(
            parse_duration(&format!("{max_hours}h")),
            Ok(Duration::from_secs(max_hours * 3600))
        );
        assert!(parse_duration(&format!("{}h", max_hours + 1)).is_err());
        assert!(parse_duration("307445734561825861h").is_err());
        assert!(parse_duration(&format!("{}m", u64::MAX)).is_err());
        assert!(parse_duration("99999999999999999999s").is_err());
    }

    #[test]
    fn defaults_and_flags() {
        let args = CliArgs::parse_from(["org-node-e2e", "--timeout", "30s", "--print-commands"]);
        assert_eq!(args.scenario, PathBuf::from(DEFAULT_SCENARIO_PATH));
        assert_eq!(args.timeout, Some(Duration::from_secs(30)));
        assert!(args.print_commands);
        assert!(!args.no_color);
    }
}
