//! Command-line interface for parktally.
//!
//! This module provides the CLI structure for the `parktally` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AddCommand, AvailableCommand, ConfigCommand, DemoCommand, ListCommand, ShowCommand,
    StatusCommand, UpdateCommand,
};

/// parktally - Estimate parking occupancy from car-in/car-out reports
///
/// Keeps a registry of parking locations, clamps each estimate to the
/// location's capacity, and snapshots the whole registry to disk after
/// every change.
#[derive(Debug, Parser)]
#[command(name = "parktally")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the snapshot file (overrides configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a new location
    Add(AddCommand),

    /// Report cars in and out at a location
    Update(UpdateCommand),

    /// Show a location's estimate
    Show(ShowCommand),

    /// Show available lots at a location
    Available(AvailableCommand),

    /// List every location
    List(ListCommand),

    /// Show totals across all locations
    Status(StatusCommand),

    /// Register one location and apply one update
    Demo(DemoCommand),

    /// Run a resident console reading commands from stdin
    Console,

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Command {
    /// Short name for log messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::Update(_) => "update",
            Self::Show(_) => "show",
            Self::Available(_) => "available",
            Self::List(_) => "list",
            Self::Status(_) => "status",
            Self::Demo(_) => "demo",
            Self::Console => "console",
            Self::Config(_) => "config",
        }
    }
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "parktally");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(
            parse(&["parktally", "-q", "list"]).verbosity(),
            crate::logging::Verbosity::Quiet
        );
        assert_eq!(
            parse(&["parktally", "list"]).verbosity(),
            crate::logging::Verbosity::Normal
        );
        assert_eq!(
            parse(&["parktally", "-v", "list"]).verbosity(),
            crate::logging::Verbosity::Verbose
        );
        assert_eq!(
            parse(&["parktally", "-vv", "list"]).verbosity(),
            crate::logging::Verbosity::Trace
        );
    }

    #[test]
    fn test_parse_add() {
        let cli = parse(&["parktally", "add", "Marina Square", "300"]);
        match cli.command {
            Command::Add(cmd) => {
                assert_eq!(cmd.location_id, "Marina Square");
                assert_eq!(cmd.total_parking_lots, 300);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_add_negative_capacity() {
        let cli = parse(&["parktally", "add", "Odd", "-5"]);
        assert!(matches!(
            cli.command,
            Command::Add(AddCommand {
                total_parking_lots: -5,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_update_defaults_to_zero() {
        let cli = parse(&["parktally", "update", "Bugis"]);
        match cli.command {
            Command::Update(cmd) => {
                assert_eq!(cmd.cars_in, 0);
                assert_eq!(cmd.cars_out, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_update_counts() {
        let cli = parse(&["parktally", "update", "Bugis", "--in", "15", "--out", "5"]);
        match cli.command {
            Command::Update(cmd) => {
                assert_eq!(cmd.cars_in, 15);
                assert_eq!(cmd.cars_out, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_demo_defaults() {
        let cli = parse(&["parktally", "demo"]);
        match cli.command {
            Command::Demo(cmd) => {
                assert_eq!(cmd.location, "Marina Square");
                assert_eq!(cmd.capacity, 300);
                assert_eq!(cmd.cars_in, 15);
                assert_eq!(cmd.cars_out, 5);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_console() {
        let cli = parse(&["parktally", "console"]);
        assert!(matches!(cli.command, Command::Console));
        assert_eq!(cli.command.name(), "console");
    }

    #[test]
    fn test_parse_with_config_and_data() {
        let cli = parse(&[
            "parktally",
            "-c",
            "/custom/config.toml",
            "status",
            "--data",
            "/tmp/lots.json",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
        assert_eq!(cli.data, Some(PathBuf::from("/tmp/lots.json")));
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = parse(&["parktally", "config", "validate", "--file", "/tmp/c.toml"]);
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_rejects_missing_capacity() {
        assert!(Cli::try_parse_from(["parktally", "add", "Bugis"]).is_err());
    }
}
