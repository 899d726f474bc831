//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Add command arguments.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Location id
    pub location_id: String,

    /// Number of lots at the location
    #[arg(allow_negative_numbers = true)]
    pub total_parking_lots: i64,
}

/// Update command arguments.
#[derive(Debug, Args)]
pub struct UpdateCommand {
    /// Location id
    pub location_id: String,

    /// Cars that came in since the last estimate
    #[arg(long = "in", value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    pub cars_in: i64,

    /// Cars that went out since the last estimate
    #[arg(long = "out", value_name = "N", default_value_t = 0, allow_negative_numbers = true)]
    pub cars_out: i64,
}

/// Show command arguments.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Location id
    pub location_id: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Available command arguments.
#[derive(Debug, Args)]
pub struct AvailableCommand {
    /// Location id
    pub location_id: String,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Demo command arguments.
#[derive(Debug, Args)]
pub struct DemoCommand {
    /// Location to register
    #[arg(long, default_value = "Marina Square")]
    pub location: String,

    /// Lots at the location
    #[arg(long, default_value_t = 300)]
    pub capacity: i64,

    /// Cars reported in
    #[arg(long, default_value_t = 15)]
    pub cars_in: i64,

    /// Cars reported out
    #[arg(long, default_value_t = 5)]
    pub cars_out: i64,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_command_debug() {
        let cmd = UpdateCommand {
            location_id: "Bugis".to_string(),
            cars_in: 3,
            cars_out: 1,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("cars_in"));
        assert!(debug_str.contains("Bugis"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }
}
