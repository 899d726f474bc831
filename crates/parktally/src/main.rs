//! `parktally` - CLI for the parking occupancy registry
//!
//! One-shot commands open the registry, run inside the supervision
//! boundary, and exit. `console` stays resident until quit, end of input,
//! or SIGINT/SIGTERM.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info, warn};

use parktally::cli::{
    AddCommand, AvailableCommand, Cli, Command, ConfigCommand, DemoCommand, ListCommand,
    ShowCommand, StatusCommand, UpdateCommand,
};
use parktally::console::run_console;
use parktally::supervisor::{install_panic_hook, shutdown_signal, supervise};
use parktally::{init_logging, report, Config, LocationRegistry};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());
    install_panic_hook();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if let Some(data) = cli.data {
        config.storage.data_path = Some(data);
    }

    let operation = cli.command.name();
    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd),
        Command::Console => handle_console(&config).await,
        Command::Add(cmd) => with_registry(&config, operation, |r| handle_add(r, &cmd)),
        Command::Update(cmd) => with_registry(&config, operation, |r| handle_update(r, &cmd)),
        Command::Show(cmd) => with_registry(&config, operation, |r| handle_show(r, &cmd)),
        Command::Available(cmd) => {
            with_registry(&config, operation, |r| handle_available(r, &cmd))
        }
        Command::List(cmd) => with_registry(&config, operation, |r| handle_list(r, &cmd)),
        Command::Status(cmd) => with_registry(&config, operation, |r| handle_status(r, &cmd)),
        Command::Demo(cmd) => with_registry(&config, operation, |r| handle_demo(r, &cmd)),
    }
}

/// Open the registry and run `f` inside the supervision boundary.
fn with_registry<F>(config: &Config, operation: &str, f: F) -> anyhow::Result<ExitCode>
where
    F: FnOnce(&mut LocationRegistry) -> anyhow::Result<ExitCode>,
{
    let mut registry = LocationRegistry::open(config.snapshot_store());
    supervise(&mut registry, operation, f).unwrap_or(Ok(ExitCode::FAILURE))
}

fn handle_add(registry: &mut LocationRegistry, cmd: &AddCommand) -> anyhow::Result<ExitCode> {
    let record = registry.add_location(cmd.location_id.clone(), cmd.total_parking_lots)?;
    println!("{}", report::added_line(record));
    Ok(ExitCode::SUCCESS)
}

fn handle_update(registry: &mut LocationRegistry, cmd: &UpdateCommand) -> anyhow::Result<ExitCode> {
    let record = registry.update_location(&cmd.location_id, cmd.cars_in, cmd.cars_out)?;
    println!("{}", report::updated_line(record));
    Ok(ExitCode::SUCCESS)
}

fn handle_show(registry: &mut LocationRegistry, cmd: &ShowCommand) -> anyhow::Result<ExitCode> {
    let Some(record) = registry.get_location(&cmd.location_id) else {
        eprintln!("Location \"{}\" not found", cmd.location_id);
        return Ok(ExitCode::FAILURE);
    };

    if cmd.json {
        println!("{}", report::record_json(record)?);
    } else {
        println!("{}", report::record_text(record));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_available(
    registry: &mut LocationRegistry,
    cmd: &AvailableCommand,
) -> anyhow::Result<ExitCode> {
    match registry.get_available_lots(&cmd.location_id) {
        Some(available) => {
            println!("{}", report::available_line(&cmd.location_id, available));
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("Location \"{}\" not found", cmd.location_id);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn handle_list(registry: &mut LocationRegistry, cmd: &ListCommand) -> anyhow::Result<ExitCode> {
    if cmd.json {
        println!("{}", report::records_json(registry)?);
    } else {
        println!("{}", report::record_table(registry));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_status(registry: &mut LocationRegistry, cmd: &StatusCommand) -> anyhow::Result<ExitCode> {
    let stats = registry.stats();
    let storage_location = registry.storage_location();
    if cmd.json {
        println!("{}", report::stats_json(&stats, &storage_location)?);
    } else {
        println!("parktally status");
        println!("----------------");
        println!("{}", report::stats_text(&stats, &storage_location));
    }
    Ok(ExitCode::SUCCESS)
}

fn handle_demo(registry: &mut LocationRegistry, cmd: &DemoCommand) -> anyhow::Result<ExitCode> {
    match registry.add_location(cmd.location.clone(), cmd.capacity) {
        Ok(_) => {}
        Err(e) if e.is_duplicate_location() => {
            warn!("{}, reusing the existing record", e);
        }
        Err(e) => return Err(e.into()),
    }
    registry.update_location(&cmd.location, cmd.cars_in, cmd.cars_out)?;

    if let Some(record) = registry.get_location(&cmd.location) {
        println!("{}", report::record_json(record)?);
    }
    if let Some(available) = registry.get_available_lots(&cmd.location) {
        println!("{}", report::available_line(&cmd.location, available));
    }
    Ok(ExitCode::SUCCESS)
}

async fn handle_console(config: &Config) -> anyhow::Result<ExitCode> {
    let mut registry = LocationRegistry::open(config.snapshot_store());
    info!(
        "Console ready with {} locations from {}",
        registry.len(),
        registry.storage_location()
    );

    let prompt = if std::io::stdin().is_terminal() {
        config.prompt()
    } else {
        None
    };

    let result = run_console(
        &mut registry,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        prompt,
        shutdown_signal(),
    )
    .await;

    match result {
        Ok(end) => {
            info!("Console closed: {}", end);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Console stopped on I/O failure: {}", e);
            registry.save_data();
            Err(e).context("console I/O failed")
        }
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<ExitCode> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Data path:       {}", config.data_path().display());
                println!("  Atomic writes:   {}", config.storage.atomic_writes);
                println!();
                println!("[Console]");
                println!("  Prompt:          {:?}", config.console.prompt);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => {
                    println!("Configuration error: {e}");
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
