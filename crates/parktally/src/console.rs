//! Resident line-oriented console.
//!
//! Reads one command per line, runs each inside the supervision boundary,
//! and stays up until `quit`, end of input, or a shutdown signal. Every
//! ending saves the registry once more.

use std::future::Future;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::warn;

use crate::error::{Error, Result};
use crate::registry::LocationRegistry;
use crate::report;
use crate::supervisor::{finish, supervise, SessionEnd, ShutdownSignal};

/// A single console line.
#[derive(Debug, Parser)]
#[command(name = "console", no_binary_name = true, disable_version_flag = true)]
struct ConsoleLine {
    #[command(subcommand)]
    command: ConsoleCommand,
}

/// Commands accepted by the console.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConsoleCommand {
    /// Register a location
    Add {
        /// Location id (quote it if it contains spaces)
        location_id: String,
        /// Number of lots
        #[arg(allow_negative_numbers = true)]
        total_parking_lots: i64,
    },

    /// Report cars in and out
    Update {
        /// Location id
        location_id: String,
        /// Cars that came in
        #[arg(default_value_t = 0, allow_negative_numbers = true)]
        cars_in: i64,
        /// Cars that went out
        #[arg(default_value_t = 0, allow_negative_numbers = true)]
        cars_out: i64,
    },

    /// Show a location
    #[command(alias = "show")]
    Get {
        /// Location id
        location_id: String,
    },

    /// Show available lots at a location
    Available {
        /// Location id
        location_id: String,
    },

    /// List every location
    List,

    /// Show totals
    Status,

    /// Save a snapshot now
    Save,

    /// Save and leave the console
    #[command(alias = "exit")]
    Quit,
}

impl ConsoleCommand {
    /// Short name for log messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Update { .. } => "update",
            Self::Get { .. } => "get",
            Self::Available { .. } => "available",
            Self::List => "list",
            Self::Status => "status",
            Self::Save => "save",
            Self::Quit => "quit",
        }
    }
}

/// What the console should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Print this text and keep going.
    Text(String),
    /// End the session.
    Quit,
}

/// Split a line into tokens.
///
/// Tokens are separated by whitespace; double quotes group a token and are
/// removed.
///
/// # Errors
///
/// Returns a message if a quote is left open.
pub fn split_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse a line into a command.
///
/// Returns `Ok(None)` for a blank line. Errors (and `help`) come back as
/// the text to show the operator.
///
/// # Errors
///
/// Returns the message to display if the line is not a valid command.
pub fn parse_line(line: &str) -> std::result::Result<Option<ConsoleCommand>, String> {
    let tokens = split_line(line)?;
    if tokens.is_empty() {
        return Ok(None);
    }

    ConsoleLine::try_parse_from(tokens)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| e.render().to_string().trim_end().to_string())
}

/// Run one command against the registry.
///
/// # Errors
///
/// Returns registry errors, and storage errors from an explicit `save`.
pub fn execute(registry: &mut LocationRegistry, command: ConsoleCommand) -> Result<Reply> {
    let text = match command {
        ConsoleCommand::Add {
            location_id,
            total_parking_lots,
        } => {
            report::added_line(registry.add_location(location_id, total_parking_lots)?)
        }
        ConsoleCommand::Update {
            location_id,
            cars_in,
            cars_out,
        } => {
            report::updated_line(registry.update_location(&location_id, cars_in, cars_out)?)
        }
        ConsoleCommand::Get { location_id } => {
            let record = registry
                .get_location(&location_id)
                .ok_or_else(|| Error::location_not_found(&location_id))?;
            report::record_json(record)?
        }
        ConsoleCommand::Available { location_id } => {
            let available = registry
                .get_available_lots(&location_id)
                .ok_or_else(|| Error::location_not_found(&location_id))?;
            report::available_line(&location_id, available)
        }
        ConsoleCommand::List => report::record_table(registry),
        ConsoleCommand::Status => {
            report::stats_text(&registry.stats(), &registry.storage_location())
        }
        ConsoleCommand::Save => {
            registry.try_save_data()?;
            format!("Saved to {}", registry.storage_location())
        }
        ConsoleCommand::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Text(text))
}

/// Handle one raw input line. `None` means there is nothing to print.
pub fn handle_line(registry: &mut LocationRegistry, line: &str) -> Option<Reply> {
    let command = match parse_line(line) {
        Ok(Some(command)) => command,
        Ok(None) => return None,
        Err(message) => return Some(Reply::Text(message)),
    };

    let operation = command.name();
    match supervise(registry, operation, |r| execute(r, command)) {
        Some(Ok(reply)) => Some(reply),
        Some(Err(e)) => Some(Reply::Text(format!("error: {e}"))),
        None => Some(Reply::Text(format!(
            "error: {operation} failed unexpectedly; data saved"
        ))),
    }
}

/// Strip the line terminator and decode. `None` if the bytes are not UTF-8.
fn decode_line(bytes: &[u8]) -> Option<&str> {
    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    std::str::from_utf8(bytes).ok()
}

/// Run a console session until it ends, then save.
///
/// `shutdown` resolves when the process is asked to stop. A line that is
/// not valid UTF-8 is answered with an error and the session carries on.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails. The registry
/// is not saved on that path; the caller's supervision handles it.
pub async fn run_console<R, W, S>(
    registry: &mut LocationRegistry,
    mut input: R,
    mut output: W,
    prompt: Option<&str>,
    shutdown: S,
) -> Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future<Output = ShutdownSignal>,
{
    tokio::pin!(shutdown);
    let mut buffer = Vec::new();

    let end = loop {
        if let Some(prompt) = prompt {
            output.write_all(prompt.as_bytes()).await?;
            output.flush().await?;
        }

        buffer.clear();
        let read = tokio::select! {
            signal = &mut shutdown => break SessionEnd::Signal(signal),
            read = input.read_until(b'\n', &mut buffer) => read?,
        };
        if read == 0 {
            break SessionEnd::EndOfInput;
        }

        let reply = if let Some(line) = decode_line(&buffer) {
            handle_line(registry, line)
        } else {
            warn!("Ignoring {} bytes of console input that are not UTF-8", read);
            Some(Reply::Text("error: input is not valid UTF-8".to_string()))
        };

        match reply {
            Some(Reply::Quit) => break SessionEnd::Quit,
            Some(Reply::Text(text)) => {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
                output.flush().await?;
            }
            None => {}
        }
    };

    finish(registry, end);
    Ok(end)
}
