//! Output helpers shared by the commands.
//!
//! Text mode prints colored status lines; JSON mode prints one document per
//! command on stdout and keeps status lines out of it.

use colored::Colorize;
use serde::Serialize;

use crate::OutputFormat;

/// Print a command result. Only JSON output goes through here; text output is
/// formatted by each command.
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("{}: failed to serialize result: {}", "Error".red().bold(), e),
        }
    }
}

/// Print a progress message (text mode only, on stderr).
pub fn info(message: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Text = format {
        eprintln!("{} {}", "→".blue(), message);
    }
}

/// Print a success message (text mode only).
pub fn success(message: &str, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Text = format {
        println!("{} {}", "✓".green().bold(), message);
    }
}
