//! Output rendering: tables for humans, JSON for scripts.

use clap::ValueEnum;
use serde::Serialize;
use tabled::Tabled;
use tabled::settings::Style;

use crate::error::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Print rows as a table or a JSON array, per the chosen format.
pub fn print_rows<T: Tabled + Serialize>(
    format: OutputFormat,
    rows: &[T],
) -> Result<(), CliError> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("(none)");
            } else {
                let mut table = tabled::Table::new(rows);
                table.with(Style::sharp());
                println!("{table}");
            }
        }
        OutputFormat::Json => print_json(&rows)?,
    }
    Ok(())
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Core(format!("serialization failed: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Render a normalized task/global value for the terminal: bare strings
/// print unquoted, everything else prints as JSON.
pub fn print_value(value: &serde_json::Value) -> Result<(), CliError> {
    match value {
        serde_json::Value::String(s) => {
            println!("{s}");
            Ok(())
        }
        other => print_json(other),
    }
}

/// Yes/no cell for boolean table columns.
pub fn yes_no(b: &bool) -> String {
    if *b { "yes".into() } else { "no".into() }
}
