//! Command output helpers.

use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

/// Print a success message in the selected format.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{message}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({"status": "success", "message": message})
        ),
    }
}

/// Print an error message in the selected format.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {message}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({"status": "error", "message": message})
        ),
    }
}

/// Pretty-print a serializable value as JSON.
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: failed to serialize output: {e}"),
    }
}
