//! Output formatting for telemetry-cli (table, json, csv)

use anyhow::{anyhow, Result};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use telemetry_client::DynamicValue;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn parse(name: &str) -> Result<Self> {
        Self::from_str(name, true).map_err(|_| anyhow!("Unknown output format '{}'", name))
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    let table = Table::new(data).to_string();
                    println!("{}", table);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                print_csv(data);
            }
        }
    }

    /// Print key-value pairs (for single signals)
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::from(v.as_str())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Print data as CSV
fn print_csv<T: Serialize>(data: &[T]) {
    if let Some(output) = render_csv(data) {
        print!("{}", output);
    }
}

/// Render rows as CSV using the first row's field names as header
fn render_csv<T: Serialize>(data: &[T]) -> Option<String> {
    let first = serde_json::to_value(data.first()?).ok()?;
    let serde_json::Value::Object(map) = &first else {
        return None;
    };

    let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
    let mut out = headers.join(",");
    out.push('\n');

    for item in data {
        if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
            let values: Vec<String> = headers
                .iter()
                .map(|h| {
                    row.get(*h)
                        .map(|v| match v {
                            serde_json::Value::String(s) => escape_csv(s),
                            other => escape_csv(&other.to_string()),
                        })
                        .unwrap_or_default()
                })
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
    }
    Some(out)
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Format a dynamic value for a table cell
pub fn format_value(value: &DynamicValue) -> String {
    match value {
        DynamicValue::Null => "-".to_string(),
        DynamicValue::String(s) => s.clone(),
        DynamicValue::Array(items) => {
            let items: Vec<String> = items.iter().map(format_value).collect();
            items.join(", ")
        }
        other => other.to_string(),
    }
}

/// Format an optional field, `-` when absent
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Vehicle display for vehicles command
#[derive(Debug, Tabled, Serialize)]
pub struct VehicleRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Vehicle")]
    pub name: String,
    #[tabled(rename = "Battery")]
    pub battery: String,
    #[tabled(rename = "Odometer")]
    pub odometer: String,
    #[tabled(rename = "Location")]
    pub location: String,
}

/// One entry of the latest-signals map
#[derive(Debug, Tabled, Serialize)]
pub struct SignalRow {
    #[tabled(rename = "Signal")]
    pub signal: String,
    #[tabled(rename = "Timestamp")]
    pub timestamp: String,
    #[tabled(rename = "Data")]
    pub data: String,
}

/// One field of the dashboard
#[derive(Debug, Tabled, Serialize)]
pub struct DashboardRow {
    #[tabled(rename = "Signal")]
    pub signal: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Updated")]
    pub timestamp: String,
}
