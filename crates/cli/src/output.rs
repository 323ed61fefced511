//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(T::headers());
            table.add_row(item.row());
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(item).unwrap_or_default());
        }
        OutputFormat::Plain => {
            let row = item.row();
            for (header, value) in T::headers().iter().zip(row.iter()) {
                println!("{}: {}", header, value);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Yaml => println!("[]"),
            _ => println!("{}", "No items found.".dimmed()),
        }
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(items).unwrap_or_default());
        }
        OutputFormat::Plain => {
            for item in items {
                println!("{}", plain_line(&item.row()));
            }
        }
    }
}

/// Print a structured value for machine formats; returns false for human formats
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> bool {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            true
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value).unwrap_or_default());
            true
        }
        OutputFormat::Table | OutputFormat::Plain => false,
    }
}

/// One tab-separated line per row, for piping into `cut` and friends
fn plain_line(row: &[String]) -> String {
    row.iter()
        .map(|cell| cell.replace(['\t', '\n'], " "))
        .collect::<Vec<_>>()
        .join("\t")
}

/// Print success message
pub fn print_success(message: &str) {
    println!("✅ {}", message.green());
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("⚠️  {}", message.yellow());
}

/// Print info message
pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}
