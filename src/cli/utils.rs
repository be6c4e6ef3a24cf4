//! Shared utilities for CLI commands

use clap::ValueEnum;
use tabled::{Table, settings::Style};

use crate::cli::error::{CliError, CliResult};
use crate::db::{Properties, is_reserved_key};

/// Output format of commands that print objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

/// Truncate a string with ellipsis if it exceeds max length
pub fn truncate_with_ellipsis(s: &str, max: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Parse `KEY=VALUE` arguments into properties. Later keys win.
pub fn parse_properties(inputs: &[String]) -> CliResult<Properties> {
    let mut properties = Properties::new();
    for input in inputs {
        let Some((key, value)) = input.split_once('=') else {
            return Err(CliError::InvalidProperty {
                input: input.clone(),
            });
        };
        let key = key.trim();
        if key.is_empty() || is_reserved_key(key) || key.starts_with('_') {
            return Err(CliError::InvalidProperty {
                input: input.clone(),
            });
        }
        properties.insert(key.to_string(), value.to_string());
    }
    Ok(properties)
}

/// Format properties as `k=v, k=v` for table cells
pub fn format_properties(properties: &Properties, max: usize) -> String {
    if properties.is_empty() {
        return "-".to_string();
    }
    let joined = properties
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join(", ");
    truncate_with_ellipsis(&joined, max)
}

/// Apply consistent table styling
pub fn apply_table_style(table: &mut Table) {
    table.with(Style::rounded());
}
