//! Common output utilities for lens modules

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Unified output format for all lens commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty table with borders (default)
    #[default]
    Table,
    /// Markdown table format
    Markdown,
    /// Compact JSON array
    Json,
    /// Pretty-printed JSON with indentation
    JsonPretty,
    /// JSON Lines format (one JSON object per line)
    JsonLine,
    /// Pipe-separated values with header
    Psv,
}

impl OutputFormat {
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json | Self::JsonPretty | Self::JsonLine)
    }

    pub fn all_names() -> &'static [&'static str] {
        &[
            "table",
            "markdown",
            "json",
            "json-pretty",
            "json-line",
            "psv",
        ]
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Table => "table",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::JsonPretty => "json-pretty",
            Self::JsonLine => "json-line",
            Self::Psv => "psv",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "pretty" => Ok(Self::Table),
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            "json-pretty" | "jsonpretty" => Ok(Self::JsonPretty),
            "json-line" | "jsonline" | "jsonl" | "ndjson" => Ok(Self::JsonLine),
            "psv" | "pipe" => Ok(Self::Psv),
            _ => Err(format!(
                "Unknown output format '{}'. Valid formats: {}",
                s,
                Self::all_names().join(", ")
            )),
        }
    }
}

/// Render rows in the requested format
///
/// `psv_header` and `psv_row` describe the pipe-separated layout, which has
/// no generic serde mapping.
pub fn render<T, F>(
    rows: &[T],
    format: OutputFormat,
    psv_header: &str,
    psv_row: F,
) -> Result<String>
where
    T: Serialize + Tabled,
    F: Fn(&T) -> String,
{
    let out = match format {
        OutputFormat::Table => Table::new(rows).with(Style::rounded()).to_string(),
        OutputFormat::Markdown => Table::new(rows).with(Style::markdown()).to_string(),
        OutputFormat::Json => serde_json::to_string(rows)
            .map_err(|e| anyhow!("Failed to serialize to JSON: {}", e))?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(rows)
            .map_err(|e| anyhow!("Failed to serialize to JSON: {}", e))?,
        OutputFormat::JsonLine => rows
            .iter()
            .map(|r| serde_json::to_string(r))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow!("Failed to serialize to JSON: {}", e))?
            .join("\n"),
        OutputFormat::Psv => std::iter::once(psv_header.to_string())
            .chain(rows.iter().map(psv_row))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    Ok(out)
}
