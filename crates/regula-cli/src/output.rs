//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use regula_domain::{AttemptLog, Endpoint, ExtractedAttributes, ResolutionResult, VehicleQuery};
use regula_resolver::{Decision, ResolveError};
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a resolution result.
    pub fn format_result(&self, result: &ResolutionResult) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(result)?);
        }

        let source = if result.from_cache {
            self.colorize("cache", "green")
        } else {
            self.colorize("registry", "cyan")
        };
        let attempt = result
            .attempt_log_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        let attrs = result
            .source_log
            .as_ref()
            .map(|log| log.extracted.clone())
            .unwrap_or_else(|| ExtractedAttributes::from_payload(&result.payload));

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["Source".to_string(), source]);
        builder.push_record(["Attempt".to_string(), attempt]);
        builder.push_record(["Updated".to_string(), result.last_updated_at.format(TIME_FORMAT).to_string()]);
        for (label, value) in attribute_rows(&attrs) {
            builder.push_record([label.to_string(), value]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        Ok(format!("{}\n{}", table, serde_json::to_string_pretty(&result.payload)?))
    }

    /// Format attempt history, newest first.
    pub fn format_history(&self, logs: &[AttemptLog]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return Ok(serde_json::to_string_pretty(logs)?);
        }
        if logs.is_empty() {
            return Ok(self.colorize("No attempts recorded.", "yellow"));
        }

        let mut builder = Builder::default();
        builder.push_record(["ID", "When", "Endpoint", "Status", "Detail"]);

        for log in logs {
            let id = log.id.to_string();
            let (status, detail) = match log.error_class() {
                None => (self.colorize("ok", "green"), summary(&log.extracted)),
                Some(class) => (
                    self.colorize(class.as_str(), "red"),
                    log.error_message().unwrap_or_default().to_string(),
                ),
            };
            builder.push_record([
                id[..8].to_string(), // Truncate ID for readability
                log.created_at.format(TIME_FORMAT).to_string(),
                log.endpoint.to_string(),
                status,
                detail,
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        Ok(table.to_string())
    }

    /// Format an inferred query.
    pub fn format_query(&self, query: &VehicleQuery) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(query)?),
            OutputFormat::Table => Ok(self.info(&format!("{}: {}", query.kind(), query.value()))),
        }
    }

    /// Format a dry-run decision.
    pub fn format_decision(&self, decision: &Decision) -> Result<String> {
        match (self.format, decision) {
            (OutputFormat::Json, Decision::CacheHit(log)) => Ok(serde_json::to_string_pretty(&serde_json::json!({
                "decision": "cache_hit",
                "attempt": log,
            }))?),
            (OutputFormat::Json, Decision::MustFetch) => {
                Ok(serde_json::to_string_pretty(&serde_json::json!({ "decision": "must_fetch" }))?)
            }
            (OutputFormat::Table, Decision::CacheHit(log)) => Ok(self.success(&format!(
                "Would serve attempt {} from {} (recorded {})",
                log.id,
                log.endpoint,
                log.created_at.format(TIME_FORMAT)
            ))),
            (OutputFormat::Table, Decision::MustFetch) => Ok(self.info("Would call the registry")),
        }
    }

    /// Format a resolution failure, with a hint where one helps.
    pub fn format_resolve_error(&self, error: &ResolveError) -> String {
        let mut out = self.error(&error.to_string());
        match error {
            ResolveError::WrongEndpoint {
                suggested,
                conflicting_history,
                ..
            } => {
                if *conflicting_history {
                    out.push('\n');
                    out.push_str(&self.warning("Both registries have reported this vehicle as belonging to the other one"));
                }
                out.push('\n');
                out.push_str(&self.info(&format!("Retry with --endpoint {}", endpoint_flag(*suggested))));
            }
            ResolveError::RepeatedFailure { .. } => {
                out.push('\n');
                out.push_str(&self.info("No registry call was made"));
            }
            _ => {}
        }
        out
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

/// Value accepted by `--endpoint`
fn endpoint_flag(endpoint: Endpoint) -> &'static str {
    match endpoint {
        Endpoint::Regional => "regional",
        Endpoint::National => "national",
    }
}

fn attribute_rows(attrs: &ExtractedAttributes) -> Vec<(&'static str, String)> {
    [
        ("Make", &attrs.make),
        ("Model", &attrs.model),
        ("Model year", &attrs.model_year),
        ("Plate", &attrs.plate),
        ("Chassis", &attrs.chassis),
        ("Renavam", &attrs.renavam),
    ]
    .into_iter()
    .filter_map(|(label, value)| value.clone().map(|v| (label, v)))
    .collect()
}

fn summary(attrs: &ExtractedAttributes) -> String {
    let parts: Vec<&str> = [&attrs.make, &attrs.model, &attrs.model_year]
        .into_iter()
        .filter_map(|v| v.as_deref())
        .collect();
    parts.join(" ")
}
