//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::codec::SpecHasher;
use crate::config::ValidationResult;
use crate::diff::{DiffResult, DiffType, EnvChangeType};
use crate::error::{AppSpecError, Result};
use crate::spec::AppSpec;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Component fingerprint row for table display.
#[derive(Tabled, Serialize)]
struct HashRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Hash")]
    hash: String,
}

/// Component diff row for table display.
#[derive(Tabled)]
struct DiffRow {
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Fields")]
    fields: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Serializes a document: YAML for text output, JSON otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized.
    pub fn format_document<T: Serialize>(&self, value: &T) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(value)
                .map(|mut s| {
                    s.push('\n');
                    s
                })
                .map_err(|e| AppSpecError::serialization(e.to_string())),
            OutputFormat::Text => {
                serde_yaml::to_string(value).map_err(|e| AppSpecError::serialization(e.to_string()))
            }
        }
    }

    /// Formats a validation report.
    #[must_use]
    pub fn format_validation(&self, result: &ValidationResult, show_warnings: bool) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = ValidationJson {
                    valid: result.is_valid(),
                    errors: result
                        .errors
                        .iter()
                        .map(|e| ErrorJson {
                            field: e.field.clone(),
                            message: e.message.clone(),
                        })
                        .collect(),
                    warnings: result.warnings.clone(),
                };
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                if result.is_valid() {
                    let _ = writeln!(output, "{} Configuration is valid!", "✓".green());
                } else {
                    let _ = writeln!(
                        output,
                        "{} {} error(s) found:",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                }

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                } else if !result.warnings.is_empty() {
                    let _ = writeln!(
                        output,
                        "   {} warning(s), use --warnings to show them",
                        result.warning_count()
                    );
                }
                output
            }
        }
    }

    /// Formats the fingerprints of an app and its components.
    #[must_use]
    pub fn format_hashes(&self, app: &AppSpec, hasher: &SpecHasher, only: Option<&str>) -> String {
        let rows: Vec<HashRow> = app
            .components
            .iter()
            .filter(|c| only.is_none_or(|name| c.name() == name))
            .map(|c| HashRow {
                kind: c.kind().to_string(),
                name: c.name().to_string(),
                hash: hasher.hash_component(c),
            })
            .collect();
        let app_hash = hasher.hash_app(app);
        let env_hash = SpecHasher::hash_env_set(&app.envs);

        match self.format {
            OutputFormat::Json => {
                let json = HashesJson {
                    app: app.name.clone(),
                    hash: app_hash,
                    env_hash,
                    components: rows,
                };
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = write!(output, "\nApp: {}\n", app.name.bold());
                let _ = writeln!(output, "   Hash: {app_hash}");
                let _ = write!(output, "   Env hash: {}\n\n", SpecHasher::short_hash(&env_hash));
                if rows.is_empty() {
                    output.push_str("   No matching components.\n");
                } else {
                    output.push_str(&Table::new(rows).to_string());
                    output.push('\n');
                }
                output
            }
        }
    }

    /// Formats a drift report.
    #[must_use]
    pub fn format_diff(&self, diff: &DiffResult) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&DiffJson::from(diff)).unwrap_or_default(),
            OutputFormat::Text => Self::format_diff_text(diff),
        }
    }

    fn format_diff_text(diff: &DiffResult) -> String {
        if !diff.has_changes() {
            return format!("{} No drift detected - spec is converged.\n", "✓".green());
        }

        let mut output = format!("{} Drift detected:\n\n", "⚠".yellow());

        let rows: Vec<DiffRow> = diff
            .actionable_diffs()
            .into_iter()
            .map(|d| DiffRow {
                action: Self::format_diff_type(d.diff_type),
                kind: d.kind.to_string(),
                name: d.name.clone(),
                fields: Self::truncate(
                    &d.details
                        .iter()
                        .map(|detail| detail.field.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    40,
                ),
            })
            .collect();
        if !rows.is_empty() {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        if !diff.env_changes.is_empty() {
            output.push_str("\nApp env vars:\n");
            for change in &diff.env_changes {
                let marker = match change.change {
                    EnvChangeType::Added => "+".green(),
                    EnvChangeType::Removed => "-".red(),
                };
                let _ = writeln!(
                    output,
                    "   {marker} {} ({})",
                    change.key,
                    SpecHasher::short_hash(&change.hash)
                );
            }
        }

        let _ = write!(
            output,
            "\nDiff: {} to create, {} to update, {} to delete, {} env change(s)\n",
            diff.creates.to_string().green(),
            diff.updates.to_string().yellow(),
            diff.deletes.to_string().red(),
            diff.env_changes.len()
        );
        output
    }

    fn format_diff_type(diff_type: DiffType) -> String {
        match diff_type {
            DiffType::Create => "+create".green().to_string(),
            DiffType::Update => "~update".yellow().to_string(),
            DiffType::Delete => "-delete".red().to_string(),
            DiffType::NoChange => "noop".dimmed().to_string(),
        }
    }

    /// Truncates a string to a maximum number of characters.
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        }
    }
}

// JSON serialization helpers

#[derive(Serialize)]
struct ValidationJson {
    valid: bool,
    errors: Vec<ErrorJson>,
    warnings: Vec<String>,
}

#[derive(Serialize)]
struct ErrorJson {
    field: String,
    message: String,
}

#[derive(Serialize)]
struct HashesJson {
    app: String,
    hash: String,
    env_hash: String,
    components: Vec<HashRow>,
}

#[derive(Serialize)]
struct DiffJson {
    creates: usize,
    updates: usize,
    deletes: usize,
    unchanged: usize,
    components: Vec<ComponentDiffJson>,
    env_changes: Vec<EnvChangeJson>,
}

#[derive(Serialize)]
struct ComponentDiffJson {
    kind: String,
    name: String,
    action: String,
    fields: Vec<String>,
    old_hash: Option<String>,
    new_hash: Option<String>,
}

#[derive(Serialize)]
struct EnvChangeJson {
    key: String,
    hash: String,
    change: String,
}

impl From<&DiffResult> for DiffJson {
    fn from(diff: &DiffResult) -> Self {
        Self {
            creates: diff.creates,
            updates: diff.updates,
            deletes: diff.deletes,
            unchanged: diff.unchanged,
            components: diff
                .diffs
                .iter()
                .map(|d| ComponentDiffJson {
                    kind: d.kind.to_string(),
                    name: d.name.clone(),
                    action: d.diff_type.to_string(),
                    fields: d.details.iter().map(|detail| detail.field.clone()).collect(),
                    old_hash: d.old_hash.clone(),
                    new_hash: d.new_hash.clone(),
                })
                .collect(),
            env_changes: diff
                .env_changes
                .iter()
                .map(|c| EnvChangeJson {
                    key: c.key.clone(),
                    hash: c.hash.clone(),
                    change: c.change.to_string(),
                })
                .collect(),
        }
    }
}
