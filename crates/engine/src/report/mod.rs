//! Report rendering.
//!
//! Rendering is pure: the same summary and issues always produce the same
//! bytes. Everything user supplied passes through the [`Redactor`] first.

mod console;
mod json;
mod markdown;
mod text;

pub use console::{render_summary_table, render_tree, Console};

use crate::issue::ValidationIssue;
use crate::summary::ValidationSummary;
use migcheck_common::Error;
use migcheck_redaction::Redactor;
use std::fmt;
use std::str::FromStr;

/// Output format for saved reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
    Text,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "markdown",
            ReportFormat::Json => "json",
            ReportFormat::Text => "text",
        }
    }

    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
            ReportFormat::Text => "txt",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            _ => Err(Error::unknown("report format", s)),
        }
    }
}

/// Renders summaries and issues in every format.
#[derive(Debug, Clone, Default)]
pub struct Reporter {
    redactor: Redactor,
}

impl Reporter {
    pub fn new(redactor: Redactor) -> Self {
        Self { redactor }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn render(
        &self,
        format: ReportFormat,
        summary: &ValidationSummary,
        issues: &[ValidationIssue],
    ) -> String {
        match format {
            ReportFormat::Markdown => markdown::render(&self.redactor, summary, issues),
            ReportFormat::Json => json::render(&self.redactor, summary, issues),
            ReportFormat::Text => text::render(&self.redactor, summary, issues),
        }
    }
}

/// Sentence naming stale categories, if any.
fn stale_note(summary: &ValidationSummary) -> Option<String> {
    if summary.stale_categories.is_empty() {
        return None;
    }
    let names: Vec<&str> = summary.stale_categories.iter().map(|c| c.as_str()).collect();
    Some(format!(
        "Results for {} come from an earlier run and may be stale.",
        names.join(", ")
    ))
}
