//! JSON report.

use crate::issue::ValidationIssue;
use crate::summary::ValidationSummary;
use migcheck_redaction::Redactor;
use serde_json::{json, Value};

pub(super) fn render(redactor: &Redactor, summary: &ValidationSummary, issues: &[ValidationIssue]) -> String {
    let issues: Vec<Value> = issues
        .iter()
        .map(|issue| {
            json!({
                "category": issue.category,
                "name": redactor.redact_str(&issue.name),
                "severity": issue.severity,
                "message": redactor.redact_str(&issue.message),
                "remediation": issue.remediation.as_deref().map(|r| redactor.redact_str(r)),
                "details": redactor.redact_details(&issue.details),
            })
        })
        .collect();

    let report = json!({
        "timestamp": summary.generated_at,
        "summary": summary,
        "issues": issues,
        "remediation_scripts": summary.remediation_scripts,
    });

    serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
}
