//! Plain text report.

use super::stale_note;
use crate::issue::ValidationIssue;
use crate::summary::ValidationSummary;
use migcheck_redaction::Redactor;

const WIDTH: usize = 60;

fn banner(out: &mut String, title: &str) {
    out.push_str(&format!("{:=<width$}\n{}\n{:=<width$}\n", "", title, "", width = WIDTH));
}

fn section(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n{:-<width$}\n", title, "", width = WIDTH));
}

pub(super) fn render(redactor: &Redactor, summary: &ValidationSummary, issues: &[ValidationIssue]) -> String {
    let mut out = String::new();

    banner(&mut out, "MIGRATION VALIDATION REPORT");
    out.push_str(&format!("Generated: {}\n", summary.generated_at.to_display()));

    section(&mut out, "SUMMARY");
    let status = if summary.can_proceed {
        "CAN PROCEED"
    } else {
        "BLOCKED"
    };
    out.push_str(&format!("{:<20}{}\n", "Status:", status));
    out.push_str(&format!("{:<20}{}\n", "Total checks:", summary.total_checks));
    out.push_str(&format!("{:<20}{}\n", "Passed:", summary.passed_checks));
    out.push_str(&format!("{:<20}{:.1}%\n", "Success rate:", summary.success_rate));
    out.push_str(&format!("{:<20}{}\n", "Critical issues:", summary.critical_issues));
    out.push_str(&format!("{:<20}{}\n", "Warnings:", summary.warning_issues));
    out.push_str(&format!("{:<20}{}\n", "Estimated fix time:", summary.estimated_fix_time));
    if let Some(note) = stale_note(summary) {
        out.push_str(&format!("Note: {}\n", note));
    }

    section(&mut out, "ISSUES FOUND");
    if issues.is_empty() {
        out.push_str("No issues found.\n");
        return out;
    }
    for (index, issue) in issues.iter().enumerate() {
        out.push_str(&format!(
            "{}. [{}] {}\n",
            index + 1,
            issue.severity.tag(),
            redactor.redact_str(&issue.name)
        ));
        out.push_str(&format!("   Category: {}\n", issue.category));
        out.push_str(&format!("   Message: {}\n", redactor.redact_str(&issue.message)));
        if let Some(remediation) = &issue.remediation {
            out.push_str(&format!("   Remediation: {}\n", redactor.redact_str(remediation)));
        }
    }
    out
}
