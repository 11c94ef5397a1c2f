//! Aggregate verdict for one validation run.

use crate::issue::{Severity, ValidationIssue};
use crate::raw::RawResults;
use migcheck_checks::Category;
use migcheck_common::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Snapshot derived from stored results. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationSummary {
    pub run_id: Uuid,
    pub generated_at: Timestamp,
    pub total_checks: usize,
    pub passed_checks: usize,
    /// Equals the issue count.
    pub failed_checks: usize,
    /// Checks that failed only at warning level.
    pub warning_checks: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub can_proceed: bool,
    pub success_rate: f64,
    pub estimated_fix_time: String,
    /// Every category is present, zero included.
    pub issues_by_category: BTreeMap<Category, usize>,
    /// Rendered at the top level of reports, not inside the summary.
    #[serde(skip_serializing)]
    pub remediation_scripts: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stale_categories: Vec<Category>,
}

impl ValidationSummary {
    pub fn compute(
        raw: &RawResults,
        issues: &[ValidationIssue],
        remediation_scripts: BTreeMap<String, String>,
        generated_at: Timestamp,
    ) -> Self {
        let total_checks = raw.total();
        let passed_checks = raw.passed();
        let critical_issues = count_severity(issues, Severity::Critical);
        let warning_issues = count_severity(issues, Severity::Warning);

        let success_rate = if total_checks == 0 {
            0.0
        } else {
            passed_checks as f64 / total_checks as f64 * 100.0
        };

        let mut issues_by_category: BTreeMap<Category, usize> =
            Category::ALL.iter().map(|c| (*c, 0)).collect();
        for issue in issues {
            *issues_by_category.entry(issue.category).or_insert(0) += 1;
        }

        Self {
            run_id: Uuid::new_v4(),
            generated_at,
            total_checks,
            passed_checks,
            failed_checks: issues.len(),
            warning_checks: warning_issues,
            critical_issues,
            warning_issues,
            can_proceed: critical_issues == 0,
            success_rate,
            estimated_fix_time: format_fix_time(estimate_fix_minutes(issues)),
            issues_by_category,
            remediation_scripts,
            stale_categories: raw.stale_categories(),
        }
    }
}

fn count_severity(issues: &[ValidationIssue], severity: Severity) -> usize {
    issues.iter().filter(|i| i.severity == severity).count()
}

/// Minutes to fix one critical issue of a category.
pub fn base_minutes(category: Category) -> u32 {
    match category {
        Category::Connectivity => 15,
        Category::Compatibility => 60,
        Category::Dependency => 10,
        Category::Permission => 5,
    }
}

/// Warnings cost half the base, rounded down.
pub fn estimate_fix_minutes(issues: &[ValidationIssue]) -> u32 {
    issues
        .iter()
        .map(|issue| {
            let base = base_minutes(issue.category);
            match issue.severity {
                Severity::Critical => base,
                Severity::Warning => base / 2,
                Severity::Info => 0,
            }
        })
        .sum()
}

pub fn format_fix_time(minutes: u32) -> String {
    if minutes == 0 {
        return "No fixes needed".to_string();
    }
    if minutes < 60 {
        return format!("{} minutes", minutes);
    }

    let (hours, rest) = (minutes / 60, minutes % 60);
    match (hours, rest) {
        (1, 0) => "1 hour".to_string(),
        (h, 0) => format!("{} hours", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
