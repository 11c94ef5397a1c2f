//! Unified issue representation.

use migcheck_checks::{
    Category, CheckStatus, CompatibilityResult, ConnectivityResult, DependencyResult,
    PermissionResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// How much an issue matters. `Info` is reserved; no rule emits it today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Upper-case tag used in text reports.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::Warning => "WARNING",
            Severity::Info => "INFO",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Warning => "🟡",
            Severity::Info => "🔵",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw checker result of any category.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCheck {
    Connectivity(ConnectivityResult),
    Compatibility(CompatibilityResult),
    Dependency(DependencyResult),
    Permission(PermissionResult),
}

macro_rules! with_result {
    ($raw:expr, $r:ident => $body:expr) => {
        match $raw {
            RawCheck::Connectivity($r) => $body,
            RawCheck::Compatibility($r) => $body,
            RawCheck::Dependency($r) => $body,
            RawCheck::Permission($r) => $body,
        }
    };
}

impl RawCheck {
    pub fn category(&self) -> Category {
        match self {
            RawCheck::Connectivity(_) => Category::Connectivity,
            RawCheck::Compatibility(_) => Category::Compatibility,
            RawCheck::Dependency(_) => Category::Dependency,
            RawCheck::Permission(_) => Category::Permission,
        }
    }

    pub fn name(&self) -> &str {
        with_result!(self, r => r.name.as_str())
    }

    pub fn message(&self) -> &str {
        with_result!(self, r => r.message.as_str())
    }

    pub fn status_str(&self) -> &'static str {
        with_result!(self, r => r.status.as_str())
    }

    pub fn required(&self) -> bool {
        with_result!(self, r => r.required)
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        with_result!(self, r => &r.details)
    }
}

/// A non-passing check, normalised across categories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub category: Category,
    pub name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
    pub remediation: Option<String>,
    /// Result this issue was derived from.
    #[serde(skip)]
    pub origin: RawCheck,
}

impl ValidationIssue {
    pub fn is_critical(&self) -> bool {
        self.severity == Severity::Critical
    }

    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(|v| v.as_str())
    }
}
