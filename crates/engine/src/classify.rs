//! Severity classification.
//!
//! | category      | critical                         | warning                                   |
//! |---------------|----------------------------------|-------------------------------------------|
//! | connectivity  | failed                           | warning                                   |
//! | compatibility | incompatible                     | warning, requires_conversion              |
//! | dependency    | missing / wrong_version, required | missing / wrong_version optional, optional |
//! | permission    | denied, required                 | denied optional, partial, unknown         |
//!
//! Everything else passes.

use crate::issue::{RawCheck, Severity, ValidationIssue};
use migcheck_checks::{
    CheckResult, CheckStatus, CompatibilityStatus, ConnectivityStatus, DependencyStatus,
    PermissionStatus,
};

/// Per-category severity rule.
pub trait Classify: CheckStatus {
    /// `None` means the check passed.
    fn severity(&self, required: bool) -> Option<Severity>;

    /// Wrap a result of this category for the back-reference.
    fn wrap(result: CheckResult<Self>) -> RawCheck;
}

fn by_required(required: bool) -> Severity {
    if required {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

impl Classify for ConnectivityStatus {
    fn severity(&self, _required: bool) -> Option<Severity> {
        match self {
            ConnectivityStatus::Failed => Some(Severity::Critical),
            ConnectivityStatus::Warning => Some(Severity::Warning),
            ConnectivityStatus::Success | ConnectivityStatus::Skipped => None,
        }
    }

    fn wrap(result: CheckResult<Self>) -> RawCheck {
        RawCheck::Connectivity(result)
    }
}

impl Classify for CompatibilityStatus {
    fn severity(&self, _required: bool) -> Option<Severity> {
        match self {
            CompatibilityStatus::Incompatible => Some(Severity::Critical),
            CompatibilityStatus::Warning | CompatibilityStatus::RequiresConversion => {
                Some(Severity::Warning)
            }
            CompatibilityStatus::Compatible => None,
        }
    }

    fn wrap(result: CheckResult<Self>) -> RawCheck {
        RawCheck::Compatibility(result)
    }
}

impl Classify for DependencyStatus {
    fn severity(&self, required: bool) -> Option<Severity> {
        match self {
            DependencyStatus::Missing | DependencyStatus::WrongVersion => Some(by_required(required)),
            DependencyStatus::Optional => Some(Severity::Warning),
            DependencyStatus::Available => None,
        }
    }

    fn wrap(result: CheckResult<Self>) -> RawCheck {
        RawCheck::Dependency(result)
    }
}

impl Classify for PermissionStatus {
    fn severity(&self, required: bool) -> Option<Severity> {
        match self {
            PermissionStatus::Denied => Some(by_required(required)),
            PermissionStatus::Partial | PermissionStatus::Unknown => Some(Severity::Warning),
            PermissionStatus::Granted => None,
        }
    }

    fn wrap(result: CheckResult<Self>) -> RawCheck {
        RawCheck::Permission(result)
    }
}

/// Severity of one result, `None` when it passed.
pub fn classify<S: Classify>(result: &CheckResult<S>) -> Option<Severity> {
    result.status.severity(result.required)
}

/// Convert a non-passing result into an issue.
pub fn to_issue<S: Classify>(result: &CheckResult<S>) -> Option<ValidationIssue> {
    let severity = classify(result)?;
    Some(ValidationIssue {
        category: S::CATEGORY,
        name: result.name.clone(),
        severity,
        message: result.message.clone(),
        details: result.details.clone(),
        remediation: result.remediation.clone(),
        origin: S::wrap(result.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use migcheck_checks::Category;

    fn table<S: Classify>() -> Vec<(S, bool, Option<Severity>)> {
        S::all()
            .iter()
            .flat_map(|s| [true, false].map(|required| (*s, required, s.severity(required))))
            .collect()
    }

    #[test]
    fn test_connectivity_and_compatibility_ignore_required() {
        for (status, _, severity) in table::<ConnectivityStatus>() {
            let expected = match status {
                ConnectivityStatus::Failed => Some(Severity::Critical),
                ConnectivityStatus::Warning => Some(Severity::Warning),
                _ => None,
            };
            assert_eq!(severity, expected, "{:?}", status);
        }
        for (status, _, severity) in table::<CompatibilityStatus>() {
            let expected = match status {
                CompatibilityStatus::Incompatible => Some(Severity::Critical),
                CompatibilityStatus::Compatible => None,
                _ => Some(Severity::Warning),
            };
            assert_eq!(severity, expected, "{:?}", status);
        }
    }

    #[test]
    fn test_dependency_table() {
        use DependencyStatus::*;
        assert_eq!(Missing.severity(true), Some(Severity::Critical));
        assert_eq!(Missing.severity(false), Some(Severity::Warning));
        assert_eq!(WrongVersion.severity(true), Some(Severity::Critical));
        assert_eq!(WrongVersion.severity(false), Some(Severity::Warning));
        assert_eq!(Optional.severity(true), Some(Severity::Warning));
        assert_eq!(Optional.severity(false), Some(Severity::Warning));
        assert_eq!(Available.severity(true), None);
    }

    #[test]
    fn test_permission_table() {
        use PermissionStatus::*;
        assert_eq!(Denied.severity(true), Some(Severity::Critical));
        assert_eq!(Denied.severity(false), Some(Severity::Warning));
        assert_eq!(Partial.severity(true), Some(Severity::Warning));
        assert_eq!(Unknown.severity(true), Some(Severity::Warning));
        assert_eq!(Granted.severity(false), None);
    }

    #[test]
    fn test_classification_is_total_and_never_info() {
        let all: Vec<Option<Severity>> = table::<ConnectivityStatus>()
            .into_iter()
            .map(|(_, _, s)| s)
            .chain(table::<CompatibilityStatus>().into_iter().map(|(_, _, s)| s))
            .chain(table::<DependencyStatus>().into_iter().map(|(_, _, s)| s))
            .chain(table::<PermissionStatus>().into_iter().map(|(_, _, s)| s))
            .collect();
        assert_eq!(all.len(), 32);
        assert!(all.iter().all(|s| *s != Some(Severity::Info)));
    }

    #[test]
    fn test_to_issue_keeps_origin() {
        let result = CheckResult::new("pymongo", DependencyStatus::Missing, "not installed")
            .with_remediation("pip install pymongo");
        let issue = to_issue(&result).unwrap();
        assert_eq!(issue.category, Category::Dependency);
        assert_eq!(issue.severity, Severity::Critical);
        assert_eq!(issue.origin, RawCheck::Dependency(result));

        let passing = CheckResult::new("rsync", DependencyStatus::Available, "ok");
        assert!(to_issue(&passing).is_none());
    }
}
