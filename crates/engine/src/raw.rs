//! Stored checker output for the current validator state.

use crate::classify::{classify, to_issue, Classify};
use crate::issue::ValidationIssue;
use migcheck_checks::{
    Category, CheckResult, CompatibilityResult, ConnectivityResult, DependencyResult,
    PermissionResult,
};
use std::collections::BTreeMap;

/// Raw results per category plus the run generation that produced them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResults {
    pub connectivity: Vec<ConnectivityResult>,
    pub compatibility: Vec<CompatibilityResult>,
    pub dependency: Vec<DependencyResult>,
    pub permission: Vec<PermissionResult>,
    generations: BTreeMap<Category, u64>,
}

impl RawResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_connectivity(&mut self, results: Vec<ConnectivityResult>, generation: u64) {
        self.connectivity = results;
        self.generations.insert(Category::Connectivity, generation);
    }

    pub fn set_compatibility(&mut self, results: Vec<CompatibilityResult>, generation: u64) {
        self.compatibility = results;
        self.generations.insert(Category::Compatibility, generation);
    }

    pub fn set_dependency(&mut self, results: Vec<DependencyResult>, generation: u64) {
        self.dependency = results;
        self.generations.insert(Category::Dependency, generation);
    }

    pub fn set_permission(&mut self, results: Vec<PermissionResult>, generation: u64) {
        self.permission = results;
        self.generations.insert(Category::Permission, generation);
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Connectivity => self.connectivity.len(),
            Category::Compatibility => self.compatibility.len(),
            Category::Dependency => self.dependency.len(),
            Category::Permission => self.permission.len(),
        }
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.count(*c)).sum()
    }

    /// Results that classify as passing.
    pub fn passed(&self) -> usize {
        fn passing<S: Classify>(results: &[CheckResult<S>]) -> usize {
            results.iter().filter(|r| classify(*r).is_none()).count()
        }
        passing(&self.connectivity)
            + passing(&self.compatibility)
            + passing(&self.dependency)
            + passing(&self.permission)
    }

    /// Whether any category has been run since the last clear.
    pub fn has_run(&self) -> bool {
        !self.generations.is_empty()
    }

    /// Issues in category order, then checker order within a category.
    pub fn issues(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        issues.extend(self.connectivity.iter().filter_map(to_issue));
        issues.extend(self.compatibility.iter().filter_map(to_issue));
        issues.extend(self.dependency.iter().filter_map(to_issue));
        issues.extend(self.permission.iter().filter_map(to_issue));
        issues
    }

    /// Stored categories produced by an older run than the newest one.
    pub fn stale_categories(&self) -> Vec<Category> {
        let Some(latest) = self.generations.values().max().copied() else {
            return Vec::new();
        };
        self.generations
            .iter()
            .filter(|(_, generation)| **generation < latest)
            .map(|(category, _)| *category)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use migcheck_checks::{
        CompatibilityStatus, ConnectivityStatus, DependencyStatus, PermissionStatus,
    };

    fn sample() -> RawResults {
        let mut raw = RawResults::new();
        raw.set_permission(
            vec![PermissionResult::new("Destination root (write)", PermissionStatus::Denied, "denied")],
            1,
        );
        raw.set_connectivity(
            vec![
                ConnectivityResult::new("Source network", ConnectivityStatus::Success, "ok"),
                ConnectivityResult::new("Destination network", ConnectivityStatus::Failed, "refused"),
            ],
            1,
        );
        raw.set_compatibility(
            vec![CompatibilityResult::new(
                "Database compatibility",
                CompatibilityStatus::RequiresConversion,
                "mysql -> postgresql",
            )],
            1,
        );
        raw.set_dependency(
            vec![DependencyResult::new("rsync", DependencyStatus::Available, "ok")],
            1,
        );
        raw
    }

    #[test]
    fn test_counts() {
        let raw = sample();
        assert_eq!(raw.total(), 5);
        assert_eq!(raw.passed(), 2);
        assert_eq!(raw.count(Category::Connectivity), 2);
        assert!(raw.has_run());
    }

    #[test]
    fn test_issue_order_is_category_order() {
        let issues = sample().issues();
        let order: Vec<(Category, Severity)> =
            issues.iter().map(|i| (i.category, i.severity)).collect();
        assert_eq!(
            order,
            vec![
                (Category::Connectivity, Severity::Critical),
                (Category::Compatibility, Severity::Warning),
                (Category::Permission, Severity::Critical),
            ]
        );
    }

    #[test]
    fn test_stale_categories() {
        let mut raw = sample();
        assert!(raw.stale_categories().is_empty());

        raw.set_permission(Vec::new(), 2);
        assert_eq!(
            raw.stale_categories(),
            vec![Category::Connectivity, Category::Compatibility, Category::Dependency]
        );

        raw.clear();
        assert!(raw.stale_categories().is_empty());
        assert!(!raw.has_run());
    }
}
