//! Validation aggregator.
//!
//! Runs the four checkers, stores their raw output, derives the issue list
//! and the summary, and renders reports from that state. State changes only
//! through `&mut self`, so overlapping runs on one validator cannot compile.

use crate::classify::Classify;
use crate::issue::ValidationIssue;
use crate::raw::RawResults;
use crate::remediation::build_scripts;
use crate::report::{render_summary_table, render_tree, Console, ReportFormat, Reporter};
use crate::summary::ValidationSummary;
use migcheck_checks::{Category, CheckResult, Checker, CheckerSet};
use migcheck_common::{Error, Result, Timestamp};
use migcheck_descriptor::MigrationDescriptor;
use migcheck_redaction::Redactor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Returned by report rendering before any validation has run.
pub const NO_RESULTS_MESSAGE: &str = "No validation results available. Run a validation first.";

/// How the four checkers are scheduled. Both modes yield identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    Concurrent,
    Sequential,
}

/// Aggregator settings.
#[derive(Debug, Clone, Default)]
pub struct ValidatorConfig {
    pub mode: ExecutionMode,
    /// Wall-clock limit per checker. Exceeding it counts as a checker failure.
    pub checker_budget: Option<Duration>,
}

/// Validation aggregator.
pub struct Validator {
    checkers: CheckerSet,
    config: ValidatorConfig,
    reporter: Reporter,
    console: Console,
    raw: RawResults,
    issues: Vec<ValidationIssue>,
    summary: Option<ValidationSummary>,
    generation: u64,
}

impl Validator {
    pub fn new(checkers: CheckerSet) -> Self {
        Self::with_config(checkers, ValidatorConfig::default())
    }

    pub fn with_config(checkers: CheckerSet, config: ValidatorConfig) -> Self {
        Self {
            checkers,
            config,
            reporter: Reporter::default(),
            console: Console::default(),
            raw: RawResults::new(),
            issues: Vec::new(),
            summary: None,
            generation: 0,
        }
    }

    /// Replace the progress/detail output sink.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn with_redactor(mut self, redactor: Redactor) -> Self {
        self.reporter = Reporter::new(redactor);
        self
    }

    /// Run every checker and replace all stored state.
    ///
    /// Stored state is cleared before the checkers start. If the returned
    /// future is dropped, the validator stays in the "no results" state and
    /// the checker tasks are aborted.
    pub async fn validate_migration(
        &mut self,
        descriptor: &MigrationDescriptor,
        show_progress: bool,
        detailed_output: bool,
    ) -> ValidationSummary {
        info!("Validating migration {}", descriptor.label());
        self.raw.clear();
        self.issues.clear();
        self.summary = None;
        self.generation += 1;
        let generation = self.generation;

        if show_progress {
            self.emit_line(&format!("Running validation checks for {}...", descriptor.label()));
        }

        let descriptor = Arc::new(descriptor.clone());
        let budget = self.config.checker_budget;
        let checkers = self.checkers.clone();

        let (connectivity, compatibility, dependency, permission) = match self.config.mode {
            ExecutionMode::Concurrent => {
                tokio::join!(
                    run_checker(checkers.connectivity, descriptor.clone(), budget),
                    run_checker(checkers.compatibility, descriptor.clone(), budget),
                    run_checker(checkers.dependency, descriptor.clone(), budget),
                    run_checker(checkers.permission, descriptor.clone(), budget),
                )
            }
            ExecutionMode::Sequential => (
                run_checker(checkers.connectivity, descriptor.clone(), budget).await,
                run_checker(checkers.compatibility, descriptor.clone(), budget).await,
                run_checker(checkers.dependency, descriptor.clone(), budget).await,
                run_checker(checkers.permission, descriptor.clone(), budget).await,
            ),
        };

        self.raw.set_connectivity(connectivity, generation);
        self.raw.set_compatibility(compatibility, generation);
        self.raw.set_dependency(dependency, generation);
        self.raw.set_permission(permission, generation);
        let summary = self.recompute();

        if show_progress {
            let table = render_summary_table(&summary);
            self.emit_block(&table);
        }
        if detailed_output {
            let tree = render_tree(&self.raw, self.reporter.redactor());
            self.emit_block(&tree);
        }

        info!(
            "Validation complete: {} checks, {} critical, {} warnings, can proceed: {}",
            summary.total_checks, summary.critical_issues, summary.warning_issues, summary.can_proceed
        );
        summary
    }

    /// Re-run one checker. Other categories keep their stored results and
    /// become stale; issues and summary are recomputed from everything
    /// stored. Returns only the requested category's issues.
    pub async fn validate_single_category(
        &mut self,
        descriptor: &MigrationDescriptor,
        category: Category,
    ) -> Vec<ValidationIssue> {
        info!("Re-validating {} for {}", category, descriptor.label());
        self.generation += 1;
        let generation = self.generation;

        let descriptor = Arc::new(descriptor.clone());
        let budget = self.config.checker_budget;
        let checkers = self.checkers.clone();

        match category {
            Category::Connectivity => {
                let results = run_checker(checkers.connectivity, descriptor, budget).await;
                self.raw.set_connectivity(results, generation);
            }
            Category::Compatibility => {
                let results = run_checker(checkers.compatibility, descriptor, budget).await;
                self.raw.set_compatibility(results, generation);
            }
            Category::Dependency => {
                let results = run_checker(checkers.dependency, descriptor, budget).await;
                self.raw.set_dependency(results, generation);
            }
            Category::Permission => {
                let results = run_checker(checkers.permission, descriptor, budget).await;
                self.raw.set_permission(results, generation);
            }
        }

        let summary = self.recompute();
        if !summary.stale_categories.is_empty() {
            debug!("Stale categories: {:?}", summary.stale_categories);
        }

        self.issues
            .iter()
            .filter(|issue| issue.category == category)
            .cloned()
            .collect()
    }

    /// Render the last computed state.
    pub fn get_validation_report(&self, format: ReportFormat) -> String {
        match &self.summary {
            Some(summary) => self.reporter.render(format, summary, &self.issues),
            None => NO_RESULTS_MESSAGE.to_string(),
        }
    }

    pub fn save_report(&self, path: &Path, format: ReportFormat) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.get_validation_report(format))?;
        info!("Saved {} report to {}", format, path.display());
        Ok(())
    }

    /// Write every remediation script into `dir` and return their paths.
    pub fn save_remediation_scripts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let summary = self
            .summary
            .as_ref()
            .ok_or_else(|| Error::Report(NO_RESULTS_MESSAGE.to_string()))?;

        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(summary.remediation_scripts.len());
        for (name, body) in &summary.remediation_scripts {
            let path = dir.join(name);
            std::fs::write(&path, body)?;
            make_executable(&path)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }
        info!("Saved {} remediation scripts to {}", written.len(), dir.display());
        Ok(written)
    }

    pub fn raw_results(&self) -> &RawResults {
        &self.raw
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn summary(&self) -> Option<&ValidationSummary> {
        self.summary.as_ref()
    }

    pub fn stale_categories(&self) -> Vec<Category> {
        self.raw.stale_categories()
    }

    fn recompute(&mut self) -> ValidationSummary {
        self.issues = self.raw.issues();
        let scripts = build_scripts(&self.issues, self.reporter.redactor());
        let summary = ValidationSummary::compute(&self.raw, &self.issues, scripts, Timestamp::now());
        self.summary = Some(summary.clone());
        summary
    }

    fn emit_line(&mut self, text: &str) {
        if let Err(e) = self.console.line(text) {
            warn!("Console output failed: {}", e);
        }
    }

    fn emit_block(&mut self, text: &str) {
        if let Err(e) = self.console.block(text) {
            warn!("Console output failed: {}", e);
        }
    }
}

/// Aborts the checker task when the awaiting future goes away, whether by
/// budget overrun or by the caller dropping the run.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one checker on its own task. Errors, panics and budget overruns
/// all yield zero results.
async fn run_checker<S: Classify>(
    checker: Arc<dyn Checker<Status = S>>,
    descriptor: Arc<MigrationDescriptor>,
    budget: Option<Duration>,
) -> Vec<CheckResult<S>> {
    let name = checker.name();
    debug!("Starting {} checker", name);
    let mut task = AbortOnDrop(tokio::spawn(async move { checker.check(&descriptor).await }));

    let joined = match budget {
        Some(limit) => match tokio::time::timeout(limit, &mut task.0).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!("{} checker exceeded its {:?} budget", name, limit);
                return Vec::new();
            }
        },
        None => (&mut task.0).await,
    };

    match joined {
        Ok(Ok(results)) => {
            debug!("{} checker returned {} results", name, results.len());
            results
        }
        Ok(Err(e)) => {
            warn!("{} checker failed: {:#}", name, e);
            Vec::new()
        }
        Err(e) => {
            error!("{} checker panicked: {}", name, e);
            Vec::new()
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::Severity;
    use crate::remediation::{FIX_PERMISSIONS, INSTALL_DEPENDENCIES, TROUBLESHOOT_CONNECTIVITY};
    use async_trait::async_trait;
    use migcheck_checks::{
        CheckStatus, CompatibilityResult, CompatibilityStatus, ConnectivityResult,
        ConnectivityStatus, DependencyKind, DependencyResult, DependencyStatus, PermissionResult,
        PermissionStatus,
    };
    use migcheck_descriptor::{DatabaseConfig, DatabaseKind, MigrationEndpoint, SystemKind, TransferMethod};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Returns canned results, counting calls.
    struct Fixed<S: CheckStatus> {
        results: Vec<CheckResult<S>>,
        calls: AtomicUsize,
    }

    impl<S: CheckStatus> Fixed<S> {
        fn new(results: Vec<CheckResult<S>>) -> Arc<Self> {
            Arc::new(Self {
                results,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl<S: CheckStatus> Checker for Fixed<S> {
        type Status = S;

        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<CheckResult<S>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.results.clone())
        }
    }

    /// Returns results that can be swapped between runs.
    struct Swappable<S: CheckStatus> {
        results: Mutex<Vec<CheckResult<S>>>,
    }

    #[async_trait]
    impl<S: CheckStatus> Checker for Swappable<S> {
        type Status = S;

        fn name(&self) -> &'static str {
            "swappable"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<CheckResult<S>>> {
            Ok(self.results.lock().unwrap().clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl Checker for Failing {
        type Status = DependencyStatus;

        fn name(&self) -> &'static str {
            "failing"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<DependencyResult>> {
            anyhow::bail!("probe crashed")
        }
    }

    struct Panicking;

    #[async_trait]
    impl Checker for Panicking {
        type Status = PermissionStatus;

        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<PermissionResult>> {
            panic!("unexpected state")
        }
    }

    struct Slow;

    #[async_trait]
    impl Checker for Slow {
        type Status = ConnectivityStatus;

        fn name(&self) -> &'static str {
            "slow"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<ConnectivityResult>> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(vec![ConnectivityResult::new("late", ConnectivityStatus::Failed, "late")])
        }
    }

    /// Finishes after a short delay and records that it did.
    struct Tracked {
        finished: Arc<std::sync::atomic::AtomicBool>,
    }

    #[async_trait]
    impl Checker for Tracked {
        type Status = ConnectivityStatus;

        fn name(&self) -> &'static str {
            "tracked"
        }

        async fn check(&self, _descriptor: &MigrationDescriptor) -> anyhow::Result<Vec<ConnectivityResult>> {
            tokio::time::sleep(Duration::from_millis(200)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn descriptor() -> MigrationDescriptor {
        let db = |kind| DatabaseConfig {
            kind,
            host: "localhost".to_string(),
            port: None,
            username: Some("wp".to_string()),
            password: Some("hunter2".to_string()),
            name: "wordpress".to_string(),
            version: None,
        };
        let mut source = MigrationEndpoint::new(SystemKind::Wordpress);
        source.database = Some(db(DatabaseKind::Mysql));
        let mut destination = MigrationEndpoint::new(SystemKind::Wordpress);
        destination.database = Some(db(DatabaseKind::Postgresql));
        MigrationDescriptor::new(source, destination, TransferMethod::Local)
    }

    fn connectivity_ok() -> Vec<ConnectivityResult> {
        vec![
            ConnectivityResult::new("Source network", ConnectivityStatus::Success, "ok"),
            ConnectivityResult::new("Destination network", ConnectivityStatus::Skipped, "no host"),
        ]
    }

    fn compatibility_ok() -> Vec<CompatibilityResult> {
        vec![CompatibilityResult::new("Platform compatibility", CompatibilityStatus::Compatible, "same")]
    }

    fn dependency_ok() -> Vec<DependencyResult> {
        vec![DependencyResult::new("tar", DependencyStatus::Available, "found")]
    }

    fn permission_ok() -> Vec<PermissionResult> {
        vec![PermissionResult::new("Source root (read)", PermissionStatus::Granted, "readable")]
    }

    fn all_passing() -> CheckerSet {
        CheckerSet::new(
            Fixed::new(connectivity_ok()),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        )
    }

    fn quiet(checkers: CheckerSet) -> Validator {
        Validator::new(checkers).with_console(Console::new(Box::new(std::io::sink())))
    }

    fn assert_counting_invariants(summary: &ValidationSummary) {
        assert_eq!(summary.passed_checks + summary.failed_checks, summary.total_checks);
        assert_eq!(summary.critical_issues + summary.warning_issues, summary.failed_checks);
        assert_eq!(summary.can_proceed, summary.critical_issues == 0);
    }

    #[tokio::test]
    async fn test_all_passing() {
        let mut validator = quiet(all_passing());
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(summary.total_checks, 5);
        assert_eq!(summary.passed_checks, 5);
        assert_eq!(summary.success_rate, 100.0);
        assert_eq!(summary.estimated_fix_time, "No fixes needed");
        assert!(summary.can_proceed);
        assert!(validator.issues().is_empty());

        let names: Vec<&str> = summary.remediation_scripts.keys().map(String::as_str).collect();
        assert_eq!(names, vec![FIX_PERMISSIONS, INSTALL_DEPENDENCIES]);
        assert!(summary.remediation_scripts.values().all(|s| s.contains("# Nothing to")));
        assert_counting_invariants(&summary);
    }

    #[tokio::test]
    async fn test_conversion_is_only_a_warning() {
        let checkers = CheckerSet::new(
            Fixed::new(connectivity_ok()),
            Fixed::new(vec![
                CompatibilityResult::new("Platform compatibility", CompatibilityStatus::Compatible, "same"),
                CompatibilityResult::new(
                    "Database compatibility",
                    CompatibilityStatus::RequiresConversion,
                    "Schema conversion required from mysql to postgresql",
                ),
            ]),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        );
        let mut validator = quiet(checkers);
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(summary.critical_issues, 0);
        assert_eq!(summary.warning_issues, 1);
        assert!(summary.can_proceed);
        assert_eq!(summary.estimated_fix_time, "30 minutes");
        assert_eq!(summary.issues_by_category[&Category::Compatibility], 1);
        assert_counting_invariants(&summary);
    }

    #[tokio::test]
    async fn test_missing_package_and_failed_connection_block() {
        let checkers = CheckerSet::new(
            Fixed::new(vec![ConnectivityResult::new(
                "Destination network",
                ConnectivityStatus::Failed,
                "cannot connect to new.example.com:80",
            )
            .with_detail("host", "new.example.com")
            .with_detail("port", 80)]),
            Fixed::new(compatibility_ok()),
            Fixed::new(vec![DependencyResult::new(
                "mysql-connector-python",
                DependencyStatus::Missing,
                "Python package mysql-connector-python is not installed",
            )
            .with_detail("kind", DependencyKind::PythonPackage.as_str())
            .with_detail("install_command", "pip install mysql-connector-python")
            .with_remediation("pip install mysql-connector-python")]),
            Fixed::new(permission_ok()),
        );
        let mut validator = quiet(checkers);
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(summary.critical_issues, 2);
        assert!(!summary.can_proceed);
        assert_eq!(summary.estimated_fix_time, "25 minutes");
        assert!(summary.remediation_scripts[INSTALL_DEPENDENCIES].contains("\npip install mysql-connector-python\n"));
        assert!(summary.remediation_scripts[TROUBLESHOOT_CONNECTIVITY].contains("nc -zv -w 5 'new.example.com' 80"));

        let md = validator.get_validation_report(ReportFormat::Markdown);
        let connectivity = md.find("### Connectivity\n\n- 🔴 **Destination network**").unwrap();
        let dependency = md.find("### Dependency\n\n- 🔴 **mysql-connector-python**").unwrap();
        assert!(connectivity < dependency);
        assert_counting_invariants(&summary);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_checkers_are_isolated() {
        let checkers = CheckerSet::new(
            Fixed::new(connectivity_ok()),
            Fixed::new(compatibility_ok()),
            Arc::new(Failing),
            Arc::new(Panicking),
        );
        let mut validator = quiet(checkers);
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(summary.total_checks, 3);
        assert!(validator.raw_results().dependency.is_empty());
        assert!(validator.raw_results().permission.is_empty());
        assert_counting_invariants(&summary);
    }

    #[tokio::test]
    async fn test_checker_budget() {
        let checkers = CheckerSet::new(
            Arc::new(Slow),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        );
        let config = ValidatorConfig {
            checker_budget: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let mut validator = Validator::with_config(checkers, config)
            .with_console(Console::new(Box::new(std::io::sink())));
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(summary.total_checks, 3);
        assert!(validator.raw_results().connectivity.is_empty());
    }

    #[tokio::test]
    async fn test_sequential_matches_concurrent() {
        let build = || {
            CheckerSet::new(
                Fixed::new(vec![ConnectivityResult::new("Source SSH", ConnectivityStatus::Failed, "refused")]),
                Fixed::new(compatibility_ok()),
                Fixed::new(vec![DependencyResult::new("lftp", DependencyStatus::Optional, "absent")]),
                Fixed::new(vec![PermissionResult::new("Destination root (write)", PermissionStatus::Unknown, "?")]),
            )
        };

        let mut concurrent = quiet(build());
        let mut sequential = Validator::with_config(
            build(),
            ValidatorConfig {
                mode: ExecutionMode::Sequential,
                checker_budget: None,
            },
        )
        .with_console(Console::new(Box::new(std::io::sink())));

        let a = concurrent.validate_migration(&descriptor(), false, false).await;
        let b = sequential.validate_migration(&descriptor(), false, false).await;
        assert_eq!(concurrent.issues(), sequential.issues());
        assert_eq!(a.issues_by_category, b.issues_by_category);
        assert_eq!(a.remediation_scripts, b.remediation_scripts);
        assert_eq!(a.estimated_fix_time, b.estimated_fix_time);
    }

    #[tokio::test]
    async fn test_second_run_replaces_state() {
        let checker = Fixed::new(connectivity_ok());
        let checkers = CheckerSet::new(
            checker.clone(),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        );
        let mut validator = quiet(checkers);
        validator.validate_migration(&descriptor(), false, false).await;
        let summary = validator.validate_migration(&descriptor(), false, false).await;

        assert_eq!(checker.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.total_checks, 5);
        assert_eq!(validator.raw_results().connectivity.len(), 2);
    }

    #[tokio::test]
    async fn test_single_category_recheck() {
        let permission = Arc::new(Swappable {
            results: Mutex::new(vec![PermissionResult::new(
                "Destination root (write)",
                PermissionStatus::Denied,
                "not writable",
            )]),
        });
        let checkers = CheckerSet::new(
            Fixed::new(vec![
                ConnectivityResult::new("Source network", ConnectivityStatus::Failed, "refused"),
                ConnectivityResult::new("Destination network", ConnectivityStatus::Failed, "refused"),
            ]),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            permission.clone(),
        );
        let mut validator = quiet(checkers);
        let first = validator.validate_migration(&descriptor(), false, false).await;
        assert_eq!(first.critical_issues, 3);
        assert!(first.stale_categories.is_empty());

        *permission.results.lock().unwrap() = vec![PermissionResult::new(
            "Destination root (write)",
            PermissionStatus::Partial,
            "does not exist yet",
        )];
        let issues = validator
            .validate_single_category(&descriptor(), Category::Permission)
            .await;

        assert_eq!(issues.len(), 1);
        assert!(issues.iter().all(|i| i.category == Category::Permission));
        assert_eq!(issues[0].severity, Severity::Warning);

        let summary = validator.summary().unwrap();
        assert_eq!(summary.critical_issues, 2);
        assert_eq!(summary.warning_issues, 1);
        assert_eq!(
            summary.stale_categories,
            vec![Category::Connectivity, Category::Compatibility, Category::Dependency]
        );
        assert_eq!(validator.stale_categories(), summary.stale_categories);
        assert!(validator
            .get_validation_report(ReportFormat::Markdown)
            .contains("may be stale"));
        assert_counting_invariants(summary);
    }

    #[tokio::test]
    async fn test_reports_before_and_after_run() {
        let mut validator = quiet(all_passing());
        assert_eq!(validator.get_validation_report(ReportFormat::Json), NO_RESULTS_MESSAGE);
        assert!(validator.summary().is_none());

        validator.validate_migration(&descriptor(), false, false).await;
        let first = validator.get_validation_report(ReportFormat::Markdown);
        let second = validator.get_validation_report(ReportFormat::Markdown);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_save_report_and_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let mut validator = quiet(all_passing());

        let err = validator.save_remediation_scripts(dir.path()).unwrap_err();
        assert!(matches!(err, Error::Report(_)));

        validator.validate_migration(&descriptor(), false, false).await;
        let report_path = dir.path().join("reports").join("validation.txt");
        validator.save_report(&report_path, ReportFormat::Text).unwrap();
        let saved = std::fs::read_to_string(&report_path).unwrap();
        assert!(saved.contains("MIGRATION VALIDATION REPORT"));

        let scripts = validator.save_remediation_scripts(&dir.path().join("scripts")).unwrap();
        assert_eq!(scripts.len(), 2);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(&scripts[0]).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }

    #[tokio::test]
    async fn test_progress_and_detail_output() {
        #[derive(Clone, Default)]
        struct Shared(Arc<Mutex<Vec<u8>>>);

        impl std::io::Write for Shared {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.lock().unwrap().extend_from_slice(buf);
                Ok(buf.len())
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let shared = Shared::default();
        let mut validator =
            Validator::new(all_passing()).with_console(Console::new(Box::new(shared.clone())));
        validator.validate_migration(&descriptor(), true, true).await;

        let output = String::from_utf8(shared.0.lock().unwrap().clone()).unwrap();
        assert!(output.starts_with("Running validation checks for"));
        assert!(output.contains("✅ Migration can proceed"));
        assert!(output.contains("Validation Results\n├── Connectivity (2)"));
        assert!(output.contains("⏭️ Destination network: no host"));
    }

    #[tokio::test]
    async fn test_dropped_run_leaves_no_results() {
        let mut validator = quiet(CheckerSet::new(
            Arc::new(Slow),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        ));

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            validator.validate_migration(&descriptor(), false, false),
        )
        .await;

        assert!(outcome.is_err());
        assert!(validator.summary().is_none());
        assert!(validator.issues().is_empty());
        assert_eq!(validator.get_validation_report(ReportFormat::Markdown), NO_RESULTS_MESSAGE);
        assert_eq!(validator.get_validation_report(ReportFormat::Json), NO_RESULTS_MESSAGE);
    }

    #[tokio::test]
    async fn test_dropped_run_aborts_checker_tasks() {
        let finished = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let mut validator = quiet(CheckerSet::new(
            Arc::new(Tracked {
                finished: finished.clone(),
            }),
            Fixed::new(compatibility_ok()),
            Fixed::new(dependency_ok()),
            Fixed::new(permission_ok()),
        ));

        let outcome = tokio::time::timeout(
            Duration::from_millis(20),
            validator.validate_migration(&descriptor(), false, false),
        )
        .await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }
}
