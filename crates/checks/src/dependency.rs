//! Local tool and Python package availability.
//!
//! The requirement list is derived purely from the descriptor; probing is
//! a `which` lookup plus a version probe through an [`Executor`].

use crate::checker::Checker;
use crate::config::CheckerConfig;
use crate::executor::{is_timeout, Executor, LocalExecutor};
use crate::result::{DependencyKind, DependencyResult, DependencyStatus};
use crate::version::parse_lenient;
use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::{CloudProvider, DatabaseKind, MigrationDescriptor, TransferMethod};
use semver::Version;
use std::sync::Arc;
use tracing::{debug, info};

/// One thing the migration needs installed on this machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub name: String,
    pub kind: DependencyKind,
    pub required: bool,
    pub min_version: Option<Version>,
    pub install_command: String,
    /// Why the migration needs it.
    pub reason: String,
}

impl Requirement {
    fn tool(name: &str, package: &str, required: bool, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: DependencyKind::SystemTool,
            required,
            min_version: None,
            install_command: format!("sudo apt-get install -y {}", package),
            reason: reason.into(),
        }
    }

    fn python(name: &str, required: bool, reason: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: DependencyKind::PythonPackage,
            required,
            min_version: None,
            install_command: format!("pip install {}", name),
            reason: reason.into(),
        }
    }

    fn cli(name: &str, install_command: &str, required: bool, reason: impl Into<String>) -> Self {
        Self {
            install_command: install_command.to_string(),
            ..Self::tool(name, name, required, reason)
        }
    }

    fn min_version(mut self, version: Version) -> Self {
        self.min_version = Some(version);
        self
    }
}

/// Everything the descriptor needs, deduplicated by name and kind.
///
/// Order: transfer tooling, database tooling per kind, cloud tooling, backup.
/// A duplicate keeps its first position and is required if any occurrence is.
pub fn requirements(descriptor: &MigrationDescriptor) -> Vec<Requirement> {
    let mut list = Vec::new();
    let method = descriptor.transfer_method;

    match method {
        TransferMethod::Rsync => {
            list.push(
                Requirement::tool("rsync", "rsync", true, "rsync transfer")
                    .min_version(Version::new(3, 0, 0)),
            );
            list.push(Requirement::tool("ssh", "openssh-client", true, "rsync over SSH"));
        }
        TransferMethod::Sftp => {
            list.push(Requirement::tool("sftp", "openssh-client", true, "sftp transfer"));
        }
        TransferMethod::Scp => {
            list.push(Requirement::tool("scp", "openssh-client", true, "scp transfer"));
        }
        TransferMethod::Ftp => {
            list.push(Requirement::tool("lftp", "lftp", true, "ftp transfer"));
        }
        TransferMethod::Local => {
            list.push(
                Requirement::tool("rsync", "rsync", false, "faster local copies")
                    .min_version(Version::new(3, 0, 0)),
            );
        }
        TransferMethod::CloudStorage => {}
    }

    for kind in descriptor.database_kinds() {
        let reason = format!("{} export/import", kind);
        match kind {
            DatabaseKind::Mysql | DatabaseKind::Mariadb => {
                list.push(Requirement::tool("mysqldump", "default-mysql-client", true, reason.clone()));
                list.push(Requirement::tool("mysql", "default-mysql-client", true, reason.clone()));
                list.push(Requirement::python("mysql-connector-python", true, reason));
            }
            DatabaseKind::Postgresql => {
                list.push(Requirement::tool("pg_dump", "postgresql-client", true, reason.clone()));
                list.push(Requirement::tool("psql", "postgresql-client", true, reason.clone()));
                list.push(Requirement::python("psycopg2-binary", true, reason));
            }
            DatabaseKind::Mongodb => {
                list.push(Requirement::tool("mongodump", "mongodb-database-tools", true, reason.clone()));
                list.push(Requirement::tool("mongorestore", "mongodb-database-tools", true, reason.clone()));
                list.push(Requirement::python("pymongo", true, reason));
            }
            DatabaseKind::Redis => {
                list.push(Requirement::tool("redis-cli", "redis-tools", true, reason.clone()));
                list.push(Requirement::python("redis", true, reason));
            }
            DatabaseKind::Sqlite => {
                list.push(Requirement::tool("sqlite3", "sqlite3", true, reason));
            }
        }
    }

    let cloud_transfer = method == TransferMethod::CloudStorage;
    for (_, endpoint) in descriptor.endpoints() {
        let Some(cloud) = &endpoint.cloud else {
            continue;
        };
        let reason = format!("{} storage access", cloud.provider);
        match cloud.provider {
            CloudProvider::Aws => {
                list.push(Requirement::cli("aws", "pip install awscli", cloud_transfer, reason.clone()));
                list.push(Requirement::python("boto3", cloud_transfer, reason));
            }
            CloudProvider::Gcp => {
                list.push(Requirement::cli("gsutil", "pip install gsutil", cloud_transfer, reason.clone()));
                list.push(Requirement::python("google-cloud-storage", cloud_transfer, reason));
            }
            CloudProvider::Azure => {
                list.push(Requirement::cli("az", "pip install azure-cli", cloud_transfer, reason.clone()));
                list.push(Requirement::python("azure-storage-blob", cloud_transfer, reason));
            }
        }
    }

    let backup = descriptor.options.backup_before;
    list.push(Requirement::tool("tar", "tar", backup, "pre-migration backup"));
    list.push(Requirement::tool("gzip", "gzip", backup, "pre-migration backup"));

    dedup(list)
}

fn dedup(list: Vec<Requirement>) -> Vec<Requirement> {
    let mut out: Vec<Requirement> = Vec::with_capacity(list.len());
    for item in list {
        match out.iter_mut().find(|r| r.name == item.name && r.kind == item.kind) {
            Some(existing) => existing.required |= item.required,
            None => out.push(item),
        }
    }
    out
}

/// Default dependency checker.
pub struct DependencyChecker {
    config: CheckerConfig,
    executor: Arc<dyn Executor>,
}

impl DependencyChecker {
    pub fn new(config: CheckerConfig) -> Self {
        let executor = Arc::new(LocalExecutor::new(config.probe_timeout));
        Self { config, executor }
    }

    /// Use a different executor for version and pip probes.
    pub fn with_executor(config: CheckerConfig, executor: Arc<dyn Executor>) -> Self {
        Self { config, executor }
    }

    async fn check_tool(&self, req: &Requirement) -> DependencyResult {
        let path = match which::which(&req.name) {
            Ok(path) => path,
            Err(_) => return missing(req, format!("{} not found in PATH", req.name)),
        };

        let result = match &req.min_version {
            None => DependencyResult::new(
                &req.name,
                DependencyStatus::Available,
                format!("{} found at {}", req.name, path.display()),
            ),
            Some(min) => {
                let command = format!("{} --version", req.name);
                match self.executor.execute(&command).await {
                    Ok(output) => {
                        let text = format!("{}\n{}", output.stdout, output.stderr);
                        self.compare_version(req, min, parse_lenient(&text))
                    }
                    Err(e) => {
                        debug!("Version probe for {} failed: {}", req.name, e);
                        let reason = if is_timeout(&e) { "timed out" } else { "failed" };
                        DependencyResult::new(
                            &req.name,
                            DependencyStatus::Available,
                            format!("{} found; version probe {}", req.name, reason),
                        )
                        .with_detail("version_verified", false)
                    }
                }
            }
        };
        result.with_detail("path", path.display().to_string())
    }

    async fn check_python(&self, req: &Requirement) -> DependencyResult {
        let command = format!("{} -m pip show {}", self.config.python, req.name);
        let output = match self.executor.execute(&command).await {
            Ok(output) => output,
            Err(e) => {
                let reason = if is_timeout(&e) {
                    "pip query timed out".to_string()
                } else {
                    format!("pip query failed: {}", e)
                };
                return missing(req, format!("{}: {}", req.name, reason));
            }
        };

        if !output.success() {
            return missing(req, format!("Python package {} is not installed", req.name));
        }

        let version = output
            .stdout
            .lines()
            .find_map(|line| line.strip_prefix("Version:"))
            .and_then(|v| parse_lenient(v.trim()));

        match &req.min_version {
            Some(min) => self.compare_version(req, min, version),
            None => {
                let mut result = DependencyResult::new(
                    &req.name,
                    DependencyStatus::Available,
                    format!("Python package {} is installed", req.name),
                );
                if let Some(v) = version {
                    result = result.with_detail("version", v.to_string());
                }
                result
            }
        }
    }

    fn compare_version(
        &self,
        req: &Requirement,
        min: &Version,
        found: Option<Version>,
    ) -> DependencyResult {
        match found {
            Some(v) if v < *min => DependencyResult::new(
                &req.name,
                DependencyStatus::WrongVersion,
                format!("{} {} is older than required {}", req.name, v, min),
            )
            .with_detail("version", v.to_string())
            .with_detail("min_version", min.to_string())
            .with_remediation(req.install_command.clone()),
            Some(v) => DependencyResult::new(
                &req.name,
                DependencyStatus::Available,
                format!("{} {} is installed", req.name, v),
            )
            .with_detail("version", v.to_string()),
            None => DependencyResult::new(
                &req.name,
                DependencyStatus::Available,
                format!("{} is installed; version not reported", req.name),
            )
            .with_detail("version_verified", false),
        }
    }
}

fn missing(req: &Requirement, message: String) -> DependencyResult {
    let status = if req.required {
        DependencyStatus::Missing
    } else {
        DependencyStatus::Optional
    };
    DependencyResult::new(&req.name, status, message).with_remediation(req.install_command.clone())
}

#[async_trait]
impl Checker for DependencyChecker {
    type Status = DependencyStatus;

    fn name(&self) -> &'static str {
        "dependency"
    }

    async fn check(&self, descriptor: &MigrationDescriptor) -> Result<Vec<DependencyResult>> {
        let reqs = requirements(descriptor);
        info!("Checking {} dependencies on {}", reqs.len(), self.executor.describe());

        let mut results = Vec::with_capacity(reqs.len());
        for req in &reqs {
            let result = match req.kind {
                DependencyKind::SystemTool => self.check_tool(req).await,
                DependencyKind::PythonPackage => self.check_python(req).await,
            };
            debug!("{}: {}", req.name, result.status);
            results.push(
                result
                    .with_required(req.required)
                    .with_detail("kind", req.kind.as_str())
                    .with_detail("install_command", req.install_command.clone())
                    .with_detail("reason", req.reason.clone()),
            );
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::ScriptedExecutor;
    use migcheck_descriptor::{CloudConfig, DatabaseConfig, MigrationEndpoint, SystemKind};
    use pretty_assertions::assert_eq;

    fn db(kind: DatabaseKind) -> DatabaseConfig {
        DatabaseConfig {
            kind,
            host: "localhost".to_string(),
            port: None,
            username: None,
            password: None,
            name: "app".to_string(),
            version: None,
        }
    }

    fn names(reqs: &[Requirement]) -> Vec<&str> {
        reqs.iter().map(|r| r.name.as_str()).collect()
    }

    fn requirement(name: &str, kind: DependencyKind, required: bool) -> Requirement {
        match kind {
            DependencyKind::SystemTool => Requirement::tool(name, name, required, "test"),
            DependencyKind::PythonPackage => Requirement::python(name, required, "test"),
        }
    }

    #[test]
    fn test_requirements_rsync_mysql() {
        let mut source = MigrationEndpoint::new(SystemKind::Wordpress);
        source.database = Some(db(DatabaseKind::Mysql));
        let mut destination = MigrationEndpoint::new(SystemKind::Wordpress);
        destination.database = Some(db(DatabaseKind::Mariadb));
        let descriptor = MigrationDescriptor::new(source, destination, TransferMethod::Rsync);

        let reqs = requirements(&descriptor);
        assert_eq!(
            names(&reqs),
            vec!["rsync", "ssh", "mysqldump", "mysql", "mysql-connector-python", "tar", "gzip"]
        );
        assert!(reqs.iter().all(|r| r.required));
        assert_eq!(reqs[0].min_version, Some(Version::new(3, 0, 0)));
    }

    #[test]
    fn test_requirements_cloud_and_backup_flags() {
        let mut source = MigrationEndpoint::new(SystemKind::StaticSite);
        source.cloud = Some(CloudConfig {
            provider: CloudProvider::Aws,
            region: "eu-west-1".to_string(),
            access_key: None,
            secret_key: None,
            bucket: None,
        });
        let mut descriptor = MigrationDescriptor::new(
            source,
            MigrationEndpoint::new(SystemKind::StaticSite),
            TransferMethod::Local,
        );
        descriptor.options.backup_before = false;

        let reqs = requirements(&descriptor);
        assert_eq!(names(&reqs), vec!["rsync", "aws", "boto3", "tar", "gzip"]);
        assert!(reqs.iter().all(|r| !r.required));

        descriptor.transfer_method = TransferMethod::CloudStorage;
        let reqs = requirements(&descriptor);
        let boto = reqs.iter().find(|r| r.name == "boto3").unwrap();
        assert!(boto.required);
        assert_eq!(boto.install_command, "pip install boto3");
    }

    #[test]
    fn test_dedup_upgrades_required() {
        let list = vec![
            requirement("tar", DependencyKind::SystemTool, false),
            requirement("redis", DependencyKind::PythonPackage, true),
            requirement("tar", DependencyKind::SystemTool, true),
        ];
        let out = dedup(list);
        assert_eq!(names(&out), vec!["tar", "redis"]);
        assert!(out[0].required);
    }

    #[tokio::test]
    async fn test_missing_tool_status_follows_required() {
        let checker = DependencyChecker::new(CheckerConfig::default());
        let tool = "migcheck-surely-not-installed";

        let required = checker.check_tool(&requirement(tool, DependencyKind::SystemTool, true)).await;
        assert_eq!(required.status, DependencyStatus::Missing);
        assert_eq!(required.remediation.as_deref(), Some("sudo apt-get install -y migcheck-surely-not-installed"));

        let optional = checker.check_tool(&requirement(tool, DependencyKind::SystemTool, false)).await;
        assert_eq!(optional.status, DependencyStatus::Optional);
    }

    #[tokio::test]
    async fn test_tool_version_comparison() {
        let executor = Arc::new(ScriptedExecutor::default().reply("sh --version", 0, "sh version 2.9.1"));
        let checker = DependencyChecker::with_executor(CheckerConfig::default(), executor);

        let old = requirement("sh", DependencyKind::SystemTool, true).min_version(Version::new(3, 0, 0));
        let result = checker.check_tool(&old).await;
        assert_eq!(result.status, DependencyStatus::WrongVersion);
        assert_eq!(result.detail_str("version"), Some("2.9.1"));

        let ok = requirement("sh", DependencyKind::SystemTool, true).min_version(Version::new(2, 0, 0));
        assert_eq!(checker.check_tool(&ok).await.status, DependencyStatus::Available);
    }

    #[tokio::test]
    async fn test_python_package_probe() {
        let executor = Arc::new(
            ScriptedExecutor::default()
                .reply("python3 -m pip show pymongo", 0, "Name: pymongo\nVersion: 4.6.1\n")
                .reply("python3 -m pip show redis", 1, ""),
        );
        let checker = DependencyChecker::with_executor(CheckerConfig::default(), executor.clone());

        let found = checker
            .check_python(&requirement("pymongo", DependencyKind::PythonPackage, true))
            .await;
        assert_eq!(found.status, DependencyStatus::Available);
        assert_eq!(found.detail_str("version"), Some("4.6.1"));

        let absent = checker
            .check_python(&requirement("redis", DependencyKind::PythonPackage, true))
            .await;
        assert_eq!(absent.status, DependencyStatus::Missing);
        assert_eq!(absent.remediation.as_deref(), Some("pip install redis"));

        assert_eq!(executor.seen.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_check_tags_details() {
        let mut source = MigrationEndpoint::new(SystemKind::Flask);
        source.database = Some(db(DatabaseKind::Redis));
        let mut descriptor = MigrationDescriptor::new(
            source,
            MigrationEndpoint::new(SystemKind::Flask),
            TransferMethod::CloudStorage,
        );
        descriptor.options.backup_before = false;

        let executor = Arc::new(ScriptedExecutor::default());
        let checker = DependencyChecker::with_executor(CheckerConfig::default(), executor);
        let results = checker.check(&descriptor).await.unwrap();

        let redis = results.iter().find(|r| r.name == "redis").unwrap();
        assert_eq!(redis.status, DependencyStatus::Missing);
        assert_eq!(redis.detail_str("kind"), Some("python_package"));
        assert_eq!(redis.detail_str("install_command"), Some("pip install redis"));

        let tar = results.iter().find(|r| r.name == "tar").unwrap();
        assert!(!tar.required);
    }
}
