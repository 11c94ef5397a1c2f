//! Filesystem and database permission probes.
//!
//! Local endpoints are inspected directly. Remote endpoints are inspected
//! with `test -r`/`test -w` over SSH when credentials exist, otherwise the
//! result is `Unknown`.

use crate::capability::{privilege_coverage, required_privileges, Capabilities, PrivilegeCoverage};
use crate::checker::Checker;
use crate::config::CheckerConfig;
use crate::executor::{shell_quote, Executor, SshExecutor};
use crate::result::{PermissionResult, PermissionStatus};
use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::{DatabaseConfig, DatabaseKind, MigrationDescriptor, MigrationEndpoint, Side};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Kind of access a path needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Read => "read",
            Access::Write => "write",
        }
    }
}

/// One path the migration touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCheck {
    pub name: String,
    pub path: PathBuf,
    pub access: Access,
    pub required: bool,
}

/// Paths to probe on one side.
///
/// Source: root and web root readable, config readable (optional).
/// Destination: root and web root writable. Backup: writable on either
/// side, required only when a backup is taken first.
pub fn path_checks(side: Side, endpoint: &MigrationEndpoint, backup_before: bool) -> Vec<PathCheck> {
    let Some(paths) = &endpoint.paths else {
        return Vec::new();
    };
    let title = match side {
        Side::Source => "Source",
        Side::Destination => "Destination",
    };
    let mut checks = Vec::new();
    let mut push = |label: &str, path: &Option<PathBuf>, access: Access, required: bool| {
        if let Some(path) = path {
            checks.push(PathCheck {
                name: format!("{} {} ({})", title, label, access.as_str()),
                path: path.clone(),
                access,
                required,
            });
        }
    };

    match side {
        Side::Source => {
            push("root", &paths.root, Access::Read, true);
            push("web root", &paths.web_root, Access::Read, true);
            push("config", &paths.config, Access::Read, false);
        }
        Side::Destination => {
            push("root", &paths.root, Access::Write, true);
            push("web root", &paths.web_root, Access::Write, true);
        }
    }
    push("backup path", &paths.backup, Access::Write, backup_before);
    checks
}

/// Default permission checker.
pub struct PermissionChecker {
    config: CheckerConfig,
    capabilities: Capabilities,
}

impl PermissionChecker {
    pub fn new(config: CheckerConfig, capabilities: Capabilities) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    async fn check_paths(&self, endpoint: &MigrationEndpoint, checks: &[PathCheck]) -> Vec<PermissionResult> {
        if checks.is_empty() {
            return Vec::new();
        }
        if endpoint.is_local() {
            return checks.iter().map(check_local).collect();
        }

        let (Some(auth), Some(host)) = (&endpoint.ssh, endpoint.ssh_host()) else {
            return checks
                .iter()
                .map(|c| unknown(c, "remote path cannot be inspected without SSH access"))
                .collect();
        };

        let timeout = self.config.network_timeout;
        let task = {
            let host = host.to_string();
            let port = endpoint.ssh_port();
            let auth = auth.clone();
            tokio::task::spawn_blocking(move || SshExecutor::connect(&host, port, &auth, timeout))
        };
        let connected = match tokio::time::timeout(timeout, task).await {
            Ok(Ok(Ok(executor))) => Ok(executor),
            Ok(Ok(Err(e))) => Err(format!("SSH session failed: {:#}", e)),
            Ok(Err(e)) => Err(format!("SSH session aborted: {}", e)),
            Err(_) => Err(format!("SSH session timed out after {}s", timeout.as_secs())),
        };

        match connected {
            Ok(executor) => check_remote(&executor, checks).await,
            Err(reason) => {
                warn!("Cannot inspect paths on {}: {}", host, reason);
                checks.iter().map(|c| unknown(c, &reason)).collect()
            }
        }
    }

    async fn check_database(&self, side: Side, db: &DatabaseConfig) -> PermissionResult {
        let name = match side {
            Side::Source => "Source database privileges",
            Side::Destination => "Destination database privileges",
        };
        let required = required_privileges(side);

        let result = match self.capabilities.probe(db.kind) {
            None => PermissionResult::new(
                name,
                PermissionStatus::Unknown,
                format!("No {} driver available to inspect privileges", db.kind),
            ),
            Some(probe) => {
                match tokio::time::timeout(self.config.network_timeout, probe.privileges(db)).await {
                    Err(_) => PermissionResult::new(
                        name,
                        PermissionStatus::Unknown,
                        "Privilege query timed out",
                    ),
                    Ok(Err(e)) => PermissionResult::new(
                        name,
                        PermissionStatus::Unknown,
                        format!("Privilege query failed: {:#}", e),
                    ),
                    Ok(Ok(granted)) => match privilege_coverage(&granted, required) {
                        PrivilegeCoverage::All => PermissionResult::new(
                            name,
                            PermissionStatus::Granted,
                            format!("{} granted on {}", required.join(", "), db.name),
                        ),
                        PrivilegeCoverage::Some { missing } => PermissionResult::new(
                            name,
                            PermissionStatus::Partial,
                            format!("Missing {} on {}", missing.join(", "), db.name),
                        )
                        .with_remediation(grant_command(db, &missing))
                        .with_detail("missing", missing),
                        PrivilegeCoverage::None => {
                            let missing: Vec<String> = required.iter().map(|p| p.to_string()).collect();
                            PermissionResult::new(
                                name,
                                PermissionStatus::Denied,
                                format!("None of {} granted on {}", required.join(", "), db.name),
                            )
                            .with_remediation(grant_command(db, &missing))
                            .with_detail("missing", missing)
                        }
                    },
                }
            }
        };

        result
            .with_detail("database", db.kind.as_str())
            .with_detail("side", side.as_str())
    }
}

#[async_trait]
impl Checker for PermissionChecker {
    type Status = PermissionStatus;

    fn name(&self) -> &'static str {
        "permission"
    }

    async fn check(&self, descriptor: &MigrationDescriptor) -> Result<Vec<PermissionResult>> {
        info!("Checking permissions for {}", descriptor.label());
        let mut results = Vec::new();

        for (side, endpoint) in descriptor.endpoints() {
            let checks = path_checks(side, endpoint, descriptor.options.backup_before);
            debug!("{} path checks on {}", checks.len(), side);
            results.extend(
                self.check_paths(endpoint, &checks)
                    .await
                    .into_iter()
                    .map(|r| r.with_detail("side", side.as_str())),
            );
            if let Some(db) = &endpoint.database {
                results.push(self.check_database(side, db).await);
            }
        }
        Ok(results)
    }
}

fn result_for(check: &PathCheck, status: PermissionStatus, message: String) -> PermissionResult {
    PermissionResult::new(&check.name, status, message)
        .with_required(check.required)
        .with_detail("path", check.path.display().to_string())
        .with_detail("access", check.access.as_str())
}

fn unknown(check: &PathCheck, reason: &str) -> PermissionResult {
    result_for(
        check,
        PermissionStatus::Unknown,
        format!("{}: {}", check.path.display(), reason),
    )
}

fn fix_command(check: &PathCheck) -> String {
    let quoted = shell_quote(&check.path.display().to_string());
    match check.access {
        Access::Read => format!("sudo chmod -R u+rX {}", quoted),
        Access::Write => format!("sudo chown -R \"$(whoami)\" {}", quoted),
    }
}

fn mkdir_command(check: &PathCheck) -> String {
    format!("mkdir -p {}", shell_quote(&check.path.display().to_string()))
}

/// Probe one path on this machine.
pub fn check_local(check: &PathCheck) -> PermissionResult {
    let path = check.path.as_path();
    let display = path.display();

    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return match check.access {
                Access::Read => result_for(
                    check,
                    PermissionStatus::Denied,
                    format!("{} does not exist", display),
                ),
                Access::Write => missing_write_target(check),
            };
        }
        Err(e) => {
            return result_for(check, PermissionStatus::Denied, format!("{}: {}", display, e))
                .with_remediation(fix_command(check));
        }
    };

    let outcome = match (check.access, metadata.is_dir()) {
        (Access::Read, true) => fs::read_dir(path).map(|_| ()),
        (Access::Read, false) => fs::File::open(path).map(|_| ()),
        (Access::Write, true) => write_probe(path),
        (Access::Write, false) => fs::OpenOptions::new().append(true).open(path).map(|_| ()),
    };

    match outcome {
        Ok(()) => result_for(
            check,
            PermissionStatus::Granted,
            format!("{} is {}able", display, check.access.as_str()),
        ),
        Err(e) => result_for(
            check,
            PermissionStatus::Denied,
            format!("{} is not {}able: {}", display, check.access.as_str(), e),
        )
        .with_remediation(fix_command(check)),
    }
}

/// Write target that does not exist yet: fine if it can be created.
fn missing_write_target(check: &PathCheck) -> PermissionResult {
    let display = check.path.display();
    let parent = check.path.ancestors().skip(1).find(|p| p.is_dir());

    match parent {
        Some(parent) if write_probe(parent).is_ok() => result_for(
            check,
            PermissionStatus::Partial,
            format!("{} does not exist yet; {} is writable", display, parent.display()),
        )
        .with_remediation(mkdir_command(check)),
        _ => result_for(
            check,
            PermissionStatus::Denied,
            format!("{} does not exist and cannot be created", display),
        )
        .with_remediation(format!("sudo {}", mkdir_command(check))),
    }
}

fn write_probe(dir: &Path) -> std::io::Result<()> {
    tempfile::Builder::new()
        .prefix(".migcheck-probe-")
        .tempfile_in(dir)
        .map(|_| ())
}

/// Probe paths through a remote shell.
pub async fn check_remote(executor: &dyn Executor, checks: &[PathCheck]) -> Vec<PermissionResult> {
    let mut results = Vec::with_capacity(checks.len());
    for check in checks {
        results.push(remote_one(executor, check).await);
    }
    results
}

async fn remote_one(executor: &dyn Executor, check: &PathCheck) -> PermissionResult {
    let quoted = shell_quote(&check.path.display().to_string());
    let command = match check.access {
        Access::Read => format!("test -e {q} || exit 2; test -r {q}", q = quoted),
        Access::Write => format!(
            "test -e {q} || {{ test -w \"$(dirname {q})\" && exit 3 || exit 2; }}; test -w {q}",
            q = quoted
        ),
    };
    let display = check.path.display();
    let location = executor.describe();

    let output = match executor.execute(&command).await {
        Ok(output) => output,
        Err(e) => return unknown(check, &format!("remote probe failed: {:#}", e)),
    };

    match output.exit_code {
        Some(0) => result_for(
            check,
            PermissionStatus::Granted,
            format!("{} is {}able on {}", display, check.access.as_str(), location),
        ),
        Some(1) => result_for(
            check,
            PermissionStatus::Denied,
            format!("{} is not {}able on {}", display, check.access.as_str(), location),
        )
        .with_remediation(fix_command(check)),
        Some(2) => {
            let result = result_for(
                check,
                PermissionStatus::Denied,
                format!("{} does not exist on {}", display, location),
            );
            match check.access {
                Access::Read => result,
                Access::Write => result.with_remediation(format!("sudo {}", mkdir_command(check))),
            }
        }
        Some(3) => result_for(
            check,
            PermissionStatus::Partial,
            format!("{} does not exist yet on {}; parent is writable", display, location),
        )
        .with_remediation(mkdir_command(check)),
        other => unknown(check, &format!("unexpected exit status {:?}", other)),
    }
}

/// GRANT command for the missing privileges. Names from the descriptor are
/// quoted for SQL first and the statement as a whole for the shell.
fn grant_command(db: &DatabaseConfig, missing: &[String]) -> String {
    let user = db.username.as_deref().unwrap_or("migration");
    let privileges = missing.join(", ");
    match db.kind {
        kind if kind.is_mysql_compatible() => {
            let sql = format!(
                "GRANT {} ON `{}`.* TO '{}'@'%';",
                privileges,
                db.name.replace('`', "``"),
                user.replace('\'', "''")
            );
            format!("mysql -u root -e {}", shell_quote(&sql))
        }
        DatabaseKind::Postgresql => {
            let sql = format!(
                "GRANT {} ON ALL TABLES IN SCHEMA public TO \"{}\";",
                privileges,
                user.replace('"', "\"\"")
            );
            format!(
                "sudo -u postgres psql -d {} -c {}",
                shell_quote(&db.name),
                shell_quote(&sql)
            )
        }
        _ => format!(
            "# grant {} on {} to {} manually",
            privileges,
            db.name.replace(['\n', '\r'], " "),
            user.replace(['\n', '\r'], " ")
        ),
    }
}
