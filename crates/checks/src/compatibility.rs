//! Source/destination compatibility rules.
//!
//! Pure comparison of the two endpoints; nothing here touches the network.

use crate::checker::Checker;
use crate::result::{CompatibilityResult, CompatibilityStatus};
use crate::version::parse_lenient;
use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::{
    DatabaseConfig, DatabaseFamily, DatabaseKind, MigrationDescriptor, MigrationEndpoint, Side,
    SystemKind, TransferMethod,
};
use tracing::debug;

/// Default compatibility checker.
#[derive(Debug, Clone, Default)]
pub struct CompatibilityChecker;

impl CompatibilityChecker {
    pub fn new() -> Self {
        Self
    }

    /// Every rule, in reporting order.
    pub fn evaluate(&self, descriptor: &MigrationDescriptor) -> Vec<CompatibilityResult> {
        let source = &descriptor.source;
        let destination = &descriptor.destination;

        let mut results = vec![platform_compatibility(source.kind, destination.kind)];
        results.extend(version_compatibility(
            "Platform version",
            source.version.as_deref(),
            destination.version.as_deref(),
        ));

        if source.database.is_some() || destination.database.is_some() {
            results.push(database_compatibility(
                source.database.as_ref(),
                destination.database.as_ref(),
            ));
        }
        if let (Some(src_db), Some(dst_db)) = (&source.database, &destination.database) {
            let same_engine = src_db.kind == dst_db.kind
                || (src_db.kind.is_mysql_compatible() && dst_db.kind.is_mysql_compatible());
            if same_engine {
                results.extend(version_compatibility(
                    "Database version",
                    src_db.version.as_deref(),
                    dst_db.version.as_deref(),
                ));
            }
        }

        results.push(transfer_compatibility(descriptor));

        if let Some(result) = cloud_compatibility(source, destination) {
            results.push(result);
        }
        results
    }
}

#[async_trait]
impl Checker for CompatibilityChecker {
    type Status = CompatibilityStatus;

    fn name(&self) -> &'static str {
        "compatibility"
    }

    async fn check(&self, descriptor: &MigrationDescriptor) -> Result<Vec<CompatibilityResult>> {
        let results = self.evaluate(descriptor);
        debug!("Compatibility produced {} results", results.len());
        Ok(results)
    }
}

/// Platform pair rule.
pub fn platform_compatibility(source: SystemKind, destination: SystemKind) -> CompatibilityResult {
    const NAME: &str = "Platform compatibility";
    let pair = format!("{} -> {}", source, destination);

    let result = if source == destination {
        CompatibilityResult::new(NAME, CompatibilityStatus::Compatible, format!("Same platform ({})", source))
    } else if source == SystemKind::Custom || destination == SystemKind::Custom {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Custom platform involved ({}); compatibility cannot be verified automatically", pair),
        )
        .with_remediation("Review the application stack manually before migrating")
    } else if destination == SystemKind::Docker {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Containerizing {} requires an image that reproduces the source runtime", source),
        )
        .with_remediation(format!("Prepare a Dockerfile for the {} application", source))
    } else if source == SystemKind::StaticSite {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Static files can be served by {} but will not be managed by it", destination),
        )
    } else if source.is_cms() && destination.is_cms() {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::RequiresConversion,
            format!("Content must be converted between CMS platforms ({})", pair),
        )
        .with_remediation(format!("Use a {} to {} content migration plugin or export/import tool", source, destination))
    } else if source.family() != destination.family() || source.is_cms() != destination.is_cms() {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Incompatible,
            format!("Platforms are not compatible ({})", pair),
        )
        .with_remediation("Choose a destination running the same platform as the source")
    } else {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Different frameworks on the same runtime ({}); code changes may be needed", pair),
        )
    };

    result
        .with_detail("source", source.as_str())
        .with_detail("destination", destination.as_str())
}

/// Major-version downgrade rule. Silent unless both versions parse.
pub fn version_compatibility(
    name: &str,
    source: Option<&str>,
    destination: Option<&str>,
) -> Option<CompatibilityResult> {
    let (src_raw, dst_raw) = (source?, destination?);
    let (src, dst) = (parse_lenient(src_raw)?, parse_lenient(dst_raw)?);

    let result = if dst.major < src.major {
        CompatibilityResult::new(
            name,
            CompatibilityStatus::Warning,
            format!("Destination version {} is older than source version {}", dst_raw, src_raw),
        )
        .with_remediation(format!("Upgrade the destination to {} or later", src.major))
    } else {
        CompatibilityResult::new(
            name,
            CompatibilityStatus::Compatible,
            format!("Version {} -> {} is supported", src_raw, dst_raw),
        )
    };

    Some(
        result
            .with_detail("source_version", src_raw)
            .with_detail("destination_version", dst_raw),
    )
}

/// Database pair rule.
pub fn database_compatibility(
    source: Option<&DatabaseConfig>,
    destination: Option<&DatabaseConfig>,
) -> CompatibilityResult {
    const NAME: &str = "Database compatibility";

    let (src, dst) = match (source, destination) {
        (Some(src), None) => {
            return CompatibilityResult::new(
                NAME,
                CompatibilityStatus::Incompatible,
                format!("Source uses {} but the destination has no database configured", src.kind),
            )
            .with_detail("source", src.kind.as_str())
            .with_remediation(format!("Provision a {} database on the destination", src.kind));
        }
        (None, Some(dst)) => {
            return CompatibilityResult::new(
                NAME,
                CompatibilityStatus::Compatible,
                format!("Source has no database; destination {} will start empty", dst.kind),
            )
            .with_detail("destination", dst.kind.as_str());
        }
        (Some(src), Some(dst)) => (src.kind, dst.kind),
        (None, None) => {
            return CompatibilityResult::new(NAME, CompatibilityStatus::Compatible, "No databases involved");
        }
    };

    let result = if src == dst || (src.is_mysql_compatible() && dst.is_mysql_compatible()) {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Compatible,
            format!("{} data can be loaded into {} directly", src, dst),
        )
    } else if src.family() == DatabaseFamily::Relational && dst.family() == DatabaseFamily::Relational {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::RequiresConversion,
            format!("Schema conversion required from {} to {}", src, dst),
        )
        .with_remediation(conversion_hint(src, dst))
    } else {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Incompatible,
            format!("{} and {} use different data models", src, dst),
        )
        .with_remediation(format!("Use a {} destination database", src))
    };

    result
        .with_detail("source", src.as_str())
        .with_detail("destination", dst.as_str())
}

fn conversion_hint(source: DatabaseKind, destination: DatabaseKind) -> String {
    match (source, destination) {
        (s, DatabaseKind::Postgresql) if s.is_mysql_compatible() || s == DatabaseKind::Sqlite => {
            "Convert schema and data with pgloader before the migration".to_string()
        }
        (DatabaseKind::Postgresql, d) if d.is_mysql_compatible() => {
            "Export with pg_dump --data-only and recreate the schema for MySQL".to_string()
        }
        _ => format!("Convert the {} schema to {} before migrating data", source, destination),
    }
}

/// Transfer method against what each endpoint exposes.
pub fn transfer_compatibility(descriptor: &MigrationDescriptor) -> CompatibilityResult {
    const NAME: &str = "Transfer method";
    let method = descriptor.transfer_method;
    let mut problems = Vec::new();
    let mut fixes = Vec::new();

    match method {
        m if m.needs_ssh() => {
            for (side, endpoint) in descriptor.endpoints() {
                if !endpoint.is_local() && endpoint.ssh.is_none() {
                    problems.push(format!("{} requires SSH access to the {}", m, side));
                    fixes.push(format!("Add SSH credentials for the {} endpoint", side));
                }
            }
        }
        TransferMethod::Ftp => {
            for (side, endpoint) in descriptor.endpoints() {
                if !endpoint.is_local() && endpoint.ftp.is_none() {
                    problems.push(format!("ftp requires FTP credentials for the {}", side));
                    fixes.push(format!("Add FTP credentials for the {} endpoint", side));
                }
            }
        }
        TransferMethod::CloudStorage => {
            if descriptor.source.cloud.is_none() && descriptor.destination.cloud.is_none() {
                problems.push("cloud_storage requires a cloud account on at least one side".to_string());
                fixes.push("Add a cloud configuration to the source or destination".to_string());
            }
        }
        TransferMethod::Local => {
            for (side, endpoint) in descriptor.endpoints() {
                if !endpoint.is_local() {
                    problems.push(format!("local transfer cannot reach the remote {}", side));
                    fixes.push("Use rsync or sftp for remote endpoints".to_string());
                }
            }
        }
        _ => {}
    }

    let result = if problems.is_empty() {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Compatible,
            format!("{} is supported by both endpoints", method),
        )
    } else {
        CompatibilityResult::new(NAME, CompatibilityStatus::Incompatible, problems.join("; "))
            .with_remediation(fixes.join("; "))
    };
    result.with_detail("transfer_method", method.as_str())
}

/// Cross-provider or cross-region moves. Only when both sides are in a cloud.
pub fn cloud_compatibility(
    source: &MigrationEndpoint,
    destination: &MigrationEndpoint,
) -> Option<CompatibilityResult> {
    const NAME: &str = "Cloud compatibility";
    let (src, dst) = (source.cloud.as_ref()?, destination.cloud.as_ref()?);

    let result = if src.provider != dst.provider {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Cross-cloud transfer {} -> {} incurs egress cost and latency", src.provider, dst.provider),
        )
    } else if src.region != dst.region {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Warning,
            format!("Cross-region transfer {} -> {} on {}", src.region, dst.region, src.provider),
        )
    } else {
        CompatibilityResult::new(
            NAME,
            CompatibilityStatus::Compatible,
            format!("Same provider and region ({} {})", src.provider, src.region),
        )
    };

    Some(
        result
            .with_detail(Side::Source.as_str(), format!("{}/{}", src.provider, src.region))
            .with_detail(Side::Destination.as_str(), format!("{}/{}", dst.provider, dst.region)),
    )
}
