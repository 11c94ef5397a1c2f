//! Source/destination pair plus transfer options.

use crate::endpoint::MigrationEndpoint;
use crate::kinds::{DatabaseKind, TransferMethod};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the migration an endpoint is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Destination,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behaviour switches for the migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default = "enabled")]
    pub backup_before: bool,
    #[serde(default = "enabled")]
    pub verify_after: bool,
    #[serde(default = "enabled")]
    pub rollback_on_failure: bool,
}

fn enabled() -> bool {
    true
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            maintenance_mode: false,
            backup_before: true,
            verify_after: true,
            rollback_on_failure: true,
        }
    }
}

/// Input to a whole validation run. Validators never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationDescriptor {
    /// Optional label used in logs and report headers.
    #[serde(default)]
    pub name: Option<String>,
    pub source: MigrationEndpoint,
    pub destination: MigrationEndpoint,
    pub transfer_method: TransferMethod,
    #[serde(default)]
    pub options: MigrationOptions,
}

impl MigrationDescriptor {
    pub fn new(
        source: MigrationEndpoint,
        destination: MigrationEndpoint,
        transfer_method: TransferMethod,
    ) -> Self {
        Self {
            name: None,
            source,
            destination,
            transfer_method,
            options: MigrationOptions::default(),
        }
    }

    /// Both endpoints, source first.
    pub fn endpoints(&self) -> [(Side, &MigrationEndpoint); 2] {
        [
            (Side::Source, &self.source),
            (Side::Destination, &self.destination),
        ]
    }

    pub fn endpoint(&self, side: Side) -> &MigrationEndpoint {
        match side {
            Side::Source => &self.source,
            Side::Destination => &self.destination,
        }
    }

    /// Distinct database kinds on either side, in source-then-destination order.
    pub fn database_kinds(&self) -> Vec<DatabaseKind> {
        let mut kinds = Vec::new();
        for (_, endpoint) in self.endpoints() {
            if let Some(db) = &endpoint.database {
                if !kinds.contains(&db.kind) {
                    kinds.push(db.kind);
                }
            }
        }
        kinds
    }

    /// Label for logs: the configured name or "<source> -> <destination>".
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            format!(
                "{} -> {}",
                self.source.host.as_deref().unwrap_or(self.source.kind.as_str()),
                self.destination
                    .host
                    .as_deref()
                    .unwrap_or(self.destination.kind.as_str())
            )
        })
    }
}
