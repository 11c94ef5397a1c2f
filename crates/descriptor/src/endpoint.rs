//! One side of a migration.

use crate::kinds::{CloudProvider, DatabaseKind, SystemKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Port used for the plain reachability probe when none is configured.
pub const DEFAULT_HTTP_PORT: u16 = 80;
/// Default SSH port.
pub const DEFAULT_SSH_PORT: u16 = 22;
/// Default FTP control port.
pub const DEFAULT_FTP_PORT: u16 = 21;

/// Source or destination system description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationEndpoint {
    /// Platform type.
    pub kind: SystemKind,
    /// Network host. `None` means the endpoint is not network addressable.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Platform version (e.g. "6.4.2").
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub cloud: Option<CloudConfig>,
    #[serde(default)]
    pub paths: Option<PathSet>,
    #[serde(default)]
    pub ssh: Option<RemoteAuth>,
    #[serde(default)]
    pub ftp: Option<RemoteAuth>,
}

impl MigrationEndpoint {
    /// Minimal endpoint of the given kind with no connection details.
    pub fn new(kind: SystemKind) -> Self {
        Self {
            kind,
            host: None,
            port: None,
            version: None,
            database: None,
            cloud: None,
            paths: None,
            ssh: None,
            ftp: None,
        }
    }

    /// Whether the endpoint is this machine, so filesystem checks can run directly.
    pub fn is_local(&self) -> bool {
        match self.host.as_deref() {
            None => true,
            Some(host) => is_loopback(host),
        }
    }

    /// Port for the plain network reachability probe.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_HTTP_PORT)
    }

    pub fn ssh_host(&self) -> Option<&str> {
        self.ssh
            .as_ref()
            .and_then(|a| a.host.as_deref())
            .or(self.host.as_deref())
    }

    pub fn ssh_port(&self) -> u16 {
        self.ssh
            .as_ref()
            .and_then(|a| a.port)
            .unwrap_or(DEFAULT_SSH_PORT)
    }

    pub fn ftp_host(&self) -> Option<&str> {
        self.ftp
            .as_ref()
            .and_then(|a| a.host.as_deref())
            .or(self.host.as_deref())
    }

    pub fn ftp_port(&self) -> u16 {
        self.ftp
            .as_ref()
            .and_then(|a| a.port)
            .unwrap_or(DEFAULT_FTP_PORT)
    }
}

/// Whether `host` names this machine. Case and surrounding whitespace are ignored.
pub fn is_loopback(host: &str) -> bool {
    matches!(
        host.trim().to_lowercase().as_str(),
        "localhost" | "127.0.0.1" | "::1" | "[::1]"
    )
}

/// Database attached to an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub kind: DatabaseKind,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Database (schema) name, or file path for SQLite.
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

impl DatabaseConfig {
    pub fn effective_port(&self) -> Option<u16> {
        self.port.or_else(|| self.kind.default_port())
    }

    pub fn has_credentials(&self) -> bool {
        self.username.as_deref().is_some_and(|u| !u.is_empty())
    }
}

/// Cloud account hosting an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub provider: CloudProvider,
    pub region: String,
    #[serde(default)]
    pub access_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
}

impl CloudConfig {
    pub fn has_credentials(&self) -> bool {
        self.access_key.as_deref().is_some_and(|k| !k.is_empty())
            && self.secret_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Filesystem locations on an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathSet {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub web_root: Option<PathBuf>,
    #[serde(default)]
    pub config: Option<PathBuf>,
    #[serde(default)]
    pub backup: Option<PathBuf>,
}

/// SSH or FTP login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAuth {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub key_path: Option<PathBuf>,
    /// Overrides the endpoint host.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}
