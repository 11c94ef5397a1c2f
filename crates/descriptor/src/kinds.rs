//! Enumerated kinds used by migration endpoints.

use migcheck_common::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform running on one side of a migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemKind {
    Wordpress,
    Drupal,
    Joomla,
    Magento,
    Laravel,
    Django,
    Flask,
    Rails,
    Nodejs,
    StaticSite,
    Docker,
    Custom,
}

/// Runtime family a platform belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformFamily {
    Php,
    Python,
    Ruby,
    Node,
    Static,
    Container,
    Other,
}

impl SystemKind {
    pub const ALL: [SystemKind; 12] = [
        SystemKind::Wordpress,
        SystemKind::Drupal,
        SystemKind::Joomla,
        SystemKind::Magento,
        SystemKind::Laravel,
        SystemKind::Django,
        SystemKind::Flask,
        SystemKind::Rails,
        SystemKind::Nodejs,
        SystemKind::StaticSite,
        SystemKind::Docker,
        SystemKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemKind::Wordpress => "wordpress",
            SystemKind::Drupal => "drupal",
            SystemKind::Joomla => "joomla",
            SystemKind::Magento => "magento",
            SystemKind::Laravel => "laravel",
            SystemKind::Django => "django",
            SystemKind::Flask => "flask",
            SystemKind::Rails => "rails",
            SystemKind::Nodejs => "nodejs",
            SystemKind::StaticSite => "static_site",
            SystemKind::Docker => "docker",
            SystemKind::Custom => "custom",
        }
    }

    pub fn family(&self) -> PlatformFamily {
        match self {
            SystemKind::Wordpress
            | SystemKind::Drupal
            | SystemKind::Joomla
            | SystemKind::Magento
            | SystemKind::Laravel => PlatformFamily::Php,
            SystemKind::Django | SystemKind::Flask => PlatformFamily::Python,
            SystemKind::Rails => PlatformFamily::Ruby,
            SystemKind::Nodejs => PlatformFamily::Node,
            SystemKind::StaticSite => PlatformFamily::Static,
            SystemKind::Docker => PlatformFamily::Container,
            SystemKind::Custom => PlatformFamily::Other,
        }
    }

    /// Content-managed platforms whose data model is tied to the product.
    pub fn is_cms(&self) -> bool {
        matches!(
            self,
            SystemKind::Wordpress | SystemKind::Drupal | SystemKind::Joomla | SystemKind::Magento
        )
    }
}

impl fmt::Display for SystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SystemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "node" | "node_js" => return Ok(SystemKind::Nodejs),
            "static" => return Ok(SystemKind::StaticSite),
            _ => {}
        }
        SystemKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| Error::unknown("system kind", s))
    }
}

/// Database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Mysql,
    Mariadb,
    Postgresql,
    Sqlite,
    Mongodb,
    Redis,
}

/// Storage model of a database engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatabaseFamily {
    Relational,
    Document,
    KeyValue,
}

impl DatabaseKind {
    pub const ALL: [DatabaseKind; 6] = [
        DatabaseKind::Mysql,
        DatabaseKind::Mariadb,
        DatabaseKind::Postgresql,
        DatabaseKind::Sqlite,
        DatabaseKind::Mongodb,
        DatabaseKind::Redis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseKind::Mysql => "mysql",
            DatabaseKind::Mariadb => "mariadb",
            DatabaseKind::Postgresql => "postgresql",
            DatabaseKind::Sqlite => "sqlite",
            DatabaseKind::Mongodb => "mongodb",
            DatabaseKind::Redis => "redis",
        }
    }

    /// Well-known server port. SQLite is file based and has none.
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseKind::Mysql | DatabaseKind::Mariadb => Some(3306),
            DatabaseKind::Postgresql => Some(5432),
            DatabaseKind::Sqlite => None,
            DatabaseKind::Mongodb => Some(27017),
            DatabaseKind::Redis => Some(6379),
        }
    }

    pub fn family(&self) -> DatabaseFamily {
        match self {
            DatabaseKind::Mysql
            | DatabaseKind::Mariadb
            | DatabaseKind::Postgresql
            | DatabaseKind::Sqlite => DatabaseFamily::Relational,
            DatabaseKind::Mongodb => DatabaseFamily::Document,
            DatabaseKind::Redis => DatabaseFamily::KeyValue,
        }
    }

    /// MySQL and MariaDB share a wire protocol and dump format.
    pub fn is_mysql_compatible(&self) -> bool {
        matches!(self, DatabaseKind::Mysql | DatabaseKind::Mariadb)
    }
}

impl fmt::Display for DatabaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mysql" => Ok(DatabaseKind::Mysql),
            "mariadb" => Ok(DatabaseKind::Mariadb),
            "postgresql" | "postgres" | "pg" => Ok(DatabaseKind::Postgresql),
            "sqlite" | "sqlite3" => Ok(DatabaseKind::Sqlite),
            "mongodb" | "mongo" => Ok(DatabaseKind::Mongodb),
            "redis" => Ok(DatabaseKind::Redis),
            _ => Err(Error::unknown("database kind", s)),
        }
    }
}

/// Cloud provider hosting an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    Aws,
    Gcp,
    Azure,
}

impl CloudProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudProvider::Aws => "aws",
            CloudProvider::Gcp => "gcp",
            CloudProvider::Azure => "azure",
        }
    }

    /// Public storage endpoint used for reachability probes.
    pub fn storage_endpoint(&self, region: &str) -> String {
        match self {
            CloudProvider::Aws => format!("https://s3.{}.amazonaws.com", region),
            CloudProvider::Gcp => "https://storage.googleapis.com".to_string(),
            CloudProvider::Azure => "https://management.azure.com".to_string(),
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aws" | "amazon" => Ok(CloudProvider::Aws),
            "gcp" | "google" => Ok(CloudProvider::Gcp),
            "azure" => Ok(CloudProvider::Azure),
            _ => Err(Error::unknown("cloud provider", s)),
        }
    }
}

/// How files are moved between source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMethod {
    Rsync,
    Sftp,
    Scp,
    Ftp,
    CloudStorage,
    Local,
}

impl TransferMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferMethod::Rsync => "rsync",
            TransferMethod::Sftp => "sftp",
            TransferMethod::Scp => "scp",
            TransferMethod::Ftp => "ftp",
            TransferMethod::CloudStorage => "cloud_storage",
            TransferMethod::Local => "local",
        }
    }

    /// Methods that tunnel over SSH on both ends.
    pub fn needs_ssh(&self) -> bool {
        matches!(
            self,
            TransferMethod::Rsync | TransferMethod::Sftp | TransferMethod::Scp
        )
    }
}

impl fmt::Display for TransferMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "rsync" => Ok(TransferMethod::Rsync),
            "sftp" => Ok(TransferMethod::Sftp),
            "scp" => Ok(TransferMethod::Scp),
            "ftp" => Ok(TransferMethod::Ftp),
            "cloud_storage" | "cloud" => Ok(TransferMethod::CloudStorage),
            "local" | "direct" => Ok(TransferMethod::Local),
            _ => Err(Error::unknown("transfer method", s)),
        }
    }
}
