//! Runtime registry of database driver probes.
//!
//! Driver availability is a query against [`Capabilities`], never a
//! compile-time switch. The default registry is empty, so checkers fall back
//! to TCP-level probing.

use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::{DatabaseConfig, DatabaseKind, Side};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Driver-backed probe for one database kind.
#[async_trait]
pub trait DatabaseProbe: Send + Sync {
    /// Log in with the configured credentials.
    async fn authenticate(&self, config: &DatabaseConfig) -> Result<()>;

    /// Privileges held by the configured user, upper-cased (e.g. "SELECT").
    async fn privileges(&self, config: &DatabaseConfig) -> Result<Vec<String>>;
}

/// Registered probes keyed by database kind.
#[derive(Clone, Default)]
pub struct Capabilities {
    probes: HashMap<DatabaseKind, Arc<dyn DatabaseProbe>>,
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the probe for a kind.
    pub fn register(&mut self, kind: DatabaseKind, probe: Arc<dyn DatabaseProbe>) -> &mut Self {
        self.probes.insert(kind, probe);
        self
    }

    pub fn probe(&self, kind: DatabaseKind) -> Option<Arc<dyn DatabaseProbe>> {
        self.probes.get(&kind).cloned()
    }

    pub fn is_available(&self, kind: DatabaseKind) -> bool {
        self.probes.contains_key(&kind)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.probes.keys().collect();
        kinds.sort();
        f.debug_struct("Capabilities").field("probes", &kinds).finish()
    }
}

/// Privileges a migration needs on one side.
pub fn required_privileges(side: Side) -> &'static [&'static str] {
    match side {
        Side::Source => &["SELECT"],
        Side::Destination => &["CREATE", "INSERT", "ALTER", "DROP"],
    }
}

/// How much of `required` is covered by `granted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeCoverage {
    All,
    Some { missing: Vec<String> },
    None,
}

/// Compare granted privileges against the ones required. `ALL` or
/// `ALL PRIVILEGES` covers everything.
pub fn privilege_coverage(granted: &[String], required: &[&str]) -> PrivilegeCoverage {
    let granted: Vec<String> = granted.iter().map(|p| p.trim().to_uppercase()).collect();
    if granted.iter().any(|p| p == "ALL" || p == "ALL PRIVILEGES") {
        return PrivilegeCoverage::All;
    }

    let missing: Vec<String> = required
        .iter()
        .filter(|r| !granted.iter().any(|g| g == *r))
        .map(|r| r.to_string())
        .collect();

    if missing.is_empty() {
        PrivilegeCoverage::All
    } else if missing.len() == required.len() {
        PrivilegeCoverage::None
    } else {
        PrivilegeCoverage::Some { missing }
    }
}
