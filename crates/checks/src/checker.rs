//! Checker contract and the set of four checkers an engine runs.

use crate::capability::Capabilities;
use crate::compatibility::CompatibilityChecker;
use crate::config::CheckerConfig;
use crate::connectivity::ConnectivityChecker;
use crate::dependency::DependencyChecker;
use crate::permission::PermissionChecker;
use crate::result::{
    CheckResult, CheckStatus, CompatibilityStatus, ConnectivityStatus, DependencyStatus,
    PermissionStatus,
};
use anyhow::Result;
use async_trait::async_trait;
use migcheck_descriptor::MigrationDescriptor;
use std::sync::Arc;

/// One domain validator.
///
/// Expected failures are returned as results with a failing status. An
/// `Err` (or a panic) means the checker itself broke; the engine drops its
/// contribution and keeps going.
#[async_trait]
pub trait Checker: Send + Sync {
    type Status: CheckStatus;

    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn check(&self, descriptor: &MigrationDescriptor)
        -> Result<Vec<CheckResult<Self::Status>>>;
}

/// The four checkers, one per category.
#[derive(Clone)]
pub struct CheckerSet {
    pub connectivity: Arc<dyn Checker<Status = ConnectivityStatus>>,
    pub compatibility: Arc<dyn Checker<Status = CompatibilityStatus>>,
    pub dependency: Arc<dyn Checker<Status = DependencyStatus>>,
    pub permission: Arc<dyn Checker<Status = PermissionStatus>>,
}

impl CheckerSet {
    pub fn new(
        connectivity: Arc<dyn Checker<Status = ConnectivityStatus>>,
        compatibility: Arc<dyn Checker<Status = CompatibilityStatus>>,
        dependency: Arc<dyn Checker<Status = DependencyStatus>>,
        permission: Arc<dyn Checker<Status = PermissionStatus>>,
    ) -> Self {
        Self {
            connectivity,
            compatibility,
            dependency,
            permission,
        }
    }

    /// Default checkers sharing one config and capability registry.
    pub fn standard(config: CheckerConfig, capabilities: Capabilities) -> Self {
        Self {
            connectivity: Arc::new(ConnectivityChecker::new(
                config.clone(),
                capabilities.clone(),
            )),
            compatibility: Arc::new(CompatibilityChecker::new()),
            dependency: Arc::new(DependencyChecker::new(config.clone())),
            permission: Arc::new(PermissionChecker::new(config, capabilities)),
        }
    }
}

impl Default for CheckerSet {
    fn default() -> Self {
        Self::standard(CheckerConfig::default(), Capabilities::default())
    }
}
