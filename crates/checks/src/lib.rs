//! Migcheck checkers - connectivity, compatibility, dependency and
//! permission probes for one migration.
//!
//! Every checker implements [`Checker`] and reports expected failures
//! (unreachable host, missing tool, denied path) as [`CheckResult`]s
//! with a failing status. `Err` is reserved for genuinely unexpected
//! conditions; the engine isolates those per checker.

pub mod capability;
pub mod checker;
pub mod compatibility;
pub mod config;
pub mod connectivity;
pub mod dependency;
pub mod executor;
pub mod permission;
pub mod result;
pub mod version;

pub use capability::{Capabilities, DatabaseProbe};
pub use checker::{Checker, CheckerSet};
pub use config::CheckerConfig;
pub use result::{
    Category, CheckResult, CheckStatus, CompatibilityResult, CompatibilityStatus,
    ConnectivityResult, ConnectivityStatus, DependencyKind, DependencyResult, DependencyStatus,
    PermissionResult, PermissionStatus,
};
