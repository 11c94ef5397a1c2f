//! Migcheck engine - runs the four checkers, classifies what they found
//! and decides whether a migration can proceed.
//!
//! ```text
//! MigrationDescriptor -> Validator -> CheckerSet -> RawResults
//!                                  -> ValidationIssue list -> ValidationSummary -> Reporter
//! ```

pub mod classify;
pub mod issue;
pub mod raw;
pub mod remediation;
pub mod report;
pub mod summary;
pub mod validator;

pub use classify::Classify;
pub use issue::{RawCheck, Severity, ValidationIssue};
pub use raw::RawResults;
pub use report::{Console, ReportFormat, Reporter};
pub use summary::ValidationSummary;
pub use validator::{ExecutionMode, Validator, ValidatorConfig, NO_RESULTS_MESSAGE};
