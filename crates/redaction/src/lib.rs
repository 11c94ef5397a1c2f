//! Credential scrubbing for migcheck reports.
//!
//! Check messages and details routinely carry connection strings and
//! login material; everything rendered for humans goes through here first.

pub mod patterns;
pub mod redactor;

pub use redactor::{RedactionResult, RedactionStats, Redactor, RedactorConfig};

/// Default placeholder for redacted values.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

/// Hash-only placeholder (shows hash of original value).
pub const HASH_PLACEHOLDER_PREFIX: &str = "[HASH:";
pub const HASH_PLACEHOLDER_SUFFIX: &str = "]";

/// Create a hash placeholder for a value.
pub fn hash_placeholder(value: &str) -> String {
    format!(
        "{}{}{}",
        HASH_PLACEHOLDER_PREFIX,
        migcheck_common::hash::short_fingerprint(value),
        HASH_PLACEHOLDER_SUFFIX
    )
}
