//! Lenient version parsing for tool output and descriptor strings.

use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("Invalid regex"));

/// First `major[.minor[.patch]]` found in `text`, missing parts as zero.
///
/// Handles "8.0", "rsync  version 3.2.7  protocol version 31" and
/// "PostgreSQL 15.4 (Debian 15.4-1)".
pub fn parse_lenient(text: &str) -> Option<Version> {
    let caps = VERSION_PATTERN.captures(text)?;
    let part = |i: usize| {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Some(Version::new(part(1), part(2), part(3)))
}
