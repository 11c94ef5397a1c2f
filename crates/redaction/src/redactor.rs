//! Main redactor implementation.

use crate::patterns::{self, is_sensitive_key, INLINE_ASSIGNMENT_PATTERN, URI_CREDENTIALS_PATTERN};
use crate::{hash_placeholder, REDACTED_PLACEHOLDER};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

/// Configuration for the redactor.
#[derive(Debug, Clone, Default)]
pub struct RedactorConfig {
    /// Use hash placeholders instead of generic [REDACTED].
    pub use_hash_placeholders: bool,
    /// Additional patterns to match (regex strings).
    pub additional_patterns: Vec<String>,
}

/// Result of redaction.
#[derive(Debug)]
pub struct RedactionResult {
    /// The redacted content.
    pub content: String,
    /// Statistics about what was redacted.
    pub stats: RedactionStats,
}

/// Statistics about redactions performed.
#[derive(Debug, Default, Clone)]
pub struct RedactionStats {
    /// Number of pattern-based redactions.
    pub pattern_redactions: usize,
    /// Number of sensitive key redactions.
    pub key_redactions: usize,
    /// Names of patterns that matched.
    pub matched_patterns: Vec<String>,
}

impl RedactionStats {
    /// Total number of redactions.
    pub fn total(&self) -> usize {
        self.pattern_redactions + self.key_redactions
    }
}

/// Scrubs credentials out of text and detail maps.
#[derive(Debug, Clone)]
pub struct Redactor {
    config: RedactorConfig,
    additional_patterns: Vec<Regex>,
}

impl Redactor {
    /// Create a new redactor with default configuration.
    pub fn new() -> Self {
        Self::with_config(RedactorConfig::default())
    }

    /// Create a new redactor with custom configuration.
    pub fn with_config(config: RedactorConfig) -> Self {
        let additional_patterns = config
            .additional_patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        Self {
            config,
            additional_patterns,
        }
    }

    fn placeholder(&self, original: &str) -> String {
        if self.config.use_hash_placeholders {
            hash_placeholder(original)
        } else {
            REDACTED_PLACEHOLDER.to_string()
        }
    }

    /// Redact credentials from free text.
    pub fn redact(&self, content: &str) -> RedactionResult {
        let mut stats = RedactionStats::default();
        let mut result = content.to_string();

        for (name, pattern) in patterns::whole_match_patterns() {
            result = self.replace_whole(&result, name, pattern, &mut stats);
        }
        for (index, pattern) in self.additional_patterns.iter().enumerate() {
            let name = format!("additional_{}", index);
            result = self.replace_whole(&result, &name, pattern, &mut stats);
        }

        // Keep the surrounding structure, mask only the secret part.
        result = self.replace_group(&result, "uri_credentials", &URI_CREDENTIALS_PATTERN, 2, &mut stats);
        result = self.replace_group(&result, "inline_assignment", &INLINE_ASSIGNMENT_PATTERN, 3, &mut stats);

        RedactionResult {
            content: result,
            stats,
        }
    }

    /// Convenience wrapper returning only the redacted text.
    pub fn redact_str(&self, content: &str) -> String {
        self.redact(content).content
    }

    /// Redact a key-value pair.
    pub fn redact_key_value(&self, key: &str, value: &str) -> (String, RedactionStats) {
        let mut stats = RedactionStats::default();

        if is_sensitive_key(key) && !value.is_empty() {
            stats.key_redactions += 1;
            return (self.placeholder(value), stats);
        }

        let redacted = self.redact(value);
        (redacted.content, redacted.stats)
    }

    /// Redact a JSON detail value stored under `key`, recursing into containers.
    pub fn redact_json(&self, key: &str, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact_key_value(key, s).0),
            Value::Null | Value::Bool(_) => value.clone(),
            Value::Number(_) if is_sensitive_key(key) => {
                Value::String(self.placeholder(&value.to_string()))
            }
            Value::Number(_) => value.clone(),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.redact_json(key, v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.redact_json(k, v)))
                    .collect(),
            ),
        }
    }

    /// Redact every entry of a detail map.
    pub fn redact_details(&self, details: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
        details
            .iter()
            .map(|(k, v)| (k.clone(), self.redact_json(k, v)))
            .collect()
    }

    fn replace_whole(
        &self,
        content: &str,
        name: &str,
        pattern: &Regex,
        stats: &mut RedactionStats,
    ) -> String {
        let mut hits = 0;
        let replaced = pattern.replace_all(content, |caps: &Captures| {
            hits += 1;
            self.placeholder(&caps[0])
        });
        if hits > 0 {
            trace!("Redacted {} match(es) of {}", hits, name);
            stats.pattern_redactions += hits;
            stats.matched_patterns.push(name.to_string());
        }
        replaced.into_owned()
    }

    fn replace_group(
        &self,
        content: &str,
        name: &str,
        pattern: &Regex,
        group: usize,
        stats: &mut RedactionStats,
    ) -> String {
        let mut hits = 0;
        let replaced = pattern.replace_all(content, |caps: &Captures| {
            hits += 1;
            let mut out = String::new();
            for i in 1..caps.len() {
                let part = caps.get(i).map(|m| m.as_str()).unwrap_or("");
                if i == group {
                    out.push_str(&self.placeholder(part));
                } else {
                    out.push_str(part);
                }
            }
            out
        });
        if hits > 0 {
            trace!("Redacted {} match(es) of {}", hits, name);
            stats.pattern_redactions += hits;
            stats.matched_patterns.push(name.to_string());
        }
        replaced.into_owned()
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}
