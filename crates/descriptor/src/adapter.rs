//! Boundary adapter: raw JSON/YAML payloads into a typed descriptor.
//!
//! Payloads are validated against [`DESCRIPTOR_SCHEMA`](crate::schema::DESCRIPTOR_SCHEMA)
//! first so callers get every violation with its location, not just the
//! first serde error.

use crate::kinds::{CloudProvider, DatabaseKind, SystemKind, TransferMethod};
use crate::migration::MigrationDescriptor;
use crate::schema;
use jsonschema::JSONSchema;
use migcheck_common::{Error, Result};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Collect every schema violation for a raw payload.
pub fn schema_violations(payload: &Value) -> Result<Vec<String>> {
    let schema_value = schema::descriptor_schema();
    let compiled = JSONSchema::compile(&schema_value)
        .map_err(|e| Error::SchemaValidation(e.to_string()))?;

    let violations = match compiled.validate(payload) {
        Ok(()) => Vec::new(),
        Err(errors) => errors
            .map(|error| format!("{} at {}", error, error.instance_path))
            .collect(),
    };
    Ok(violations)
}

/// Replace the string at `field` with its canonical spelling when `T`
/// parses it. Unparseable values stay as they are for the schema to report.
fn canonicalize<T: FromStr>(object: &mut Value, field: &str, canonical: fn(&T) -> &'static str) {
    let Some(slot) = object.get_mut(field) else {
        return;
    };
    let parsed = slot.as_str().and_then(|raw| T::from_str(raw).ok());
    if let Some(kind) = parsed {
        *slot = Value::from(canonical(&kind));
    }
}

/// Rewrite enum-valued fields so `WordPress`, `Rsync` or `cloud` parse the
/// same way `FromStr` does.
pub fn normalize_enums(payload: &mut Value) {
    canonicalize::<TransferMethod>(payload, "transfer_method", TransferMethod::as_str);
    for side in ["source", "destination"] {
        let Some(endpoint) = payload.get_mut(side) else {
            continue;
        };
        canonicalize::<SystemKind>(endpoint, "kind", SystemKind::as_str);
        if let Some(database) = endpoint.get_mut("database") {
            canonicalize::<DatabaseKind>(database, "kind", DatabaseKind::as_str);
        }
        if let Some(cloud) = endpoint.get_mut("cloud") {
            canonicalize::<CloudProvider>(cloud, "provider", CloudProvider::as_str);
        }
    }
}

/// Convert an untyped payload into a [`MigrationDescriptor`].
pub fn from_value(mut payload: Value) -> Result<MigrationDescriptor> {
    normalize_enums(&mut payload);
    let violations = schema_violations(&payload)?;
    if !violations.is_empty() {
        return Err(Error::SchemaValidation(violations.join("; ")));
    }

    let descriptor: MigrationDescriptor = serde_json::from_value(payload)
        .map_err(|e| Error::InvalidDescriptor(e.to_string()))?;
    debug!("Loaded descriptor: {}", descriptor.label());
    Ok(descriptor)
}

/// Parse and convert a JSON document.
pub fn from_json_str(content: &str) -> Result<MigrationDescriptor> {
    let payload: Value = serde_json::from_str(content)?;
    from_value(payload)
}

/// Parse and convert a YAML document.
pub fn from_yaml_str(content: &str) -> Result<MigrationDescriptor> {
    let payload: Value = serde_yaml::from_str(content)?;
    from_value(payload)
}

/// Load a descriptor file, picking the parser from the extension.
pub fn from_path(path: &Path) -> Result<MigrationDescriptor> {
    let content = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => from_yaml_str(&content),
        _ => from_json_str(&content),
    }
}
