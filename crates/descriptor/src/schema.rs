//! JSON schema for raw migration descriptor payloads.

/// JSON Schema for a migration descriptor document.
pub const DESCRIPTOR_SCHEMA: &str = r##"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "$id": "https://migcheck.dev/schemas/descriptor.json",
  "title": "Migcheck Migration Descriptor",
  "type": "object",
  "required": ["source", "destination", "transfer_method"],
  "properties": {
    "name": { "type": ["string", "null"] },
    "source": { "$ref": "#/definitions/endpoint" },
    "destination": { "$ref": "#/definitions/endpoint" },
    "transfer_method": {
      "type": "string",
      "enum": ["rsync", "sftp", "scp", "ftp", "cloud_storage", "local"]
    },
    "options": {
      "type": "object",
      "properties": {
        "maintenance_mode": { "type": "boolean" },
        "backup_before": { "type": "boolean" },
        "verify_after": { "type": "boolean" },
        "rollback_on_failure": { "type": "boolean" }
      }
    }
  },
  "definitions": {
    "port": { "type": ["integer", "null"], "minimum": 1, "maximum": 65535 },
    "auth": {
      "type": ["object", "null"],
      "required": ["username"],
      "properties": {
        "username": { "type": "string", "minLength": 1 },
        "password": { "type": ["string", "null"] },
        "key_path": { "type": ["string", "null"] },
        "host": { "type": ["string", "null"] },
        "port": { "$ref": "#/definitions/port" }
      }
    },
    "endpoint": {
      "type": "object",
      "required": ["kind"],
      "properties": {
        "kind": {
          "type": "string",
          "enum": [
            "wordpress", "drupal", "joomla", "magento", "laravel", "django",
            "flask", "rails", "nodejs", "static_site", "docker", "custom"
          ]
        },
        "host": { "type": ["string", "null"] },
        "port": { "$ref": "#/definitions/port" },
        "version": { "type": ["string", "null"] },
        "database": {
          "type": ["object", "null"],
          "required": ["kind", "name"],
          "properties": {
            "kind": {
              "type": "string",
              "enum": ["mysql", "mariadb", "postgresql", "sqlite", "mongodb", "redis"]
            },
            "host": { "type": "string" },
            "port": { "$ref": "#/definitions/port" },
            "username": { "type": ["string", "null"] },
            "password": { "type": ["string", "null"] },
            "name": { "type": "string", "minLength": 1 },
            "version": { "type": ["string", "null"] }
          }
        },
        "cloud": {
          "type": ["object", "null"],
          "required": ["provider", "region"],
          "properties": {
            "provider": { "type": "string", "enum": ["aws", "gcp", "azure"] },
            "region": { "type": "string", "minLength": 1 },
            "access_key": { "type": ["string", "null"] },
            "secret_key": { "type": ["string", "null"] },
            "bucket": { "type": ["string", "null"] }
          }
        },
        "paths": {
          "type": ["object", "null"],
          "properties": {
            "root": { "type": ["string", "null"] },
            "web_root": { "type": ["string", "null"] },
            "config": { "type": ["string", "null"] },
            "backup": { "type": ["string", "null"] }
          }
        },
        "ssh": { "$ref": "#/definitions/auth" },
        "ftp": { "$ref": "#/definitions/auth" }
      }
    }
  }
}"##;

/// Get the descriptor schema as a parsed JSON value.
pub fn descriptor_schema() -> serde_json::Value {
    serde_json::from_str(DESCRIPTOR_SCHEMA).expect("Invalid descriptor schema")
}
