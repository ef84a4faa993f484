// SPDX-License-Identifier: MIT

//! Stateless predicates over files: existence, size bounds, and JSON Schema
//! conformance. Callers translate a `false`/`Err` into a retry or a
//! terminal error; validators never mutate anything.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid schema in {path}: {source}")]
    Schema {
        path: String,
        #[source]
        source: jsonschema::ValidationError<'static>,
    },
}

/// True iff a regular file exists at `path`.
pub fn file_exists(path: &Path) -> bool {
    path.is_file()
}

/// True iff `path` is a regular file whose size lies in `[min_size,
/// max_size]` (`max_size` optional).
pub fn file_size(path: &Path, min_size: u64, max_size: Option<u64>) -> bool {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            let size = meta.len();
            size >= min_size && max_size.is_none_or(|max| size <= max)
        }
        _ => false,
    }
}

/// `file_size` with `min_size = 1`.
pub fn not_empty(path: &Path) -> bool {
    file_size(path, 1, None)
}

/// Validate `data_path` as a JSON document against the JSON Schema at
/// `schema_path`. `strict` additionally forbids properties beyond those
/// declared in an object schema that doesn't already pin down
/// `additionalProperties`. Fails (returns `Err`, not `Ok(false)`) when
/// either file is missing or malformed; returns `Ok(false)` only for a
/// genuine schema mismatch.
pub fn json_schema(data_path: &Path, schema_path: &Path, strict: bool) -> Result<bool, ValidatorError> {
    let data_raw = fs::read_to_string(data_path).map_err(|source| ValidatorError::Read {
        path: data_path.display().to_string(),
        source,
    })?;
    let instance: Value = serde_json::from_str(&data_raw).map_err(|source| ValidatorError::Json {
        path: data_path.display().to_string(),
        source,
    })?;

    let schema_raw = fs::read_to_string(schema_path).map_err(|source| ValidatorError::Read {
        path: schema_path.display().to_string(),
        source,
    })?;
    let mut schema: Value = serde_json::from_str(&schema_raw).map_err(|source| ValidatorError::Json {
        path: schema_path.display().to_string(),
        source,
    })?;

    if strict {
        if let Value::Object(map) = &mut schema {
            if map.get("type").and_then(Value::as_str) == Some("object")
                && map.contains_key("properties")
                && !map.contains_key("additionalProperties")
            {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
        }
    }

    let validator = jsonschema::validator_for(&schema).map_err(|source| ValidatorError::Schema {
        path: schema_path.display().to_string(),
        source,
    })?;

    Ok(validator.is_valid(&instance))
}

/// A declared `validator_config` for a step's output(s), as carried by a
/// task declaration's `validator` field. Dispatches to the stateless
/// predicates above; used by [`crate::step::ValidatedStep`] to override a
/// step's default "no validator ⇒ pass" behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorConfig {
    FileExists,
    NotEmpty,
    FileSize {
        min_size: u64,
        #[serde(default)]
        max_size: Option<u64>,
    },
    JsonSchema {
        schema_path: PathBuf,
        #[serde(default = "default_strict")]
        strict: bool,
    },
}

fn default_strict() -> bool {
    true
}

impl ValidatorConfig {
    /// Apply this validator to one output path.
    pub fn check(&self, path: &Path) -> Result<bool, ValidatorError> {
        match self {
            ValidatorConfig::FileExists => Ok(file_exists(path)),
            ValidatorConfig::NotEmpty => Ok(not_empty(path)),
            ValidatorConfig::FileSize { min_size, max_size } => {
                Ok(file_size(path, *min_size, *max_size))
            }
            ValidatorConfig::JsonSchema { schema_path, strict } => {
                json_schema(path, schema_path, *strict)
            }
        }
    }
}

#[cfg(test)]
#[path = "validators_tests.rs"]
mod tests;
