//! Configuration loading from disk.
//!
//! Layered YAML: a base file in the defaults directory merged with an
//! optional `MERGE.`-prefixed override in the overrides directory. The
//! override wins at every leaf, nested mappings merge key-by-key, and the
//! merged result is decoded strictly into the registered schema.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

use crate::config::schema::{ConfigValue, Schema};
use crate::config::validation::{format_violations, ValidationError};

/// File extension of all configuration files.
pub const EXTENSION: &str = ".yaml";

/// File-name prefix marking override files in the overrides directory.
pub const OVERRIDE_PREFIX: &str = "MERGE.";

/// Quiet period after the last filesystem event before a reload fires.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

const PLACEHOLDER_HEADER: &str = "\
# Generated placeholder configuration.
# Fill in the values below and restart the agent to activate the module.
";

/// Error type for the configuration subsystem.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration {0:?} is already registered")]
    AlreadyRegistered(String),

    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("base file was missing; placeholder created at {}", .path.display())]
    PlaceholderCreated { path: PathBuf },

    #[error("file name {0:?} escapes the configured config directories")]
    OutsideRoots(String),

    #[error("parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("strict decode failed (check for unknown fields): {0}")]
    Decode(#[source] serde_yaml::Error),

    #[error("validation failed: {}", format_violations(.0))]
    Validation(Vec<ValidationError>),

    #[error("serialize configuration: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("filesystem watcher: {0}")]
    Watch(#[from] notify::Error),
}

/// Join `file` onto `root`, rejecting names that would escape the root.
///
/// Config paths are always built from a directory plus a bare file name, so
/// containment means the name resolves to exactly one normal path component.
pub fn join_contained(root: &Path, file: &str) -> Result<PathBuf, ConfigError> {
    let candidate = Path::new(file);
    let mut components = candidate.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(root.join(file)),
        _ => Err(ConfigError::OutsideRoots(file.to_string())),
    }
}

/// Derive the logical configuration name from a changed file path.
///
/// Returns `None` for paths that are not configuration files. The override
/// prefix is stripped so base and override files map to the same name.
pub fn logical_name(path: &Path) -> Option<String> {
    let file = path.file_name()?.to_str()?;
    let stem = file.strip_suffix(EXTENSION)?;
    let stem = stem.strip_prefix(OVERRIDE_PREFIX).unwrap_or(stem);
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}

/// Recursively merge `overrides` onto `base`.
///
/// Nested mappings merge key-by-key; every other value kind replaces the
/// base value wholesale. Merging a mapping with itself is a no-op.
pub fn deep_merge(base: &mut Mapping, overrides: &Mapping) {
    for (key, value) in overrides {
        match (base.get_mut(key), value) {
            (Some(Value::Mapping(base_map)), Value::Mapping(override_map)) => {
                deep_merge(base_map, override_map);
            }
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Load, merge, and strictly decode one logical configuration.
///
/// When the base file does not exist and `create_placeholder` is set, a
/// commented placeholder rendered from the schema defaults is written in its
/// place and [`ConfigError::PlaceholderCreated`] is returned. An unreadable
/// override file is logged and skipped so bad overrides cannot take down a
/// module that has working defaults.
pub fn load_merged(
    defaults_dir: &Path,
    overrides_dir: &Path,
    name: &str,
    schema: &Schema,
    create_placeholder: bool,
) -> Result<ConfigValue, ConfigError> {
    let base_path = join_contained(defaults_dir, &format!("{name}{EXTENSION}"))?;
    let override_path = join_contained(overrides_dir, &format!("{OVERRIDE_PREFIX}{name}{EXTENSION}"))?;

    if create_placeholder && !base_path.exists() {
        write_placeholder(&base_path, schema)?;
        return Err(ConfigError::PlaceholderCreated { path: base_path });
    }

    tracing::debug!(path = %base_path.display(), "reading base configuration file");
    let mut merged = read_yaml_map(&base_path)?;

    if override_path.exists() {
        match read_yaml_map(&override_path) {
            Ok(overrides) => {
                tracing::debug!(config = %name, "applying override deep merge");
                deep_merge(&mut merged, &overrides);
            }
            Err(e) => {
                tracing::warn!(
                    path = %override_path.display(),
                    error = %e,
                    "failed to read override file, using defaults only"
                );
            }
        }
    } else {
        tracing::debug!(config = %name, "no override file found, using defaults");
    }

    schema.decode(Value::Mapping(merged))
}

/// Read a YAML file into a generic key-ordered mapping.
fn read_yaml_map(path: &Path) -> Result<Mapping, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_placeholder(path: &Path, schema: &Schema) -> Result<(), ConfigError> {
    let body = schema.defaults_yaml().map_err(ConfigError::Serialize)?;
    let content = format!("{PLACEHOLDER_HEADER}{body}");
    fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::warn!(path = %path.display(), "placeholder configuration file created");
    Ok(())
}
