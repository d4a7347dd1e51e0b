//! Type-erased configuration schemas.
//!
//! The store keeps one entry per logical name and cannot be generic over
//! every module's schema type. [`Schema`] captures the concrete type once at
//! registration: a decode closure (strict YAML value → validated instance),
//! and a defaults closure used to render placeholder files. Decoded values
//! travel through callbacks as [`ConfigValue`] and are downcast exactly once
//! by the consuming module.

use std::any::Any;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::loader::ConfigError;
use crate::config::validation::Validate;

/// A validated configuration instance, type-erased for transport.
pub type ConfigValue = Arc<dyn Any + Send + Sync>;

/// Downcast a stored configuration to its concrete schema type.
pub fn downcast_config<T: Send + Sync + 'static>(value: &ConfigValue) -> Option<Arc<T>> {
    Arc::clone(value).downcast::<T>().ok()
}

/// Decode-and-validate bundle built once per concrete schema type.
#[derive(Clone)]
pub struct Schema {
    decode: Arc<dyn Fn(serde_yaml::Value) -> Result<ConfigValue, ConfigError> + Send + Sync>,
    defaults: Arc<dyn Fn() -> Result<String, serde_yaml::Error> + Send + Sync>,
}

impl Schema {
    /// Build a schema for `T`.
    ///
    /// Decoding is strict: schema types carry `#[serde(deny_unknown_fields)]`
    /// so a file with a field absent from `T` is rejected. Validation runs on
    /// every decode and reports all violations at once.
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Serialize + Validate + Default + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(|raw| {
                let value: T = serde_yaml::from_value(raw).map_err(ConfigError::Decode)?;
                let violations = value.validate();
                if !violations.is_empty() {
                    return Err(ConfigError::Validation(violations));
                }
                Ok(Arc::new(value) as ConfigValue)
            }),
            defaults: Arc::new(|| serde_yaml::to_string(&T::default())),
        }
    }

    /// Decode and validate a merged YAML value.
    pub fn decode(&self, raw: serde_yaml::Value) -> Result<ConfigValue, ConfigError> {
        (self.decode)(raw)
    }

    /// Serialize the schema's default instance as YAML, for placeholders.
    pub fn defaults_yaml(&self) -> Result<String, serde_yaml::Error> {
        (self.defaults)()
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Schema { .. }")
    }
}
