//! Configuration types for kvstash
//!
//! Callers hand the options resolver a [`KvOptions`] to merge over
//! process-wide defaults; resolution produces an [`OptionsBundle`] with
//! a concrete environment and a validated backend selection.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Configuration for a single backend instance.
///
/// `type` names the plugin implementation and `id` distinguishes
/// multiple instances of the same plugin; the `(type, id)` pair must be
/// unique across all configured backends. Everything else is
/// plugin-specific and carried opaquely until the factory parses it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend plugin type (e.g. "file", "ldap")
    #[serde(rename = "type")]
    pub backend_type: String,
    /// Instance identifier, unique among instances of this type
    pub id: String,
    /// Plugin-specific settings, parsed by the backend factory
    #[serde(flatten, default)]
    pub settings: Map<String, Value>,
}

impl BackendConfig {
    /// Create a config with no plugin-specific settings
    pub fn new(backend_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            backend_type: backend_type.into(),
            id: id.into(),
            settings: Map::new(),
        }
    }

    /// Add a plugin-specific setting
    #[must_use]
    pub fn with_setting(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.settings.insert(name.into(), value.into());
        self
    }

    /// The `<type>/<id>` identity of the instance this config describes
    #[must_use]
    pub fn instance_name(&self) -> String {
        format!("{}/{}", self.backend_type, self.id)
    }

    /// Plugin-specific settings as a JSON value, for `serde_json::from_value`
    #[must_use]
    pub fn settings_value(&self) -> Value {
        Value::Object(self.settings.clone())
    }
}

/// Options supplied by a caller or configured as process-wide defaults.
///
/// Every field is optional; resolution deep-merges caller options over
/// defaults, with caller fields winning and `backends` merged key-wise.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KvOptions {
    /// Namespace prefix scoping keys; empty string means global
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    /// Explicit backend selection, overriding app_id matching
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Caller identity used for fuzzy backend selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Backend configurations by selector name
    #[serde(default)]
    pub backends: BTreeMap<String, BackendConfig>,
    /// Whether callers should substitute a benign default on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub softfail: Option<bool>,
}

impl KvOptions {
    /// Deep-merge these options over `defaults`.
    ///
    /// Scalar fields from `self` win when present; the `backends` maps
    /// are merged key-wise with entries from `self` replacing entries
    /// of the same name.
    #[must_use]
    pub fn merged_over(&self, defaults: &KvOptions) -> KvOptions {
        let mut backends = defaults.backends.clone();
        backends.extend(self.backends.clone());

        KvOptions {
            environment: self.environment.clone().or_else(|| defaults.environment.clone()),
            backend: self.backend.clone().or_else(|| defaults.backend.clone()),
            app_id: self.app_id.clone().or_else(|| defaults.app_id.clone()),
            backends,
            softfail: self.softfail.or(defaults.softfail),
        }
    }
}

/// Fully resolved call options.
///
/// Produced by the options resolver; by the time one of these exists
/// the selected backend config is known to be present and well-formed.
#[derive(Clone, Debug)]
pub struct OptionsBundle {
    /// Concrete environment namespace; empty string means global
    pub environment: String,
    /// Name of the selected entry in `backends`
    pub backend: String,
    /// Validated backend configurations
    pub backends: BTreeMap<String, BackendConfig>,
    /// Soft-fail policy flag, consumed by the calling layer
    pub softfail: bool,
}

impl OptionsBundle {
    /// The configuration of the selected backend
    pub fn backend_config(&self) -> Result<&BackendConfig> {
        self.backends.get(&self.backend).ok_or_else(|| {
            Error::configuration(format!(
                "selected backend '{}' has no configuration",
                self.backend
            ))
        })
    }
}
