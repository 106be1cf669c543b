//! Options resolution and backend selection
//!
//! Resolution happens eagerly, before any backend is touched: caller
//! options are deep-merged over process-wide defaults, the backend to
//! use is selected, and the resulting configuration is validated. Any
//! failure here is a configuration error carrying the offending field.

use kvstash_common::{Error, Key, KvOptions, OptionsBundle, Result};
use std::collections::HashMap;

/// Selector name used when nothing more specific matches
const DEFAULT_BACKEND: &str = "default";

/// Resolve effective call options.
///
/// - `caller` fields win over `defaults`; the `backends` maps are
///   merged key-wise.
/// - `ambient_environment` is the surrounding execution environment,
///   used when neither caller nor defaults name one. An explicit empty
///   string means "global", not environment-scoped.
/// - `available_types` are the plugin types registered with the
///   adapter; selecting a config of any other type is an error.
///
/// Backend selection: an explicit `backend` option wins; otherwise, if
/// `app_id` is set, the selector whose name exactly equals the app_id,
/// else the selector with the longest name that is a prefix of the
/// app_id; otherwise `"default"`.
pub fn resolve(
    caller: &KvOptions,
    defaults: &KvOptions,
    ambient_environment: &str,
    available_types: &[&str],
) -> Result<OptionsBundle> {
    let merged = caller.merged_over(defaults);

    let environment = merged
        .environment
        .clone()
        .unwrap_or_else(|| ambient_environment.to_string());

    // the environment becomes a key prefix, so it must satisfy the key
    // rules; otherwise a value like ".." hands plugins a path escaping
    // their storage root
    if !environment.is_empty() {
        Key::new(environment.as_str()).map_err(|e| {
            Error::configuration(format!("invalid environment '{}': {}", environment, e))
        })?;
    }

    let backend = select_backend(&merged);

    let config = merged.backends.get(&backend).ok_or_else(|| {
        Error::configuration(format!("no backend configuration named '{}'", backend))
    })?;

    if config.backend_type.is_empty() {
        return Err(Error::configuration(format!(
            "backend '{}' is missing its type",
            backend
        )));
    }
    if config.id.is_empty() {
        return Err(Error::configuration(format!(
            "backend '{}' is missing its id",
            backend
        )));
    }
    if !available_types.contains(&config.backend_type.as_str()) {
        return Err(Error::configuration(format!(
            "backend '{}' has unknown type '{}'; available types: {}",
            backend,
            config.backend_type,
            available_types.join(", ")
        )));
    }

    // Two selector names pointing at the same (type, id) pair would
    // silently share one instance; reject the ambiguity up front.
    let mut seen: HashMap<(&str, &str), &str> = HashMap::new();
    for (name, config) in &merged.backends {
        let identity = (config.backend_type.as_str(), config.id.as_str());
        if let Some(previous) = seen.insert(identity, name) {
            return Err(Error::configuration(format!(
                "backends '{}' and '{}' share the same (type, id) pair ({}, {})",
                previous, name, config.backend_type, config.id
            )));
        }
    }

    Ok(OptionsBundle {
        environment,
        backend,
        backends: merged.backends,
        softfail: merged.softfail.unwrap_or(false),
    })
}

fn select_backend(merged: &KvOptions) -> String {
    if let Some(backend) = &merged.backend {
        return backend.clone();
    }

    if let Some(app_id) = &merged.app_id {
        if merged.backends.contains_key(app_id) {
            return app_id.clone();
        }

        // longest selector name that is a prefix of the app_id;
        // "default" is the fallback, never a prefix candidate
        let best = merged
            .backends
            .keys()
            .filter(|name| name.as_str() != DEFAULT_BACKEND && app_id.starts_with(name.as_str()))
            .max_by_key(|name| name.len());
        if let Some(name) = best {
            return name.clone();
        }
    }

    DEFAULT_BACKEND.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvstash_common::BackendConfig;

    const TYPES: &[&str] = &["file", "ldap"];

    fn options_with(backends: &[(&str, BackendConfig)]) -> KvOptions {
        KvOptions {
            backends: backends
                .iter()
                .map(|(n, c)| ((*n).to_string(), c.clone()))
                .collect(),
            ..KvOptions::default()
        }
    }

    #[test]
    fn test_resolve_default_backend() {
        let defaults = options_with(&[("default", BackendConfig::new("file", "d"))]);
        let bundle = resolve(&KvOptions::default(), &defaults, "production", TYPES).unwrap();
        assert_eq!(bundle.backend, "default");
        assert_eq!(bundle.environment, "production");
        assert!(!bundle.softfail);
    }

    #[test]
    fn test_resolve_explicit_backend_wins() {
        let mut caller = options_with(&[
            ("default", BackendConfig::new("file", "d")),
            ("special", BackendConfig::new("ldap", "s")),
        ]);
        caller.backend = Some("special".into());
        caller.app_id = Some("special.ignored".into());

        let bundle = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap();
        assert_eq!(bundle.backend, "special");
    }

    #[test]
    fn test_resolve_app_id_exact_match() {
        let mut caller = options_with(&[
            ("default", BackendConfig::new("file", "d")),
            ("myapp", BackendConfig::new("file", "m")),
        ]);
        caller.app_id = Some("myapp".into());

        let bundle = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap();
        assert_eq!(bundle.backend, "myapp");
    }

    #[test]
    fn test_resolve_app_id_longest_prefix() {
        let mut caller = options_with(&[
            ("default", BackendConfig::new("file", "d")),
            ("A.B", BackendConfig::new("file", "ab")),
            ("A", BackendConfig::new("file", "a")),
        ]);
        caller.app_id = Some("A.B.C".into());

        let bundle = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap();
        assert_eq!(bundle.backend, "A.B");
    }

    #[test]
    fn test_resolve_app_id_no_match_falls_back() {
        let mut caller = options_with(&[("default", BackendConfig::new("file", "d"))]);
        caller.app_id = Some("other.app".into());

        let bundle = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap();
        assert_eq!(bundle.backend, "default");
    }

    #[test]
    fn test_resolve_environment_precedence() {
        let defaults = options_with(&[("default", BackendConfig::new("file", "d"))]);

        // explicit empty environment means global, not ambient
        let caller = KvOptions {
            environment: Some(String::new()),
            ..KvOptions::default()
        };
        let bundle = resolve(&caller, &defaults, "production", TYPES).unwrap();
        assert_eq!(bundle.environment, "");

        let bundle = resolve(&KvOptions::default(), &defaults, "production", TYPES).unwrap();
        assert_eq!(bundle.environment, "production");
    }

    #[test]
    fn test_resolve_rejects_malformed_environment() {
        let defaults = options_with(&[("default", BackendConfig::new("file", "d"))]);

        let caller = KvOptions {
            environment: Some("..".into()),
            ..KvOptions::default()
        };
        let err = resolve(&caller, &defaults, "", TYPES).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let caller = KvOptions {
            environment: Some("has space".into()),
            ..KvOptions::default()
        };
        assert!(resolve(&caller, &defaults, "", TYPES).is_err());

        // the ambient fallback is validated too
        let err = resolve(&KvOptions::default(), &defaults, "a/../b", TYPES).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_missing_config() {
        let err = resolve(&KvOptions::default(), &KvOptions::default(), "", TYPES).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_resolve_unknown_type() {
        let caller = options_with(&[("default", BackendConfig::new("consul", "d"))]);
        let err = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap_err();
        assert!(err.to_string().contains("unknown type 'consul'"));
    }

    #[test]
    fn test_resolve_missing_type_or_id() {
        let caller = options_with(&[("default", BackendConfig::new("", "d"))]);
        assert!(resolve(&caller, &KvOptions::default(), "", TYPES).is_err());

        let caller = options_with(&[("default", BackendConfig::new("file", ""))]);
        assert!(resolve(&caller, &KvOptions::default(), "", TYPES).is_err());
    }

    #[test]
    fn test_resolve_duplicate_type_id_pair() {
        let caller = options_with(&[
            ("default", BackendConfig::new("file", "same")),
            ("other", BackendConfig::new("file", "same")),
        ]);
        let err = resolve(&caller, &KvOptions::default(), "", TYPES).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("default"));
        assert!(msg.contains("other"));
        assert!(msg.contains("(file, same)"));
    }
}
