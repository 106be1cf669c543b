//! Plugin registry and dispatch adapter
//!
//! [`KvAdapter`] is the single entry point of the core. For every
//! operation it validates the key, prefixes it with the resolved
//! environment, obtains the cached plugin instance for the selected
//! `(type, id)` — constructing it on first use under a lock so
//! concurrent first-requests never double-construct — dispatches to
//! the plugin, and applies the codec on `get` and `list`.
//!
//! An adapter is an explicitly constructed value owned by the caller
//! and passed through the call chain; there is no hidden global.

use crate::backend::file::FileFactory;
use crate::backend::ldap::LdapFactory;
use crate::codec::{self, KvValue};
use crate::plugin::{BackendFactory, KvBackend};
use crate::resolver;
use kvstash_common::{Error, Key, KvOptions, OptionsBundle, Result};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

/// A decoded value and its metadata, as returned by [`KvAdapter::get`]
#[derive(Clone, Debug, PartialEq)]
pub struct KvEntry {
    /// The stored value
    pub value: KvValue,
    /// Metadata persisted alongside the value
    pub metadata: Map<String, Value>,
}

/// A decoded folder listing, as returned by [`KvAdapter::list`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Listing {
    /// Entries per key name (name within the listed folder)
    pub keys: BTreeMap<String, KvEntry>,
    /// Names of immediate sub-folders
    pub folders: Vec<String>,
}

/// Backend plugin registry and dispatcher.
pub struct KvAdapter {
    factories: HashMap<&'static str, Box<dyn BackendFactory>>,
    // the one piece of core state shared across concurrent callers;
    // keyed by "<type>/<id>"
    instances: Mutex<HashMap<String, Arc<dyn KvBackend>>>,
}

impl KvAdapter {
    /// Create an adapter with the built-in backends (file, ldap)
    #[must_use]
    pub fn new() -> Self {
        Self::with_factories(vec![Box::new(FileFactory), Box::new(LdapFactory)])
    }

    /// Create an adapter with an explicit set of backend factories.
    ///
    /// Factories are registered under the type string each one reports.
    /// If two factories report the same type the later one wins; that
    /// is a configuration hazard, not a crash, so it is only logged.
    #[must_use]
    pub fn with_factories(factories: Vec<Box<dyn BackendFactory>>) -> Self {
        let mut registered: HashMap<&'static str, Box<dyn BackendFactory>> = HashMap::new();
        for factory in factories {
            let backend_type = factory.backend_type();
            if registered.insert(backend_type, factory).is_some() {
                warn!(backend_type, "duplicate backend plugin type; later registration wins");
            }
        }

        Self {
            factories: registered,
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Types of the registered backend plugins
    #[must_use]
    pub fn backends(&self) -> Vec<&'static str> {
        let mut types: Vec<&'static str> = self.factories.keys().copied().collect();
        types.sort_unstable();
        types
    }

    /// Resolve caller options against defaults using this adapter's
    /// registered backend types
    pub fn resolve(
        &self,
        caller: &KvOptions,
        defaults: &KvOptions,
        ambient_environment: &str,
    ) -> Result<OptionsBundle> {
        resolver::resolve(caller, defaults, ambient_environment, &self.backends())
    }

    /// Store `value` and `metadata` at `key`
    pub fn put(
        &self,
        key: &str,
        value: &KvValue,
        metadata: &Map<String, Value>,
        options: &OptionsBundle,
    ) -> Result<()> {
        let key = self.scoped_key(key, options)?;
        let serialized = codec::encode(value, metadata)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), %key, "put");
        instance.put(&key, &serialized)
    }

    /// Retrieve the value and metadata stored at `key`
    pub fn get(&self, key: &str, options: &OptionsBundle) -> Result<KvEntry> {
        let key = self.scoped_key(key, options)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), %key, "get");
        let raw = instance.get(&key)?;
        let (value, metadata) = codec::decode(&raw)?;
        Ok(KvEntry { value, metadata })
    }

    /// Whether `key` (or a key folder of that name) is present
    pub fn exists(&self, key: &str, options: &OptionsBundle) -> Result<bool> {
        let key = self.scoped_key(key, options)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), %key, "exists");
        instance.exists(&key)
    }

    /// Delete `key`; deleting an absent key is success
    pub fn delete(&self, key: &str, options: &OptionsBundle) -> Result<()> {
        let key = self.scoped_key(key, options)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), %key, "delete");
        instance.delete(&key)
    }

    /// Delete the folder `dir` and every key under it; an absent
    /// folder is success
    pub fn deletetree(&self, dir: &str, options: &OptionsBundle) -> Result<()> {
        let dir = self.scoped_key(dir, options)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), folder = %dir, "deletetree");
        instance.deletetree(&dir)
    }

    /// List the immediate keys and sub-folders of `dir`.
    ///
    /// Listing is best-effort per entry: a key whose stored envelope
    /// cannot be decoded is skipped, the rest of the listing is still
    /// returned. An absent folder is an error.
    pub fn list(&self, dir: &str, options: &OptionsBundle) -> Result<Listing> {
        let dir = self.scoped_key(dir, options)?;
        let instance = self.instance(options)?;
        debug!(backend = instance.name(), folder = %dir, "list");
        let raw = instance.list(&dir)?;

        let mut listing = Listing {
            keys: BTreeMap::new(),
            folders: raw.folders,
        };
        for (name, serialized) in raw.keys {
            match codec::decode(&serialized) {
                Ok((value, metadata)) => {
                    listing.keys.insert(name, KvEntry { value, metadata });
                }
                Err(e) => {
                    warn!(backend = instance.name(), key = %name, error = %e,
                        "skipping entry with undecodable envelope");
                }
            }
        }
        Ok(listing)
    }

    /// Validate a key and prefix it with the resolved environment.
    ///
    /// Plugins receive only validated keys, and the environment becomes
    /// part of the key, so it is held to the same rules; a bundle built
    /// without the resolver could otherwise carry an environment like
    /// `".."` that walks a plugin out of its storage root.
    fn scoped_key(&self, key: &str, options: &OptionsBundle) -> Result<String> {
        let key = Key::new(key)?;
        let environment = &options.environment;
        if !environment.is_empty() {
            Key::new(environment.as_str()).map_err(|e| {
                Error::configuration(format!("invalid environment '{}': {}", environment, e))
            })?;
        }
        Ok(key.scoped(environment))
    }

    /// Obtain the plugin instance for the selected backend,
    /// constructing and caching it on first use.
    ///
    /// The cache lock is held across construction so two concurrent
    /// first-requests for the same identity never build duplicate
    /// resource holders. A failed construction is not cached.
    fn instance(&self, options: &OptionsBundle) -> Result<Arc<dyn KvBackend>> {
        let config = options.backend_config()?;
        let factory = self
            .factories
            .get(config.backend_type.as_str())
            .ok_or_else(|| {
                Error::configuration(format!(
                    "no backend plugin registered for type '{}'",
                    config.backend_type
                ))
            })?;

        let name = config.instance_name();
        let mut instances = self.instances.lock();
        if let Some(instance) = instances.get(&name) {
            return Ok(instance.clone());
        }

        debug!(instance = %name, "constructing backend instance");
        let instance = factory.construct(&name, config)?;
        instances.insert(name, instance.clone());
        Ok(instance)
    }
}

impl Default for KvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::RawListing;
    use kvstash_common::{BackendConfig, Error};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory test backend recording what it was asked to do
    struct MemBackend {
        name: String,
        store: Mutex<BTreeMap<String, String>>,
    }

    impl KvBackend for MemBackend {
        fn name(&self) -> &str {
            &self.name
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.store.lock().remove(key);
            Ok(())
        }

        fn deletetree(&self, dir: &str) -> Result<()> {
            let prefix = format!("{}/", dir);
            self.store.lock().retain(|k, _| !k.starts_with(&prefix));
            Ok(())
        }

        fn exists(&self, key: &str) -> Result<bool> {
            Ok(self.store.lock().contains_key(key))
        }

        fn get(&self, key: &str) -> Result<String> {
            self.store
                .lock()
                .get(key)
                .cloned()
                .ok_or_else(|| Error::KeyNotFound(key.to_string()))
        }

        fn list(&self, dir: &str) -> Result<RawListing> {
            let prefix = format!("{}/", dir);
            let mut listing = RawListing::default();
            for (key, value) in self.store.lock().iter() {
                if let Some(rest) = key.strip_prefix(&prefix) {
                    if !rest.contains('/') {
                        listing.keys.insert(rest.to_string(), value.clone());
                    }
                }
            }
            Ok(listing)
        }

        fn put(&self, key: &str, serialized: &str) -> Result<()> {
            self.store
                .lock()
                .insert(key.to_string(), serialized.to_string());
            Ok(())
        }
    }

    struct MemFactory {
        constructed: Arc<AtomicUsize>,
        fail_first: AtomicUsize,
    }

    impl MemFactory {
        fn new() -> Self {
            Self {
                constructed: Arc::new(AtomicUsize::new(0)),
                fail_first: AtomicUsize::new(0),
            }
        }

        fn failing_once() -> Self {
            let factory = Self::new();
            factory.fail_first.store(1, Ordering::SeqCst);
            factory
        }
    }

    impl BackendFactory for MemFactory {
        fn backend_type(&self) -> &'static str {
            "mem"
        }

        fn construct(&self, name: &str, _config: &BackendConfig) -> Result<Arc<dyn KvBackend>> {
            if self.fail_first.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n > 0).then(|| n - 1)
            })
            .is_ok()
            {
                return Err(Error::construction(name, "transient failure"));
            }
            self.constructed.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(MemBackend {
                name: name.to_string(),
                store: Mutex::new(BTreeMap::new()),
            }))
        }
    }

    fn mem_options(environment: &str) -> OptionsBundle {
        OptionsBundle {
            environment: environment.to_string(),
            backend: "default".to_string(),
            backends: [("default".to_string(), BackendConfig::new("mem", "test"))]
                .into_iter()
                .collect(),
            softfail: false,
        }
    }

    fn mem_adapter() -> (KvAdapter, Arc<AtomicUsize>) {
        let factory = MemFactory::new();
        let constructed = factory.constructed.clone();
        (KvAdapter::with_factories(vec![Box::new(factory)]), constructed)
    }

    #[test]
    fn test_put_get_roundtrip() {
        let (adapter, _) = mem_adapter();
        let options = mem_options("prod");

        adapter
            .put("app/setting", &KvValue::from("42"), &Map::new(), &options)
            .unwrap();
        let entry = adapter.get("app/setting", &options).unwrap();
        assert_eq!(entry.value.as_str(), Some("42"));
        assert!(entry.metadata.is_empty());
    }

    #[test]
    fn test_environment_prefix_scopes_keys() {
        let (adapter, _) = mem_adapter();
        let prod = mem_options("prod");
        let global = mem_options("");

        adapter
            .put("k", &KvValue::from("prod value"), &Map::new(), &prod)
            .unwrap();

        // same instance, different namespace
        assert!(!adapter.exists("k", &global).unwrap());
        assert!(adapter.exists("k", &prod).unwrap());
    }

    #[test]
    fn test_instance_constructed_once() {
        let (adapter, constructed) = mem_adapter();
        let options = mem_options("");

        adapter
            .put("a", &KvValue::from("1"), &Map::new(), &options)
            .unwrap();
        adapter
            .put("b", &KvValue::from("2"), &Map::new(), &options)
            .unwrap();
        assert!(adapter.exists("a", &options).unwrap());
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_construction_failure_not_cached() {
        let factory = MemFactory::failing_once();
        let constructed = factory.constructed.clone();
        let adapter = KvAdapter::with_factories(vec![Box::new(factory)]);
        let options = mem_options("");

        let err = adapter.exists("a", &options).unwrap_err();
        assert!(matches!(err, Error::Construction { .. }));

        // retry succeeds once the transient failure clears
        assert!(!adapter.exists("a", &options).unwrap());
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_key_rejected_before_dispatch() {
        let (adapter, constructed) = mem_adapter();
        let options = mem_options("");

        let err = adapter.get("bad key!", &options).unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
        assert_eq!(constructed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_malformed_environment_rejected_before_dispatch() {
        let (adapter, constructed) = mem_adapter();

        // an environment of ".." would scope "escaped" to "../escaped",
        // walking the backend out of its root
        let options = mem_options("..");
        let err = adapter
            .put("escaped", &KvValue::from("x"), &Map::new(), &options)
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert_eq!(constructed.load(Ordering::SeqCst), 0);

        let options = mem_options("has space");
        assert!(adapter.exists("k", &options).is_err());
        assert!(adapter.list("k", &options).is_err());
    }

    #[test]
    fn test_unknown_backend_type() {
        let (adapter, _) = mem_adapter();
        let mut options = mem_options("");
        options
            .backends
            .insert("default".into(), BackendConfig::new("consul", "x"));

        let err = adapter.exists("a", &options).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_list_skips_undecodable_entry() {
        let (adapter, _) = mem_adapter();
        let options = mem_options("");

        adapter
            .put("app/good", &KvValue::Json(json!(1)), &Map::new(), &options)
            .unwrap();
        adapter
            .put("app/other", &KvValue::from("two"), &Map::new(), &options)
            .unwrap();

        // corrupt one entry behind the codec's back
        {
            let instance = adapter.instance(&options).unwrap();
            instance.put("app/bad", "not an envelope").unwrap();
        }

        let listing = adapter.list("app", &options).unwrap();
        assert_eq!(listing.keys.len(), 2);
        assert!(listing.keys.contains_key("good"));
        assert!(listing.keys.contains_key("other"));
        assert!(!listing.keys.contains_key("bad"));
    }

    #[test]
    fn test_delete_and_deletetree() {
        let (adapter, _) = mem_adapter();
        let options = mem_options("");

        adapter
            .put("app/a", &KvValue::from("1"), &Map::new(), &options)
            .unwrap();
        adapter
            .put("app/b", &KvValue::from("2"), &Map::new(), &options)
            .unwrap();

        adapter.delete("app/a", &options).unwrap();
        // idempotent
        adapter.delete("app/a", &options).unwrap();
        assert!(!adapter.exists("app/a", &options).unwrap());

        adapter.deletetree("app", &options).unwrap();
        assert!(!adapter.exists("app/b", &options).unwrap());
    }

    #[test]
    fn test_backends_lists_registered_types() {
        let (adapter, _) = mem_adapter();
        assert_eq!(adapter.backends(), vec!["mem"]);

        let adapter = KvAdapter::new();
        assert_eq!(adapter.backends(), vec!["file", "ldap"]);
    }
}
