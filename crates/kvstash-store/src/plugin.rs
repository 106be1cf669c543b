//! Backend plugin contract
//!
//! Every storage backend implements [`KvBackend`] and registers a
//! [`BackendFactory`] with the adapter. Plugins receive keys that have
//! already been validated and environment-prefixed, and exchange values
//! as opaque serialized envelope text; the adapter owns the codec.
//!
//! Plugins never panic for expected conditions (missing key, lock
//! timeout, busy server) — those are `Err` values. Construction may
//! fail (unreachable server, uncreatable root directory); the adapter
//! does not cache that failure, so a later call retries.

use kvstash_common::{BackendConfig, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A storage backend instance, identified by `<type>/<id>`.
pub trait KvBackend: Send + Sync {
    /// The `<type>/<id>` identity of this instance
    fn name(&self) -> &str;

    /// Delete a key; deleting an absent key is success
    fn delete(&self, key: &str) -> Result<()>;

    /// Delete a key folder and everything under it; an absent folder
    /// is success
    fn deletetree(&self, dir: &str) -> Result<()>;

    /// Whether the key (or key folder) is present
    fn exists(&self, key: &str) -> Result<bool>;

    /// Retrieve the serialized envelope stored at a key
    fn get(&self, key: &str) -> Result<String>;

    /// Enumerate the immediate keys and sub-folders of a folder
    fn list(&self, dir: &str) -> Result<RawListing>;

    /// Store serialized envelope text at a key, replacing any
    /// previous value
    fn put(&self, key: &str, serialized: &str) -> Result<()>;
}

/// Constructor for a backend plugin type.
///
/// Factories are registered with the adapter at startup under the
/// string `backend_type` returns; the adapter calls `construct` at most
/// once per `(type, id)` identity for as long as construction succeeds.
pub trait BackendFactory: Send + Sync {
    /// The unique plugin type string this factory builds (e.g. "file")
    fn backend_type(&self) -> &'static str;

    /// Build an instance from its validated configuration.
    ///
    /// `name` is the `<type>/<id>` identity the instance should report
    /// from [`KvBackend::name`].
    fn construct(&self, name: &str, config: &BackendConfig) -> Result<Arc<dyn KvBackend>>;
}

/// An un-decoded folder listing as returned by a plugin.
///
/// Key values are still serialized envelope text; the adapter decodes
/// them (best-effort) before handing the listing to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawListing {
    /// Serialized envelope text per key name (name within the folder)
    pub keys: BTreeMap<String, String>,
    /// Names of immediate sub-folders
    pub folders: Vec<String>,
}
