//! Backend plugin subsystem for kvstash
//!
//! The pieces, leaves first:
//!
//! - [`codec`] encodes and decodes the value+metadata wire envelope.
//! - [`plugin`] is the contract every storage backend satisfies.
//! - [`backend`] holds the two built-in backends: a filesystem store
//!   with cross-process advisory locking, and an LDAP directory-tree
//!   store driven through the openldap client utilities.
//! - [`resolver`] merges caller options over defaults and selects the
//!   backend instance a call should use.
//! - [`adapter`] is the single entry point: it normalizes keys, owns
//!   the per-instance cache, dispatches to plugins, and applies the
//!   codec on the way in and out.

pub mod adapter;
pub mod backend;
pub mod codec;
pub mod plugin;
pub mod resolver;

pub use adapter::{KvAdapter, KvEntry, Listing};
pub use codec::KvValue;
pub use plugin::{BackendFactory, KvBackend, RawListing};
pub use resolver::resolve;

pub use kvstash_common::{BackendConfig, Error, Key, KeyError, KvOptions, OptionsBundle, Result};
