//! Common types for kvstash
//!
//! This crate holds the pieces shared by every kvstash component: the
//! error taxonomy, the validated key type, and the configuration
//! structures consumed by the options resolver and the backend plugins.

pub mod config;
pub mod error;
pub mod types;

pub use config::{BackendConfig, KvOptions, OptionsBundle};
pub use error::{Error, Result};
pub use types::{Key, KeyError};
