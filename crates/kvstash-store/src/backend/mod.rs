//! Built-in storage backends

pub mod file;
pub mod ldap;

pub use file::{FileBackend, FileFactory};
pub use ldap::{LdapBackend, LdapFactory};
