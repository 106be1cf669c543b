//! LDAP directory-tree backend
//!
//! Stores keys in a directory-service subtree, one subtree per
//! instance:
//!
//! ```text
//! <base_dn>
//! └── ou=instances
//!     └── ou=<instance id>
//!         └── <key-path>, one ou= node per folder segment
//! ```
//!
//! Folder segments are organizationalUnit entries; the terminal leaf
//! for a key is a `kvstashEntry` carrying the key name and the
//! serialized envelope text:
//!
//! ```text
//! dn: kvstashKey=<leaf>,ou=<...>,ou=<id>,ou=instances,<base_dn>
//! objectClass: kvstashEntry
//! kvstashKey: <leaf>
//! kvstashJsonValue: <envelope text>
//! ```
//!
//! Every operation shells to the openldap client utilities
//! (ldapsearch, ldapadd, ldapmodify, ldapdelete) with bind credentials
//! read from a password file, never passed inline. The directory
//! server arbitrates concurrent writers; a "server busy" exit gets a
//! bounded retry with backoff, and expected conditions ("no such
//! object", "already exists") are handled from the exit status, never
//! by scraping logs.

use crate::plugin::{BackendFactory, KvBackend, RawListing};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use kvstash_common::{BackendConfig, Error, Result};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Default root DN of the kvstash tree
const DEFAULT_BASE_DN: &str = "ou=kvstash,o=kvstash";

/// Default bind DN for kvstash administration
const DEFAULT_ADMIN_DN: &str = "cn=Directory_Manager";

/// Default number of retries when the server reports it is busy
const DEFAULT_RETRIES: u32 = 1;

/// Network timeout handed to the ldap utilities
const NET_TIMEOUT_SECONDS: u64 = 20;

/// Base delay between busy retries; grows linearly per attempt
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Attribute naming a key leaf
const ATTR_KEY: &str = "kvstashKey";

/// Attribute carrying the serialized envelope
const ATTR_VALUE: &str = "kvstashJsonValue";

/// Object class of a key/value leaf entry
const OBJECT_CLASS_ENTRY: &str = "kvstashEntry";

// ldap utility exit statuses the protocol branches on
const LDAP_SUCCESS: i32 = 0;
const LDAP_NO_SUCH_OBJECT: i32 = 32;
const LDAP_SERVER_BUSY: i32 = 51;
const LDAP_ALREADY_EXISTS: i32 = 68;

#[derive(Debug, Default, Deserialize)]
struct LdapSettings {
    ldap_uri: Option<String>,
    base_dn: Option<String>,
    admin_dn: Option<String>,
    admin_pw_file: Option<PathBuf>,
    enable_tls: Option<bool>,
    tls_cert: Option<PathBuf>,
    tls_key: Option<PathBuf>,
    tls_cacert: Option<PathBuf>,
    retries: Option<u32>,
}

/// Factory for [`LdapBackend`] instances
pub struct LdapFactory;

impl BackendFactory for LdapFactory {
    fn backend_type(&self) -> &'static str {
        "ldap"
    }

    fn construct(&self, name: &str, config: &BackendConfig) -> Result<Arc<dyn KvBackend>> {
        Ok(Arc::new(LdapBackend::new(name, config)?))
    }
}

/// Captured result of one ldap utility invocation
#[derive(Debug)]
struct CmdOutput {
    status: i32,
    stdout: String,
    stderr: String,
}

/// Executes the ldap utilities.
///
/// A seam between the protocol logic and the real binaries, so the
/// exit-status handling can be exercised against canned outputs.
trait CommandRunner: Send + Sync {
    fn run(&self, program: &str, args: &[String], env: &[(String, String)]) -> Result<CmdOutput>;
}

/// Runner shelling to the installed openldap client utilities
struct ExecRunner;

impl CommandRunner for ExecRunner {
    fn run(&self, program: &str, args: &[String], env: &[(String, String)]) -> Result<CmdOutput> {
        let output = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::operation(format!(
                        "'{}' not found; ensure the openldap client utilities are installed",
                        program
                    ))
                } else {
                    Error::Io(e)
                }
            })?;

        Ok(CmdOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// LDAP-tree realization of the backend plugin contract
pub struct LdapBackend {
    name: String,
    /// Path prefix of this instance's subtree: `instances/<id>`
    instance_path: String,
    base_dn: String,
    /// Bind and transport arguments common to every utility call
    base_args: Vec<String>,
    /// `LDAPTLS_*` environment for the utilities
    cmd_env: Vec<(String, String)>,
    runner: Box<dyn CommandRunner>,
    retries: u32,
    /// Folders already known created in this process's lifetime.
    /// Purely an optimization: external creations are tolerated by
    /// ignoring "already exists", external deletions by purging below
    /// any removed subtree.
    existing_folders: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for LdapBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapBackend")
            .field("name", &self.name)
            .field("instance_path", &self.instance_path)
            .field("base_dn", &self.base_dn)
            .field("base_args", &self.base_args)
            .field("cmd_env", &self.cmd_env)
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

impl LdapBackend {
    /// Build an instance and verify the server is reachable.
    ///
    /// The reachability check also surfaces missing openldap client
    /// utilities. Failure is a construction error; it is not cached,
    /// so a later call retries.
    pub fn new(name: &str, config: &BackendConfig) -> Result<Self> {
        let backend = Self::from_config(name, config)?;
        match backend.exists("") {
            Ok(true) => {}
            Ok(false) => {
                return Err(Error::construction(
                    name,
                    format!("base DN {} does not exist", backend.base_dn),
                ));
            }
            Err(e) => {
                return Err(Error::construction(
                    name,
                    format!("cannot access {}: {}", backend.base_dn, e),
                ));
            }
        }

        debug!(instance = name, base_dn = %backend.base_dn, "ldap backend constructed");
        Ok(backend)
    }

    /// Parse and validate configuration without touching the server
    fn from_config(name: &str, config: &BackendConfig) -> Result<Self> {
        let settings: LdapSettings = serde_json::from_value(config.settings_value())
            .map_err(|e| Error::construction(name, format!("invalid settings: {}", e)))?;

        let Some(ldap_uri) = settings.ldap_uri else {
            return Err(Error::construction(name, "missing 'ldap_uri'"));
        };
        if !["ldap://", "ldaps://", "ldapi://"]
            .iter()
            .any(|scheme| ldap_uri.starts_with(scheme))
        {
            return Err(Error::construction(
                name,
                format!("invalid 'ldap_uri': {}", ldap_uri),
            ));
        }

        let Some(admin_pw_file) = settings.admin_pw_file else {
            return Err(Error::construction(name, "missing 'admin_pw_file'"));
        };
        if !admin_pw_file.is_file() {
            return Err(Error::construction(
                name,
                format!(
                    "configured 'admin_pw_file' {} does not exist",
                    admin_pw_file.display()
                ),
            ));
        }

        let base_dn = settings
            .base_dn
            .unwrap_or_else(|| DEFAULT_BASE_DN.to_string());
        let admin_dn = settings
            .admin_dn
            .unwrap_or_else(|| DEFAULT_ADMIN_DN.to_string());

        let enable_tls = settings
            .enable_tls
            .unwrap_or_else(|| ldap_uri.starts_with("ldaps://"));

        let mut cmd_env = Vec::new();
        let mut base_args = Vec::new();
        if enable_tls {
            let (Some(tls_cert), Some(tls_key), Some(tls_cacert)) =
                (settings.tls_cert, settings.tls_key, settings.tls_cacert)
            else {
                return Err(Error::construction(
                    name,
                    "TLS is enabled but 'tls_cert', 'tls_key', and 'tls_cacert' are not all set",
                ));
            };
            cmd_env.push(("LDAPTLS_CERT".to_string(), tls_cert.display().to_string()));
            cmd_env.push(("LDAPTLS_KEY".to_string(), tls_key.display().to_string()));
            cmd_env.push(("LDAPTLS_CACERT".to_string(), tls_cacert.display().to_string()));

            // an ldap:// URI with TLS enabled means StartTLS
            if ldap_uri.starts_with("ldap://") {
                base_args.push("-ZZ".to_string());
            }
        }
        base_args.extend(
            ["-x", "-D", &admin_dn, "-y"]
                .iter()
                .map(|s| (*s).to_string()),
        );
        base_args.push(admin_pw_file.display().to_string());
        base_args.push("-H".to_string());
        base_args.push(ldap_uri);

        // name is "<type>/<id>"; the subtree is keyed by the id alone
        let instance_path = format!("instances/{}", config.id);

        Ok(Self {
            name: name.to_string(),
            instance_path,
            base_dn,
            base_args,
            cmd_env,
            runner: Box::new(ExecRunner),
            retries: settings.retries.unwrap_or(DEFAULT_RETRIES),
            existing_folders: Mutex::new(HashSet::new()),
        })
    }

    fn full_path(&self, key: &str) -> String {
        format!("{}/{}", self.instance_path, key)
    }

    fn dn_for(&self, path: &str, leaf_is_key: bool) -> String {
        path_to_dn(&self.base_dn, path, leaf_is_key)
    }

    /// Run one ldap utility with the bind arguments prepended
    fn run(&self, program: &str, args: &[String]) -> Result<CmdOutput> {
        debug!(instance = %self.name, program, "executing ldap command");
        let mut full_args = self.base_args.clone();
        full_args.extend_from_slice(args);
        self.runner.run(program, &full_args, &self.cmd_env)
    }

    fn run_with_retry(&self, program: &str, args: &[String]) -> Result<CmdOutput> {
        with_busy_retry(self.retries, || self.run(program, args))
    }

    /// Search options common to every ldapsearch invocation
    fn search_args(&self, dn: &str, scope: &str) -> Vec<String> {
        vec![
            "-b".to_string(),
            dn.to_string(),
            "-o".to_string(),
            "ldif-wrap=no".to_string(),
            "-o".to_string(),
            format!("nettimeout={}", NET_TIMEOUT_SECONDS),
            "-LLL".to_string(),
            "-s".to_string(),
            scope.to_string(),
        ]
    }

    /// Run ldapadd or ldapmodify with LDIF supplied through a scratch
    /// file; the LDIF may carry values, so it never goes on a command
    /// line
    fn run_ldif(&self, program: &str, ldif: &str) -> Result<CmdOutput> {
        let mut ldif_file = tempfile::NamedTempFile::new()?;
        ldif_file.write_all(ldif.as_bytes())?;
        ldif_file.flush()?;

        let args = vec![
            "-f".to_string(),
            ldif_file.path().display().to_string(),
        ];
        self.run_with_retry(program, &args)
    }

    /// Ensure every folder along `folder_path` exists, skipping those
    /// already known created. Adds are idempotent: a folder created
    /// externally in the meantime reports "already exists" and counts
    /// as success.
    fn ensure_folder_path(&self, folder_path: &str) -> Result<()> {
        let mut partial = String::new();
        for segment in folder_path.split('/').filter(|s| !s.is_empty()) {
            if !partial.is_empty() {
                partial.push('/');
            }
            partial.push_str(segment);

            if self.existing_folders.lock().contains(&partial) {
                continue;
            }

            let ldif = folder_add_ldif(&self.dn_for(&partial, false), segment);
            let out = self.run_ldif("ldapadd", &ldif)?;
            match out.status {
                LDAP_SUCCESS | LDAP_ALREADY_EXISTS => {
                    self.existing_folders.lock().insert(partial.clone());
                }
                LDAP_SERVER_BUSY => return Err(Error::ServerBusy(out.stderr.trim().to_string())),
                _ => {
                    return Err(Error::operation(format!(
                        "cannot create folder {}: {}",
                        partial,
                        out.stderr.trim()
                    )));
                }
            }
        }
        Ok(())
    }

    /// Replace the value attribute of an existing entry
    fn modify_value(&self, key: &str, value: &str) -> Result<()> {
        let dn = self.dn_for(&self.full_path(key), true);
        let out = self.run_ldif("ldapmodify", &entry_modify_ldif(&dn, value))?;
        match out.status {
            LDAP_SUCCESS => Ok(()),
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            // covers the entry being deleted out from under us
            _ => Err(Error::operation(format!(
                "modify of {} failed: {}",
                key,
                out.stderr.trim()
            ))),
        }
    }
}

impl KvBackend for LdapBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn delete(&self, key: &str) -> Result<()> {
        let dn = self.dn_for(&self.full_path(key), true);
        let out = self.run_with_retry("ldapdelete", &[dn])?;
        match out.status {
            // already absent does not need deleting
            LDAP_SUCCESS | LDAP_NO_SUCH_OBJECT => Ok(()),
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "delete of {} failed: {}",
                key,
                out.stderr.trim()
            ))),
        }
    }

    fn deletetree(&self, dir: &str) -> Result<()> {
        let full = self.full_path(dir);
        let args = vec!["-r".to_string(), self.dn_for(&full, false)];
        let out = self.run_with_retry("ldapdelete", &args)?;
        match out.status {
            LDAP_SUCCESS | LDAP_NO_SUCH_OBJECT => {
                // the cache must not claim anything under the removed
                // subtree still exists
                let mut folders = self.existing_folders.lock();
                folders.remove(&full);
                let prefix = format!("{}/", full);
                folders.retain(|path| !path.starts_with(&prefix));
                Ok(())
            }
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "folder delete of {} failed: {}",
                dir,
                out.stderr.trim()
            ))),
        }
    }

    fn exists(&self, key: &str) -> Result<bool> {
        // the key path may name a key or a folder, so match either RDN
        // at the parent's one-level scope; the empty key asks whether
        // the tree root itself exists
        let (dn, scope, filter) = if key.is_empty() {
            (self.base_dn.clone(), "base", "(objectClass=*)".to_string())
        } else {
            let full = self.full_path(key);
            let (parent, leaf) = full.rsplit_once('/').unwrap_or(("", full.as_str()));
            (
                self.dn_for(parent, false),
                "one",
                format!("(|(ou={leaf})({ATTR_KEY}={leaf}))"),
            )
        };

        let mut args = self.search_args(&dn, scope);
        args.push(filter);
        // only the dn is needed, no attributes
        args.push("1.1".to_string());

        let out = self.run_with_retry("ldapsearch", &args)?;
        match out.status {
            LDAP_SUCCESS => Ok(dn_present(&out.stdout)),
            // some part of the parent DN does not exist
            LDAP_NO_SUCH_OBJECT => Ok(false),
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "existence check of {} failed: {}",
                key,
                out.stderr.trim()
            ))),
        }
    }

    fn get(&self, key: &str) -> Result<String> {
        let dn = self.dn_for(&self.full_path(key), true);
        let args = self.search_args(&dn, "base");

        let out = self.run_with_retry("ldapsearch", &args)?;
        match out.status {
            LDAP_SUCCESS => parse_value_attribute(&out.stdout).ok_or_else(|| {
                Error::MalformedEntry {
                    key: key.to_string(),
                    detail: format!("no {} attribute in:\n{}", ATTR_VALUE, out.stdout.trim()),
                }
            }),
            LDAP_NO_SUCH_OBJECT => Err(Error::KeyNotFound(key.to_string())),
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "retrieval of {} failed: {}",
                key,
                out.stderr.trim()
            ))),
        }
    }

    fn list(&self, dir: &str) -> Result<RawListing> {
        let dn = self.dn_for(&self.full_path(dir), false);
        let args = self.search_args(&dn, "one");

        let out = self.run_with_retry("ldapsearch", &args)?;
        match out.status {
            LDAP_SUCCESS => Ok(parse_list_ldif(&out.stdout)),
            LDAP_NO_SUCH_OBJECT => Ok(RawListing::default()),
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "listing of {} failed: {}",
                dir,
                out.stderr.trim()
            ))),
        }
    }

    /// Atomic create-or-update.
    ///
    /// Anything else may be modifying the directory at the same time,
    /// so there is no point pre-checking what exists: try the add and
    /// branch on the outcome. On "already exists" the current value is
    /// fetched and compared, so an unchanged value is a no-op and the
    /// entry's modification timestamp is not bumped needlessly.
    fn put(&self, key: &str, serialized: &str) -> Result<()> {
        let full = self.full_path(key);
        let (parent, leaf) = full.rsplit_once('/').unwrap_or(("", full.as_str()));
        self.ensure_folder_path(parent)?;

        let dn = self.dn_for(&full, true);
        let out = self.run_ldif("ldapadd", &entry_add_ldif(&dn, leaf, serialized))?;
        match out.status {
            LDAP_SUCCESS => Ok(()),
            LDAP_ALREADY_EXISTS => {
                let current = self.get(key).map_err(|e| {
                    Error::operation(format!(
                        "failed to retrieve current value of {} for comparison: {}",
                        key, e
                    ))
                })?;
                if current == serialized {
                    debug!(instance = %self.name, key, "value already correct");
                    Ok(())
                } else {
                    self.modify_value(key, serialized)
                }
            }
            LDAP_SERVER_BUSY => Err(Error::ServerBusy(out.stderr.trim().to_string())),
            _ => Err(Error::operation(format!(
                "store of {} failed: {}",
                key,
                out.stderr.trim()
            ))),
        }
    }
}

/// Retry an ldap invocation while it reports "server busy", up to
/// `retries` extra attempts with linearly growing backoff
fn with_busy_retry<F>(retries: u32, mut op: F) -> Result<CmdOutput>
where
    F: FnMut() -> Result<CmdOutput>,
{
    let mut attempt = 0;
    loop {
        let out = op()?;
        if out.status == LDAP_SERVER_BUSY && attempt < retries {
            attempt += 1;
            warn!(attempt, retries, "LDAP server busy; retrying");
            thread::sleep(RETRY_BACKOFF * attempt);
            continue;
        }
        return Ok(out);
    }
}

/// Build the DN addressing `path` under `base_dn`.
///
/// Path segments nest in reverse as `ou=` components; the leaf is the
/// key attribute when addressing a key, `ou` when addressing a folder.
/// An empty path addresses the tree root itself.
fn path_to_dn(base_dn: &str, path: &str, leaf_is_key: bool) -> String {
    let mut parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some(leaf) = parts.pop() else {
        return base_dn.to_string();
    };

    let attribute = if leaf_is_key { ATTR_KEY } else { "ou" };
    let mut dn = format!("{}={}", attribute, leaf);
    for folder in parts.iter().rev() {
        dn.push_str(",ou=");
        dn.push_str(folder);
    }
    dn.push(',');
    dn.push_str(base_dn);
    dn
}

fn folder_add_ldif(dn: &str, name: &str) -> String {
    format!("dn: {dn}\nou: {name}\nobjectClass: top\nobjectClass: organizationalUnit\n")
}

fn entry_add_ldif(dn: &str, key: &str, value: &str) -> String {
    format!(
        "dn: {dn}\nobjectClass: {OBJECT_CLASS_ENTRY}\nobjectClass: top\n\
         {ATTR_KEY}: {key}\n{}\n",
        value_attr_line(value)
    )
}

fn entry_modify_ldif(dn: &str, value: &str) -> String {
    format!(
        "dn: {dn}\nchangetype: modify\nreplace: {ATTR_VALUE}\n{}\n",
        value_attr_line(value)
    )
}

/// The value attribute line, base64-armored when the text cannot be
/// carried inline
fn value_attr_line(value: &str) -> String {
    if ldif_safe(value) {
        format!("{ATTR_VALUE}: {value}")
    } else {
        format!("{ATTR_VALUE}:: {}", BASE64.encode(value))
    }
}

/// Whether a value may appear inline in LDIF: the SAFE-STRING rules
/// require ASCII with no NUL, CR, or LF, not starting with a space,
/// ':', or '<'
fn ldif_safe(value: &str) -> bool {
    if matches!(value.as_bytes().first(), Some(b' ' | b':' | b'<')) {
        return false;
    }
    value
        .bytes()
        .all(|b| b.is_ascii() && b != 0 && b != b'\r' && b != b'\n')
}

/// Whether search output contains any result entry
fn dn_present(stdout: &str) -> bool {
    stdout.lines().any(|line| line.starts_with("dn: "))
}

/// Pull the value attribute out of a base-scope search result
fn parse_value_attribute(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| attr_value(line, ATTR_VALUE))
}

/// Extract the value of an `<attr>: <value>` or `<attr>:: <base64>`
/// LDIF line.
///
/// Attribute names compare case-insensitively. The comparison is
/// byte-wise, so a line with multi-byte characters near the attribute
/// boundary never trips a char-boundary panic; ldapsearch base64-arms
/// values it considers unsafe to print inline, hence the `::` form.
fn attr_value(line: &str, attribute: &str) -> Option<String> {
    let bytes = line.as_bytes();
    let name = attribute.as_bytes();
    if bytes.len() < name.len() + 2 || !bytes[..name.len()].eq_ignore_ascii_case(name) {
        return None;
    }

    let rest = &bytes[name.len()..];
    if let Some(encoded) = rest.strip_prefix(b":: ") {
        let decoded = BASE64.decode(encoded).ok()?;
        String::from_utf8(decoded).ok()
    } else {
        rest.strip_prefix(b": ")
            .map(|value| String::from_utf8_lossy(value).into_owned())
    }
}

/// Parse a one-level-scope search into keys and sub-folders.
///
/// Result blocks are delimited by `dn:` lines and classified by object
/// class; an unparseable block is skipped and the rest of the listing
/// is still returned.
fn parse_list_ldif(stdout: &str) -> RawListing {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    for line in stdout.lines() {
        if line.starts_with("dn: ") {
            blocks.push(vec![line]);
        } else if line.trim().is_empty() {
            continue;
        } else if let Some(block) = blocks.last_mut() {
            block.push(line);
        }
    }

    let mut listing = RawListing::default();
    for block in blocks {
        let object_class = |wanted: &str| {
            block.iter().any(|line| {
                attr_value(line, "objectClass").is_some_and(|c| c.eq_ignore_ascii_case(wanted))
            })
        };

        if object_class("organizationalUnit") {
            // rdn of the block's dn line: "dn: ou=<name>,..."
            let rdn = block[0]["dn: ".len()..].split(',').next().unwrap_or("");
            if let Some(name) = rdn.strip_prefix("ou=") {
                listing.folders.push(name.to_string());
            } else {
                debug!(dn = block[0], "unexpected organizationalUnit entry; skipping");
            }
        } else if object_class(OBJECT_CLASS_ENTRY) {
            let key = block.iter().find_map(|line| attr_value(line, ATTR_KEY));
            let value = block.iter().find_map(|line| attr_value(line, ATTR_VALUE));
            match (key, value) {
                (Some(key), Some(value)) => {
                    listing.keys.insert(key, value);
                }
                _ => debug!(dn = block[0], "entry missing key or value attribute; skipping"),
            }
        } else {
            debug!(dn = block[0], "unexpected object in tree; skipping");
        }
    }
    listing
}
