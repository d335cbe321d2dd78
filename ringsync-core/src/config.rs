//! Daemon configuration.
//!
//! # File layout
//!
//! ```yaml
//! clients:
//!   - name: arch
//!     root: /bedrock/clients/arch
//! tracked:
//!   - /etc/resolv.conf
//! clients_file: /etc/ringsync/clients.conf   # optional, see [`crate::plain`]
//! tracked_file: /etc/ringsync/tracked.conf   # optional
//! replicator: copy                           # or {command: {program, args}}
//! follow_writes: false
//! ```
//!
//! # API pattern
//!
//! [`load_at`] parses the YAML document; [`MirrorConfig::resolve`] pulls in
//! any referenced plain-text files and validates everything into a
//! [`ResolvedConfig`]. Entries from files come before inline entries.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::plain;
use crate::types::{Client, ClientTable, TrackedPath, WatchList};

/// Where `ringsync` looks for its configuration when `--config` is omitted.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ringsync/ringsync.yaml";

/// Program used by [`ReplicatorKind::Command`] when none is configured.
pub const DEFAULT_COPY_PROGRAM: &str = "/bin/cp";

// ---------------------------------------------------------------------------
// 1. Document
// ---------------------------------------------------------------------------

/// An inline client entry in the YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSpec {
    pub name: String,
    pub root: String,
}

/// How file content is copied between clients.
///
/// Written as `copy` or as a `command:` table. serde_yaml's own enum
/// encoding would demand a `!command` tag, so reading goes through an
/// untagged mirror of the two forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "ReplicatorSpec")]
pub enum ReplicatorKind {
    /// In-process copy through a temporary sibling file.
    #[default]
    Copy,
    /// Spawn `program args… <source> <dest>` and wait for it.
    Command {
        #[serde(default = "default_copy_program")]
        program: PathBuf,
        #[serde(default = "default_copy_args")]
        args: Vec<String>,
    },
}

#[derive(Deserialize)]
#[serde(untagged, expecting = "`copy` or a `command:` table")]
enum ReplicatorSpec {
    Named(ReplicatorName),
    Table(CommandTable),
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum ReplicatorName {
    Copy,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandTable {
    command: CommandSpec,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CommandSpec {
    #[serde(default = "default_copy_program")]
    program: PathBuf,
    #[serde(default = "default_copy_args")]
    args: Vec<String>,
}

impl From<ReplicatorSpec> for ReplicatorKind {
    fn from(spec: ReplicatorSpec) -> Self {
        match spec {
            ReplicatorSpec::Named(ReplicatorName::Copy) => ReplicatorKind::Copy,
            ReplicatorSpec::Table(CommandTable {
                command: CommandSpec { program, args },
            }) => ReplicatorKind::Command { program, args },
        }
    }
}

fn default_copy_program() -> PathBuf {
    PathBuf::from(DEFAULT_COPY_PROGRAM)
}

fn default_copy_args() -> Vec<String> {
    vec!["-p".to_string()]
}

/// Root of the YAML configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    #[serde(default)]
    pub clients: Vec<ClientSpec>,
    #[serde(default)]
    pub tracked: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clients_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracked_file: Option<PathBuf>,
    #[serde(default)]
    pub replicator: ReplicatorKind,
    /// Propagate in-place writes as well as removals/replacements.
    #[serde(default)]
    pub follow_writes: bool,
}

/// Validated, immutable configuration handed to the reconciler and daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub clients: ClientTable,
    pub tracked: WatchList,
    pub replicator: ReplicatorKind,
    pub follow_writes: bool,
}

// ---------------------------------------------------------------------------
// 2. Load
// ---------------------------------------------------------------------------

/// Load the YAML document at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<MirrorConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse(contents: &str) -> Result<MirrorConfig, serde_yaml::Error> {
    // An empty document deserializes as unit; treat it as all defaults so the
    // later "no clients" error is the one the operator sees.
    if contents.trim().is_empty() {
        return Ok(MirrorConfig::default());
    }
    serde_yaml::from_str(contents)
}

/// Load and resolve in one step.
pub fn load_resolved_at(path: &Path) -> Result<ResolvedConfig, ConfigError> {
    load_at(path)?.resolve_relative_to(path.parent())
}

// ---------------------------------------------------------------------------
// 3. Resolve
// ---------------------------------------------------------------------------

impl MirrorConfig {
    /// Resolve with referenced files taken as-is (absolute or relative to the
    /// working directory).
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_relative_to(None)
    }

    /// Resolve, interpreting relative `clients_file` / `tracked_file` against
    /// `base` when given.
    pub fn resolve_relative_to(&self, base: Option<&Path>) -> Result<ResolvedConfig, ConfigError> {
        let locate = |file: &Path| match base {
            Some(base) if file.is_relative() => base.join(file),
            _ => file.to_path_buf(),
        };

        let mut clients = Vec::new();
        if let Some(file) = &self.clients_file {
            for entry in plain::load_client_table(&locate(file))? {
                clients.push(Client::new(entry.name, entry.root)?);
            }
        }
        for spec in &self.clients {
            clients.push(Client::new(spec.name.as_str(), &spec.root)?);
        }

        let mut tracked = Vec::new();
        if let Some(file) = &self.tracked_file {
            tracked.extend(
                plain::load_watch_list(&locate(file))?
                    .into_iter()
                    .map(TrackedPath::from),
            );
        }
        tracked.extend(self.tracked.iter().map(|p| TrackedPath::from(p.as_str())));

        Ok(ResolvedConfig {
            clients: ClientTable::new(clients)?,
            tracked: WatchList::new(tracked)?,
            replicator: self.replicator.clone(),
            follow_writes: self.follow_writes,
        })
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
