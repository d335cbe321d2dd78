//! Domain types for ringsync.
//!
//! A [`Client`] is a named root directory holding one copy of every
//! [`TrackedPath`]. Both tables are immutable once loaded; the daemon and
//! the reconciler refer to clients by their index in the [`ClientTable`].

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed client name. Client identity is its name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientName(pub String);

impl fmt::Display for ClientName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ClientName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ClientName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A path shared by every client, always starting with `/`
/// (e.g. `/etc/resolv.conf`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedPath(pub String);

impl TrackedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TrackedPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TrackedPath {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// One mirrored root directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub name: ClientName,
    /// Absolute root with trailing separators trimmed; `""` for `/`.
    pub root: String,
}

impl Client {
    /// Build a client, normalising the root so that `root + tracked` never
    /// doubles a separator.
    pub fn new(name: impl Into<ClientName>, root: impl AsRef<str>) -> Result<Self, ConfigError> {
        let name = name.into();
        if name.0.trim().is_empty() {
            return Err(ConfigError::EmptyClientName);
        }
        let raw = root.as_ref();
        if !raw.starts_with('/') {
            return Err(ConfigError::InvalidClientRoot {
                name: name.0,
                root: raw.to_owned(),
                reason: "root must be an absolute path",
            });
        }
        Ok(Self {
            name,
            root: raw.trim_end_matches('/').to_owned(),
        })
    }

    /// Absolute location of this client's copy of `tracked`.
    pub fn resolve(&self, tracked: &TrackedPath) -> PathBuf {
        PathBuf::from(format!("{}{}", self.root, tracked.0))
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Ordered, non-empty set of clients with distinct names and roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClientTable {
    clients: Vec<Client>,
}

impl ClientTable {
    pub fn new(clients: Vec<Client>) -> Result<Self, ConfigError> {
        if clients.is_empty() {
            return Err(ConfigError::NoClients);
        }
        for (idx, client) in clients.iter().enumerate() {
            if clients[..idx].iter().any(|c| c.name == client.name) {
                return Err(ConfigError::DuplicateClient {
                    name: client.name.0.clone(),
                });
            }
            if let Some(earlier) = clients[..idx].iter().find(|c| c.root == client.root) {
                return Err(ConfigError::DuplicateClientRoot {
                    first: earlier.name.0.clone(),
                    second: client.name.0.clone(),
                    root: client.root.clone(),
                });
            }
        }
        Ok(Self { clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Client> {
        self.clients.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Client> {
        self.clients.iter()
    }

    pub fn find(&self, name: &ClientName) -> Option<&Client> {
        self.clients.iter().find(|c| &c.name == name)
    }
}

impl<'a> IntoIterator for &'a ClientTable {
    type Item = &'a Client;
    type IntoIter = std::slice::Iter<'a, Client>;

    fn into_iter(self) -> Self::IntoIter {
        self.clients.iter()
    }
}

/// Ordered, non-empty, duplicate-free list of tracked paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct WatchList {
    paths: Vec<TrackedPath>,
}

impl WatchList {
    pub fn new(paths: Vec<TrackedPath>) -> Result<Self, ConfigError> {
        if paths.is_empty() {
            return Err(ConfigError::NoTrackedPaths);
        }
        for (idx, path) in paths.iter().enumerate() {
            validate_tracked(path)?;
            if paths[..idx].contains(path) {
                return Err(ConfigError::DuplicateTrackedPath {
                    path: path.0.clone(),
                });
            }
        }
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TrackedPath> {
        self.paths.iter()
    }

    pub fn find(&self, path: &str) -> Option<&TrackedPath> {
        self.paths.iter().find(|p| p.0 == path)
    }
}

impl<'a> IntoIterator for &'a WatchList {
    type Item = &'a TrackedPath;
    type IntoIter = std::slice::Iter<'a, TrackedPath>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

fn validate_tracked(path: &TrackedPath) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidTrackedPath {
        path: path.0.clone(),
        reason,
    };
    if !path.0.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path.0 == "/" {
        return Err(invalid("must name a file, not the client root"));
    }
    if path.0.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    if path.0[1..]
        .split('/')
        .any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(invalid("must not contain empty, '.' or '..' components"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
