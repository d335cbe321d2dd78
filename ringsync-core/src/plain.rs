//! Line-oriented configuration formats.
//!
//! # Watch list
//!
//! ```text
//! # comment
//! /etc/resolv.conf
//! /etc/hosts     trailing tokens are ignored
//! ```
//!
//! Lines that are empty, start with `#`, or start with a space are skipped;
//! otherwise the first whitespace-delimited token is the tracked path.
//!
//! # Client table
//!
//! ```text
//! [client "arch"]
//!     path = /bedrock/clients/arch
//! ```
//!
//! A section's `path` line closes it. Opening another section first, or
//! hitting end-of-file inside a section, is a [`ConfigError::Malformed`].

use std::path::Path;

use crate::error::{io_err, ConfigError};

/// A client entry before root validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEntry {
    pub name: String,
    pub root: String,
}

/// Read and parse a watch list file.
pub fn load_watch_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(parse_watch_list(&text))
}

/// Read and parse a client table file.
pub fn load_client_table(path: &Path) -> Result<Vec<ClientEntry>, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    parse_client_table(&text).map_err(|(line, reason)| ConfigError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    })
}

pub fn parse_watch_list(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !(line.is_empty() || line.starts_with('#') || line.starts_with(' ')))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_owned)
        .collect()
}

/// Parse a client table. Errors carry a 1-based line number.
pub fn parse_client_table(text: &str) -> Result<Vec<ClientEntry>, (usize, String)> {
    let mut entries = Vec::new();
    let mut open: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(header) = line.strip_prefix('[') {
            if let Some((opened_at, name)) = &open {
                return Err((
                    lineno,
                    format!("section for client '{name}' opened at line {opened_at} has no path"),
                ));
            }
            let name = parse_section_header(header).map_err(|reason| (lineno, reason))?;
            if let Some(name) = name {
                open = Some((lineno, name));
            }
            continue;
        }

        let Some((_, name)) = &open else {
            continue;
        };
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        if key.trim() != "path" {
            continue;
        }
        let root = value.split_whitespace().next().unwrap_or_default();
        if root.is_empty() {
            return Err((lineno, format!("client '{name}' has an empty path")));
        }
        entries.push(ClientEntry {
            name: name.clone(),
            root: root.to_owned(),
        });
        open = None;
    }

    if let Some((opened_at, name)) = open {
        return Err((
            opened_at,
            format!("section for client '{name}' is never closed by a path line"),
        ));
    }
    Ok(entries)
}

/// `client "name"]` → `Some(name)`; other section kinds → `None`.
fn parse_section_header(header: &str) -> Result<Option<String>, String> {
    let Some(body) = header.trim_end().strip_suffix(']') else {
        return Err("section header is missing ']'".to_string());
    };
    let mut parts = body.trim().splitn(2, char::is_whitespace);
    let kind = parts.next().unwrap_or_default();
    if kind != "client" {
        return Ok(None);
    }
    let quoted = parts.next().unwrap_or_default().trim();
    let name = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted)
        .trim();
    if name.is_empty() {
        return Err("client section must name a client".to_string());
    }
    Ok(Some(name.to_owned()))
}
