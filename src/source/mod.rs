//! Resolution of the transfer source: a local file or an object in a
//! MinIO-compatible store, optionally the newest one matching a pattern.

mod local;
mod minio;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::info;

use crate::error::{ConfigError, SafeddError};

pub use local::{newest_local, stat_local};
pub use minio::{MinioClient, ObjectEntry, ObjectInfo};

const REMOTE_PREFIX: &str = "mc://";

/// An object in the store, addressed as `ALIAS/BUCKET/KEY`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub alias: String,
    pub path: String,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.alias, self.path)
    }
}

/// Where the input lives, as given with `-i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSpec {
    Local(PathBuf),
    Remote(ObjectRef),
}

impl InputSpec {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let Some(rest) = input.strip_prefix(REMOTE_PREFIX) else {
            return Ok(Self::Local(PathBuf::from(input)));
        };

        match rest.split_once('/') {
            Some((alias, path)) if !alias.is_empty() && !path.is_empty() => {
                Ok(Self::Remote(ObjectRef {
                    alias: alias.to_string(),
                    path: path.to_string(),
                }))
            }
            _ => Err(ConfigError::InvalidRemoteInput(input.to_string())),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}

impl fmt::Display for InputSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::Remote(object) => write!(f, "{}{}", REMOTE_PREFIX, object),
        }
    }
}

/// A resolved, readable input.
#[derive(Debug, Clone)]
pub struct Source {
    pub location: InputSpec,
    /// gzip data that has to go through `gunzip` on the way to dd
    pub compressed: bool,
    pub size: Option<u64>,
    pub modified: Option<DateTime<Utc>>,
}

impl Source {
    pub fn new(location: InputSpec, size: Option<u64>, modified: Option<DateTime<Utc>>) -> Self {
        let compressed = location.to_string().ends_with(".gz");
        Self {
            location,
            compressed,
            size,
            modified,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location)?;
        let mut details = Vec::new();
        if let Some(size) = self.size {
            details.push(human_bytes(size));
        }
        if let Some(modified) = self.modified {
            details.push(format!("modified {}", modified.format("%Y-%m-%d %H:%M:%S UTC")));
        }
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

/// Resolve `spec` into a readable source, picking the newest match first
/// when `newest` is set.
pub fn resolve(spec: &InputSpec, newest: bool, client: &MinioClient) -> Result<Source, SafeddError> {
    let source = match spec {
        InputSpec::Local(path) => {
            let path = if newest { newest_local(path)? } else { path.clone() };
            stat_local(&path)?
        }
        InputSpec::Remote(object) => {
            client.ensure_reachable(&object.alias)?;
            let object = if newest {
                client.newest(object)?
            } else {
                object.clone()
            };
            let info = client.stat(&object)?;
            Source::new(InputSpec::Remote(object), Some(info.size), Some(info.last_modified))
        }
    };

    info!(source = %source, compressed = source.compressed, "Resolved input");
    Ok(source)
}

pub fn has_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?'])
}

/// Compile a shell-style pattern (`*`, `?`) into an anchored regex.
pub fn glob_to_regex(pattern: &str) -> Result<Regex, ConfigError> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    expr.push('$');
    Regex::new(&expr).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
