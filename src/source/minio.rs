use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{ObjectRef, glob_to_regex, has_glob};
use crate::error::SafeddError;

/// Size and modification time of a stored object.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectInfo {
    pub size: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

/// One line of `mc ls --json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectEntry {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Path relative to the listed prefix
    pub key: String,
    #[serde(default)]
    pub size: u64,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

/// Thin wrapper around the MinIO client binary (`mc`).
pub struct MinioClient {
    binary: PathBuf,
}

impl MinioClient {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Fail with `ResourceUnavailable` unless the alias answers.
    pub fn ensure_reachable(&self, alias: &str) -> Result<(), SafeddError> {
        self.run(&["ls", alias]).map(|_| ()).map_err(|e| {
            SafeddError::ResourceUnavailable(format!(
                "object store '{}' is not reachable: {:#}",
                alias, e
            ))
        })
    }

    pub fn stat(&self, object: &ObjectRef) -> Result<ObjectInfo, SafeddError> {
        self.run(&["stat", "--json", &object.to_string()])
            .and_then(|output| parse_stat(&output))
            .map_err(|e| {
                SafeddError::ResourceUnavailable(format!("cannot stat {}: {:#}", object, e))
            })
    }

    pub fn list_recursive(&self, prefix: &ObjectRef) -> Result<Vec<ObjectEntry>, SafeddError> {
        self.run(&["ls", "--recursive", "--json", &prefix.to_string()])
            .and_then(|output| parse_listing(&output))
            .map_err(|e| {
                SafeddError::ResourceUnavailable(format!("cannot list {}: {:#}", prefix, e))
            })
    }

    /// Resolve `spec` to its newest object. A last path component containing
    /// `*` or `?` is a pattern for object names below the rest of the path;
    /// otherwise the whole path is the prefix and every object counts.
    pub fn newest(&self, spec: &ObjectRef) -> Result<ObjectRef, SafeddError> {
        let (prefix, pattern) = split_pattern(&spec.path);
        let prefix_ref = ObjectRef {
            alias: spec.alias.clone(),
            path: prefix.clone(),
        };

        let pattern = pattern.as_deref().map(glob_to_regex).transpose()?;

        let entries = self.list_recursive(&prefix_ref)?;
        let key = pick_newest(&entries, pattern.as_ref()).ok_or_else(|| {
            SafeddError::ResourceUnavailable(format!("no object matching {} found", spec))
        })?;

        debug!(key = %key, prefix = %prefix, "Picked newest object");
        Ok(ObjectRef {
            alias: spec.alias.clone(),
            path: format!("{}{}", prefix, key),
        })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        debug!(binary = %self.binary.display(), ?args, "Running object store client");
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .with_context(|| format!("Failed to run {}", self.binary.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            bail!(
                "{} exited with {}: {}",
                self.binary.display(),
                output.status,
                if stderr.is_empty() { stdout } else { stderr }
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Split `bucket/dir/*.img` into (`bucket/dir/`, `*.img`).
fn split_pattern(path: &str) -> (String, Option<String>) {
    let (dir, last) = match path.rsplit_once('/') {
        Some((dir, last)) => (format!("{}/", dir), last),
        None => (String::new(), path),
    };

    if has_glob(last) {
        (dir, Some(last.to_string()))
    } else if path.ends_with('/') {
        (path.to_string(), None)
    } else {
        (format!("{}/", path), None)
    }
}

fn pick_newest<'a>(entries: &'a [ObjectEntry], pattern: Option<&Regex>) -> Option<&'a str> {
    entries
        .iter()
        .filter(|e| e.kind != "folder")
        .filter(|e| {
            let name = e.key.rsplit('/').next().unwrap_or(&e.key);
            pattern.is_none_or(|p| p.is_match(name))
        })
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
        .map(|e| e.key.as_str())
}

fn parse_stat(output: &str) -> Result<ObjectInfo> {
    // mc may print one document per object; the first is ours
    let first = output
        .lines()
        .find(|line| !line.trim().is_empty())
        .context("empty stat output")?;
    serde_json::from_str(first).context("Failed to parse stat output")
}

fn parse_listing(output: &str) -> Result<Vec<ObjectEntry>> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("Failed to parse listing output"))
        .collect()
}
