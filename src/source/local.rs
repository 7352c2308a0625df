use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{InputSpec, Source, glob_to_regex};
use crate::error::SafeddError;

/// Check that `path` can be read and collect its size and modification time.
pub fn stat_local(path: &Path) -> Result<Source, SafeddError> {
    let unreadable =
        |e: std::io::Error| SafeddError::ResourceUnavailable(format!("cannot read {}: {}", path.display(), e));

    let metadata = fs::metadata(path).map_err(unreadable)?;
    if metadata.is_dir() {
        return Err(SafeddError::ResourceUnavailable(format!(
            "{} is a directory (use -n to pick the newest file in it)",
            path.display()
        )));
    }
    File::open(path).map_err(unreadable)?;

    let modified = metadata.modified().ok().map(DateTime::<Utc>::from);
    let size = metadata.is_file().then(|| metadata.len());

    Ok(Source::new(InputSpec::Local(path.to_path_buf()), size, modified))
}

/// Pick the most recently modified file for `spec`.
///
/// `spec` is either a directory, where every regular file is a candidate, or
/// `DIR/PATTERN` with a shell-style pattern matched against file names. Ties
/// on modification time go to the lexically greatest name.
pub fn newest_local(spec: &Path) -> Result<PathBuf, SafeddError> {
    let (dir, pattern) = if spec.is_dir() {
        (spec.to_path_buf(), None)
    } else {
        let dir = match spec.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let pattern = spec
            .file_name()
            .map(|name| glob_to_regex(&name.to_string_lossy()))
            .transpose()?;
        (dir, pattern)
    };

    let entries = fs::read_dir(&dir).map_err(|e| {
        SafeddError::ResourceUnavailable(format!("cannot read directory {}: {}", dir.display(), e))
    })?;

    let mut newest: Option<(SystemTime, String, PathBuf)> = None;

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(pattern) = &pattern {
            if !pattern.is_match(&name) {
                continue;
            }
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        let candidate = (modified, name, entry.path());
        if newest
            .as_ref()
            .is_none_or(|best| (&candidate.0, &candidate.1) > (&best.0, &best.1))
        {
            newest = Some(candidate);
        }
    }

    match newest {
        Some((_, _, path)) => {
            debug!(path = %path.display(), "Picked newest local file");
            Ok(path)
        }
        None => Err(SafeddError::ResourceUnavailable(format!(
            "no file matching {} found",
            spec.display()
        ))),
    }
}
