//! Block device access through `lsblk` and umount(2).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

use crate::core::hardware::HardwareAdapter;
use crate::core::models::DeviceRecord;

/// `KEY="value"` pairs as printed by `lsblk -P`
static PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Z][A-Z0-9:_-]*)="([^"]*)""#).unwrap());

static LOOP_DEVICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(/dev/)?loop[0-9]*$").unwrap());

pub struct LinuxAdapter {
    /// Run `umount` through sudo instead of calling umount(2) directly
    pub use_sudo: bool,
}

impl LinuxAdapter {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }
}

impl HardwareAdapter for LinuxAdapter {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        let output = run_lsblk(&["-n", "-p", "-P", "-o", "NAME,SIZE,MODEL,TYPE,PKNAME"])?;
        let devices = parse_device_listing(&output);
        debug!(count = devices.len(), "Enumerated block devices");
        Ok(devices)
    }

    fn mount_points(&self, device: &str) -> Result<Vec<PathBuf>> {
        let output = run_lsblk(&["-n", "-p", "-P", "-o", "NAME,MOUNTPOINT", device])?;
        Ok(parse_mount_points(&output))
    }

    fn unmount(&self, mount_point: &Path) -> Result<()> {
        if self.use_sudo {
            debug!(mount_point = %mount_point.display(), "Running sudo umount");
            let status = Command::new("sudo")
                .arg("umount")
                .arg(mount_point)
                .status()
                .context("Failed to run sudo umount")?;

            if !status.success() {
                bail!("sudo umount {} exited with {}", mount_point.display(), status);
            }
            return Ok(());
        }

        nix::mount::umount(mount_point)
            .with_context(|| format!("umount({}) failed", mount_point.display()))
    }
}

fn run_lsblk(args: &[&str]) -> Result<String> {
    debug!(?args, "Running lsblk");
    let output = Command::new("lsblk")
        .args(args)
        .output()
        .context("Failed to run lsblk")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        bail!("lsblk failed: {}", stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Split one `lsblk -P` line into its columns.
fn parse_pairs(line: &str) -> HashMap<String, String> {
    PAIR.captures_iter(line)
        .map(|caps| (caps[1].to_string(), unescape(&caps[2])))
        .collect()
}

/// Undo lsblk's `\xNN` escaping of unsafe characters.
fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'\\' && bytes.get(i + 1) == Some(&b'x') {
            let decoded = value
                .get(i + 2..i + 4)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 4;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn is_loop_device(name: &str) -> bool {
    LOOP_DEVICE.is_match(name)
}

/// Turn `lsblk -P -o NAME,SIZE,MODEL,TYPE,PKNAME` output into device records.
///
/// Rows without a parent are devices; `part` rows pointing at a device count
/// as its partitions.
pub(crate) fn parse_device_listing(output: &str) -> Vec<DeviceRecord> {
    let rows: Vec<HashMap<String, String>> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_pairs)
        .collect();

    let column = |row: &HashMap<String, String>, key: &str| -> String {
        row.get(key).cloned().unwrap_or_default()
    };

    rows.iter()
        .filter(|row| column(row, "PKNAME").is_empty())
        .filter(|row| {
            let name = column(row, "NAME");
            !name.is_empty() && !is_loop_device(&name)
        })
        .map(|row| {
            let name = column(row, "NAME");
            let partition_count = rows
                .iter()
                .filter(|r| column(r, "TYPE") == "part" && column(r, "PKNAME") == name)
                .count() as u32;

            DeviceRecord {
                size: column(row, "SIZE").trim().to_string(),
                model: column(row, "MODEL").trim().to_string(),
                name,
                partition_count,
            }
        })
        .collect()
}

/// Mount points from `lsblk -P -o NAME,MOUNTPOINT DEVICE`. Swap areas show
/// up as `[SWAP]` and are not mount points.
pub(crate) fn parse_mount_points(output: &str) -> Vec<PathBuf> {
    output
        .lines()
        .map(parse_pairs)
        .filter_map(|row| row.get("MOUNTPOINT").cloned())
        .filter(|mp| !mp.is_empty() && !mp.starts_with('['))
        .map(PathBuf::from)
        .collect()
}
