//! Linux adapter integration tests against the real `lsblk`.
//!
//! Loopback tests require root privileges and losetup.
//!
//! Run all tests: `cargo test --test linux_adapter`
//! Run ignored tests: `sudo cargo test --test linux_adapter -- --ignored`

#![cfg(target_os = "linux")]

use nix::unistd::Uid;
use safedd::adapters::LinuxAdapter;
use safedd::core::HardwareAdapter;
use std::process::Command;
use tempfile::NamedTempFile;

fn is_root() -> bool {
    Uid::effective().is_root()
}

fn has_program(program: &str, version_flag: &str) -> bool {
    Command::new(program).arg(version_flag).output().is_ok()
}

/// Attach a zero-filled file as a loopback device.
/// Returns the loop device path (e.g., /dev/loop0) on success.
fn setup_loopback(file_path: &str, size_mb: u64) -> Option<String> {
    let result = Command::new("dd")
        .args([
            "if=/dev/zero",
            &format!("of={}", file_path),
            "bs=1M",
            &format!("count={}", size_mb),
        ])
        .output()
        .ok()?;

    if !result.status.success() {
        eprintln!("dd failed: {}", String::from_utf8_lossy(&result.stderr));
        return None;
    }

    let output = Command::new("losetup")
        .args(["--find", "--show", file_path])
        .output()
        .ok()?;

    if output.status.success() {
        Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        eprintln!(
            "losetup failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        None
    }
}

fn teardown_loopback(loop_device: &str) {
    let _ = Command::new("losetup").args(["-d", loop_device]).output();
}

#[test]
fn test_list_devices() {
    if !has_program("lsblk", "--version") {
        eprintln!("Skipping: lsblk not available");
        return;
    }

    let adapter = LinuxAdapter::new(false);
    let devices = adapter.list_devices();
    assert!(
        devices.is_ok(),
        "list_devices should not error: {:?}",
        devices.err()
    );

    for device in devices.unwrap() {
        assert!(device.name.starts_with("/dev/"), "{:?}", device);
        assert!(!device.name.starts_with("/dev/loop"), "{:?}", device);
    }
}

#[test]
fn test_mount_points_of_unknown_device_fail() {
    if !has_program("lsblk", "--version") {
        eprintln!("Skipping: lsblk not available");
        return;
    }

    let adapter = LinuxAdapter::new(false);
    assert!(adapter.mount_points("/dev/does-not-exist").is_err());
}

#[test]
#[ignore = "requires root privileges and losetup"]
fn test_loopback_device_is_not_listed() {
    if !is_root() {
        eprintln!("Skipping: requires root");
        return;
    }

    if !has_program("losetup", "--version") {
        eprintln!("Skipping: losetup not available");
        return;
    }

    let temp_file = NamedTempFile::new().expect("create temp file");
    let file_path = temp_file.path().to_string_lossy().to_string();

    let loop_device = match setup_loopback(&file_path, 8) {
        Some(dev) => dev,
        None => {
            eprintln!("Failed to setup loopback device");
            return;
        }
    };

    println!("Created loopback device: {}", loop_device);

    let devices = LinuxAdapter::new(false).list_devices();

    // Cleanup before assertions
    teardown_loopback(&loop_device);

    let devices = devices.expect("list_devices should not error");
    assert!(
        devices.iter().all(|d| d.name != loop_device),
        "{} should not be listed",
        loop_device
    );
}
