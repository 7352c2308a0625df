use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};

use crate::core::hardware::HardwareAdapter;
use crate::core::models::DeviceRecord;

/// In-memory hardware: a fixed device table plus mount points, recording
/// every unmount request.
#[derive(Clone, Default)]
pub struct SimulatedAdapter {
    devices: Vec<DeviceRecord>,
    mounts: HashMap<String, Vec<PathBuf>>,
    failing: Vec<PathBuf>,
    unmounted: Arc<Mutex<Vec<PathBuf>>>,
}

impl SimulatedAdapter {
    pub fn new(devices: Vec<DeviceRecord>) -> Self {
        Self {
            devices,
            ..Default::default()
        }
    }

    pub fn with_mount(mut self, device: &str, mount_point: &str) -> Self {
        self.mounts
            .entry(device.to_string())
            .or_default()
            .push(PathBuf::from(mount_point));
        self
    }

    /// Make unmounting `mount_point` fail.
    pub fn with_busy_mount(mut self, device: &str, mount_point: &str) -> Self {
        self.failing.push(PathBuf::from(mount_point));
        self.with_mount(device, mount_point)
    }

    /// Mount points unmounted so far, in order.
    pub fn unmounted(&self) -> Vec<PathBuf> {
        self.unmounted.lock().unwrap().clone()
    }
}

impl HardwareAdapter for SimulatedAdapter {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>> {
        Ok(self.devices.clone())
    }

    fn mount_points(&self, device: &str) -> Result<Vec<PathBuf>> {
        Ok(self.mounts.get(device).cloned().unwrap_or_default())
    }

    fn unmount(&self, mount_point: &Path) -> Result<()> {
        if self.failing.iter().any(|p| p == mount_point) {
            bail!("target is busy");
        }
        self.unmounted.lock().unwrap().push(mount_point.to_path_buf());
        Ok(())
    }
}
